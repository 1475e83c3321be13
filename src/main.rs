// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use anyhow::Context;
use log::info;
use std::sync::Arc;

mod errors;
mod handlers;
mod models;
mod services;

use crate::handlers::{current_state, fetch_preview, reset_workflow, upload_image};
use crate::services::{GeminiClient, ImageCodec, WorkflowController};

#[derive(Clone)]
pub struct AppState {
    workflow: Arc<WorkflowController>,
    codec: Arc<ImageCodec>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting StitchScan service...");

    let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;
    let model =
        std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-3-flash-preview".to_string());

    // One client for the life of the process, shared read-only.
    let analyzer = Arc::new(GeminiClient::new(api_key, model));
    let codec = Arc::new(ImageCodec::new());
    let workflow = Arc::new(WorkflowController::new(analyzer, codec.clone()));

    let app_state = AppState { workflow, codec };

    info!("Starting HTTP server on 0.0.0.0:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .route("/upload", web::post().to(upload_image))
                    .route("/state", web::get().to(current_state))
                    .route("/reset", web::post().to(reset_workflow)),
            )
            .route("/preview/{preview_id}", web::get().to(fetch_preview))
            .route("/health", web::get().to(health_check))
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "stitchscan",
        "version": "0.1.0"
    }))
}
