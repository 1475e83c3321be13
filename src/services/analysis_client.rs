// src/services/analysis_client.rs
use crate::errors::StitchScanError;
use crate::models::StitchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Seam between the workflow and whichever vision model backs the analysis.
#[async_trait]
pub trait PatternAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        encoded_payload: &str,
        media_type: &str,
    ) -> Result<StitchResult, StitchScanError>;
}

/// Gemini-backed analyzer. Built once at startup with the API key and
/// shared read-only for the life of the process.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: Client::new(),
        }
    }

    /// Schema declared to the model; the nine fields are all required.
    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "projectName": { "type": "STRING" },
                "stitchName": { "type": "STRING" },
                "primaryStitches": { "type": "ARRAY", "items": { "type": "STRING" } },
                "secondaryStitches": { "type": "ARRAY", "items": { "type": "STRING" } },
                "explanation": { "type": "STRING" },
                "confidence": { "type": "NUMBER" },
                "hookSize": { "type": "STRING" },
                "difficulty": { "type": "STRING" },
                "yarnWeight": { "type": "STRING" }
            },
            "required": [
                "projectName",
                "stitchName",
                "primaryStitches",
                "secondaryStitches",
                "explanation",
                "confidence",
                "hookSize",
                "difficulty",
                "yarnWeight"
            ]
        })
    }
}

#[async_trait]
impl PatternAnalyzer for GeminiClient {
    async fn analyze(
        &self,
        encoded_payload: &str,
        media_type: &str,
    ) -> Result<StitchResult, StitchScanError> {
        let analysis_prompt = r#"
        You are an expert fiber artist and pattern designer. Analyze the
        provided photo of a crochet or knitting work-in-progress (WIP).

        Your analysis MUST follow these steps:
        1. Overall shape and structure: is it a flat panel, worked in the
           round, a 3D shape, etc.?
        2. Stitch texture and repetition: identify the rhythmic pattern of
           loops and bars.
        3. Thickness of the yarn: estimate the weight (e.g. Worsted, DK,
           Bulky).
        4. Identify stitches: correctly name the common stitches present
           (sc, hdc, dc, tr, etc.).

        Required output fields:
        - projectName: the likely project (e.g. coaster, tote bag, granny
          square, cardigan panel, amigurumi, scarf).
        - stitchName: the common name of the overall pattern (e.g. Alpine
          Stitch, Moss Stitch, Granny Cluster).
        - primaryStitches: list the 1-3 dominant stitches used.
        - secondaryStitches: list any decorative or edge stitches.
        - explanation: explain WHY you identified these stitches by
          referencing specific visual clues from the photo (e.g. "the
          horizontal bar visible under the top loops indicates half double
          crochet").
        - confidence: a numeric score (1-100) following these STRICT rules:
            * 80-95: visual clues clearly and strongly match a common
              stitch or pattern.
            * 50-75: the match is good but imperfect (lighting, angle,
              blur, partial view).
            * 50 or lower: only when truly uncertain or there is no clear
              match.
            * DO NOT guess confidently when unsure.
        - hookSize: suggested tool size based on yarn and stitch density.
        - difficulty: skill level (Beginner, Easy, Intermediate, Advanced,
          Expert).
        - yarnWeight: estimated weight category.

        Return the result as a raw JSON object.
        "#;

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [
                        {
                            "text": analysis_prompt
                        },
                        {
                            "inlineData": {
                                "mimeType": media_type,
                                "data": encoded_payload
                            }
                        }
                    ]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": Self::response_schema()
                }
            }))
            .send()
            .await
            .map_err(|e| StitchScanError::Transport(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StitchScanError::Transport(format!(
                "Gemini error: {}",
                error_text
            )));
        }

        let result: Value = response.json().await.map_err(|e| {
            StitchScanError::Transport(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|t| !t.is_empty())
            .ok_or(StitchScanError::NoResponse)?;

        StitchResult::from_json(text)
    }
}
