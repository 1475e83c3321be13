// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StitchScanError;

/// Structured description of the stitch pattern detected in a photo.
/// Field names mirror the wire format the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchResult {
    pub project_name: String,
    pub stitch_name: String,
    pub primary_stitches: Vec<String>,
    pub secondary_stitches: Vec<String>,
    pub explanation: String,
    pub confidence: u8,
    pub hook_size: String,
    pub difficulty: String,
    pub yarn_weight: String,
}

impl StitchResult {
    /// Parses the model's JSON reply. Anything short of a complete,
    /// in-range result is rejected; there are no partial results.
    pub fn from_json(text: &str) -> Result<Self, StitchScanError> {
        let result: StitchResult = serde_json::from_str(text)
            .map_err(|e| StitchScanError::MalformedResponse(e.to_string()))?;
        result.validate()?;
        Ok(result)
    }

    fn validate(&self) -> Result<(), StitchScanError> {
        if self.project_name.is_empty()
            || self.stitch_name.is_empty()
            || self.explanation.is_empty()
        {
            return Err(StitchScanError::MalformedResponse(
                "empty required field in analysis".to_string(),
            ));
        }
        if self.confidence < 1 || self.confidence > 100 {
            return Err(StitchScanError::MalformedResponse(format!(
                "confidence {} outside 1-100",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// One uploaded photo, held for the duration of a single analysis cycle.
/// The preview store entry under `id` backs `preview_url` until released.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub id: Uuid,
    pub preview_url: String,
    #[serde(skip_serializing)]
    pub encoded_payload: String,
    pub media_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Analyzing {
        image: UploadedImage,
    },
    Result {
        result: StitchResult,
        image: UploadedImage,
    },
    Error {
        message: String,
    },
}

impl WorkflowState {
    pub fn image(&self) -> Option<&UploadedImage> {
        match self {
            WorkflowState::Analyzing { image } | WorkflowState::Result { image, .. } => Some(image),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "projectName": "scarf",
            "stitchName": "Moss Stitch",
            "primaryStitches": ["half double crochet"],
            "secondaryStitches": [],
            "explanation": "Horizontal bars visible under the top loops.",
            "confidence": 87,
            "hookSize": "5.0 mm",
            "difficulty": "Easy",
            "yarnWeight": "Worsted"
        })
    }

    #[test]
    fn parses_complete_reply() {
        let result = StitchResult::from_json(&sample_json().to_string()).unwrap();
        assert_eq!(result.project_name, "scarf");
        assert_eq!(result.primary_stitches, vec!["half double crochet"]);
        assert!(result.secondary_stitches.is_empty());
        assert_eq!(result.confidence, 87);
        assert_eq!(result.yarn_weight, "Worsted");
    }

    #[test]
    fn rejects_missing_field() {
        let mut reply = sample_json();
        reply.as_object_mut().unwrap().remove("yarnWeight");
        let err = StitchResult::from_json(&reply.to_string()).unwrap_err();
        assert!(matches!(err, StitchScanError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        for confidence in [0, 101] {
            let mut reply = sample_json();
            reply["confidence"] = serde_json::json!(confidence);
            let err = StitchResult::from_json(&reply.to_string()).unwrap_err();
            assert!(matches!(err, StitchScanError::MalformedResponse(_)));
        }
    }

    #[test]
    fn rejects_non_integer_confidence() {
        let mut reply = sample_json();
        reply["confidence"] = serde_json::json!(87.5);
        let err = StitchResult::from_json(&reply.to_string()).unwrap_err();
        assert!(matches!(err, StitchScanError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_empty_required_string() {
        let mut reply = sample_json();
        reply["stitchName"] = serde_json::json!("");
        let err = StitchResult::from_json(&reply.to_string()).unwrap_err();
        assert!(matches!(err, StitchScanError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_non_json_reply() {
        let err = StitchResult::from_json("the pattern looks like moss stitch").unwrap_err();
        assert!(matches!(err, StitchScanError::MalformedResponse(_)));
    }

    #[test]
    fn state_exposes_held_image() {
        assert!(WorkflowState::Idle.image().is_none());
        assert!(WorkflowState::Idle.is_idle());
        let state = WorkflowState::Error {
            message: "unclear".to_string(),
        };
        assert!(state.image().is_none());
    }
}
