//! Request and response bodies of the claims endpoints

use crate::core::error::{ClaimError, Result};
use crate::core::types::{Answer, ConfidenceBand};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional photo proving ownership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ProofImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, guessing its type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "proof".into());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mime_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            other => {
                return Err(ClaimError::InvalidAnswer(format!(
                    "proof must be a PNG, JPG, GIF or WEBP image, got '.{}'",
                    other
                )))
            }
        };
        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Everything posted to `/claims/ai-powered`
#[derive(Debug, Clone, Serialize)]
pub struct ClaimSubmission {
    pub item_id: String,
    pub product_type: String,
    pub description: String,
    pub identification_marks: String,
    pub lost_location: String,
    pub approximate_date: String,
    pub match_percentage: u8,
    pub qa_data: Vec<Answer>,
    #[serde(skip)]
    pub proof_image: Option<ProofImage>,
}

impl ClaimSubmission {
    /// Attach a proof image, refusing anything above `limit` bytes
    pub fn attach_proof(&mut self, image: ProofImage, limit: usize) -> Result<()> {
        if image.size() > limit {
            return Err(ClaimError::ProofTooLarge {
                size: image.size(),
                limit,
            });
        }
        self.proof_image = Some(image);
        Ok(())
    }
}

/// Body sent to `/claims/generate-questions`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct GenerateQuestionsRequest<'a> {
    pub item_keyword: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub secret_message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateQuestionsResponse {
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Server-side analysis attached to a submitted claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiAnalysis {
    /// Raw band label; see [`AiAnalysis::band`]
    pub confidence_band: Option<String>,
    pub match_percentage: Option<f64>,
    pub reasoning: Option<String>,
    pub what_matched: Vec<String>,
    pub what_did_not_match: Vec<String>,
    pub missing_information: Vec<String>,
    pub recommendation_for_admin: Option<String>,
    pub advisory_note: Option<String>,
}

impl AiAnalysis {
    pub fn band(&self) -> Option<ConfidenceBand> {
        self.confidence_band.as_deref().and_then(ConfidenceBand::parse)
    }
}

/// Successful response of `/claims/ai-powered`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimOutcome {
    pub claim_id: Option<String>,
    pub message: Option<String>,
    pub ai_analysis: Option<AiAnalysis>,
}

impl ClaimOutcome {
    pub fn server_band(&self) -> Option<ConfidenceBand> {
        self.ai_analysis.as_ref().and_then(AiAnalysis::band)
    }
}
