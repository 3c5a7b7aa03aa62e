//! Résumé Analyzer — prompts the LLM for a structured record and decides
//! whether the document is a résumé at all.
//!
//! Pipeline:
//! 1. reject blank input, then input shorter than `MIN_ANALYSIS_CHARS` once stripped
//! 2. prompt the model (JSON only, low temperature)
//! 3. cut the JSON object out of the reply (first `{` to last `}`)
//! 4. parse and validate it into a `ResumeRecord`
//! 5. an all-empty record means "not a résumé"
//!
//! Any failure in steps 2–4 produces a degraded record built from regexes over
//! the unstripped input, returned alongside the failure reason.

pub mod handlers;
pub mod patterns;
pub mod prompts;
pub mod record;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::patterns::{find_email, find_phone, strip_for_analysis};
use crate::analysis::prompts::build_cv_prompt;
use crate::analysis::record::{validate_record, ResumeRecord, ValidationError, NOT_FOUND};
use crate::llm_client::prompts::STRICT_JSON_SYSTEM;
use crate::llm_client::{LlmBackend, LlmError};

/// Minimum length of the stripped text worth sending to the model.
pub const MIN_ANALYSIS_CHARS: usize = 20;

pub const NO_TEXT_MESSAGE: &str = "Aucun texte à analyser";
pub const TOO_SHORT_MESSAGE: &str = "Texte trop court pour l'analyse";
pub const NOT_A_RESUME_MESSAGE: &str =
    "Ce fichier ne semble pas être un CV. Veuillez télécharger un curriculum vitae valide.";
/// Sole skill entry of a degraded record.
pub const LIMITED_EXTRACTION_MARKER: &str = "Extraction limitée";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("Impossible d'extraire le JSON de la réponse")]
    NoJsonObject,

    #[error("JSON invalide: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Réponse hors schéma: {0}")]
    Schema(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success(ResumeRecord),
    /// The model answered, but found nothing résumé-like.
    NotAResume(String),
    /// Input rejected before the model was called (`fallback` is `None`), or
    /// the model path failed and a regex-based record was salvaged.
    Failure {
        reason: String,
        fallback: Option<ResumeRecord>,
    },
}

impl AnalysisOutcome {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::NotAResume(reason) => Some(reason),
            AnalysisOutcome::Failure { reason, .. } => Some(reason),
        }
    }

    fn rejected(reason: &str) -> Self {
        AnalysisOutcome::Failure {
            reason: reason.to_string(),
            fallback: None,
        }
    }
}

pub struct ResumeAnalyzer {
    llm: Arc<dyn LlmBackend>,
}

impl ResumeAnalyzer {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    pub async fn analyze(&self, text: &str) -> AnalysisOutcome {
        if text.trim().is_empty() {
            return AnalysisOutcome::rejected(NO_TEXT_MESSAGE);
        }

        let stripped = strip_for_analysis(text);
        if stripped.chars().count() < MIN_ANALYSIS_CHARS {
            debug!(chars = stripped.chars().count(), "Text too short for analysis");
            return AnalysisOutcome::rejected(TOO_SHORT_MESSAGE);
        }

        match self.extract_record(&stripped).await {
            Ok(record) if record.is_blank() => {
                info!("LLM found no résumé content");
                AnalysisOutcome::NotAResume(NOT_A_RESUME_MESSAGE.to_string())
            }
            Ok(record) => {
                info!(
                    skills = record.competences.len(),
                    experiences = record.experiences.len(),
                    education = record.formations.len(),
                    "Résumé analysed"
                );
                AnalysisOutcome::Success(record)
            }
            Err(e) => {
                warn!("LLM analysis failed, using regex fallback: {e}");
                AnalysisOutcome::Failure {
                    reason: format!("Analyse IA échouée: {e}"),
                    fallback: Some(fallback_record(text)),
                }
            }
        }
    }

    async fn extract_record(&self, text: &str) -> Result<ResumeRecord, AnalysisError> {
        let prompt = build_cv_prompt(text);
        let reply = self.llm.complete(&prompt, STRICT_JSON_SYSTEM).await?;
        debug!(reply_chars = reply.len(), "LLM reply received");

        let json = extract_json_object(&reply).ok_or(AnalysisError::NoJsonObject)?;
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(validate_record(&value)?)
    }
}

/// Slice from the first `{` to the last `}`, tolerating prose or code fences
/// around the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].trim())
}

/// Best-effort record from the raw text: email and phone only.
pub fn fallback_record(text: &str) -> ResumeRecord {
    ResumeRecord {
        email: find_email(text).unwrap_or(NOT_FOUND).to_string(),
        telephone: find_phone(text).unwrap_or(NOT_FOUND).to_string(),
        competences: vec![LIMITED_EXTRACTION_MARKER.to_string()],
        ..ResumeRecord::default()
    }
}
