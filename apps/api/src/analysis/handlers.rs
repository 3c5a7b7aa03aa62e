//! Axum route handlers for the analysis API.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use serde::Deserialize;
use tracing::info;

use crate::analysis::record::ResumeRecord;
use crate::analysis::AnalysisOutcome;
use crate::cleaner::clean_cv_text;
use crate::errors::AppError;
use crate::extraction::DocumentKind;
use crate::state::AppState;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
}

struct Upload {
    filename: String,
    content: Bytes,
}

/// POST /api/analyze
///
/// Multipart upload (PDF or image) → text extraction → cleaning → LLM analysis.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeRecord>, AppError> {
    let upload = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    info!(
        filename = %upload.filename,
        bytes = upload.content.len(),
        "Document received"
    );

    let extracted = state
        .extractor
        .extract(&upload.filename, &upload.content)
        .await
        .map_err(|e| AppError::Extraction(format!("Erreur lors de l'extraction du texte: {e}")))?;

    if extracted.text.trim().is_empty() {
        return Err(AppError::Validation(
            "Aucun texte extrait du document. Vérifiez que le fichier est lisible \
             (PDF avec texte ou image claire)."
                .to_string(),
        ));
    }
    info!(
        source = ?extracted.source,
        fallback_used = extracted.fallback_used,
        chars = extracted.text.len(),
        "Text extracted"
    );

    let cleaned = clean_cv_text(&extracted.text, state.config.max_text_chars);
    let outcome = state.analyzer.analyze(&cleaned).await;
    if let Some(reason) = outcome.error_message() {
        info!(filename = %upload.filename, reason, "Document rejected by analyzer");
    }
    outcome_into_result(outcome)
}

/// POST /api/analyze/text
///
/// Same analysis for text the client already has.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("Aucun texte fourni".to_string()));
    }

    let cleaned = clean_cv_text(&request.text, state.config.max_text_chars);
    outcome_into_result(state.analyzer.analyze(&cleaned).await)
}

fn outcome_into_result(outcome: AnalysisOutcome) -> Result<Json<ResumeRecord>, AppError> {
    match outcome {
        AnalysisOutcome::Success(record) => Ok(Json(record)),
        AnalysisOutcome::NotAResume(reason) => Err(AppError::Analysis {
            message: reason,
            partial: None,
        }),
        AnalysisOutcome::Failure { reason, fallback } => Err(AppError::Analysis {
            message: reason,
            partial: fallback.map(Box::new),
        }),
    }
}

/// Pulls the `file` field out of the form, enforcing name, extension and size
/// limits before the document is handed to extraction.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid_multipart(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::Validation("Aucun fichier fourni".to_string()))?
            .to_string();

        if DocumentKind::from_filename(&filename).is_none() {
            return Err(AppError::Validation(format!(
                "Type de fichier non accepté. Autorisés: {}",
                DocumentKind::ALLOWED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let content = read_limited(field, max_bytes).await?;
        return Ok(Upload { filename, content });
    }

    Err(AppError::Validation("Aucun fichier fourni".to_string()))
}

/// Reads the field chunk by chunk, stopping as soon as `max_bytes` is exceeded.
async fn read_limited(mut field: Field<'_>, max_bytes: usize) -> Result<Bytes, AppError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| invalid_multipart(e, max_bytes))?
    {
        if buffer.len() + chunk.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::Validation(format!(
        "Fichier trop volumineux (max {} Mo)",
        max_bytes / (1024 * 1024)
    ))
}

fn invalid_multipart(e: MultipartError, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(max_bytes);
    }
    AppError::Validation(format!("Formulaire multipart invalide: {e}"))
}
