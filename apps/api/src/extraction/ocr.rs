use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{ExtractionError, OcrEngine};

/// Runs the `tesseract` CLI against a temporary copy of the image.
#[derive(Clone)]
pub struct TesseractOcr {
    pub tesseract_path: String,
    pub language: String,
    pub scratch_dir: Option<PathBuf>,
}

impl TesseractOcr {
    pub fn new(tesseract_path: String, language: String, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            tesseract_path,
            language,
            scratch_dir,
        }
    }

    fn image_file(&self, image: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cv-ocr-").suffix(".img");
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(image)?;
        file.flush()?;
        Ok(file)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn image_to_text(&self, image: &[u8]) -> Result<String, ExtractionError> {
        // Deleted on drop, whichever way this function returns.
        let image_file = self.image_file(image)?;

        let output = Command::new(&self.tesseract_path)
            .arg(image_file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExtractionError::OcrFailed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(bytes = image.len(), chars = text.len(), "OCR finished");
        Ok(text)
    }
}
