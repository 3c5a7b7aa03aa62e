//! Text extraction from uploaded documents.
//!
//! `DocumentExtractor` dispatches on the file extension: PDFs go through direct
//! text extraction with an OCR fallback, images go straight to the OCR engine.
//! Both external tools sit behind traits (`OcrEngine`, `PageRasterizer`) so the
//! dispatch logic can be exercised without tesseract or poppler installed.

pub mod ocr;
pub mod pdf;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::pdf::{direct_page_texts, select_direct_text};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Fichier vide")]
    EmptyFile,

    #[error("Type de fichier non supporté: {0}")]
    UnsupportedType(String),

    #[error("Erreur Tesseract: {0}")]
    OcrFailed(String),

    #[error("Erreur de conversion PDF en images: {0}")]
    RasterizeFailed(String),

    #[error("Aucun texte trouvé dans le PDF même avec OCR")]
    NoTextAfterOcr,

    #[error("Erreur OCR: {0}")]
    Io(#[from] std::io::Error),
}

/// Which path produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Pdf,
    Image,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    pub source: SourceFormat,
    /// True when a PDF had to be rasterised and OCR'd.
    pub fallback_used: bool,
}

/// Turns image bytes into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn image_to_text(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// Renders every page of a PDF to an image (PNG bytes, page order).
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, ExtractionError>;
}

/// File kinds accepted for extraction, keyed on the lowercased extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    pub const ALLOWED_EXTENSIONS: [&'static str; 4] = ["pdf", "png", "jpg", "jpeg"];

    pub fn from_filename(filename: &str) -> Option<Self> {
        // A bare ".pdf" still counts as a PDF.
        let (_, ext) = filename.rsplit_once('.')?;
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

pub struct DocumentExtractor {
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl DocumentExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { ocr, rasterizer }
    }

    pub async fn extract(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<ExtractionResult, ExtractionError> {
        if content.is_empty() {
            return Err(ExtractionError::EmptyFile);
        }

        match DocumentKind::from_filename(filename) {
            Some(DocumentKind::Pdf) => self.extract_pdf(content).await,
            Some(DocumentKind::Image) => {
                let text = self.ocr.image_to_text(content).await?;
                Ok(ExtractionResult {
                    text,
                    source: SourceFormat::Image,
                    fallback_used: false,
                })
            }
            None => Err(ExtractionError::UnsupportedType(filename.to_string())),
        }
    }

    async fn extract_pdf(&self, content: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        match direct_page_texts(content.to_vec()).await {
            Ok(pages) => {
                if let Some(text) = select_direct_text(&pages) {
                    info!(pages = pages.len(), chars = text.len(), "PDF text extracted directly");
                    return Ok(ExtractionResult {
                        text,
                        source: SourceFormat::Pdf,
                        fallback_used: false,
                    });
                }
                info!("Direct PDF text too short, falling back to OCR");
            }
            Err(reason) => warn!("Direct PDF extraction failed: {reason:#}"),
        }

        let text = self.ocr_pdf(content).await?;
        Ok(ExtractionResult {
            text,
            source: SourceFormat::Pdf,
            fallback_used: true,
        })
    }

    async fn ocr_pdf(&self, content: &[u8]) -> Result<String, ExtractionError> {
        let images = self.rasterizer.render_pages(content).await?;

        let mut parts = Vec::new();
        for (index, image) in images.iter().enumerate() {
            match self.ocr.image_to_text(image).await {
                Ok(text) if !text.trim().is_empty() => parts.push(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => warn!(page = index, "OCR failed on page, skipping: {e}"),
            }
        }

        if parts.is_empty() {
            return Err(ExtractionError::NoTextAfterOcr);
        }
        Ok(parts.join("\n"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// OCR stub: returns `image` interpreted as UTF-8, fails on `FAIL`.
    #[derive(Default)]
    pub struct EchoOcr {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl OcrEngine for EchoOcr {
        async fn image_to_text(&self, image: &[u8]) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if image == b"FAIL" {
                return Err(ExtractionError::OcrFailed("exit status 1".to_string()));
            }
            Ok(String::from_utf8_lossy(image).to_string())
        }
    }

    /// Rasterizer stub returning fixed "page images".
    pub struct FixedPages(pub Vec<&'static str>);

    #[async_trait]
    impl PageRasterizer for FixedPages {
        async fn render_pages(&self, _pdf: &[u8]) -> Result<Vec<Vec<u8>>, ExtractionError> {
            Ok(self.0.iter().map(|p| p.as_bytes().to_vec()).collect())
        }
    }

    /// Minimal single-page PDF with `text` drawn in Helvetica.
    pub fn one_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_at = pdf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            tail.push_str(&format!("{offset:010} 00000 n \n"));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.extend_from_slice(tail.as_bytes());
        pdf
    }

    fn extractor(ocr: Arc<EchoOcr>, pages: Vec<&'static str>) -> DocumentExtractor {
        DocumentExtractor::new(ocr, Arc::new(FixedPages(pages)))
    }

    #[test]
    fn test_document_kind_from_filename() {
        assert_eq!(DocumentKind::from_filename("cv.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("scan.jpeg"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_filename("photo.Png"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_filename("notes.txt"), None);
        assert_eq!(DocumentKind::from_filename("pdf"), None);
        assert_eq!(DocumentKind::from_filename(".pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("cv.2024.JPG"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_filename("cv.pdf.exe"), None);
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let ocr = Arc::new(EchoOcr::default());
        let err = extractor(ocr.clone(), vec![])
            .extract("cv.pdf", b"")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyFile));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let err = extractor(Arc::new(EchoOcr::default()), vec![])
            .extract("notes.txt", b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(_)));
        assert!(err.to_string().contains("non supporté"));
    }

    #[tokio::test]
    async fn test_image_goes_straight_to_ocr() {
        let ocr = Arc::new(EchoOcr::default());
        let result = extractor(ocr.clone(), vec![])
            .extract("scan.jpg", "Jean Dupont".as_bytes())
            .await
            .unwrap();
        assert_eq!(result.text, "Jean Dupont");
        assert_eq!(result.source, SourceFormat::Image);
        assert!(!result.fallback_used);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_falls_back_to_ocr_per_page() {
        let ocr = Arc::new(EchoOcr::default());
        let result = extractor(ocr.clone(), vec!["Page une", "  ", "FAIL", "Page quatre"])
            .extract("cv.pdf", b"%PDF-1.4 definitely not a real document")
            .await
            .unwrap();
        assert_eq!(result.text, "Page une\nPage quatre");
        assert_eq!(result.source, SourceFormat::Pdf);
        assert!(result.fallback_used);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_pdf_with_short_text_layer_goes_to_ocr() {
        let ocr = Arc::new(EchoOcr::default());
        let result = extractor(ocr.clone(), vec!["OCR PAGE"])
            .extract("cv.pdf", &one_page_pdf("Jean Dupon"))
            .await
            .unwrap();
        assert_eq!(result.text, "OCR PAGE");
        assert!(result.fallback_used);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pdf_with_text_layer_skips_ocr() {
        let ocr = Arc::new(EchoOcr::default());
        let result = extractor(ocr.clone(), vec!["OCR PAGE"])
            .extract(
                "cv.pdf",
                &one_page_pdf("Jean Dupont - Developpeur backend Rust et Python - Lyon, France"),
            )
            .await
            .unwrap();
        assert!(result.text.contains("Dupont"));
        assert!(result.text.chars().count() > pdf::MIN_DIRECT_TEXT_CHARS);
        assert_eq!(result.source, SourceFormat::Pdf);
        assert!(!result.fallback_used);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pdf_without_text_even_after_ocr() {
        let err = extractor(Arc::new(EchoOcr::default()), vec!["", "FAIL"])
            .extract("cv.pdf", b"not a pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoTextAfterOcr));
    }
}
