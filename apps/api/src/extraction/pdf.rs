//! PDF text: direct extraction via `pdf-extract`, rasterisation via poppler's
//! `pdftoppm` for the OCR fallback.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{ExtractionError, PageRasterizer};

/// Direct text at or below this many characters is treated as a scanned PDF.
pub const MIN_DIRECT_TEXT_CHARS: usize = 50;
const RENDER_DPI: u32 = 200;
const PAGE_PREFIX: &str = "page";

/// Extracts the text layer of each page. Runs on the blocking pool; a parser
/// panic on a malformed document surfaces as an error rather than unwinding
/// through the request.
pub async fn direct_page_texts(content: Vec<u8>) -> anyhow::Result<Vec<String>> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&content))
        .await
        .map_err(|e| anyhow!("PDF parser aborted: {e}"))?
        .map_err(|e| anyhow!("failed to read PDF text layer: {e}"))
}

/// Keeps non-blank page texts and accepts them only when there is enough
/// material to be worth analysing.
pub fn select_direct_text(pages: &[String]) -> Option<String> {
    let parts: Vec<&str> = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    let joined = parts.join("\n");
    if joined.chars().count() > MIN_DIRECT_TEXT_CHARS {
        Some(joined)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct PdftoppmRasterizer {
    pub pdftoppm_path: String,
    pub scratch_dir: Option<PathBuf>,
}

impl PdftoppmRasterizer {
    pub fn new(pdftoppm_path: String, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            pdftoppm_path,
            scratch_dir,
        }
    }

    fn work_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cv-pdf-");
        match &self.scratch_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, ExtractionError> {
        // Removed with everything inside it when dropped.
        let work_dir = self.work_dir()?;
        let input = work_dir.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;

        let output = Command::new(&self.pdftoppm_path)
            .arg("-png")
            .arg("-r")
            .arg(RENDER_DPI.to_string())
            .arg(&input)
            .arg(work_dir.path().join(PAGE_PREFIX))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ExtractionError::RasterizeFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let page_files = rendered_pages(work_dir.path()).await?;
        debug!(pages = page_files.len(), "PDF rendered for OCR");

        let mut images = Vec::with_capacity(page_files.len());
        for (_, path) in page_files {
            images.push(tokio::fs::read(&path).await?);
        }
        Ok(images)
    }
}

/// Lists `page-N.png` files in `dir`, ordered by page number. pdftoppm pads N
/// with zeros depending on the page count, so order numerically, not by name.
async fn rendered_pages(dir: &Path) -> std::io::Result<Vec<(usize, PathBuf)>> {
    let mut pages = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages)
}

fn page_number(path: &Path) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_characters_of_direct_text_is_not_enough() {
        let pages = vec!["Jean Dupon".to_string(), "   ".to_string()];
        assert_eq!(select_direct_text(&pages), None);
    }

    #[test]
    fn test_direct_text_joins_non_blank_pages() {
        let first = "Jean Dupont, développeur backend, Lyon. ".repeat(2);
        let pages = vec![first.clone(), "\n\n".to_string(), " Python, Docker ".to_string()];
        let text = select_direct_text(&pages).unwrap();
        assert_eq!(text, format!("{}\nPython, Docker", first.trim()));
    }

    #[test]
    fn test_threshold_is_strictly_greater_than() {
        let exactly = vec!["x".repeat(MIN_DIRECT_TEXT_CHARS)];
        assert_eq!(select_direct_text(&exactly), None);
        let above = vec!["x".repeat(MIN_DIRECT_TEXT_CHARS + 1)];
        assert!(select_direct_text(&above).is_some());
    }

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/x/input.pdf")), None);
        assert_eq!(page_number(Path::new("/tmp/x/page-a.png")), None);
    }

    #[tokio::test]
    async fn test_rendered_pages_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "input.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let pages = rendered_pages(dir.path()).await.unwrap();
        let numbers: Vec<usize> = pages.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_direct_extraction() {
        assert!(direct_page_texts(b"not a pdf at all".to_vec()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rasterizer_failure_cleans_work_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let rasterizer =
            PdftoppmRasterizer::new("false".to_string(), Some(scratch.path().to_path_buf()));
        let err = rasterizer.render_pages(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, ExtractionError::RasterizeFailed(_)));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
