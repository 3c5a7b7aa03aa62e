use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Uploads above this size are rejected before extraction starts.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Cleaned text is truncated to this many characters before analysis.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 15_000;

/// Application configuration loaded from environment variables.
/// Startup fails if the LLM credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    pub max_text_chars: usize,
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub ocr_language: String,
    /// Where OCR temp files are created. `None` means the system temp dir.
    pub ocr_scratch_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let groq_api_key = lookup("GROQ_API_KEY")
            .context("Required environment variable 'GROQ_API_KEY' is not set")?;
        if groq_api_key.trim().is_empty() {
            bail!("Required environment variable 'GROQ_API_KEY' is empty");
        }

        Ok(Config {
            groq_api_key,
            port: var_or("PORT", "8001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var_or("RUST_LOG", "info"),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_text_chars: parse_or(&lookup, "MAX_TEXT_CHARS", DEFAULT_MAX_TEXT_CHARS)?,
            tesseract_path: var_or("TESSERACT_PATH", "tesseract"),
            pdftoppm_path: var_or("PDFTOPPM_PATH", "pdftoppm"),
            ocr_language: var_or("OCR_LANGUAGE", "fra"),
            ocr_scratch_dir: lookup("OCR_SCRATCH_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("{key} must be a positive integer")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by in-process tests; never touches the environment.
    pub fn for_tests() -> Self {
        Config {
            groq_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            ocr_language: "fra".to_string(),
            ocr_scratch_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_key_is_set() {
        let config = load(&[("GROQ_API_KEY", "gsk_test")]).unwrap();
        assert_eq!(config.port, 8001);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_text_chars, 15_000);
        assert_eq!(config.ocr_language, "fra");
        assert_eq!(config.ocr_scratch_dir, None);
    }

    #[test]
    fn test_missing_key_fails() {
        let err = load(&[("PORT", "9000")]).unwrap_err();
        assert!(err.to_string().contains("'GROQ_API_KEY' is not set"));
    }

    #[test]
    fn test_blank_key_fails() {
        let err = load(&[("GROQ_API_KEY", "   ")]).unwrap_err();
        assert!(err.to_string().contains("'GROQ_API_KEY' is empty"));
    }

    #[test]
    fn test_non_numeric_limits_are_rejected() {
        let err =
            load(&[("GROQ_API_KEY", "gsk_test"), ("MAX_UPLOAD_BYTES", "10MB")]).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_BYTES"));

        let err = load(&[("GROQ_API_KEY", "gsk_test"), ("PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_overrides_are_read() {
        let config = load(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("MAX_TEXT_CHARS", "2000"),
            ("OCR_LANGUAGE", "eng"),
            ("OCR_SCRATCH_DIR", "/var/tmp/cv"),
        ])
        .unwrap();
        assert_eq!(config.max_text_chars, 2000);
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.ocr_scratch_dir, Some(PathBuf::from("/var/tmp/cv")));
    }
}
