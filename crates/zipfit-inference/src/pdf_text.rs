//! Direct text extraction for digitally-born PDFs using pdftotext.
//!
//! The non-OCR path: when the classifier decides a document carries an
//! embedded text layer, extraction shells out to `pdftotext` instead of
//! paying for a remote OCR round trip.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use zipfit_core::{defaults, Error, Result, TextExtractor};

/// Local `pdftotext`-based extractor.
pub struct PdfTextExtractor {
    timeout_secs: u64,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self {
            timeout_secs: defaults::PDFTOTEXT_TIMEOUT_SECS,
        }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a command with a timeout, returning stdout as a string.
async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::Internal(format!("External command timed out after {}s", timeout_secs))
        })?
        .map_err(|e| Error::Internal(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Internal(format!(
            "Command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, data: &[u8], mime_type: &str) -> Result<String> {
        if mime_type != "application/pdf" {
            return Err(Error::InvalidInput(format!(
                "Direct text extraction only handles PDFs, got {}",
                mime_type
            )));
        }

        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::InvalidInput(
                "Not a valid PDF (missing %PDF header)".to_string(),
            ));
        }

        // Write PDF to a temp file for pdftotext
        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::Internal(format!("Failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| Error::Internal(format!("Failed to write temp file: {}", e)))?;
        let pdf_path = tmpfile.path().to_string_lossy().to_string();

        debug!(
            subsystem = "inference",
            component = "pdf_text",
            op = "extract",
            byte_len = data.len(),
            "Extracting embedded text layer"
        );

        // "-" sends the extracted text to stdout
        let mut cmd = Command::new("pdftotext");
        cmd.arg("-layout").arg(&pdf_path).arg("-");

        run_cmd_with_timeout(&mut cmd, self.timeout_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_pdf_mime() {
        let extractor = PdfTextExtractor::new();
        let err = extractor.extract(b"%PDF-1.7", "image/png").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_rejects_missing_magic_bytes() {
        let extractor = PdfTextExtractor::new();
        let err = extractor
            .extract(b"not a pdf at all", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
