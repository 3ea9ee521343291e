//! OCR fallback through the Tesseract command line tool
//!
//! Runs `tesseract stdin stdout -l <language>`, feeding the document on
//! stdin and reading recognized text from stdout. The binary is an optional
//! runtime dependency: when it is missing, `recognize` fails and the
//! extraction is reported as requiring OCR.

use std::process::Stdio;

use async_trait::async_trait;
use podium_common::{Error, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::OcrEngine;

/// Default executable name, resolved through `PATH`
pub const DEFAULT_OCR_COMMAND: &str = "tesseract";

/// [`OcrEngine`] backed by the `tesseract` executable
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(DEFAULT_OCR_COMMAND)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, bytes: &[u8], language: &str) -> Result<String> {
        tracing::debug!(command = %self.command, language, bytes = bytes.len(), "Running OCR");

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Extraction(format!("Failed to start {}: {}", self.command, e)))?;

        // Feed stdin concurrently with draining stdout
        let writer = child.stdin.take().map(|mut stdin| {
            let input = bytes.to_vec();
            tokio::spawn(async move {
                // The child may exit early and close its end
                let _ = stdin.write_all(&input).await;
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Extraction(format!("OCR process failed: {}", e)))?;
        if let Some(writer) = writer {
            let _ = writer.await;
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Extraction(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
