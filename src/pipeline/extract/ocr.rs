use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::CapabilityError;

/// OCR capability: image bytes in, recognized text out.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize_text(&self, image: &[u8]) -> Result<String, CapabilityError>;
}

/// Runs the `tesseract` CLI, streaming the image over stdin and reading text from stdout.
pub struct TesseractRecognizer {
    binary: PathBuf,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        TesseractRecognizer {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize_text(&self, image: &[u8]) -> Result<String, CapabilityError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().ok_or_else(|| CapabilityError::Engine {
            engine: "tesseract",
            message: "stdin was not captured".to_string(),
        })?;
        stdin.write_all(image).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(CapabilityError::Engine {
                engine: "tesseract",
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "OCR finished");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_reports_io_error() {
        let recognizer = TesseractRecognizer::new("/nonexistent/bin/tesseract", "eng");
        let err = recognizer.recognize_text(&[0u8; 4]).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Io(_)));
    }
}
