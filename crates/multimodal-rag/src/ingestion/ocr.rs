//! Image OCR through the tesseract command-line tool

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Runs `tesseract <image> stdout -l <lang>`
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    /// Create with an executable name/path and language pack
    pub fn new(command: &str, language: &str) -> Self {
        Self {
            command: command.to_string(),
            language: language.to_string(),
        }
    }

    /// Check if the tesseract binary can be executed
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Extract text from an image file
    pub fn image_to_string(&self, image_path: &Path) -> Result<String> {
        let output = Command::new(&self.command)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .map_err(|e| Error::Ocr(format!("could not run '{}': {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("tesseract error: {}", stderr.trim())));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::info!(
            "Image OCR extracted {} characters from {}",
            text.len(),
            image_path.display()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        let ocr = TesseractOcr::new("mmrag-test-missing-tesseract", "eng");
        assert!(!ocr.is_available());

        let err = ocr.image_to_string(Path::new("whatever.png")).unwrap_err();
        assert!(err.to_string().contains("could not run 'mmrag-test-missing-tesseract'"));
    }
}
