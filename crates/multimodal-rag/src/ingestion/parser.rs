//! File-type dispatch and text extraction

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::text::content_sample;
use crate::types::{extension_of, FileType};

use super::ocr::TesseractOcr;

/// Typographic characters PDF fonts commonly emit, mapped to plain text
const PDF_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),   // Hyphen
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "--"),  // Em dash
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201C}', "\""),  // Left double quote
    ('\u{201D}', "\""),  // Right double quote
    ('\u{2022}', "* "),  // Bullet
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00A0}', " "),   // Non-breaking space
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\0', ""),
];

/// Clean up PDF text: plain punctuation, no ligatures, no blank lines
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match PDF_REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => result.push_str(to),
            None => result.push(ch),
        }
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text extracted from an uploaded file
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Detected file type
    pub file_type: FileType,
    /// Full trimmed text
    pub full_text: String,
    /// Preview of the text
    pub content_sample: String,
}

impl ExtractedText {
    /// SHA-256 of the full text, hex encoded
    pub fn content_hash(&self) -> String {
        hash_content(&self.full_text)
    }
}

/// Extracts text from txt, pdf and image files
pub struct FileParser {
    ocr: TesseractOcr,
    pdf_timeout: std::time::Duration,
    sample_chars: usize,
}

impl FileParser {
    /// Create a parser from ingestion settings
    pub fn new(config: &IngestionConfig) -> Self {
        Self {
            ocr: TesseractOcr::new(&config.tesseract_cmd, &config.ocr_language),
            pdf_timeout: std::time::Duration::from_secs(config.pdf_timeout_secs),
            sample_chars: config.sample_chars,
        }
    }

    /// Read a saved upload and extract its text.
    ///
    /// Blocking: PDF parsing and OCR can take seconds, call this from
    /// `spawn_blocking` when on the async runtime.
    pub fn process_file(&self, path: &Path) -> Result<ExtractedText> {
        let filename = path.to_string_lossy();
        let extension = extension_of(&filename);
        let file_type = FileType::from_extension(&extension);

        let raw = match file_type {
            FileType::Txt => Self::parse_text(&std::fs::read(path)?),
            FileType::Pdf => self.parse_pdf(&filename, &std::fs::read(path)?)?,
            FileType::Image => self.ocr.image_to_string(path)?,
            FileType::Unknown => return Err(Error::UnsupportedFileType(extension)),
        };

        let full_text = raw.trim().to_string();
        if full_text.is_empty() {
            return Err(Error::NoReadableText);
        }

        tracing::debug!(
            "Extracted {} characters from {} ({})",
            full_text.len(),
            filename,
            file_type.display_name()
        );

        Ok(ExtractedText {
            file_type,
            content_sample: content_sample(&full_text, self.sample_chars),
            full_text,
        })
    }

    /// Decode text as UTF-8, dropping undecodable bytes
    fn parse_text(data: &[u8]) -> String {
        String::from_utf8_lossy(data).replace('\u{FFFD}', "")
    }

    /// Parse PDF document
    #[cfg(feature = "pdf")]
    fn parse_pdf(&self, filename: &str, data: &[u8]) -> Result<String> {
        let content = self.extract_pdf_with_timeout(filename, data)?;
        Ok(cleanup_pdf_text(&content))
    }

    #[cfg(not(feature = "pdf"))]
    fn parse_pdf(&self, _filename: &str, _data: &[u8]) -> Result<String> {
        Err(Error::UnsupportedFileType(
            ".pdf (built without the pdf feature)".to_string(),
        ))
    }

    /// Run pdf-extract on a worker thread; some fonts make it hang
    #[cfg(feature = "pdf")]
    fn extract_pdf_with_timeout(&self, filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.pdf_timeout) {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => {
                tracing::warn!("pdf-extract found no text in {}, trying fallback", filename);
                Self::extract_pdf_text_fallback(filename, data)
            }
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed on {}: {}, trying fallback", filename, e);
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The worker thread cannot be cancelled; it is left to finish on its own
                tracing::error!(
                    "PDF extraction timed out after {:?} for {}",
                    self.pdf_timeout,
                    filename
                );
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed on {}", filename);
                Self::extract_pdf_text_fallback(filename, data)
            }
        }
    }

    /// Fallback PDF text extraction using lopdf page by page
    #[cfg(feature = "pdf")]
    fn extract_pdf_text_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut all_text = String::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) if !text.trim().is_empty() => {
                    all_text.push_str(&text);
                    all_text.push('\n');
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Could not extract page {}: {}", page_num, e),
            }
        }

        Ok(all_text)
    }
}

/// Hash content for deduplication
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
