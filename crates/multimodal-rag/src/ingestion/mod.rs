//! Document ingestion: text, PDF and image extraction, chunking and indexing

mod chunker;
mod ocr;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use ocr::TesseractOcr;
pub use parser::{hash_content, ExtractedText, FileParser};
pub use processor::{sanitize_filename, IngestPipeline};
