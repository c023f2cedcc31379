//! PPTX (Office Open XML) slide extraction.
//!
//! Opens .pptx files, which are ZIP archives containing XML documents, and
//! turns each slide into a [`deckreel_core::SlideRecord`] with its text and
//! embedded images.

pub mod archive;
pub mod parser;

pub use archive::PptxArchive;
pub use parser::{extract_slides, SlideExtractor};
