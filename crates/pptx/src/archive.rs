//! Named-entry access to an in-memory PPTX archive.

use std::io::{Cursor, Read, Seek};

use deckreel_core::{Error, Result};
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened PPTX container.
///
/// Missing entries are reported as `Ok(None)`; an entry that exists but
/// cannot be read is an [`Error::CorruptEntry`].
pub struct PptxArchive<R> {
    archive: ZipArchive<R>,
}

impl PptxArchive<Cursor<Vec<u8>>> {
    /// Open an archive from the uploaded file's bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> PptxArchive<R> {
    /// Open an archive from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::MalformedArchive(format!("Failed to open ZIP: {}", e)))?;
        log::debug!("Opened archive with {} entries", archive.len());
        Ok(Self { archive })
    }

    /// Read an entry as UTF-8 text.
    pub fn read_text(&mut self, path: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::corrupt(path, e)),
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::corrupt(path, e))?;

        Ok(Some(content))
    }

    /// Read an entry as raw bytes.
    pub fn read_binary(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::corrupt(path, e)),
        };

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::corrupt(path, e))?;

        Ok(Some(content))
    }
}
