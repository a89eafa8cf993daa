//! `%PDF-x.y` header sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;

/// Version information read from a PDF file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version, e.g. "1.7"
    pub version: String,
}

impl PdfHeader {
    /// Read and validate the header of a file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut header = [0u8; 16];
        let mut file = File::open(path)?;
        let read = file.read(&mut header)?;
        Self::from_bytes(&header[..read])
    }

    /// Validate the leading bytes of a PDF.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let Some(rest) = data.strip_prefix(PDF_MAGIC) else {
            return Err(Error::UnknownFormat);
        };
        let Some(version) = rest.get(..VERSION_LEN) else {
            return Err(Error::UnknownFormat);
        };

        let version = String::from_utf8_lossy(version).to_string();
        let bytes = version.as_bytes();
        if !(bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()) {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok(Self { version })
    }
}

/// Rendered the way document viewers label it, e.g. "PDF 1.7".
impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}
