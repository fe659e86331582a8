//! Named, re-readable byte sources.
//!
//! Every conversion starts from a [`Source`] (the QRDA document) and can hand its
//! result back out as another [`Source`] (the rendered QPP JSON), so downstream
//! writers never care whether the bytes came from disk or memory.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::Result;

/// An in-memory document together with the identifier used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    bytes: Vec<u8>,
}

impl Source {
    /// Wrap bytes that are already in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file; the file name becomes the source identifier.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    /// Identifier of this source (file name, or a fixed label such as `QPP`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the source holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A fresh reader positioned at the start. May be called any number of times.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_reader_is_restartable() {
        let source = Source::from_bytes("QPP", "{}".as_bytes());

        for _ in 0..2 {
            let mut text = String::new();
            source.reader().read_to_string(&mut text).unwrap();
            assert_eq!(text, "{}");
        }
        assert_eq!(source.name(), "QPP");
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xml");
        fs::write(&path, "<ClinicalDocument/>").unwrap();

        let source = Source::from_path(&path).unwrap();
        assert_eq!(source.name(), "report.xml");
        assert_eq!(source.bytes(), b"<ClinicalDocument/>");
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Source::from_path(&dir.path().join("absent.xml")).unwrap_err();
        assert!(matches!(err, crate::error::ConversionError::IoError(_)));
    }
}
