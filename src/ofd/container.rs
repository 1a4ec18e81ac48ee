//! ZIP container wrapper for OFD packages.

use super::paths;
use crate::error::{Error, Result};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Package paths with fixed locations.
pub(crate) mod names {
    pub const MANIFEST: &str = "OFD.xml";
}

/// ZIP container wrapper for OFD files.
///
/// Entry lookups are case-insensitive: an exact match wins, otherwise the
/// first entry (in archive order) whose name contains the requested path.
pub struct OfdContainer {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    /// File entries in archive order.
    entries: Vec<String>,
    /// Upper-cased entry names, parallel to `entries`.
    upper: Vec<String>,
}

impl OfdContainer {
    /// Opens an OFD container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Opens an OFD container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Opens an OFD container from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let cursor = Cursor::new(data);
        let mut archive = ZipArchive::new(cursor)?;

        let mut entries = Vec::new();
        for i in 0..archive.len() {
            if let Ok(file) = archive.by_index(i) {
                if !file.is_dir() {
                    entries.push(file.name().to_string());
                }
            }
        }
        let upper = entries.iter().map(|name| name.to_uppercase()).collect();

        Ok(Self {
            archive,
            entries,
            upper,
        })
    }

    /// File entry names in archive order.
    pub fn entry_names(&self) -> &[String] {
        &self.entries
    }

    /// Returns the entry name matching `path`, if any.
    pub fn find_entry(&self, path: &str) -> Option<&str> {
        let wanted = paths::normalize(path).to_uppercase();
        if wanted.is_empty() {
            return None;
        }

        let index = self
            .upper
            .iter()
            .position(|name| *name == wanted)
            .or_else(|| self.upper.iter().position(|name| name.contains(&wanted)))?;
        Some(self.entries[index].as_str())
    }

    /// Checks if an entry matches `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.find_entry(path).is_some()
    }

    /// Reads an entry as bytes.
    pub fn read_binary(&mut self, path: &str) -> Result<Vec<u8>> {
        let name = self
            .find_entry(path)
            .ok_or_else(|| Error::PartNotFound(path.to_string()))?
            .to_string();

        let mut file = self
            .archive
            .by_name(&name)
            .map_err(|e| Error::malformed(&name, e))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::malformed(&name, e))?;
        Ok(data)
    }

    /// Reads an entry as text. A UTF-8 BOM is dropped and invalid sequences
    /// are replaced.
    pub fn read_text(&mut self, path: &str) -> Result<String> {
        let data = self.read_binary(path)?;
        let body = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&data);
        Ok(match std::str::from_utf8(body) {
            Ok(text) => text.to_string(),
            Err(_) => {
                log::warn!("{path} is not valid UTF-8; decoding lossily");
                String::from_utf8_lossy(body).into_owned()
            }
        })
    }
}

impl std::fmt::Debug for OfdContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfdContainer")
            .field("entries", &self.entries.len())
            .finish()
    }
}
