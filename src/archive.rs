//! ZIP-backed archive index with path-keyed entry access.

use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::util::decode_text;

/// Index over every entry in an OCF archive.
///
/// Owns the archive handle for the duration of a parse. Entry reads
/// borrow the index mutably, so each read is a scoped single-pass
/// acquisition released before the next one starts.
pub struct ArchiveIndex<R: Read + Seek> {
    archive: ZipArchive<R>,
    entries: HashSet<String>,
}

impl ArchiveIndex<std::fs::File> {
    /// Open an archive file from disk and index its entries.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> ArchiveIndex<R> {
    /// Index an archive from any [`Read`] + [`Seek`] source.
    ///
    /// Fails with [`Error::Archive`] when the input is not a valid ZIP
    /// container.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let entries = archive.file_names().map(str::to_string).collect();
        Ok(Self { archive, entries })
    }

    /// Whether an entry exists at `path` (exact or percent-decoded).
    pub fn contains(&self, path: &str) -> bool {
        if self.entries.contains(path) {
            return true;
        }
        match decoded_path(path) {
            Some(decoded) => self.entries.contains(decoded.as_ref()),
            None => false,
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read an entry's full contents.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        // Try direct lookup first
        match self.archive.by_name(path) {
            Ok(mut file) => {
                let mut contents = Vec::new();
                file.read_to_end(&mut contents)
                    .map_err(|e| Error::EntryRead(format!("{path}: {e}")))?;
                return Ok(contents);
            }
            Err(zip::result::ZipError::FileNotFound) => {}
            Err(e) => return Err(Error::EntryRead(format!("{path}: {e}"))),
        }

        // Fallback: percent-decoded path (handles malformed EPUBs whose
        // hrefs are URL-encoded but whose entries are not)
        let decoded = decoded_path(path).ok_or_else(|| Error::EntryNotFound(path.to_string()))?;

        let mut file = self
            .archive
            .by_name(&decoded)
            .map_err(|e| match e {
                zip::result::ZipError::FileNotFound => Error::EntryNotFound(path.to_string()),
                other => Error::EntryRead(format!("{path}: {other}")),
            })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| Error::EntryRead(format!("{path}: {e}")))?;
        Ok(contents)
    }

    /// Read an entry and decode it to text (BOM stripped, UTF-8 with
    /// Windows-1252 fallback).
    pub fn read_to_string(&mut self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        Ok(decode_text(crate::util::strip_bom(&bytes)).into_owned())
    }
}

/// Percent-decoded form of `path`, if it decodes to valid UTF-8 and
/// differs from the input.
fn decoded_path(path: &str) -> Option<std::borrow::Cow<'_, str>> {
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .ok()?;
    if decoded == path { None } else { Some(decoded) }
}
