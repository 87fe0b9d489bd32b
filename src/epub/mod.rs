//! EPUB parsing pipeline: container -> package -> navigation -> text flow.
//!
//! Each stage consumes the complete output of the previous one; any
//! stage failure aborts the whole parse. The two deliberate soft-skip
//! cases (a flattened target missing from the archive, a navigation
//! node whose target duplicates an already-emitted path) are handled
//! inside their stages and never abort.

pub mod container;
pub mod extract;
pub mod flatten;
pub mod package;
pub mod toc;

use std::io::{Read, Seek};
use std::path::Path;

use crate::archive::ArchiveIndex;
use crate::document::Document;
use crate::error::Result;

pub use container::Container;
pub use flatten::FlatNavPoint;
pub use package::{ManifestItem, NavKind, Package, SpineItem};
pub use toc::NavPoint;

/// Parse an EPUB file from disk into its flat reading flow.
///
/// # Example
///
/// ```no_run
/// use folio::read_document;
///
/// let document = read_document("path/to/book.epub")?;
/// for fragment in &document {
///     println!("{}", fragment.text);
/// }
/// # Ok::<(), folio::Error>(())
/// ```
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let mut index = ArchiveIndex::open(path)?;
    read_document_from_index(&mut index)
}

/// Parse an EPUB from any [`Read`] + [`Seek`] source.
///
/// Useful for reading from memory buffers or network streams.
pub fn read_document_from_reader<R: Read + Seek>(reader: R) -> Result<Document> {
    let mut index = ArchiveIndex::from_reader(reader)?;
    read_document_from_index(&mut index)
}

/// Run the pipeline stages over an already-opened archive.
pub fn read_document_from_index<R: Read + Seek>(index: &mut ArchiveIndex<R>) -> Result<Document> {
    let container = container::resolve(index)?;
    let package = package::resolve(index, &container)?;
    let points = toc::resolve(index, &package)?;
    let targets = flatten::flatten(&points, &package.base_dir);
    extract::extract(index, &targets)
}

// ----------------------------------------------------------------------------
// Archive path helpers
// ----------------------------------------------------------------------------

/// Directory of an archive path, without trailing slash ("" for root
/// entries).
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Join `href` against `base`, dropping any `#fragment` and normalizing
/// `.` and `..` components.
pub(crate) fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);

    let mut parts: Vec<&str> = Vec::new();
    if !base.is_empty() {
        parts.extend(base.split('/'));
    }
    for comp in href.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("OEBPS/content.opf"), "OEBPS");
        assert_eq!(parent_dir("OEBPS/text/ch1.xhtml"), "OEBPS/text");
        assert_eq!(parent_dir("content.opf"), "");
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(resolve_href("OEBPS", "ch1.xhtml"), "OEBPS/ch1.xhtml");
        assert_eq!(resolve_href("", "ch1.xhtml"), "ch1.xhtml");
        assert_eq!(resolve_href("OEBPS/text", "./ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve_href("OEBPS/text", "../images/a.png"), "OEBPS/images/a.png");
    }

    #[test]
    fn test_resolve_href_strips_fragment() {
        assert_eq!(resolve_href("OEBPS", "ch1.xhtml#top"), "OEBPS/ch1.xhtml");
        assert_eq!(resolve_href("", "ch1.xhtml#sec-2"), "ch1.xhtml");
    }
}
