//! # folio
//!
//! A fast, lightweight library for extracting an EPUB's text as a
//! flat, reading-order sequence of classified fragments.
//!
//! ## Features
//!
//! - Reads EPUB 2 (NCX) and EPUB 3 (nav document) tables of contents
//! - Flattens the navigation tree into a deduplicated, ordered target
//!   list
//! - Extracts classified text fragments (heading / body / other) from
//!   each target's markup
//! - Tolerates dangling navigation references and URL-encoded entry
//!   paths
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{read_document, FragmentKind};
//!
//! let document = read_document("book.epub")?;
//! for fragment in &document {
//!     match fragment.kind {
//!         FragmentKind::Heading => println!("# {}", fragment.text),
//!         _ => println!("{}", fragment.text),
//!     }
//! }
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! Parsing runs as a strict sequence of stages, each consuming the
//! previous stage's complete output:
//!
//! 1. [`archive::ArchiveIndex`] — index the ZIP container
//! 2. [`epub::container`] — locate the package document
//! 3. [`epub::package`] — manifest, spine, navigation item
//! 4. [`epub::toc`] — parse the navigation tree
//! 5. [`epub::flatten`] — flatten to ordered, deduplicated targets
//! 6. [`epub::extract`] — emit classified text fragments

pub mod archive;
#[cfg(feature = "cli")]
pub mod cache;
pub mod document;
pub mod epub;
pub mod error;
#[cfg(feature = "cli")]
pub mod progress;
pub(crate) mod util;

pub use archive::ArchiveIndex;
pub use document::{Document, Fragment, FragmentKind};
pub use epub::{FlatNavPoint, NavPoint, read_document, read_document_from_reader};
pub use error::{Error, Result};
