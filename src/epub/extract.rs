//! Markup-to-text extraction with tag-based classification.

use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::archive::ArchiveIndex;
use crate::document::{Document, Fragment, FragmentKind};
use crate::error::{Error, Result};
use crate::util::{decode_text, local_name, resolve_entity, strip_bom};

use super::flatten::FlatNavPoint;

/// Extract classified text fragments from every flattened target, in
/// order.
///
/// A target whose path is absent from the archive is skipped silently:
/// a dangling navigation reference costs its section, not the parse.
pub fn extract<R: Read + Seek>(
    index: &mut ArchiveIndex<R>,
    targets: &[FlatNavPoint],
) -> Result<Document> {
    let mut fragments = Vec::new();

    for target in targets {
        if !index.contains(&target.path) {
            continue;
        }
        let bytes = index.read(&target.path)?;
        let content = decode_text(strip_bom(&bytes));
        extract_fragments(&content, &target.path, &mut fragments)?;
    }

    Ok(Document { fragments })
}

/// Stream one markup document, appending a fragment per surviving text
/// run.
///
/// The open-element stack stands in for a DOM walk: text events arrive
/// in document order and the stack top is the nearest containing
/// element. Runs accumulate across entity references and CDATA until an
/// element boundary, so a label split by `&apos;` stays one fragment.
pub fn extract_fragments(content: &str, path: &str, out: &mut Vec<Fragment>) -> Result<()> {
    let mut reader = Reader::from_str(content);

    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut pending = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                flush(&mut pending, &open, out);
                open.push(local_name(e.name().as_ref()).to_ascii_lowercase());
            }
            Ok(Event::End(_)) => {
                flush(&mut pending, &open, out);
                open.pop();
            }
            Ok(Event::Empty(_)) => {
                // Self-closing elements like <br/> split the run but
                // never contain text.
                flush(&mut pending, &open, out);
            }
            Ok(Event::Text(e)) => {
                pending.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(e)) => {
                pending.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    pending.push_str(&resolved);
                }
            }
            Ok(Event::Eof) => {
                flush(&mut pending, &open, out);
                break;
            }
            Err(e) => return Err(Error::MalformedMarkup(format!("{path}: {e}"))),
            _ => {}
        }
    }

    Ok(())
}

/// Emit the pending text run if it survives trimming and its nearest
/// containing element is a content region.
fn flush(pending: &mut String, open: &[Vec<u8>], out: &mut Vec<Fragment>) {
    let text = pending.trim();
    if !text.is_empty()
        && let Some(parent) = open.last()
        && !is_skipped(parent)
    {
        out.push(Fragment::new(text, classify(parent)));
    }
    pending.clear();
}

/// Tags whose direct text content never contributes fragments.
fn is_skipped(tag: &[u8]) -> bool {
    matches!(tag, b"title" | b"head")
}

/// Flat tag -> classification dispatch.
///
/// A `title` element only reaches this point when it survived the skip
/// check, i.e. it sits inside body content; it reads as a heading there.
fn classify(tag: &[u8]) -> FragmentKind {
    match tag {
        b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" | b"title" => FragmentKind::Heading,
        b"p" | b"div" | b"span" | b"a" | b"li" | b"td" => FragmentKind::Body,
        _ => FragmentKind::Other,
    }
}
