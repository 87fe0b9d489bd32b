//! Navigation document resolution into the nested navigation tree.
//!
//! Two grammars are in the wild: the legacy NCX (`navMap`/`navPoint`)
//! and the EPUB 3 navigation document (`nav`/`ol`/`li`/`a`). The marker
//! that identified the navigation item in the manifest selects which
//! grammar to expect.

use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::archive::ArchiveIndex;
use crate::error::{Error, Result};
use crate::util::{local_name, resolve_entity};

use super::package::{NavKind, Package};

/// A node in the navigation tree: a label, a target reference (href,
/// possibly carrying an in-document fragment), and nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub label: String,
    pub target: String,
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            children: Vec::new(),
        }
    }
}

/// Open and parse the navigation document declared by the package.
///
/// The package must have identified a navigation item; a package
/// without one is only discovered to be unusable here.
pub fn resolve<R: Read + Seek>(
    index: &mut ArchiveIndex<R>,
    package: &Package,
) -> Result<Vec<NavPoint>> {
    let Some(path) = package.nav_path.as_deref() else {
        return Err(Error::MissingNavigation(
            "package manifest declares no navigation document".to_string(),
        ));
    };
    if !index.contains(path) {
        return Err(Error::MissingNavigation(path.to_string()));
    }

    let content = index.read_to_string(path)?;
    match package.nav_kind {
        Some(NavKind::Nav) => parse_nav(&content, path),
        _ => parse_ncx(&content, path),
    }
}

/// Parse the NCX grammar (`navMap` > nested `navPoint`).
pub fn parse_ncx(content: &str, path: &str) -> Result<Vec<NavPoint>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    struct NavPointState {
        children: Vec<NavPoint>,
        label: Option<String>,
        target: Option<String>,
    }

    // Sentinel root state collects the top-level points.
    let mut stack: Vec<NavPointState> = vec![NavPointState {
        children: Vec::new(),
        label: None,
        target: None,
    }];
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"navPoint" => {
                        stack.push(NavPointState {
                            children: Vec::new(),
                            label: None,
                            target: None,
                        });
                    }
                    b"text" => in_text = true,
                    b"content" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"src"
                                && let Some(state) = stack.last_mut()
                            {
                                state.target = Some(
                                    String::from_utf8(attr.value.to_vec())
                                        .map_err(|err| {
                                            Error::MalformedNavigation(format!("{path}: {err}"))
                                        })?,
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"content" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"src"
                            && let Some(state) = stack.last_mut()
                        {
                            state.target = Some(
                                String::from_utf8(attr.value.to_vec())
                                    .map_err(|err| {
                                        Error::MalformedNavigation(format!("{path}: {err}"))
                                    })?,
                            );
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    match &mut state.label {
                        Some(existing) => existing.push_str(&raw),
                        None => state.label = Some(raw.into_owned()),
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        match &mut state.label {
                            Some(existing) => existing.push_str(&resolved),
                            None => state.label = Some(resolved),
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"text" => in_text = false,
                    b"navPoint" => {
                        if let Some(state) = stack.pop()
                            && let (Some(label), Some(target)) = (state.label, state.target)
                        {
                            let mut point = NavPoint::new(label, target);
                            point.children = state.children;

                            if let Some(parent) = stack.last_mut() {
                                parent.children.push(point);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedNavigation(format!("{path}: {e}"))),
            _ => {}
        }
    }

    Ok(stack.pop().map(|s| s.children).unwrap_or_default())
}

/// Parse the EPUB 3 navigation grammar (`nav` > `ol` > nested `li`).
///
/// Only the table-of-contents `nav` is consumed: the first `nav`
/// element whose `epub:type` is absent or contains the `toc` token.
/// An `li` without an anchor target contributes no node itself but its
/// children are spliced into its parent.
pub fn parse_nav(content: &str, path: &str) -> Result<Vec<NavPoint>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    struct ListItemState {
        children: Vec<NavPoint>,
        label: Option<String>,
        target: Option<String>,
    }

    let mut stack: Vec<ListItemState> = vec![ListItemState {
        children: Vec::new(),
        label: None,
        target: None,
    }];

    // 0 = before the toc nav, 1 = inside it, 2 = done.
    let mut nav_state = 0u8;
    // Depth of nested non-toc navs being skipped.
    let mut skip_depth = 0usize;
    let mut in_anchor = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if skip_depth > 0 {
                    if local == b"nav" {
                        skip_depth += 1;
                    }
                    continue;
                }

                match local {
                    b"nav" => {
                        if nav_state == 0 && nav_type_is_toc(&e) {
                            nav_state = 1;
                        } else {
                            skip_depth = 1;
                        }
                    }
                    b"li" if nav_state == 1 => {
                        stack.push(ListItemState {
                            children: Vec::new(),
                            label: None,
                            target: None,
                        });
                    }
                    b"a" if nav_state == 1 => {
                        if let Some(state) = stack.last_mut()
                            && state.target.is_none()
                        {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"href" {
                                    state.target = Some(
                                        String::from_utf8(attr.value.to_vec()).map_err(|err| {
                                            Error::MalformedNavigation(format!("{path}: {err}"))
                                        })?,
                                    );
                                }
                            }
                            in_anchor = true;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_anchor && let Some(state) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    match &mut state.label {
                        Some(existing) => existing.push_str(&raw),
                        None => state.label = Some(raw.into_owned()),
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_anchor && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        match &mut state.label {
                            Some(existing) => existing.push_str(&resolved),
                            None => state.label = Some(resolved),
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if skip_depth > 0 {
                    if local == b"nav" {
                        skip_depth -= 1;
                    }
                    continue;
                }

                match local {
                    b"nav" if nav_state == 1 => nav_state = 2,
                    b"a" => in_anchor = false,
                    b"li" if nav_state == 1 && stack.len() > 1 => {
                        if let Some(state) = stack.pop()
                            && let Some(parent) = stack.last_mut()
                        {
                            match (state.label, state.target) {
                                (Some(label), Some(target)) => {
                                    let mut point = NavPoint::new(label, target);
                                    point.children = state.children;
                                    parent.children.push(point);
                                }
                                // Unlinked section header: keep its subtree.
                                _ => parent.children.extend(state.children),
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedNavigation(format!("{path}: {e}"))),
            _ => {}
        }
    }

    Ok(stack.pop().map(|s| s.children).unwrap_or_default())
}

/// Whether a `nav` element is (or may be) the table of contents:
/// `epub:type` absent, or containing the `toc` token.
fn nav_type_is_toc(e: &quick_xml::events::BytesStart<'_>) -> bool {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"type" {
            let value = String::from_utf8_lossy(&attr.value);
            return value.split_ascii_whitespace().any(|t| t == "toc");
        }
    }
    true
}
