//! Package (OPF) document resolution: manifest, spine, navigation item.

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::archive::ArchiveIndex;
use crate::error::{Error, Result};
use crate::util::{local_name, resolve_entity};

use super::{Container, parent_dir, resolve_href};

/// Media type of a legacy compiled navigation document (NCX).
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// A declared resource in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

/// A reference into the manifest; spine order defines reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub idref: String,
}

/// Which marker identified the navigation document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    /// Legacy compiled navigation (NCX media type).
    Ncx,
    /// EPUB 3 navigation document (`properties="nav"`).
    Nav,
}

/// Parsed package document.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub title: Option<String>,
    /// Manifest keyed by item id; spine and navigation references
    /// resolve through this map.
    pub manifest: HashMap<String, ManifestItem>,
    pub spine: Vec<SpineItem>,
    /// Archive-absolute path of the navigation document, if the
    /// manifest declared one. Consumption without one fails there.
    pub nav_path: Option<String>,
    pub nav_kind: Option<NavKind>,
    /// Directory containing the package document; hrefs resolve
    /// against it.
    pub base_dir: String,
}

impl Package {
    /// Spine-ordered archive paths of the content documents. Dangling
    /// idrefs are skipped.
    pub fn reading_order(&self) -> Vec<String> {
        self.spine
            .iter()
            .filter_map(|item| self.manifest.get(&item.idref))
            .map(|item| resolve_href(&self.base_dir, &item.href))
            .collect()
    }
}

/// Look up and parse the package document named by the container.
pub fn resolve<R: Read + Seek>(
    index: &mut ArchiveIndex<R>,
    container: &Container,
) -> Result<Package> {
    if container.rootfile.is_empty() {
        return Err(Error::MissingPackage(
            "container names no package document".to_string(),
        ));
    }
    if !index.contains(&container.rootfile) {
        return Err(Error::MissingPackage(container.rootfile.clone()));
    }
    let content = index.read_to_string(&container.rootfile)?;
    parse_package(&content, &container.rootfile)
}

/// Parse the OPF content. `rootfile` is the document's own archive path,
/// used for href resolution and error context.
pub fn parse_package(content: &str, rootfile: &str) -> Result<Package> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let base_dir = parent_dir(rootfile).to_string();

    // Items in document order; the nav scan needs it even though the
    // stored manifest is id-keyed.
    let mut items: Vec<ManifestItem> = Vec::new();
    let mut spine: Vec<SpineItem> = Vec::new();
    let mut title: Option<String> = None;

    let mut in_metadata = false;
    let mut in_title = false;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"title" if in_metadata && title.is_none() => {
                        in_title = true;
                        buf_text.clear();
                    }
                    b"item" => {
                        if let Some(item) = parse_item(&e, rootfile)? {
                            items.push(item);
                        }
                    }
                    b"itemref" => {
                        if let Some(idref) = attr_value(&e, b"idref", rootfile)? {
                            spine.push(SpineItem { idref });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"item" => {
                        if let Some(item) = parse_item(&e, rootfile)? {
                            items.push(item);
                        }
                    }
                    b"itemref" => {
                        if let Some(idref) = attr_value(&e, b"idref", rootfile)? {
                            spine.push(SpineItem { idref });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_title {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_title {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = false,
                    b"title" if in_title => {
                        in_title = false;
                        let text = buf_text.trim();
                        if !text.is_empty() {
                            title = Some(text.to_string());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::MalformedPackage(format!("{rootfile}: {e}"))),
            _ => {}
        }
    }

    // Navigation item: single pass in manifest order, either marker,
    // first match wins. The matched marker selects the TOC grammar.
    let mut nav_path = None;
    let mut nav_kind = None;
    for item in &items {
        let kind = if item.media_type == NCX_MEDIA_TYPE {
            Some(NavKind::Ncx)
        } else if has_property(item.properties.as_deref(), "nav") {
            Some(NavKind::Nav)
        } else {
            None
        };

        if let Some(kind) = kind {
            nav_path = Some(resolve_href(&base_dir, &item.href));
            nav_kind = Some(kind);
            break;
        }
    }

    let manifest: HashMap<String, ManifestItem> = items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    Ok(Package {
        title,
        manifest,
        spine,
        nav_path,
        nav_kind,
        base_dir,
    })
}

fn parse_item(e: &BytesStart<'_>, rootfile: &str) -> Result<Option<ManifestItem>> {
    let mut id = String::new();
    let mut href = String::new();
    let mut media_type = String::new();
    let mut properties: Option<String> = None;

    for attr in e.attributes().flatten() {
        let value = || {
            String::from_utf8(attr.value.to_vec())
                .map_err(|err| Error::MalformedPackage(format!("{rootfile}: {err}")))
        };
        match attr.key.as_ref() {
            b"id" => id = value()?,
            b"href" => href = value()?,
            b"media-type" => media_type = value()?,
            b"properties" => properties = Some(value()?),
            _ => {}
        }
    }

    if id.is_empty() {
        return Ok(None);
    }

    Ok(Some(ManifestItem {
        id,
        href,
        media_type,
        properties,
    }))
}

fn attr_value(e: &BytesStart<'_>, key: &[u8], rootfile: &str) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = String::from_utf8(attr.value.to_vec())
                .map_err(|err| Error::MalformedPackage(format!("{rootfile}: {err}")))?;
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Whether a space-separated properties list contains `wanted`.
fn has_property(properties: Option<&str>, wanted: &str) -> bool {
    properties.is_some_and(|props| props.split_ascii_whitespace().any(|p| p == wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="text/c2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="c2"/>
    <itemref idref="c1"/>
  </spine>
</package>"#;

    #[test]
    fn test_parse_package() {
        let package = parse_package(OPF, "OEBPS/content.opf").unwrap();

        assert_eq!(package.title.as_deref(), Some("Test Book"));
        assert_eq!(package.base_dir, "OEBPS");
        assert_eq!(package.manifest.len(), 3);
        assert_eq!(package.manifest["c1"].href, "c1.xhtml");
        assert_eq!(
            package.manifest["c1"].media_type,
            "application/xhtml+xml"
        );
        assert_eq!(
            package.spine,
            vec![
                SpineItem { idref: "c2".to_string() },
                SpineItem { idref: "c1".to_string() },
            ]
        );
    }

    #[test]
    fn test_nav_detection_properties() {
        let package = parse_package(OPF, "OEBPS/content.opf").unwrap();

        assert_eq!(package.nav_path.as_deref(), Some("OEBPS/nav.xhtml"));
        assert_eq!(package.nav_kind, Some(NavKind::Nav));
    }

    #[test]
    fn test_nav_detection_ncx() {
        let opf = r#"<package>
  <manifest>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#;

        let package = parse_package(opf, "content.opf").unwrap();
        assert_eq!(package.nav_path.as_deref(), Some("toc.ncx"));
        assert_eq!(package.nav_kind, Some(NavKind::Ncx));
    }

    #[test]
    fn test_nav_tiebreak_manifest_order() {
        // Both markers present: whichever item comes first wins.
        let opf = r#"<package>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine/>
</package>"#;

        let package = parse_package(opf, "content.opf").unwrap();
        assert_eq!(package.nav_path.as_deref(), Some("nav.xhtml"));
        assert_eq!(package.nav_kind, Some(NavKind::Nav));

        let opf_reversed = r#"<package>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
  </manifest>
  <spine/>
</package>"#;

        let package = parse_package(opf_reversed, "content.opf").unwrap();
        assert_eq!(package.nav_path.as_deref(), Some("toc.ncx"));
        assert_eq!(package.nav_kind, Some(NavKind::Ncx));
    }

    #[test]
    fn test_no_nav_item() {
        let opf = r#"<package>
  <manifest>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#;

        let package = parse_package(opf, "content.opf").unwrap();
        assert_eq!(package.nav_path, None);
        assert_eq!(package.nav_kind, None);
    }

    #[test]
    fn test_nav_property_token_match() {
        // properties is a space-separated token list
        let opf = r#"<package>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="scripted nav"/>
  </manifest>
  <spine/>
</package>"#;

        let package = parse_package(opf, "content.opf").unwrap();
        assert_eq!(package.nav_kind, Some(NavKind::Nav));

        // "navigation" is not the "nav" token
        let opf_other = r#"<package>
  <manifest>
    <item id="x" href="x.xhtml" media-type="application/xhtml+xml" properties="navigation"/>
  </manifest>
  <spine/>
</package>"#;

        let package = parse_package(opf_other, "content.opf").unwrap();
        assert_eq!(package.nav_kind, None);
    }

    #[test]
    fn test_reading_order_follows_spine() {
        let package = parse_package(OPF, "OEBPS/content.opf").unwrap();

        assert_eq!(
            package.reading_order(),
            vec!["OEBPS/text/c2.xhtml", "OEBPS/c1.xhtml"]
        );
    }

    #[test]
    fn test_reading_order_skips_dangling_idref() {
        let opf = r#"<package>
  <manifest>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="ghost"/>
    <itemref idref="c1"/>
  </spine>
</package>"#;

        let package = parse_package(opf, "content.opf").unwrap();
        assert_eq!(package.reading_order(), vec!["c1.xhtml"]);
    }

    #[test]
    fn test_malformed_package() {
        // Mismatched end tag
        let result = parse_package("<package><manifest></spine></package>", "content.opf");
        assert!(matches!(result, Err(Error::MalformedPackage(_))));
    }
}
