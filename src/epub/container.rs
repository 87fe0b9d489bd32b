//! Container descriptor resolution (`META-INF/container.xml`).

use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::archive::ArchiveIndex;
use crate::error::{Error, Result};
use crate::util::local_name;

/// Fixed archive path of the container descriptor.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Location of the package document inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub rootfile: String,
}

/// Locate and parse the container descriptor.
///
/// A missing descriptor is fatal: without it no package document can
/// be located.
pub fn resolve<R: Read + Seek>(index: &mut ArchiveIndex<R>) -> Result<Container> {
    if !index.contains(CONTAINER_PATH) {
        return Err(Error::MissingContainer(CONTAINER_PATH.to_string()));
    }
    let content = index.read_to_string(CONTAINER_PATH)?;
    let rootfile = parse_rootfile(&content)?;
    Ok(Container { rootfile })
}

/// Extract the first `rootfile full-path` attribute.
fn parse_rootfile(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::MalformedPackage(format!("{CONTAINER_PATH}: {e}")));
            }
            _ => {}
        }
    }

    Err(Error::MissingContainer(format!(
        "{CONTAINER_PATH}: no rootfile entry"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rootfile() {
        let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

        assert_eq!(parse_rootfile(container).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_parse_rootfile_first_wins() {
        let container = r#"<container>
  <rootfiles>
    <rootfile full-path="first.opf" media-type="application/oebps-package+xml"/>
    <rootfile full-path="second.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

        assert_eq!(parse_rootfile(container).unwrap(), "first.opf");
    }

    #[test]
    fn test_parse_rootfile_missing() {
        let container = r#"<container><rootfiles/></container>"#;

        assert!(matches!(
            parse_rootfile(container),
            Err(Error::MissingContainer(_))
        ));
    }
}
