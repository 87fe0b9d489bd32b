//! Flat reading-flow representation produced by the parse pipeline.

/// Classification of a text fragment, derived from the markup element
/// that directly contained it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum FragmentKind {
    /// Section headings (h1-h6, or a title element inside body content).
    Heading,
    /// Running text (paragraphs, divs, spans, list items, table cells, links).
    Body,
    /// Text from any other element.
    Other,
}

/// A single unit of display text. The text is always non-empty after
/// trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    pub text: String,
    pub kind: FragmentKind,
}

impl Fragment {
    pub fn new(text: impl Into<String>, kind: FragmentKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// The ordered sequence of fragments extracted from a book, in reading
/// order. This is the pipeline's final output and the only structure a
/// display layer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub fragments: Vec<Fragment>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.fragments.iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}
