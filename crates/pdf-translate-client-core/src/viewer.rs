//! Side-by-side view of original and translated page text.

use crate::document::{Page, find_page};

pub const ORIGINAL_PLACEHOLDER: &str = "No content available";
pub const TRANSLATION_PLACEHOLDER: &str = "No translation available";

/// One entry of the page selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOption {
    pub page_number: u32,
    pub label: String,
}

/// What the viewer shows for one page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView<'a> {
    pub page_number: u32,
    pub original: Option<&'a str>,
    pub translated: Option<&'a str>,
}

impl<'a> PageView<'a> {
    pub fn original_text(&self) -> &'a str {
        self.original.unwrap_or(ORIGINAL_PLACEHOLDER)
    }

    pub fn translated_text(&self) -> &'a str {
        self.translated.unwrap_or(TRANSLATION_PLACEHOLDER)
    }
}

pub struct ResultsViewer<'a> {
    original: &'a [Page],
    translated: &'a [Page],
}

impl<'a> ResultsViewer<'a> {
    pub const fn new(original: &'a [Page], translated: &'a [Page]) -> Self {
        Self {
            original,
            translated,
        }
    }

    /// One option per original page, in document order
    pub fn page_options(&self) -> Vec<PageOption> {
        self.original
            .iter()
            .map(|page| PageOption {
                page_number: page.page_number,
                label: format!("Page {}", page.page_number),
            })
            .collect()
    }

    /// Look the page up on both sides independently; a missing side gets a placeholder.
    pub fn show(&self, page_number: u32) -> PageView<'a> {
        PageView {
            page_number,
            original: find_page(self.original, page_number).map(|p| p.content.as_str()),
            translated: find_page(self.translated, page_number).map(|p| p.content.as_str()),
        }
    }
}
