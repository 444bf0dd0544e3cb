// src/document/model.rs
//
// Thin view over one document as produced by the external page-rendering /
// table-geometry collaborator. The collaborator dumps each document as JSON:
// per page, the free text plus zero or more raw tables, each a grid of
// optional cell strings with a vertical offset on the page.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::utils::error::ExtractError;

static INSTITUTE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Institute Name:\s*(.*?)\s*\[").expect("Failed to compile INSTITUTE_NAME_RE")
});

static INSTITUTE_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(IR-[^\]]+)\]").expect("Failed to compile INSTITUTE_CODE_RE")
});

/// One raw table on a page: a grid of optional cell strings plus the
/// table's vertical offset (distance from the page top).
#[derive(Debug, Clone, Deserialize)]
pub struct RawTable {
    /// Vertical offset of the table's top edge on the page.
    #[serde(default)]
    pub top: f64,
    /// Page text cropped strictly above this table, when the collaborator
    /// provides it. Falls back to a proportional split of the page text.
    #[serde(default)]
    pub text_above: Option<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

fn default_page_height() -> f64 {
    842.0 // A4 points; used only for the proportional text fallback
}

/// One page: free text plus the tables found on it, in extraction order.
#[derive(Debug, Clone, Deserialize)]
pub struct PageModel {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_page_height")]
    pub height: f64,
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

/// A whole document in page order.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentModel {
    pub pages: Vec<PageModel>,
}

/// Institute identity recovered from the first page's free text.
/// Sentinel values are valid identities, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstituteInfo {
    pub name: String,
    pub code: String,
}

impl InstituteInfo {
    pub const NOT_FOUND: &'static str = "Not Found";
}

impl DocumentModel {
    /// Parses a page-dump JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ExtractError> {
        serde_json::from_slice(bytes).map_err(|e| ExtractError::DocumentUnreadable(e.to_string()))
    }

    /// Recovers the institute name and code from the first page's text.
    /// Missing pages or non-matching text yield the "Not Found" sentinels.
    pub fn institute_info(&self) -> InstituteInfo {
        let first_page_text = self.pages.first().map(|p| p.text.as_str()).unwrap_or("");

        let name = INSTITUTE_NAME_RE
            .captures(first_page_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| InstituteInfo::NOT_FOUND.to_string());

        let code = INSTITUTE_CODE_RE
            .captures(first_page_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| InstituteInfo::NOT_FOUND.to_string());

        InstituteInfo { name, code }
    }
}
