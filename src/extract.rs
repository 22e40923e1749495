//! Structured content extraction from a rendered page.
//!
//! A single in-page evaluation gathers headings, anchor texts, images, meta
//! tags, and main-content blocks, returning them as one JSON document. The
//! evaluation is a pure read: it never mutates the page.

use crate::error::{RenderError, Result};
use crate::page::PageDriver;
use serde::{Deserialize, Serialize};

/// Heading texts bucketed by level. A page without a given level yields an
/// empty list for it, never a missing field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headings {
    #[serde(default)]
    pub h1: Vec<String>,

    #[serde(default)]
    pub h2: Vec<String>,

    #[serde(default)]
    pub h3: Vec<String>,
}

/// One `<img>` element. Width/height are the rendered dimensions and are
/// absent when the image has not loaded (e.g. blocked on the scrape path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,

    #[serde(default)]
    pub alt: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Head metadata. Optional fields are `None` when the tag is absent from
/// `<head>`, which is distinct from a tag present with empty content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTags {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
}

/// Everything the scrape endpoint returns for one page. Created once per
/// request and serialized directly into the response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    #[serde(default)]
    pub headings: Headings,

    /// Anchor texts in document order
    #[serde(default)]
    pub links: Vec<String>,

    #[serde(default)]
    pub images: Vec<ImageRef>,

    #[serde(default)]
    pub meta_tags: MetaTags,

    /// Non-empty text blocks from the landmark selectors (`main`, `#root`,
    /// `#app`, `[role="main"]`), in scan order, not deduplicated
    #[serde(default)]
    pub main_content: Vec<String>,
}

const EXTRACT_CONTENT_JS: &str = include_str!("extract_content.js");

/// Run the extraction script against a rendered page and parse its result
pub fn extract<P: PageDriver>(page: &P) -> Result<ExtractedContent> {
    let value = page.evaluate(EXTRACT_CONTENT_JS)?;

    // The script returns a JSON string; tolerate an already-parsed object.
    match value {
        serde_json::Value::String(json) => serde_json::from_str(&json).map_err(|e| {
            RenderError::Extraction(format!("failed to parse extraction result: {}", e))
        }),
        serde_json::Value::Null => Err(RenderError::Extraction(
            "extraction script returned no value".to_string(),
        )),
        other => serde_json::from_value(other).map_err(|e| {
            RenderError::Extraction(format!("failed to decode extraction result: {}", e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageDriver;

    /// Page driver that answers every evaluation with a canned value
    struct CannedPage(serde_json::Value);

    impl PageDriver for CannedPage {
        fn goto(&self, _url: &str) -> crate::error::Result<()> {
            Ok(())
        }

        fn evaluate(&self, _js: &str) -> crate::error::Result<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_extract_parses_stringified_payload() {
        let payload = r#"{
            "headings": {"h1": ["Main Heading"], "h2": ["A", "B"], "h3": []},
            "links": ["First", "Second"],
            "images": [{"src": "/logo.png", "alt": "logo", "title": ""}],
            "metaTags": {"title": "Test Page", "description": "A page"},
            "mainContent": ["Hello world"]
        }"#;
        let page = CannedPage(serde_json::Value::String(payload.to_string()));

        let content = extract(&page).unwrap();
        assert_eq!(content.headings.h1, vec!["Main Heading"]);
        assert_eq!(content.headings.h2.len(), 2);
        assert_eq!(content.links, vec!["First", "Second"]);
        assert_eq!(content.images[0].src, "/logo.png");
        assert_eq!(content.meta_tags.title, "Test Page");
        assert_eq!(content.main_content, vec!["Hello world"]);
    }

    #[test]
    fn test_missing_heading_level_is_empty_not_error() {
        // No h3 on the page: the field is an empty list, not absent
        let payload = r#"{
            "headings": {"h1": ["Only"], "h2": [], "h3": []},
            "links": [],
            "images": [],
            "metaTags": {"title": ""},
            "mainContent": []
        }"#;
        let page = CannedPage(serde_json::Value::String(payload.to_string()));

        let content = extract(&page).unwrap();
        assert_eq!(content.headings.h3, Vec::<String>::new());
    }

    #[test]
    fn test_absent_meta_is_none_not_empty_string() {
        let payload = r#"{
            "headings": {"h1": [], "h2": [], "h3": []},
            "links": [],
            "images": [],
            "metaTags": {"title": "t", "description": "", "ogTitle": "shared"},
            "mainContent": []
        }"#;
        let page = CannedPage(serde_json::Value::String(payload.to_string()));

        let content = extract(&page).unwrap();
        // og:description was absent entirely; description was present but empty
        assert_eq!(content.meta_tags.og_description, None);
        assert_eq!(content.meta_tags.description, Some(String::new()));
        assert_ne!(content.meta_tags.og_description, Some(String::new()));
        assert_eq!(content.meta_tags.og_title.as_deref(), Some("shared"));
    }

    #[test]
    fn test_image_dimensions_are_optional() {
        let payload = r#"{
            "headings": {"h1": [], "h2": [], "h3": []},
            "links": [],
            "images": [
                {"src": "a.png", "alt": "", "title": "", "width": 120, "height": 80},
                {"src": "b.png", "alt": "blocked", "title": ""}
            ],
            "metaTags": {"title": ""},
            "mainContent": []
        }"#;
        let page = CannedPage(serde_json::Value::String(payload.to_string()));

        let content = extract(&page).unwrap();
        assert_eq!(content.images[0].width, Some(120));
        assert_eq!(content.images[1].width, None);
    }

    #[test]
    fn test_no_value_is_an_extraction_error() {
        let page = CannedPage(serde_json::Value::Null);
        assert!(extract(&page).is_err());
    }

    #[test]
    fn test_serializes_camel_case_envelope_fields() {
        let content = ExtractedContent {
            meta_tags: MetaTags {
                title: "t".to_string(),
                og_title: Some("og".to_string()),
                ..MetaTags::default()
            },
            ..ExtractedContent::default()
        };

        let json = serde_json::to_value(&content).unwrap();
        assert!(json.get("metaTags").is_some());
        assert!(json.get("mainContent").is_some());
        assert_eq!(json["metaTags"]["ogTitle"], "og");
        // absent optionals are dropped, not serialized as null or ""
        assert!(json["metaTags"].get("ogDescription").is_none());
    }
}
