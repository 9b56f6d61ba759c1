//! Domain types for the vendor catalog import.
//!
//! These are plain value aggregates built up incrementally by the parser
//! and handed to the storage layer. Nested sequences keep document order;
//! the top-level maps are keyed by natural key (external id / SKU).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ArticleGroup
// ---------------------------------------------------------------------------

/// A product group from the vendor feed, keyed by its external id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleGroup {
    /// Human-readable group name. Groups with an empty trimmed name are
    /// dropped from the result.
    pub name: String,
    /// Natural key from the source system.
    pub external_id: String,
    /// Group-level specifications, in document order.
    pub specifications: Vec<Specification>,
}

/// A group-level name/value specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A single article (product) from the vendor feed, keyed by SKU.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    /// Natural key. Generated when the source omits one, so never empty.
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source-system id of the article itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// External id of the enclosing group. Resolved to an internal id at
    /// save time, not at parse time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub specifications: Vec<ArticleSpecification>,
    pub assets: Vec<Asset>,
    pub classifications: Vec<Classification>,
    pub related_articles: Vec<RelatedArticle>,
}

/// An article-level specification. Unit and property type are optional
/// extensions some vendor feeds carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleSpecification {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// Kind of an article asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Image,
    Document,
    Other,
}

impl AssetKind {
    /// Map a `type` attribute value to a kind. Unknown values become
    /// [`AssetKind::Other`] rather than failing the parse.
    pub fn from_attr(value: &str) -> Self {
        match value {
            "image" => Self::Image,
            "document" => Self::Document,
            _ => Self::Other,
        }
    }
}

/// An image, document, or other file attached to an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,
    pub url: String,
    pub original_file: String,
}

// ---------------------------------------------------------------------------
// Classification / RelatedArticle
// ---------------------------------------------------------------------------

/// A classification entry: kind from the `type` attribute, value from
/// child text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub kind: String,
    pub value: String,
}

/// A cross-reference to another article by SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedArticle {
    pub sku: String,
    pub relationship: String,
}

impl Default for RelatedArticle {
    fn default() -> Self {
        Self {
            sku: String::new(),
            relationship: "related".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The full result of one parse run: both keyed collections.
///
/// Later entries with the same key overwrite earlier ones, so re-parsing
/// the same feed is idempotent.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Article groups keyed by external id.
    pub article_groups: HashMap<String, ArticleGroup>,
    /// Articles keyed by SKU.
    pub articles: HashMap<String, Article>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_kind_from_attr() {
        assert_eq!(AssetKind::from_attr("image"), AssetKind::Image);
        assert_eq!(AssetKind::from_attr("document"), AssetKind::Document);
        assert_eq!(AssetKind::from_attr("video"), AssetKind::Other);
        assert_eq!(AssetKind::default(), AssetKind::Image);
    }

    #[test]
    fn related_article_default_relationship() {
        let rel = RelatedArticle::default();
        assert_eq!(rel.relationship, "related");
        assert!(rel.sku.is_empty());
    }

    #[test]
    fn article_serialization_skips_empty_options() {
        let article = Article {
            sku: "SKU1".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&article).expect("serialize");
        assert!(json.contains("\"sku\":\"SKU1\""));
        assert!(!json.contains("group_id"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn asset_kind_serializes_lowercase() {
        let asset = Asset {
            kind: AssetKind::Document,
            url: "http://x/doc.pdf".into(),
            original_file: String::new(),
        };
        let json = serde_json::to_string(&asset).expect("serialize");
        assert!(json.contains("\"kind\":\"document\""));
    }
}
