//! Mutable working memory for one parse run.
//!
//! One [`ParserState`] is constructed per parse invocation and never shared
//! between parses. It holds the tag-path stack, the text accumulator, the
//! two result maps, and one "current" slot per in-progress entity.

use std::collections::HashMap;

use catfeed_shared::{
    Article, ArticleGroup, ArticleSpecification, Asset, Catalog, Classification, RelatedArticle,
    Specification,
};

/// All mutable context needed to interpret the next XML event.
#[derive(Debug)]
pub struct ParserState {
    /// Tag ancestry from document root to the currently open tag.
    pub(crate) path: Vec<String>,
    /// Character data accumulated since the last open or close tag.
    pub(crate) current_text: String,

    /// Result map: article groups keyed by external id.
    pub(crate) article_groups: HashMap<String, ArticleGroup>,
    /// Result map: articles keyed by SKU.
    pub(crate) articles: HashMap<String, Article>,

    pub(crate) current_article_group: Option<ArticleGroup>,
    pub(crate) current_article: Option<Article>,
    /// Path length captured when the current article's `node` opened.
    /// Matching it on a `node` close identifies the close that ends the
    /// article's scope.
    pub(crate) article_node_len: Option<usize>,
    pub(crate) current_specification: Option<Specification>,
    pub(crate) current_article_specification: Option<ArticleSpecification>,
    pub(crate) current_asset: Option<Asset>,
    pub(crate) current_classification: Option<Classification>,
    pub(crate) current_related_article: Option<RelatedArticle>,

    /// Incremented on every open tag, decremented on every close tag.
    /// Consulted only as `== 0` to detect exit from the outermost
    /// group/article node.
    pub(crate) current_node_depth: i64,
    /// Set while inside a `name` tag. Finalization re-derives its target
    /// from the group flag and the article slot instead of consulting this.
    #[allow(dead_code)]
    pub(crate) is_reading_name: bool,
    /// Set while the currently open `node` carries `type="articlesgroup"`.
    pub(crate) is_reading_article_group: bool,

    /// Monotonic counter for synthesized SKUs.
    sku_counter: u64,
    /// Timestamp component baked into synthesized SKUs, fixed per run.
    run_stamp: i64,
}

impl ParserState {
    /// Fresh state for a new parse run.
    pub fn new() -> Self {
        Self {
            path: Vec::new(),
            current_text: String::new(),
            article_groups: HashMap::new(),
            articles: HashMap::new(),
            current_article_group: None,
            current_article: None,
            article_node_len: None,
            current_specification: None,
            current_article_specification: None,
            current_asset: None,
            current_classification: None,
            current_related_article: None,
            current_node_depth: 0,
            is_reading_name: false,
            is_reading_article_group: false,
            sku_counter: 0,
            run_stamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Synthesize a SKU for an article that arrived without one.
    /// Unique within a run: the counter is monotonic and the timestamp
    /// component is fixed at construction.
    pub(crate) fn generate_sku(&mut self) -> String {
        self.sku_counter += 1;
        format!("GEN-{}-{}", self.run_stamp, self.sku_counter)
    }

    /// Append a tag to the current path.
    pub(crate) fn push_tag(&mut self, tag: &str) {
        self.path.push(tag.to_string());
    }

    /// Remove and return the most recent tag, or an empty string if the
    /// path is already empty.
    pub(crate) fn pop_tag(&mut self) -> String {
        self.path.pop().unwrap_or_default()
    }

    /// The current path joined with `/`, for diagnostics.
    pub(crate) fn current_path(&self) -> String {
        self.path.join("/")
    }

    /// True when the trailing path segment is exactly `tag`.
    ///
    /// Dispatch is segment-exact, never substring containment:
    /// `specificationname` does not match `name`, and
    /// `articlespecification` does not match `specification`.
    pub(crate) fn path_ends_with(&self, tag: &str) -> bool {
        self.path.last().map(String::as_str) == Some(tag)
    }

    /// Clear the text accumulator.
    pub(crate) fn reset_text(&mut self) {
        self.current_text.clear();
    }

    /// The innermost still-open tag, if any. Non-empty at end of input
    /// means the document was truncated.
    pub(crate) fn unclosed_tag(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// Consume the state, yielding both result maps.
    pub(crate) fn into_catalog(self) -> Catalog {
        Catalog {
            article_groups: self.article_groups,
            articles: self.articles,
        }
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}
