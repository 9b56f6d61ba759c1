//! Event-driven tag mapper: the depth-tracking state machine that turns
//! open/text/close events into domain objects.
//!
//! The vendor schema is shallow and context-dependent: a generic `node`
//! tag typed via its `type` attribute, and flat `name`/`specification`/
//! `asset` children reused across group and article contexts. Dispatch is
//! therefore keyed on the exact trailing path segment plus two context
//! flags, not on a schema. Branches are independent `if`s, never a
//! `match`: several suffixes overlap as substrings and must only ever
//! match segment-exactly.

use std::collections::HashMap;

use catfeed_shared::{
    Article, ArticleGroup, ArticleSpecification, Asset, AssetKind, Classification, RelatedArticle,
    Specification,
};

use crate::state::ParserState;

/// Node type attribute value marking a group node.
const NODE_TYPE_GROUP: &str = "articlesgroup";
/// Node type attribute value marking an article node.
const NODE_TYPE_ARTICLE: &str = "article";

/// Enter a tag: reset text, extend the path, bump the depth counter, and
/// allocate a fresh "current" object when the path suffix calls for one.
pub(crate) fn handle_open_tag(
    state: &mut ParserState,
    name: &str,
    attributes: &HashMap<String, String>,
) {
    state.reset_text();
    state.push_tag(name);
    state.current_node_depth += 1;

    if state.path_ends_with("name") {
        state.is_reading_name = true;
    }

    if state.path_ends_with("node") {
        let node_type = attributes.get("type").map(String::as_str).unwrap_or("");
        let external_id = attributes.get("id").cloned().unwrap_or_default();

        if node_type == NODE_TYPE_GROUP {
            state.is_reading_article_group = true;
            state.current_article_group = Some(ArticleGroup {
                name: String::new(),
                external_id,
                specifications: Vec::new(),
            });
        } else if node_type == NODE_TYPE_ARTICLE {
            let sku = match attributes.get("sku") {
                Some(sku) if !sku.is_empty() => sku.clone(),
                _ => state.generate_sku(),
            };

            let mut article = Article {
                sku,
                type_number: attributes.get("typenumber").cloned(),
                external_id: (!external_id.is_empty()).then_some(external_id),
                ..Default::default()
            };

            // Link to the enclosing group by natural key. Internal id
            // resolution happens at save time, not here.
            if state.is_reading_article_group {
                if let Some(group) = &state.current_article_group {
                    article.group_id = Some(group.external_id.clone());
                }
            }

            state.current_article = Some(article);
            state.article_node_len = Some(state.path.len());
        }
    }

    if state.path_ends_with("specification") {
        state.current_specification = Some(Specification::default());
    }

    if state.path_ends_with("articlespecification") {
        state.current_article_specification = Some(ArticleSpecification::default());
    }

    if state.path_ends_with("asset") {
        let mut asset = Asset::default();
        if let Some(kind) = attributes.get("type") {
            asset.kind = AssetKind::from_attr(kind);
        }
        state.current_asset = Some(asset);
    }

    if state.path_ends_with("classification") {
        let mut classification = Classification::default();
        if let Some(kind) = attributes.get("type") {
            classification.kind = kind.clone();
        }
        state.current_classification = Some(classification);
    }

    if state.path_ends_with("relatedarticle") {
        let mut related = RelatedArticle::default();
        if let Some(relationship) = attributes.get("relationship") {
            related.relationship = relationship.clone();
        }
        state.current_related_article = Some(related);
    }
}

/// Leave a tag: finalize any entity whose scope just ended, attach it to
/// its parent or the result maps, then unconditionally clear the text
/// accumulator and pop the path.
pub(crate) fn handle_close_tag(state: &mut ParserState, tag_name: &str) {
    let text = state.current_text.trim().to_string();

    state.current_node_depth -= 1;

    if state.path_ends_with("name") {
        state.is_reading_name = false;
    }

    // The closing tag itself, not the path suffix: `node` closes both
    // group and article scopes, and the depth counter decides whether the
    // outermost one just ended.
    if tag_name == "node" {
        if state.is_reading_article_group {
            if let Some(group) = &state.current_article_group {
                if !group.name.trim().is_empty() {
                    state
                        .article_groups
                        .insert(group.external_id.clone(), group.clone());
                }
            }
            if state.current_node_depth == 0 {
                state.is_reading_article_group = false;
                state.current_article_group = None;
            }
        }

        if let Some(article) = &state.current_article {
            if !article.sku.is_empty() {
                state.articles.insert(article.sku.clone(), article.clone());
            }
        }
        // The article's scope ends with its own node: the path has not
        // been popped yet, so its length still matches the length recorded
        // at open. The slot must not outlive the node, or later `name`
        // text outside any article would land in it.
        if state.article_node_len == Some(state.path.len()) {
            state.current_article = None;
            state.article_node_len = None;
        }
    }

    if state.path_ends_with("name") && !text.is_empty() {
        // An open article wins over the enclosing group, so a nested
        // article's name never clobbers the group name set earlier.
        if let Some(article) = state.current_article.as_mut() {
            article.description = Some(text.clone());
        } else if state.is_reading_article_group {
            if let Some(group) = state.current_article_group.as_mut() {
                group.name = text.clone();
            }
        }
    }

    if state.path_ends_with("specification") {
        if let Some(specification) = state.current_specification.take() {
            if let Some(group) = state.current_article_group.as_mut() {
                group.specifications.push(specification);
            }
        }
    }

    if state.path_ends_with("specificationname") && !text.is_empty() {
        if let Some(specification) = state.current_specification.as_mut() {
            specification.name = text.clone();
        }
    }

    if state.path_ends_with("specificationvalue") && !text.is_empty() {
        if let Some(specification) = state.current_specification.as_mut() {
            specification.value = text.clone();
        }
    }

    if state.path_ends_with("articlespecification") {
        if let Some(specification) = state.current_article_specification.take() {
            if let Some(article) = state.current_article.as_mut() {
                article.specifications.push(specification);
            }
        }
    }

    if state.path_ends_with("articlespecificationname") && !text.is_empty() {
        if let Some(specification) = state.current_article_specification.as_mut() {
            specification.name = text.clone();
        }
    }

    if state.path_ends_with("articlespecificationvalue") && !text.is_empty() {
        if let Some(specification) = state.current_article_specification.as_mut() {
            specification.value = text.clone();
        }
    }

    if state.path_ends_with("asset") {
        if let Some(asset) = state.current_asset.take() {
            if let Some(article) = state.current_article.as_mut() {
                article.assets.push(asset);
            }
        }
    }

    if state.path_ends_with("asseturl") && !text.is_empty() {
        if let Some(asset) = state.current_asset.as_mut() {
            asset.url = text.clone();
        }
    }

    if state.path_ends_with("assetoriginalfile") && !text.is_empty() {
        if let Some(asset) = state.current_asset.as_mut() {
            asset.original_file = text.clone();
        }
    }

    if state.path_ends_with("classification") {
        if let Some(classification) = state.current_classification.take() {
            if let Some(article) = state.current_article.as_mut() {
                article.classifications.push(classification);
            }
        }
    }

    if state.path_ends_with("classificationvalue") && !text.is_empty() {
        if let Some(classification) = state.current_classification.as_mut() {
            classification.value = text.clone();
        }
    }

    if state.path_ends_with("relatedarticle") {
        if let Some(related) = state.current_related_article.take() {
            if let Some(article) = state.current_article.as_mut() {
                article.related_articles.push(related);
            }
        }
    }

    if state.path_ends_with("relatedarticlesku") && !text.is_empty() {
        if let Some(related) = state.current_related_article.as_mut() {
            related.sku = text;
        }
    }

    state.reset_text();
    state.pop_tag();
}

/// Accumulate character data. Tokenizers may split a text node across
/// several events, so consecutive chunks concatenate.
pub(crate) fn handle_text(state: &mut ParserState, text: &str) {
    state.current_text.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shorthand: open a tag with the given attribute pairs.
    fn open(state: &mut ParserState, name: &str, attrs: &[(&str, &str)]) {
        let map: HashMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        handle_open_tag(state, name, &map);
    }

    /// Shorthand: a text event followed by a close tag.
    fn text_and_close(state: &mut ParserState, name: &str, text: &str) {
        handle_text(state, text);
        handle_close_tag(state, name);
    }

    #[test]
    fn group_with_name_is_committed() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");
        handle_close_tag(&mut state, "node");

        let group = state.article_groups.get("G1").expect("group committed");
        assert_eq!(group.name, "Pumps");
        assert_eq!(group.external_id, "G1");
        assert!(state.current_article_group.is_none());
        assert!(!state.is_reading_article_group);
    }

    #[test]
    fn group_with_whitespace_name_is_dropped() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "   ");
        handle_close_tag(&mut state, "node");

        assert!(state.article_groups.is_empty());
    }

    #[test]
    fn group_without_name_tag_is_dropped() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        handle_close_tag(&mut state, "node");

        assert!(state.article_groups.is_empty());
    }

    #[test]
    fn article_takes_sku_and_attributes_from_node() {
        let mut state = ParserState::new();
        open(
            &mut state,
            "node",
            &[
                ("type", "article"),
                ("id", "A9"),
                ("sku", "SKU1"),
                ("typenumber", "TN-7"),
            ],
        );
        handle_close_tag(&mut state, "node");

        let article = state.articles.get("SKU1").expect("article committed");
        assert_eq!(article.external_id.as_deref(), Some("A9"));
        assert_eq!(article.type_number.as_deref(), Some("TN-7"));
        assert!(article.group_id.is_none());
    }

    #[test]
    fn article_without_sku_gets_generated_one() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "article")]);
        handle_close_tag(&mut state, "node");
        open(&mut state, "node", &[("type", "article")]);
        handle_close_tag(&mut state, "node");

        assert_eq!(state.articles.len(), 2);
        assert!(state.articles.keys().all(|sku| sku.starts_with("GEN-")));
    }

    #[test]
    fn nested_article_inherits_group_external_id() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");

        open(&mut state, "node", &[("type", "article"), ("sku", "SKU1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "desc text");
        handle_close_tag(&mut state, "node");
        handle_close_tag(&mut state, "node");

        let group = state.article_groups.get("G1").expect("group");
        assert_eq!(group.name, "Pumps");

        let article = state.articles.get("SKU1").expect("article");
        assert_eq!(article.group_id.as_deref(), Some("G1"));
        assert_eq!(article.description.as_deref(), Some("desc text"));
    }

    #[test]
    fn group_after_sibling_article_keeps_its_name() {
        // Under a wrapper root the depth counter never returns to zero,
        // so the article slot must be scoped to its own node: a group
        // following a sibling article still gets its `name` text.
        let mut state = ParserState::new();
        open(&mut state, "catalog", &[]);

        open(&mut state, "node", &[("type", "article"), ("sku", "S1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "desc");
        handle_close_tag(&mut state, "node");

        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");
        handle_close_tag(&mut state, "node");
        handle_close_tag(&mut state, "catalog");

        let group = state.article_groups.get("G1").expect("group committed");
        assert_eq!(group.name, "Pumps");
        let article = state.articles.get("S1").expect("article");
        assert_eq!(article.description.as_deref(), Some("desc"));
    }

    #[test]
    fn group_name_after_nested_article_routes_to_group() {
        let mut state = ParserState::new();
        open(&mut state, "catalog", &[]);
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);

        open(&mut state, "node", &[("type", "article"), ("sku", "S1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "desc");
        handle_close_tag(&mut state, "node");

        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");
        handle_close_tag(&mut state, "node");
        handle_close_tag(&mut state, "catalog");

        let group = state.article_groups.get("G1").expect("group committed");
        assert_eq!(group.name, "Pumps");
        let article = state.articles.get("S1").expect("article");
        assert_eq!(article.description.as_deref(), Some("desc"));
        assert_eq!(article.group_id.as_deref(), Some("G1"));
    }

    #[test]
    fn group_specification_is_attached_in_order() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");

        open(&mut state, "specification", &[]);
        open(&mut state, "specificationname", &[]);
        text_and_close(&mut state, "specificationname", "Material");
        open(&mut state, "specificationvalue", &[]);
        text_and_close(&mut state, "specificationvalue", "Steel");
        handle_close_tag(&mut state, "specification");
        handle_close_tag(&mut state, "node");

        let group = state.article_groups.get("G1").expect("group");
        assert_eq!(group.specifications.len(), 1);
        assert_eq!(group.specifications[0].name, "Material");
        assert_eq!(group.specifications[0].value, "Steel");
        assert!(state.current_specification.is_none());
    }

    #[test]
    fn specification_tags_do_not_leak_into_names() {
        // `specificationname` must never hit the `name` branch: the group
        // name stays what the `name` tag said.
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");
        open(&mut state, "specification", &[]);
        open(&mut state, "specificationname", &[]);
        text_and_close(&mut state, "specificationname", "Material");
        handle_close_tag(&mut state, "specification");
        handle_close_tag(&mut state, "node");

        assert_eq!(state.article_groups.get("G1").expect("group").name, "Pumps");
    }

    #[test]
    fn article_specification_asset_classification_related() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "article"), ("sku", "SKU1")]);

        open(&mut state, "articlespecification", &[]);
        open(&mut state, "articlespecificationname", &[]);
        text_and_close(&mut state, "articlespecificationname", "Weight");
        open(&mut state, "articlespecificationvalue", &[]);
        text_and_close(&mut state, "articlespecificationvalue", "12kg");
        handle_close_tag(&mut state, "articlespecification");

        open(&mut state, "asset", &[("type", "document")]);
        open(&mut state, "asseturl", &[]);
        text_and_close(&mut state, "asseturl", "http://x/doc.pdf");
        open(&mut state, "assetoriginalfile", &[]);
        text_and_close(&mut state, "assetoriginalfile", "doc.pdf");
        handle_close_tag(&mut state, "asset");

        open(&mut state, "classification", &[("type", "etim")]);
        open(&mut state, "classificationvalue", &[]);
        text_and_close(&mut state, "classificationvalue", "EC000123");
        handle_close_tag(&mut state, "classification");

        open(&mut state, "relatedarticle", &[("relationship", "accessory")]);
        open(&mut state, "relatedarticlesku", &[]);
        text_and_close(&mut state, "relatedarticlesku", "SKU2");
        handle_close_tag(&mut state, "relatedarticle");

        handle_close_tag(&mut state, "node");

        let article = state.articles.get("SKU1").expect("article");
        assert_eq!(article.specifications.len(), 1);
        assert_eq!(article.specifications[0].name, "Weight");
        assert_eq!(article.specifications[0].value, "12kg");

        assert_eq!(article.assets.len(), 1);
        assert_eq!(article.assets[0].kind, AssetKind::Document);
        assert_eq!(article.assets[0].url, "http://x/doc.pdf");
        assert_eq!(article.assets[0].original_file, "doc.pdf");

        assert_eq!(article.classifications.len(), 1);
        assert_eq!(article.classifications[0].kind, "etim");
        assert_eq!(article.classifications[0].value, "EC000123");

        assert_eq!(article.related_articles.len(), 1);
        assert_eq!(article.related_articles[0].sku, "SKU2");
        assert_eq!(article.related_articles[0].relationship, "accessory");
    }

    #[test]
    fn asset_defaults_to_image_and_related_to_related() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "article"), ("sku", "SKU1")]);
        open(&mut state, "asset", &[]);
        handle_close_tag(&mut state, "asset");
        open(&mut state, "relatedarticle", &[]);
        open(&mut state, "relatedarticlesku", &[]);
        text_and_close(&mut state, "relatedarticlesku", "SKU2");
        handle_close_tag(&mut state, "relatedarticle");
        handle_close_tag(&mut state, "node");

        let article = state.articles.get("SKU1").expect("article");
        assert_eq!(article.assets[0].kind, AssetKind::Image);
        assert_eq!(article.related_articles[0].relationship, "related");
    }

    #[test]
    fn duplicate_skus_collapse_to_last_seen() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "article"), ("sku", "SKU1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "first");
        handle_close_tag(&mut state, "node");

        open(&mut state, "node", &[("type", "article"), ("sku", "SKU1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "second");
        handle_close_tag(&mut state, "node");

        assert_eq!(state.articles.len(), 1);
        assert_eq!(
            state.articles.get("SKU1").expect("article").description.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn text_events_concatenate() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        handle_text(&mut state, "Pu");
        handle_text(&mut state, "mps");
        handle_close_tag(&mut state, "name");
        handle_close_tag(&mut state, "node");

        assert_eq!(state.article_groups.get("G1").expect("group").name, "Pumps");
    }

    #[test]
    fn name_flag_tracks_name_scope() {
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        assert!(!state.is_reading_name);
        open(&mut state, "name", &[]);
        assert!(state.is_reading_name);
        handle_close_tag(&mut state, "name");
        assert!(!state.is_reading_name);
    }

    #[test]
    fn depth_counter_gates_context_reset() {
        // An article node nested under a group: closing the inner node
        // commits the article but the group context survives until the
        // outer node closes at depth zero.
        let mut state = ParserState::new();
        open(&mut state, "node", &[("type", "articlesgroup"), ("id", "G1")]);
        open(&mut state, "name", &[]);
        text_and_close(&mut state, "name", "Pumps");
        open(&mut state, "node", &[("type", "article"), ("sku", "SKU1")]);
        handle_close_tag(&mut state, "node");

        assert!(state.articles.contains_key("SKU1"));
        assert!(state.is_reading_article_group);
        assert!(state.current_article_group.is_some());

        handle_close_tag(&mut state, "node");
        assert!(!state.is_reading_article_group);
        assert!(state.current_article_group.is_none());
        assert_eq!(state.current_node_depth, 0);
    }
}
