//! Shared types, error model, and configuration for Catfeed.
//!
//! This crate is the foundation depended on by all other Catfeed crates.
//! It provides:
//! - [`CatfeedError`] — the unified error type
//! - Domain types ([`ArticleGroup`], [`Article`], [`Catalog`] and friends)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ImportPoliciesConfig, config_dir, config_file_path, expand_home,
    init_config, load_config, load_config_from,
};
pub use error::{CatfeedError, Result};
pub use types::{
    Article, ArticleGroup, ArticleSpecification, Asset, AssetKind, Catalog, Classification,
    RelatedArticle, Specification,
};
