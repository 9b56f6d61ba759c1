//! End-to-end import: catalog file → parse → upsert into storage.
//!
//! Groups are saved before any article, building an external-id → internal-id
//! map so each article's natural-key group link can be resolved to the
//! stored group. Persistence failures are per-record: they are logged and
//! counted, and the loop moves on (unless `continue_on_error` is off).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};

use catfeed_shared::{Catalog, Result};
use catfeed_storage::Storage;

/// Configuration for one import run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Path to the vendor catalog XML file.
    pub file_path: PathBuf,
    /// Path to the libSQL database file.
    pub db_path: PathBuf,
    /// Parse and report only; never touch storage.
    pub dry_run: bool,
    /// Keep saving remaining records after a per-record failure.
    pub continue_on_error: bool,
}

/// Summary of a completed import run.
#[derive(Debug)]
pub struct ImportResult {
    /// Number of groups in the parsed result map.
    pub groups_parsed: usize,
    /// Number of articles in the parsed result map.
    pub articles_parsed: usize,
    /// Groups successfully upserted (0 on dry runs).
    pub groups_saved: usize,
    /// Articles successfully upserted (0 on dry runs).
    pub articles_saved: usize,
    /// Per-record persistence failures (record key, error message).
    pub errors: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting import status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each record is saved.
    fn record_saved(&self, key: &str, current: usize, total: usize);
    /// Called when the import completes.
    fn done(&self, result: &ImportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_saved(&self, _key: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &ImportResult) {}
}

/// Run the full import: parse the file, then either report (dry run) or
/// upsert everything into storage.
#[instrument(skip_all, fields(file = %config.file_path.display(), dry_run = config.dry_run))]
pub async fn run_import(
    config: &ImportConfig,
    progress: &dyn ProgressReporter,
) -> Result<ImportResult> {
    let start = Instant::now();

    progress.phase("Parsing catalog");
    let catalog = catfeed_parser::parse_file(&config.file_path)?;

    info!(
        groups = catalog.article_groups.len(),
        articles = catalog.articles.len(),
        "catalog parsed"
    );

    let mut result = ImportResult {
        groups_parsed: catalog.article_groups.len(),
        articles_parsed: catalog.articles.len(),
        groups_saved: 0,
        articles_saved: 0,
        errors: Vec::new(),
        elapsed: start.elapsed(),
    };

    if config.dry_run {
        report_samples(&catalog);
        result.elapsed = start.elapsed();
        progress.done(&result);
        return Ok(result);
    }

    progress.phase("Opening storage");
    let storage = Storage::open(&config.db_path).await?;

    // Groups first: articles need the internal id of their group.
    progress.phase("Saving article groups");
    let mut external_to_internal: HashMap<String, String> = HashMap::new();
    let group_total = catalog.article_groups.len();

    for (i, (external_id, group)) in catalog.article_groups.iter().enumerate() {
        match storage.upsert_group(group).await {
            Ok(internal_id) => {
                external_to_internal.insert(external_id.clone(), internal_id);
                result.groups_saved += 1;
                progress.record_saved(external_id, i + 1, group_total);
            }
            Err(e) => {
                warn!(external_id, error = %e, "failed to save article group");
                result.errors.push((external_id.clone(), e.to_string()));
                if !config.continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    progress.phase("Saving articles");
    let article_total = catalog.articles.len();

    for (i, (sku, article)) in catalog.articles.iter().enumerate() {
        // Resolve the natural-key group link to the stored group's
        // internal id. Unsaved or unknown groups leave the article
        // unlinked rather than failing it.
        let group_internal_id = article
            .group_id
            .as_deref()
            .and_then(|ext| external_to_internal.get(ext))
            .map(String::as_str);

        match storage.upsert_article(article, group_internal_id).await {
            Ok(_) => {
                result.articles_saved += 1;
                progress.record_saved(sku, i + 1, article_total);
            }
            Err(e) => {
                warn!(sku, error = %e, "failed to save article");
                result.errors.push((sku.clone(), e.to_string()));
                if !config.continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    result.elapsed = start.elapsed();
    progress.done(&result);

    info!(
        groups_saved = result.groups_saved,
        articles_saved = result.articles_saved,
        errors = result.errors.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "import complete"
    );

    Ok(result)
}

/// Log one sample of each collection on dry runs.
fn report_samples(catalog: &Catalog) {
    if let Some(group) = catalog.article_groups.values().next() {
        match serde_json::to_string_pretty(group) {
            Ok(json) => info!("sample article group:\n{json}"),
            Err(e) => warn!(error = %e, "could not render sample group"),
        }
    }
    if let Some(article) = catalog.articles.values().next() {
        match serde_json::to_string_pretty(article) {
            Ok(json) => info!("sample article:\n{json}"),
            Err(e) => warn!(error = %e, "could not render sample article"),
        }
    }
}
