//! libSQL storage layer for imported catalog data.
//!
//! The [`Storage`] struct wraps a libSQL database holding the two
//! collections (`article_groups`, `articles`). Records are upserted by
//! natural key: external id for groups, SKU for articles. Articles
//! reference their group by internal id; the natural-key `group_id`
//! carried by a parsed [`Article`] is resolved by the import pipeline
//! before the article is saved.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use uuid::Uuid;

use catfeed_shared::{Article, ArticleGroup, CatfeedError, Result};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// A stored article group row (internal id plus natural key and name).
#[derive(Debug, Clone)]
pub struct StoredGroup {
    pub id: String,
    pub external_id: String,
    pub name: String,
}

/// A stored article row, as much of it as callers need for upserts and
/// verification.
#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub id: String,
    pub sku: String,
    pub description: Option<String>,
    pub group_id: Option<String>,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatfeedError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    CatfeedError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Article group operations
    // -----------------------------------------------------------------------

    /// Find a group by its external id (natural key).
    pub async fn find_group_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredGroup>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, external_id, name FROM article_groups WHERE external_id = ?1",
                params![external_id],
            )
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(StoredGroup {
                id: row
                    .get::<String>(0)
                    .map_err(|e| CatfeedError::Storage(e.to_string()))?,
                external_id: row
                    .get::<String>(1)
                    .map_err(|e| CatfeedError::Storage(e.to_string()))?,
                name: row
                    .get::<String>(2)
                    .map_err(|e| CatfeedError::Storage(e.to_string()))?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(CatfeedError::Storage(e.to_string())),
        }
    }

    /// Insert a new group record. Returns the generated internal id.
    pub async fn create_group(&self, group: &ArticleGroup) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO article_groups (id, external_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.as_str(),
                    group.external_id.as_str(),
                    group.name.as_str(),
                    now.as_str(),
                    now.as_str()
                ],
            )
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Update an existing group record by internal id.
    pub async fn update_group(&self, id: &str, group: &ArticleGroup) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE article_groups SET name = ?1, external_id = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![
                    group.name.as_str(),
                    group.external_id.as_str(),
                    now.as_str(),
                    id
                ],
            )
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Upsert a group by external id. Returns the internal id of the
    /// created or updated record.
    pub async fn upsert_group(&self, group: &ArticleGroup) -> Result<String> {
        match self.find_group_by_external_id(&group.external_id).await? {
            Some(existing) => {
                self.update_group(&existing.id, group).await?;
                Ok(existing.id)
            }
            None => self.create_group(group).await,
        }
    }

    /// Count stored groups.
    pub async fn count_groups(&self) -> Result<u64> {
        self.count("article_groups").await
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Find an article by its SKU (natural key).
    pub async fn find_article_by_sku(&self, sku: &str) -> Result<Option<StoredArticle>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, sku, description, group_id FROM articles WHERE sku = ?1",
                params![sku],
            )
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(StoredArticle {
                id: row
                    .get::<String>(0)
                    .map_err(|e| CatfeedError::Storage(e.to_string()))?,
                sku: row
                    .get::<String>(1)
                    .map_err(|e| CatfeedError::Storage(e.to_string()))?,
                description: row.get::<String>(2).ok(),
                group_id: row.get::<String>(3).ok(),
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(CatfeedError::Storage(e.to_string())),
        }
    }

    /// Insert a new article record. `group_internal_id` is the resolved
    /// internal id of the owning group, if any. Returns the generated
    /// internal id.
    pub async fn create_article(
        &self,
        article: &Article,
        group_internal_id: Option<&str>,
    ) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let docs = ArticleDocs::encode(article)?;

        self.conn
            .execute(
                "INSERT INTO articles
                 (id, sku, type_number, description, external_id, group_id,
                  specifications_json, assets_json, classifications_json, related_json,
                  created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    id.as_str(),
                    article.sku.as_str(),
                    article.type_number.as_deref(),
                    article.description.as_deref(),
                    article.external_id.as_deref(),
                    group_internal_id,
                    docs.specifications.as_str(),
                    docs.assets.as_str(),
                    docs.classifications.as_str(),
                    docs.related.as_str(),
                    now.as_str(),
                    now.as_str()
                ],
            )
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Update an existing article record by internal id.
    pub async fn update_article(
        &self,
        id: &str,
        article: &Article,
        group_internal_id: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let docs = ArticleDocs::encode(article)?;

        self.conn
            .execute(
                "UPDATE articles SET
                   sku = ?1, type_number = ?2, description = ?3, external_id = ?4,
                   group_id = ?5, specifications_json = ?6, assets_json = ?7,
                   classifications_json = ?8, related_json = ?9, updated_at = ?10
                 WHERE id = ?11",
                params![
                    article.sku.as_str(),
                    article.type_number.as_deref(),
                    article.description.as_deref(),
                    article.external_id.as_deref(),
                    group_internal_id,
                    docs.specifications.as_str(),
                    docs.assets.as_str(),
                    docs.classifications.as_str(),
                    docs.related.as_str(),
                    now.as_str(),
                    id
                ],
            )
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Upsert an article by SKU. Returns the internal id of the created
    /// or updated record.
    pub async fn upsert_article(
        &self,
        article: &Article,
        group_internal_id: Option<&str>,
    ) -> Result<String> {
        match self.find_article_by_sku(&article.sku).await? {
            Some(existing) => {
                self.update_article(&existing.id, article, group_internal_id)
                    .await?;
                Ok(existing.id)
            }
            None => self.create_article(article, group_internal_id).await,
        }
    }

    /// Count stored articles.
    pub async fn count_articles(&self) -> Result<u64> {
        self.count("articles").await
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), params![])
            .await
            .map_err(|e| CatfeedError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map(|n| n as u64)
                .map_err(|e| CatfeedError::Storage(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(CatfeedError::Storage(e.to_string())),
        }
    }
}

/// JSON-encoded nested sequences of an article, ready for the document
/// columns.
struct ArticleDocs {
    specifications: String,
    assets: String,
    classifications: String,
    related: String,
}

impl ArticleDocs {
    fn encode(article: &Article) -> Result<Self> {
        Ok(Self {
            specifications: serde_json::to_string(&article.specifications)
                .map_err(|e| CatfeedError::Storage(e.to_string()))?,
            assets: serde_json::to_string(&article.assets)
                .map_err(|e| CatfeedError::Storage(e.to_string()))?,
            classifications: serde_json::to_string(&article.classifications)
                .map_err(|e| CatfeedError::Storage(e.to_string()))?,
            related: serde_json::to_string(&article.related_articles)
                .map_err(|e| CatfeedError::Storage(e.to_string()))?,
        })
    }
}
