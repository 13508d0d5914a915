//! Article repository.

use sqlx::PgPool;

use kiosk_core::ArticleId;

use super::RepositoryError;
use crate::models::{Article, ArticleDetail, Author, Category, NewArticle, Tag};

const ARTICLE_COLUMNS: &str = "id, title, content, published_at, author_id, category_id";

/// Repository for blog database operations.
pub struct ArticleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List published articles ordered by pk.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<Article>, RepositoryError> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM article \
             WHERE published_at IS NOT NULL ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(articles)
    }

    /// The `n` most recently published articles, newest first (feed source).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, n: i64) -> Result<Vec<Article>, RepositoryError> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM article \
             WHERE published_at IS NOT NULL \
             ORDER BY published_at DESC LIMIT $1"
        ))
        .bind(n)
        .fetch_all(self.pool)
        .await?;

        Ok(articles)
    }

    /// Get an article with author, category, and tags resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        id: ArticleId,
    ) -> Result<Option<ArticleDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ArticleWithNamesRow>(
            "SELECT a.id, a.title, a.content, a.published_at, a.author_id, a.category_id, \
                    au.name AS author_name, c.name AS category_name \
             FROM article a \
             LEFT JOIN author au ON au.id = a.author_id \
             LEFT JOIN category c ON c.id = a.category_id \
             WHERE a.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = sqlx::query_scalar::<_, String>(
            "SELECT t.name FROM tag t \
             INNER JOIN article_tag at ON at.tag_id = t.id \
             WHERE at.article_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(ArticleDetail {
            article: row.article,
            author_name: row.author_name,
            category_name: row.category_name,
            tags,
        }))
    }

    /// Create an article, assigning the publish timestamp exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails; tag rows roll
    /// back with the article.
    pub async fn create(&self, input: &NewArticle) -> Result<Article, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let article = sqlx::query_as::<_, Article>(&format!(
            "INSERT INTO article (title, content, published_at, author_id, category_id) \
             VALUES ($1, $2, CASE WHEN $3 THEN now() END, $4, $5) \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.publish)
        .bind(input.author_id)
        .bind(input.category_id)
        .fetch_one(&mut *tx)
        .await?;

        for tag_id in &input.tag_ids {
            sqlx::query("INSERT INTO article_tag (article_id, tag_id) VALUES ($1, $2)")
                .bind(article.id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(article)
    }

    /// Update an article's content and associations.
    ///
    /// `published_at` is immutable after creation and is never part of the
    /// UPDATE statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no article has this id.
    pub async fn update(
        &self,
        id: ArticleId,
        input: &NewArticle,
    ) -> Result<Article, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let article = sqlx::query_as::<_, Article>(&format!(
            "UPDATE article SET title = $2, content = $3, author_id = $4, category_id = $5 \
             WHERE id = $1 \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.author_id)
        .bind(input.category_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query("DELETE FROM article_tag WHERE article_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag_id in &input.tag_ids {
            sqlx::query("INSERT INTO article_tag (article_id, tag_id) VALUES ($1, $2)")
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(article)
    }

    /// Create an author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_author(&self, name: &str, bio: &str) -> Result<Author, RepositoryError> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO author (name, bio) VALUES ($1, $2) RETURNING id, name, bio",
        )
        .bind(name)
        .bind(bio)
        .fetch_one(self.pool)
        .await?;

        Ok(author)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO category (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    /// Create a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_tag(&self, name: &str) -> Result<Tag, RepositoryError> {
        let tag =
            sqlx::query_as::<_, Tag>("INSERT INTO tag (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(self.pool)
                .await?;

        Ok(tag)
    }
}

/// Internal row shape for detail queries.
#[derive(Debug, sqlx::FromRow)]
struct ArticleWithNamesRow {
    #[sqlx(flatten)]
    article: Article,
    author_name: Option<String>,
    category_name: Option<String>,
}
