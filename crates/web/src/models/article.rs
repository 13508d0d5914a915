//! Blog models: articles, authors, categories, tags.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosk_core::{ArticleId, AuthorId, CategoryId, TagId};

/// A blog article.
///
/// `published_at` is set once when the article is published and never
/// changes afterwards; updates to title or content leave it untouched.
/// Articles with a `NULL` publish timestamp are drafts and excluded from
/// default listings and the feed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<AuthorId>,
    pub category_id: Option<CategoryId>,
}

/// An article with its author, category, and tags resolved, for detail views
/// and the feed.
#[derive(Debug, Clone)]
pub struct ArticleDetail {
    pub article: Article,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub tags: Vec<String>,
}

/// Validated input for creating or updating an article.
///
/// There is no publish timestamp here: it is assigned by the repository at
/// creation time and never written again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub author_id: Option<AuthorId>,
    pub category_id: Option<CategoryId>,
    pub tag_ids: Vec<TagId>,
    /// Publish immediately; drafts stay out of listings and the feed.
    pub publish: bool,
}

impl Article {
    /// Teaser for list views and feed descriptions (first 200 characters).
    #[must_use]
    pub fn teaser(&self) -> String {
        if self.content.chars().count() <= 200 {
            return self.content.clone();
        }
        self.content.chars().take(200).collect()
    }
}

/// A blog author.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub bio: String,
}

/// An article category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A tag assignable to articles.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teaser_truncates_at_200() {
        let article = Article {
            id: ArticleId::new(1),
            title: "t".to_string(),
            content: "y".repeat(300),
            published_at: Some(Utc::now()),
            author_id: None,
            category_id: None,
        };
        assert_eq!(article.teaser().chars().count(), 200);
    }

    #[test]
    fn test_teaser_short_content_unchanged() {
        let article = Article {
            id: ArticleId::new(1),
            title: "t".to_string(),
            content: "short".to_string(),
            published_at: None,
            author_id: None,
            category_id: None,
        };
        assert_eq!(article.teaser(), "short");
    }
}
