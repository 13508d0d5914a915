//! Blog route handlers: article list, detail, and the RSS feed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use kiosk_core::ArticleId;

use crate::db::ArticleRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Article, CurrentUser};
use crate::state::AppState;

/// Number of articles in the syndication feed.
const FEED_ARTICLE_COUNT: i64 = 5;

/// Article view for templates.
#[derive(Debug, Clone)]
pub struct ArticleView {
    pub id: ArticleId,
    pub title: String,
    pub teaser: String,
    pub published_at: Option<String>,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            teaser: article.teaser(),
            published_at: article
                .published_at
                .map(|ts| ts.format("%B %e, %Y").to_string()),
        }
    }
}

/// Articles list page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/articles_list.html")]
pub struct ArticlesListTemplate {
    pub user: Option<CurrentUser>,
    pub articles: Vec<ArticleView>,
}

/// Article detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/article_detail.html")]
pub struct ArticleDetailTemplate {
    pub user: Option<CurrentUser>,
    pub article: ArticleView,
    pub content: String,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub tags: Vec<String>,
}

/// One item of the RSS feed.
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// RSS 2.0 feed template.
#[derive(Template)]
#[template(path = "blog/feed.xml")]
pub struct FeedTemplate {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

/// List published articles.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<ArticlesListTemplate> {
    let articles = ArticleRepository::new(state.pool()).list_published().await?;
    Ok(ArticlesListTemplate {
        user,
        articles: articles.iter().map(ArticleView::from).collect(),
    })
}

/// Article detail with author, category, and tags.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<ArticleDetailTemplate> {
    let detail = ArticleRepository::new(state.pool())
        .get_detail(ArticleId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ArticleDetailTemplate {
        user,
        article: ArticleView::from(&detail.article),
        content: detail.article.content.clone(),
        author_name: detail.author_name,
        category_name: detail.category_name,
        tags: detail.tags,
    })
}

/// RSS feed of the five most recently published articles.
#[instrument(skip(state))]
pub async fn feed(State(state): State<AppState>) -> Result<Response> {
    let articles = ArticleRepository::new(state.pool())
        .latest(FEED_ARTICLE_COUNT)
        .await?;

    let base_url = state.config().base_url.trim_end_matches('/').to_string();
    let items = articles
        .iter()
        .map(|article| FeedItem {
            title: article.title.clone(),
            link: format!("{base_url}/blog/articles/{}/", article.id),
            description: article.teaser(),
            pub_date: article
                .published_at
                .map(|ts| ts.to_rfc2822())
                .unwrap_or_default(),
        })
        .collect();

    let template = FeedTemplate {
        title: "Blog Articles (latest)".to_string(),
        link: format!("{base_url}/blog/articles/"),
        description: "Updates on changes and additions to blog articles".to_string(),
        items,
    };

    let body = template
        .render()
        .map_err(|e| AppError::Internal(format!("feed render failed: {e}")))?;

    Ok((
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        body,
    )
        .into_response())
}
