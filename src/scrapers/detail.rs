//! Article-page enrichment for primary sources.
//!
//! Listing entries on the primary site often carry no summary. For the first
//! `detail_limit` items of a source the article page is fetched and parsed:
//! the JSON-LD description fills an empty summary and the article body becomes
//! [`NewsItem::content`]. Any failure leaves the listing item as it was, and
//! so does a page still loading when the enrichment deadline passes.

use super::jsonld;
use crate::fetch::PageFetcher;
use crate::models::NewsItem;
use crate::normalize::normalize_text;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

/// Body containers, most specific first.
static BODY: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "div.haber_metni",
        "div.news-content",
        "div.article-content",
        "div.content",
        "article",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("static selector is valid"))
    .collect()
});
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("static selector is valid")
});

const EXCLUDED: &[&str] = &["script", "style", "aside", "nav", "footer"];
const MIN_BODY_CHARS: usize = 100;

/// What an article page adds to its listing entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub description: Option<String>,
    pub body: Option<String>,
}

/// Parse an article page.
pub fn parse_detail(page: &str) -> ArticleDetail {
    let document = Html::parse_document(page);
    let article = jsonld::find_article(&document).unwrap_or_default();

    let description = article
        .description
        .map(|d| normalize_text(&d))
        .filter(|d| !d.is_empty())
        .or_else(|| {
            document
                .select(&META_DESCRIPTION)
                .filter_map(|el| el.value().attr("content"))
                .map(normalize_text)
                .find(|d| !d.is_empty())
        });

    let body = BODY
        .iter()
        .find_map(|sel| {
            document
                .select(sel)
                .map(visible_text)
                .find(|text| text.chars().count() > MIN_BODY_CHARS)
        })
        .or_else(|| {
            article
                .body
                .map(|b| normalize_text(&b))
                .filter(|b| b.chars().count() > MIN_BODY_CHARS)
        });

    ArticleDetail {
        description,
        body,
    }
}

/// Text of `el` without script, style and page-chrome subtrees.
fn visible_text(el: ElementRef<'_>) -> String {
    let parts: Vec<&str> = el
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| EXCLUDED.contains(&e.name()))
            })
        })
        .map(|(_, text)| &**text)
        .collect();
    normalize_text(&parts.join(" "))
}

/// Fill summary and content from article pages, for the first `limit` items.
///
/// Pages are fetched one after another so a source never opens more than one
/// connection at a time.
///
/// # Arguments
///
/// * `fetcher` - Fetcher used for the article pages
/// * `items` - Listing items, in listing order
/// * `limit` - How many leading items get their article page fetched
/// * `deadline` - Fetches still pending at this instant are abandoned
///
/// # Returns
///
/// The same items in the same order, enriched where a page arrived in time.
#[instrument(level = "info", skip_all, fields(count = items.len(), limit = limit))]
pub async fn enrich<F: PageFetcher>(
    fetcher: &F,
    items: Vec<NewsItem>,
    limit: usize,
    deadline: Instant,
) -> Vec<NewsItem> {
    if limit == 0 {
        return items;
    }
    let enriched: Vec<NewsItem> = stream::iter(items.into_iter().enumerate())
        .then(|(index, item)| async move {
            if index < limit {
                enrich_one(fetcher, item, deadline).await
            } else {
                item
            }
        })
        .collect()
        .await;
    info!(
        with_content = enriched.iter().filter(|i| !i.content.is_empty()).count(),
        "Enriched items from article pages"
    );
    enriched
}

async fn enrich_one<F: PageFetcher>(
    fetcher: &F,
    mut item: NewsItem,
    deadline: Instant,
) -> NewsItem {
    let Ok(fetched) = timeout_at(deadline, fetcher.fetch(&item.url)).await else {
        warn!(url = %item.url, "Enrichment deadline passed; keeping listing entry");
        return item;
    };
    match fetched {
        Ok(page) => {
            let detail = parse_detail(&page);
            if item.summary.is_empty() {
                if let Some(description) = detail.description {
                    item.summary = description;
                }
            }
            if let Some(body) = detail.body {
                item.content = body;
            }
            debug!(url = %item.url, content_chars = item.content.len(), "Enriched item");
        }
        Err(e) => {
            warn!(url = %item.url, error = %e, "Article page fetch failed; keeping listing entry");
        }
    }
    item
}
