//! Article metadata embedded as JSON-LD (`<script type="application/ld+json">`).
//!
//! Sites wrap the article object in many ways: a bare object, an array of
//! objects, or an `@graph` list next to `WebSite`/`Organization` nodes. The
//! search below walks all of them and returns the first node whose `@type` is
//! an article type.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

static LD_JSON: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector is valid")
});

const ARTICLE_TYPES: &[&str] = &["NewsArticle", "Article", "ReportageNewsArticle", "BlogPosting"];

/// The article fields this crate reads from JSON-LD.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArticleMeta {
    pub headline: Option<String>,
    pub description: Option<String>,
    pub date_published: Option<String>,
    pub image: Option<String>,
    pub body: Option<String>,
}

/// First article node found in the document's JSON-LD blocks.
pub fn find_article(document: &Html) -> Option<ArticleMeta> {
    document
        .select(&LD_JSON)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .find_map(|json| find_article_node(&json).map(read_article))
}

fn is_article(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => ARTICLE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| ARTICLE_TYPES.contains(&t)),
        _ => false,
    }
}

fn find_article_node(json: &Value) -> Option<&Value> {
    match json {
        Value::Array(nodes) => nodes.iter().find_map(find_article_node),
        Value::Object(obj) => {
            if is_article(json) {
                return Some(json);
            }
            obj.get("@graph").and_then(find_article_node)
        }
        _ => None,
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `image` may be a URL string, an `ImageObject`, or a list of either.
fn image_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(_) => string_field(value, "url"),
        Value::Array(items) => items.iter().find_map(image_field),
        _ => None,
    }
}

fn read_article(node: &Value) -> ArticleMeta {
    ArticleMeta {
        headline: string_field(node, "headline").or_else(|| string_field(node, "name")),
        description: string_field(node, "description"),
        date_published: string_field(node, "datePublished"),
        image: node.get("image").and_then(image_field),
        body: string_field(node, "articleBody"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><head><script type="application/ld+json">{json}</script></head></html>"#
        ))
    }

    #[test]
    fn test_bare_news_article() {
        let html = doc(
            r#"{"@type":"NewsArticle","headline":" Ferry strike ends ","datePublished":"2025-10-18T08:00:00Z",
                "image":{"@type":"ImageObject","url":"https://cdn.example.com/f.jpg"}}"#,
        );
        let meta = find_article(&html).unwrap();
        assert_eq!(meta.headline.as_deref(), Some("Ferry strike ends"));
        assert_eq!(meta.date_published.as_deref(), Some("2025-10-18T08:00:00Z"));
        assert_eq!(meta.image.as_deref(), Some("https://cdn.example.com/f.jpg"));
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_graph_and_type_lists() {
        let html = doc(
            r#"{"@graph":[{"@type":"Organization","name":"Org"},
                {"@type":["Article","NewsArticle"],"name":"Named only","articleBody":"Body text",
                 "image":["https://cdn.example.com/a.jpg"]}]}"#,
        );
        let meta = find_article(&html).unwrap();
        assert_eq!(meta.headline.as_deref(), Some("Named only"));
        assert_eq!(meta.body.as_deref(), Some("Body text"));
        assert_eq!(meta.image.as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_invalid_or_unrelated_json_is_ignored() {
        assert!(find_article(&doc("{not json")).is_none());
        assert!(find_article(&doc(r#"{"@type":"WebSite","name":"News"}"#)).is_none());
        assert!(find_article(&Html::parse_document("<html></html>")).is_none());
    }
}
