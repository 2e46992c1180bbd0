//! Extractor for the primary regional listing site.
//!
//! The site's listing pages are a flat `<ul>` of `li.nws` entries:
//!
//! ```html
//! <li class="nws">
//!   <a class="content" href="/haber/...">
//!     <img data-originalm="/images/...jpg">
//!     <span class="title">...</span>
//!   </a>
//!   <p class="news-detail">...</p>
//!   <span class="mdate">18.10.2025 14:30</span>
//! </li>
//! ```
//!
//! When a seed points at a page without that listing (an article page, or a
//! redesigned section), the page itself becomes a single candidate built from
//! JSON-LD, `<title>`/`<h1>` and the description meta tags.

use super::jsonld;
use super::{
    ExtractContext, Extraction, PreparedSource, RawFields, element_text, first_attr, first_text,
    finish_candidate,
};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static LISTING: Lazy<Selector> = Lazy::new(|| selector("li.nws"));
static TITLE: Lazy<[Selector; 1]> = Lazy::new(|| [selector("span.title")]);
static LINK: Lazy<[Selector; 1]> = Lazy::new(|| [selector("a.content")]);
static SUMMARY: Lazy<[Selector; 1]> = Lazy::new(|| [selector("p.news-detail")]);
static MDATE: Lazy<[Selector; 1]> = Lazy::new(|| [selector("span.mdate")]);
static IMAGE: Lazy<[Selector; 1]> = Lazy::new(|| [selector("img")]);
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-originalm"];

static PAGE_TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static PAGE_H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));
static CANONICAL: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel="canonical"]"#));
static OG_URL: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:url"]"#));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:image"]"#));
static PUBLISHED_META: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="article:published_time"]"#));

/// Extract candidates from a primary-site page.
#[instrument(level = "debug", skip_all, fields(source = %source.name, page_url = %page_url))]
pub fn extract(
    page: &str,
    page_url: &Url,
    source: &PreparedSource,
    ctx: &ExtractContext,
) -> Extraction {
    let document = Html::parse_document(page);
    let mut extraction = Extraction::default();

    let entries: Vec<_> = document.select(&LISTING).collect();
    if entries.is_empty() {
        debug!("No listing entries; falling back to page-level fields");
        extraction.push(finish_candidate(page_fields(&document, page_url), source, ctx, None));
        return extraction;
    }

    debug!(count = entries.len(), "Found listing entries");
    for entry in entries {
        let raw = RawFields {
            title: first_text(entry, &*TITLE),
            link: first_attr(entry, &*LINK, &["href"]),
            summary: first_text(entry, &*SUMMARY),
            published: first_text(entry, &*MDATE),
            image: first_attr(entry, &*IMAGE, IMAGE_ATTRS),
        };
        extraction.push(finish_candidate(raw, source, ctx, None));
    }
    extraction
}

fn meta_content(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .filter_map(|el| el.value().attr("content").or_else(|| el.value().attr("href")))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_element_text(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// Build one candidate out of page-level metadata.
fn page_fields(document: &Html, page_url: &Url) -> RawFields {
    let article = jsonld::find_article(document).unwrap_or_default();
    RawFields {
        title: article
            .headline
            .or_else(|| first_element_text(document, &PAGE_TITLE))
            .or_else(|| first_element_text(document, &PAGE_H1)),
        link: meta_content(document, &CANONICAL)
            .or_else(|| meta_content(document, &OG_URL))
            .or_else(|| Some(page_url.to_string())),
        summary: article
            .description
            .or_else(|| meta_content(document, &META_DESCRIPTION)),
        published: article
            .date_published
            .or_else(|| meta_content(document, &PUBLISHED_META)),
        image: article.image.or_else(|| meta_content(document, &OG_IMAGE)),
    }
}
