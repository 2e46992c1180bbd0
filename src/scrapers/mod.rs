//! Turning fetched listing pages into candidate news items.
//!
//! Each source is served by one of a closed set of strategies, chosen by
//! [`ExtractorKind`] on its [`SourceConfig`]:
//!
//! | Kind | Module | Notes |
//! |------|--------|-------|
//! | `primary` | [`primary`] | Exact layout of the known listing site, page-level fallback |
//! | `generic` | [`generic`] | Ordered selector chains from the source configuration |
//!
//! Both strategies hand their raw field values to [`finish_candidate`], so link
//! absolutization, title cleanup and the discard rules are applied identically.
//! A listing entry that cannot become an item is recorded as a typed
//! [`Rejection`]; it never aborts the rest of the page.

pub mod detail;
pub mod generic;
pub mod jsonld;
pub mod primary;

use crate::error::{ConfigError, Rejection};
use crate::models::{ExtractorKind, NewsItem, SourceConfig};
use crate::normalize::{normalize_text, normalize_title, parse_date};
use chrono::{DateTime, FixedOffset, Utc};
use scraper::{ElementRef, Selector};
use url::Url;

/// Clock and timezone used while extracting, so extraction stays pure.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

/// Items accepted from one page plus the entries that were rejected.
#[derive(Debug, Default)]
pub struct Extraction {
    pub items: Vec<NewsItem>,
    pub rejected: Vec<Rejection>,
}

impl Extraction {
    fn push(&mut self, candidate: Result<NewsItem, Rejection>) {
        match candidate {
            Ok(item) => self.items.push(item),
            Err(rejection) => self.rejected.push(rejection),
        }
    }
}

/// Field values found for one listing entry, before any validation.
///
/// `None` means no selector matched with a non-empty value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawFields {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
    pub image: Option<String>,
}

/// Strategy with everything it needs already compiled.
#[derive(Debug)]
pub enum Strategy {
    Primary,
    Generic(generic::CompiledSelectors),
}

/// A source validated and compiled for one run.
#[derive(Debug)]
pub struct PreparedSource {
    pub name: String,
    pub base: Url,
    /// Host of the base URL, e.g. `www.example.com`.
    pub origin: String,
    pub seeds: Vec<Url>,
    pub strategy: Strategy,
    pub trust: i64,
    pub min_title_len: usize,
    pub min_listing_items: usize,
    pub detail_limit: usize,
}

/// Validate a source configuration and compile its selectors.
///
/// # Arguments
///
/// * `source` - The configured source, enabled or not
///
/// # Returns
///
/// A [`PreparedSource`] with parsed base and seed URLs and a ready
/// [`Strategy`], or a [`ConfigError`] for a missing seed, an unparseable URL
/// or an invalid selector.
pub fn prepare(source: &SourceConfig) -> Result<PreparedSource, ConfigError> {
    let invalid_url = |url: &str, reason: String| ConfigError::InvalidUrl {
        source_name: source.name.clone(),
        url: url.to_string(),
        reason,
    };

    let base = Url::parse(&source.base).map_err(|e| invalid_url(&source.base, e.to_string()))?;
    let origin = base
        .host_str()
        .ok_or_else(|| invalid_url(&source.base, "no host".to_string()))?
        .to_string();

    if source.seeds.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::NoSeeds(source.name.clone()));
    }
    let seeds = source
        .seeds
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| base.join(s.trim()).map_err(|e| invalid_url(s, e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    let strategy = match source.extractor {
        ExtractorKind::Primary => Strategy::Primary,
        ExtractorKind::Generic => Strategy::Generic(generic::CompiledSelectors::compile(
            &source.name,
            &source.selectors,
        )?),
    };

    Ok(PreparedSource {
        name: source.name.clone(),
        base,
        origin,
        seeds,
        strategy,
        trust: source.trust,
        min_title_len: source.min_title_len,
        min_listing_items: source.min_listing_items,
        detail_limit: source.detail_limit,
    })
}

/// Extract candidates from one fetched page of `source`.
///
/// # Arguments
///
/// * `page` - Raw HTML of the listing page
/// * `page_url` - The seed URL the page came from
/// * `source` - The prepared source, which picks the strategy
/// * `ctx` - Clock and UTC offset for timestamp parsing
///
/// # Returns
///
/// An [`Extraction`] with the accepted items in page order and one
/// [`Rejection`] per discarded entry.
pub fn extract(
    page: &str,
    page_url: &Url,
    source: &PreparedSource,
    ctx: &ExtractContext,
) -> Extraction {
    match &source.strategy {
        Strategy::Primary => primary::extract(page, page_url, source, ctx),
        Strategy::Generic(selectors) => generic::extract(page, source, selectors, ctx),
    }
}

/// Compile one selector, naming the source on failure.
pub fn compile_selector(source_name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        source_name: source_name.to_string(),
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `href` against `base`, keeping only http(s) links without fragment.
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Visible text of an element, normalized.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// First non-empty text among `selectors`, tried in order.
pub fn first_text(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        scope
            .select(sel)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// First non-empty attribute value among `selectors` x `attrs`, tried in order.
///
/// Inline `data:` placeholders (lazy-loading images) count as empty.
pub fn first_attr(scope: ElementRef<'_>, selectors: &[Selector], attrs: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        scope.select(sel).find_map(|el| {
            attrs.iter().find_map(|attr| {
                el.value()
                    .attr(attr)
                    .map(str::trim)
                    .filter(|v| !v.is_empty() && !v.starts_with("data:"))
                    .map(str::to_string)
            })
        })
    })
}

/// Apply the shared post-processing and discard rules to one entry.
///
/// # Arguments
///
/// * `raw` - Field values as found on the page
/// * `source` - Supplies the base URL and the source name
/// * `ctx` - Clock and UTC offset for timestamp parsing
/// * `min_title_len` - Only enforced when given (the generic extractor)
///
/// # Returns
///
/// The normalized [`NewsItem`], or the [`Rejection`] explaining why the entry
/// was dropped.
pub fn finish_candidate(
    raw: RawFields,
    source: &PreparedSource,
    ctx: &ExtractContext,
    min_title_len: Option<usize>,
) -> Result<NewsItem, Rejection> {
    let title = raw
        .title
        .map(|t| normalize_title(&t))
        .filter(|t| !t.is_empty())
        .ok_or(Rejection::MissingTitle)?;

    let href = raw
        .link
        .filter(|l| !l.trim().is_empty())
        .ok_or(Rejection::MissingLink)?;
    let url = absolutize(&source.base, &href).ok_or(Rejection::InvalidLink(href))?;

    if let Some(min) = min_title_len {
        let len = title.chars().count();
        if len < min {
            return Err(Rejection::TitleTooShort { len, min });
        }
    }

    let mut item = NewsItem::new(title, url.to_string(), &source.name, &source.origin);
    item.summary = raw.summary.map(|s| normalize_text(&s)).unwrap_or_default();
    item.published_at = parse_date(raw.published.as_deref().unwrap_or(""), ctx.offset, ctx.now);
    item.image_url = raw
        .image
        .and_then(|src| absolutize(&source.base, &src))
        .map(String::from)
        .unwrap_or_default();
    Ok(item)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Published, SelectorSet, default_utc_offset};

    pub(crate) fn ctx() -> ExtractContext {
        ExtractContext {
            now: "2025-10-18T12:00:00Z".parse().unwrap(),
            offset: default_utc_offset(),
        }
    }

    pub(crate) fn prepared(kind: ExtractorKind) -> PreparedSource {
        let config = SourceConfig::new(
            "test-source",
            "https://news.example.com",
            &["https://news.example.com/city/"],
            kind,
        );
        prepare(&config).unwrap()
    }

    fn raw(title: &str, link: &str) -> RawFields {
        RawFields {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_absolutize_relative_and_absolute() {
        let base = Url::parse("https://news.example.com").unwrap();
        assert_eq!(
            absolutize(&base, "/city/ferry-123#comments").unwrap().as_str(),
            "https://news.example.com/city/ferry-123"
        );
        assert_eq!(
            absolutize(&base, "https://other.example.org/a").unwrap().as_str(),
            "https://other.example.org/a"
        );
        assert!(absolutize(&base, "javascript:void(0)").is_none());
        assert!(absolutize(&base, "mailto:desk@example.com").is_none());
        assert!(absolutize(&base, "#top").is_none());
        assert!(absolutize(&base, "   ").is_none());
    }

    #[test]
    fn test_finish_candidate_builds_absolute_item() {
        let source = prepared(ExtractorKind::Generic);
        let mut fields = raw("  LIVE: Ferry services  resume ", "/city/ferry");
        fields.summary = Some("Boats are &amp; back".to_string());
        fields.published = Some("18.10.2025 14:30".to_string());
        fields.image = Some("/img/ferry.jpg".to_string());

        let item = finish_candidate(fields, &source, &ctx(), None).unwrap();
        assert_eq!(item.title, "Ferry services resume");
        assert_eq!(item.url, "https://news.example.com/city/ferry");
        assert_eq!(item.summary, "Boats are & back");
        assert_eq!(
            item.published_at,
            Published::At("2025-10-18T11:30:00Z".parse().unwrap())
        );
        assert_eq!(item.image_url, "https://news.example.com/img/ferry.jpg");
        assert_eq!(item.source_name, "test-source");
        assert_eq!(item.source_origin, "news.example.com");
    }

    #[test]
    fn test_finish_candidate_distinguishes_rejections() {
        let source = prepared(ExtractorKind::Generic);
        let c = ctx();

        let no_title = RawFields {
            link: Some("/a".to_string()),
            ..Default::default()
        };
        assert_eq!(
            finish_candidate(no_title, &source, &c, None),
            Err(Rejection::MissingTitle)
        );
        assert_eq!(
            finish_candidate(raw("&nbsp; ", "/a"), &source, &c, None),
            Err(Rejection::MissingTitle)
        );

        let no_link = RawFields {
            title: Some("A perfectly good title".to_string()),
            ..Default::default()
        };
        assert_eq!(
            finish_candidate(no_link, &source, &c, None),
            Err(Rejection::MissingLink)
        );
        assert_eq!(
            finish_candidate(raw("A perfectly good title", "javascript:;"), &source, &c, None),
            Err(Rejection::InvalidLink("javascript:;".to_string()))
        );
        assert_eq!(
            finish_candidate(raw("Home", "/"), &source, &c, Some(15)),
            Err(Rejection::TitleTooShort { len: 4, min: 15 })
        );
        assert!(finish_candidate(raw("Home", "/"), &source, &c, None).is_ok());
    }

    #[test]
    fn test_prepare_rejects_missing_seeds() {
        let mut config =
            SourceConfig::new("empty", "https://example.com", &[], ExtractorKind::Generic);
        assert_eq!(
            prepare(&config).unwrap_err(),
            ConfigError::NoSeeds("empty".to_string())
        );
        config.seeds = vec!["  ".to_string()];
        assert!(matches!(prepare(&config), Err(ConfigError::NoSeeds(_))));
    }

    #[test]
    fn test_prepare_rejects_bad_base_and_selector() {
        let config = SourceConfig::new("bad", "not a url", &["/x"], ExtractorKind::Generic);
        assert!(matches!(prepare(&config), Err(ConfigError::InvalidUrl { .. })));

        let mut config = SourceConfig::new(
            "bad-selector",
            "https://example.com",
            &["/news"],
            ExtractorKind::Generic,
        );
        config.selectors = SelectorSet {
            title: vec!["h2[".to_string()],
            ..SelectorSet::default()
        };
        assert!(matches!(
            prepare(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_prepare_resolves_relative_seeds() {
        let config = SourceConfig::new(
            "rel",
            "https://example.com",
            &["/istanbul/", "https://example.com/guncel/"],
            ExtractorKind::Primary,
        );
        let source = prepare(&config).unwrap();
        assert_eq!(source.origin, "example.com");
        assert_eq!(source.seeds[0].as_str(), "https://example.com/istanbul/");
        assert_eq!(source.seeds[1].as_str(), "https://example.com/guncel/");
    }
}
