//! Generic listing extractor driven by ordered selector chains.
//!
//! The algorithm, for every source that is not the primary site:
//!
//! 1. Try each listing-container selector in order and adopt the first one
//!    that yields more than `min_listing_items` elements.
//! 2. Inside each adopted element, resolve title, link, summary, timestamp and
//!    image independently: the first selector that matches with a non-empty
//!    value wins.
//! 3. Hand the raw values to [`finish_candidate`] with the source's minimum
//!    title length, which filters out navigation and footer links caught by
//!    broad selectors such as `a` or `article`.

use super::{
    ExtractContext, Extraction, PreparedSource, RawFields, compile_selector, first_attr,
    first_text, finish_candidate,
};
use crate::error::ConfigError;
use crate::models::SelectorSet;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// [`SelectorSet`] with every selector parsed once per run.
#[derive(Debug)]
pub struct CompiledSelectors {
    pub containers: Vec<Selector>,
    pub title: Vec<Selector>,
    pub link: Vec<Selector>,
    pub summary: Vec<Selector>,
    pub published: Vec<Selector>,
    pub image: Vec<Selector>,
    pub image_attrs: Vec<String>,
}

impl CompiledSelectors {
    pub fn compile(source_name: &str, set: &SelectorSet) -> Result<Self, ConfigError> {
        let compile_all = |list: &[String]| {
            list.iter()
                .map(|s| compile_selector(source_name, s))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            containers: compile_all(&set.containers)?,
            title: compile_all(&set.title)?,
            link: compile_all(&set.link)?,
            summary: compile_all(&set.summary)?,
            published: compile_all(&set.published)?,
            image: compile_all(&set.image)?,
            image_attrs: set.image_attrs.clone(),
        })
    }
}

/// Extract candidates from a listing page using the source's selector chains.
#[instrument(level = "debug", skip_all, fields(source = %source.name))]
pub fn extract(
    page: &str,
    source: &PreparedSource,
    selectors: &CompiledSelectors,
    ctx: &ExtractContext,
) -> Extraction {
    let document = Html::parse_document(page);
    let mut extraction = Extraction::default();

    let Some((index, entries)) = adopt_container(&document, selectors, source.min_listing_items)
    else {
        debug!("No listing container matched");
        return extraction;
    };
    debug!(container = index, count = entries.len(), "Adopted listing container");

    for entry in entries {
        let raw = read_fields(entry, selectors);
        extraction.push(finish_candidate(raw, source, ctx, Some(source.min_title_len)));
    }
    extraction
}

/// First container selector yielding more than `min_items` elements.
fn adopt_container<'a>(
    document: &'a Html,
    selectors: &CompiledSelectors,
    min_items: usize,
) -> Option<(usize, Vec<ElementRef<'a>>)> {
    selectors
        .containers
        .iter()
        .enumerate()
        .find_map(|(index, sel)| {
            let entries: Vec<_> = document.select(sel).collect();
            (entries.len() > min_items).then_some((index, entries))
        })
}

fn read_fields(entry: ElementRef<'_>, selectors: &CompiledSelectors) -> RawFields {
    let image_attrs: Vec<&str> = selectors.image_attrs.iter().map(String::as_str).collect();
    RawFields {
        title: first_text(entry, &selectors.title),
        link: first_attr(entry, &selectors.link, &["href"]),
        summary: first_text(entry, &selectors.summary),
        published: first_text(entry, &selectors.published)
            .or_else(|| first_attr(entry, &selectors.published, &["datetime"])),
        image: first_attr(entry, &selectors.image, &image_attrs),
    }
}
