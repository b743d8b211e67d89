use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::Article;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2} [A-Za-z]{3} \d{4}").unwrap());

static ENTRY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("dl > dt").unwrap());
static ABS_LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="/abs/"]"#).unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".list-title").unwrap());
static ABSTRACT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p.mathjax").unwrap());
static ABSTRACT_FALLBACK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".mathjax").unwrap());
static DATE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".list-date").unwrap());
static DATELINE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".list-dateline").unwrap());

/// Articles matching the window on one page, plus whether the next page
/// of the category should be fetched.
#[derive(Debug)]
pub struct ExtractedPage {
    pub articles: Vec<Article>,
    pub continue_paging: bool,
}

/// Walks the `dt`/`dd` entry pairs of one listing page and collects the
/// entries published on `target_day`. Listings are date-descending, so the
/// first entry older than the window ends the whole category; a page with
/// fewer raw entries than `page_size` is the last page.
pub fn extract_listing(
    document: &Html,
    target_day: NaiveDate,
    site_name: &str,
    category: &str,
    base: &Url,
    page_size: usize,
) -> ExtractedPage {
    let mut articles = Vec::new();
    let mut continue_paging = true;
    let mut processed = 0usize;

    for dt in document.select(&ENTRY_SEL) {
        processed += 1;
        let Some(dd) = next_element(dt) else { continue };

        let (article, published_at) = parse_entry(dt, dd, site_name, category, base);
        let entry_day = published_at.date_naive();
        if entry_day == target_day {
            articles.push(article);
        }
        if entry_day < target_day {
            continue_paging = false;
            break;
        }
        // Entries dated after the window are skipped but do not end the page.
    }

    if processed < page_size {
        continue_paging = false;
    }

    ExtractedPage {
        articles,
        continue_paging,
    }
}

fn next_element(node: ElementRef<'_>) -> Option<ElementRef<'_>> {
    node.next_siblings().find_map(ElementRef::wrap)
}

fn parse_entry(
    dt: ElementRef<'_>,
    dd: ElementRef<'_>,
    site_name: &str,
    category: &str,
    base: &Url,
) -> (Article, DateTime<Utc>) {
    let link = dt.select(&ABS_LINK_SEL).next();
    let href = link.and_then(|a| a.value().attr("href")).unwrap_or_default();

    // Identity: visible link text, then the link path, then the URL itself.
    let mut id = link.map(element_text).unwrap_or_default();
    if id.is_empty() {
        id = href.trim_start_matches("/abs/").to_string();
    }

    let url = if href.starts_with("http") {
        href.to_string()
    } else {
        base.join(href)
            .map(Into::into)
            .unwrap_or_else(|_| href.to_string())
    };

    let title = dd.select(&TITLE_SEL).next().map(element_text).unwrap_or_default();
    let title = title.trim_start_matches("Title:").trim().to_string();

    let abstract_node = dd
        .select(&ABSTRACT_SEL)
        .next()
        .or_else(|| dd.select(&ABSTRACT_FALLBACK_SEL).last());
    let abstract_text = abstract_node.map(element_text).unwrap_or_default();
    let abstract_text = abstract_text.trim_start_matches("Abstract:").trim().to_string();

    let mut date_text = dd.select(&DATE_SEL).next().map(element_text).unwrap_or_default();
    if date_text.is_empty() {
        date_text = dd
            .select(&DATELINE_SEL)
            .next()
            .map(element_text)
            .unwrap_or_default();
    }
    let published_at = parse_listing_date(&date_text);

    if id.is_empty() {
        id = url.clone();
    }

    let source = if category.is_empty() {
        site_name.to_string()
    } else {
        format!("{site_name}/{category}")
    };

    let article = Article {
        id,
        title,
        abstract_text,
        url,
        source,
        published_at,
    };

    (article, published_at)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Entries without a recognizable `day month year` token are treated as
/// published "now", which keeps them inside the current window instead of
/// silently dropping them.
fn parse_listing_date(text: &str) -> DateTime<Utc> {
    if let Some(token) = DATE_RE.find(text) {
        if let Ok(date) = NaiveDate::parse_from_str(token.as_str(), "%e %b %Y") {
            return date.and_time(NaiveTime::MIN).and_utc();
        }
    }
    Utc::now()
}
