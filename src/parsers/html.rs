use crate::results::PageContent;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static LISTS: LazyLock<Selector> = LazyLock::new(|| selector("ul, ol"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static BASE: LazyLock<Selector> = LazyLock::new(|| selector("base[href]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// Reads title, headings, paragraphs and lists from a serialized DOM
pub fn parse_content(html: &str) -> PageContent {
    let content = extract_content(&Html::parse_document(html));
    ::log::debug!(
        "HTML parser found {} headings, {} paragraphs, {} lists",
        content.headings.len(),
        content.paragraphs.len(),
        content.lists.len()
    );
    content
}

/// Anchor targets of a page as written in the markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// `href` of the first `<base>` element; relative hrefs resolve against it
    pub base: Option<String>,
    /// Raw `href` values of every anchor, unresolved and unfiltered
    pub hrefs: Vec<String>,
}

pub fn parse_links(html: &str) -> PageLinks {
    let doc = Html::parse_document(html);
    let links = PageLinks {
        base: doc
            .select(&BASE)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|s| s.trim().to_string()),
        hrefs: extract_links(&doc),
    };
    ::log::debug!("HTML parser found {} links", links.hrefs.len());
    links
}

fn extract_content(doc: &Html) -> PageContent {
    // document.title: first <title> outside SVG, ASCII whitespace collapsed
    let title = doc
        .select(&TITLE)
        .find(|t| !in_svg(*t))
        .map(|t| collapse_ascii_whitespace(&t.text().collect::<String>()))
        .unwrap_or_default();

    PageContent {
        title,
        headings: collect_texts(doc, &HEADINGS),
        paragraphs: collect_texts(doc, &PARAGRAPHS),
        lists: collect_texts(doc, &LISTS),
    }
}

fn in_svg(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "svg")
}

fn collapse_ascii_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed text content of every match, empty ones dropped, repeats collapsed
fn collect_texts(doc: &Html, selector: &Selector) -> BTreeSet<String> {
    doc.select(selector)
        .map(text_content)
        .filter(|t| !t.is_empty())
        .collect()
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn extract_links(doc: &Html) -> Vec<String> {
    doc.select(&LINKS)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect()
}
