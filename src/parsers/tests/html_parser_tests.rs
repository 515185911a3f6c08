use crate::parsers::html;
use std::collections::BTreeSet;

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
  <head><title>
    Example   Domain
  </title></head>
  <body>
    <h1> Welcome </h1>
    <h2>Features</h2>
    <h3>Features</h3>
    <h4>Not collected</h4>
    <p>First paragraph.</p>
    <p>   </p>
    <p>First paragraph.</p>
    <p>Second <a href="/inline">paragraph</a> with a link.</p>
    <ul><li>One</li><li>Two</li></ul>
    <ol>
      <li>Step</li>
    </ol>
    <a href="https://example.com/about">About</a>
    <a href="docs/guide.html?x=1#intro">Guide</a>
    <a>No target</a>
  </body>
</html>"#;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_title_is_whitespace_collapsed() {
        let content = html::parse_content(PAGE);
        assert_eq!(content.title, "Example Domain");
    }

    #[test]
    fn test_headings_are_h1_to_h3_deduplicated() {
        let content = html::parse_content(PAGE);
        assert_eq!(content.headings, set(&["Welcome", "Features"]));
    }

    #[test]
    fn test_paragraphs_trimmed_non_empty_and_distinct() {
        let content = html::parse_content(PAGE);
        assert_eq!(
            content.paragraphs,
            set(&["First paragraph.", "Second paragraph with a link."])
        );
    }

    #[test]
    fn test_lists_use_whole_element_text() {
        let content = html::parse_content(PAGE);
        assert_eq!(content.lists.len(), 2);
        assert!(content.lists.contains("OneTwo"));
        assert!(content.lists.contains("Step"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        assert_eq!(html::parse_content(PAGE), html::parse_content(PAGE));
    }

    #[test]
    fn test_empty_document_has_every_field() {
        let content = html::parse_content("");
        assert_eq!(content.title, "");
        assert!(content.headings.is_empty());
        assert!(content.paragraphs.is_empty());
        assert!(content.lists.is_empty());
    }

    #[test]
    fn test_links_are_raw_href_values() {
        let links = html::parse_links(PAGE);
        assert_eq!(links.base, None);
        assert_eq!(
            links.hrefs,
            vec![
                "/inline".to_string(),
                "https://example.com/about".to_string(),
                "docs/guide.html?x=1#intro".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_links() {
        assert!(html::parse_links("<p>Plain</p>").hrefs.is_empty());
    }

    #[test]
    fn test_first_base_href_is_reported() {
        let links = html::parse_links(
            r#"<html><head><base href=" https://example.com/docs/ "><base href="/other/"></head>
            <body><a href="guide">Guide</a></body></html>"#,
        );
        assert_eq!(links.base.as_deref(), Some("https://example.com/docs/"));
        assert_eq!(links.hrefs, vec!["guide".to_string()]);
    }

    #[test]
    fn test_title_ignores_svg_title() {
        let content = html::parse_content(
            "<html><head></head><body><svg><title>Icon</title></svg><p>x</p></body></html>",
        );
        assert_eq!(content.title, "");

        let content = html::parse_content(
            "<html><head><title>Page</title></head><body><svg><title>Icon</title></svg></body></html>",
        );
        assert_eq!(content.title, "Page");
    }

    #[test]
    fn test_title_keeps_non_ascii_whitespace() {
        let content = html::parse_content("<title>\tA\u{a0} B\n</title>");
        assert_eq!(content.title, "A\u{a0} B");
    }
}
