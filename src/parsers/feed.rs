//! RSS 2.0 / Atom warning feed extraction.
//!
//! RSS items are kept only when their title or description mentions one of
//! the bulletin keywords. Atom entries are all kept: the Atom feeds this
//! proxy reads are already restricted to warnings by their provider.

use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, warn};

use super::decode::decode_xml;
use crate::error::{Error, Result};
use crate::models::WarningItem;

/// Bulletin terms that mark an RSS item as a warning.
pub const DEFAULT_WARNING_KEYWORDS: &[&str] = &[
    "警報",
    "特報",
    "豪(大)雨特報",
    "低溫特報",
    "濃霧特報",
    "強風特報",
    "大雷雨",
    "地震",
];

// ---

/// Parse a feed using [`DEFAULT_WARNING_KEYWORDS`].
pub fn parse_warnings_feed(xml: &str) -> Result<Vec<WarningItem>> {
    parse_warnings_feed_with(xml, DEFAULT_WARNING_KEYWORDS)
}

/// Decode raw feed bytes by their declared encoding (UTF-8 and Big5 as
/// fallbacks) and parse them with [`DEFAULT_WARNING_KEYWORDS`].
pub fn parse_warnings_feed_bytes(bytes: &[u8]) -> Result<Vec<WarningItem>> {
    let xml = decode_xml(bytes, "warnings feed")?;
    parse_warnings_feed(&xml)
}

/// Parse an RSS or Atom feed into warning items, in document order.
///
/// `keywords` only applies to RSS items. Fails only when the text is not
/// well-formed XML; missing child elements become empty strings.
pub fn parse_warnings_feed_with(xml: &str, keywords: &[&str]) -> Result<Vec<WarningItem>> {
    // ---
    let doc = Document::parse_with_options(xml, lenient_options()).map_err(|e| {
        warn!("Warnings feed is not well-formed XML: {}", e);
        Error::FeedParse(e)
    })?;

    let root = doc.root_element();
    let warnings = if root.tag_name().name() == "feed" {
        atom_entries(root)
    } else {
        rss_items(root, keywords)
    };

    debug!("Extracted {} warnings from feed", warnings.len());
    Ok(warnings)
}

/// Parsing options shared by the XML parsers: feeds in the wild carry DTDs.
pub(crate) fn lenient_options() -> ParsingOptions {
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

fn rss_items(root: Node, keywords: &[&str]) -> Vec<WarningItem> {
    // ---
    let mut total = 0;
    let items: Vec<WarningItem> = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "item")
        .inspect(|_| total += 1)
        .map(|item| WarningItem {
            title: child_text(item, "title"),
            link: child_text(item, "link"),
            description: child_text(item, "description"),
            pub_date: child_text(item, "pubDate"),
        })
        .filter(|w| is_relevant(w, keywords))
        .collect();

    debug!("RSS feed: kept {} of {} items", items.len(), total);
    items
}

fn atom_entries(root: Node) -> Vec<WarningItem> {
    // ---
    root.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "entry")
        .map(|entry| {
            let content = child_text(entry, "content");
            let description = if content.trim().is_empty() {
                child_text(entry, "summary")
            } else {
                content
            };

            WarningItem {
                title: child_text(entry, "title"),
                link: atom_link(entry),
                description,
                pub_date: child_text(entry, "published"),
            }
        })
        .collect()
}

/// `href` of the entry's alternate link, or of its first link.
fn atom_link(entry: Node) -> String {
    // ---
    let links: Vec<Node> = entry
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "link")
        .collect();

    links
        .iter()
        .find(|l| l.attribute("rel").map_or(true, |rel| rel == "alternate"))
        .or_else(|| links.first())
        .and_then(|l| l.attribute("href"))
        .unwrap_or_default()
        .to_string()
}

fn is_relevant(item: &WarningItem, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|k| item.title.contains(k) || item.description.contains(k))
}

/// Text of the first child element named `name`, or an empty string.
pub(crate) fn child_text(node: Node, name: &str) -> String {
    // ---
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .map(|n| {
            n.children()
                .filter(|c| c.is_text())
                .filter_map(|c| c.text())
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn rss(items: &[(&str, &str)]) -> String {
        // ---
        let body: String = items
            .iter()
            .enumerate()
            .map(|(i, (title, description))| {
                format!(
                    "<item><title>{title}</title><link>https://example.test/{i}</link>\
                     <description>{description}</description>\
                     <pubDate>Tue, 15 Jul 2025 0{i}:00:00 +0800</pubDate></item>"
                )
            })
            .collect();
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>CWA</title>{body}</channel></rss>"#)
    }

    #[test]
    fn test_rss_keeps_only_keyword_items_in_order() {
        // ---
        let xml = rss(&[
            ("颱風警報", "海上陸上颱風警報"),
            ("天氣概況", "晴時多雲"),
            ("豪雨", "大雨特報"),
            ("潮汐", "滿潮時間"),
            ("地震報告", "芮氏規模 4.2"),
        ]);

        let warnings = parse_warnings_feed(&xml).unwrap();

        let titles: Vec<&str> = warnings.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["颱風警報", "豪雨", "地震報告"]);
        assert_eq!(warnings[1].link, "https://example.test/2");
        assert_eq!(warnings[2].pub_date, "Tue, 15 Jul 2025 04:00:00 +0800");
    }

    #[test]
    fn test_big5_feed_bytes_keep_keywords() {
        // ---
        let xml = rss(&[("颱風警報", "海上陸上颱風警報"), ("天氣概況", "晴時多雲")])
            .replace(r#"encoding="UTF-8""#, r#"encoding="Big5""#);
        let (bytes, _, had_errors) = encoding_rs::BIG5.encode(&xml);
        assert!(!had_errors);
        assert!(std::str::from_utf8(&bytes).is_err());

        let warnings = parse_warnings_feed_bytes(&bytes).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].title, "颱風警報");
        assert_eq!(warnings[0].description, "海上陸上颱風警報");
    }

    #[test]
    fn test_rss_n_items_k_relevant() {
        // ---
        for n in 0..12 {
            let items: Vec<(String, String)> = (0..n)
                .map(|i| {
                    if i % 3 == 0 {
                        (format!("第{i}號 強風特報"), String::new())
                    } else {
                        (format!("公告 {i}"), "一般資訊".to_string())
                    }
                })
                .collect();
            let refs: Vec<(&str, &str)> = items
                .iter()
                .map(|(t, d)| (t.as_str(), d.as_str()))
                .collect();
            let expected: Vec<&str> = refs
                .iter()
                .filter(|(t, _)| t.contains("特報"))
                .map(|(t, _)| *t)
                .collect();

            let warnings = parse_warnings_feed(&rss(&refs)).unwrap();
            let titles: Vec<&str> = warnings.iter().map(|w| w.title.as_str()).collect();
            assert_eq!(titles, expected);
        }
    }

    #[test]
    fn test_rss_missing_elements_default_to_empty() {
        // ---
        let xml = "<rss><channel><item><title>低溫特報</title></item><item/></channel></rss>";

        let warnings = parse_warnings_feed(xml).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].title, "低溫特報");
        assert_eq!(warnings[0].link, "");
        assert_eq!(warnings[0].description, "");
        assert_eq!(warnings[0].pub_date, "");
    }

    #[test]
    fn test_rss_cdata_description() {
        // ---
        let xml = "<rss><channel><item><title>Notice</title>\
                   <description><![CDATA[<p>濃霧特報</p>]]></description></item></channel></rss>";

        let warnings = parse_warnings_feed(xml).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].description, "<p>濃霧特報</p>");
    }

    #[test]
    fn test_custom_keywords() {
        // ---
        let xml = rss(&[("Typhoon warning", ""), ("Sunny", "")]);

        let warnings = parse_warnings_feed_with(&xml, &["warning"]).unwrap();
        assert_eq!(warnings.len(), 1);

        let none = parse_warnings_feed_with(&xml, &[]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_atom_entries_are_not_keyword_filtered() {
        // ---
        // RSS filters by keyword, Atom passes every entry through.
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Warnings</title>
  <entry>
    <title>Sunny afternoon</title>
    <link rel="self" href="https://example.test/self"/>
    <link href="https://example.test/1"/>
    <published>2025-07-15T12:00:00Z</published>
    <content type="html">Nothing to report</content>
  </entry>
  <entry>
    <title>Gale warning</title>
    <link rel="alternate" href="https://example.test/2"/>
    <published>2025-07-15T13:00:00Z</published>
    <content></content>
    <summary>Strong winds along the coast</summary>
  </entry>
  <entry>
    <title>Bare entry</title>
  </entry>
</feed>"#;

        let warnings = parse_warnings_feed(xml).unwrap();

        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].link, "https://example.test/1");
        assert_eq!(warnings[0].description, "Nothing to report");
        assert_eq!(warnings[0].pub_date, "2025-07-15T12:00:00Z");
        assert_eq!(warnings[1].link, "https://example.test/2");
        assert_eq!(warnings[1].description, "Strong winds along the coast");
        assert_eq!(warnings[2].link, "");
        assert_eq!(warnings[2].description, "");
        assert_eq!(warnings[2].pub_date, "");
    }

    #[test]
    fn test_malformed_xml_is_feed_parse_error() {
        // ---
        let result = parse_warnings_feed("<rss><channel><item><title>警報</channel></rss>");
        assert!(matches!(result, Err(Error::FeedParse(_))));

        let empty = parse_warnings_feed("");
        assert!(matches!(empty, Err(Error::FeedParse(_))));
    }

    #[test]
    fn test_feed_without_items() {
        // ---
        let warnings = parse_warnings_feed("<rss><channel><title>x</title></channel></rss>").unwrap();
        assert!(warnings.is_empty());
    }
}
