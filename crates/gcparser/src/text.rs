//! Text helpers shared by the page parsers.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

lazy_static! {
    static ref P_TAG: Regex = Regex::new(r"(?i)<p[^>]*>").unwrap();
    static ref BR_TAG: Regex = Regex::new(r"(?i)<br[^>]*>").unwrap();
    static ref LI_TAG: Regex = Regex::new(r"(?i)<li[^>]*>").unwrap();
    static ref H_TAG: Regex = Regex::new(r"(?i)</?h[0-9][^>]*>").unwrap();
    static ref IMG_ALT: Regex = Regex::new(r#"(?i)<img[^>]*alt=['"]([^'"]+)['"][^>]*>"#).unwrap();
    static ref IMG_TAG: Regex = Regex::new(r"(?i)<img[^>]*>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref LEADING_WS: Regex = Regex::new(r"(?m)^\s+").unwrap();
    static ref TRAILING_WS: Regex = Regex::new(r"(?m)\s+$").unwrap();
    static ref BLANK_LINE: Regex = Regex::new(r"(?m)^\s*$\n").unwrap();
    static ref MULTI_WS: Regex = Regex::new(r"\s\s+").unwrap();
}

pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='m' | 'A'..='M' => (c as u8 + 13) as char,
            'n'..='z' | 'N'..='Z' => (c as u8 - 13) as char,
            _ => c,
        })
        .collect()
}

/// Decodes HTML entities, markup is kept as is.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let escaped = text.replace('<', "&lt;");
    Html::parse_fragment(&escaped)
        .root_element()
        .text()
        .collect()
}

/// Turns an HTML snippet into readable plain text.
///
/// Paragraphs start with `** `, list items with ` - `, images become
/// `[img alt]` and every other tag is dropped.
pub fn clean_html(html: &str) -> String {
    let text = html.replace('\r', " ").replace('\n', " ");

    let text = P_TAG.replace_all(&text, "\n** ");
    let text = BR_TAG.replace_all(&text, "\n");
    let text = LI_TAG.replace_all(&text, "\n - ");
    let text = H_TAG.replace_all(&text, "\n");
    let text = IMG_ALT.replace_all(&text, "[img ${1}]");
    let text = IMG_TAG.replace_all(&text, "[img]");
    let text = ANY_TAG.replace_all(&text, "");

    let text = unescape(&text);

    let text = LEADING_WS.replace_all(&text, "");
    let text = TRAILING_WS.replace_all(&text, "");
    let text = BLANK_LINE.replace_all(&text, "");
    MULTI_WS.replace_all(&text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rot13_is_an_involution() {
        assert_eq!(rot13("Haqre n fgbar, 2z"), "Under a stone, 2m");
        assert_eq!(rot13(&rot13("Magnetic!")), "Magnetic!");
    }

    #[test]
    fn unescape_entities_only() {
        assert_eq!(unescape("Fish &amp; chips &lt;3"), "Fish & chips <3");
        assert_eq!(unescape("<b>bold</b> &quot;x&quot;"), "<b>bold</b> \"x\"");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn clean_html_keeps_structure() {
        let html = "<p>Fish &amp; chips</p><ul><li>one</li><li>two</li></ul>\
                    <img src='x.png' alt='map'><br/>End";
        assert_eq!(clean_html(html), "** Fish & chips\n- one\n- two[img map]\nEnd");
    }

    #[test]
    fn clean_html_collapses_whitespace() {
        let html = "<h2>Title</h2>\r\n\r\n   some    text <IMG SRC=\"a.gif\">";
        assert_eq!(clean_html(html), "Title\nsome text [img]");
    }
}
