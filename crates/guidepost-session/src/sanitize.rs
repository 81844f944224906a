//! Strips the assistant's own UI out of captured markup.

use std::sync::LazyLock;

use guidepost_protocols::OVERLAY_ATTRIBUTE;
use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").expect("tag pattern is valid")
});

static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)id\s*=\s*["']([^"']*)["']"#).expect("id pattern is valid")
});

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Remove every element whose id is in `excluded_ids`, and every overlay
/// node, together with their subtrees.
pub fn sanitize_markup(markup: &str, excluded_ids: &[String]) -> String {
    let tags: Vec<_> = TAG.captures_iter(markup).collect();
    let mut out = String::with_capacity(markup.len());
    let mut copied_to = 0;
    let mut i = 0;

    while i < tags.len() {
        let tag = &tags[i];
        let whole = tag.get(0).map(|m| m.range()).unwrap_or_default();
        if whole.start < copied_to || !is_excluded(&tag[1], &tag[3], excluded_ids) {
            i += 1;
            continue;
        }

        let name = tag[2].to_ascii_lowercase();
        let self_closing = tag[3].trim_end().ends_with('/') || VOID_ELEMENTS.contains(&name.as_str());
        let mut end = whole.end;
        let mut next = i + 1;
        if !self_closing {
            end = markup.len();
            let mut depth = 1;
            while next < tags.len() {
                let candidate = &tags[next];
                next += 1;
                if !candidate[2].eq_ignore_ascii_case(&name) {
                    continue;
                }
                if &candidate[1] == "/" {
                    depth -= 1;
                    if depth == 0 {
                        end = candidate.get(0).map(|m| m.end()).unwrap_or(markup.len());
                        break;
                    }
                } else if !candidate[3].trim_end().ends_with('/') {
                    depth += 1;
                }
            }
        }

        out.push_str(&markup[copied_to..whole.start]);
        copied_to = end;
        i = next;
    }

    out.push_str(&markup[copied_to.min(markup.len())..]);
    out
}

fn is_excluded(closing: &str, attributes: &str, excluded_ids: &[String]) -> bool {
    if closing == "/" {
        return false;
    }
    if attributes.contains(OVERLAY_ATTRIBUTE) {
        return true;
    }
    ID_ATTR
        .captures(attributes)
        .is_some_and(|c| excluded_ids.iter().any(|id| *id == c[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_removes_chat_widget_subtree() {
        let html = r#"<html><body><main id="app"><div>Listings</div></main><div id="chat-widget"><div><div>nested</div></div><button>Send</button></div><footer>f</footer></body></html>"#;
        let clean = sanitize_markup(html, &ids(&["chat-widget"]));
        assert_eq!(
            clean,
            r#"<html><body><main id="app"><div>Listings</div></main><footer>f</footer></body></html>"#
        );
    }

    #[test]
    fn test_removes_overlay_canvases() {
        let html = format!(
            r#"<body><p>x</p><canvas {}="cursor" style="z-index:10000"></canvas><canvas {}="highlight"></canvas></body>"#,
            OVERLAY_ATTRIBUTE, OVERLAY_ATTRIBUTE
        );
        assert_eq!(sanitize_markup(&html, &[]), "<body><p>x</p></body>");
    }

    #[test]
    fn test_data_testid_is_not_an_id() {
        let html = r#"<div data-testid="chat-widget">keep</div>"#;
        assert_eq!(sanitize_markup(html, &ids(&["chat-widget"])), html);
    }

    #[test]
    fn test_void_excluded_element() {
        let html = r#"<form><input id="secret" type="hidden"><input id="q"></form>"#;
        assert_eq!(
            sanitize_markup(html, &ids(&["secret"])),
            r#"<form><input id="q"></form>"#
        );
    }

    #[test]
    fn test_untouched_without_matches() {
        let html = "<div><span>a</span></div>";
        assert_eq!(sanitize_markup(html, &ids(&["chat-widget"])), html);
    }
}
