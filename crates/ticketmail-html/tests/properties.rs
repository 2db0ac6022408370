//! Property tests for the HTML renderer.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use ticketmail_html::render_html;

const TAGS: &[&str] = &[
    "<p>", "</p>", "<div>", "</div>", "<br>", "<h3>", "</h3>", "<ul>", "</ul>", "<ol>", "</ol>",
    "<li>", "</li>", "<b>", "</b>", "<i>", "</i>", "<pre>", "</pre>", "<code>", "</code>",
    "<a href=\"https://example.com\">", "</a>", "<img alt=\"pic\" src=\"p.png\">", "\n\n\n",
];

/// Fragments that exercise every rendering rule.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(TAGS).prop_map(str::to_string),
        "[a-z &;<>\n]{0,12}",
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..40).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn rendering_is_deterministic(html in document()) {
        let first = render_html(&html).unwrap();
        let second = render_html(&html).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn output_never_has_three_newlines(html in document()) {
        let out = render_html(&html).unwrap();
        prop_assert!(!out.contains("\n\n\n"), "got {:?}", out);
    }

    #[test]
    fn output_is_trimmed(html in document()) {
        let out = render_html(&html).unwrap();
        prop_assert_eq!(out.trim(), out.as_str());
    }

    #[test]
    fn arbitrary_text_never_fails(html in ".{0,200}") {
        prop_assert!(render_html(&html).is_ok());
    }
}

#[test]
fn deeply_nested_markup_renders() {
    let depth = 1_000;
    let html = format!("{}deep{}", "<div><span>".repeat(depth), "</span></div>".repeat(depth));
    let out = render_html(&html).unwrap();
    assert_eq!(out, "deep");
}

#[test]
fn deeply_nested_preformatted_text_stays_verbatim() {
    let depth = 1_000;
    let html = format!(
        "<p>log:</p><pre>{}a  b{}</pre>",
        "<span>".repeat(depth),
        "</span>".repeat(depth)
    );
    let out = render_html(&html).unwrap();
    assert_eq!(out, "log:\n\n```\na  b\n```");
}
