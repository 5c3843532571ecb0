use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::Builder;

// Including the sanitizer to avoid malicious markup in user-submitted post
// bodies and comments. Helps prevent XSS (Cross-Site Scripting).
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "i", "strong", "em", "p", "ul", "ol", "li", "br", "span", "div", "blockquote",
    "code", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "table", "tr", "td", "tbody", "th", "img",
];

const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title"]),
    ("img", &["src", "alt", "width", "height"]),
    ("table", &["border", "cellpadding", "cellspacing", "style"]),
    ("td", &["style"]),
    ("tr", &["style"]),
    ("th", &["style"]),
    ("div", &["class"]),
    ("span", &["class"]),
];

// Schemes permitted in href/src values. Anything else (javascript:, data:,
// vbscript:) loses the attribute entirely.
const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

static CLEANER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
    let tag_attributes: HashMap<&str, HashSet<&str>> = ALLOWED_ATTRIBUTES
        .iter()
        .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
        .collect();
    let url_schemes: HashSet<&str> = ALLOWED_URL_SCHEMES.iter().copied().collect();

    let mut builder = Builder::default();
    builder
        .tags(tags)
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(url_schemes)
        // No injected rel attribute: the output must stay inside the
        // attribute allow-list above.
        .link_rel(None);
    builder
});

/// Filters author-submitted rich text down to the allow-listed tag and
/// attribute subset above.
///
/// Total and idempotent: unrecognized tags are unwrapped (their text content
/// survives), unrecognized attributes are dropped, and script/style elements
/// are removed together with their contents. Called exactly once per write
/// path; stored content is the canonical clean form and is never
/// re-sanitized on read.
pub fn sanitize(raw: &str) -> String {
    CLEANER.clean(raw).to_string()
}
