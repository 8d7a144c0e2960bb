//! # Scoped stylesheet rewriting.
//!
//! Prefixes every selector of the `<style>` blocks embedded in a template with an
//! attribute selector keyed by app name, so an app's rules only match inside its
//! wrapper element:
//!
//! ```text
//! .title, body .nav { … }        ──►  div[data-microvisor="react"] .title,
//!                                     div[data-microvisor="react"] .nav { … }
//! @media (max-width: 600px) { … } ──►  rules inside are rewritten recursively
//! @keyframes spin { … }           ──►  untouched
//! ```
//!
//! `html`, `body` and `:root` map to the wrapper itself.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Attribute carrying the app name on the wrapper when scoped CSS is on.
pub const SCOPE_ATTR: &str = "data-microvisor";

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<style[^>]*>)(.*?)(</style>)").expect("Invalid style block regex")
});

static ROOT_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(html|body|:root)(\s+|$)").expect("Invalid root selector regex")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid comment regex"));

/// Selector prefix for `app_name`.
pub fn scope_prefix(app_name: &str) -> String {
    format!("div[{SCOPE_ATTR}=\"{app_name}\"]")
}

/// Rewrites every embedded `<style>` block of `template`.
pub fn scope_template_styles(template: &str, app_name: &str) -> String {
    let prefix = scope_prefix(app_name);
    STYLE_BLOCK
        .replace_all(template, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], scope_css(&caps[2], &prefix), &caps[3])
        })
        .into_owned()
}

/// Rewrites a stylesheet so every rule is scoped under `prefix`.
pub fn scope_css(css: &str, prefix: &str) -> String {
    let css = COMMENT.replace_all(css, "");
    let mut out = String::with_capacity(css.len() + 64);
    let mut rest: &str = &css;

    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let open = trimmed.find('{');
        let semi = trimmed.find(';');

        // Statement at-rules (`@import ...;`) carry no block.
        if let Some(semi) = semi.filter(|s| open.is_none_or(|o| *s < o)) {
            out.push_str(trimmed[..=semi].trim());
            out.push('\n');
            rest = &trimmed[semi + 1..];
            continue;
        }
        let Some(open) = open else {
            out.push_str(trimmed);
            break;
        };
        let close = matching_brace(trimmed, open).unwrap_or(trimmed.len());
        let prelude = trimmed[..open].trim();
        let body = &trimmed[open + 1..close.min(trimmed.len())];

        let lower = prelude.to_ascii_lowercase();
        if lower.starts_with("@media") || lower.starts_with("@supports") {
            out.push_str(&format!("{prelude} {{\n{}}}\n", scope_css(body, prefix)));
        } else if prelude.starts_with('@') {
            out.push_str(&format!("{prelude} {{{body}}}\n"));
        } else {
            let selectors: Vec<String> = prelude
                .split(',')
                .map(|sel| scope_selector(sel.trim(), prefix))
                .collect();
            out.push_str(&format!("{} {{{}}}\n", selectors.join(", "), body));
        }

        rest = trimmed.get(close + 1..).unwrap_or("");
    }
    out
}

fn scope_selector(selector: &str, prefix: &str) -> String {
    if selector.is_empty() {
        return prefix.to_string();
    }
    if ROOT_SELECTOR.is_match(selector) {
        let tail = ROOT_SELECTOR.replace(selector, "");
        let tail = tail.trim();
        return if tail.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix} {tail}")
        };
    }
    format!("{prefix} {selector}")
}

fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: &str = "div[data-microvisor=\"react\"]";

    #[test]
    fn plain_rules_are_prefixed() {
        let out = scope_css(".title, p > a { color: red; }", P);
        assert_eq!(out, format!("{P} .title, {P} p > a {{ color: red; }}\n"));
    }

    #[test]
    fn root_selectors_map_to_the_wrapper() {
        let out = scope_css("body { margin: 0 } html .nav { x: y } :root{--c: 1}", P);
        assert!(out.contains(&format!("{P} {{ margin: 0 }}")));
        assert!(out.contains(&format!("{P} .nav {{ x: y }}")));
        assert!(out.contains(&format!("{P} {{--c: 1}}")));
    }

    #[test]
    fn conditional_groups_recurse_and_keyframes_do_not() {
        let css = "@media (max-width: 600px) { .a { b: c } } @keyframes spin { from { x: 0 } }";
        let out = scope_css(css, P);
        assert!(out.contains(&format!("@media (max-width: 600px) {{\n{P} .a {{ b: c }}")));
        assert!(out.contains("@keyframes spin { from { x: 0 } }"));
    }

    #[test]
    fn statements_and_comments() {
        let out = scope_css("/* hi */ @import url(a.css); .x{y:z}", P);
        assert_eq!(out, format!("@import url(a.css);\n{P} .x {{y:z}}\n"));
    }

    #[test]
    fn template_blocks_are_rewritten_in_place() {
        let tpl = "<div><style type=\"text/css\">.t{c:d}</style><p>hi</p></div>";
        let out = scope_template_styles(tpl, "react");
        assert_eq!(
            out,
            format!("<div><style type=\"text/css\">{P} .t {{c:d}}\n</style><p>hi</p></div>")
        );
    }
}
