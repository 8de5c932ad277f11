//! Snippet extraction from converted HTML.
//!
//! Every rendered element becomes one [`Snippet`], in document order
//! (parents before children), carrying its full descendant text. Style is
//! computed the way a browser would for the subset of CSS the converters
//! emit:
//!
//! * inheritance from the parent element (root: 16px, normal weight),
//! * user-agent defaults for headings, `b`/`strong`/`th`, `small`/`big`,
//! * simple `<style>` rules (`tag`, `.class`, `tag.class`), ordered by
//!   specificity then source order,
//! * the inline `style` attribute last.
//!
//! At-rule blocks (`@media`, `@font-face`, ...) are dropped whole, so print
//! and other conditional styles never apply. The tree is walked with an
//! explicit stack, so nesting depth is bounded by memory only.
//!
//! Font sizes are truncated to whole pixels; an element counts as bold when
//! its computed weight is one of [`BOLD_WEIGHTS`].

use crate::title::Snippet;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Computed font weights that count as bold.
pub const BOLD_WEIGHTS: &[&str] = &["bold", "bolder", "600", "700", "800", "900"];

/// Elements that are never rendered and never yield snippets.
const NOT_RENDERED: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "noscript", "template",
];

const ROOT_FONT_SIZE: f32 = 16.0;

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").unwrap());
static RE_SIMPLE_SELECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9]*)?((?:\.[A-Za-z0-9_-]+)*)$").unwrap());

/// Extract styled text snippets from an HTML document.
pub fn extract_snippets(html: &str) -> Vec<Snippet> {
    let doc = Html::parse_document(html);
    let sheet = StyleSheet::from_document(&doc);

    let elements = rendered_elements(&doc, &sheet);
    let texts = rendered_texts(&elements);

    elements
        .into_iter()
        .zip(texts)
        .map(|(r, text)| Snippet {
            bold: BOLD_WEIGHTS.contains(&r.style.weight.as_str()),
            size: r.style.size_px.max(0.0).floor() as u32,
            text: collapse_whitespace(&text),
            tag: r.tag,
        })
        .collect()
}

/// A rendered element with its computed style.
struct Rendered<'a> {
    el: ElementRef<'a>,
    tag: String,
    style: Computed,
}

#[derive(Debug, Clone)]
struct Computed {
    size_px: f32,
    weight: String,
}

impl Computed {
    fn root() -> Self {
        Self {
            size_px: ROOT_FONT_SIZE,
            weight: "normal".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Declarations {
    font_size: Option<String>,
    font_weight: Option<String>,
}

impl Declarations {
    fn parse(block: &str) -> Self {
        let mut decls = Self::default();
        for decl in block.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let value = value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_lowercase();
            if value.is_empty() {
                continue;
            }
            match prop.trim().to_lowercase().as_str() {
                "font-size" => decls.font_size = Some(value),
                "font-weight" => decls.font_weight = Some(value),
                _ => {}
            }
        }
        decls
    }
}

#[derive(Debug)]
struct Rule {
    tag: Option<String>,
    classes: Vec<String>,
    decls: Declarations,
}

impl Rule {
    fn specificity(&self) -> usize {
        self.classes.len() * 10 + usize::from(self.tag.is_some())
    }

    fn matches(&self, tag: &str, classes: &[&str]) -> bool {
        self.tag.as_deref().is_none_or(|t| t == tag)
            && self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }
}

/// The simple selector rules of every `<style>` element, in source order.
#[derive(Debug, Default)]
struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    fn from_document(doc: &Html) -> Self {
        let mut sheet = Self::default();
        for node in doc.root_element().descendants() {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            if el.value().name() == "style" {
                sheet.add_css(&el.text().collect::<String>());
            }
        }
        sheet
    }

    fn add_css(&mut self, css: &str) {
        let css = strip_at_rules(&RE_COMMENT.replace_all(css, ""));
        for cap in RE_RULE.captures_iter(&css) {
            let decls = Declarations::parse(&cap[2]);
            if decls.font_size.is_none() && decls.font_weight.is_none() {
                continue;
            }
            for selector in cap[1].split(',') {
                let selector = selector.trim();
                let Some(parts) = RE_SIMPLE_SELECTOR.captures(selector) else {
                    continue;
                };
                let tag = parts.get(1).map(|m| m.as_str().to_lowercase());
                let classes: Vec<String> = parts[2]
                    .split('.')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
                if tag.is_none() && classes.is_empty() {
                    continue;
                }
                self.rules.push(Rule {
                    tag,
                    classes,
                    decls: decls.clone(),
                });
            }
        }
    }

    /// Matching rules, lowest precedence first.
    fn matching<'a>(&'a self, tag: &str, classes: &[&str]) -> Vec<&'a Rule> {
        let mut matched: Vec<(usize, usize, &Rule)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(tag, classes))
            .map(|(i, r)| (r.specificity(), i, r))
            .collect();
        matched.sort_by_key(|&(spec, order, _)| (spec, order));
        matched.into_iter().map(|(_, _, r)| r).collect()
    }
}

/// Drop every top-level at-rule: `@name ...;` statements and `@name ... { ... }`
/// blocks including their nested rules.
fn strip_at_rules(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '@' if depth == 0 => {
                let mut nested = 0usize;
                for c in chars.by_ref() {
                    match c {
                        ';' if nested == 0 => break,
                        '{' => nested += 1,
                        '}' => {
                            nested = nested.saturating_sub(1);
                            if nested == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            '{' => {
                depth += 1;
                out.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Rendered elements in document order, parents before children.
fn rendered_elements<'a>(doc: &'a Html, sheet: &StyleSheet) -> Vec<Rendered<'a>> {
    let mut out = Vec::new();
    let mut stack = vec![(doc.root_element(), Computed::root())];

    while let Some((el, parent)) = stack.pop() {
        let tag = el.value().name().to_lowercase();
        if NOT_RENDERED.contains(&tag.as_str()) {
            continue;
        }
        let style = compute_style(el, &tag, &parent, sheet);

        let children: Vec<_> = el.children().filter_map(ElementRef::wrap).collect();
        for child in children.into_iter().rev() {
            stack.push((child, style.clone()));
        }
        out.push(Rendered { el, tag, style });
    }
    out
}
fn compute_style(el: ElementRef<'_>, tag: &str, parent: &Computed, sheet: &StyleSheet) -> Computed {
    let mut size = parent.size_px;
    let mut weight = parent.weight.clone();

    if let Some(default_size) = ua_font_size(tag) {
        size = resolve_font_size(default_size, parent.size_px).unwrap_or(size);
    }
    if matches!(tag, "b" | "strong" | "th" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
        weight = "bold".to_string();
    }

    let classes: Vec<&str> = el.value().classes().collect();
    let inline = el.value().attr("style").map(Declarations::parse);
    let layers = sheet
        .matching(tag, &classes)
        .into_iter()
        .map(|r| &r.decls)
        .chain(inline.as_ref());

    for decls in layers {
        if let Some(v) = &decls.font_size {
            size = resolve_font_size(v, parent.size_px).unwrap_or(size);
        }
        if let Some(v) = &decls.font_weight {
            weight = resolve_font_weight(v, &parent.weight);
        }
    }

    Computed {
        size_px: size,
        weight,
    }
}

fn ua_font_size(tag: &str) -> Option<&'static str> {
    Some(match tag {
        "h1" => "2em",
        "h2" => "1.5em",
        "h3" => "1.17em",
        "h4" => "1em",
        "h5" => "0.83em",
        "h6" => "0.67em",
        "small" | "sub" | "sup" => "smaller",
        "big" => "larger",
        _ => return None,
    })
}

/// Resolve a CSS `font-size` value to pixels.
fn resolve_font_size(value: &str, parent_px: f32) -> Option<f32> {
    let value = value.trim();
    let number = |unit: &str| value.strip_suffix(unit)?.trim().parse::<f32>().ok();

    let px = match value {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        "xxx-large" => 48.0,
        "smaller" => parent_px / 1.2,
        "larger" => parent_px * 1.2,
        _ => {
            if let Some(n) = number("px") {
                n
            } else if let Some(n) = number("pt") {
                n * 4.0 / 3.0
            } else if let Some(n) = number("rem") {
                n * ROOT_FONT_SIZE
            } else if let Some(n) = number("em") {
                n * parent_px
            } else if let Some(n) = number("%") {
                n * parent_px / 100.0
            } else {
                return None;
            }
        }
    };
    (px.is_finite() && px >= 0.0).then_some(px)
}

/// Resolve a CSS `font-weight` value to the string a browser reports.
fn resolve_font_weight(value: &str, parent: &str) -> String {
    match value.trim() {
        "lighter" => "normal".to_string(),
        "bolder" => {
            if BOLD_WEIGHTS.contains(&parent) {
                "900".to_string()
            } else {
                "bold".to_string()
            }
        }
        "400" => "normal".to_string(),
        "700" => "bold".to_string(),
        other => other.to_string(),
    }
}

/// Descendant text of each element, skipping elements that are not rendered.
///
/// Children follow their parent in `elements`, so walking it backwards
/// finishes every child before its parent.
fn rendered_texts(elements: &[Rendered<'_>]) -> Vec<String> {
    let index: HashMap<_, usize> = elements
        .iter()
        .enumerate()
        .map(|(i, r)| (r.el.id(), i))
        .collect();
    let mut texts = vec![String::new(); elements.len()];

    for i in (0..elements.len()).rev() {
        let mut text = String::new();
        for child in elements[i].el.children() {
            if let Some(t) = child.value().as_text() {
                text.push_str(t);
            } else if let Some(&j) = index.get(&child.id()) {
                text.push_str(&texts[j]);
            }
        }
        texts[i] = text;
    }
    texts
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(snippets: &'a [Snippet], text: &str) -> &'a Snippet {
        snippets
            .iter()
            .rev()
            .find(|s| s.text == text)
            .unwrap_or_else(|| panic!("no snippet with text {text:?} in {snippets:#?}"))
    }

    #[test]
    fn document_order_with_descendant_text() {
        let snippets = extract_snippets(
            "<html><body><div><h1>Big Title</h1><p>Body   text\n here</p></div></body></html>",
        );
        let tags: Vec<_> = snippets.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["html", "body", "div", "h1", "p"]);
        // Adjacent blocks concatenate without a separator, as textContent does.
        assert_eq!(snippets[2].text, "Big TitleBody text here");
        assert_eq!(snippets[4].text, "Body text here");
    }

    #[test]
    fn heading_defaults() {
        let snippets = extract_snippets("<h1>Main Heading</h1><h3>Sub Heading</h3><p>plain text</p>");
        let h1 = find(&snippets, "Main Heading");
        assert_eq!((h1.size, h1.bold), (32, true));
        let h3 = find(&snippets, "Sub Heading");
        assert_eq!((h3.size, h3.bold), (18, true));
        let p = find(&snippets, "plain text");
        assert_eq!((p.size, p.bold), (16, false));
    }

    #[test]
    fn class_rules_and_inline_style() {
        let html = r#"<html><head><style>
            /* generated */
            .fs0{font-size:40px;} .fs1{font-size:12px}
            .ff1 { font-weight: 700 }
            p.lead { font-size: 150% }
        </style></head><body>
            <div class="fs0 ff1">Generated Big Title</div>
            <div class="fs1">small print here</div>
            <p class="lead">lead paragraph text</p>
            <span style="font-size: 12pt; font-weight: 600">inline styled text</span>
        </body></html>"#;
        let snippets = extract_snippets(html);

        let title = find(&snippets, "Generated Big Title");
        assert_eq!((title.size, title.bold), (40, true));
        assert_eq!(find(&snippets, "small print here").size, 12);
        assert_eq!(find(&snippets, "lead paragraph text").size, 24);

        let inline = find(&snippets, "inline styled text");
        assert_eq!((inline.size, inline.bold), (16, true));
    }

    #[test]
    fn sizes_inherit_and_scale() {
        let snippets = extract_snippets(
            r#"<div style="font-size:20px"><span style="font-size:1.5em">scaled span text</span><em>inherited em text</em></div>"#,
        );
        assert_eq!(find(&snippets, "scaled span text").size, 30);
        assert_eq!(find(&snippets, "inherited em text").size, 20);
    }

    #[test]
    fn fractional_sizes_truncate() {
        let snippets = extract_snippets(r#"<p style="font-size: 18.9px">almost nineteen px</p>"#);
        assert_eq!(find(&snippets, "almost nineteen px").size, 18);
    }

    #[test]
    fn scripts_and_head_are_skipped() {
        let snippets = extract_snippets(
            "<html><head><title>Doc Name</title></head><body><script>var x = 1;</script><p>visible text</p></body></html>",
        );
        assert!(snippets.iter().all(|s| s.tag != "title" && s.tag != "script" && s.tag != "head"));
        assert_eq!(find(&snippets, "visible text").tag, "p");
        let body = snippets.iter().find(|s| s.tag == "body").unwrap();
        assert_eq!(body.text, "visible text");
    }

    #[test]
    fn weight_keywords() {
        assert_eq!(resolve_font_weight("bolder", "normal"), "bold");
        assert_eq!(resolve_font_weight("bolder", "bold"), "900");
        assert_eq!(resolve_font_weight("lighter", "bold"), "normal");
        assert_eq!(resolve_font_weight("400", "bold"), "normal");
        assert_eq!(resolve_font_weight("800", "normal"), "800");
    }

    #[test]
    fn size_units() {
        assert_eq!(resolve_font_size("24px", 16.0), Some(24.0));
        assert_eq!(resolve_font_size("12pt", 16.0), Some(16.0));
        assert_eq!(resolve_font_size("2rem", 10.0), Some(32.0));
        assert_eq!(resolve_font_size("50%", 20.0), Some(10.0));
        assert_eq!(resolve_font_size("x-large", 10.0), Some(24.0));
        assert_eq!(resolve_font_size("huge", 10.0), None);
        assert_eq!(resolve_font_size("-3px", 10.0), None);
    }

    #[test]
    fn complex_selectors_are_ignored() {
        let snippets = extract_snippets(
            "<style>div p { font-size: 50px } #x { font-size: 60px }</style><div><p id=\"x\">nested para text</p></div>",
        );
        assert_eq!(find(&snippets, "nested para text").size, 16);
    }

    #[test]
    fn media_print_rules_do_not_override_screen() {
        let html = r#"<style>.fs0{font-size:20px;} @media print{.fs0{font-size:60pt;}}</style>
            <div class="fs0">Screen Sized Title</div>"#;
        assert_eq!(find(&extract_snippets(html), "Screen Sized Title").size, 20);
    }

    #[test]
    fn at_rules_are_dropped_whole() {
        let css = "@import url(x.css); .a{font-size:10px} @font-face{font-family:F} \
                   @media screen{.b{font-size:1px} .c{font-size:2px}} .d{font-weight:bold}";
        assert_eq!(
            strip_at_rules(css).split_whitespace().collect::<String>(),
            ".a{font-size:10px}.d{font-weight:bold}"
        );
    }

    #[test]
    fn deeply_nested_markup_is_walked() {
        let depth = 10_000;
        let html = format!(
            "<html><body>{}Deep Nested Title{}</body></html>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let snippets = extract_snippets(&html);

        assert_eq!(snippets.len(), depth + 2);
        assert!(snippets.iter().all(|s| s.text == "Deep Nested Title"));
        assert_eq!(snippets.last().map(|s| s.tag.as_str()), Some("div"));
    }
}
