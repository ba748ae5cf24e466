//! Structural fragment extraction from fetched markup.
//!
//! Markup is parsed with HTML5 error recovery, so truncated or garbled
//! documents still yield a tree. A query is a comma-separated union of
//! branches; each branch is either a CSS selector or
//! `ANCHOR following:: TARGET`, which selects every `TARGET` element that
//! starts after some `ANCHOR` element has ended (document order, not
//! siblings only). Matches of the union are emitted once each, in document
//! order, each followed by `\n`.
//!
//! A query that fails to parse or matches nothing yields `None`, as does a
//! missing query.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::config::ExtractMode;

/// Axis keyword separating the anchor and target of a branch.
const FOLLOWING_AXIS: &str = "following::";

const MIN_PRE_CHARS: usize = 30;
const MIN_INLINE_CODE_CHARS: usize = 50;

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());
static ANNOTATED_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//.*?\[.*?\].*?\n").unwrap());

enum Branch {
    Plain(Selector),
    Following { anchor: Selector, target: Selector },
}

/// A parsed selector query.
pub struct Query {
    branches: Vec<Branch>,
}

impl Query {
    /// Parse `expr`; `None` when it is blank or any branch is malformed.
    pub fn parse(expr: &str) -> Option<Self> {
        if expr.trim().is_empty() {
            return None;
        }

        let mut branches = Vec::new();
        for branch in split_top_level(expr) {
            let branch = match branch.split_once(FOLLOWING_AXIS) {
                Some((anchor, target)) => Branch::Following {
                    anchor: parse_selector(anchor)?,
                    target: parse_selector(target)?,
                },
                None => Branch::Plain(parse_selector(branch)?),
            };
            branches.push(branch);
        }
        Some(Self { branches })
    }
}

fn parse_selector(expr: &str) -> Option<Selector> {
    let expr = expr.trim();
    if expr.is_empty() {
        debug!("empty selector branch");
        return None;
    }
    match Selector::parse(expr) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!(selector = expr, error = %e, "selector failed to parse");
            None
        }
    }
}

/// Split on commas outside brackets, parentheses and quotes.
fn split_top_level(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

/// A fetched document parsed once and queried per selector.
pub struct ParsedDocument {
    html: Html,
}

impl ParsedDocument {
    /// Parse raw bytes. Invalid UTF-8 sequences are replaced, never fatal.
    pub fn parse(raw: &[u8]) -> Self {
        let markup = String::from_utf8_lossy(raw);
        Self {
            html: Html::parse_document(&markup),
        }
    }

    pub fn extract(&self, selector: Option<&str>, mode: ExtractMode) -> Option<String> {
        let query = Query::parse(selector?)?;
        let matched = self.select(&query);
        if matched.is_empty() {
            return None;
        }

        match mode {
            ExtractMode::Markup => Some(join_fragments(matched.iter().map(|el| el.html()))),
            ExtractMode::Text => Some(join_fragments(
                matched.iter().map(|el| el.text().collect::<String>()),
            )),
            ExtractMode::Code => code_blocks(&matched),
        }
    }

    /// Elements matched by any branch of `query`, in document order.
    fn select(&self, query: &Query) -> Vec<ElementRef<'_>> {
        let elements: Vec<ElementRef<'_>> = self
            .html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        let mut hit = vec![false; elements.len()];

        for branch in &query.branches {
            match branch {
                Branch::Plain(selector) => {
                    for (i, el) in elements.iter().enumerate() {
                        hit[i] |= selector.matches(el);
                    }
                }
                Branch::Following { anchor, target } => {
                    // Elements are in pre-order, so a subtree is a contiguous run.
                    let first_end = elements
                        .iter()
                        .enumerate()
                        .filter(|(_, el)| anchor.matches(el))
                        .map(|(i, el)| i + subtree_size(el) - 1)
                        .min();
                    let Some(end) = first_end else { continue };
                    for (i, el) in elements.iter().enumerate().skip(end + 1) {
                        hit[i] |= target.matches(el);
                    }
                }
            }
        }

        elements
            .into_iter()
            .zip(hit)
            .filter_map(|(el, hit)| hit.then_some(el))
            .collect()
    }
}

fn subtree_size(el: &ElementRef<'_>) -> usize {
    el.descendants().filter_map(ElementRef::wrap).count()
}

fn join_fragments(fragments: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    for fragment in fragments {
        out.push_str(&fragment);
        out.push('\n');
    }
    out
}

/// Source-code blocks inside the matched regions, separated by a blank line.
///
/// `<pre>` blocks come first, then `<code>` elements outside any `<pre>`.
/// Each kind must be long enough and carry a marker of C or assembly source.
fn code_blocks(scopes: &[ElementRef<'_>]) -> Option<String> {
    let mut seen = Vec::new();
    let mut pre = Vec::new();
    let mut inline = Vec::new();

    for scope in scopes {
        for el in scope.descendants().filter_map(ElementRef::wrap) {
            if seen.contains(&el.id()) {
                continue;
            }
            seen.push(el.id());

            match el.value().name() {
                "pre" => {
                    let code: String = el.text().collect();
                    if code.chars().count() > MIN_PRE_CHARS && looks_like_block(&code) {
                        pre.push(clean_code(&code));
                    }
                }
                "code" if !inside_pre(&el) => {
                    let code: String = el.text().collect();
                    if code.chars().count() > MIN_INLINE_CODE_CHARS && looks_like_inline(&code) {
                        inline.push(clean_code(&code));
                    }
                }
                _ => {}
            }
        }
    }

    let blocks: Vec<String> = pre
        .into_iter()
        .chain(inline)
        .filter(|b| !b.is_empty())
        .collect();
    if blocks.is_empty() {
        return None;
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    Some(out)
}

fn inside_pre(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "pre")
}

fn looks_like_block(code: &str) -> bool {
    code.contains('{') || code.to_lowercase().contains("asm") || code.contains("__attribute__")
}

fn looks_like_inline(code: &str) -> bool {
    code.contains("void") || code.contains("uint") || code.to_lowercase().contains("asm")
}

/// Drop `[n]` citation marks and `//` comments carrying bracketed notes.
pub fn clean_code(code: &str) -> String {
    let code = CITATION_RE.replace_all(code, "");
    let code = ANNOTATED_COMMENT_RE.replace_all(&code, "\n");
    code.trim().to_string()
}

/// Parse `raw` and apply a single selector.
pub fn extract(raw: &[u8], selector: Option<&str>, mode: ExtractMode) -> Option<String> {
    selector?;
    ParsedDocument::parse(raw).extract(selector, mode)
}
