//! Selector string grammar.
//!
//! A selector is a chain of parts separated by `>>`. Each part is either
//! `engine=body` or a bare body whose engine is inferred:
//!
//! | Bare form | Engine |
//! |-----------|--------|
//! | `"quoted"` or `'quoted'` | `text` |
//! | `//path`, `(//path)`, `..` | `xpath` |
//! | anything else | `css` |
//!
//! Composite engines (`internal:and`, `internal:or`, `internal:has`, ...)
//! carry a nested selector encoded as a JSON string, optionally followed by
//! a distance: `left-of="#anchor", 120`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Engines whose body is a nested selector.
pub const NESTED_SELECTOR_NAMES: &[&str] = &[
    "internal:has",
    "internal:has-not",
    "internal:and",
    "internal:or",
    "internal:chain",
    "left-of",
    "right-of",
    "above",
    "below",
    "near",
];

/// Nested engines that also accept a distance.
pub const NESTED_SELECTOR_NAMES_WITH_DISTANCE: &[&str] =
    &["left-of", "right-of", "above", "below", "near"];

/// Engine of the frame-crossing marker.
pub const FRAME_MARKER_ENGINE: &str = "internal:control";

/// Body of the frame-crossing marker.
pub const FRAME_MARKER_BODY: &str = "enter-frame";

static ENGINE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_0-9\-+:*]+$").expect("valid engine name regex"));

static XPATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(*//").expect("valid xpath regex"));

static TEXT_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*text\s*=(.*)$").expect("valid text prefix regex"));

// ============================================================================
// Types
// ============================================================================

/// A parsed selector: an ordered chain of parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedSelector {
    /// Parts, consumed left to right.
    pub parts: Vec<SelectorPart>,

    /// Index of the part marked with `*`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<usize>,
}

/// One step of a selector chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorPart {
    /// Engine name (`css`, `nth`, `internal:or`, ...).
    pub name: String,

    /// Engine input.
    pub body: PartBody,

    /// Body text as written in the selector.
    pub source: String,
}

/// Body of a selector part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartBody {
    /// Plain engine argument.
    Text(String),
    /// Nested selector of a composite engine.
    Nested(NestedSelector),
}

/// Nested selector carried by composite engines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedSelector {
    /// The inner selector.
    pub parsed: ParsedSelector,

    /// Optional distance for layout engines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Unparsed `name=body` pair produced by the splitter.
#[derive(Debug)]
struct RawPart {
    name: String,
    body: String,
}

// ============================================================================
// SelectorPart - Accessors
// ============================================================================

impl SelectorPart {
    /// Creates a part with a plain body.
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            name: name.into(),
            source: body.clone(),
            body: PartBody::Text(body),
        }
    }

    /// Returns the plain body, if this is not a composite part.
    #[inline]
    #[must_use]
    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text(body) => Some(body),
            PartBody::Nested(_) => None,
        }
    }

    /// Returns the nested selector, if this is a composite part.
    #[inline]
    #[must_use]
    pub fn nested(&self) -> Option<&NestedSelector> {
        match &self.body {
            PartBody::Nested(nested) => Some(nested),
            PartBody::Text(_) => None,
        }
    }

    /// Returns `true` for `internal:control=enter-frame`.
    #[inline]
    #[must_use]
    pub fn is_frame_marker(&self) -> bool {
        self.name == FRAME_MARKER_ENGINE && self.text_body() == Some(FRAME_MARKER_BODY)
    }

    /// Returns the index of an `nth` part.
    #[must_use]
    pub fn nth_index(&self) -> Option<i64> {
        if self.name != "nth" {
            return None;
        }
        self.text_body().and_then(|body| body.trim().parse().ok())
    }

    /// Returns `true` if both parts render identically.
    fn same_as(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a selector string into its parts.
///
/// # Errors
///
/// Returns [`Error::InvalidSelector`] on any grammar violation.
pub fn parse_selector(selector: &str) -> Result<ParsedSelector> {
    let (raw_parts, capture) = split_selector_string(selector)?;
    let mut parts: Vec<SelectorPart> = Vec::with_capacity(raw_parts.len());

    for raw in raw_parts {
        if raw.name == "css" || raw.name == "css:light" {
            let body = if raw.name == "css:light" {
                format!(":light({})", raw.body)
            } else {
                raw.body.clone()
            };
            if body.trim().is_empty() {
                return Err(Error::invalid_selector(format!(
                    "Empty css selector while parsing selector `{selector}`"
                )));
            }
            parts.push(SelectorPart {
                name: "css".to_string(),
                body: PartBody::Text(body.trim().to_string()),
                source: raw.body,
            });
            continue;
        }

        if NESTED_SELECTOR_NAMES.contains(&raw.name.as_str()) {
            let mut nested = parse_nested_body(&raw.name, &raw.body)?;
            strip_shared_frame_prefix(&mut nested.parsed, &parts);
            parts.push(SelectorPart {
                name: raw.name,
                source: raw.body,
                body: PartBody::Nested(nested),
            });
            continue;
        }

        if raw.name == "nth" && raw.body.trim().parse::<i64>().is_err() {
            return Err(Error::invalid_selector(format!(
                "Malformed selector: nth={}",
                raw.body
            )));
        }

        parts.push(SelectorPart {
            name: raw.name,
            source: raw.body.clone(),
            body: PartBody::Text(raw.body),
        });
    }

    match parts.first() {
        None => {
            return Err(Error::invalid_selector("Selector cannot be empty"));
        }
        Some(first) if NESTED_SELECTOR_NAMES.contains(&first.name.as_str()) => {
            return Err(Error::invalid_selector(format!(
                "\"{}\" selector cannot be first",
                first.name
            )));
        }
        Some(_) => {}
    }

    Ok(ParsedSelector { parts, capture })
}

/// Decodes `"inner"` or `"inner", distance` into a nested selector.
fn parse_nested_body(name: &str, body: &str) -> Result<NestedSelector> {
    let malformed = || Error::invalid_selector(format!("Malformed selector: {name}={body}"));

    let values: Vec<Value> =
        serde_json::from_str(&format!("[{body}]")).map_err(|_| malformed())?;
    if values.is_empty() || values.len() > 2 {
        return Err(malformed());
    }
    let inner = values[0].as_str().ok_or_else(malformed)?;

    let distance = match values.get(1) {
        None => None,
        Some(value) => {
            if !NESTED_SELECTOR_NAMES_WITH_DISTANCE.contains(&name) {
                return Err(malformed());
            }
            Some(value.as_f64().ok_or_else(malformed)?)
        }
    };

    Ok(NestedSelector {
        parsed: parse_selector(inner)?,
        distance,
    })
}

/// Drops a leading frame chain that the nested selector repeats from its parent.
fn strip_shared_frame_prefix(nested: &mut ParsedSelector, outer: &[SelectorPart]) {
    let Some(last_frame) = nested.parts.iter().rposition(SelectorPart::is_frame_marker) else {
        return;
    };
    let prefix_len = last_frame + 1;
    if outer.len() < prefix_len {
        return;
    }
    let shared = nested.parts[..prefix_len]
        .iter()
        .zip(&outer[..prefix_len])
        .all(|(a, b)| a.same_as(b));
    if shared {
        nested.parts.drain(..prefix_len);
        nested.capture = nested.capture.and_then(|c| c.checked_sub(prefix_len));
    }
}

/// Splits a selector string at top-level `>>` separators.
fn split_selector_string(selector: &str) -> Result<(Vec<RawPart>, Option<usize>)> {
    let bytes = selector.as_bytes();
    let mut parts = Vec::new();
    let mut capture = None;

    let mut append = |start: usize, end: usize| -> Result<()> {
        let (name, body) = classify_part(selector[start..end].trim());
        let (name, captured) = match name.strip_prefix('*') {
            Some(stripped) => (stripped.to_string(), true),
            None => (name, false),
        };
        parts.push(RawPart { name, body });
        if captured {
            if capture.is_some() {
                return Err(Error::invalid_selector(
                    "Only one of the selectors can capture using * modifier",
                ));
            }
            capture = Some(parts.len() - 1);
        }
        Ok(())
    };

    if !selector.contains(">>") {
        append(0, selector.len())?;
        return Ok((parts, capture));
    }

    let ignore_text_quote = |start: usize, index: usize| {
        TEXT_PREFIX_RE
            .captures(&selector[start..index])
            .and_then(|caps| caps.get(1))
            .is_some_and(|m| !m.as_str().is_empty())
    };

    let mut index = 0;
    let mut start = 0;
    let mut quote: Option<u8> = None;
    while index < bytes.len() {
        let c = bytes[index];
        if c == b'\\' && index + 1 < bytes.len() {
            index += 2;
        } else if Some(c) == quote {
            quote = None;
            index += 1;
        } else if quote.is_none()
            && matches!(c, b'"' | b'\'' | b'`')
            && !ignore_text_quote(start, index)
        {
            quote = Some(c);
            index += 1;
        } else if quote.is_none() && c == b'>' && bytes.get(index + 1) == Some(&b'>') {
            append(start, index)?;
            index += 2;
            start = index;
        } else {
            index += 1;
        }
    }
    append(start, bytes.len())?;

    Ok((parts, capture))
}

/// Infers engine name and body of one trimmed part.
fn classify_part(part: &str) -> (String, String) {
    if let Some(eq) = part.find('=') {
        let name = part[..eq].trim();
        if ENGINE_NAME_RE.is_match(name) {
            return (name.to_string(), part[eq + 1..].to_string());
        }
    }

    let quoted = |q: char| part.len() > 1 && part.starts_with(q) && part.ends_with(q);
    if quoted('"') || quoted('\'') {
        return ("text".to_string(), part.to_string());
    }
    if XPATH_RE.is_match(part) || part.starts_with("..") {
        return ("xpath".to_string(), part.to_string());
    }
    ("css".to_string(), part.to_string())
}

// ============================================================================
// Stringification
// ============================================================================

/// Renders a parsed selector back to text.
///
/// `css` parts and `//`-style `xpath` parts omit their engine prefix unless
/// they are the capture part.
#[must_use]
pub fn stringify_selector(selector: &ParsedSelector) -> String {
    selector
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let captured = selector.capture == Some(i);
            let implicit_engine = !captured
                && (part.name == "css"
                    || (part.name == "xpath"
                        && (part.source.starts_with("//") || part.source.starts_with(".."))));
            let mut out = String::new();
            if captured {
                out.push('*');
            }
            if !implicit_engine {
                out.push_str(&part.name);
                out.push('=');
            }
            out.push_str(&part.source);
            out
        })
        .collect::<Vec<_>>()
        .join(" >> ")
}

// ============================================================================
// Tests
// ============================================================================
