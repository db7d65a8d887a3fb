//! Splitting selectors at frame boundaries.
//!
//! `internal:control=enter-frame` separates the selector into chunks, one
//! per frame. Every chunk but the last must resolve to an `<iframe>` or
//! `<frame>` element.

use crate::error::{Error, Result};

use super::parser::{ParsedSelector, SelectorPart, parse_selector};

// ============================================================================
// Visiting
// ============================================================================

/// Visits every part of a selector, descending into nested bodies.
///
/// The visitor receives `nested == true` for parts inside a composite
/// engine's body.
pub fn visit_all_parts<'a, F>(selector: &'a ParsedSelector, mut visitor: F) -> Result<()>
where
    F: FnMut(&'a SelectorPart, bool) -> Result<()>,
{
    fn visit<'a, F>(selector: &'a ParsedSelector, nested: bool, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&'a SelectorPart, bool) -> Result<()>,
    {
        for part in &selector.parts {
            visitor(part, nested)?;
            if let Some(inner) = part.nested() {
                visit(&inner.parsed, true, visitor)?;
            }
        }
        Ok(())
    }

    visit(selector, false, &mut visitor)
}

// ============================================================================
// Splitting
// ============================================================================

/// Parses a selector and splits it into per-frame chunks.
///
/// # Errors
///
/// - [`Error::InvalidSelector`] on grammar violations, a leading or trailing
///   frame marker, or a capture before the last frame
pub fn split_selector_by_frame(selector: &str) -> Result<Vec<ParsedSelector>> {
    let parsed = parse_selector(selector)?;
    let mut chunks = Vec::new();
    let mut chunk = ParsedSelector::default();
    let mut captured_chunk = None;

    for (i, part) in parsed.parts.into_iter().enumerate() {
        if part.is_frame_marker() {
            if chunk.parts.is_empty() {
                return Err(Error::invalid_selector(
                    "Selector cannot start with entering frame, select the iframe first",
                ));
            }
            chunks.push(std::mem::take(&mut chunk));
            continue;
        }
        if parsed.capture == Some(i) {
            chunk.capture = Some(chunk.parts.len());
            captured_chunk = Some(chunks.len());
        }
        chunk.parts.push(part);
    }

    if chunk.parts.is_empty() {
        return Err(Error::invalid_selector(format!(
            "Selector cannot end with entering frame, while parsing selector {selector}"
        )));
    }
    chunks.push(chunk);

    if captured_chunk.is_some_and(|index| index + 1 != chunks.len()) {
        return Err(Error::invalid_selector(
            "Can not capture the selector before diving into the frame. Only use * after the last frame has been selected",
        ));
    }

    Ok(chunks)
}

/// Rejects frame markers nested inside composite engines.
///
/// Runs before any remote command so misuse fails fast.
///
/// # Errors
///
/// Returns [`Error::InvalidFrameUsage`] naming `original`.
pub fn ensure_no_nested_frames(chunks: &[ParsedSelector], original: &str) -> Result<()> {
    for chunk in chunks {
        visit_all_parts(chunk, |part, nested| {
            if nested && part.is_frame_marker() {
                return Err(Error::invalid_frame_usage(original));
            }
            Ok(())
        })?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
