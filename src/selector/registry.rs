//! Selector engine registry.
//!
//! Validates engine names and decides which execution world a selector must
//! run in. Selectors that only use content-script engines run in the
//! isolated utility world; anything touching page globals (`_react`,
//! `_vue`, custom engines without content-script support) needs the main
//! world.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::World;

use super::frames::visit_all_parts;
use super::parser::{ParsedSelector, parse_selector, stringify_selector};

// ============================================================================
// Constants
// ============================================================================

/// Engines understood by the injected script.
const BUILTIN_ENGINES: &[&str] = &[
    "css",
    "css:light",
    "xpath",
    "xpath:light",
    "_react",
    "_vue",
    "text",
    "text:light",
    "id",
    "id:light",
    "data-testid",
    "data-testid:light",
    "data-test-id",
    "data-test-id:light",
    "data-test",
    "data-test:light",
    "nth",
    "visible",
    "internal:control",
    "internal:has",
    "internal:has-not",
    "internal:has-text",
    "internal:has-not-text",
    "internal:and",
    "internal:or",
    "internal:chain",
    "left-of",
    "right-of",
    "above",
    "below",
    "near",
    "internal:label",
    "internal:text",
    "internal:role",
    "internal:testid",
    "internal:attr",
    "internal:describe",
    "aria-ref",
];

/// Built-in engines that must run in the main world.
const MAIN_WORLD_ENGINES: &[&str] = &["_react", "_vue"];

static CUSTOM_ENGINE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_0-9\-]+$").expect("valid custom engine regex"));

// ============================================================================
// Types
// ============================================================================

/// A parsed selector ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorInfo {
    /// The parsed selector.
    pub parsed: ParsedSelector,
    /// World the selector must be evaluated in.
    pub world: World,
    /// Fail when more than one element matches.
    pub strict: bool,
}

/// A registered custom engine.
#[derive(Debug, Clone, Copy)]
struct CustomEngine {
    /// Engine can run as a content script (utility world).
    content_script: bool,
}

/// Registry of known selector engines.
#[derive(Debug, Default)]
pub struct SelectorRegistry {
    custom: RwLock<FxHashMap<String, CustomEngine>>,
}

// ============================================================================
// SelectorRegistry
// ============================================================================

impl SelectorRegistry {
    /// Creates a registry with only built-in engines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom engine.
    ///
    /// # Arguments
    ///
    /// * `name` - Engine name used as `name=body` in selectors
    /// * `content_script` - Whether the engine can run in the utility world
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid, built-in or duplicate names.
    pub fn register(&self, name: &str, content_script: bool) -> Result<()> {
        if !CUSTOM_ENGINE_NAME_RE.is_match(name) {
            return Err(Error::config(
                "Selector engine name may only contain [a-zA-Z0-9_-] characters",
            ));
        }
        if BUILTIN_ENGINES.contains(&name) {
            return Err(Error::config(format!(
                "\"{name}\" is a predefined selector engine"
            )));
        }

        let mut custom = self.custom.write();
        if custom.contains_key(name) {
            return Err(Error::config(format!(
                "\"{name}\" selector engine has been already registered"
            )));
        }
        custom.insert(name.to_string(), CustomEngine { content_script });
        debug!(engine = name, content_script, "Registered selector engine");
        Ok(())
    }

    /// Returns `true` if `name` is a built-in or registered engine.
    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        BUILTIN_ENGINES.contains(&name) || self.custom.read().contains_key(name)
    }

    /// Parses a selector string and resolves its world.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] on grammar errors or unknown engines.
    pub fn parse(&self, selector: &str, strict: bool) -> Result<SelectorInfo> {
        self.resolve(parse_selector(selector)?, strict)
    }

    /// Resolves the world of an already parsed selector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] on unknown engines.
    pub fn resolve(&self, parsed: ParsedSelector, strict: bool) -> Result<SelectorInfo> {
        let custom = self.custom.read();
        let mut needs_main_world = false;

        visit_all_parts(&parsed, |part, _| {
            let name = part.name.as_str();
            match custom.get(name) {
                Some(engine) => {
                    if !engine.content_script {
                        needs_main_world = true;
                    }
                }
                None if BUILTIN_ENGINES.contains(&name) => {
                    if MAIN_WORLD_ENGINES.contains(&name) {
                        needs_main_world = true;
                    }
                }
                None => {
                    return Err(Error::invalid_selector(format!(
                        "Unknown engine \"{name}\" while parsing selector {}",
                        stringify_selector(&parsed)
                    )));
                }
            }
            Ok(())
        })?;
        drop(custom);

        let world = if needs_main_world {
            World::Main
        } else {
            World::Utility
        };
        Ok(SelectorInfo {
            parsed,
            world,
            strict,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
