//! Finding interactive elements and minting identifiers for them.
//!
//! Identifiers read like `header-nav-button-7`: up to two ancestor names,
//! the tag, the role if any, and a counter value. The counter belongs to
//! an [`IdMinter`] owned by whoever captures the page and is reset when a
//! new document loads.

use std::sync::atomic::{AtomicU64, Ordering};

use guidepost_protocols::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::context::InteractiveElement;

const INTERACTIVE_TAGS: [&str; 5] = ["button", "input", "select", "textarea", "a"];
const INTERACTIVE_ROLES: [&str; 6] = ["button", "link", "menuitem", "tab", "checkbox", "radio"];
const PARENT_DEPTH: usize = 2;

/// Monotonic identifier counter.
#[derive(Debug, Default)]
pub struct IdMinter {
    next: AtomicU64,
}

impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next value, starting at 1.
    pub fn mint(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Values minted since the last reset.
    pub fn minted(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Start over, e.g. after navigation.
    pub fn reset(&self) {
        self.next.store(0, Ordering::SeqCst);
    }
}

/// An ancestor as seen from a candidate element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestorSnapshot {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl AncestorSnapshot {
    fn name(&self) -> String {
        [&self.id, &self.test_id, &self.role]
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| self.tag.to_lowercase())
    }
}

/// Raw facts about one element, gathered in the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Inline click or key handler attributes are present.
    #[serde(default)]
    pub has_handler: bool,
    /// Nearest first.
    #[serde(default)]
    pub ancestors: Vec<AncestorSnapshot>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

pub fn is_interactive(element: &ElementSnapshot) -> bool {
    let tag = element.tag.to_lowercase();
    INTERACTIVE_TAGS.contains(&tag.as_str())
        || element
            .role
            .as_deref()
            .is_some_and(|role| INTERACTIVE_ROLES.contains(&role))
        || element.has_handler
}

/// Accessible name, falling back through placeholder, title and text.
pub fn element_label(element: &ElementSnapshot) -> String {
    [&element.aria_label, &element.placeholder, &element.title]
        .into_iter()
        .flatten()
        .map(|v| v.trim())
        .chain(std::iter::once(element.text.trim()))
        .find(|v| !v.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

/// Names of up to two ancestors, outermost first, joined by `-`.
pub fn parent_context(element: &ElementSnapshot) -> String {
    let mut names: Vec<String> = element
        .ancestors
        .iter()
        .take(PARENT_DEPTH)
        .map(AncestorSnapshot::name)
        .collect();
    names.reverse();
    names.join("-")
}

pub fn descriptive_id(element: &ElementSnapshot, minter: &IdMinter) -> String {
    let tag = element.tag.to_lowercase();
    let counter = minter.mint().to_string();
    [
        parent_context(element).as_str(),
        tag.as_str(),
        element.role.as_deref().unwrap_or(""),
        counter.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}

/// Mint identifiers for the interactive subset of `elements`.
///
/// Returns `(index into elements, annotated element)` pairs so the caller
/// can write the identifiers back into the page.
pub fn annotate(elements: &[ElementSnapshot], minter: &IdMinter) -> Vec<(usize, InteractiveElement)> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, e)| is_interactive(e))
        .map(|(index, e)| {
            let annotated = InteractiveElement {
                id: descriptive_id(e, minter),
                label: element_label(e),
                element_type: e.tag.to_lowercase(),
                bounding_box: e.bounding_box,
            };
            (index, annotated)
        })
        .collect()
}

#[cfg(test)]
#[path = "annotate_tests.rs"]
mod tests;
