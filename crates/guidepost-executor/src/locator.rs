//! Resolves opaque target identifiers to live, rendered elements.

use std::sync::Arc;

use guidepost_protocols::{BoundingBox, NodeRef, Page};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LocateError, NotFoundReason};

/// One way of turning an identifier into a selector. Tried in
/// [`LookupStrategy::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// The dedicated automation attribute.
    AutomationAttribute,
    /// `#id`.
    ElementId,
    /// `[id="..."]`, for ids that are not valid CSS identifiers.
    IdAttribute,
    TestId,
    Name,
}

impl LookupStrategy {
    pub const ALL: [LookupStrategy; 5] = [
        LookupStrategy::AutomationAttribute,
        LookupStrategy::ElementId,
        LookupStrategy::IdAttribute,
        LookupStrategy::TestId,
        LookupStrategy::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStrategy::AutomationAttribute => "automation_attribute",
            LookupStrategy::ElementId => "element_id",
            LookupStrategy::IdAttribute => "id_attribute",
            LookupStrategy::TestId => "test_id",
            LookupStrategy::Name => "name",
        }
    }

    /// The selector this strategy queries for `identifier`.
    pub fn selector(&self, automation_attribute: &str, identifier: &str) -> String {
        let escaped = css_escape(identifier);
        match self {
            LookupStrategy::AutomationAttribute => {
                format!("[{}=\"{}\"]", automation_attribute, escaped)
            }
            LookupStrategy::ElementId => format!("#{}", escaped),
            LookupStrategy::IdAttribute => format!("[id=\"{}\"]", escaped),
            LookupStrategy::TestId => format!("[data-testid=\"{}\"]", escaped),
            LookupStrategy::Name => format!("[name=\"{}\"]", escaped),
        }
    }
}

/// Serialize `value` as a CSS identifier, escaping anything that would
/// break selector syntax.
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    for (i, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-'));
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", c as u32)),
            _ if leading_digit => out.push_str(&format!("\\{:x} ", c as u32)),
            '-' if chars.len() == 1 => out.push_str("\\-"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// A resolved target.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub identifier: String,
    pub node: NodeRef,
    /// Viewport coordinates at the moment of lookup.
    pub bounds: BoundingBox,
    pub in_viewport: bool,
    pub strategy: LookupStrategy,
    pub selector: String,
}

/// Runs the fallback lookup strategies against a page.
#[derive(Clone)]
pub struct ElementLocator {
    page: Arc<dyn Page>,
    automation_attribute: String,
}

impl ElementLocator {
    pub fn new(page: Arc<dyn Page>, automation_attribute: impl Into<String>) -> Self {
        Self {
            page,
            automation_attribute: automation_attribute.into(),
        }
    }

    pub fn automation_attribute(&self) -> &str {
        &self.automation_attribute
    }

    /// Resolve `identifier` to its first live match.
    ///
    /// A strategy whose query fails is skipped. The first strategy with a
    /// match decides the outcome: a zero-size or detached element is
    /// reported as not found rather than falling through.
    pub async fn locate(&self, identifier: &str) -> Result<Located, LocateError> {
        if identifier.trim().is_empty() {
            return Err(LocateError::NotFound {
                identifier: identifier.to_string(),
                attempted: Vec::new(),
                reason: NotFoundReason::EmptyIdentifier,
            });
        }

        let mut attempted = Vec::with_capacity(LookupStrategy::ALL.len());
        for strategy in LookupStrategy::ALL {
            let selector = strategy.selector(&self.automation_attribute, identifier);
            attempted.push(selector.clone());

            let nodes = match self.page.query_all(&selector).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(
                        identifier,
                        strategy = strategy.as_str(),
                        error = %e,
                        "Lookup strategy failed, trying next"
                    );
                    continue;
                }
            };
            let Some(node) = nodes.into_iter().next() else {
                continue;
            };

            let bounds = match self.page.bounding_box(&node).await {
                Ok(Some(bounds)) => bounds,
                Ok(None) => {
                    return Err(LocateError::NotFound {
                        identifier: identifier.to_string(),
                        attempted,
                        reason: NotFoundReason::Detached { selector },
                    });
                }
                Err(e) => {
                    warn!(
                        identifier,
                        strategy = strategy.as_str(),
                        error = %e,
                        "Could not measure match, trying next strategy"
                    );
                    continue;
                }
            };

            if !bounds.is_rendered() {
                return Err(LocateError::NotFound {
                    identifier: identifier.to_string(),
                    attempted,
                    reason: NotFoundReason::ZeroSize { selector },
                });
            }

            let viewport = self.page.viewport().await?;
            let in_viewport = bounds.intersects(&viewport);
            debug!(
                identifier,
                strategy = strategy.as_str(),
                ?bounds,
                in_viewport,
                "Located element"
            );
            return Ok(Located {
                identifier: identifier.to_string(),
                node,
                bounds,
                in_viewport,
                strategy,
                selector,
            });
        }

        Err(LocateError::NotFound {
            identifier: identifier.to_string(),
            attempted,
            reason: NotFoundReason::NoMatch,
        })
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
