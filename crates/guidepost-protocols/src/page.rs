//! The live document port and the events it delivers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::PageError;
use crate::geometry::{BoundingBox, Viewport};

/// Opaque handle to a node inside the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef(pub String);

impl NodeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// The identifying attributes of one element.
///
/// A target identifier refers to an element when it equals any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementKeys {
    /// Value of the dedicated automation attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ElementKeys {
    pub fn with_automation_id(mut self, v: impl Into<String>) -> Self {
        self.automation_id = Some(v.into());
        self
    }

    pub fn with_id(mut self, v: impl Into<String>) -> Self {
        self.id = Some(v.into());
        self
    }

    pub fn with_test_id(mut self, v: impl Into<String>) -> Self {
        self.test_id = Some(v.into());
        self
    }

    pub fn with_name(mut self, v: impl Into<String>) -> Self {
        self.name = Some(v.into());
        self
    }

    fn all(&self) -> impl Iterator<Item = &str> {
        [&self.automation_id, &self.id, &self.test_id, &self.name]
            .into_iter()
            .filter_map(|k| k.as_deref())
    }

    /// The most specific key present, in locator priority order.
    pub fn primary(&self) -> Option<&str> {
        self.all().find(|k| !k.is_empty())
    }

    pub fn matches(&self, identifier: &str) -> bool {
        !identifier.is_empty() && self.all().any(|k| k == identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.primary().is_none()
    }
}

/// An observed change to a watched attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMutation {
    pub target: ElementKeys,
    pub attribute: String,
    #[serde(default)]
    pub aria_selected: Option<String>,
    #[serde(default)]
    pub aria_expanded: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

impl AttributeMutation {
    pub fn is_selected(&self) -> bool {
        self.aria_selected.as_deref() == Some("true") || self.classes.iter().any(|c| c == "selected")
    }

    pub fn is_expanded(&self) -> bool {
        self.aria_expanded.as_deref() == Some("true")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Click,
    PointerDown,
    MouseDown,
}

impl PointerKind {
    /// DOM event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            PointerKind::Click => "click",
            PointerKind::PointerDown => "pointerdown",
            PointerKind::MouseDown => "mousedown",
        }
    }
}

/// Something the page reported to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// Pointer activity; `path` runs from the event target up to the root.
    /// `selected` and `expanded` describe the event target.
    Pointer {
        kind: PointerKind,
        path: Vec<ElementKeys>,
        #[serde(default)]
        selected: bool,
        #[serde(default)]
        expanded: bool,
    },
    /// A key press. `prevented` is set when the page suppressed the default.
    Key {
        key: String,
        #[serde(default)]
        prevented: bool,
    },
    Attribute(AttributeMutation),
    VisibilityHidden,
    Unload,
}

impl PageEvent {
    /// Events that end any run regardless of its target.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, PageEvent::VisibilityHidden | PageEvent::Unload)
    }
}

/// What a subscriber wants to hear about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenSpec {
    pub automation_attribute: String,
    pub pointer_events: Vec<PointerKind>,
    /// Keys whose default action is prevented and reported.
    pub intercept_keys: Vec<String>,
    /// Attribute filter for the mutation observer.
    pub watched_attributes: Vec<String>,
}

/// Detaches page listeners when released or dropped. Runs at most once.
pub struct ListenerGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn is_armed(&self) -> bool {
        self.release.is_some()
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("armed", &self.is_armed())
            .finish()
    }
}

/// A live event stream plus the guard that tears it down.
#[derive(Debug)]
pub struct Subscription {
    pub events: mpsc::UnboundedReceiver<PageEvent>,
    pub guard: ListenerGuard,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<PageEvent>, guard: ListenerGuard) -> Self {
        Self { events, guard }
    }

    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<PageEvent>, ListenerGuard) {
        (self.events, self.guard)
    }
}

/// The document the executor acts on.
#[async_trait]
pub trait Page: Send + Sync {
    /// All live nodes matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<NodeRef>, PageError>;

    /// Viewport-relative rectangle, or `None` once the node is detached.
    async fn bounding_box(&self, node: &NodeRef) -> Result<Option<BoundingBox>, PageError>;

    async fn viewport(&self) -> Result<Viewport, PageError>;

    async fn scroll_to(&self, top: f64, behavior: ScrollBehavior) -> Result<(), PageError>;

    /// Synthesize pointerdown, pointerup and click on the node.
    async fn click(&self, node: &NodeRef) -> Result<(), PageError>;

    /// Install listeners. They stay attached until the guard is released.
    async fn listen(&self, spec: ListenSpec) -> Result<Subscription, PageError>;
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
