//! A scriptable document.
//!
//! Elements live in document coordinates; the page reports them relative
//! to its current scroll offset. Smooth scrolling advances one step per
//! [`Page::viewport`] poll, so settle detection can be driven
//! deterministically.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::PageError;
use crate::geometry::{BoundingBox, Viewport};
use crate::page::{
    AttributeMutation, ElementKeys, ListenSpec, ListenerGuard, NodeRef, Page, PageEvent,
    PointerKind, ScrollBehavior, Subscription,
};

/// How a smooth scroll request plays out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollMode {
    /// Move `fraction` of the remaining distance per poll.
    Eased { fraction: f64 },
    /// Arrive on the first poll.
    Jump,
    /// Oscillate around the target forever.
    Jitter,
    /// Ignore scroll requests.
    Stuck,
}

/// One element in the fake document.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub keys: ElementKeys,
    pub tag: String,
    /// Document-space rectangle.
    pub bounds: BoundingBox,
    pub parent: Option<usize>,
    pub attached: bool,
    pub selected: bool,
    pub expanded: bool,
}

impl FakeElement {
    pub fn new(keys: ElementKeys, bounds: BoundingBox) -> Self {
        Self {
            keys,
            tag: "div".to_string(),
            bounds,
            parent: None,
            attached: true,
            selected: false,
            expanded: false,
        }
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }
}

struct Listener {
    id: u64,
    spec: ListenSpec,
    tx: mpsc::UnboundedSender<PageEvent>,
}

struct State {
    automation_attribute: String,
    elements: Vec<FakeElement>,
    viewport: Viewport,
    scroll_target: Option<f64>,
    jitter_flip: bool,
    mode: ScrollMode,
    broken_prefixes: Vec<String>,
    listeners: Vec<Listener>,
    next_listener: u64,
    clicks: Vec<NodeRef>,
    scroll_requests: Vec<f64>,
    queries: Vec<String>,
    released_listeners: HashSet<u64>,
}

impl State {
    fn max_scroll(&self) -> f64 {
        let doc_height = self
            .elements
            .iter()
            .map(|e| e.bounds.bottom())
            .fold(self.viewport.height, f64::max);
        (doc_height - self.viewport.height).max(0.0)
    }

    fn advance_scroll(&mut self) {
        let Some(target) = self.scroll_target else {
            return;
        };
        let current = self.viewport.scroll_y;
        self.viewport.scroll_y = match self.mode {
            ScrollMode::Eased { fraction } => {
                let next = current + (target - current) * fraction;
                if (target - next).abs() < 0.5 {
                    self.scroll_target = None;
                    target
                } else {
                    next
                }
            }
            ScrollMode::Jump => {
                self.scroll_target = None;
                target
            }
            ScrollMode::Jitter => {
                self.jitter_flip = !self.jitter_flip;
                if self.jitter_flip { target + 1.0 } else { target - 1.0 }
            }
            ScrollMode::Stuck => current,
        };
    }

    fn node_index(&self, node: &NodeRef) -> Result<usize, PageError> {
        node.as_str()
            .strip_prefix("node-")
            .and_then(|i| i.parse::<usize>().ok())
            .filter(|i| *i < self.elements.len())
            .ok_or_else(|| PageError::Detached(node.to_string()))
    }

    fn path(&self, mut index: usize) -> Vec<ElementKeys> {
        let mut path = vec![self.elements[index].keys.clone()];
        while let Some(parent) = self.elements[index].parent {
            path.push(self.elements[parent].keys.clone());
            index = parent;
        }
        path
    }

    fn pointer_events(&mut self, index: usize, kinds: &[PointerKind]) {
        let path = self.path(index);
        let (selected, expanded) = (self.elements[index].selected, self.elements[index].expanded);
        for kind in kinds {
            self.broadcast(&PageEvent::Pointer {
                kind: *kind,
                path: path.clone(),
                selected,
                expanded,
            });
        }
    }

    fn broadcast(&mut self, event: &PageEvent) {
        self.listeners.retain(|l| {
            let wanted = match event {
                PageEvent::Pointer { kind, .. } => l.spec.pointer_events.contains(kind),
                PageEvent::Key { key, .. } => l.spec.intercept_keys.contains(key),
                PageEvent::Attribute(m) => l.spec.watched_attributes.contains(&m.attribute),
                PageEvent::VisibilityHidden | PageEvent::Unload => true,
            };
            !wanted || l.tx.send(event.clone()).is_ok()
        });
    }
}

/// Scriptable [`Page`] for tests.
#[derive(Clone)]
pub struct FakePage {
    state: Arc<Mutex<State>>,
}

impl FakePage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                automation_attribute: "data-guide-id".to_string(),
                elements: Vec::new(),
                viewport: Viewport::new(width, height),
                scroll_target: None,
                jitter_flip: false,
                mode: ScrollMode::Eased { fraction: 0.5 },
                broken_prefixes: Vec::new(),
                listeners: Vec::new(),
                next_listener: 0,
                clicks: Vec::new(),
                scroll_requests: Vec::new(),
                queries: Vec::new(),
                released_listeners: HashSet::new(),
            })),
        }
    }

    pub fn with_automation_attribute(self, attribute: impl Into<String>) -> Self {
        self.state.lock().automation_attribute = attribute.into();
        self
    }

    pub fn with_scroll_mode(self, mode: ScrollMode) -> Self {
        self.state.lock().mode = mode;
        self
    }

    /// Add an element and return its index.
    pub fn add(&self, element: FakeElement) -> usize {
        let mut state = self.state.lock();
        state.elements.push(element);
        state.elements.len() - 1
    }

    /// Add a `div` with an `id` at the given document rectangle.
    pub fn add_with_id(&self, id: &str, bounds: BoundingBox) -> usize {
        self.add(FakeElement::new(ElementKeys::default().with_id(id), bounds))
    }

    pub fn node(index: usize) -> NodeRef {
        NodeRef::new(format!("node-{}", index))
    }

    /// Make every selector starting with `prefix` raise a syntax error.
    pub fn break_selectors(&self, prefix: impl Into<String>) {
        self.state.lock().broken_prefixes.push(prefix.into());
    }

    pub fn set_bounds(&self, index: usize, bounds: BoundingBox) {
        self.state.lock().elements[index].bounds = bounds;
    }

    pub fn detach(&self, index: usize) {
        self.state.lock().elements[index].attached = false;
    }

    pub fn set_scroll(&self, y: f64) {
        let mut state = self.state.lock();
        state.viewport.scroll_y = y;
        state.scroll_target = None;
    }

    pub fn scroll_y(&self) -> f64 {
        self.state.lock().viewport.scroll_y
    }

    pub fn clicks(&self) -> Vec<NodeRef> {
        self.state.lock().clicks.clone()
    }

    pub fn scroll_requests(&self) -> Vec<f64> {
        self.state.lock().scroll_requests.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().queries.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn released_listener_count(&self) -> usize {
        self.state.lock().released_listeners.len()
    }

    /// Deliver an arbitrary event to interested listeners.
    pub fn emit(&self, event: PageEvent) {
        self.state.lock().broadcast(&event);
    }

    /// A user pointer press on an element: pointerdown, mousedown, click.
    pub fn user_click(&self, index: usize) {
        self.state.lock().pointer_events(
            index,
            &[PointerKind::PointerDown, PointerKind::MouseDown, PointerKind::Click],
        );
    }

    pub fn press_key(&self, key: &str) {
        let mut state = self.state.lock();
        let prevented = state
            .listeners
            .iter()
            .any(|l| l.spec.intercept_keys.iter().any(|k| k == key));
        state.broadcast(&PageEvent::Key {
            key: key.to_string(),
            prevented,
        });
    }

    /// Change a watched attribute on an element.
    pub fn mutate(&self, index: usize, mutation: AttributeMutation) {
        let mut state = self.state.lock();
        let element = &mut state.elements[index];
        element.selected = mutation.is_selected();
        element.expanded = mutation.is_expanded();
        let target = element.keys.clone();
        state.broadcast(&PageEvent::Attribute(AttributeMutation { target, ..mutation }));
    }

    pub fn hide(&self) {
        self.emit(PageEvent::VisibilityHidden);
    }

    pub fn unload(&self) {
        self.emit(PageEvent::Unload);
    }
}

/// Undo CSS backslash escapes in an identifier or string token.
fn css_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        if chars.peek() == Some(&' ') {
            chars.next();
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
    }
    out
}

enum Query {
    Id(String),
    Attribute { name: String, value: String },
}

fn parse_selector(selector: &str) -> Result<Query, PageError> {
    let invalid = || PageError::InvalidSelector(selector.to_string());
    if let Some(ident) = selector.strip_prefix('#') {
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid());
        }
        return Ok(Query::Id(css_unescape(ident)));
    }
    let body = selector
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(invalid)?;
    let (name, value) = body.split_once('=').ok_or_else(invalid)?;
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(invalid)?;
    Ok(Query::Attribute {
        name: name.trim().to_string(),
        value: css_unescape(value),
    })
}

#[async_trait]
impl Page for FakePage {
    async fn query_all(&self, selector: &str) -> Result<Vec<NodeRef>, PageError> {
        let mut state = self.state.lock();
        state.queries.push(selector.to_string());
        if state.broken_prefixes.iter().any(|p| selector.starts_with(p)) {
            return Err(PageError::InvalidSelector(selector.to_string()));
        }
        let query = parse_selector(selector)?;
        let automation = state.automation_attribute.clone();
        let matches = state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.attached)
            .filter(|(_, e)| {
                let key = match &query {
                    Query::Id(_) => &e.keys.id,
                    Query::Attribute { name, .. } if *name == automation => &e.keys.automation_id,
                    Query::Attribute { name, .. } if name == "id" => &e.keys.id,
                    Query::Attribute { name, .. } if name == "data-testid" => &e.keys.test_id,
                    Query::Attribute { name, .. } if name == "name" => &e.keys.name,
                    Query::Attribute { .. } => return false,
                };
                let wanted = match &query {
                    Query::Id(v) | Query::Attribute { value: v, .. } => v,
                };
                key.as_deref() == Some(wanted.as_str())
            })
            .map(|(i, _)| FakePage::node(i))
            .collect();
        Ok(matches)
    }

    async fn bounding_box(&self, node: &NodeRef) -> Result<Option<BoundingBox>, PageError> {
        let state = self.state.lock();
        let index = state.node_index(node)?;
        let element = &state.elements[index];
        if !element.attached {
            return Ok(None);
        }
        let vp = state.viewport;
        Ok(Some(element.bounds.translate(-vp.scroll_x, -vp.scroll_y)))
    }

    async fn viewport(&self) -> Result<Viewport, PageError> {
        let mut state = self.state.lock();
        state.advance_scroll();
        Ok(state.viewport)
    }

    async fn scroll_to(&self, top: f64, behavior: ScrollBehavior) -> Result<(), PageError> {
        let mut state = self.state.lock();
        state.scroll_requests.push(top);
        if state.mode == ScrollMode::Stuck {
            return Ok(());
        }
        let top = top.clamp(0.0, state.max_scroll());
        match behavior {
            ScrollBehavior::Smooth => state.scroll_target = Some(top),
            ScrollBehavior::Instant => {
                state.viewport.scroll_y = top;
                state.scroll_target = None;
            }
        }
        Ok(())
    }

    async fn click(&self, node: &NodeRef) -> Result<(), PageError> {
        let mut state = self.state.lock();
        let index = state.node_index(node)?;
        if !state.elements[index].attached {
            return Err(PageError::Detached(node.to_string()));
        }
        state.clicks.push(node.clone());
        state.pointer_events(index, &[PointerKind::PointerDown, PointerKind::Click]);
        Ok(())
    }

    async fn listen(&self, spec: ListenSpec) -> Result<Subscription, PageError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut state = self.state.lock();
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push(Listener { id, spec, tx });
            id
        };
        let state = Arc::clone(&self.state);
        let guard = ListenerGuard::new(move || {
            let mut state = state.lock();
            state.listeners.retain(|l| l.id != id);
            state.released_listeners.insert(id);
        });
        Ok(Subscription::new(rx, guard))
    }
}

#[cfg(test)]
#[path = "fake_page_tests.rs"]
mod tests;
