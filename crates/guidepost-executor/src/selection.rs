//! Audit trail of selection and expansion state seen during runs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use guidepost_protocols::{AttributeMutation, ElementKeys, PageEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
    pub element_key: String,
    pub selected: bool,
    pub expanded: bool,
    pub observed_at: DateTime<Utc>,
}

/// Latest [`SelectionRecord`] per element key.
#[derive(Debug, Default)]
pub struct SelectionLog {
    records: RwLock<HashMap<String, SelectionRecord>>,
}

impl SelectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whatever selection state `event` carries. Returns the
    /// updated record, if any.
    pub fn observe(&self, event: &PageEvent) -> Option<SelectionRecord> {
        match event {
            PageEvent::Attribute(mutation) => self.observe_mutation(mutation),
            PageEvent::Pointer {
                path,
                selected,
                expanded,
                ..
            } => {
                let target = path.first()?;
                self.upsert(target, *selected, *expanded)
            }
            _ => None,
        }
    }

    fn observe_mutation(&self, mutation: &AttributeMutation) -> Option<SelectionRecord> {
        self.upsert(&mutation.target, mutation.is_selected(), mutation.is_expanded())
    }

    fn upsert(&self, keys: &ElementKeys, selected: bool, expanded: bool) -> Option<SelectionRecord> {
        let key = keys.primary()?.to_string();
        let record = SelectionRecord {
            element_key: key.clone(),
            selected,
            expanded,
            observed_at: Utc::now(),
        };
        self.records.write().insert(key, record.clone());
        Some(record)
    }

    pub fn get(&self, element_key: &str) -> Option<SelectionRecord> {
        self.records.read().get(element_key).cloned()
    }

    /// All records, oldest observation first.
    pub fn snapshot(&self) -> Vec<SelectionRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by_key(|r| r.observed_at);
        records
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use guidepost_protocols::PointerKind;

    use super::*;

    fn mutation(id: &str, selected: Option<&str>, classes: &[&str]) -> PageEvent {
        PageEvent::Attribute(AttributeMutation {
            target: ElementKeys::default().with_id(id),
            attribute: "aria-selected".to_string(),
            aria_selected: selected.map(String::from),
            aria_expanded: None,
            classes: classes.iter().map(|c| c.to_string()).collect(),
        })
    }

    #[test]
    fn test_records_aria_selection() {
        let log = SelectionLog::new();
        let record = log.observe(&mutation("tab-2", Some("true"), &[])).unwrap();
        assert_eq!(record.element_key, "tab-2");
        assert!(record.selected);
        assert!(!record.expanded);
    }

    #[test]
    fn test_selected_class_counts() {
        let log = SelectionLog::new();
        log.observe(&mutation("row", None, &["item", "selected"]));
        assert!(log.get("row").unwrap().selected);
    }

    #[test]
    fn test_latest_state_wins() {
        let log = SelectionLog::new();
        log.observe(&mutation("tab", Some("true"), &[]));
        log.observe(&mutation("tab", Some("false"), &[]));
        assert_eq!(log.len(), 1);
        assert!(!log.get("tab").unwrap().selected);
    }

    #[test]
    fn test_pointer_event_records_target() {
        let log = SelectionLog::new();
        let event = PageEvent::Pointer {
            kind: PointerKind::Click,
            path: vec![
                ElementKeys::default().with_test_id("menu"),
                ElementKeys::default().with_id("nav"),
            ],
            selected: false,
            expanded: true,
        };
        log.observe(&event);
        let record = log.get("menu").unwrap();
        assert!(record.expanded);
        assert!(log.get("nav").is_none());
    }

    #[test]
    fn test_anonymous_and_lifecycle_events_ignored() {
        let log = SelectionLog::new();
        assert!(log.observe(&PageEvent::Unload).is_none());
        let anonymous = PageEvent::Pointer {
            kind: PointerKind::Click,
            path: vec![ElementKeys::default()],
            selected: true,
            expanded: false,
        };
        assert!(log.observe(&anonymous).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_clear() {
        let log = SelectionLog::new();
        log.observe(&mutation("a", Some("true"), &[]));
        log.clear();
        assert!(log.snapshot().is_empty());
    }
}
