//! Scripts injected into every attached page.

use tracing::debug;

use crate::cdp::{CdpError, PageSession};

/// Binding the listener script reports through.
pub const SIGNAL_BINDING: &str = "__guidepostSignal";

const REGISTRY_JS: &str = include_str!("js/registry.js");
const LISTENERS_JS: &str = include_str!("js/listeners.js");
const OVERLAY_JS: &str = include_str!("js/overlay.js");
const SNAPSHOT_JS: &str = include_str!("js/snapshot.js");

/// The registry first; the others extend `window.__guidepost`.
pub(crate) const PAGE_SCRIPTS: [(&str, &str); 4] = [
    ("registry", REGISTRY_JS),
    ("listeners", LISTENERS_JS),
    ("overlay", OVERLAY_JS),
    ("snapshot", SNAPSHOT_JS),
];

/// Install the binding and page scripts once per session.
pub(crate) async fn ensure_installed(session: &PageSession) -> Result<(), CdpError> {
    session
        .prepared
        .get_or_try_init(|| async {
            session.add_binding(SIGNAL_BINDING).await?;
            for (name, source) in PAGE_SCRIPTS {
                session.add_init_script(source).await?;
                debug!(script = name, session = session.session_id(), "Installed page script");
            }
            Ok::<(), CdpError>(())
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use guidepost_protocols::OVERLAY_ATTRIBUTE;

    use super::*;

    #[test]
    fn test_scripts_agree_on_overlay_attribute() {
        for source in [LISTENERS_JS, OVERLAY_JS, SNAPSHOT_JS] {
            assert!(source.contains(OVERLAY_ATTRIBUTE));
        }
    }

    #[test]
    fn test_listener_reports_through_binding() {
        assert!(LISTENERS_JS.contains(SIGNAL_BINDING));
    }

    #[test]
    fn test_scripts_are_idempotent() {
        assert!(REGISTRY_JS.contains("if (window.__guidepost) return;"));
        for source in [LISTENERS_JS, OVERLAY_JS, SNAPSHOT_JS] {
            assert!(source.contains("const g = window.__guidepost;"));
        }
    }

    #[test]
    fn test_pointer_kinds_match_event_names() {
        use guidepost_protocols::PointerKind;

        for kind in [PointerKind::Click, PointerKind::PointerDown, PointerKind::MouseDown] {
            let wire = serde_json::to_value(kind).unwrap();
            let entry = format!("{}: '{}'", wire.as_str().unwrap(), kind.event_type());
            assert!(LISTENERS_JS.contains(&entry), "missing {}", entry);
        }
    }
}
