//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response or event message.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP error in response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
}

/// An event pushed by the browser for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

impl CdpEvent {
    /// `Runtime.bindingCalled` for `name`, yielding its string payload.
    pub fn binding_payload(&self, name: &str) -> Option<&str> {
        if self.method != "Runtime.bindingCalled" || self.params["name"] != name {
            return None;
        }
        self.params["payload"].as_str()
    }

    /// A top-level frame committed a new document.
    pub fn is_main_frame_navigation(&self) -> bool {
        self.method == "Page.frameNavigated"
            && self.params["frame"].is_object()
            && self.params["frame"]["parentId"].is_null()
    }
}

impl TryFrom<CdpResponse> for CdpEvent {
    type Error = CdpResponse;

    fn try_from(resp: CdpResponse) -> Result<Self, Self::Error> {
        match resp.method {
            Some(method) => Ok(CdpEvent {
                method,
                params: resp.params.unwrap_or(Value::Null),
            }),
            None => Err(resp),
        }
    }
}

/// Page info from the `/json/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

impl PageInfo {
    pub fn is_page(&self) -> bool {
        self.page_type == "page"
    }
}

/// Browser version info.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(value: Value) -> CdpEvent {
        let resp: CdpResponse = serde_json::from_value(value).unwrap();
        CdpEvent::try_from(resp).unwrap()
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let req = CdpRequest {
            id: 7,
            method: "Page.enable".to_string(),
            params: None,
            session_id: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"id": 7, "method": "Page.enable"})
        );
    }

    #[test]
    fn test_binding_payload() {
        let ev = event(json!({
            "method": "Runtime.bindingCalled",
            "params": {"name": "__guidepostSignal", "payload": "{}", "executionContextId": 1},
            "sessionId": "S"
        }));
        assert_eq!(ev.binding_payload("__guidepostSignal"), Some("{}"));
        assert_eq!(ev.binding_payload("other"), None);
    }

    #[test]
    fn test_main_frame_navigation() {
        let top = event(json!({
            "method": "Page.frameNavigated",
            "params": {"frame": {"id": "F1", "url": "https://shop.test/"}}
        }));
        let child = event(json!({
            "method": "Page.frameNavigated",
            "params": {"frame": {"id": "F2", "parentId": "F1", "url": "about:blank"}}
        }));
        assert!(top.is_main_frame_navigation());
        assert!(!child.is_main_frame_navigation());
    }

    #[test]
    fn test_response_is_not_an_event() {
        let resp: CdpResponse = serde_json::from_value(json!({"id": 1, "result": {}})).unwrap();
        assert!(CdpEvent::try_from(resp).is_err());
    }

    #[test]
    fn test_browser_version_pascal_case() {
        let v: BrowserVersion = serde_json::from_value(json!({
            "Browser": "Chrome/126.0",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        }))
        .unwrap();
        assert_eq!(v.browser, "Chrome/126.0");
        assert!(v.web_socket_debugger_url.starts_with("ws://"));
    }
}
