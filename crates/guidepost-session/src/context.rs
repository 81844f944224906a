//! What the reasoning service gets to see of the page.

use async_trait::async_trait;
use guidepost_protocols::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// An element the user could act on, under the identifier minted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveElement {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// One capture of the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub serialized_markup: String,
    /// `data:image/png;base64,...`
    pub screenshot: String,
    pub interactive_elements: Vec<InteractiveElement>,
}

/// Captures the page on demand, once per outer iteration.
#[async_trait]
pub trait PageContextProvider: Send + Sync {
    async fn capture(&self) -> Result<PageContext, SessionError>;
}
