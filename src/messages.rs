use serde::{Deserialize, Serialize};

/// What a highlight action targets while the mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Clicked elements take the mark.
    #[default]
    Element,
    /// Text selections are wrapped in a marked span.
    Text,
}

impl SelectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionMode::Element => "Element",
            SelectionMode::Text => "Text",
        }
    }
}

/// Command sent by the popup panel.
///
/// Wire shape:
/// `{"action": "startHighlighting", "color": "#34d399", "opacity": 0.4, "selectionMode": "text"}`
/// `{"action": "clearHighlights"}`
///
/// Absent fields keep the engine's current setting. An explicit
/// `"opacity": 0.0` is honored, not treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PanelCommand {
    #[serde(rename_all = "camelCase")]
    StartHighlighting {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection_mode: Option<SelectionMode>,
    },
    ClearHighlights,
}
