//! The fixed banner that marks the mode as active, plus the stylesheet the
//! engine injects once per page. The selectors here are the extension's
//! public CSS surface and must not change.

use kuchiki::NodeRef;

use crate::messages::SelectionMode;
use crate::page::document::{self, PageDocument};

pub const INDICATOR_ID: &str = "highlight-mode-indicator";
pub const STYLE_ID: &str = "text-highlighter-style";
pub const HIGHLIGHT_CLASS: &str = "text-highlighter-highlight";
pub const INPUT_WRAPPER_CLASS: &str = "text-highlighter-input-wrapper";

const STYLESHEET: &str = "\
#highlight-mode-indicator {
  position: fixed;
  top: 10px;
  left: 50%;
  transform: translateX(-50%);
  background-color: rgba(0, 0, 0, 0.8);
  color: white;
  padding: 8px 16px;
  border-radius: 4px;
  z-index: 9999;
  font-family: Arial, sans-serif;
  font-size: 14px;
  pointer-events: none;
}
.text-highlighter-highlight {
  transition: background-color 0.2s ease;
}
.text-highlighter-input-wrapper {
  display: inline-block;
  position: relative;
  padding: 2px;
  border-radius: 2px;
}
.text-highlighter-highlight input::placeholder,
.text-highlighter-highlight textarea::placeholder {
  color: rgba(0, 0, 0, 0.7) !important;
}
";

fn label_for(mode: SelectionMode) -> String {
    format!(
        "Highlighting Mode Active ({} mode, ESC to exit)",
        mode.label()
    )
}

/// Append the banner to `<body>`, or refresh its label if it is already
/// there. Never stacks a second banner.
pub fn install(doc: &PageDocument, mode: SelectionMode) {
    if doc.element_by_id(INDICATOR_ID).is_some() {
        update_label(doc, mode);
        return;
    }
    let banner = document::create_element("div");
    document::set_attr(&banner, "id", INDICATOR_ID);
    banner.append(NodeRef::new_text(label_for(mode)));
    if let Some(body) = doc.body() {
        body.append(banner);
    } else {
        doc.root().append(banner);
    }
}

pub fn update_label(doc: &PageDocument, mode: SelectionMode) {
    let Some(banner) = doc.element_by_id(INDICATOR_ID) else {
        return;
    };
    let children: Vec<NodeRef> = banner.children().collect();
    for child in children {
        child.detach();
    }
    banner.append(NodeRef::new_text(label_for(mode)));
}

pub fn remove(doc: &PageDocument) {
    if let Some(banner) = doc.element_by_id(INDICATOR_ID) {
        banner.detach();
    }
}

/// True for the banner itself and anything inside it.
pub fn is_inside(node: &NodeRef) -> bool {
    node.inclusive_ancestors().any(|ancestor| {
        ancestor
            .as_element()
            .map_or(false, |el| el.attributes.borrow().get("id") == Some(INDICATOR_ID))
    })
}

/// Append the engine stylesheet to `<head>`. Idempotent.
pub fn install_stylesheet(doc: &PageDocument) {
    if doc.element_by_id(STYLE_ID).is_some() {
        return;
    }
    let style = document::create_element("style");
    document::set_attr(&style, "id", STYLE_ID);
    style.append(NodeRef::new_text(STYLESHEET));
    if let Some(head) = doc.head() {
        head.append(style);
    } else {
        doc.root().append(style);
    }
}
