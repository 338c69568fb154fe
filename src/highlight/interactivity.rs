//! Reversible suspension of the page's own pointer behavior. Inline `on*`
//! handler values move into `data-original-on*` stash attributes while the
//! mode holds the page, and move back on restore; suspend-then-restore
//! leaves the serialized page byte-identical.

use crate::highlight::indicator;
use crate::page::PageDocument;

pub const SUSPENDED_MOUSE_EVENTS: [&str; 10] = [
    "mousedown",
    "mouseup",
    "click",
    "dblclick",
    "contextmenu",
    "mouseover",
    "mouseout",
    "mouseenter",
    "mouseleave",
    "mousemove",
];

pub const INLINE_HANDLER_ATTRIBUTES: [&str; 10] = [
    "onmousedown",
    "onmouseup",
    "onclick",
    "ondblclick",
    "oncontextmenu",
    "onmouseover",
    "onmouseout",
    "onmouseenter",
    "onmouseleave",
    "onmousemove",
];

const STASH_PREFIX: &str = "data-original-";

fn stash_name(attribute: &str) -> String {
    format!("{STASH_PREFIX}{attribute}")
}

/// Move every live `on*` handler into its stash attribute. Returns the
/// number stashed. An existing stash is never overwritten, so re-suspension
/// keeps the oldest original value.
pub fn suspend_inline_handlers(doc: &PageDocument) -> usize {
    let mut stashed = 0;
    for element in doc.elements() {
        if indicator::is_inside(&element) {
            continue;
        }
        let Some(data) = element.as_element() else {
            continue;
        };
        let mut attributes = data.attributes.borrow_mut();
        for attribute in INLINE_HANDLER_ATTRIBUTES {
            let stash = stash_name(attribute);
            if let Some(removed) = attributes.remove(attribute) {
                if !attributes.contains(stash.as_str()) {
                    attributes.insert(stash.as_str(), removed.value);
                    stashed += 1;
                }
            }
        }
    }
    stashed
}

/// Move every stashed handler back and delete the stash. Returns the number
/// restored.
pub fn restore_inline_handlers(doc: &PageDocument) -> usize {
    let mut restored = 0;
    for element in doc.elements() {
        let Some(data) = element.as_element() else {
            continue;
        };
        let mut attributes = data.attributes.borrow_mut();
        let stashed: Vec<(String, String)> = attributes
            .map
            .iter()
            .filter_map(|(name, attr)| {
                let local = name.local.as_ref();
                let live = local.strip_prefix(STASH_PREFIX)?;
                // Only our own stash names; a page's unrelated
                // `data-original-*` attributes stay untouched.
                if !INLINE_HANDLER_ATTRIBUTES.contains(&live) {
                    return None;
                }
                Some((live.to_string(), attr.value.clone()))
            })
            .collect();
        for (live, value) in stashed {
            attributes.remove(stash_name(&live).as_str());
            attributes.insert(live.as_str(), value);
            restored += 1;
        }
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SelectionMode;
    use crate::page::document;

    const PAGE: &str = "<html><body>\
        <button id=\"b\" onclick=\"go()\" onmouseover=\"hover()\">hit</button>\
        <a id=\"a\" href=\"/x\" onclick=\"nav()\">link</a>\
        <p id=\"p\">plain</p>\
        </body></html>";

    #[test]
    fn suspend_moves_handlers_into_the_stash() {
        let doc = PageDocument::parse(PAGE);
        assert_eq!(suspend_inline_handlers(&doc), 3);
        let button = doc.element_by_id("b").unwrap();
        assert_eq!(document::get_attr(&button, "onclick"), None);
        assert_eq!(
            document::get_attr(&button, "data-original-onclick").as_deref(),
            Some("go()")
        );
        assert_eq!(
            document::get_attr(&button, "data-original-onmouseover").as_deref(),
            Some("hover()")
        );
    }

    #[test]
    fn suspend_then_restore_is_byte_identical() {
        let doc = PageDocument::parse(PAGE);
        let before = doc.html().unwrap();
        assert_eq!(suspend_inline_handlers(&doc), 3);
        assert_ne!(doc.html().unwrap(), before);
        assert_eq!(restore_inline_handlers(&doc), 3);
        assert_eq!(doc.html().unwrap(), before);
    }

    #[test]
    fn existing_stash_is_not_overwritten() {
        let doc = PageDocument::parse(PAGE);
        suspend_inline_handlers(&doc);
        let button = doc.element_by_id("b").unwrap();
        // A page script re-added a handler while the mode held the page.
        document::set_attr(&button, "onclick", "later()");
        assert_eq!(suspend_inline_handlers(&doc), 0);
        assert_eq!(
            document::get_attr(&button, "data-original-onclick").as_deref(),
            Some("go()")
        );
        assert_eq!(document::get_attr(&button, "onclick"), None);
    }

    #[test]
    fn indicator_is_never_stashed() {
        let doc = PageDocument::parse(PAGE);
        crate::highlight::indicator::install(&doc, SelectionMode::Element);
        let banner = doc.element_by_id(indicator::INDICATOR_ID).unwrap();
        document::set_attr(&banner, "onclick", "noop()");
        suspend_inline_handlers(&doc);
        assert_eq!(
            document::get_attr(&banner, "onclick").as_deref(),
            Some("noop()")
        );
    }

    #[test]
    fn restore_leaves_unrelated_data_original_attributes_alone() {
        let doc = PageDocument::parse(
            "<html><body>\
             <div id=\"wizard\" data-original-onboarding-step=\"3\" onclick=\"next()\">w</div>\
             </body></html>",
        );
        let before = doc.html().unwrap();
        assert_eq!(suspend_inline_handlers(&doc), 1);
        assert_eq!(restore_inline_handlers(&doc), 1);
        assert_eq!(doc.html().unwrap(), before);
        let wizard = doc.element_by_id("wizard").unwrap();
        assert_eq!(
            document::get_attr(&wizard, "data-original-onboarding-step").as_deref(),
            Some("3")
        );
        assert_eq!(document::get_attr(&wizard, "onboarding-step"), None);
    }

    #[test]
    fn restore_with_nothing_stashed_is_a_no_op() {
        let doc = PageDocument::parse("<html><body><p>t</p></body></html>");
        assert_eq!(restore_inline_handlers(&doc), 0);
    }
}
