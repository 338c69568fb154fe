use keyboard_types::{Key, Modifiers};
use kuchiki::NodeRef;
use url::Url;

/// Mouse button for synthetic pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Main,
    Auxiliary,
    Secondary,
}

#[derive(Debug, Clone)]
pub struct MouseData {
    pub button: MouseButton,
    pub mods: Modifiers,
}

impl Default for MouseData {
    fn default() -> Self {
        Self {
            button: MouseButton::Main,
            mods: Modifiers::empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyData {
    pub key: Key,
    pub mods: Modifiers,
}

/// Synthetic interaction events in the shape the shell delivers them.
#[derive(Debug, Clone)]
pub enum PageEventData {
    Click(MouseData),
    MouseDown(MouseData),
    MouseUp(MouseData),
    DblClick(MouseData),
    ContextMenu(MouseData),
    MouseOver(MouseData),
    MouseOut(MouseData),
    MouseEnter(MouseData),
    MouseLeave(MouseData),
    MouseMove(MouseData),
    KeyDown(KeyData),
    SelectionChange,
}

impl PageEventData {
    /// The DOM event-type string.
    pub fn name(&self) -> &'static str {
        match self {
            PageEventData::Click(_) => "click",
            PageEventData::MouseDown(_) => "mousedown",
            PageEventData::MouseUp(_) => "mouseup",
            PageEventData::DblClick(_) => "dblclick",
            PageEventData::ContextMenu(_) => "contextmenu",
            PageEventData::MouseOver(_) => "mouseover",
            PageEventData::MouseOut(_) => "mouseout",
            PageEventData::MouseEnter(_) => "mouseenter",
            PageEventData::MouseLeave(_) => "mouseleave",
            PageEventData::MouseMove(_) => "mousemove",
            PageEventData::KeyDown(_) => "keydown",
            PageEventData::SelectionChange => "selectionchange",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageEvent {
    pub target: NodeRef,
    pub data: PageEventData,
}

impl PageEvent {
    pub fn click(target: NodeRef) -> Self {
        Self {
            target,
            data: PageEventData::Click(MouseData::default()),
        }
    }

    pub fn mouse_up(target: NodeRef) -> Self {
        Self {
            target,
            data: PageEventData::MouseUp(MouseData::default()),
        }
    }

    pub fn key_down(target: NodeRef, key: Key) -> Self {
        Self {
            target,
            data: PageEventData::KeyDown(KeyData {
                key,
                mods: Modifiers::empty(),
            }),
        }
    }

    pub fn selection_change(target: NodeRef) -> Self {
        Self {
            target,
            data: PageEventData::SelectionChange,
        }
    }
}

/// Per-dispatch flags an interceptor can raise.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventState {
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl EventState {
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }
}

/// An inline `on*` handler the page would have run. Handlers are reported,
/// never executed; a host with a script runtime decides what to do with
/// them.
#[derive(Debug, Clone)]
pub struct InlineHandler {
    pub element: NodeRef,
    pub attribute: String,
    pub code: String,
}

/// A link whose navigation the engine intercepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedLink {
    pub href: String,
    pub resolved: Option<Url>,
}

/// What the host needs after a dispatch: whether to perform the native
/// default action, which inline handlers would have fired (propagation
/// order), and the link whose navigation was blocked.
#[derive(Debug, Default, Clone)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub inline_handlers: Vec<InlineHandler>,
    pub blocked_link: Option<BlockedLink>,
}

/// Inline handlers along the propagation path for `event_name`: the target
/// element first, then its ancestors.
pub fn collect_inline_handlers(target: &NodeRef, event_name: &str) -> Vec<InlineHandler> {
    let attribute = format!("on{event_name}");
    target
        .inclusive_ancestors()
        .filter_map(|node| {
            let code = {
                let element = node.as_element()?;
                let attributes = element.attributes.borrow();
                attributes.get(attribute.as_str()).map(str::to_string)?
            };
            Some(InlineHandler {
                element: node.clone(),
                attribute: attribute.clone(),
                code,
            })
        })
        .collect()
}
