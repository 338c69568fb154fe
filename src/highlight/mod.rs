//! The behavior controller: mode state machine, capture-phase interception,
//! marking, and clearing.

pub mod indicator;
pub mod interactivity;

use keyboard_types::Key;
use kuchiki::NodeRef;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

pub use self::indicator::{HIGHLIGHT_CLASS, INPUT_WRAPPER_CLASS};

use crate::color::{HighlightColor, DEFAULT_OPACITY};
use crate::messages::SelectionMode;
use crate::page::document::{self, PageDocument};
use crate::page::events::{BlockedLink, EventState, PageEvent, PageEventData};
use crate::page::selection::{SelectionError, SelectionState, TextRange};

pub const HIGHLIGHT_ID_ATTR: &str = "data-highlight-id";

#[derive(Debug, Clone, Copy)]
pub struct HighlightStyle {
    pub color: HighlightColor,
    pub opacity: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: HighlightColor::default(),
            opacity: DEFAULT_OPACITY,
        }
    }
}

/// Settings carried by `startHighlighting`; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivateOptions {
    pub color: Option<HighlightColor>,
    pub opacity: Option<f32>,
    pub mode: Option<SelectionMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Element,
    TextSpan,
    InputWrapper,
}

struct HighlightRecord {
    id: Uuid,
    node: NodeRef,
    kind: HighlightKind,
}

/// Which document-level hooks are installed. The flags mirror what
/// `addEventListener` calls the content script would have made.
#[derive(Debug, Clone, Copy, Default)]
struct ListenerSet {
    keydown: bool,
    capture_click: bool,
    capture_mouseup: bool,
    mouse_blockers: bool,
    link_guard: bool,
    selection_watch: bool,
}

impl ListenerSet {
    fn for_mode(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Element => Self {
                keydown: true,
                capture_click: true,
                capture_mouseup: true,
                mouse_blockers: true,
                link_guard: false,
                selection_watch: false,
            },
            SelectionMode::Text => Self {
                keydown: true,
                capture_click: false,
                capture_mouseup: true,
                mouse_blockers: false,
                link_guard: true,
                selection_watch: true,
            },
        }
    }
}

pub struct HighlightEngine {
    active: bool,
    mode: SelectionMode,
    style: HighlightStyle,
    listeners: ListenerSet,
    registry: Vec<HighlightRecord>,
    saved_body_cursor: Option<Option<String>>,
    handlers_suspended: bool,
    base_url: Option<Url>,
}

impl HighlightEngine {
    pub fn new(base_url: Option<Url>) -> Self {
        Self {
            active: false,
            mode: SelectionMode::default(),
            style: HighlightStyle::default(),
            listeners: ListenerSet::default(),
            registry: Vec::new(),
            saved_body_cursor: None,
            handlers_suspended: false,
            base_url,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn style(&self) -> HighlightStyle {
        self.style
    }

    pub fn highlight_count(&self) -> usize {
        self.registry.len()
    }

    /// Enter the mode, or refresh settings in place when already active.
    pub fn activate(&mut self, doc: &PageDocument, options: ActivateOptions) {
        if let Some(color) = options.color {
            self.style.color = color;
        }
        if let Some(opacity) = options.opacity {
            self.style.opacity = opacity.clamp(0.0, 1.0);
        }
        let requested_mode = options.mode.unwrap_or(self.mode);

        if self.active {
            if requested_mode != self.mode {
                self.switch_mode(doc, requested_mode);
            }
            indicator::update_label(doc, self.mode);
            info!(
                target = "highlight",
                mode = self.mode.label(),
                color = %self.style.color,
                "refreshed active highlighting mode"
            );
            return;
        }

        self.mode = requested_mode;
        if let Some(body) = doc.body() {
            self.saved_body_cursor = Some(document::style_property(&body, "cursor"));
            document::set_style_property(&body, "cursor", "pointer");
        }
        indicator::install(doc, self.mode);
        self.listeners = ListenerSet::for_mode(self.mode);
        if self.mode == SelectionMode::Element {
            let stashed = interactivity::suspend_inline_handlers(doc);
            self.handlers_suspended = true;
            debug!(target = "highlight", stashed, "suspended inline handlers");
        }
        self.active = true;
        info!(
            target = "highlight",
            mode = self.mode.label(),
            color = %self.style.color,
            opacity = self.style.opacity,
            "highlighting mode activated"
        );
    }

    /// Leave the mode. Existing highlights are kept.
    pub fn deactivate(&mut self, doc: &PageDocument) {
        if !self.active {
            return;
        }
        self.listeners = ListenerSet::default();
        if self.handlers_suspended {
            let restored = interactivity::restore_inline_handlers(doc);
            self.handlers_suspended = false;
            debug!(target = "highlight", restored, "restored inline handlers");
        }
        if let Some(body) = doc.body() {
            match self.saved_body_cursor.take() {
                Some(Some(previous)) => document::set_style_property(&body, "cursor", &previous),
                Some(None) => document::remove_style_property(&body, "cursor"),
                None => {}
            }
        }
        indicator::remove(doc);
        self.active = false;
        info!(target = "highlight", "highlighting mode deactivated");
    }

    /// Element↔Text while active.
    pub fn toggle_mode(&mut self, doc: &PageDocument) {
        if !self.active {
            return;
        }
        let next = match self.mode {
            SelectionMode::Element => SelectionMode::Text,
            SelectionMode::Text => SelectionMode::Element,
        };
        self.switch_mode(doc, next);
        indicator::update_label(doc, self.mode);
        info!(target = "highlight", mode = self.mode.label(), "selection mode toggled");
    }

    fn switch_mode(&mut self, doc: &PageDocument, next: SelectionMode) {
        if next == self.mode {
            return;
        }
        match next {
            SelectionMode::Element => {
                let stashed = interactivity::suspend_inline_handlers(doc);
                self.handlers_suspended = true;
                debug!(target = "highlight", stashed, "suspended inline handlers");
            }
            SelectionMode::Text => {
                if self.handlers_suspended {
                    let restored = interactivity::restore_inline_handlers(doc);
                    self.handlers_suspended = false;
                    debug!(target = "highlight", restored, "restored inline handlers");
                }
            }
        }
        self.mode = next;
        self.listeners = ListenerSet::for_mode(next);
    }

    /// The capture-phase hook chain. Hooks run in the order the listeners
    /// were registered; `stop_immediate_propagation` halts the rest of the
    /// chain.
    pub fn intercept(
        &mut self,
        event: &PageEvent,
        state: &mut EventState,
        doc: &PageDocument,
        selection: &mut SelectionState,
    ) -> Option<BlockedLink> {
        let mut blocked_link = None;

        if self.listeners.keydown && !state.immediate_propagation_stopped() {
            if let PageEventData::KeyDown(key) = &event.data {
                match key.key {
                    Key::Escape => {
                        self.deactivate(doc);
                        return None;
                    }
                    Key::Tab => {
                        state.prevent_default();
                        self.toggle_mode(doc);
                    }
                    _ => {}
                }
            }
        }

        if self.listeners.link_guard && !state.immediate_propagation_stopped() {
            if matches!(
                event.data,
                PageEventData::Click(_) | PageEventData::MouseUp(_)
            ) {
                if let Some(anchor) = document::ancestor_with_tag(&event.target, "a") {
                    state.prevent_default();
                    state.stop_propagation();
                    let href = document::get_attr(&anchor, "href").unwrap_or_default();
                    let resolved = self.resolve_href(&href);
                    info!(target = "highlight", href = %href, "blocked link navigation");
                    blocked_link = Some(BlockedLink { href, resolved });
                }
            }
        }

        if self.listeners.capture_mouseup && !state.immediate_propagation_stopped() {
            if let PageEventData::MouseUp(_) = event.data {
                match self.mode {
                    SelectionMode::Element => {
                        if !indicator::is_inside(&event.target) {
                            self.highlight_element(doc, &event.target);
                        }
                        state.prevent_default();
                        state.stop_immediate_propagation();
                    }
                    SelectionMode::Text => {
                        let nonempty = selection
                            .current()
                            .map_or(false, |range| !range.text().trim().is_empty());
                        if nonempty {
                            if let Some(range) = selection.current().cloned() {
                                self.highlight_selection(doc, &range);
                            }
                            selection.clear();
                        }
                    }
                }
            }
        }

        if self.listeners.capture_click && !state.immediate_propagation_stopped() {
            if let PageEventData::Click(_) = event.data {
                state.prevent_default();
                state.stop_immediate_propagation();
            }
        }

        if self.listeners.mouse_blockers && !state.immediate_propagation_stopped() {
            match event.data {
                PageEventData::MouseDown(_)
                | PageEventData::DblClick(_)
                | PageEventData::ContextMenu(_)
                | PageEventData::MouseOver(_)
                | PageEventData::MouseOut(_)
                | PageEventData::MouseEnter(_)
                | PageEventData::MouseLeave(_)
                | PageEventData::MouseMove(_) => {
                    state.prevent_default();
                    state.stop_immediate_propagation();
                }
                _ => {}
            }
        }

        if self.listeners.selection_watch {
            if let PageEventData::SelectionChange = event.data {
                debug!(target = "highlight", "selection changed");
            }
        }

        blocked_link
    }

    fn resolve_href(&self, href: &str) -> Option<Url> {
        if href.is_empty() {
            return None;
        }
        if let Ok(absolute) = Url::parse(href) {
            return Some(absolute);
        }
        self.base_url.as_ref().and_then(|base| base.join(href).ok())
    }

    /// Mark an element. `input`/`textarea` targets get a wrapper div (reused
    /// if already present) so the mark survives the control's own painting.
    pub fn highlight_element(&mut self, _doc: &PageDocument, node: &NodeRef) {
        if indicator::is_inside(node) {
            return;
        }
        let target = match node.as_element() {
            Some(_) => node.clone(),
            // Text-node targets mark their parent element.
            None => match node.parent().filter(|p| p.as_element().is_some()) {
                Some(parent) => parent,
                None => return,
            },
        };

        let tag = document::tag_name(&target).unwrap_or_default();
        if tag == "input" || tag == "textarea" {
            let wrapper = match target
                .parent()
                .filter(|parent| document::has_class(parent, INPUT_WRAPPER_CLASS))
            {
                Some(existing) => existing,
                None => {
                    let wrapper = document::create_element("div");
                    document::add_class(&wrapper, INPUT_WRAPPER_CLASS);
                    document::wrap_node(&target, &wrapper);
                    wrapper
                }
            };
            self.mark(&wrapper, HighlightKind::InputWrapper);
        } else {
            self.mark(&target, HighlightKind::Element);
        }
    }

    /// Wrap a text selection in a marked span; a range crossing node
    /// boundaries falls back to marking the common ancestor element.
    pub fn highlight_selection(&mut self, doc: &PageDocument, range: &TextRange) {
        let span = document::create_element("span");
        match range.surround(&span) {
            Ok(()) => {
                self.mark(&span, HighlightKind::TextSpan);
            }
            Err(SelectionError::CrossesNodeBoundary) => {
                let ancestor = range.common_ancestor();
                let element = if ancestor.as_element().is_some() {
                    Some(ancestor)
                } else {
                    ancestor.parent().filter(|p| p.as_element().is_some())
                };
                if let Some(element) = element {
                    self.highlight_element(doc, &element);
                }
            }
            Err(err) => {
                warn!(target = "highlight", error = %err, "could not wrap selection");
            }
        }
    }

    fn mark(&mut self, node: &NodeRef, kind: HighlightKind) {
        let css = self.style.color.css_rgba(self.style.opacity);
        document::set_style_property(node, "background-color", &css);
        document::add_class(node, HIGHLIGHT_CLASS);

        if document::get_attr(node, HIGHLIGHT_ID_ATTR).is_some() {
            debug!(target = "highlight", "refreshed existing mark");
            return;
        }
        let id = Uuid::new_v4();
        document::set_attr(node, HIGHLIGHT_ID_ATTR, &id.to_string());
        self.registry.push(HighlightRecord {
            id,
            node: node.clone(),
            kind,
        });
        debug!(target = "highlight", id = %id, ?kind, "marked node");
    }

    /// Remove every mark. Works whether or not the mode is active and
    /// leaves an active mode active.
    pub fn clear_highlights(&mut self, _doc: &PageDocument) -> usize {
        let records = std::mem::take(&mut self.registry);
        let count = records.len();
        for record in records {
            match record.kind {
                HighlightKind::TextSpan | HighlightKind::InputWrapper => {
                    document::unwrap_node(&record.node);
                }
                HighlightKind::Element => {
                    document::remove_class(&record.node, HIGHLIGHT_CLASS);
                    document::remove_style_property(&record.node, "background-color");
                    document::remove_attr(&record.node, HIGHLIGHT_ID_ATTR);
                }
            }
        }
        if count > 0 {
            info!(target = "highlight", cleared = count, "cleared highlights");
        }
        count
    }

    /// Highlight ids currently in the registry, in marking order.
    pub fn highlight_ids(&self) -> Vec<Uuid> {
        self.registry.iter().map(|record| record.id).collect()
    }
}
