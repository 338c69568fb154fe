use std::path::Path;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use keyboard_types::Key;
use kuchiki::NodeRef;
use tracing::debug;
use url::Url;

use crate::highlight::{indicator, ActivateOptions, HighlightEngine};
use crate::messages::{PanelCommand, SelectionMode};
use crate::page::document::PageDocument;
use crate::page::events::{self, DispatchOutcome, EventState, PageEvent};
use crate::page::selection::{SelectionState, TextRange};

/// The embedding surface, one per page: owns the document, the engine, and
/// the current selection, and routes panel commands and interaction events.
pub struct PageSession {
    doc: PageDocument,
    engine: HighlightEngine,
    selection: SelectionState,
}

impl PageSession {
    pub fn new(html: &str) -> Self {
        Self::build(html, None)
    }

    pub fn with_base_url(html: &str, base_url: Url) -> Self {
        Self::build(html, Some(base_url))
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read page file {}", path.display()))?;
        let base_url = Url::from_file_path(path).ok();
        Ok(Self::build(&html, base_url))
    }

    fn build(html: &str, base_url: Option<Url>) -> Self {
        let doc = PageDocument::parse(html);
        indicator::install_stylesheet(&doc);
        Self {
            doc,
            engine: HighlightEngine::new(base_url),
            selection: SelectionState::default(),
        }
    }

    /// Route one popup-panel command. A bad color fails the command and
    /// leaves the engine untouched.
    pub fn apply_command(&mut self, command: PanelCommand) -> Result<()> {
        match command {
            PanelCommand::StartHighlighting {
                color,
                opacity,
                selection_mode,
            } => {
                let color = color
                    .as_deref()
                    .map(str::parse)
                    .transpose()
                    .context("invalid highlight color in startHighlighting")?;
                self.engine.activate(
                    &self.doc,
                    ActivateOptions {
                        color,
                        opacity,
                        mode: selection_mode,
                    },
                );
            }
            PanelCommand::ClearHighlights => {
                self.engine.clear_highlights(&self.doc);
            }
        }
        Ok(())
    }

    /// The dispatch pipeline: the engine's capture hooks run first; unless
    /// propagation was stopped, the page's inline handlers along the path
    /// are collected for the host.
    pub fn dispatch(&mut self, event: PageEvent) -> DispatchOutcome {
        let mut state = EventState::default();
        let blocked_link =
            self.engine
                .intercept(&event, &mut state, &self.doc, &mut self.selection);

        let inline_handlers = if state.propagation_stopped() {
            Vec::new()
        } else {
            events::collect_inline_handlers(&event.target, event.data.name())
        };

        debug!(
            target = "session",
            event = event.data.name(),
            default_prevented = state.default_prevented(),
            handlers = inline_handlers.len(),
            "dispatched event"
        );

        DispatchOutcome {
            default_prevented: state.default_prevented(),
            propagation_stopped: state.propagation_stopped(),
            inline_handlers,
            blocked_link,
        }
    }

    /// Set the current selection and fire `selectionchange`.
    pub fn set_selection(&mut self, range: TextRange) -> DispatchOutcome {
        let target = range.common_ancestor();
        self.selection.set(range);
        self.dispatch(PageEvent::selection_change(target))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn click(&mut self, id: &str) -> Result<DispatchOutcome> {
        let target = self.require_element(id)?;
        Ok(self.dispatch(PageEvent::click(target)))
    }

    pub fn mouse_up(&mut self, id: &str) -> Result<DispatchOutcome> {
        let target = self.require_element(id)?;
        Ok(self.dispatch(PageEvent::mouse_up(target)))
    }

    pub fn press_key(&mut self, key: Key) -> DispatchOutcome {
        let target = self
            .doc
            .body()
            .unwrap_or_else(|| self.doc.root().clone());
        self.dispatch(PageEvent::key_down(target, key))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.doc.element_by_id(id)
    }

    pub fn document(&self) -> &PageDocument {
        &self.doc
    }

    pub fn document_html(&self) -> Result<String> {
        self.doc.html().context("failed to serialize page")
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn mode(&self) -> SelectionMode {
        self.engine.mode()
    }

    pub fn highlight_count(&self) -> usize {
        self.engine.highlight_count()
    }

    fn require_element(&self, id: &str) -> Result<NodeRef> {
        self.doc
            .element_by_id(id)
            .ok_or_else(|| anyhow!("no element with id {id:?}"))
    }
}
