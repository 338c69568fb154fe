// Library exports for embedders and tests

pub mod color;
pub mod highlight;
pub mod messages;
pub mod page;
pub mod session;

// Re-export commonly used types
pub use color::HighlightColor;
pub use highlight::HighlightEngine;
pub use messages::{PanelCommand, SelectionMode};
pub use page::events::{DispatchOutcome, PageEvent, PageEventData};
pub use session::PageSession;
