pub mod document;
pub mod events;
pub mod selection;

pub use document::PageDocument;
pub use events::{DispatchOutcome, EventState, PageEvent, PageEventData};
pub use selection::{RangePoint, SelectionState, TextRange};
