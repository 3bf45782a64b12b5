pub mod api;
pub mod error;
pub mod time_value;
pub mod types;
pub mod waterfall;

pub use error::{RecordIssue, WaterfallError};
pub use types::*;

/// Standard result type for all waterfall engine operations
pub type EngineResult<T> = Result<T, WaterfallError>;
