//! Data model for the screening console

pub mod audit;
pub mod batch;
pub mod flag;
pub mod imports;
pub mod screening_session;
pub mod search;

pub use audit::AuditLogEntry;
pub use batch::{BatchResult, CandidateData, CandidateMatch, RowRecord, NOT_APPLICABLE};
pub use flag::{ClearRecord, FlaggedResult};
pub use imports::{ImportRecord, UploadResponse};
pub use screening_session::{ScreeningProgress, ScreeningSession, ScreeningState};
pub use search::SearchHit;
