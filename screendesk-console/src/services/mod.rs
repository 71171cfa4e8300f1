//! Service layer: collaborator clients and the screening pipeline

pub mod backend_client;
pub mod batch_screener;
pub mod csv_reader;
pub mod index_client;

pub use backend_client::{BackendClient, BackendError, UploadFile};
pub use batch_screener::{aggregate, BatchScreener, NoopSink, ProgressSink, RowUpdate};
pub use index_client::{IndexClient, IndexError, MatchSource, TOP_K};
