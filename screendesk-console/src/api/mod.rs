//! HTTP API handlers for the screening console

pub mod audit;
pub mod flags;
pub mod health;
pub mod imports;
pub mod reports;
pub mod screening;
pub mod search;
pub mod sse;
pub mod ui;

pub use audit::audit_routes;
pub use flags::flag_routes;
pub use health::health_routes;
pub use imports::import_routes;
pub use reports::report_routes;
pub use screening::screening_routes;
pub use search::search_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
