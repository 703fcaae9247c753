//! HTTP gateway for Rusty Canvas.
//!
//! Owns the canvas registry, maps the JSON API onto registry operations and
//! drawing calls, and serves it with axum.

pub mod error;
pub mod events;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use events::{ExportEvent, ExportObserver, LogExportObserver};
pub use registry::{CanvasRegistry, NewCanvas};
pub use server::{build_router, start_gateway};
pub use state::GatewayState;
