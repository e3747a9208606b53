//! Logging facilities for cartobind.
//!
//! cartobind uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::new("cartobind_core::coalescer=trace,info"))
//!     .init();
//! ```
//!
//! Every event carries one of the [`targets`] below, so a filter directive can
//! isolate a single subsystem.

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "cartobind_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "cartobind_core::signal";
    /// Observable property target.
    pub const PROPERTY: &str = "cartobind_core::property";
    /// UI scheduling context target.
    pub const UI_CONTEXT: &str = "cartobind_core::ui_context";
    /// Change coalescer target.
    pub const COALESCER: &str = "cartobind_core::coalescer";
    /// Binding registry target.
    pub const REGISTRY: &str = "cartobind_core::registry";
    /// View-model facade target.
    pub const VIEW_MODEL: &str = "cartobind_core::view_model";
    /// Callback-to-future bridge and async runtime target.
    pub const ASYNC: &str = "cartobind_core::async";
}
