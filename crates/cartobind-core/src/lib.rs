//! Core systems for cartobind.
//!
//! This crate provides the binding bridge between a callback-based native
//! object model and a declarative view layer:
//!
//! - **Signal/Slot System**: type-safe notification with weak subscriptions
//! - **Observable Properties**: current value plus change stream per property
//! - **Selection Sets**: which properties of a native object a view model binds
//! - **Binding Registry**: at most one subscription per selected property
//! - **Change Coalescer**: latest-value throttling onto the UI context
//! - **View-Model Facade**: registry → coalescer → single `refresh` signal
//! - **Operations**: completion callbacks turned into single-resolution futures
//! - **UI Context / Async Runtime**: one logical UI thread, results posted back
//!
//! # Facade Example
//!
//! ```
//! use cartobind_core::{
//!     BoundViewModel, ChangeHandler, ManualClock, ObservableProperty, ObservableSource,
//!     PropertyKey, PropertySet, Subscription, UiContext,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
//! enum Prop {
//!     Rotation,
//! }
//!
//! impl PropertyKey for Prop {
//!     const ALL: &'static [Self] = &[Prop::Rotation];
//!     fn name(self) -> &'static str {
//!         "rotation"
//!     }
//! }
//!
//! struct Compass {
//!     rotation: ObservableProperty<f64>,
//! }
//!
//! impl ObservableSource for Compass {
//!     type Key = Prop;
//!     fn observe(&self, _key: Prop, on_change: ChangeHandler) -> Subscription {
//!         self.rotation.observe(on_change)
//!     }
//! }
//!
//! let clock = ManualClock::new();
//! let ui = UiContext::with_clock(clock.clone());
//! let compass = Arc::new(Compass { rotation: ObservableProperty::new("rotation", 0.0) });
//! let vm = BoundViewModel::new(compass.clone(), PropertySet::all(), ui.clone(), Duration::from_millis(10));
//!
//! compass.rotation.set(45.0);
//! compass.rotation.set(90.0);
//! clock.advance(Duration::from_millis(10));
//! ui.process_pending();
//! assert_eq!(vm.refresh_count(), 1);
//! ```

pub mod async_runtime;
pub mod coalescer;
mod error;
pub mod logging;
pub mod observable;
pub mod operation;
pub mod registry;
pub mod selection;
pub mod signal;
pub mod subscription;
pub mod thread_check;
pub mod ui_context;
pub mod view_model;

pub use async_runtime::{AsyncRuntime, AsyncRuntimeConfig};
pub use coalescer::{Coalescer, CoalescerInput};
pub use error::{BridgeError, OperationAbandoned, Result, SchedulerError};
pub use observable::{ChangeHandler, ObservableProperty, ObservableSource};
pub use operation::{Completion, Operation, Resolver, operation};
pub use registry::BindingRegistry;
pub use selection::{PropertyKey, PropertySet};
pub use signal::{ConnectionId, Signal};
pub use subscription::{ChildSubscriptions, Subscription};
pub use ui_context::{Clock, ManualClock, ScheduledTaskId, SystemClock, UiContext};
pub use view_model::BoundViewModel;
