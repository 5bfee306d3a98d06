//! The asynchronous single-resolution container.
//!
//! - [`cell`]: the write-once cell and its resolution protocol
//! - [`dispatch`]: trampolined continuation delivery
//! - [`future`](mod@future): `IntoFuture` bridge for async/await consumers

pub mod cell;
pub(crate) mod dispatch;
pub mod future;

pub use cell::Deferred;
pub use future::DeferredFuture;
