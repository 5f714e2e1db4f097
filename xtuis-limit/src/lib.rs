//! # xtuis-limit
//!
//! `xtuis-limit` enforces the xtuis service quotas locally, so that a client
//! never spends a request the server would reject.
//!
//! ## Key Concepts
//!
//! * **Fixed Window**: each limiter counts permitted operations inside a window
//!   of fixed length. The window is re-based on the call that observes its
//!   expiry.
//! * **Lazy Evaluation**: windows are expired at the moment of the request,
//!   there are no background worker threads or timers.
//! * **Limiter Trait**: a single `limit()` operation, so other algorithms can
//!   be plugged in without touching call sites.
//! * **Registry**: a [`LimiterSet`] consults named limiters in priority order.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use xtuis_limit::FixedWindow;
//! use xtuis_limit::Limiter;
//!
//! let minute = FixedWindow::new(10, Duration::from_secs(60));
//!
//! if minute.limit() {
//!     // Request allowed
//! }
//! ```

use std::fmt::Debug;

mod fixed_window;
mod registry;

pub use fixed_window::FixedWindow;
pub use quanta::Clock;
pub use registry::LimiterSet;
pub use registry::MAX_TIMES_PER_DAY;
pub use registry::MAX_TIMES_PER_MINUTE;
pub use registry::WindowSpec;

/// The core trait for all rate-limiting algorithms.
///
/// Limiters are shared across threads via `Arc`, so implementations are
/// expected to be `Send` and `Sync`.
pub trait Limiter: Debug {
    /// Attempts to consume one unit of quota.
    ///
    /// Returns `true` if the operation may proceed. This never blocks waiting
    /// for quota and never fails: exhaustion is reported as `false`.
    fn limit(&self) -> bool;
}
