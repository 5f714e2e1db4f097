//! # xtuis
//!
//! A client for the [xtuis](https://wx.xtuis.cn) push notification service
//! which enforces the service's quotas locally.
//!
//! ## The Stack
//! A [`Client`] is a small [Tower](https://github.com/tower-rs/tower) stack:
//!
//! 1. **Rate Limiting**: [`RateLimitLayer`] consults every window of an
//!    [`xtuis_limit::LimiterSet`] in order (300 per day, then 10 per minute by
//!    default) and fails with [`Error::RateLimited`] on the first exhausted one.
//!    Nothing is sent in that case.
//! 2. **Transport**: [`HttpSender`] posts the form-encoded [`Payload`] to
//!    `{server_url}/{token}.send`. Non-200 answers become [`Error::Status`].
//!
//! ## Example
//!
//! ```no_run
//! use xtuis::Client;
//! use xtuis::Payload;
//!
//! # async fn run() -> Result<(), xtuis::Error> {
//! let client = Client::new("your-token")?;
//! match client.send(&Payload::new("build finished").with_desp("all green")).await {
//!     Err(e) if e.is_rate_limited() => { /* try again later */ }
//!     other => other?,
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod error;
mod layer;
mod payload;
mod sender;
mod service;


pub use client::Client;
pub use client::ClientBuilder;
pub use config::ClientConfig;
pub use error::Error;
pub use error::Result;
pub use layer::RateLimitLayer;
pub use payload::Payload;
pub use sender::HttpSender;
pub use service::RateLimitService;
pub use service::ResponseFuture;
pub use xtuis_limit;
