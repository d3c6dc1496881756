//! AirTwin Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the AirTwin replay
//! loop to run against **Production** (tokio, real files) and **Simulation**
//! (virtual clock, in-memory datasets) environments.
//!
//! # Core Concept: The Reactor Pattern
//!
//! Everything the replay loop needs from the outside world is intercepted:
//! - Time (`now()`, `sleep()`)
//! - Dataset fetches (`fetch()`)
//!
//! With a virtual clock and in-memory sources, a full replay session becomes
//! a deterministic, instantly-completing computation.
//!
//! # Example
//!
//! ```ignore
//! use airtwin_env::{TwinContext, DataSource};
//!
//! async fn replay_loop<Ctx: TwinContext, Src: DataSource>(ctx: &Ctx, src: &Src) {
//!     let text = src.fetch("data/dataset1.csv").await;
//!     loop {
//!         ctx.sleep(Duration::from_secs(1)).await;
//!         tick();
//!     }
//! }
//! ```

mod context;
mod source;
mod error;
mod tokio_impl;

pub use context::TwinContext;
pub use source::DataSource;
pub use error::EnvError;
pub use tokio_impl::{FsSource, TokioContext};
