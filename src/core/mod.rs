//! Execution core: the trigger wait loop and the named registry.
//!
//! Internal modules:
//! - [`runner`]: drives a single [`Task`](crate::Task) (wait, execute, fan out);
//! - [`registry`]: [`Runner`], the name → task map with bulk run/cancel;
//! - [`builder`]: [`RunnerBuilder`] wiring config, bus and subscribers.

mod builder;
mod registry;
pub(crate) mod runner;

pub use builder::RunnerBuilder;
pub use registry::Runner;
