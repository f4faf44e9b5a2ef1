//! External tool client
//!
//! Every probe talks to the host through the [`Executor`] trait: bounded
//! process runs, raw TCP connects, long-lived line streams and file reads.
//! [`SystemExecutor`] is the real implementation; tests substitute scripted
//! executors.

mod executor;
mod stream;
mod system;

pub use executor::{Executor, MessageStream, ToolCommand, ToolError, ToolOutput, ToolResult};
pub use stream::ChildStream;
pub use system::SystemExecutor;
