//! Poll-diff-converge loop.
//!
//! Every tick observes the watched channels, decides one action per channel
//! and converges the notification channel so that exactly one notification
//! exists per live channel.

mod plan;
mod report;
mod service;

pub use plan::{Action, Observation, decide};
pub use report::{EntityReport, TickReport, Transition};
pub use service::{Reconciler, ReconcilerConfig};
