//! Domain types shared by the reconciler, the presence rotation and the API.

mod state;
mod status;

pub use state::{
    EntityState, LiveEntry, LiveRoster, NotificationHandle, ReconcilerSnapshot, RosterEntry,
};
pub use status::{LiveStatus, StreamStatus};

#[cfg(test)]
pub(crate) use state::test_support;
