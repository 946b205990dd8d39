//! Client-side state containers: caches of server state kept by a UI
//! host. Each slice is independent; the server response or gateway event
//! is the only thing that mutates it.

pub mod auth;
pub mod charts;
pub mod live;

/// Lifecycle of the most recent request a slice issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Failed,
}
