//! Task execution engine for taskdeck agents.
//!
//! Tasks are created with a fixed list of steps, driven to completion by a
//! driver that reports snapshots through a [`executor::TaskObserver`], and can
//! be paused cooperatively through a shared [`executor::CancellationRegistry`].

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod state;
pub mod task;
