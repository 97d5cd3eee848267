//! Shared library surface for the tracker server and its tests.

pub mod api;
pub mod config;
pub mod error;
pub mod loops;
pub mod notify;
pub mod state;
