//! cirrus control plane library.
//!
//! This crate primarily ships a `control-plane` binary, but we expose a small
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod launch;
pub mod provider;
pub mod state;
pub mod zones;
