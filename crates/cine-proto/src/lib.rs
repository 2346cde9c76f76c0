//! Shared types for the CineMatch client: service payloads, navigable
//! locations, configuration and platform paths.

pub mod config;
pub mod model;
pub mod nav;
pub mod platform;
