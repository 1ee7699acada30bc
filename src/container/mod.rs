//! Container engine access
//!
//! This module describes the containers devhub asks for, the engine
//! operations it needs, and the Docker implementation of those operations.

pub mod config;
pub mod docker;
pub mod engine;
#[cfg(test)]
pub mod memory;

pub use config::{ContainerInfo, ContainerSpec, ContainerStatus, ResourceLimits, VolumeMount};
pub use docker::DockerEngine;
pub use engine::ContainerEngine;
