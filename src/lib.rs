//! devhub - per-user dev container workspaces on a Docker host
//!
//! devhub provisions one container per workspace, routes it through a
//! Traefik reverse proxy using container labels, and offers an interactive
//! loop for:
//!
//! - Creating workspaces with a generated password
//! - Starting and stopping workspaces
//! - Deleting workspaces
//! - Listing workspaces with their status and routing rule

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod password;
pub mod workspace;

pub use error::{DevhubError, Result};
