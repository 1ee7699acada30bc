//! The container engine seen from devhub
//!
//! Only the handful of calls the workspace operations need. Implementations
//! translate engine faults into [`DevhubError`](crate::error::DevhubError)
//! variants:
//!
//! - a missing image on create becomes `ImageNotFound`
//! - a name conflict on create becomes `ContainerExists`
//! - a missing container becomes `ContainerNotFound`
//! - everything else becomes `Engine` carrying the engine's own message

use super::config::{ContainerInfo, ContainerSpec};
use crate::error::Result;

/// Operations on an external container engine
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Look up a container by exact name, including stopped ones
    async fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>>;

    /// All containers (including stopped) carrying a `key=value` label
    async fn list_labeled(&self, label: &str) -> Result<Vec<ContainerInfo>>;

    /// Create a container and start it
    async fn create_and_start(&self, spec: &ContainerSpec) -> Result<()>;

    /// Start a stopped container
    async fn start(&self, name: &str) -> Result<()>;

    /// Stop a running container
    async fn stop(&self, name: &str) -> Result<()>;

    /// Remove a stopped container
    async fn remove(&self, name: &str) -> Result<()>;
}
