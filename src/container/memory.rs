//! In-memory engine used by the tests
//!
//! Behaves like the Docker engine for the calls devhub makes and records every
//! mutating call so tests can assert that nothing reached the engine.

use super::config::{ContainerInfo, ContainerSpec, ContainerStatus};
use super::engine::ContainerEngine;
use crate::error::{DevhubError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

#[derive(Default)]
pub struct MemoryEngine {
    containers: RefCell<BTreeMap<String, ContainerInfo>>,
    specs: RefCell<BTreeMap<String, ContainerSpec>>,
    missing_images: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend an image has not been pulled
    pub fn without_image(mut self, image: &str) -> Self {
        self.missing_images.insert(image.to_string());
        self
    }

    /// Insert a container behind devhub's back
    pub fn insert(&self, info: ContainerInfo) {
        self.containers.borrow_mut().insert(info.name.clone(), info);
    }

    /// Mutating calls received so far, as `verb name`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn spec(&self, name: &str) -> Option<ContainerSpec> {
        self.specs.borrow().get(name).cloned()
    }

    pub fn status(&self, name: &str) -> Option<ContainerStatus> {
        self.containers.borrow().get(name).map(|c| c.status.clone())
    }

    fn record(&self, verb: &str, name: &str) {
        self.calls.borrow_mut().push(format!("{} {}", verb, name));
    }

    fn set_status(&self, name: &str, status: ContainerStatus) -> Result<()> {
        let mut containers = self.containers.borrow_mut();
        let container = containers
            .get_mut(name)
            .ok_or_else(|| DevhubError::ContainerNotFound(name.to_string()))?;
        container.status = status;
        Ok(())
    }
}

impl ContainerEngine for MemoryEngine {
    async fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>> {
        Ok(self.containers.borrow().get(name).cloned())
    }

    async fn list_labeled(&self, label: &str) -> Result<Vec<ContainerInfo>> {
        let (key, value) = label.split_once('=').unwrap_or((label, ""));
        Ok(self
            .containers
            .borrow()
            .values()
            .filter(|c| c.labels.get(key).map(String::as_str) == Some(value))
            .cloned()
            .collect())
    }

    async fn create_and_start(&self, spec: &ContainerSpec) -> Result<()> {
        self.record("create", &spec.name);

        if self.missing_images.contains(&spec.image) {
            return Err(DevhubError::ImageNotFound(spec.image.clone()));
        }
        if self.containers.borrow().contains_key(&spec.name) {
            return Err(DevhubError::ContainerExists(spec.name.clone()));
        }

        self.insert(ContainerInfo {
            name: spec.name.clone(),
            status: ContainerStatus::Running,
            labels: spec.labels.clone(),
        });
        self.specs.borrow_mut().insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.record("start", name);
        self.set_status(name, ContainerStatus::Running)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.record("stop", name);
        self.set_status(name, ContainerStatus::Exited)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.record("remove", name);
        let mut containers = self.containers.borrow_mut();
        match containers.get(name) {
            None => Err(DevhubError::ContainerNotFound(name.to_string())),
            Some(c) if c.status.is_running() => Err(DevhubError::Engine(format!(
                "cannot remove container \"/{}\": container is running",
                name
            ))),
            Some(_) => {
                containers.remove(name);
                Ok(())
            }
        }
    }
}
