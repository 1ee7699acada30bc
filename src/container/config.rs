//! Container configuration and observed state

use crate::config::RestartPolicy;
use std::collections::BTreeMap;

/// Container status as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    /// Container is created but has never run
    Created,
    /// Container is running
    Running,
    /// Container is paused
    Paused,
    /// Container is being restarted by its restart policy
    Restarting,
    /// Container is being removed
    Removing,
    /// Container has exited
    Exited,
    /// Container is in an error state
    Dead,
    /// Any state string this tool does not know
    Unknown(String),
}

impl ContainerStatus {
    /// Map the engine's state string
    pub fn parse(state: &str) -> Self {
        match state {
            "created" => ContainerStatus::Created,
            "running" => ContainerStatus::Running,
            "paused" => ContainerStatus::Paused,
            "restarting" => ContainerStatus::Restarting,
            "removing" => ContainerStatus::Removing,
            "exited" => ContainerStatus::Exited,
            "dead" => ContainerStatus::Dead,
            other => ContainerStatus::Unknown(other.to_string()),
        }
    }

    /// Whether `start` has nothing left to do
    pub fn is_running(&self) -> bool {
        *self == ContainerStatus::Running
    }

    /// Whether `stop` has nothing left to do
    pub fn is_stopped(&self) -> bool {
        matches!(
            self,
            ContainerStatus::Created | ContainerStatus::Exited | ContainerStatus::Dead
        )
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Created => write!(f, "created"),
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Paused => write!(f, "paused"),
            ContainerStatus::Restarting => write!(f, "restarting"),
            ContainerStatus::Removing => write!(f, "removing"),
            ContainerStatus::Exited => write!(f, "exited"),
            ContainerStatus::Dead => write!(f, "dead"),
            ContainerStatus::Unknown(state) => write!(f, "{}", state),
        }
    }
}

/// Everything the engine needs to create and start a container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    /// Container name
    pub name: String,
    /// Image name/tag
    pub image: String,
    /// Allocate a TTY
    pub tty: bool,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// Container labels
    pub labels: BTreeMap<String, String>,
    /// Container ports published on an engine-chosen host port
    pub published_ports: Vec<u16>,
    /// Volume mounts
    pub volumes: Vec<VolumeMount>,
    /// Network to attach to
    pub network: String,
    /// Resource limits
    pub resources: ResourceLimits,
    /// Restart policy
    pub restart_policy: RestartPolicy,
}

impl ContainerSpec {
    /// Create a new container spec
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            tty: false,
            env: BTreeMap::new(),
            labels: BTreeMap::new(),
            published_ports: Vec::new(),
            volumes: Vec::new(),
            network: String::new(),
            resources: ResourceLimits::default(),
            restart_policy: RestartPolicy::default(),
        }
    }

    /// Allocate a TTY
    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    /// Add environment variable
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Add labels
    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Publish a container port
    pub fn publish(mut self, container_port: u16) -> Self {
        self.published_ports.push(container_port);
        self
    }

    /// Add read-write volume mount
    pub fn volume(mut self, host_path: &str, container_path: &str) -> Self {
        self.volumes.push(VolumeMount {
            host_path: host_path.to_string(),
            container_path: container_path.to_string(),
        });
        self
    }

    /// Set network
    pub fn network(mut self, network: &str) -> Self {
        self.network = network.to_string();
        self
    }

    /// Set resource limits
    pub fn resources(mut self, resources: ResourceLimits) -> Self {
        self.resources = resources;
        self
    }

    /// Set restart policy
    pub fn restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }
}

/// Volume mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host_path: String,
    pub container_path: String,
}

impl VolumeMount {
    /// Read-write bind string, `host:container:rw`
    pub fn bind(&self) -> String {
        format!("{}:{}:rw", self.host_path, self.container_path)
    }
}

/// Resource limits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Memory limit in bytes
    pub memory_limit: Option<i64>,
    /// CPU share in units of 1e-9 CPUs
    pub nano_cpus: Option<i64>,
    /// PIDs limit
    pub pids_limit: Option<i64>,
}

/// A container as currently seen by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    /// Container name, without the engine's leading `/`
    pub name: String,
    /// Current status
    pub status: ContainerStatus,
    /// Container labels
    pub labels: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for state in ["created", "running", "paused", "restarting", "removing", "exited", "dead"] {
            assert_eq!(ContainerStatus::parse(state).to_string(), state);
        }
        assert_eq!(
            ContainerStatus::parse("weird"),
            ContainerStatus::Unknown("weird".to_string())
        );
    }

    #[test]
    fn test_status_targets() {
        assert!(ContainerStatus::Running.is_running());
        assert!(!ContainerStatus::Running.is_stopped());
        assert!(ContainerStatus::Exited.is_stopped());
        assert!(ContainerStatus::Created.is_stopped());
        assert!(!ContainerStatus::Paused.is_stopped());
        assert!(!ContainerStatus::Paused.is_running());
    }

    #[test]
    fn test_spec_builder() {
        let spec = ContainerSpec::new("dev_alice", "codercom/code-server:latest")
            .tty(true)
            .env("PASSWORD", "secret")
            .publish(8080)
            .volume("/home/code/alice", "/home/coder/project")
            .network("devnet")
            .restart_policy(RestartPolicy::UnlessStopped);

        assert!(spec.tty);
        assert_eq!(spec.env.get("PASSWORD"), Some(&"secret".to_string()));
        assert_eq!(spec.published_ports, vec![8080]);
        assert_eq!(
            spec.volumes[0].bind(),
            "/home/code/alice:/home/coder/project:rw"
        );
        assert_eq!(spec.network, "devnet");
        assert_eq!(spec.restart_policy, RestartPolicy::UnlessStopped);
    }
}
