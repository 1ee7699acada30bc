//! Workspace lifecycle management

use super::{project_filter, routing_rule, workspace_name, Workspace, NO_RULE, PASSWORD_ENV};
use crate::config::Settings;
use crate::container::{ContainerEngine, ContainerSpec, ContainerStatus, ResourceLimits};
use crate::error::{DevhubError, Result};
use crate::password::generate_password;
use tracing::{debug, info};

/// A freshly created workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub name: String,
    /// Generated password, shown once and never stored
    pub password: String,
    pub urls: Vec<String>,
}

impl std::fmt::Display for Provisioned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Created '{}' | pass {}", self.name, self.password)?;
        for url in &self.urls {
            write!(f, " | {}", url)?;
        }
        Ok(())
    }
}

/// Result of a start or stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The engine was asked to change state
    Changed,
    /// The container was already in the requested state
    Unchanged,
}

/// One line of `list` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    pub name: String,
    pub status: ContainerStatus,
    pub rule: String,
}

impl std::fmt::Display for WorkspaceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " - {:<20} | {:<10} | {}",
            self.name,
            self.status.to_string(),
            self.rule
        )
    }
}

/// Workspace manager, driving one container engine
pub struct WorkspaceManager<'a, E> {
    engine: E,
    settings: &'a Settings,
}

impl<'a, E: ContainerEngine> WorkspaceManager<'a, E> {
    /// Create a new workspace manager
    pub fn new(engine: E, settings: &'a Settings) -> Self {
        Self { engine, settings }
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    /// Create and start a workspace container
    ///
    /// An existing container with the same name, running or not, is left
    /// untouched and reported as [`DevhubError::ContainerExists`]. The lookup
    /// and the creation are not atomic; a concurrent creation is still caught
    /// by the engine's name uniqueness.
    pub async fn create(&self, name: &str) -> Result<Provisioned> {
        let workspace = Workspace::new(name)?;
        let container_name = workspace.container_name();

        if self.engine.inspect(&container_name).await?.is_some() {
            return Err(DevhubError::ContainerExists(container_name));
        }

        let password = generate_password(self.settings.password_length);
        let spec = self.container_spec(&workspace, &password)?;
        debug!("Creating {} from {}", container_name, spec.image);

        self.engine.create_and_start(&spec).await?;
        info!("Workspace {} created", workspace.name());

        Ok(Provisioned {
            name: workspace.name().to_string(),
            password,
            urls: workspace.urls(self.settings),
        })
    }

    /// Stop and remove a workspace container
    pub async fn delete(&self, name: &str) -> Result<()> {
        let workspace = Workspace::new(name)?;
        let container_name = workspace.container_name();

        let container = self
            .engine
            .inspect(&container_name)
            .await?
            .ok_or_else(|| DevhubError::ContainerNotFound(workspace.name().to_string()))?;

        if !container.status.is_stopped() {
            self.engine.stop(&container_name).await?;
        }
        self.engine.remove(&container_name).await?;
        info!("Workspace {} deleted", workspace.name());

        Ok(())
    }

    /// Start a stopped workspace
    pub async fn start(&self, name: &str) -> Result<Transition> {
        let workspace = Workspace::new(name)?;
        let container_name = workspace.container_name();

        let container = self
            .engine
            .inspect(&container_name)
            .await?
            .ok_or_else(|| DevhubError::ContainerNotFound(workspace.name().to_string()))?;

        if container.status.is_running() {
            return Ok(Transition::Unchanged);
        }

        self.engine.start(&container_name).await?;
        info!("Workspace {} started", workspace.name());
        Ok(Transition::Changed)
    }

    /// Stop a running workspace
    pub async fn stop(&self, name: &str) -> Result<Transition> {
        let workspace = Workspace::new(name)?;
        let container_name = workspace.container_name();

        let container = self
            .engine
            .inspect(&container_name)
            .await?
            .ok_or_else(|| DevhubError::ContainerNotFound(workspace.name().to_string()))?;

        if container.status.is_stopped() {
            return Ok(Transition::Unchanged);
        }

        self.engine.stop(&container_name).await?;
        info!("Workspace {} stopped", workspace.name());
        Ok(Transition::Changed)
    }

    /// List all workspaces, including stopped ones, sorted by name
    pub async fn list(&self) -> Result<Vec<WorkspaceEntry>> {
        let containers = self.engine.list_labeled(&project_filter()).await?;

        let mut entries: Vec<WorkspaceEntry> = containers
            .into_iter()
            .map(|c| {
                let name = workspace_name(&c.name).to_string();
                let rule = routing_rule(&c.labels, &name)
                    .unwrap_or(NO_RULE)
                    .to_string();
                WorkspaceEntry {
                    name,
                    status: c.status,
                    rule,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    fn container_spec(&self, workspace: &Workspace, password: &str) -> Result<ContainerSpec> {
        let settings = self.settings;

        let mut spec = ContainerSpec::new(&workspace.container_name(), &settings.image)
            .tty(true)
            .env(PASSWORD_ENV, password)
            .labels(workspace.labels(settings))
            .publish(settings.service_port);

        if let Some(app) = &settings.app {
            spec = spec.publish(app.port);
        }

        Ok(spec
            .volume(&workspace.host_dir(settings), &settings.project_path)
            .network(&settings.network)
            .resources(ResourceLimits {
                memory_limit: Some(settings.memory_bytes()?),
                nano_cpus: Some(settings.nano_cpus),
                pids_limit: Some(settings.pids_limit),
            })
            .restart_policy(settings.restart_policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppPort, RestartPolicy};
    use crate::container::memory::MemoryEngine;
    use crate::container::ContainerInfo;
    use std::collections::BTreeMap;

    fn settings() -> Settings {
        Settings::from_json(
            r#"{
                "base_domain": "dev.example.org",
                "mem_limit": "512m",
                "nano_cpus": 500000000,
                "pids_limit": 100,
                "restart_policy": "unless-stopped"
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_provisions_container() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);

        let created = manager.create("alice").await.unwrap();
        assert_eq!(created.name, "alice");
        assert_eq!(created.password.len(), 10);
        assert_eq!(created.urls, vec!["https://alice.dev.example.org"]);
        assert_eq!(
            created.to_string(),
            format!(
                "Created 'alice' | pass {} | https://alice.dev.example.org",
                created.password
            )
        );

        let spec = manager.engine().spec("dev_alice").unwrap();
        assert_eq!(spec.image, "codercom/code-server:latest");
        assert!(spec.tty);
        assert_eq!(spec.env.get("PASSWORD"), Some(&created.password));
        assert_eq!(spec.published_ports, vec![8080]);
        assert_eq!(spec.volumes[0].bind(), "/home/code/alice:/home/coder/project:rw");
        assert_eq!(spec.network, "devnet");
        assert_eq!(spec.resources.memory_limit, Some(536870912));
        assert_eq!(spec.resources.nano_cpus, Some(500_000_000));
        assert_eq!(spec.resources.pids_limit, Some(100));
        assert_eq!(spec.restart_policy, RestartPolicy::UnlessStopped);
        assert_eq!(spec.labels.get("project"), Some(&"devhub".to_string()));
    }

    #[tokio::test]
    async fn test_create_with_app_port() {
        let mut settings = settings();
        settings.app = Some(AppPort {
            port: 3000,
            suffix: "app".to_string(),
        });
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);

        let created = manager.create("alice").await.unwrap();
        assert_eq!(
            created.urls,
            vec![
                "https://alice.dev.example.org",
                "https://alice-app.dev.example.org"
            ]
        );
        let spec = manager.engine().spec("dev_alice").unwrap();
        assert_eq!(spec.published_ports, vec![8080, 3000]);
    }

    #[tokio::test]
    async fn test_create_twice_is_noop() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);

        let first = manager.create("alice").await.unwrap();
        let second = manager.create("alice").await;

        assert!(matches!(second, Err(DevhubError::ContainerExists(ref n)) if n == "dev_alice"));
        assert_eq!(manager.engine().calls(), vec!["create dev_alice"]);
        assert_eq!(
            manager.engine().spec("dev_alice").unwrap().env["PASSWORD"],
            first.password
        );
    }

    #[tokio::test]
    async fn test_create_existing_stopped_container_is_noop() {
        let settings = settings();
        let engine = MemoryEngine::new();
        engine.insert(ContainerInfo {
            name: "dev_alice".to_string(),
            status: ContainerStatus::Exited,
            labels: BTreeMap::new(),
        });
        let manager = WorkspaceManager::new(engine, &settings);

        assert!(matches!(
            manager.create("alice").await,
            Err(DevhubError::ContainerExists(_))
        ));
        assert!(manager.engine().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_missing_image() {
        let settings = settings();
        let engine = MemoryEngine::new().without_image("codercom/code-server:latest");
        let manager = WorkspaceManager::new(engine, &settings);

        let err = manager.create("alice").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Docker image 'codercom/code-server:latest' not found. Try: docker pull codercom/code-server:latest"
        );
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_name_never_reaches_engine() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);

        assert!(matches!(
            manager.create("Bad_Name").await,
            Err(DevhubError::InvalidWorkspaceName(_))
        ));
        assert!(manager.engine().calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_workspace_not_found() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);

        assert!(matches!(
            manager.delete("ghost").await,
            Err(DevhubError::ContainerNotFound(_))
        ));
        assert!(matches!(
            manager.start("ghost").await,
            Err(DevhubError::ContainerNotFound(_))
        ));
        assert!(matches!(
            manager.stop("ghost").await,
            Err(DevhubError::ContainerNotFound(_))
        ));
        assert!(manager.engine().calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_after_create() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);
        manager.create("alice").await.unwrap();

        let entries = manager.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "alice");
        assert_eq!(entries[0].status, ContainerStatus::Running);
        assert_eq!(entries[0].rule, "Host(`alice.dev.example.org`)");
        assert_eq!(
            entries[0].to_string(),
            " - alice                | running    | Host(`alice.dev.example.org`)"
        );
    }

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let settings = settings();
        let engine = MemoryEngine::new();
        let mut project = BTreeMap::new();
        project.insert("project".to_string(), "devhub".to_string());

        engine.insert(ContainerInfo {
            name: "unrelated".to_string(),
            status: ContainerStatus::Running,
            labels: BTreeMap::new(),
        });
        engine.insert(ContainerInfo {
            name: "dev_zed".to_string(),
            status: ContainerStatus::Exited,
            labels: project.clone(),
        });
        let manager = WorkspaceManager::new(engine, &settings);
        manager.create("bob").await.unwrap();

        let entries = manager.list().await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "zed"]);
        assert_eq!(entries[1].rule, "N/A");
        assert_eq!(entries[1].status, ContainerStatus::Exited);
    }

    #[tokio::test]
    async fn test_stop_then_stop_again() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);
        manager.create("alice").await.unwrap();

        assert_eq!(manager.stop("alice").await.unwrap(), Transition::Changed);
        assert_eq!(
            manager.engine().status("dev_alice"),
            Some(ContainerStatus::Exited)
        );
        assert_eq!(manager.stop("alice").await.unwrap(), Transition::Unchanged);
        assert_eq!(
            manager.engine().calls(),
            vec!["create dev_alice", "stop dev_alice"]
        );
    }

    #[tokio::test]
    async fn test_start_then_start_again() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);
        manager.create("alice").await.unwrap();
        manager.stop("alice").await.unwrap();

        assert_eq!(manager.start("alice").await.unwrap(), Transition::Changed);
        assert_eq!(
            manager.engine().status("dev_alice"),
            Some(ContainerStatus::Running)
        );
        assert_eq!(manager.start("alice").await.unwrap(), Transition::Unchanged);
        assert_eq!(
            manager.engine().calls(),
            vec!["create dev_alice", "stop dev_alice", "start dev_alice"]
        );
    }

    #[tokio::test]
    async fn test_delete_then_recreate() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);
        manager.create("alice").await.unwrap();

        manager.delete("alice").await.unwrap();
        assert!(manager.list().await.unwrap().is_empty());
        assert_eq!(
            manager.engine().calls(),
            vec!["create dev_alice", "stop dev_alice", "remove dev_alice"]
        );

        let again = manager.create("alice").await.unwrap();
        assert_eq!(again.name, "alice");
        assert_eq!(manager.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_stopped_skips_stop() {
        let settings = settings();
        let manager = WorkspaceManager::new(MemoryEngine::new(), &settings);
        manager.create("alice").await.unwrap();
        manager.stop("alice").await.unwrap();

        manager.delete("alice").await.unwrap();
        assert_eq!(
            manager.engine().calls(),
            vec!["create dev_alice", "stop dev_alice", "remove dev_alice"]
        );
    }
}
