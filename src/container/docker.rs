//! Docker implementation of [`ContainerEngine`] on top of bollard

use super::config::{ContainerInfo, ContainerSpec, ContainerStatus};
use super::engine::ContainerEngine;
use crate::config::RestartPolicy;
use crate::error::{DevhubError, Result};
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::models::{HostConfig, PortBinding, RestartPolicyNameEnum};
use bollard::Docker;
use std::collections::HashMap;
use tracing::{debug, info};

/// Docker engine reached through the local control socket
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using the platform defaults (honours `DOCKER_HOST`)
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(engine_error)?;
        Ok(Self { docker })
    }

    fn create_config(spec: &ContainerSpec) -> Config<String> {
        let port_keys: Vec<String> = spec
            .published_ports
            .iter()
            .map(|port| format!("{}/tcp", port))
            .collect();

        let exposed_ports: HashMap<String, HashMap<(), ()>> = port_keys
            .iter()
            .map(|key| (key.clone(), HashMap::new()))
            .collect();

        // Empty host binding: the engine picks a free host port
        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = port_keys
            .iter()
            .map(|key| {
                (
                    key.clone(),
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: None,
                    }]),
                )
            })
            .collect();

        let host_config = HostConfig {
            binds: Some(spec.volumes.iter().map(|v| v.bind()).collect()),
            port_bindings: Some(port_bindings),
            network_mode: Some(spec.network.clone()),
            memory: spec.resources.memory_limit,
            nano_cpus: spec.resources.nano_cpus,
            pids_limit: spec.resources.pids_limit,
            restart_policy: Some(bollard::models::RestartPolicy {
                name: Some(restart_policy_name(spec.restart_policy)),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        Config {
            image: Some(spec.image.clone()),
            tty: Some(spec.tty),
            env: Some(
                spec.env
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect(),
            ),
            labels: Some(
                spec.labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        }
    }
}

impl ContainerEngine for DockerEngine {
    async fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => {
                let status = response
                    .state
                    .and_then(|state| state.status)
                    .map(|status| status.to_string())
                    .unwrap_or_default();
                let labels = response
                    .config
                    .and_then(|config| config.labels)
                    .unwrap_or_default();

                Ok(Some(ContainerInfo {
                    name: response
                        .name
                        .map(|n| n.trim_start_matches('/').to_string())
                        .unwrap_or_else(|| name.to_string()),
                    status: ContainerStatus::parse(&status),
                    labels: labels.into_iter().collect(),
                }))
            }
            Err(e) if status_code(&e) == Some(404) => Ok(None),
            Err(e) => Err(engine_error(e)),
        }
    }

    async fn list_labeled(&self, label: &str) -> Result<Vec<ContainerInfo>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![label.to_string()]);

        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(engine_error)?;
        debug!("Engine returned {} containers labeled {}", summaries.len(), label);

        Ok(summaries
            .into_iter()
            .map(|summary| ContainerInfo {
                name: summary
                    .names
                    .and_then(|names| names.into_iter().next())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default(),
                status: ContainerStatus::parse(summary.state.as_deref().unwrap_or_default()),
                labels: summary.labels.unwrap_or_default().into_iter().collect(),
            })
            .collect())
    }

    async fn create_and_start(&self, spec: &ContainerSpec) -> Result<()> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), Self::create_config(spec))
            .await
            .map_err(|e| create_error(spec, e))?;

        for warning in &response.warnings {
            tracing::warn!("Engine warning for {}: {}", spec.name, warning);
        }
        info!("Created container {} ({})", spec.name, response.id);

        self.start(&spec.name).await
    }

    async fn start(&self, name: &str) -> Result<()> {
        let result = self
            .docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await;
        transition_result(name, result)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let result = self
            .docker
            .stop_container(name, None::<StopContainerOptions>)
            .await;
        transition_result(name, result)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.docker
            .remove_container(name, None::<RemoveContainerOptions>)
            .await
            .map_err(|e| not_found_or_engine(name, e))
    }
}

/// Create answers 404 both for a missing image and for a missing network
fn create_error(spec: &ContainerSpec, err: BollardError) -> DevhubError {
    let image_missing = matches!(
        &err,
        BollardError::DockerResponseServerError { status_code: 404, message }
            if message.to_lowercase().contains("no such image")
    );

    if image_missing {
        DevhubError::ImageNotFound(spec.image.clone())
    } else if status_code(&err) == Some(409) {
        DevhubError::ContainerExists(spec.name.clone())
    } else {
        engine_error(err)
    }
}

/// 304 means the container already was in the requested state
fn transition_result(name: &str, result: std::result::Result<(), BollardError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if status_code(&e) == Some(304) => Ok(()),
        Err(e) => Err(not_found_or_engine(name, e)),
    }
}

fn not_found_or_engine(name: &str, err: BollardError) -> DevhubError {
    match status_code(&err) {
        Some(404) => DevhubError::ContainerNotFound(name.to_string()),
        _ => engine_error(err),
    }
}

fn restart_policy_name(policy: RestartPolicy) -> RestartPolicyNameEnum {
    match policy {
        RestartPolicy::No => RestartPolicyNameEnum::NO,
        RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
        RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
        RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
    }
}

fn status_code(err: &BollardError) -> Option<u16> {
    match err {
        BollardError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

/// Keep the daemon's explanation text when there is one
fn engine_error(err: BollardError) -> DevhubError {
    match err {
        BollardError::DockerResponseServerError { message, .. } => DevhubError::Engine(message),
        other => DevhubError::Engine(other.to_string()),
    }
}
