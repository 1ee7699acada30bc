//! Workspaces and their reverse-proxy routing
//!
//! A workspace named `alice` lives in the container `dev_alice`, is served on
//! `alice.<base_domain>` and is routed there by Traefik labels on the
//! container. Everything here is derived from the name and the settings, so
//! the same workspace always gets the same container and labels.

pub mod lifecycle;

pub use lifecycle::{Provisioned, Transition, WorkspaceEntry, WorkspaceManager};

use crate::config::Settings;
use crate::error::{DevhubError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Prefix of every workspace container name
pub const CONTAINER_PREFIX: &str = "dev_";

/// Label marking containers owned by devhub
pub const PROJECT_LABEL: (&str, &str) = ("project", "devhub");

/// Environment variable carrying the generated password
pub const PASSWORD_ENV: &str = "PASSWORD";

/// Placeholder shown when a container has no routing rule
pub const NO_RULE: &str = "N/A";

const ROUTER_PREFIX: &str = "traefik.http.routers.";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("workspace name pattern")
    })
}

/// A validated workspace name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    name: String,
}

impl Workspace {
    /// Validate a user-supplied name
    ///
    /// The name ends up in a hostname and in Traefik router names, so it must
    /// be a valid DNS label.
    pub fn new(name: &str) -> Result<Self> {
        if !name_pattern().is_match(name) {
            return Err(DevhubError::InvalidWorkspaceName(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container name, `dev_<name>`
    pub fn container_name(&self) -> String {
        format!("{}{}", CONTAINER_PREFIX, self.name)
    }

    /// Primary hostname, `<name>.<base_domain>`
    pub fn subdomain(&self, settings: &Settings) -> String {
        format!("{}.{}", self.name, settings.base_domain)
    }

    /// Router name of the secondary application port, `<name>-<suffix>`
    fn app_router(&self, settings: &Settings) -> Option<String> {
        settings
            .app
            .as_ref()
            .map(|app| format!("{}-{}", self.name, app.suffix))
    }

    /// Hostname of the secondary application port, when configured
    pub fn app_subdomain(&self, settings: &Settings) -> Option<String> {
        self.app_router(settings)
            .map(|router| format!("{}.{}", router, settings.base_domain))
    }

    /// Public URLs, primary first
    pub fn urls(&self, settings: &Settings) -> Vec<String> {
        std::iter::once(self.subdomain(settings))
            .chain(self.app_subdomain(settings))
            .map(|host| format!("https://{}", host))
            .collect()
    }

    /// Host directory bound into the container
    pub fn host_dir(&self, settings: &Settings) -> String {
        format!(
            "{}/{}",
            settings.workspace_root.trim_end_matches('/'),
            self.name
        )
    }

    /// Labels routing the workspace through the reverse proxy
    pub fn labels(&self, settings: &Settings) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("traefik.enable".to_string(), "true".to_string());

        add_route(
            &mut labels,
            &self.name,
            &self.subdomain(settings),
            &settings.entrypoint,
            settings.service_port,
        );

        if let (Some(app), Some(router), Some(host)) = (
            settings.app.as_ref(),
            self.app_router(settings),
            self.app_subdomain(settings),
        ) {
            add_route(&mut labels, &router, &host, &settings.entrypoint, app.port);
        }

        labels.insert(PROJECT_LABEL.0.to_string(), PROJECT_LABEL.1.to_string());
        labels
    }
}

fn add_route(
    labels: &mut BTreeMap<String, String>,
    router: &str,
    host: &str,
    entrypoint: &str,
    port: u16,
) {
    labels.insert(
        format!("{}{}.rule", ROUTER_PREFIX, router),
        format!("Host(`{}`)", host),
    );
    labels.insert(
        format!("{}{}.entrypoints", ROUTER_PREFIX, router),
        entrypoint.to_string(),
    );
    labels.insert(
        format!("{}{}.service", ROUTER_PREFIX, router),
        router.to_string(),
    );
    labels.insert(
        format!("traefik.http.services.{}.loadbalancer.server.port", router),
        port.to_string(),
    );
}

/// `project=devhub`, as used in engine label filters
pub fn project_filter() -> String {
    format!("{}={}", PROJECT_LABEL.0, PROJECT_LABEL.1)
}

/// Workspace name of a container, with the prefix stripped
pub fn workspace_name(container_name: &str) -> &str {
    let name = container_name.trim_start_matches('/');
    name.strip_prefix(CONTAINER_PREFIX).unwrap_or(name)
}

/// Routing rule to display for a workspace
///
/// Prefers the router named after the workspace, otherwise the first router
/// rule in key order.
pub fn routing_rule<'a>(labels: &'a BTreeMap<String, String>, workspace: &str) -> Option<&'a str> {
    let primary = format!("{}{}.rule", ROUTER_PREFIX, workspace);
    labels
        .get(&primary)
        .or_else(|| {
            labels
                .iter()
                .find(|(key, _)| key.starts_with(ROUTER_PREFIX) && key.ends_with(".rule"))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}
