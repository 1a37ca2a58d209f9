//! Script assembly: node context, workflow resolution, rendering, minification.

use std::path::{Path, PathBuf};

use minijinja::context;
use serde_json::Value;
use tracing::{error, info};
use url::Url;

use crate::adapters::{CommandInventorySource, ContentRoots, Fragment, TemplateResolver};
use crate::app::config::{Credentials, Settings};
use crate::app::inventory_cache::InventoryCache;
use crate::domain::{AppError, HostVars, Manifests, NodeContext, minify_script};
use crate::ports::{ContentFingerprints, InventorySource};

/// Host variable listing the ordered task paths of a node.
pub const WORKFLOW_KEY: &str = "nexus_workflow";

/// Host variable flagging a node for decommissioning.
pub const PURGE_FLAG: &str = "nexus_purge";

/// Fixed workflow rendered for purged nodes.
pub const PURGE_WORKFLOW: [&str; 2] = ["base/header", "base/purge"];

/// Web template rendered for unregistered machines.
pub const BOOTSTRAP_TEMPLATE: &str = "bootstrap";

/// Which workflow produced a task script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Normal,
    Purge,
}

/// Script returned by [`Engine::render_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskScript {
    pub kind: TaskKind,
    pub body: String,
}

/// The script assembler.
///
/// Holds the inventory cache, the content fingerprint source, and the
/// confined template resolver. All methods take `&self` and can be called
/// from many threads at once.
pub struct Engine<S: InventorySource, C: ContentFingerprints> {
    cache: InventoryCache<S>,
    content: C,
    templates: TemplateResolver,
    web_template_dir: PathBuf,
    credentials: Credentials,
}

impl Engine<CommandInventorySource, ContentRoots> {
    /// Engine backed by the inventory command and content directories in `settings`.
    pub fn from_settings(settings: &Settings, credentials: Credentials) -> Result<Self, AppError> {
        let source = CommandInventorySource::new(
            &settings.inventory_command,
            settings.root().to_path_buf(),
            settings.resolve(&settings.inventory_dir),
            settings.inventory_extensions.clone(),
        )?;
        let templates = TemplateResolver::new(&settings.resolve(&settings.template_dir))?;

        Ok(Self::new(
            InventoryCache::new(source, settings.cache_ttl()),
            settings.content_roots(),
            templates,
            settings.resolve(&settings.web_template_dir),
            credentials,
        ))
    }
}

impl<S: InventorySource, C: ContentFingerprints> Engine<S, C> {
    pub fn new(
        cache: InventoryCache<S>,
        content: C,
        templates: TemplateResolver,
        web_template_dir: PathBuf,
        credentials: Credentials,
    ) -> Self {
        Self { cache, content, templates, web_template_dir, credentials }
    }

    pub fn cache(&self) -> &InventoryCache<S> {
        &self.cache
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Build the full provisioning script for `hostname`.
    pub fn assemble(&self, hostname: &str) -> Result<String, AppError> {
        let vars = self.cache.get(hostname)?;
        self.assemble_with(hostname, vars)
    }

    /// Build the decommissioning script for `hostname`.
    ///
    /// Manifests are not computed for purge runs.
    pub fn assemble_purge(&self, hostname: &str) -> Result<String, AppError> {
        let vars = self.cache.get(hostname)?;
        self.purge_with(hostname, vars)
    }

    /// Render the purge script when the node is flagged, the normal one otherwise.
    ///
    /// The flag and the rendered script come from the same inventory read.
    pub fn render_task(&self, hostname: &str) -> Result<TaskScript, AppError> {
        let vars = self.cache.get(hostname)?;
        if vars.get(PURGE_FLAG) == Some(&Value::Bool(true)) {
            info!("Node {} is flagged for purge", hostname);
            let body = self.purge_with(hostname, vars)?;
            return Ok(TaskScript { kind: TaskKind::Purge, body });
        }
        Ok(TaskScript { kind: TaskKind::Normal, body: self.assemble_with(hostname, vars)? })
    }

    /// Base URL nodes use to reach the registrator, from the fleet-wide variables.
    pub fn registrator_url(&self) -> Result<String, AppError> {
        let globals = self.cache.global_vars()?;
        let server = scalar(&globals, "registrator_server").unwrap_or_else(|| "localhost".to_string());
        let port = scalar(&globals, "registrator_port").unwrap_or_else(|| "80".to_string());
        let url = format!("http://{}:{}", server, port);
        Url::parse(&url)
            .map_err(|e| AppError::config_error(format!("Invalid registrator address {}: {}", url, e)))?;
        Ok(url)
    }

    /// Render the bootstrap script served to machines that are not registered yet.
    pub fn render_bootstrap(&self) -> Result<String, AppError> {
        let server_url = self.registrator_url()?;
        let resolver = TemplateResolver::new(&self.web_template_dir)?;
        let fragment = resolver.resolve(BOOTSTRAP_TEMPLATE)?;
        fragment.render_value(context! { server_url => server_url })
    }

    pub fn web_template_dir(&self) -> &Path {
        &self.web_template_dir
    }

    fn assemble_with(&self, hostname: &str, vars: HostVars) -> Result<String, AppError> {
        let scrambled = self.credentials.scrambled()?;
        let manifests = Manifests::build(&vars, &self.content);
        let workflow = workflow_steps(hostname, &vars)?;
        let node = NodeContext::provisioning(hostname, vars, scrambled, manifests);

        self.render_workflow(&node, &workflow)
    }

    fn purge_with(&self, hostname: &str, vars: HostVars) -> Result<String, AppError> {
        let scrambled = self.credentials.scrambled()?;
        let node = NodeContext::purge(hostname, vars, scrambled);

        self.render_workflow(&node, &PURGE_WORKFLOW)
    }

    /// Resolve every step, then render them all; nothing is rendered when a
    /// single step fails to resolve.
    fn render_workflow<T: AsRef<str>>(&self, node: &NodeContext, workflow: &[T]) -> Result<String, AppError> {
        let fragments = workflow
            .iter()
            .map(|task| self.templates.resolve(task.as_ref()))
            .collect::<Result<Vec<Fragment<'_>>, _>>()
            .map_err(|err| {
                error!("Pipeline assembly abort for {}: {}", node.hostname(), err);
                AppError::from(err)
            })?;

        let rendered = fragments
            .iter()
            .map(|fragment| fragment.render_node(node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(minify_script(&rendered.join("\n")))
    }
}

/// The node's ordered task paths.
fn workflow_steps(hostname: &str, vars: &HostVars) -> Result<Vec<String>, AppError> {
    let steps = match vars.get(WORKFLOW_KEY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::rendering(format!("Invalid workflow step for {}: {}", hostname, item))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(AppError::rendering(format!(
                "Workflow for {} must be a list, got {}",
                hostname, other
            )));
        }
    };

    if steps.is_empty() {
        return Err(AppError::rendering(format!("No workflow defined for {}", hostname)));
    }
    Ok(steps)
}

fn scalar(vars: &HostVars, key: &str) -> Option<String> {
    match vars.get(key)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
