use std::path::{Component, Path, PathBuf};

use minijinja::{Environment, Error, ErrorKind, Template, UndefinedBehavior, Value, context, path_loader};
use tracing::error;

use super::filesystem::{Confinement, confine};
use crate::domain::{AppError, NodeContext, ResolveError};

/// File suffix appended to a task path to find its template.
pub const TEMPLATE_SUFFIX: &str = ".sh.j2";

/// Resolves task paths to templates confined to a trusted root.
///
/// The environment renders with strict undefined handling: a reference to a
/// variable the inventory does not define aborts rendering.
pub struct TemplateResolver {
    root: PathBuf,
    env: Environment<'static>,
}

impl TemplateResolver {
    pub fn new(root: &Path) -> Result<Self, AppError> {
        let root = root.canonicalize().map_err(|e| {
            AppError::config_error(format!("Template root {} is not accessible: {}", root.display(), e))
        })?;

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_loader(path_loader(&root));

        Ok(Self { root, env })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `task_path` (relative, without suffix) to a loaded template.
    ///
    /// Symbolic links are followed before the containment check. A path that
    /// leaves the root is a [`ResolveError::Security`], logged here.
    pub fn resolve(&self, task_path: &str) -> Result<Fragment<'_>, ResolveError> {
        let candidate = format!("{}{}", task_path, TEMPLATE_SUFFIX);
        let resolved = match confine(&self.root, Path::new(&candidate)) {
            Ok(resolved) => resolved,
            Err(Confinement::Missing) => return Err(ResolveError::NotFound(task_path.to_string())),
            Err(Confinement::Escaped(resolved)) => {
                error!(
                    "Path injection attempt: task '{}' resolves to {}",
                    task_path,
                    resolved.display()
                );
                return Err(ResolveError::Security(task_path.to_string()));
            }
        };

        let name = template_name(&self.root, &resolved)
            .ok_or_else(|| ResolveError::NotFound(task_path.to_string()))?;
        let template = self.env.get_template(&name).map_err(|err| match err.kind() {
            ErrorKind::TemplateNotFound => ResolveError::NotFound(task_path.to_string()),
            _ => ResolveError::Invalid { task: task_path.to_string(), reason: err.to_string() },
        })?;

        Ok(Fragment { task: task_path.to_string(), env: &self.env, template })
    }
}

/// Loader name of a resolved template: its root-relative path with `/` separators.
fn template_name(root: &Path, resolved: &Path) -> Option<String> {
    let relative = resolved.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

/// A resolved workflow step, ready to render.
pub struct Fragment<'env> {
    task: String,
    env: &'env Environment<'static>,
    template: Template<'env, 'env>,
}

impl Fragment<'_> {
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Render with the node context bound to the single variable `node`.
    pub fn render_node(&self, node: &NodeContext) -> Result<String, AppError> {
        self.template.render(context! { node => node }).map_err(|err| {
            if err.kind() == ErrorKind::UndefinedError {
                let variable = self
                    .missing_variable(&err, node)
                    .or_else(|| err.detail().map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string());
                error!(
                    "Undefined variable {} rendering {} for {}",
                    variable,
                    self.task,
                    node.hostname()
                );
                AppError::rendering(format!(
                    "Missing variable in inventory: {} (task {})",
                    variable, self.task
                ))
            } else {
                AppError::rendering(format!("Failed to render task {}: {}", self.task, err))
            }
        })
    }

    /// Render against an arbitrary context value.
    pub fn render_value(&self, ctx: Value) -> Result<String, AppError> {
        self.template.render(ctx).map_err(|err| {
            AppError::rendering(format!("Failed to render task {}: {}", self.task, err))
        })
    }

    /// The `node.*` reference that raised `err`.
    ///
    /// Candidates are the references the context cannot satisfy; only one
    /// written at the error location counts, so guarded optional variables
    /// elsewhere in the template are never blamed.
    fn missing_variable(&self, err: &Error, node: &NodeContext) -> Option<String> {
        let included;
        let template = match err.name() {
            Some(name) if name != self.template.name() => {
                included = self.env.get_template(name).ok()?;
                &included
            }
            _ => &self.template,
        };

        let source = template.source();
        let location = err
            .range()
            .and_then(|range| source.get(range))
            .into_iter()
            .chain(err.line().and_then(|line| source.lines().nth(line.checked_sub(1)?)));

        let mut candidates: Vec<String> = template
            .undeclared_variables(true)
            .into_iter()
            .filter(|path| path.strip_prefix("node.").is_some_and(|rest| !node.contains_path(rest)))
            .collect();
        candidates.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        for text in location {
            if let Some(found) = candidates.iter().find(|path| references(text, path)) {
                return Some(found.clone());
            }
        }
        None
    }
}

/// Whether `text` mentions `path` as a whole dotted name.
fn references(text: &str, path: &str) -> bool {
    text.match_indices(path).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + path.len()..].chars().next();
        let boundary = |c: Option<char>| !c.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        boundary(before) && boundary(after)
    })
}
