//! Scope resolution: which projects a command applies to.
//!
//! The working directory's position inside the base and the positional
//! arguments together select a category and a project, either by name or
//! through the `all` token. Resolution is pure and never touches a store.

use crate::error::SyncError;
use crate::namespace::{validate_name, ALL_TOKEN};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path};

/// Usage hint shown next to scope errors.
pub const USAGE: &str = "\
Usage:
  basesync list
  basesync status [all all | <category> all | <category> <project>]
  basesync save   [all all | <category> all | <category> <project>]
  basesync load   [all all | <category> all | <category> <project>]

Inside a project directory: 'status', 'save' or 'load' with no arguments.
Inside a category directory: 'status|save|load all' or 'status|save|load <project>'.";

/// One level of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Selector {
    None,
    All,
    Named(String),
}

impl Selector {
    fn from_arg(kind: &str, arg: &str) -> Result<Self, SyncError> {
        if arg == ALL_TOKEN {
            return Ok(Selector::All);
        }
        validate_name(kind, arg)?;
        Ok(Selector::Named(arg.to_string()))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Selector::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::None => write!(f, "-"),
            Selector::All => write!(f, "{}", ALL_TOKEN),
            Selector::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Category and project selection.
///
/// A project selection always comes with a category selection, and a named
/// project always lives in a named category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeSelector {
    category: Selector,
    project: Selector,
}

impl ScopeSelector {
    pub fn new(category: Selector, project: Selector) -> Result<Self, SyncError> {
        match (&category, &project) {
            (Selector::None, Selector::All) | (Selector::None, Selector::Named(_)) => {
                Err(SyncError::InvalidScope("a project needs a category".to_string()))
            }
            (Selector::All, Selector::Named(name)) => Err(SyncError::InvalidScope(format!(
                "project '{}' needs a named category, not '{}'",
                name, ALL_TOKEN
            ))),
            _ => Ok(Self { category, project }),
        }
    }

    pub fn project(category: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            category: Selector::Named(category.into()),
            project: Selector::Named(project.into()),
        }
    }

    pub fn everything() -> Self {
        Self {
            category: Selector::All,
            project: Selector::All,
        }
    }

    pub fn category(&self) -> &Selector {
        &self.category
    }

    pub fn project_selector(&self) -> &Selector {
        &self.project
    }
}

impl fmt::Display for ScopeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.project)
    }
}

/// Where the command was started relative to the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CwdContext {
    Outside,
    Base,
    Category(String),
    /// Two or more levels deep; only the first two components count.
    Project { category: String, project: String },
}

impl CwdContext {
    /// Position of `cwd` relative to `base`. Both paths should already be canonical.
    pub fn from_paths(base: &Path, cwd: &Path) -> Self {
        let Ok(relative) = cwd.strip_prefix(base) else {
            return CwdContext::Outside;
        };
        let mut names = Vec::with_capacity(2);
        for component in relative.components() {
            match component {
                Component::Normal(name) => names.push(name.to_string_lossy().to_string()),
                Component::CurDir => continue,
                _ => return CwdContext::Outside,
            }
            if names.len() == 2 {
                break;
            }
        }

        let mut names = names.into_iter();
        match (names.next(), names.next()) {
            (None, _) => CwdContext::Base,
            (Some(category), None) => CwdContext::Category(category),
            (Some(category), Some(project)) => CwdContext::Project { category, project },
        }
    }
}

/// Combine the working-directory context with positional arguments.
pub fn resolve(cwd: &CwdContext, args: &[String]) -> Result<ScopeSelector, SyncError> {
    match args {
        [] => match cwd {
            CwdContext::Project { category, project } => {
                validate_name("category", category)?;
                validate_name("project", project)?;
                Ok(ScopeSelector::project(category.clone(), project.clone()))
            }
            CwdContext::Category(_) => Err(SyncError::InvalidScope(format!(
                "project name or '{}' required",
                ALL_TOKEN
            ))),
            _ => Err(SyncError::InvalidScope(
                "category and project required outside a project directory".to_string(),
            )),
        },
        [only] => match cwd {
            CwdContext::Category(category) => {
                validate_name("category", category)?;
                ScopeSelector::new(
                    Selector::Named(category.clone()),
                    Selector::from_arg("project", only)?,
                )
            }
            _ => Err(SyncError::InvalidScope(format!(
                "category required with project '{}' outside a category directory",
                only
            ))),
        },
        [category, project] => ScopeSelector::new(
            Selector::from_arg("category", category)?,
            Selector::from_arg("project", project)?,
        ),
        _ => Err(SyncError::InvalidScope(format!(
            "expected at most 2 arguments, got {}",
            args.len()
        ))),
    }
}
