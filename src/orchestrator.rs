//! Command orchestration
//!
//! Turns a resolved scope selector into concrete projects, runs the snapshot,
//! diff and transfer pipeline for each, and aggregates the per-project results.
//! One project's failure is recorded in its own result and never stops the
//! others. A category whose projects cannot be listed is reported as the
//! category-wide scope `<category>/all`.

use crate::error::{StoreError, SyncError};
use crate::ignore::SyncIgnore;
use crate::namespace::{Namespace, ProjectRef, ALL_TOKEN};
use crate::reconcile::{diff, DiffEntry, DiffSummary};
use crate::scope::{ScopeSelector, Selector};
use crate::store::{with_timeout, LocalFs, RemoteStore};
use crate::transfer::{CancelFlag, EngineConfig, TransferEngine, TransferPlan, TransferReport, TransferTarget};
use crate::tree::{build_local, build_remote, SnapshotOptions, TreeSnapshot};
use crate::types::Direction;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tuning for a whole command.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub engine: EngineConfig,
    /// Remote directories listed concurrently while building a snapshot.
    pub listing_concurrency: usize,
    /// Projects processed concurrently.
    pub scope_concurrency: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            listing_concurrency: 8,
            scope_concurrency: 1,
        }
    }
}

/// Which stores hold a category or project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Local,
    Cloud,
    Both,
}

impl Presence {
    fn from_flags(local: bool, cloud: bool) -> Self {
        match (local, cloud) {
            (true, true) => Presence::Both,
            (false, true) => Presence::Cloud,
            _ => Presence::Local,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Presence::Local => "local",
            Presence::Cloud => "cloud",
            Presence::Both => "local/cloud",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectListing {
    pub name: String,
    pub presence: Presence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    pub name: String,
    pub presence: Presence,
    pub projects: Vec<ProjectListing>,
    /// Set when a store could not be listed; `projects` may then be partial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Projects a selector covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub projects: Vec<ProjectRef>,
    /// Category-wide scopes whose projects could not be listed, with the reason.
    pub unlisted: Vec<(ProjectRef, String)>,
}

/// Diff of one project.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeStatus {
    pub project: ProjectRef,
    pub local_exists: bool,
    pub summary: DiffSummary,
    pub entries: Vec<DiffEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set when a snapshot could not be built; `entries` is empty then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ScopeOutcome {
    Completed { report: TransferReport },
    Planned { plan: TransferPlan },
    Skipped { reason: String },
    Cancelled,
    Failed { reason: String },
}

/// Result of `save` or `load` for one project.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeTransfer {
    pub project: ProjectRef,
    pub direction: Direction,
    #[serde(flatten)]
    pub outcome: ScopeOutcome,
}

impl ScopeTransfer {
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            ScopeOutcome::Completed { report } => report.is_success(),
            ScopeOutcome::Planned { .. } | ScopeOutcome::Skipped { .. } => true,
            ScopeOutcome::Cancelled | ScopeOutcome::Failed { .. } => false,
        }
    }
}

/// What a command produced, ready for rendering.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Listed(Vec<CategoryListing>),
    Status(Vec<ScopeStatus>),
    Transfers(Vec<ScopeTransfer>),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            CommandOutcome::Listed(categories) => categories.iter().all(|c| c.error.is_none()),
            CommandOutcome::Status(scopes) => scopes.iter().all(|s| s.error.is_none()),
            CommandOutcome::Transfers(scopes) => scopes.iter().all(ScopeTransfer::is_success),
        }
    }

    /// 0 on full success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Runs commands against one namespace.
pub struct Orchestrator {
    namespace: Namespace,
    remote: Arc<dyn RemoteStore>,
    local: LocalFs,
    settings: OrchestratorSettings,
    cancel: CancelFlag,
}

impl Orchestrator {
    pub fn new(namespace: Namespace, remote: Arc<dyn RemoteStore>, settings: OrchestratorSettings) -> Self {
        Self {
            namespace,
            remote,
            local: LocalFs::new(),
            settings,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Every category and project on either side, annotated with where it lives.
    ///
    /// A store that cannot be listed marks the affected categories with an
    /// error instead of failing the command, unless nothing at all can be listed.
    pub async fn list(&self) -> Result<Vec<CategoryListing>, SyncError> {
        let local_categories: BTreeSet<String> =
            self.local.list_dirs(self.namespace.local_root())?.into_iter().collect();
        let (remote_categories, root_error) = match self.remote_dirs(self.namespace.remote_root()).await {
            Ok(names) => (names.into_iter().collect::<BTreeSet<String>>(), None),
            Err(e) if local_categories.is_empty() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Remote categories could not be listed");
                (BTreeSet::new(), Some(format!("cloud listing failed: {}", e)))
            }
        };

        let mut listings = Vec::new();
        for category in local_categories.union(&remote_categories) {
            let mut errors: Vec<String> = root_error.iter().cloned().collect();
            let local_projects: BTreeSet<String> =
                match self.local.list_dirs(&self.namespace.category_local(category)) {
                    Ok(names) => names.into_iter().collect(),
                    Err(e) => {
                        errors.push(format!("local listing failed: {}", e));
                        BTreeSet::new()
                    }
                };
            let remote_projects: BTreeSet<String> = if root_error.is_some() {
                BTreeSet::new()
            } else {
                match self.remote_dirs(&self.namespace.category_remote(category)).await {
                    Ok(names) => names.into_iter().collect(),
                    Err(e) => {
                        warn!(category = %category, error = %e, "Remote projects could not be listed");
                        errors.push(format!("cloud listing failed: {}", e));
                        BTreeSet::new()
                    }
                }
            };

            let projects = local_projects
                .union(&remote_projects)
                .map(|name| ProjectListing {
                    name: name.clone(),
                    presence: Presence::from_flags(
                        local_projects.contains(name),
                        remote_projects.contains(name),
                    ),
                })
                .collect();
            listings.push(CategoryListing {
                name: category.clone(),
                presence: Presence::from_flags(
                    local_categories.contains(category),
                    remote_categories.contains(category),
                ),
                projects,
                error: (!errors.is_empty()).then(|| errors.join("; ")),
            });
        }
        Ok(listings)
    }

    /// Concrete projects a selector covers: the sorted union of both sides.
    ///
    /// A category that cannot be listed lands in [`Expansion::unlisted`] as
    /// `<category>/all`; a failing remote root as `all/all`. The remaining
    /// categories are still expanded.
    pub async fn expand(&self, selector: &ScopeSelector) -> Result<Expansion, SyncError> {
        let mut expansion = Expansion::default();
        match (selector.category(), selector.project_selector()) {
            (Selector::Named(category), Selector::Named(project)) => {
                expansion
                    .projects
                    .push(ProjectRef::new(category.clone(), project.clone()));
            }
            (Selector::Named(category), Selector::All) => {
                self.expand_category(category, &mut expansion).await;
            }
            (Selector::All, Selector::All) => {
                let mut categories: BTreeSet<String> =
                    self.local.list_dirs(self.namespace.local_root())?.into_iter().collect();
                match self.remote_dirs(self.namespace.remote_root()).await {
                    Ok(names) => categories.extend(names),
                    Err(e) => {
                        warn!(error = %e, "Remote categories could not be listed");
                        expansion.unlisted.push((category_scope(ALL_TOKEN), e.to_string()));
                    }
                }
                for category in categories {
                    self.expand_category(&category, &mut expansion).await;
                }
            }
            _ => {
                return Err(SyncError::InvalidScope(format!(
                    "selector '{}' does not name any project",
                    selector
                )))
            }
        }
        Ok(expansion)
    }

    async fn expand_category(&self, category: &str, expansion: &mut Expansion) {
        match self.projects_in(category).await {
            Ok(projects) => expansion.projects.extend(projects),
            Err(e) => {
                warn!(category, error = %e, "Projects could not be listed");
                expansion.unlisted.push((category_scope(category), e.to_string()));
            }
        }
    }

    pub async fn status(&self, selector: &ScopeSelector) -> Result<Vec<ScopeStatus>, SyncError> {
        let expansion = self.expand(selector).await?;
        let mut results: Vec<ScopeStatus> = stream::iter(expansion.projects)
            .map(|project| self.status_one(project))
            .buffered(self.settings.scope_concurrency.max(1))
            .collect()
            .await;
        results.extend(expansion.unlisted.into_iter().map(|(project, reason)| ScopeStatus {
            local_exists: self.local.is_dir(&self.namespace.category_local(&project.category)),
            project,
            summary: DiffSummary::default(),
            entries: Vec::new(),
            note: None,
            error: Some(reason),
        }));
        results.sort_by(|a, b| a.project.cmp(&b.project));
        Ok(results)
    }

    /// `save` (local to remote) or `load` (remote to local) for every selected project.
    pub async fn transfer(
        &self,
        selector: &ScopeSelector,
        direction: Direction,
        dry_run: bool,
    ) -> Result<Vec<ScopeTransfer>, SyncError> {
        let expansion = self.expand(selector).await?;
        let mut results: Vec<ScopeTransfer> = stream::iter(expansion.projects)
            .map(|project| async move {
                let outcome = self.transfer_one(&project, direction, dry_run).await;
                ScopeTransfer {
                    project,
                    direction,
                    outcome,
                }
            })
            .buffered(self.settings.scope_concurrency.max(1))
            .collect()
            .await;
        results.extend(expansion.unlisted.into_iter().map(|(project, reason)| ScopeTransfer {
            project,
            direction,
            outcome: ScopeOutcome::Failed { reason },
        }));
        results.sort_by(|a, b| a.project.cmp(&b.project));
        Ok(results)
    }

    async fn status_one(&self, project: ProjectRef) -> ScopeStatus {
        let local_exists = self.local.is_dir(&self.namespace.project_local(&project));
        let note = (!local_exists)
            .then(|| "not present locally; run 'load' to fetch it".to_string());

        match self.snapshots(&project).await {
            Ok((local, remote)) => {
                let entries = diff(&local, &remote);
                let summary = DiffSummary::from_entries(&entries);
                debug!(project = %project, paths = summary.total(), "Status computed");
                ScopeStatus {
                    project,
                    local_exists,
                    summary,
                    entries,
                    note,
                    error: None,
                }
            }
            Err(e) => {
                warn!(project = %project, error = %e, "Status failed");
                ScopeStatus {
                    project,
                    local_exists,
                    summary: DiffSummary::default(),
                    entries: Vec::new(),
                    note,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn transfer_one(&self, project: &ProjectRef, direction: Direction, dry_run: bool) -> ScopeOutcome {
        if self.cancel.is_cancelled() {
            return ScopeOutcome::Cancelled;
        }

        match direction {
            Direction::Save if !self.local.is_dir(&self.namespace.project_local(project)) => {
                return ScopeOutcome::Skipped {
                    reason: "no local copy; use 'load' to fetch it".to_string(),
                };
            }
            Direction::Load => {
                let remote_path = self.namespace.project_remote(project);
                let timeout = self.settings.engine.request_timeout;
                match with_timeout(timeout, self.remote.stat(&remote_path)).await {
                    Ok(item) if item.is_dir() => {}
                    Ok(_) => {
                        return ScopeOutcome::Failed {
                            reason: format!("{} is not a directory", remote_path),
                        }
                    }
                    Err(e) if e.is_not_found() => {
                        return ScopeOutcome::Skipped {
                            reason: "no remote copy; use 'save' to upload it".to_string(),
                        };
                    }
                    Err(e) => return ScopeOutcome::Failed { reason: e.to_string() },
                }
            }
            Direction::Save => {}
        }

        let start = Instant::now();
        info!(project = %project, %direction, dry_run, "Scope started");
        let (local, remote) = match self.snapshots(project).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(project = %project, error = %e, "Scope failed");
                return ScopeOutcome::Failed { reason: e.to_string() };
            }
        };

        let entries = diff(&local, &remote);
        let target = TransferTarget::for_project(&self.namespace, project);
        let engine = TransferEngine::new(Arc::clone(&self.remote), self.settings.engine.clone())
            .with_cancel(self.cancel.clone());

        if dry_run {
            return ScopeOutcome::Planned {
                plan: engine.plan(&entries, direction, &target),
            };
        }

        let report = engine.apply(&entries, direction, &target).await;
        info!(
            project = %project,
            %direction,
            uploaded = report.uploaded,
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            cancelled = report.cancelled,
            duration_ms = start.elapsed().as_millis() as u64,
            "Scope finished"
        );
        ScopeOutcome::Completed { report }
    }

    /// Local and remote snapshots of one project, built with the same ignore rules.
    async fn snapshots(&self, project: &ProjectRef) -> Result<(TreeSnapshot, TreeSnapshot), StoreError> {
        let local_dir = self.namespace.project_local(project);
        let options = SnapshotOptions::for_store(self.remote.as_ref())
            .with_ignore(SyncIgnore::load(&local_dir))
            .with_listing_concurrency(self.settings.listing_concurrency)
            .with_request_timeout(self.settings.engine.request_timeout);

        let local_options = options.clone();
        let local = tokio::task::spawn_blocking(move || build_local(&local_dir, &local_options))
            .await
            .map_err(|e| StoreError::LocalIo(format!("local scan aborted: {}", e)))?;
        let remote = build_remote(
            self.remote.as_ref(),
            &self.namespace.project_remote(project),
            &options,
        )
        .await?;
        Ok((local, remote))
    }

    async fn projects_in(&self, category: &str) -> Result<Vec<ProjectRef>, SyncError> {
        let mut names: BTreeSet<String> = self
            .local
            .list_dirs(&self.namespace.category_local(category))?
            .into_iter()
            .collect();
        names.extend(self.remote_dirs(&self.namespace.category_remote(category)).await?);
        Ok(names
            .into_iter()
            .map(|project| ProjectRef::new(category, project))
            .collect())
    }

    /// Visible subdirectory names of a remote directory; a missing directory is empty.
    async fn remote_dirs(&self, path: &str) -> Result<Vec<String>, SyncError> {
        let timeout = self.settings.engine.request_timeout;
        match with_timeout(timeout, self.remote.list(path)).await {
            Ok(items) => {
                let mut names: Vec<String> = items
                    .into_iter()
                    .filter(|item| item.is_dir() && !item.name.starts_with('.'))
                    .map(|item| item.name)
                    .collect();
                names.sort();
                Ok(names)
            }
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Scope standing for every project of `category`.
fn category_scope(category: &str) -> ProjectRef {
    ProjectRef::new(category, ALL_TOKEN)
}
