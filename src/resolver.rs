//! Recursive dependency resolution for one ecosystem.
//!
//! Every top-level requirement is expanded by its own task. Within a task,
//! packages are expanded breadth-first from an explicit queue into an arena
//! of resolved nodes, which is folded into a tree once the queue drains.
//!
//! All tasks of a run share one visited set keyed by `name@version`.
//! A package already in the set is not expanded again and produces no node,
//! so a package reachable along two paths appears under whichever branch got
//! there first, and cycles are cut where they close.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashSet;
use indicatif::ProgressBar;
use log::{debug, info, trace, warn};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::ScrapeConfig;
use crate::error::ResolveError;
use crate::license::inference::infer_license;
use crate::models::{DependencyNode, RequirementSpec};
use crate::registry::Registry;

/// Outcome of one resolution run.
#[derive(Debug, Default)]
pub struct Resolution {
    /// One tree per top-level requirement that resolved, in input order.
    pub forest: Vec<DependencyNode>,
    /// Packages that could not be fetched; they are absent from `forest`.
    pub errors: Vec<ResolveError>,
}

pub struct Resolver<R: Registry> {
    registry: Arc<R>,
    scrape: Arc<ScrapeConfig>,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl<R: Registry> Resolver<R> {
    pub fn new(registry: R, scrape: ScrapeConfig, concurrency: usize) -> Self {
        Self {
            registry: Arc::new(registry),
            scrape: Arc::new(scrape),
            concurrency: concurrency.max(1),
            progress: None,
        }
    }

    /// Tick `progress` once per resolved package.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    #[cfg(test)]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolve `top_level` into a forest. Never fails: unresolvable packages
    /// are left out and reported in [`Resolution::errors`].
    pub async fn resolve(&self, top_level: Vec<RequirementSpec>) -> Resolution {
        let visited: Arc<DashSet<String>> = Arc::new(DashSet::new());
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let (node_tx, mut node_rx) = mpsc::unbounded_channel::<(usize, DependencyNode)>();
        let (err_tx, mut err_rx) = mpsc::unbounded_channel::<ResolveError>();

        info!(
            "Resolving {} top-level {} requirements",
            top_level.len(),
            self.registry.ecosystem()
        );

        let mut tasks = JoinSet::new();
        for (index, requirement) in top_level.into_iter().enumerate() {
            let branch = Branch {
                registry: Arc::clone(&self.registry),
                scrape: Arc::clone(&self.scrape),
                visited: Arc::clone(&visited),
                errors: err_tx.clone(),
                progress: self.progress.clone(),
            };
            let node_tx = node_tx.clone();
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                if let Some(tree) = branch.expand(requirement).await {
                    // The receiver outlives every task.
                    let _ = node_tx.send((index, tree));
                }
            });
        }
        drop(node_tx);
        drop(err_tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Resolution task aborted: {}", e);
            }
        }

        let mut roots = Vec::new();
        while let Ok(root) = node_rx.try_recv() {
            roots.push(root);
        }
        roots.sort_by_key(|(index, _)| *index);

        let mut errors = Vec::new();
        while let Ok(err) = err_rx.try_recv() {
            warn!("{}", err);
            errors.push(err);
        }

        Resolution {
            forest: roots.into_iter().map(|(_, tree)| tree).collect(),
            errors,
        }
    }
}

/// Drop leading range shorthand (`^1.2.3`, `~1.2.3`); the rest is used as an
/// exact version.
pub fn strip_range_prefix(version: &str) -> &str {
    version.trim().trim_start_matches(|c: char| c == '^' || c == '~')
}

fn visit_key(name: &str, version: &str) -> String {
    format!("{}@{}", name, version)
}

/// State one task needs to expand one top-level requirement.
struct Branch<R: Registry> {
    registry: Arc<R>,
    scrape: Arc<ScrapeConfig>,
    visited: Arc<DashSet<String>>,
    errors: mpsc::UnboundedSender<ResolveError>,
    progress: Option<ProgressBar>,
}

/// A resolved node waiting to be attached to its parent.
struct Slot {
    node: DependencyNode,
    parent: Option<usize>,
}

impl<R: Registry> Branch<R> {
    async fn expand(&self, root: RequirementSpec) -> Option<DependencyNode> {
        let mut arena: Vec<Slot> = Vec::new();
        let mut queue: VecDeque<(RequirementSpec, Option<usize>)> = VecDeque::new();
        queue.push_back((root, None));

        while let Some((requirement, parent)) = queue.pop_front() {
            let Some((node, dependencies)) = self.resolve_one(&requirement).await else {
                continue;
            };
            let index = arena.len();
            arena.push(Slot { node, parent });
            queue.extend(dependencies.into_iter().map(|dep| (dep, Some(index))));
        }

        assemble(arena)
    }

    /// Fetch and describe one package, returning it with its declared
    /// dependencies. `None` if it was already visited or could not be fetched.
    async fn resolve_one(&self, requirement: &RequirementSpec) -> Option<(DependencyNode, Vec<RequirementSpec>)> {
        let name = requirement.name.as_str();
        let requested = strip_range_prefix(&requirement.version);
        let canonical = self.registry.canonical_name(name);

        // DashSet::insert is the atomic check-and-mark.
        if !self.visited.insert(visit_key(&canonical, requested)) {
            trace!("{}@{} already visited", name, requested);
            return None;
        }

        let document = match self.registry.fetch_metadata(name, requested).await {
            Ok(document) => document,
            Err(source) => {
                debug!("Dropping {}@{}: {}", name, requested, source);
                let _ = self.errors.send(ResolveError {
                    ecosystem: self.registry.ecosystem(),
                    name: name.to_string(),
                    version: requested.to_string(),
                    source,
                });
                return None;
            }
        };

        let (resolved_version, structured_license, dependencies) = match document.select(requested) {
            Some((version, meta)) => {
                if version != requested {
                    if !requested.is_empty() {
                        info!("{}@{} not in the registry index, using {}", name, requested, version);
                    }
                    if !self.visited.insert(visit_key(&canonical, version)) {
                        trace!("{}@{} already visited", name, version);
                        return None;
                    }
                }
                (version.to_string(), meta.license.clone(), meta.dependencies.clone())
            }
            None => {
                warn!("{}: no usable version for {:?} in the registry", name, requested);
                let label = if requested.is_empty() { "unknown" } else { requested };
                (label.to_string(), None, Vec::new())
            }
        };

        let license = infer_license(self.registry.as_ref(), name, structured_license.as_deref(), &self.scrape).await;

        if let Some(pb) = &self.progress {
            pb.inc(1);
            pb.set_message(format!("{}@{}", name, resolved_version));
        }

        let node = DependencyNode {
            name: name.to_string(),
            requested_version: requirement.version.clone(),
            resolved_version,
            license,
            details_url: self.registry.details_url(name),
            ecosystem: self.registry.ecosystem(),
            children: Vec::new(),
        };
        Some((node, dependencies))
    }
}

/// Fold the arena into a tree. Children always sit after their parent, so
/// walking backwards completes every node before it is attached.
fn assemble(mut arena: Vec<Slot>) -> Option<DependencyNode> {
    while let Some(slot) = arena.pop() {
        let mut node = slot.node;
        node.children.reverse();
        match slot.parent {
            Some(parent) => arena[parent].node.children.push(node),
            None => return Some(node),
        }
    }
    None
}
