use std::collections::HashSet;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::debug;

use crate::model::{Project, Tag, Task};
use crate::store::{Store, StoreError};

/// A complete snapshot of what the list view shows, built by [`reload`].
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    /// Enriched top-level tasks in store order
    pub tasks: Vec<Task>,
    pub projects: IndexMap<String, Project>,
    pub tags: IndexMap<String, Tag>,
    /// Ids of tasks with at least one dependency that isn't done
    pub blocked: HashSet<String>,
}

/// Load and enrich the full task set.
///
/// Runs in two phases. Phase 1 materializes the top-level rows into an owned
/// `Vec`, releasing the store's only cursor. Phase 2 issues the per-task
/// lookups. Any failure discards everything loaded so far.
pub fn reload(store: &Store) -> Result<LoadedData, StoreError> {
    let started = Instant::now();

    let projects: IndexMap<String, Project> = store
        .list_projects()?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
    let tags: IndexMap<String, Tag> = store
        .list_tags()?
        .into_iter()
        .map(|t| (t.id.clone(), t))
        .collect();

    // Phase 1: materialize
    let rows = store.list_top_level_tasks()?;

    // Phase 2: enrich, with no cursor open
    let (tasks, blocked) = enrich(store, rows)?;

    debug!(
        tasks = tasks.len(),
        projects = projects.len(),
        tags = tags.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "reloaded task list"
    );

    Ok(LoadedData {
        tasks,
        projects,
        tags,
        blocked,
    })
}

fn enrich(store: &Store, rows: Vec<Task>) -> Result<(Vec<Task>, HashSet<String>), StoreError> {
    let mut blocked = HashSet::new();
    let mut tasks = Vec::with_capacity(rows.len());

    for mut task in rows {
        task.tags = store.get_task_tags(&task.id)?;
        task.subtasks = store.get_subtasks(&task.id)?;
        for sub in &mut task.subtasks {
            sub.tags = store.get_task_tags(&sub.id)?;
        }
        task.dependencies = store.get_dependencies(&task.id)?;
        if !task.dependencies.is_empty() && store.is_blocked(&task.id)? {
            blocked.insert(task.id.clone());
        }
        tasks.push(task);
    }

    Ok((tasks, blocked))
}
