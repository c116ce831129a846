//! Store worker: the only owner of the database connection while the TUI runs.
//!
//! The event loop hands it [`Request`]s and polls [`Message`]s back. Tests skip
//! the thread and call [`execute`] directly against an in-memory store.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::model::{Priority, Project, Tag, Task, TimeEntry};
use crate::ops::loader::{self, LoadedData};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Rebuild the full task snapshot
    Reload,
    /// Fetch the running timer, if any
    LoadTimer,
    /// Write to the store. When `reload` is set a successful write is followed
    /// by a reload; a failed write always is.
    Mutate { mutation: Mutation, reload: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert task snapshots with their subtasks, tags and dependency links
    Insert(Vec<Task>),
    /// Overwrite stored fields and tag sets
    Update(Vec<Task>),
    SetPriority { ids: Vec<String>, priority: Priority },
    /// Delete top-level tasks. The outcome reports the links and time
    /// entries that went with them.
    Delete(Vec<String>),
    /// Undo a delete: re-insert the snapshots, then their links and time log
    Restore {
        tasks: Vec<Task>,
        links: Vec<(String, String)>,
        entries: Vec<TimeEntry>,
    },
    ToggleDependency {
        task_id: String,
        depends_on_id: String,
        add: bool,
    },
    CreateProject { name: String },
    /// Delete a project; its tasks move to the inbox
    DeleteProject { id: String },
    CreateTag { name: String },
    /// `(id, color)` pairs
    RecolorProjects(Vec<(String, String)>),
    RecolorTags(Vec<(String, String)>),
    StartTimer { task_id: String },
    StopTimer,
    AddTime { task_id: String, minutes: i64 },
}

/// What a successful mutation produced, when the controller needs to know
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Written,
    Deleted {
        ids: Vec<String>,
        links: Vec<(String, String)>,
        entries: Vec<TimeEntry>,
    },
    ProjectCreated(Project),
    TagCreated(Tag),
    TimerStarted(TimeEntry),
    TimerStopped(Option<TimeEntry>),
    TimeLogged(TimeEntry),
}

#[derive(Debug)]
pub enum Message {
    Loaded(Result<LoadedData, String>),
    Mutated {
        result: Result<Outcome, String>,
        reload: bool,
    },
    Timer(Result<Option<TimeEntry>, String>),
    /// One-second heartbeat while a timer runs
    Tick,
}

/// Run one request against the store and wrap the result as a message.
pub fn execute(store: &Store, request: Request) -> Message {
    match request {
        Request::Reload => Message::Loaded(loader::reload(store).map_err(|e| {
            warn!(error = %e, "reload failed");
            e.to_string()
        })),
        Request::LoadTimer => Message::Timer(store.active_time_entry().map_err(|e| e.to_string())),
        Request::Mutate { mutation, reload } => {
            debug!(?mutation, "applying mutation");
            let result = apply(store, mutation).map_err(|e| {
                warn!(error = %e, "mutation failed");
                e.to_string()
            });
            Message::Mutated { result, reload }
        }
    }
}

fn apply(store: &Store, mutation: Mutation) -> Result<Outcome, StoreError> {
    let now = Utc::now();
    match mutation {
        Mutation::Insert(tasks) => {
            for task in &tasks {
                store.insert_task(task)?;
            }
            Ok(Outcome::Written)
        }
        Mutation::Update(tasks) => {
            for task in &tasks {
                store.update_task(task)?;
            }
            Ok(Outcome::Written)
        }
        Mutation::SetPriority { ids, priority } => {
            for id in &ids {
                store.set_task_priority(id, priority)?;
            }
            Ok(Outcome::Written)
        }
        Mutation::Delete(ids) => {
            let mut links = Vec::new();
            let mut entries = Vec::new();
            for id in &ids {
                let mut tree = vec![id.clone()];
                tree.extend(store.get_subtasks(id)?.into_iter().map(|t| t.id));
                for task_id in &tree {
                    links.extend(store.dependency_links(task_id)?);
                    entries.extend(store.time_entries_for_task(task_id)?);
                }
                store.delete_task(id)?;
            }
            Ok(Outcome::Deleted {
                ids,
                links,
                entries,
            })
        }
        Mutation::Restore {
            tasks,
            links,
            entries,
        } => {
            for task in &tasks {
                store.insert_task(task)?;
            }
            store.restore_dependency_links(&links)?;
            store.restore_time_entries(&entries, now)?;
            Ok(Outcome::Written)
        }
        Mutation::ToggleDependency {
            task_id,
            depends_on_id,
            add,
        } => {
            if add {
                store.add_dependency(&task_id, &depends_on_id)?;
            } else {
                store.remove_dependency(&task_id, &depends_on_id)?;
            }
            Ok(Outcome::Written)
        }
        Mutation::CreateProject { name } => {
            if store.find_project_by_name(&name)?.is_some() {
                return Err(StoreError::Invalid(format!("project {} already exists", name)));
            }
            Ok(Outcome::ProjectCreated(store.ensure_project(&name)?))
        }
        Mutation::DeleteProject { id } => {
            store.delete_project(&id)?;
            info!(project = %id, "project deleted");
            Ok(Outcome::Written)
        }
        Mutation::CreateTag { name } => {
            if store.find_tag_by_name(&name)?.is_some() {
                return Err(StoreError::Invalid(format!("tag {} already exists", name)));
            }
            Ok(Outcome::TagCreated(store.ensure_tag(&name)?))
        }
        Mutation::RecolorProjects(colors) => {
            for (id, color) in &colors {
                store.update_project_color(id, color)?;
            }
            Ok(Outcome::Written)
        }
        Mutation::RecolorTags(colors) => {
            for (id, color) in &colors {
                store.update_tag_color(id, color)?;
            }
            Ok(Outcome::Written)
        }
        Mutation::StartTimer { task_id } => {
            let entry = store.start_timer(&task_id, now)?;
            info!(task = %task_id, "timer started");
            Ok(Outcome::TimerStarted(entry))
        }
        Mutation::StopTimer => {
            let entry = store.stop_timer(now)?;
            info!(minutes = ?entry.as_ref().and_then(|e| e.duration), "timer stopped");
            Ok(Outcome::TimerStopped(entry))
        }
        Mutation::AddTime { task_id, minutes } => {
            Ok(Outcome::TimeLogged(store.add_time_entry(&task_id, minutes, now)?))
        }
    }
}

/// Handle to the store thread.
pub struct Worker {
    tx: Sender<Request>,
    rx: Receiver<Message>,
}

impl Worker {
    /// Move `store` onto its own thread. The thread exits when the worker is
    /// dropped.
    pub fn spawn(store: Store) -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (msg_tx, msg_rx) = mpsc::channel();

        thread::Builder::new()
            .name("tend-store".into())
            .spawn(move || {
                while let Ok(request) = req_rx.recv() {
                    if msg_tx.send(execute(&store, request)).is_err() {
                        break;
                    }
                }
                debug!("store worker stopped");
            })?;

        Ok(Worker {
            tx: req_tx,
            rx: msg_rx,
        })
    }

    /// Queue a request. Returns false if the worker thread is gone.
    pub fn send(&self, request: Request) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Non-blocking poll for finished requests.
    pub fn poll(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INBOX_ID;
    use std::time::Duration;

    fn mutate(mutation: Mutation) -> Request {
        Request::Mutate {
            mutation,
            reload: true,
        }
    }

    #[test]
    fn insert_then_reload() {
        let store = Store::open_in_memory().unwrap();
        let mut task = Task::new("Write report", Utc::now());
        task.project_id = Some(INBOX_ID.into());

        match execute(&store, mutate(Mutation::Insert(vec![task.clone()]))) {
            Message::Mutated { result, reload } => {
                assert_eq!(result, Ok(Outcome::Written));
                assert!(reload);
            }
            other => panic!("unexpected {:?}", other),
        }
        match execute(&store, Request::Reload) {
            Message::Loaded(Ok(data)) => assert_eq!(data.tasks[0].id, task.id),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failures_become_strings() {
        let store = Store::open_in_memory().unwrap();
        match execute(&store, mutate(Mutation::Delete(vec!["missing".into()]))) {
            Message::Mutated { result: Err(msg), .. } => assert!(msg.contains("missing")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn delete_reports_links_and_entries_for_restore() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        let mut a = Task::new("A", now);
        a.project_id = Some(INBOX_ID.into());
        let mut b = Task::new("B", now);
        b.project_id = Some(INBOX_ID.into());
        store.insert_task(&a).unwrap();
        store.insert_task(&b).unwrap();
        store.add_dependency(&b.id, &a.id).unwrap();
        store.add_time_entry(&a.id, 30, now).unwrap();

        let deleted = execute(&store, mutate(Mutation::Delete(vec![a.id.clone()])));
        let (links, entries) = match deleted {
            Message::Mutated {
                result: Ok(Outcome::Deleted { ids, links, entries }),
                ..
            } => {
                assert_eq!(ids, vec![a.id.clone()]);
                (links, entries)
            }
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(links, vec![(b.id.clone(), a.id.clone())]);
        assert_eq!(entries.len(), 1);

        let restore = Mutation::Restore {
            tasks: vec![a.clone()],
            links,
            entries,
        };
        assert!(matches!(
            execute(&store, mutate(restore)),
            Message::Mutated { result: Ok(Outcome::Written), .. }
        ));
        assert!(store.is_blocked(&b.id).unwrap());
        assert_eq!(store.time_entries_for_task(&a.id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_the_inbox_fails() {
        let store = Store::open_in_memory().unwrap();
        let result = execute(
            &store,
            mutate(Mutation::DeleteProject {
                id: INBOX_ID.into(),
            }),
        );
        assert!(matches!(result, Message::Mutated { result: Err(_), .. }));
    }

    #[test]
    fn duplicate_project_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let first = execute(&store, mutate(Mutation::CreateProject { name: "Work".into() }));
        assert!(matches!(
            first,
            Message::Mutated {
                result: Ok(Outcome::ProjectCreated(_)),
                ..
            }
        ));
        let second = execute(&store, mutate(Mutation::CreateProject { name: "work".into() }));
        assert!(matches!(second, Message::Mutated { result: Err(_), .. }));
    }

    #[test]
    fn timer_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let task = Task::new("Focus", Utc::now());
        store.insert_task(&task).unwrap();

        let started = execute(
            &store,
            mutate(Mutation::StartTimer {
                task_id: task.id.clone(),
            }),
        );
        assert!(matches!(
            started,
            Message::Mutated {
                result: Ok(Outcome::TimerStarted(_)),
                ..
            }
        ));
        match execute(&store, Request::LoadTimer) {
            Message::Timer(Ok(Some(entry))) => assert_eq!(entry.task_id, task.id),
            other => panic!("unexpected {:?}", other),
        }
        let stopped = execute(&store, mutate(Mutation::StopTimer));
        assert!(matches!(
            stopped,
            Message::Mutated {
                result: Ok(Outcome::TimerStopped(Some(_))),
                ..
            }
        ));
    }

    #[test]
    fn spawned_worker_answers() {
        let worker = Worker::spawn(Store::open_in_memory().unwrap()).unwrap();
        assert!(worker.send(Request::Reload));

        let mut messages = Vec::new();
        for _ in 0..200 {
            messages = worker.poll();
            if !messages.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(matches!(messages.as_slice(), [Message::Loaded(Ok(_))]));
    }
}
