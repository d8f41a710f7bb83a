//! JSONL storage for tasks
//!
//! Tasks live in `.taskboard/tasks.jsonl` with one JSON object per line; a
//! later line for the same ID wins. The board confirms several moves at once,
//! so all access goes through `tasks.lock` beside the data file. Readers hold
//! it shared. Writers hold it exclusively for the whole read-modify-write and
//! rename a temp file of their own into place.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{Task, TaskId};

/// Disambiguates temp files of writers within one process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A held lock on the store, released when dropped
struct StoreLock {
    _file: File,
}

/// Store for task data in JSONL format
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".taskboard").join("tasks.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the file readers and writers lock
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Reads all tasks from the store
    pub fn read_all(&self) -> Result<HashMap<TaskId, Task>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let _lock = self.lock(false)?;
        self.load()
    }

    /// Reads all tasks in board order: oldest first, ties broken by ID
    pub fn list(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.read_all()?.into_values().collect();
        sort_for_board(&mut tasks);
        Ok(tasks)
    }

    /// Reads one task by ID
    pub fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.read_all()?.remove(id))
    }

    /// Appends a single task without rewriting the file
    pub fn append(&self, task: &Task) -> Result<()> {
        let _lock = self.lock(true)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        let mut writer = BufWriter::new(file);
        let line = serde_json::to_string(task).context("Failed to serialize task")?;
        writeln!(writer, "{}", line).context("Failed to write task")?;
        writer.flush().context("Failed to flush task store")?;

        Ok(())
    }

    /// Edits one stored task in place.
    ///
    /// `edit` sees the task as currently stored and returns whether it changed
    /// it; the file is only rewritten on a change. Returns the task after the
    /// edit, or `None` if no task has that ID.
    pub fn modify_task(
        &self,
        id: &TaskId,
        edit: impl FnOnce(&mut Task) -> bool,
    ) -> Result<Option<Task>> {
        let _lock = self.lock(true)?;

        let mut tasks = self.load()?;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(None);
        };
        let changed = edit(task);
        let task = task.clone();

        if changed {
            self.save(&tasks)?;
        }
        Ok(Some(task))
    }

    /// Removes a task by ID. Returns false if it was not stored.
    pub fn remove(&self, task_id: &TaskId) -> Result<bool> {
        let _lock = self.lock(true)?;

        let mut tasks = self.load()?;
        let removed = tasks.remove(task_id).is_some();
        if removed {
            self.save(&tasks)?;
        }
        Ok(removed)
    }

    fn lock(&self, exclusive: bool) -> Result<StoreLock> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        if exclusive {
            file.lock_exclusive()
                .context("Failed to acquire write lock on task store")?;
        } else {
            file.lock_shared()
                .context("Failed to acquire read lock on task store")?;
        }

        Ok(StoreLock { _file: file })
    }

    /// Parses the data file. The caller holds the lock.
    fn load(&self) -> Result<HashMap<TaskId, Task>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open task store: {}", self.path.display()))
            }
        };

        let mut tasks = HashMap::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let task: Task = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;
            tasks.insert(task.id.clone(), task);
        }

        Ok(tasks)
    }

    /// Replaces the data file with `tasks`. The caller holds the write lock.
    fn save(&self, tasks: &HashMap<TaskId, Task>) -> Result<()> {
        let temp_path = self.temp_path();

        let result = write_lines(&temp_path, tasks).and_then(|()| {
            fs::rename(&temp_path, &self.path).with_context(|| {
                format!(
                    "Failed to rename {} to {}",
                    temp_path.display(),
                    self.path.display()
                )
            })
        });

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(
            ".{}-{}.tmp",
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        PathBuf::from(name)
    }
}

fn sort_for_board(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Writes `tasks` in board order to a new file at `path` and syncs it
fn write_lines(path: &Path, tasks: &HashMap<TaskId, Task>) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Failed to create temp file: {}", path.display()))?;

    let mut ordered: Vec<Task> = tasks.values().cloned().collect();
    sort_for_board(&mut ordered);

    let mut writer = BufWriter::new(file);
    for task in &ordered {
        let line = serde_json::to_string(task).context("Failed to serialize task")?;
        writeln!(writer, "{}", line).context("Failed to write task")?;
    }

    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush task store")?
        .sync_all()
        .context("Failed to sync task store")
}
