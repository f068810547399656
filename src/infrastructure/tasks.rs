//! JSON 파일 기반 로컬 작업 저장소 어댑터.
//!
//! 레이아웃: `<root>/PR-<number>/tasks.json` (`{ "tasks": [...] }`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::ports::TaskStore;
use crate::domain::task::Task;

const PR_DIR_PREFIX: &str = "PR-";
const TASKS_FILE: &str = "tasks.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

pub struct JsonTaskStore {
    root: PathBuf,
}

impl JsonTaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tasks_path(&self, pr_number: u64) -> PathBuf {
        self.root
            .join(format!("{PR_DIR_PREFIX}{pr_number}"))
            .join(TASKS_FILE)
    }

    /// PR 하나의 작업 목록. 파일이 없으면 빈 목록이다.
    pub fn load_pr_tasks(&self, pr_number: u64) -> Result<Vec<Task>> {
        read_tasks(&self.tasks_path(pr_number))
    }

    pub fn save_pr_tasks(&self, pr_number: u64, tasks: &[Task]) -> Result<()> {
        let path = self.tasks_path(pr_number);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let file = TasksFile {
            tasks: tasks.to_vec(),
        };
        let rendered = serde_json::to_string_pretty(&file)?;
        fs::write(&path, format!("{rendered}\n"))
            .with_context(|| format!("failed to write tasks at {}", path.display()))
    }

    fn pr_task_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let dir = fs::read_dir(&self.root)
            .with_context(|| format!("failed to read task dir {}", self.root.display()))?;
        for item in dir {
            let item = item?;
            let is_pr_dir = item
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(PR_DIR_PREFIX));
            let path = item.path().join(TASKS_FILE);
            if is_pr_dir && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl TaskStore for JsonTaskStore {
    fn tasks_by_source_comment_id(&self, comment_id: i64) -> Result<Vec<Task>> {
        let mut out = Vec::new();
        for path in self.pr_task_files()? {
            out.extend(
                read_tasks(&path)?
                    .into_iter()
                    .filter(|t| t.source_comment_id == comment_id),
            );
        }
        Ok(out)
    }
}

fn read_tasks(path: &Path) -> Result<Vec<Task>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read tasks at {}", path.display()))?;
    let parsed: TasksFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))?;
    Ok(parsed.tasks)
}
