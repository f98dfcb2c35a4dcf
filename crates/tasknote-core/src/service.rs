use thiserror::Error;
use tracing::info;

use crate::store::{StoreError, TaskStore};
use crate::task::{next_id, Task};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("Task {0} not found.")]
    NotFound(u64),
    #[error("No task ids left: the highest id is already {}", u64::MAX)]
    IdsExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task: Task,
    pub already_completed: bool,
}

/// Task operations over a store. Each call loads the full list and, when it
/// mutates, writes the full list back.
pub struct TaskService<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        TaskService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add(&self, title: &str, description: &str) -> Result<Task, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::Validation("Task title required.".to_string()));
        }
        let mut tasks = self.store.load_all()?;
        let id = next_id(&tasks).ok_or(TaskError::IdsExhausted)?;
        let task = Task::new(id, title, description);
        tasks.push(task.clone());
        self.store.save_all(&tasks)?;
        info!(task_id = task.id, "added task");
        Ok(task)
    }

    pub fn list_all(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.load_all()?)
    }

    pub fn search(&self, keyword: &str) -> Result<Vec<Task>, TaskError> {
        let mut tasks = self.store.load_all()?;
        tasks.retain(|task| task.matches(keyword));
        Ok(tasks)
    }

    pub fn complete(&self, id: u64) -> Result<Completion, TaskError> {
        let mut tasks = self.store.load_all()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskError::NotFound(id))?;
        if task.completed {
            return Ok(Completion {
                task: task.clone(),
                already_completed: true,
            });
        }
        task.completed = true;
        let task = task.clone();
        self.store.save_all(&tasks)?;
        info!(task_id = id, "completed task");
        Ok(Completion {
            task,
            already_completed: false,
        })
    }
}
