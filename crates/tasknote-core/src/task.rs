use chrono::Local;
use serde::{Deserialize, Serialize};

/// One persisted task. Field order is the on-disk order for both backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: String,
}

impl Task {
    pub fn new(id: u64, title: &str, description: &str) -> Self {
        Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            created_at: now_timestamp(),
        }
    }

    pub fn matches(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Next id is one past the largest id seen, so ids are never handed out twice
/// as long as the highest record survives. `None` once `u64::MAX` is taken.
pub fn next_id(tasks: &[Task]) -> Option<u64> {
    tasks.iter().map(|task| task.id).max().unwrap_or(0).checked_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, title: &str, description: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            created_at: "2026-01-01 09:00:00".to_string(),
        }
    }

    #[test]
    fn next_id_starts_at_one() {
        assert_eq!(next_id(&[]), Some(1));
    }

    #[test]
    fn next_id_follows_max_not_len() {
        let tasks = vec![task(7, "a", ""), task(3, "b", "")];
        assert_eq!(next_id(&tasks), Some(8));
    }

    #[test]
    fn next_id_is_none_after_max() {
        assert_eq!(next_id(&[task(u64::MAX, "last", "")]), None);
    }

    #[test]
    fn matches_is_case_insensitive_over_title_and_description() {
        let t = task(1, "Read book", "Chapter 1");
        assert!(t.matches("chapter"));
        assert!(t.matches("READ"));
        assert!(!t.matches("milk"));
    }

    #[test]
    fn timestamp_has_seconds_precision() {
        let stamp = now_timestamp();
        assert_eq!(stamp.len(), "2026-01-01 09:00:00".len());
    }

    #[test]
    fn json_defaults_optional_fields() {
        let parsed: Task = serde_json::from_str(r#"{"id": 4, "title": "Solo"}"#).expect("parse");
        assert_eq!(parsed.description, "");
        assert!(!parsed.completed);
    }
}
