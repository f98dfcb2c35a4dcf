use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{StoreError, TaskStore};
use crate::task::Task;

pub const SLUG_MAX_LEN: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("Missing front matter delimiter")]
    MissingFrontMatter,
    #[error("Missing closing --- for front matter")]
    MissingFrontMatterEnd,
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
    #[error("Invalid value for `{field}`: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// One Markdown file per task, named `{id}-{slug}.md`, with the record in
/// YAML front matter and a readable heading/body underneath.
#[derive(Debug, Clone)]
pub struct VaultStore {
    dir: PathBuf,
}

impl VaultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        VaultStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn task_path(&self, task: &Task) -> PathBuf {
        self.dir.join(task_file_name(task))
    }

    fn markdown_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.dir, err)),
        };
        let mut entries = Vec::new();
        for entry in read_dir {
            let path = entry.map_err(|err| StoreError::io(&self.dir, err))?.path();
            if path.is_file() && path.extension().map(|ext| ext == "md").unwrap_or(false) {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Current files per front-matter id. Files that do not parse are left
    /// out so a save never deletes something it could not identify.
    fn files_by_id(&self) -> Result<HashMap<u64, Vec<PathBuf>>, StoreError> {
        let mut by_id: HashMap<u64, Vec<PathBuf>> = HashMap::new();
        for path in self.markdown_files()? {
            let text = fs::read_to_string(&path).map_err(|err| StoreError::io(&path, err))?;
            if let Ok(task) = parse_task_markdown(&text) {
                by_id.entry(task.id).or_default().push(path);
            }
        }
        Ok(by_id)
    }
}

impl TaskStore for VaultStore {
    fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = Vec::new();
        let mut seen: HashMap<u64, PathBuf> = HashMap::new();
        for path in self.markdown_files()? {
            let text = fs::read_to_string(&path).map_err(|err| StoreError::io(&path, err))?;
            let task = parse_task_markdown(&text)
                .map_err(|err| StoreError::corrupt(&path, err.to_string()))?;
            if let Some(first) = seen.get(&task.id) {
                return Err(StoreError::corrupt(
                    &path,
                    format!("duplicate id {} (also in {})", task.id, first.display()),
                ));
            }
            seen.insert(task.id, path);
            tasks.push(task);
        }
        debug!(dir = %self.dir.display(), count = tasks.len(), "loaded vault");
        Ok(tasks)
    }

    fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::io(&self.dir, err))?;
        let existing = self.files_by_id()?;
        let targets: HashSet<PathBuf> = tasks.iter().map(|task| self.task_path(task)).collect();
        for task in tasks {
            let path = self.task_path(task);
            fs::write(&path, render_task_markdown(task))
                .map_err(|err| StoreError::io(&path, err))?;
            // Renamed titles and hand-named files leave other files holding this id.
            let stale = existing.get(&task.id).into_iter().flatten();
            for old in stale.filter(|old| !targets.contains(*old)) {
                warn!(task_id = task.id, path = %old.display(), "removing stale vault file");
                fs::remove_file(old).map_err(|err| StoreError::io(old, err))?;
            }
        }
        debug!(dir = %self.dir.display(), count = tasks.len(), "saved vault");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}

fn slug_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"\s+").expect("regex"),
            Regex::new(r"[^a-z0-9-]").expect("regex"),
            Regex::new(r"-{2,}").expect("regex"),
        )
    })
}

pub fn slugify(title: &str) -> String {
    let (whitespace, invalid, hyphens) = slug_patterns();
    let lower = title.to_lowercase();
    let hyphenated = whitespace.replace_all(&lower, "-");
    let stripped = invalid.replace_all(&hyphenated, "");
    let collapsed = hyphens.replace_all(&stripped, "-");
    let truncated: String = collapsed
        .trim_matches('-')
        .chars()
        .take(SLUG_MAX_LEN)
        .collect();
    let slug = truncated.trim_end_matches('-');
    if slug.is_empty() {
        "task".to_string()
    } else {
        slug.to_string()
    }
}

pub fn task_file_name(task: &Task) -> String {
    format!("{}-{}.md", task.id, slugify(&task.title))
}

pub fn render_task_markdown(task: &Task) -> String {
    let mut lines = vec![
        "---".to_string(),
        format!("id: {}", task.id),
        format!("title: {}", quote_yaml(&task.title)),
        format!("description: {}", quote_yaml(&task.description)),
        format!("completed: {}", task.completed),
        format!("created_at: {}", quote_yaml(&task.created_at)),
        "---".to_string(),
        String::new(),
        format!("# {}", task.title),
        String::new(),
    ];
    if !task.description.is_empty() {
        lines.push(task.description.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn parse_task_markdown(text: &str) -> Result<Task, FrontMatterError> {
    let (front, _body) = split_front_matter(text)?;
    let data = parse_front_matter(&front);

    let id = match data.get("id") {
        None | Some(Value::Null) => return Err(FrontMatterError::MissingField("id")),
        Some(value) => {
            let raw = value_to_string(value).unwrap_or_default();
            raw.trim()
                .parse::<u64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or(FrontMatterError::InvalidField {
                    field: "id",
                    value: raw,
                })?
        }
    };
    let title = data
        .get("title")
        .and_then(value_to_string)
        .ok_or(FrontMatterError::MissingField("title"))?;
    let description = data
        .get("description")
        .and_then(value_to_string)
        .unwrap_or_default();
    let completed = match data.get("completed") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            let raw = value_to_string(other).unwrap_or_default();
            match raw.trim().to_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(FrontMatterError::InvalidField {
                        field: "completed",
                        value: raw,
                    })
                }
            }
        }
    };
    let created_at = data
        .get("created_at")
        .and_then(value_to_string)
        .unwrap_or_default();

    Ok(Task {
        id,
        title,
        description,
        completed,
        created_at,
    })
}

pub fn split_front_matter(text: &str) -> Result<(String, String), FrontMatterError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() || lines[0].trim() != "---" {
        return Err(FrontMatterError::MissingFrontMatter);
    }
    let end_idx = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == "---")
        .map(|(idx, _)| idx)
        .ok_or(FrontMatterError::MissingFrontMatterEnd)?;
    let front = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n");
    Ok((front, body))
}

/// YAML double-quoted scalar.
fn quote_yaml(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn parse_front_matter(front: &str) -> HashMap<String, Value> {
    if let Ok(Value::Mapping(map)) = serde_yaml::from_str::<Value>(front) {
        let mut data = HashMap::new();
        for (key, value) in map {
            if let Some(key_str) = value_to_string(&key) {
                data.insert(key_str, value);
            }
        }
        if !data.is_empty() {
            return data;
        }
    }
    parse_front_matter_loose(front)
}

// Hand-edited files are not always valid YAML (e.g. an unescaped quote in a
// title); fall back to one `key: value` per line.
fn parse_front_matter_loose(front: &str) -> HashMap<String, Value> {
    let mut data = HashMap::new();
    for line in front.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, rest)) = trimmed.split_once(':') else {
            continue;
        };
        data.insert(
            key.trim().to_string(),
            Value::String(unquote_loose(rest.trim())),
        );
    }
    data
}

fn unquote_loose(value: &str) -> String {
    let inner = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(val) => Some(val.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(val) => Some(val.to_string()),
        Value::Null => None,
        _ => serde_yaml::to_string(value).ok().map(|s| s.trim().to_string()),
    }
}
