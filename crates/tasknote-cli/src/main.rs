mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tasknote_core::config::{
    config_path, load_config, resolve_store_config, write_config, BackendKind, StoreConfig,
};
use tasknote_core::migration::{migrate_json_to_vault, MigrationError};
use tasknote_core::vault::task_file_name;
use tasknote_core::{StoreError, Task, TaskError, TaskService};

use crate::render::{render_listing, status_marker};

#[derive(Parser)]
#[command(
    name = "tasknote",
    version,
    about = "Personal task tracker backed by a JSON document or a Markdown vault"
)]
#[command(after_help = r#"EXAMPLES:
    tasknote add "Buy groceries" "Milk, eggs, bread"
    tasknote list
    tasknote search groceries
    tasknote complete 1

STORAGE:
    The store is chosen by .tasknote.toml (searched upwards from --root):
        backend = "json"     # tasks.json (default)
        backend = "vault"    # one Markdown file per task under vault/
    Set TASKNOTE_LOG=debug to trace store access."#)]
struct Cli {
    /// Directory used to find .tasknote.toml and resolve store paths
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new task
    Add {
        title: String,
        description: Option<String>,
    },
    /// List all tasks
    List {
        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search tasks by keyword in title or description
    Search {
        keyword: String,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as complete
    Complete { id: u64 },
    /// Copy tasks from the JSON document into the Markdown vault
    Migrate {
        /// Switch the project config to the vault backend afterwards
        #[arg(long)]
        use_vault: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKNOTE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let config = resolve_store_config(&root)?;

    match command {
        Command::Add { title, description } => {
            let service = TaskService::new(config.open_store());
            let task = service.add(&title, description.as_deref().unwrap_or(""))?;
            println!("✓ Task added successfully (ID: {})", task.id);
            println!("  Title: {}", task.title);
        }
        Command::List { json } => {
            let service = TaskService::new(config.open_store());
            let tasks = service.list_all()?;
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                let heading = format!("TASKS ({} total)", tasks.len());
                print!("{}", render_listing(&heading, &tasks));
            }
        }
        Command::Search { keyword, json } => {
            let service = TaskService::new(config.open_store());
            let tasks = service.search(&keyword)?;
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks found matching '{}'", keyword);
            } else {
                let heading = format!(
                    "SEARCH RESULTS for '{}' ({} found)",
                    keyword,
                    tasks.len()
                );
                print!("{}", render_listing(&heading, &tasks));
            }
        }
        Command::Complete { id } => {
            let service = TaskService::new(config.open_store());
            let completion = service.complete(id)?;
            if completion.already_completed {
                println!("Task {} is already completed.", id);
            } else {
                println!(
                    "✓ Task {} marked as complete: {}",
                    id, completion.task.title
                );
            }
        }
        Command::Migrate { use_vault } => return migrate(&config, use_vault),
    }
    Ok(ExitCode::SUCCESS)
}

fn migrate(config: &StoreConfig, use_vault: bool) -> Result<ExitCode> {
    let source = config.json_store();
    let target = config.vault_store();
    let result = match migrate_json_to_vault(&source, &target) {
        Ok(result) => result,
        Err(MigrationError::SourceMissing(path)) => {
            println!("No task document at {}. Nothing to migrate.", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(err.into()),
    };
    if result.migrated.is_empty() {
        println!("No tasks to migrate.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("Reading from: {}", result.from.display());
    println!("Writing to: {}", result.to.display());
    println!();
    for task in &result.migrated {
        println!("[{}] Migrated Task {}: {}", status_marker(task), task.id, task.title);
        println!("    → {}", task_file_name(task));
    }
    println!();
    println!(
        "✓ Migration complete! {} tasks converted to Markdown.",
        result.migrated.len()
    );
    println!("The original {} is kept as a backup.", result.from.display());
    if use_vault {
        let mut project = load_config(&config.root)?.unwrap_or_default();
        project.backend = Some(BackendKind::Vault);
        let path = write_config(&config.root, &project)?;
        println!("Now using the vault backend (set in {}).", path.display());
    } else if config.backend == BackendKind::Json {
        println!(
            "Set backend = \"vault\" in {} to use the vault, or rerun with --use-vault.",
            config_path(&config.root).display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json(tasks: &[Task]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(tasks)?);
    Ok(())
}

fn corrupt_path(err: &anyhow::Error) -> Option<&Path> {
    let store_err = if let Some(TaskError::Store(store_err)) = err.downcast_ref::<TaskError>() {
        store_err
    } else if let Some(MigrationError::Store(store_err)) = err.downcast_ref::<MigrationError>() {
        store_err
    } else {
        return None;
    };
    match store_err {
        StoreError::Corrupt { path, .. } => Some(path.as_path()),
        _ => None,
    }
}

fn report_error(err: &anyhow::Error) {
    eprintln!("Error: {:#}", err);
    if let Some(path) = corrupt_path(err) {
        eprintln!(
            "The task store could not be parsed. Delete {} to start fresh.",
            path.display()
        );
    }
}
