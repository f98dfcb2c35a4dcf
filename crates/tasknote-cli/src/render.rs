use tasknote_core::Task;

const RULE_WIDTH: usize = 60;

pub fn status_marker(task: &Task) -> &'static str {
    if task.completed {
        "✓"
    } else {
        "○"
    }
}

pub fn render_task(task: &Task) -> String {
    let mut lines = vec![
        format!("[{}] ID: {}", status_marker(task), task.id),
        format!("    Title: {}", task.title),
    ];
    if !task.description.is_empty() {
        lines.push(format!("    Description: {}", task.description));
    }
    lines.push(format!("    Created: {}", task.created_at));
    lines.join("\n")
}

pub fn render_listing(heading: &str, tasks: &[Task]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("\n{rule}\n{heading}\n{rule}\n\n");
    for task in tasks {
        out.push_str(&render_task(task));
        out.push_str("\n\n");
    }
    out
}
