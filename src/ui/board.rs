//! Plain-text rendering of the board, a task and the project list.
//!
//! Everything renders to a `String` so commands can print it and tests can
//! inspect it. Colour comes from `console` and is dropped automatically when
//! the output is not a terminal.

use console::{StyledObject, style};
use std::fmt::Write;

use crate::board::filter::ColumnView;
use crate::board::models::{Comment, PersonBrief, Project, Task, TaskStatus};
use crate::ui::icons::{ATTACHMENT, CARD, COLUMN, COMMENT, PERSON, TAG};

const WRAP_WIDTH: usize = 72;

pub fn status_style(status: TaskStatus) -> StyledObject<&'static str> {
    let title = status.title();
    match status {
        TaskStatus::NotStarted => style(title).dim(),
        TaskStatus::Planning => style(title).blue(),
        TaskStatus::Development => style(title).yellow(),
        TaskStatus::Testing => style(title).magenta(),
        TaskStatus::Finished => style(title).green(),
    }
}

fn assignee_name<'a>(task: &'a Task, members: &'a [PersonBrief]) -> Option<&'a str> {
    if let Some(ref person) = task.assignee {
        return Some(&person.name);
    }
    let id = task.assignee_id?;
    members
        .iter()
        .find(|m| m.person_id == id)
        .map(|m| m.name.as_str())
}

fn card_line(task: &Task, members: &[PersonBrief]) -> String {
    let mut line = format!(
        "  {}{} {} {}",
        CARD,
        style(format!("#{}", task.task_id)).dim(),
        task.name,
        style(format!("[S{} P{}]", task.severity, task.priority)).dim()
    );
    if let Some(name) = assignee_name(task, members) {
        let _ = write!(line, " {}{}", PERSON, style(name).cyan());
    }
    line
}

/// The five columns with their counts, one card per line.
pub fn render_board(columns: &[ColumnView<'_>], members: &[PersonBrief]) -> String {
    let mut out = String::new();
    for view in columns {
        let _ = writeln!(
            out,
            "{}{} ({})",
            COLUMN,
            style(view.column.title).bold(),
            view.len()
        );
        if view.is_empty() {
            let _ = writeln!(out, "  {}", style("(empty)").dim());
        }
        for task in &view.tasks {
            let _ = writeln!(out, "{}", card_line(task, members));
        }
        out.push('\n');
    }
    out
}

/// A task with its description, comments and attachments.
///
/// `download_url` turns an attachment id into a link.
pub fn render_detail(
    task: &Task,
    comments: &[Comment],
    download_url: impl Fn(i64) -> String,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        style(format!("#{}", task.task_id)).dim(),
        style(&task.name).bold()
    );
    let _ = writeln!(
        out,
        "Status: {}  Severity: {}  Priority: {}",
        status_style(task.status),
        task.severity,
        task.priority
    );
    if let Some(ref person) = task.assignee {
        let _ = writeln!(out, "Assignee: {}{} <{}>", PERSON, person.name, person.email);
    }
    if let Some(ref due) = task.due_date {
        let _ = writeln!(out, "Due: {}", due);
    }
    if !task.tags.is_empty() {
        let tags: Vec<&str> = task.tags.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}{}", TAG, tags.join(", "));
    }
    if let Some(ref description) = task.description
        && !description.trim().is_empty()
    {
        out.push('\n');
        let _ = writeln!(out, "{}", textwrap::fill(description, WRAP_WIDTH));
    }

    if !task.attachments.is_empty() {
        let _ = writeln!(out, "\n{}", style("Attachments").bold());
        for attachment in &task.attachments {
            let _ = writeln!(
                out,
                "  {}{} ({}) {}",
                ATTACHMENT,
                attachment.file_name,
                attachment.file_type,
                style(download_url(attachment.attachment_id)).dim()
            );
        }
    }

    let _ = writeln!(out, "\n{} ({})", style("Comments").bold(), comments.len());
    for comment in comments {
        let author = comment
            .person
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("person {}", comment.person_id));
        let edited = if comment.edited_at.is_some() {
            " (edited)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {}{} {}{}",
            COMMENT,
            style(author).cyan(),
            style(&comment.created_at).dim(),
            edited
        );
        let options = textwrap::Options::new(WRAP_WIDTH)
            .initial_indent("    ")
            .subsequent_indent("    ");
        let _ = writeln!(out, "{}", textwrap::fill(&comment.text, options));
    }
    out
}

pub fn render_projects(projects: &[Project]) -> String {
    let mut out = String::new();
    for project in projects {
        let archived = if project.is_archived {
            style(" (archived)").dim().to_string()
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{:>5}  {}{}",
            style(project.project_id).dim(),
            project.name,
            archived
        );
    }
    out
}
