use ansi_term::{Colour, Style};

use crate::{
    store::entities::{display_name, Checkin, Task, User},
    timer::machine::TimerFrame,
    utils::time::format_moment,
};

pub const NO_HISTORY: &str = "No check-ins yet";
pub const NO_OTHERS: &str = "No check-ins from others yet";

/// Text of every view, as of the last refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedViews {
    pub tasks: Vec<String>,
    pub history: Vec<String>,
    pub others: Vec<String>,
    pub timer_display: String,
    pub timer_status: String,
}

pub fn render_tasks(tasks: &[Task], selected: Option<&str>) -> Vec<String> {
    tasks
        .iter()
        .map(|task| {
            let is_selected = selected == Some(task.id.as_str());
            let marker = if is_selected { "*" } else { " " };
            let title = if is_selected {
                Colour::Green.bold().paint(task.title.as_str())
            } else {
                Style::new().bold().paint(task.title.as_str())
            };
            format!(
                "{marker} [{}] {title}\n    {}\n    deadline: {}",
                task.id,
                task.description,
                format_moment(task.deadline)
            )
        })
        .collect()
}

fn render_checkin(checkin: &Checkin, author: Option<&str>) -> String {
    let mut header = format_moment(checkin.created_at);
    if let Some(author) = author {
        header.push_str(" - ");
        header.push_str(author);
    }
    let mut text = format!(
        "{}\n{}",
        Colour::Fixed(244).paint(header),
        Style::new().bold().paint(checkin.task_title.as_str())
    );
    if !checkin.files.is_empty() {
        let names = checkin
            .files
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\n  files: {names}"));
    }
    if !checkin.notes.is_empty() {
        text.push_str(&format!("\n  notes: {}", checkin.notes));
    }
    text
}

pub fn render_history(checkins: &[Checkin]) -> Vec<String> {
    if checkins.is_empty() {
        return vec![NO_HISTORY.into()];
    }
    checkins.iter().map(|v| render_checkin(v, None)).collect()
}

/// Others' check-ins labelled with the author's name.
pub fn render_others(checkins: &[Checkin], users: &[User]) -> Vec<String> {
    if checkins.is_empty() {
        return vec![NO_OTHERS.into()];
    }
    checkins
        .iter()
        .map(|v| render_checkin(v, Some(display_name(users, &v.user_id))))
        .collect()
}

pub fn render_timer(frame: &TimerFrame) -> (String, String) {
    (frame.display.clone(), frame.status.to_string())
}
