use ansi_term::Style;

use crate::{store::entities::Task, utils::time::format_moment};

pub fn print_entries(title: &str, entries: &[String]) {
    println!("{}", Style::new().bold().underline().paint(title));
    for entry in entries {
        println!("{entry}");
    }
}

pub fn print_task(task: &Task) {
    println!(
        "[{}] {}\n    {}\n    deadline: {}, up to {} participants",
        task.id,
        Style::new().bold().paint(task.title.as_str()),
        task.description,
        format_moment(task.deadline),
        task.max_participants
    );
}
