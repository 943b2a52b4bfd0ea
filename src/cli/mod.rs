pub mod timer;
pub mod views;

use std::{path::PathBuf, process::ExitCode};

use ansi_term::Colour;
use anyhow::Result;
use clap::{Parser, Subcommand};
use timer::{run_timer, TimerArgs};
use tracing::{error, level_filters::LevelFilter};
use views::{print_entries, print_task};

use crate::{
    controller::{
        error::CommandError,
        forms::{PublishForm, DEFAULT_PARTICIPANTS},
        Controller, View,
    },
    store::{
        backend::FileBackend,
        document_store::{DocumentStore, StoreConfig, DEFAULT_USER_ID},
    },
    timer::machine::PomodoroTimer,
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Checkin", version, long_about = None)]
#[command(about = "Habit check-ins with a pomodoro focus timer", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/checkin or $HOME/.local/state/checkin"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, default_value = DEFAULT_USER_ID, help = "Id of the local user")]
    user: String,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "List tasks available for check-in")]
    Tasks {},
    #[command(about = "Publish a new task")]
    Publish {
        #[arg(long, default_value = "", help = "Title of the task")]
        title: String,
        #[arg(long, default_value = "", help = "What needs to be done")]
        description: String,
        #[arg(
            long,
            default_value = "",
            help = "Deadline. Examples are \"2025-01-01T00:00:00Z\", \"tomorrow 18:00\", \"15/03/2025\""
        )]
        deadline: String,
        #[arg(
            long,
            default_value_t = DEFAULT_PARTICIPANTS,
            help = "Maximum amount of participants"
        )]
        participants: u32,
    },
    #[command(about = "Check in against a task by attaching files")]
    Checkin {
        #[arg(long, help = "Id of the task, see `tasks`")]
        task: Option<String>,
        #[arg(long, default_value = "", help = "Optional notes")]
        notes: String,
        #[arg(help = "Files proving the check-in")]
        files: Vec<PathBuf>,
    },
    #[command(about = "Show your check-in history")]
    History {},
    #[command(about = "Show check-ins of other users")]
    Others {},
    #[command(about = "Run a pomodoro timer. Type start, pause, reset or quit while it runs")]
    Timer {
        #[command(flatten)]
        args: TimerArgs,
    },
}

pub async fn run_cli() -> Result<ExitCode> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir.join("logs"), logging_level, args.log)?;

    let store = DocumentStore::new(
        FileBackend::new(app_dir)?,
        StoreConfig {
            user_id: args.user,
            ..Default::default()
        },
        Box::new(DefaultClock),
    );

    let initial_frame = match &args.commands {
        Commands::Timer { args } => PomodoroTimer::new(args.config()).frame(),
        _ => PomodoroTimer::default().frame(),
    };
    let mut controller = Controller::new(store, initial_frame, Box::new(DefaultClock));

    let result = match controller.open().await.map(|_| ()) {
        Ok(_) => process_command(&mut controller, args.commands).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast::<CommandError>() {
            Ok(e) if e.is_recoverable() => {
                eprintln!("{}", Colour::Red.paint(e.to_string()));
                Ok(ExitCode::from(2))
            }
            Ok(e) => {
                error!("Command failed {e:?}");
                Err(e.into())
            }
            Err(e) => Err(e),
        },
    }
}

async fn process_command(
    controller: &mut Controller<DocumentStore<FileBackend>>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Tasks {} => {
            controller.switch_view(View::Checkin);
            print_entries("Tasks", &controller.rendered().tasks);
        }
        Commands::Publish {
            title,
            description,
            deadline,
            participants,
        } => {
            controller.switch_view(View::Publish);
            let task = controller
                .publish_task(PublishForm {
                    title,
                    description,
                    deadline,
                    max_participants: participants,
                })
                .await?;
            println!("{}", Colour::Green.paint("Task published"));
            print_task(&task);
        }
        Commands::Checkin { task, notes, files } => {
            controller.switch_view(View::Checkin);
            if let Some(task) = task {
                controller.select_task(&task).await?;
            }
            let checkin = controller.submit_checkin(&files, notes).await?;
            println!(
                "{}",
                Colour::Green.paint(format!(
                    "Checked in to \"{}\" with {} file(s)",
                    checkin.task_title,
                    checkin.files.len()
                ))
            );
            print_entries("History", &controller.rendered().history);
        }
        Commands::History {} => {
            controller.switch_view(View::Checkin);
            print_entries("History", &controller.rendered().history);
        }
        Commands::Others {} => {
            controller.switch_view(View::Others);
            print_entries("Others", &controller.rendered().others);
        }
        Commands::Timer { args } => {
            controller.switch_view(View::Timer);
            run_timer(controller, args).await?;
        }
    }
    Ok(())
}
