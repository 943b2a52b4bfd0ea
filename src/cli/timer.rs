use std::io::Write;

use anyhow::{anyhow, Result};
use clap::Args;
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    select,
    sync::mpsc,
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    controller::Controller,
    store::{backend::FileBackend, document_store::DocumentStore},
    timer::{
        machine::{
            PomodoroTimer, TimerConfig, TimerFrame, DEFAULT_CYCLES, DEFAULT_FOCUS_MINUTES,
            DEFAULT_LONG_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES, MAX_PHASE_MINUTES,
        },
        session::{TimerCommand, TimerSession, DEFAULT_TICK_PERIOD},
    },
    utils::{clock::DefaultClock, shutdown::detect_shutdown},
};

#[derive(Args, Debug, Clone)]
pub struct TimerArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_FOCUS_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..=MAX_PHASE_MINUTES as i64),
        help = "Focus length in minutes"
    )]
    focus: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_SHORT_BREAK_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..=MAX_PHASE_MINUTES as i64),
        help = "Short break length in minutes"
    )]
    short_break: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_LONG_BREAK_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..=MAX_PHASE_MINUTES as i64),
        help = "Long break length in minutes"
    )]
    long_break: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_CYCLES,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Focus segments before a long break"
    )]
    cycles: u32,
}

impl TimerArgs {
    pub fn config(&self) -> TimerConfig {
        TimerConfig {
            focus_minutes: self.focus,
            short_break_minutes: self.short_break,
            long_break_minutes: self.long_break,
            cycles: self.cycles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Command(TimerCommand),
    Quit,
}

/// Parses one line typed while the timer runs. Settings commands update `config` and yield the
/// whole new configuration. Blank lines produce nothing.
fn parse_input(line: &str, config: &mut TimerConfig) -> Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let input = match command {
        "start" => Input::Command(TimerCommand::Start),
        "pause" => Input::Command(TimerCommand::Pause),
        "reset" => Input::Command(TimerCommand::Reset),
        "quit" | "exit" => Input::Quit,
        setting @ ("focus" | "short" | "long" | "cycles") => {
            let value = words
                .next()
                .ok_or_else(|| anyhow!("{setting} needs a value"))?
                .parse::<u32>()
                .map_err(|e| anyhow!("Invalid {setting} value: {e}"))?;
            if value == 0 {
                return Err(anyhow!("{setting} must be at least 1"));
            }
            if setting != "cycles" && value > MAX_PHASE_MINUTES {
                return Err(anyhow!("{setting} can't be longer than {MAX_PHASE_MINUTES} minutes"));
            }
            match setting {
                "focus" => config.focus_minutes = value,
                "short" => config.short_break_minutes = value,
                "long" => config.long_break_minutes = value,
                _ => config.cycles = value,
            }
            Input::Command(TimerCommand::Configure(*config))
        }
        other => return Err(anyhow!("Unknown command {other}")),
    };
    Ok(Some(input))
}

/// Runs the timer in the terminal until the user quits, stdin closes or Ctrl-C is pressed.
pub async fn run_timer(
    controller: &mut Controller<DocumentStore<FileBackend>>,
    args: TimerArgs,
) -> Result<()> {
    let config = args.config();
    let shutdown = CancellationToken::new();
    let (command_sender, command_receiver) = mpsc::channel(16);
    let (frame_sender, frame_receiver) = mpsc::channel(16);

    let session = TimerSession::new(
        PomodoroTimer::new(config),
        command_receiver,
        frame_sender,
        shutdown.clone(),
        DEFAULT_TICK_PERIOD,
        Box::new(DefaultClock),
    );

    println!("Commands: start, pause, reset, focus|short|long|cycles <n>, quit");

    let (_, timer, _, _) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        async {
            let result = session.run().await;
            shutdown.cancel();
            result
        },
        read_commands(command_sender, config, shutdown.clone()),
        print_frames(controller, frame_receiver),
    );
    println!();

    let timer = timer?;
    info!(
        "Timer stopped in {} with {} cycles done",
        timer.phase(),
        timer.cycle_count()
    );
    Ok(())
}

async fn read_commands(
    commands: mpsc::Sender<TimerCommand>,
    mut config: TimerConfig,
    shutdown: CancellationToken,
) {
    let mut lines = LinesStream::new(BufReader::new(stdin()).lines());
    loop {
        let line = select! {
            _ = shutdown.cancelled() => return,
            line = lines.next() => line,
        };
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("Failed to read input {e:?}");
                continue;
            }
            None => {
                debug!("Input closed");
                shutdown.cancel();
                return;
            }
        };
        match parse_input(&line, &mut config) {
            Ok(Some(Input::Command(command))) => {
                if commands.send(command).await.is_err() {
                    return;
                }
            }
            Ok(Some(Input::Quit)) => {
                shutdown.cancel();
                return;
            }
            Ok(None) => (),
            Err(e) => eprintln!("{e}"),
        }
    }
}

async fn print_frames(
    controller: &mut Controller<DocumentStore<FileBackend>>,
    mut frames: mpsc::Receiver<TimerFrame>,
) {
    while let Some(frame) = frames.recv().await {
        let rendered = controller.apply_timer_frame(frame);
        print!(
            "\r{} {:<16}",
            rendered.timer_display, rendered.timer_status
        );
        if let Err(e) = std::io::stdout().flush() {
            warn!("Failed to flush output {e:?}");
        }
    }
}
