use std::time::Duration;

use anyhow::Result;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::utils::clock::Clock;

use super::machine::{PomodoroTimer, TimerConfig, TimerFrame, TimerState};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    Configure(TimerConfig),
}

/// Drives a [PomodoroTimer] in real time. Commands come in through a channel, every change is
/// sent out as a [TimerFrame].
///
/// There is at most one pending tick at any moment. Starting an already running timer keeps the
/// existing schedule, pausing or resetting drops it.
pub struct TimerSession {
    timer: PomodoroTimer,
    commands: mpsc::Receiver<TimerCommand>,
    frames: mpsc::Sender<TimerFrame>,
    shutdown: CancellationToken,
    tick_period: Duration,
    clock: Box<dyn Clock>,
}

impl TimerSession {
    pub fn new(
        timer: PomodoroTimer,
        commands: mpsc::Receiver<TimerCommand>,
        frames: mpsc::Sender<TimerFrame>,
        shutdown: CancellationToken,
        tick_period: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            timer,
            commands,
            frames,
            shutdown,
            tick_period,
            clock,
        }
    }

    /// Executes the session event loop. Ends on shutdown or when every command sender is gone and
    /// returns the final state of the timer.
    pub async fn run(self) -> Result<PomodoroTimer> {
        let TimerSession {
            mut timer,
            mut commands,
            frames,
            shutdown,
            tick_period,
            clock,
        } = self;

        let mut next_tick: Option<Instant> = None;
        publish(&frames, &timer).await?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Timer session cancelled");
                    return Ok(timer)
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("Command channel closed, stopping timer session");
                        return Ok(timer)
                    };
                    debug!("Received {command:?}");
                    match command {
                        TimerCommand::Start => {
                            timer.start();
                        }
                        TimerCommand::Pause => {
                            timer.pause();
                        }
                        TimerCommand::Reset => timer.reset(),
                        TimerCommand::Configure(config) => {
                            timer.configure(config);
                        }
                    }
                    next_tick = match (timer.state(), next_tick) {
                        (TimerState::Running, Some(pending)) => Some(pending),
                        (TimerState::Running, None) => Some(clock.instant() + tick_period),
                        (TimerState::Idle | TimerState::Paused, _) => None,
                    };
                    publish(&frames, &timer).await?;
                }
                _ = wait_for_tick(clock.as_ref(), next_tick) => {
                    let scheduled = next_tick.unwrap_or_else(|| clock.instant());
                    if let Some(change) = timer.tick() {
                        info!(
                            "Phase {} finished, {} started ({} cycles done)",
                            change.from, change.to, change.cycle_count
                        );
                    }
                    next_tick = (timer.state() == TimerState::Running)
                        .then_some(scheduled + tick_period);
                    publish(&frames, &timer).await?;
                }
            }
        }
    }
}

async fn wait_for_tick(clock: &dyn Clock, tick: Option<Instant>) {
    match tick {
        Some(instant) => clock.sleep_until(instant).await,
        None => std::future::pending().await,
    }
}

async fn publish(frames: &mpsc::Sender<TimerFrame>, timer: &PomodoroTimer) -> Result<()> {
    frames
        .send(timer.frame())
        .await
        .inspect_err(|e| error!("Timer output is gone {e:?}"))?;
    Ok(())
}
