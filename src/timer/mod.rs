//! Pomodoro focus timer. [machine::PomodoroTimer] holds the phase logic and counts abstract
//! seconds, [session::TimerSession] feeds it real time.

pub mod machine;
pub mod session;
