//! Habit check-ins from the terminal. Tasks are published locally, check-ins attach files as
//! proof and a pomodoro timer helps to actually get the work done.
//!
//! Everything is kept in a single JSON document inside the application directory.

pub mod cli;
pub mod controller;
pub mod fs;
pub mod store;
pub mod timer;
pub mod utils;
