//! FlowState: a terminal Pomodoro timer with task tracking and weekly statistics.

pub mod app;
pub mod chart;
pub mod config;
pub mod input;
pub mod notify;
pub mod stats;
pub mod store;
pub mod tasks;
pub mod timer;
pub mod ui;
