#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod comments;
pub mod config;
pub mod data;
pub mod feed;
pub mod hackernews;
pub mod logging;
pub mod polls;
pub mod sidebar;
pub mod text;
pub mod throttle;
pub mod ui;
pub mod update;
pub mod view;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
