// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds argument parsing and terminal setup.
pub mod analytics;
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod phases;
pub mod report;
pub mod runtime;
pub mod session;
pub mod ticker;
pub mod timer;
pub mod ui;
pub mod util;
