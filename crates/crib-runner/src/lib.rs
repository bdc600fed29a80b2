pub mod automation;
pub mod config;
pub mod logging;
pub mod perception;
pub mod runner;
