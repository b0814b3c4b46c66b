// Public API - only expose the runner module
pub mod runner;

// Internal modules - organized by subsystem
mod batch;
mod config;
mod error;
mod formats;
mod io;
