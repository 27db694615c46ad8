//! justlog - structured logging with rotation, retention and a browser viewer
//!
//! Build a [`logging::Logger`] once from a [`config::LoggerConfig`], pass it to
//! whatever needs to log, and serve [`viewer::router`] to read the result.

pub mod config;
pub mod logging;
pub mod viewer;
