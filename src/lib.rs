//! Backend of the class-recording portal: accounts, historical classes,
//! enrollments, time on the viewer page and material requests.
//!
//! [`app::build_router`] assembles the HTTP API; [`tracker`] holds the
//! time-on-page bookkeeping shared by the viewer model and the server.
pub mod app;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod tracker;
pub mod worker;
