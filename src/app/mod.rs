//! Application orchestration: routes, state, background jobs and input
//! handling.

pub mod api_runtime;
pub mod event;
pub mod form;
pub mod handler;
pub mod reveal;
pub mod route;
pub mod settings;
pub mod state;
