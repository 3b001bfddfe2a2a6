//! Voice code assistant: turns spoken (transcribed) programming requests into
//! code through a remote code-generation backend, and keeps chat history,
//! transcript and an editor buffer in sync.

pub mod app;
pub mod assistant;
pub mod backend;
pub mod config;
pub mod session;
