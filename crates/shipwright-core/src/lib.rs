//! shipwright-core
//!
//! Turns a submitted task into a published static site: workspace, build,
//! commit, remote repository, push, hosting, availability poll, callback.
//!
//! # Modules
//! - **domain**: task descriptor, ids, stage outcomes, errors, run state
//! - **ports**: seams to git, the hosting API, HTTP, secrets, time and ids
//! - **impls**: production implementations of the ports
//! - **app**: pipeline stages, worker group, status board, intake, builder
//! - **config**: `PipelineConfig` and its validation

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;
