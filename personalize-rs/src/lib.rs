//! Recipient personalization templates.
//!
//! Renders content such as email bodies for one recipient at a time:
//! `{{ token }}` markers are replaced with recipient data and
//! `{{#if …}}` / `{{#unless …}}` blocks are kept or dropped per recipient.
//! See [`template`] for the syntax and [`catalog`] for the token vocabulary.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod lint;
pub mod template;

pub use config::EngineConfig;
pub use context::{flatten, FlatContext, Recipient};
pub use template::{compile, render, BlockMode, Renderer, Template, Value};
