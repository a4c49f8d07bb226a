// src/lib.rs

pub mod categories;
pub mod config;
pub mod core;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod state;

pub use crate::core::engine::CategoryExpander;
pub use crate::error::{ExpandError, ExpandResult};
