// src/core/mod.rs

pub mod engine;
pub mod filters;
pub mod frequency;
pub mod gate;
pub mod tokenizer;
pub mod types;
