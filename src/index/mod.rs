// src/index/mod.rs
pub mod builder;
pub mod resolver;
pub mod snapshot;
