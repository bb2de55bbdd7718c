// src/edinet/mod.rs
pub mod classify;
pub mod client;
pub mod models;
