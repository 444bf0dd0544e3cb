// src/web/mod.rs
pub mod client;
