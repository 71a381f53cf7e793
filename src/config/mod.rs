// src/config/mod.rs
pub mod news;

pub use news::{DisplayConfig, NewsConfig, UpstreamConfig};
