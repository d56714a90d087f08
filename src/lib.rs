pub mod api;
pub mod cli;
pub mod config;
pub mod graph;
pub mod pipeline;
pub mod render;
