pub mod completions;
pub mod config;
pub mod data;
pub mod serve;
