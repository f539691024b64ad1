pub mod cache;
pub mod compute;
pub mod config;
pub mod stats;
pub mod validate;
pub mod visualize;
