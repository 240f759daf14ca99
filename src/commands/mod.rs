//! CLI commands for dupgen

pub mod classes;
pub mod dispatch;
pub mod export;
pub mod repositories;
pub mod script;
