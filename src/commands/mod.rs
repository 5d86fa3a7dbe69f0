//! CLI commands

pub mod browse;
pub mod init;
pub mod list;
pub mod share;
pub mod show;
