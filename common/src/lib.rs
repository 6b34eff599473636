//! Process plumbing shared by the workspace binaries.

pub mod config_file;
pub mod log_setup;
