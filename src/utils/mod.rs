//! Utility modules shared by the commands.

pub mod command;
