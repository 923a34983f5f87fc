//! CLI subcommand implementations.

pub mod check;
pub mod history;
pub mod segments;
pub mod session;
pub mod status;
pub mod util;
