//! CLI command implementations

pub mod utils;

pub mod campaign;
pub mod completions;
pub mod init;
pub mod seed;
pub mod serve;
pub mod status;
pub mod sup;
pub mod token;
