#![forbid(unsafe_code)]
pub use command::CommandLine;
pub use error::Error;

pub mod command;
pub mod error;
