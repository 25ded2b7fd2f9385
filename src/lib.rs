#[macro_use]
mod macros;
pub(crate) mod common;
pub(crate) mod cutils;
pub(crate) mod engine;
pub(crate) mod exec;
pub(crate) mod jobs;
pub(crate) mod log;
pub(crate) mod system;

mod tsh;

pub use tsh::main as tsh_main;
