//! Interactive command surface

pub mod command;
pub mod repl;

pub use command::Command;
pub use repl::Repl;
