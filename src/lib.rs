pub mod attack;
pub mod backup;
pub mod capture;
pub mod cli;
pub mod display;
pub mod error;
pub mod interface;
pub mod parser;
pub mod process;
pub mod prompt;
pub mod scan;
pub mod signal;

pub use error::{Error, Result};
