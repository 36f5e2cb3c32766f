pub mod argparse;
pub mod commands;
pub mod error;
pub mod utils;

pub use error::CliError;
