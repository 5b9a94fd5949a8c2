mod config_cmd;
mod data;
mod key;

pub use config_cmd::ConfigCommand;
pub use data::{CheckCommand, InitCommand, InspectCommand};
pub use key::KeyCommand;

use clap::ValueEnum;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
