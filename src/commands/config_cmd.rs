use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("data_path: {}", config.data_path.value.display());
                        println!("  source: {}", config.data_path.source);
                        println!();

                        println!("port: {}", config.port.value);
                        println!("  source: {}", config.port.source);
                        println!();

                        println!("session_ttl_minutes: {}", config.session_ttl_minutes.value);
                        println!("  source: {}", config.session_ttl_minutes.source);
                        println!();

                        println!("allow_plaintext: {}", config.allow_plaintext.value);
                        println!("  source: {}", config.allow_plaintext.source);
                        println!();

                        println!(
                            "encryption: {}",
                            if config.encryption_enabled.value {
                                "enabled"
                            } else {
                                "disabled"
                            }
                        );
                        println!("  source: {}", config.encryption_enabled.source);
                    }
                }
                Ok(())
            }
        }
    }
}
