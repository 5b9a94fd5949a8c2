use clap::{Args, Subcommand};
use fintrack_core::crypto::KEY_ENV;
use fintrack_core::DataCipher;

#[derive(Args)]
pub struct KeyCommand {
    #[command(subcommand)]
    pub command: KeySubcommand,
}

#[derive(Subcommand)]
pub enum KeySubcommand {
    /// Print a new random data encryption key
    Generate {
        /// Print the bare key without the variable name
        #[arg(long)]
        raw: bool,
    },
}

impl KeyCommand {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            KeySubcommand::Generate { raw } => {
                let key = DataCipher::generate_key();
                if *raw {
                    println!("{}", key);
                } else {
                    println!("{}={}", KEY_ENV, key);
                }
                Ok(())
            }
        }
    }
}
