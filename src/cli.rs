use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{canonical_code, AppConfig, ConfigError};

#[derive(Debug, Parser)]
#[command(
    name = "access-checker",
    version,
    about = "Checks e-resource links against platform-specific access signatures"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every URL in a delimited file and append the verdicts to an output file
    Check(CheckArgs),
    /// List the registered platforms
    Platforms {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Platform code (see `platforms`)
    #[arg(short, long)]
    pub platform: String,

    /// Input file; the last column must hold the URL
    pub input: PathBuf,

    /// Output file; created with a header row, or appended to
    pub output: PathBuf,

    /// Add the `ebook package` column
    #[arg(long)]
    pub ebook_package: bool,

    /// Prefix a new output file with a UTF-8 byte-order mark
    #[arg(long)]
    pub bom: bool,

    /// Courtesy delay after each record, overriding the platform default
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,
}

impl CheckArgs {
    /// Flags take precedence over the environment. Fails on an unknown platform.
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        let code = canonical_code(&self.platform)?;
        config.output.ebook_package |= self.ebook_package;
        config.output.write_bom |= self.bom;
        if let Some(millis) = self.delay_ms {
            config
                .courtesy
                .overrides
                .insert(code.to_string(), std::time::Duration::from_millis(millis));
        }
        Ok(())
    }
}
