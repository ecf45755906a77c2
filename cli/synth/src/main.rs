//! brender-synth
//!
//! Synthesizes the BRender Studio render farm (VPC, Batch, EFS, S3, the
//! listing API and flow logs) into a CloudFormation template.

mod cli;
mod commands;
#[cfg(test)]
mod commands_test;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, LogFormat};
use std::io;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Command::Schema => commands::schema(&mut stdout),
        Command::Synth { output, format } => {
            commands::synth(commands::load_config(&cli)?, *format, output.as_deref(), &mut stdout)
        }
        Command::Validate => commands::validate(commands::load_config(&cli)?, &mut stdout),
        Command::Graph => commands::graph(commands::load_config(&cli)?, &mut stdout),
    }
}
