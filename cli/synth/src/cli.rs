//! Command-line arguments

use brender_stack::Overrides;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Synthesize the BRender Studio render farm template
#[derive(Debug, Parser)]
#[command(name = "brender-synth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "BRENDER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Stack name
    #[arg(long, env = "BRENDER_STACK_NAME", global = true)]
    pub stack_name: Option<String>,

    /// Comma-delimited Blender versions, e.g. "GPU-4.0.0,CPU-3.6.0"
    #[arg(long, env = "BRENDER_BLENDER_VERSIONS", global = true)]
    pub blender_versions: Option<String>,

    /// Name of the render bucket
    #[arg(long, env = "BRENDER_BUCKET_NAME", global = true)]
    pub bucket_name: Option<String>,

    /// Place compute pools in the private subnets
    #[arg(long, env = "BRENDER_PRIVATE", global = true, num_args = 0..=1, default_missing_value = "true")]
    pub private: Option<bool>,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flag and environment values that replace file values
    pub fn overrides(&self) -> Overrides {
        Overrides {
            stack_name: self.stack_name.clone(),
            blender_versions: self.blender_versions.clone(),
            bucket_name: self.bucket_name.clone(),
            private: self.private,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the CloudFormation template
    Synth {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Template format
        #[arg(long, value_enum, default_value_t = TemplateFormat::Json)]
        format: TemplateFormat,
    },

    /// Validate the configuration and the resource graph without rendering
    Validate,

    /// Print resources in dependency order
    Graph,

    /// Print the JSON Schema of the configuration file
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}
