//! Subcommand implementations
//!
//! Every command renders into memory first. Nothing is written until the
//! whole pipeline has succeeded.

use crate::cli::{Cli, TemplateFormat};
use anyhow::{Context, Result};
use brender_stack::{StackConfig, build, synthesize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Load the file (if any) and apply flag/environment overrides
pub fn load_config(cli: &Cli) -> Result<StackConfig> {
    let config = match &cli.config {
        Some(path) => StackConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => StackConfig::default(),
    };
    Ok(config.with_overrides(cli.overrides()))
}

/// Render the template as a string
pub fn render(config: StackConfig, format: TemplateFormat) -> Result<String> {
    let template = synthesize(config)?;
    let mut rendered = match format {
        TemplateFormat::Json => template.to_json_pretty()?,
        TemplateFormat::Yaml => template.to_yaml()?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

/// `synth`: write the template to `output` or to `out`
pub fn synth(config: StackConfig, format: TemplateFormat, output: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let rendered = render(config, format)?;
    match output {
        Some(path) => {
            fs::write(path, &rendered).with_context(|| format!("Failed to write template to {}", path.display()))?;
            info!("Wrote template to {}", path.display());
        }
        None => out.write_all(rendered.as_bytes())?,
    }
    Ok(())
}

/// `validate`: run validation and graph checks only
pub fn validate(config: StackConfig, out: &mut impl Write) -> Result<()> {
    let stack = build(config)?;
    let order = stack.graph.validate()?;
    writeln!(out, "{}: {} resources, graph OK", stack.stack_name, order.len())?;
    Ok(())
}

/// `graph`: one line per resource in dependency order
pub fn graph(config: StackConfig, out: &mut impl Write) -> Result<()> {
    let stack = build(config)?;
    for node in stack.graph.summary()? {
        let dependencies: Vec<&str> = node.dependencies.iter().map(String::as_str).collect();
        if dependencies.is_empty() {
            writeln!(out, "{} [{}] {}", node.logical_id, node.component, node.type_name)?;
        } else {
            writeln!(
                out,
                "{} [{}] {} <- {}",
                node.logical_id,
                node.component,
                node.type_name,
                dependencies.join(", ")
            )?;
        }
    }
    Ok(())
}

/// `schema`: JSON Schema of the configuration file
pub fn schema(out: &mut impl Write) -> Result<()> {
    let schema = schemars::schema_for!(StackConfig);
    writeln!(out, "{}", serde_json::to_string_pretty(&schema)?)?;
    Ok(())
}
