//! Unit tests for the subcommands

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, TemplateFormat};
    use crate::commands::{graph, load_config, schema, synth, validate};
    use brender_stack::{ConfigError, StackConfig, SynthError};
    use clap::Parser;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
version: 1
stackName: BRENDER-STACK-FILE
bucketName: brender-from-file
blenderVersions:
  - GPU-4.0.0
  - CPU-3.6.0
"#;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("brender-synth").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn config(cli: &Cli) -> StackConfig {
        load_config(cli).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_flags_override_file() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("stack.yaml");
        fs::write(&path, CONFIG).unwrap_or_else(|e| panic!("{e}"));
        let path = path.to_string_lossy().into_owned();

        let cli = parse(&["--config", &path, "--private", "--bucket-name", "brender-from-flag", "validate"]);
        let loaded = config(&cli);
        assert_eq!(loaded.stack_name, "BRENDER-STACK-FILE");
        assert_eq!(loaded.bucket_name.as_deref(), Some("brender-from-flag"));
        assert!(loaded.private);

        let validated = loaded.validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(validated.versions.len(), 2);
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let cli = parse(&["--config", "/nonexistent/stack.yaml", "validate"]);
        let error = load_config(&cli).err().unwrap_or_else(|| panic!("expected an error"));
        assert!(error.to_string().contains("/nonexistent/stack.yaml"));
    }

    #[test]
    fn test_synth_writes_json_to_stdout_and_yaml_to_file() {
        let cli = parse(&["--bucket-name", "brender-test", "--blender-versions", "CPU-4.0.0", "synth"]);

        let mut out = Vec::new();
        synth(config(&cli), TemplateFormat::Json, None, &mut out).unwrap_or_else(|e| panic!("{e}"));
        let template: Value = serde_json::from_slice(&out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert!(template["Resources"]["BatchJobDefn0"].is_object());

        let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("template.yaml");
        let mut out = Vec::new();
        synth(config(&cli), TemplateFormat::Yaml, Some(&path), &mut out).unwrap_or_else(|e| panic!("{e}"));
        assert!(out.is_empty());
        assert!(fs::read_to_string(&path).unwrap_or_else(|e| panic!("{e}")).contains("AWS::Batch::JobDefinition"));
    }

    #[test]
    fn test_failed_precondition_writes_nothing() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("template.json");
        let cli = parse(&["--blender-versions", "CPU-4.0.0", "synth"]);

        let mut out = Vec::new();
        let error = synth(config(&cli), TemplateFormat::Json, Some(&path), &mut out)
            .err()
            .unwrap_or_else(|| panic!("expected an error"));
        assert!(matches!(
            error.downcast_ref::<SynthError>(),
            Some(SynthError::Config(ConfigError::MissingBucketName))
        ));
        assert!(out.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_validate_and_graph_output() {
        let cli = parse(&["--bucket-name", "brender-test", "--blender-versions", "GPU-4.0.0", "graph"]);

        let mut out = Vec::new();
        validate(config(&cli), &mut out).unwrap_or_else(|e| panic!("{e}"));
        let summary = String::from_utf8(out).unwrap_or_else(|e| panic!("{e}"));
        assert!(summary.starts_with("BRENDER-STACK-V1: "));
        assert!(summary.contains("graph OK"));

        let mut out = Vec::new();
        graph(config(&cli), &mut out).unwrap_or_else(|e| panic!("{e}"));
        let listing = String::from_utf8(out).unwrap_or_else(|e| panic!("{e}"));
        let line = |id: &str| listing.lines().position(|l| l.starts_with(&format!("{id} [")));
        assert!(line("BatchVpc").is_some());
        assert!(line("BatchVpc") < line("JobQueueSpotGPU"));
        assert!(listing.contains("JobQueueSpotGPU [compute] AWS::Batch::JobQueue <- ComputeEnvSpotGPU"));
    }

    #[test]
    fn test_schema_describes_config_file() {
        let mut out = Vec::new();
        schema(&mut out).unwrap_or_else(|e| panic!("{e}"));
        let schema: Value = serde_json::from_slice(&out).unwrap_or_else(|e| panic!("{e}"));
        assert!(schema["properties"]["blenderVersions"].is_object());
        assert!(schema["properties"]["bucketName"].is_object());
    }
}
