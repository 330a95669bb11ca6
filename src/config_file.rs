use crate::cli::{Args, Strategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// JSON configuration file format. Every field is optional; CLI flags that
/// were given explicitly always win over config file values.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFileJson {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub strategy: Option<String>,
    pub reference_color: Option<String>,
    pub tolerance: Option<u8>,
    pub red_range: Option<String>,
    pub green_range: Option<String>,
    pub blue_range: Option<String>,
    pub inner_threshold: Option<f32>,
    pub outer_threshold: Option<f32>,
    pub hue_range: Option<String>,
    pub saturation_range: Option<String>,
    pub value_range: Option<String>,
    pub sample_inset: Option<u32>,
    pub trim: Option<bool>,
    pub destructive: Option<bool>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
    pub force: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line
    /// arguments. Command-line arguments take precedence over config file
    /// values.
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: ConfigFileJson = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            self.merge_from_config(config);

            if self.verbose {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: ConfigFileJson) {
        // We check if arguments were explicitly provided on the command line
        let args_from_cli = std::env::args().collect::<Vec<_>>();
        let given = |flag: &str| args_from_cli.iter().any(|a| a == flag);

        if !given("-i") && !given("--input") {
            if let Some(input) = config.input_path {
                self.input_paths = vec![PathBuf::from(input)];
            }
        }

        if !given("-o") && !given("--output") {
            if let Some(output) = config.output_path {
                self.output_dir = PathBuf::from(output);
            }
        }

        if !given("--strategy") {
            if let Some(strategy) = config.strategy {
                self.strategy = match strategy.as_str() {
                    "exact-tolerance" | "exactTolerance" => Strategy::ExactTolerance,
                    "range" => Strategy::Range,
                    "distance-feather" | "distanceFeather" => Strategy::DistanceFeather,
                    "hsv-range" | "hsvRange" => Strategy::HsvRange,
                    _ => self.strategy.clone(),
                };
            }
        }

        if !given("--reference-color") {
            if let Some(color) = config.reference_color {
                self.reference_color = color;
            }
        }

        if !given("--tolerance") {
            if let Some(tolerance) = config.tolerance {
                self.tolerance = tolerance;
            }
        }

        if !given("--red-range") {
            if let Some(range) = config.red_range {
                self.red_range = range;
            }
        }
        if !given("--green-range") {
            if let Some(range) = config.green_range {
                self.green_range = range;
            }
        }
        if !given("--blue-range") {
            if let Some(range) = config.blue_range {
                self.blue_range = range;
            }
        }

        if !given("--inner-threshold") {
            if let Some(threshold) = config.inner_threshold {
                self.inner_threshold = threshold;
            }
        }
        if !given("--outer-threshold") {
            if let Some(threshold) = config.outer_threshold {
                self.outer_threshold = threshold;
            }
        }

        if !given("--hue-range") {
            if let Some(range) = config.hue_range {
                self.hue_range = range;
            }
        }
        if !given("--saturation-range") {
            if let Some(range) = config.saturation_range {
                self.saturation_range = range;
            }
        }
        if !given("--value-range") {
            if let Some(range) = config.value_range {
                self.value_range = range;
            }
        }

        if !given("--sample-inset") {
            if let Some(inset) = config.sample_inset {
                self.sample_inset = inset;
            }
        }

        if !given("--extensions") {
            if let Some(extensions) = config.extensions {
                self.extensions_str = extensions;
            }
        }

        if self.jobs == 0 {
            if let Some(jobs) = config.jobs {
                self.jobs = jobs;
            }
        }

        // Boolean flags - only apply if currently false (default)
        if !self.trim {
            self.trim = config.trim.unwrap_or(false);
        }
        if !self.destructive {
            self.destructive = config.destructive.unwrap_or(false);
        }
        if !self.force {
            self.force = config.force.unwrap_or(false);
        }
        if !self.dry_run {
            self.dry_run = config.dry_run.unwrap_or(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_json() {
        let json = r#"{
            "strategy": "hsv-range",
            "hueRange": "0.45-0.55",
            "trim": true,
            "jobs": 4
        }"#;
        let config: ConfigFileJson = serde_json::from_str(json).unwrap();
        assert_eq!(config.strategy.as_deref(), Some("hsv-range"));
        assert_eq!(config.hue_range.as_deref(), Some("0.45-0.55"));
        assert_eq!(config.trim, Some(true));
        assert_eq!(config.jobs, Some(4));
        assert!(config.reference_color.is_none());
    }

    #[test]
    fn test_merge_fills_defaults_only() {
        let mut args = Args::default();
        let config = ConfigFileJson {
            strategy: Some("distance-feather".to_string()),
            inner_threshold: Some(20.0),
            outer_threshold: Some(60.0),
            trim: Some(true),
            jobs: Some(2),
            ..Default::default()
        };
        args.merge_from_config(config);

        assert_eq!(args.strategy, Strategy::DistanceFeather);
        assert_eq!(args.inner_threshold, 20.0);
        assert_eq!(args.outer_threshold, 60.0);
        assert!(args.trim);
        assert_eq!(args.jobs, 2);
    }

    #[test]
    fn test_merge_keeps_explicit_booleans() {
        let mut args = Args {
            trim: true,
            ..Default::default()
        };
        let config = ConfigFileJson {
            trim: Some(false),
            ..Default::default()
        };
        args.merge_from_config(config);
        assert!(args.trim);
    }
}
