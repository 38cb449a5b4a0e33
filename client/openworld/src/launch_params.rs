//! Launch parameter parsing for the headless runner.

use std::path::PathBuf;

use bevy::prelude::*;
use clap::Parser;
use openworld_sim::{Result, WorldLayout, config::TuningSet};

use crate::script::Scenario;

/// Default simulated duration in seconds.
const DEFAULT_DURATION: f32 = 30.0;
/// Default seed for NPC phases and camera shake.
const DEFAULT_SEED: u64 = 42;
/// Default interval between progress log lines, in seconds.
const DEFAULT_PROGRESS_INTERVAL: f32 = 5.0;

/// Launch parameters for the runner.
#[derive(Resource, Debug, Clone)]
pub struct LaunchParams {
    /// Scripted scenario to play.
    pub scenario: Scenario,
    /// Simulated seconds before the app exits.
    pub duration: f32,
    /// Named tuning preset.
    pub preset: String,
    /// JSON tuning overrides, applied instead of the preset.
    pub tuning_file: Option<PathBuf>,
    /// JSON world layout, replacing the reference city.
    pub layout_file: Option<PathBuf>,
    pub seed: u64,
    /// CSV destination for vehicle telemetry.
    pub telemetry: Option<PathBuf>,
    /// Seconds between progress lines. Zero disables them.
    pub progress_interval: f32,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            duration: DEFAULT_DURATION,
            preset: "standard".to_owned(),
            tuning_file: None,
            layout_file: None,
            seed: DEFAULT_SEED,
            telemetry: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl LaunchParams {
    /// Resolve the tuning tables: the file if given, otherwise the preset.
    pub fn tuning(&self) -> Result<TuningSet> {
        let tuning = match &self.tuning_file {
            Some(path) => TuningSet::load(path)?,
            None => TuningSet::preset(&self.preset)?,
        };
        tuning.validate()?;
        Ok(tuning)
    }

    /// Resolve the world layout.
    pub fn layout(&self) -> Result<WorldLayout> {
        match &self.layout_file {
            Some(path) => WorldLayout::load(path),
            None => Ok(WorldLayout::city()),
        }
    }
}

/// Parse a non-negative, finite number of seconds.
fn parse_seconds(s: &str) -> std::result::Result<f32, String> {
    let value = s
        .parse::<f32>()
        .map_err(|e| format!("invalid seconds: {e}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("seconds must be finite and non-negative, got {value}"));
    }
    Ok(value)
}

/// Parse a preset name, rejecting unknown ones up front.
fn parse_preset(s: &str) -> std::result::Result<String, String> {
    if TuningSet::PRESETS.contains(&s) {
        Ok(s.to_owned())
    } else {
        Err(format!(
            "unknown preset '{s}', expected one of: {}",
            TuningSet::PRESETS.join(", ")
        ))
    }
}

#[derive(Parser, Debug)]
#[command(about = "Headless open-world simulation runner")]
struct CliArgs {
    /// Scripted scenario to play.
    #[arg(long, value_enum, default_value_t = Scenario::default())]
    scenario: Scenario,

    /// Simulated seconds to run.
    #[arg(long, default_value_t = DEFAULT_DURATION, value_parser = parse_seconds)]
    duration: f32,

    /// Tuning preset.
    #[arg(long, default_value = "standard", value_parser = parse_preset)]
    preset: String,

    /// JSON file with tuning overrides (takes precedence over --preset).
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// JSON file with a world layout.
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Seed for NPC idle phases and camera shake.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Write vehicle telemetry CSV to this file.
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Seconds between progress log lines (0 disables).
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL, value_parser = parse_seconds)]
    progress_interval: f32,
}

impl From<CliArgs> for LaunchParams {
    fn from(args: CliArgs) -> Self {
        Self {
            scenario: args.scenario,
            duration: args.duration,
            preset: args.preset,
            tuning_file: args.tuning,
            layout_file: args.layout,
            seed: args.seed,
            telemetry: args.telemetry,
            progress_interval: args.progress_interval,
        }
    }
}

/// Parse launch parameters from the command line.
pub fn parse() -> LaunchParams {
    CliArgs::parse().into()
}

/// Parse launch parameters from an explicit argument list.
pub fn parse_from<I, T>(args: I) -> std::result::Result<LaunchParams, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    CliArgs::try_parse_from(args).map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = parse_from(["openworld"]).unwrap();
        assert_eq!(params.scenario, Scenario::Stroll);
        assert_eq!(params.preset, "standard");
        assert_eq!(params.seed, DEFAULT_SEED);
        assert!(params.telemetry.is_none());
        assert!(params.tuning().is_ok());
    }

    #[test]
    fn test_flags() {
        let params = parse_from([
            "openworld",
            "--scenario",
            "joyride",
            "--duration",
            "12.5",
            "--preset",
            "drift",
            "--seed",
            "9",
            "--telemetry",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(params.scenario, Scenario::Joyride);
        assert_eq!(params.duration, 12.5);
        assert_eq!(params.preset, "drift");
        assert_eq!(params.seed, 9);
        assert_eq!(params.telemetry, Some(PathBuf::from("out.csv")));
        assert_eq!(params.tuning().unwrap(), TuningSet::preset("drift").unwrap());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_from(["openworld", "--preset", "rally"]).is_err());
        assert!(parse_from(["openworld", "--duration", "-1"]).is_err());
        assert!(parse_from(["openworld", "--scenario", "fly"]).is_err());
    }

    #[test]
    fn test_missing_tuning_file_is_io_error() {
        let params = LaunchParams {
            tuning_file: Some(PathBuf::from("/nonexistent/tuning.json")),
            ..LaunchParams::default()
        };
        assert!(matches!(
            params.tuning(),
            Err(openworld_sim::Error::Io { .. })
        ));
    }
}
