//! Built-in fleet presets.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::fleet::{FleetConfig, IngestPath, WorkerSpec};

/// Named preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    /// Five workers from 10 ms to 45 s intervals, 30 minutes, bulk path.
    Demo,
    /// Three fast workers for 5 seconds.
    Quick,
    /// The demo fleet on the single-row path.
    SingleRow,
}

impl PresetName {
    pub const ALL: [PresetName; 3] = [PresetName::Demo, PresetName::Quick, PresetName::SingleRow];

    pub fn as_str(self) -> &'static str {
        match self {
            PresetName::Demo => "demo",
            PresetName::Quick => "quick",
            PresetName::SingleRow => "single-row",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PresetName::Demo => "five workers (10ms, 1s, 15s, 30s, 45s) for 30 minutes, bulk path",
            PresetName::Quick => "three fast workers for 5 seconds, bulk path",
            PresetName::SingleRow => "the demo fleet writing one row at a time",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PresetError {
    #[error("unknown preset '{0}' (available: demo, quick, single-row)")]
    Unknown(String),
}

impl FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "demo" => Ok(PresetName::Demo),
            "quick" => Ok(PresetName::Quick),
            "single-row" | "single" => Ok(PresetName::SingleRow),
            _ => Err(PresetError::Unknown(s.to_string())),
        }
    }
}

/// Summary for listing.
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: &'static str,
    pub workers: usize,
    pub run_duration_secs: u64,
    pub path: IngestPath,
}

fn demo_workers() -> Vec<WorkerSpec> {
    vec![
        WorkerSpec::new(0.0, 1.0, 10),
        WorkerSpec::new(30.0, 5.0, 1_000),
        WorkerSpec::new(60.0, 10.0, 15_000),
        WorkerSpec::new(90.0, 15.0, 30_000),
        WorkerSpec::new(120.0, 20.0, 45_000),
    ]
}

/// Build the fleet config for a preset.
pub fn get_preset(name: PresetName) -> FleetConfig {
    match name {
        PresetName::Demo => FleetConfig {
            run_duration_secs: 30 * 60,
            workers: demo_workers(),
            ..FleetConfig::default()
        },
        PresetName::Quick => FleetConfig {
            run_duration_secs: 5,
            workers: vec![
                WorkerSpec::new(0.0, 1.0, 10),
                WorkerSpec::new(30.0, 5.0, 50),
                WorkerSpec::new(60.0, 10.0, 100),
            ],
            ..FleetConfig::default()
        },
        PresetName::SingleRow => FleetConfig {
            path: IngestPath::Single,
            ..get_preset(PresetName::Demo)
        },
    }
}

pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| {
            let cfg = get_preset(name);
            PresetInfo {
                name,
                description: name.description(),
                workers: cfg.workers.len(),
                run_duration_secs: cfg.run_duration_secs,
                path: cfg.path,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for name in PresetName::ALL {
            get_preset(name)
                .validate()
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn demo_matches_reference_fleet() {
        let cfg = get_preset(PresetName::Demo);
        let intervals: Vec<u64> = cfg.workers.iter().map(|w| w.interval_ms).collect();
        assert_eq!(intervals, vec![10, 1_000, 15_000, 30_000, 45_000]);
        assert_eq!(cfg.run_duration_secs, 1_800);
        assert_eq!(cfg.batch.threshold, 300);
    }

    #[test]
    fn single_row_differs_only_in_path() {
        let demo = get_preset(PresetName::Demo);
        let single = get_preset(PresetName::SingleRow);
        assert_eq!(single.path, IngestPath::Single);
        assert_eq!(single.workers, demo.workers);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Quick".parse::<PresetName>().unwrap(), PresetName::Quick);
        assert_eq!("single_row".parse::<PresetName>().unwrap(), PresetName::SingleRow);
        assert!(matches!(
            "huge".parse::<PresetName>(),
            Err(PresetError::Unknown(_))
        ));
    }

    #[test]
    fn list_covers_all() {
        let names: Vec<&str> = list_presets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["demo", "quick", "single-row"]);
    }
}
