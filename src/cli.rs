//! CLI commands for pitch-speed.
//!
//! Supports API server mode and one-shot prediction.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::PitchSpeedService;
use crate::store::{ResourcePaths, ResourceStore};
use crate::types::PredictionResult;

#[derive(Parser)]
#[command(name = "pitch-speed")]
#[command(version, about = "Predict a pitcher's first-pitch release speed", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Predict the first-pitch speed for one pitcher
    Predict {
        /// Pitcher's last name
        #[arg(value_name = "LAST")]
        last_name: String,

        /// Pitcher's first name
        #[arg(value_name = "FIRST")]
        first_name: String,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Model path override
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Feature mapping path override
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Historical pitch table path override
        #[arg(long)]
        history: Option<PathBuf>,

        /// Number of historical first pitches to show (max 5)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Overrides for artifact locations taken from the command line.
#[derive(Debug, Default)]
pub struct PathOverrides {
    pub model: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub history: Option<PathBuf>,
}

impl PathOverrides {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(path) = self.model {
            config.resources.model_path = path.to_string_lossy().to_string();
        }
        if let Some(path) = self.mapping {
            config.resources.mapping_path = path.to_string_lossy().to_string();
        }
        if let Some(path) = self.history {
            config.resources.history_path = path.to_string_lossy().to_string();
        }
    }
}

/// Run a single prediction and print it.
pub fn run_predict(
    last_name: String,
    first_name: String,
    format: String,
    overrides: PathOverrides,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    overrides.apply(&mut config);
    if let Some(limit) = limit {
        config.history.limit = limit;
    }

    let store = Arc::new(ResourceStore::new(ResourcePaths::from(&config.resources)));
    // Artifacts must load before any query is attempted
    store.get()?;

    let service = PitchSpeedService::new(store, config.history.clone());
    let result = service.predict_first_pitch_speed(&last_name, &first_name)?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "table" => {
            print_table(&result);
        }
        _ => {
            tracing::warn!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Print prediction results in table format.
fn print_table(result: &PredictionResult) {
    println!(
        "Predicted first-pitch speed for {} ({}, throws {}): {:.2} mph",
        result.pitcher, result.pitcher_id, result.throws, result.predicted_speed_mph
    );
    println!();

    println!("=== Historical Reference: first pitch of game ===");
    if result.history.is_empty() {
        println!("  No recorded first pitches.");
        return;
    }
    println!("  {:<10}  {:>11}  {}", "Date", "Speed (mph)", "Type");
    for pitch in &result.history {
        let speed = pitch
            .speed_mph
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        let pitch_type = pitch.pitch_type.as_deref().unwrap_or("-");
        println!("  {:<10}  {:>11}  {}", pitch.date, speed, pitch_type);
    }
}
