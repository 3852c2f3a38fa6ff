// src/main.rs
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colorful::Colorful;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::path::PathBuf;

use straincheckr::cli::format_summary;
use straincheckr::config::Settings;
use straincheckr::core::EventAnalyzer;

#[derive(Parser, Debug)]
#[command(name = "straincheckr", version)]
#[command(about = "Analyze public gravitational-wave strain data")]
struct Args {
    /// Data directory holding events.json and per-event strain files
    #[arg(short, long, env = "STRAINCHECKR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Settings file (JSON); --data-dir overrides its data directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one event
    Analyze {
        /// Event name, e.g. GW230529_181500
        event: String,

        /// Restrict to these detectors (comma separated, e.g. H1,L1)
        #[arg(short = 'D', long, value_delimiter = ',')]
        detectors: Option<Vec<String>>,

        /// Print the visualization bundle as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Write analysis_results.json and visualization_data.json
        #[arg(short, long)]
        save: bool,

        /// Output directory for --save (defaults beside the event data)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose summary output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze every cataloged event and save the results
    AnalyzeAll,

    /// List cataloged events
    List,

    /// List detectors with local data for an event
    Detectors {
        /// Event name
        event: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &args.data_dir {
        settings.data_dir = dir.clone();
    }

    let analyzer = EventAnalyzer::new(settings);

    match args.command {
        Command::Analyze {
            event,
            detectors,
            json,
            save,
            output,
            verbose,
        } => {
            let result = analyzer
                .analyze(&event, detectors.as_deref())
                .with_context(|| format!("no data available for event {event}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result.visualization())?);
            } else {
                print!("{}", format_summary(&result, verbose));
            }

            if save {
                let dir = analyzer.save_results(&event, &result, output.as_deref())?;
                println!("Results saved to: {}", dir.display());
            }
        }

        Command::AnalyzeAll => {
            let events = analyzer.catalog().list_events();
            if events.is_empty() {
                println!("{}", "No events in catalog!".red());
                return Ok(());
            }
            println!("Analyzing {} event(s)\n", events.len());

            let bar = ProgressBar::new(events.len() as u64);
            let outcomes: Vec<(String, bool)> = events
                .par_iter()
                .progress_with(bar)
                .map(|event| {
                    let saved = analyzer
                        .analyze(event, None)
                        .and_then(|result| analyzer.save_results(event, &result, None).ok());
                    (event.clone(), saved.is_some())
                })
                .collect();

            for (event, ok) in &outcomes {
                let mark = if *ok {
                    "✓".green()
                } else {
                    "✗".red()
                };
                println!("  {mark} {event}");
            }
            let failed = outcomes.iter().filter(|(_, ok)| !ok).count();
            if failed > 0 {
                println!("\n{failed} event(s) had no usable data");
            }
        }

        Command::List => {
            for event in analyzer.catalog().list_events() {
                println!("{event}");
            }
        }

        Command::Detectors { event } => {
            let detectors = analyzer.catalog().available_detectors(&event);
            if detectors.is_empty() {
                bail!("no local data for event {event}");
            }
            for detector in detectors {
                println!("{detector}");
            }
        }
    }

    Ok(())
}
