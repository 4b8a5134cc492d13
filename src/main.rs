use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use visual_snapshot::config;
use visual_snapshot::report::{OutcomeStatus, VerificationReport};
use visual_snapshot::snapshot::{
    ArtifactKey, CanvasRenderer, Configuration, ConfigurationSet, Device, InterfaceStyle,
    REFERENCE_COPY_SUFFIX, SnapshotEngine, TextCard, artifact_path, compare, diff_images,
    view_factory,
};
use visual_snapshot::store::{approve_failures, clean_failures, list_failures};

/// Visual Snapshot - record and verify reference images of rendered views
#[derive(Parser, Debug)]
#[command(
    name = "visual-snapshot",
    about = "Record and verify visual regression snapshots",
    after_help = "ENVIRONMENT VARIABLES:\n\
        SNAPSHOT_REFERENCE_PATH    Reference store root\n\
        SNAPSHOT_FAILURE_PATH      Failure store root\n\
        SNAPSHOT_RECORD_MODE       Record instead of verify (1/true/yes/on)\n\
        SNAPSHOT_TOLERANCE         Maximum diff, parts per million\n\
        SNAPSHOT_RENDER_OFFSET_Y   Pixels cropped from the top of every capture\n\
        SNAPSHOT_RENDER_DELAY_MS   Render-settle delay (ms)\n\
        RUST_LOG                   Log filter (default: info)"
)]
struct Args {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two images and apply a tolerance
    Compare {
        /// Freshly rendered image
        actual: PathBuf,

        /// Reference image
        reference: PathBuf,

        /// Maximum accepted diff (parts per million)
        #[arg(short, long, env = "SNAPSHOT_TOLERANCE", default_value = "0")]
        tolerance: f64,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the artifact paths of a test under one configuration
    Resolve {
        /// Test file the snapshot belongs to
        #[arg(short, long)]
        file: PathBuf,

        /// Test name
        #[arg(short, long)]
        name: String,

        /// Configuration as <device>_<style>, e.g. phone_dark or 800x600_light
        #[arg(short, long, default_value = "phone_default")]
        config: String,
    },

    /// List artifacts left in the failure store
    Failures {
        /// Failure store directory (default: SNAPSHOT_FAILURE_PATH)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Promote failure-store images into the reference store
    Approve {
        /// Failure store directory (default: SNAPSHOT_FAILURE_PATH)
        #[arg(long)]
        failures: Option<PathBuf>,

        /// Reference store directory (default: SNAPSHOT_REFERENCE_PATH)
        #[arg(long)]
        references: Option<PathBuf>,
    },

    /// Delete the failure store
    Clean {
        /// Failure store directory (default: SNAPSHOT_FAILURE_PATH)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Render a sample card across configurations through the engine
    Demo {
        /// Test file the snapshots are anchored to
        #[arg(short, long, default_value = "./demo.rs")]
        file: PathBuf,

        /// Card title
        #[arg(long, default_value = "Snapshot")]
        title: String,

        /// Card body text
        #[arg(long, default_value = "Hello from visual-snapshot")]
        body: String,

        /// Devices: preset names or WxH (comma-separated)
        #[arg(short, long, value_delimiter = ',', default_value = "phone")]
        devices: Vec<String>,

        /// Interface styles (comma-separated)
        #[arg(short, long, value_delimiter = ',', default_value = "light,dark")]
        styles: Vec<String>,

        /// Record references instead of verifying
        #[arg(long)]
        record: bool,

        /// Output report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Level used when `RUST_LOG` is unset
fn default_level(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    }
}

fn init_subscriber(verbose: bool, quiet: bool) {
    let level = default_level(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .init();
}

fn parse_configurations(
    devices: &[String],
    styles: &[String],
) -> Result<ConfigurationSet, Box<dyn Error>> {
    let devices = devices
        .iter()
        .map(|d| {
            Device::parse(d).ok_or_else(|| {
                format!(
                    "Invalid device '{}'. Use: phone, phone_small, tablet, desktop, or WxH",
                    d
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let styles = styles
        .iter()
        .map(|s| {
            InterfaceStyle::parse(s)
                .ok_or_else(|| format!("Invalid style '{}'. Use: light, dark, or default", s))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConfigurationSet::matrix(&devices, &styles))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_subscriber(args.verbose, args.quiet);
    let settings = config::get();

    match args.command {
        Some(Commands::Compare {
            actual,
            reference,
            tolerance,
            json,
        }) => {
            let actual_image = image::open(&actual)?.to_rgba8();
            let reference_image = image::open(&reference)?.to_rgba8();
            let result = diff_images(&actual_image, &reference_image)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "actual": actual,
                        "reference": reference,
                        "tolerance": tolerance,
                        "passed": result.within_tolerance(tolerance),
                        "result": result,
                    }))?
                );
            } else {
                println!("Diff: {} (tolerance {})", result.diff, tolerance);
                println!(
                    "  Differing pixels: {}/{} (max channel diff {})",
                    result.differing_pixels, result.total_pixels, result.max_channel_diff
                );
            }
            compare(&actual_image, &reference_image, tolerance)?;
        }

        Some(Commands::Resolve { file, name, config }) => {
            let config = Configuration::parse(&config).ok_or_else(|| {
                format!(
                    "Invalid configuration '{}'. Use <device>_<style>, e.g. phone_dark",
                    config
                )
            })?;
            let key = ArtifactKey::new(&file, &name, config.id());
            println!(
                "reference: {}",
                artifact_path(&settings.reference_dir, &key, "").display()
            );
            println!(
                "failure:   {}",
                artifact_path(&settings.failure_dir, &key, "").display()
            );
            println!(
                "ref copy:  {}",
                artifact_path(&settings.failure_dir, &key, REFERENCE_COPY_SUFFIX).display()
            );
        }

        Some(Commands::Failures { dir, json }) => {
            let dir = dir.unwrap_or_else(|| settings.failure_dir.clone());
            let artifacts = list_failures(&dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&artifacts)?);
            } else if artifacts.is_empty() {
                println!("No failures in {}", dir.display());
            } else {
                for artifact in &artifacts {
                    let kind = if artifact.is_mismatch() {
                        "mismatch"
                    } else {
                        "missing reference"
                    };
                    println!("{} ({})", artifact.actual.display(), kind);
                    if let Some(copy) = &artifact.reference_copy {
                        println!("  reference: {}", copy.display());
                    }
                }
            }
        }

        Some(Commands::Approve {
            failures,
            references,
        }) => {
            let failures = failures.unwrap_or_else(|| settings.failure_dir.clone());
            let references = references.unwrap_or_else(|| settings.reference_dir.clone());
            let approved = approve_failures(&failures, &references)?;
            println!("Approved {} snapshot(s)", approved.len());
            for path in &approved {
                println!("  {}", path.display());
            }
        }

        Some(Commands::Clean { dir }) => {
            let dir = dir.unwrap_or_else(|| settings.failure_dir.clone());
            let removed = clean_failures(&dir)?;
            println!("Removed {} failure artifact(s) from {}", removed, dir.display());
        }

        Some(Commands::Demo {
            file,
            title,
            body,
            devices,
            styles,
            record,
            json,
        }) => {
            let configs = parse_configurations(&devices, &styles)?;
            let engine_settings = settings
                .clone()
                .with_record_mode(settings.record_mode || record);
            let engine = SnapshotEngine::new(engine_settings, CanvasRenderer);

            let test_case = engine.test_case(
                &file,
                "Demo",
                view_factory(move || TextCard::new(title.clone(), body.clone())),
            );
            let outcomes = engine.verify_each(&test_case, &configs).await;
            let report = VerificationReport::new(&test_case.name, &test_case.file_path, outcomes);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for outcome in &report.outcomes {
                    let detail = outcome
                        .error
                        .as_ref()
                        .map(|e| format!(": {}", e))
                        .unwrap_or_default();
                    println!("  [{:?}] {}{}", outcome.status, outcome.config_id, detail);
                }
            }
            if !report.success {
                let failed = report.outcomes.len() - report.count(OutcomeStatus::Passed);
                return Err(format!("{} configuration(s) did not pass", failed).into());
            }
        }

        None => {
            println!("Visual Snapshot - record and verify visual regression snapshots");
            println!();
            println!("Usage: visual-snapshot <COMMAND>");
            println!();
            println!("Commands:");
            println!("  compare   Compare two images and apply a tolerance");
            println!("  resolve   Print the artifact paths of a test");
            println!("  failures  List artifacts left in the failure store");
            println!("  approve   Promote failure-store images into the reference store");
            println!("  clean     Delete the failure store");
            println!("  demo      Render a sample card through the engine");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), Level::INFO);
        assert_eq!(default_level(true, false), Level::DEBUG);
        assert_eq!(default_level(false, true), Level::WARN);
    }

    #[test]
    fn test_parse_configurations_rejects_unknown_style() {
        let devices = vec!["phone".to_string()];
        assert!(parse_configurations(&devices, &["sepia".to_string()]).is_err());
        let set = parse_configurations(&devices, &["light".to_string(), "dark".to_string()]).unwrap();
        assert_eq!(set.count(), 2);
    }
}
