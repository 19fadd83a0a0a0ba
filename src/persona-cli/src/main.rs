//! Persona CLI: classify customers, estimate repurchase ETAs and print
//! dashboard summaries over a JSON cohort file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use persona_core::config::AppConfig;
use persona_core::{decode_cohort, ClassifierPolicy, CustomerRecord, EtaPolicy};
use persona_reporting::{persona_distribution, summarize_kpis, PersonaDashboard};
use persona_segmentation::{
    decay_repurchase_eta_days, estimate_eta, prepare_configured, recommended_actions,
    robust_thresholds_from_data,
};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "persona-cli")]
#[command(about = "Customer persona classification and repurchase forecasting")]
#[command(version)]
struct Cli {
    /// Cohort file: a JSON array of customer records
    #[arg(short, long, env = "PERSONA__DATA")]
    data: Option<String>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<String>,

    /// Classifier policy: mean_quadrant, robust_median_mad, presence_repurchase
    #[arg(long)]
    policy: Option<ClassifierPolicy>,

    /// ETA policy: bucketed, decay
    #[arg(long)]
    eta: Option<EtaPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print cohort KPIs
    Kpis,

    /// Classify an ad-hoc customer against the cohort
    Classify {
        /// Days visited in the observation window
        #[arg(long, default_value = "6")]
        visit_days: f64,

        /// Mean session duration in minutes
        #[arg(long, default_value = "40")]
        duration: f64,

        /// Repurchased within the last 90 days
        #[arg(long)]
        retained_90: bool,

        /// Repurchased during June to August
        #[arg(long)]
        retained_summer: bool,
    },

    /// Persona counts for the cohort
    Distribution,

    /// Full dashboard snapshot
    Dashboard,

    /// Decay ETA across a range of visit days
    Simulate {
        #[arg(long, default_value = "0")]
        from: u32,

        #[arg(long, default_value = "15")]
        to: u32,

        #[arg(long, default_value = "30")]
        duration: f64,

        #[arg(long)]
        retained_90: bool,

        #[arg(long)]
        retained_summer: bool,
    },
}

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    result: persona_core::ClassificationResult,
    eta_days: u32,
    eta_policy: EtaPolicy,
    actions: &'a [&'a str],
}

#[derive(Serialize)]
struct SimulationPoint {
    visit_days: u32,
    eta_days: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persona_cli=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_with_file(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(policy) = cli.policy {
        config.classifier.policy = policy;
    }
    if let Some(eta) = cli.eta {
        config.eta.policy = eta;
    }

    info!(
        policy = config.classifier.policy.as_str(),
        eta = ?config.eta.policy,
        "Configuration loaded"
    );

    let cohort = load_cohort(cli.data.as_deref())?;
    info!(customers = cohort.len(), "Cohort loaded");

    match cli.command {
        Commands::Kpis => print_json(&summarize_kpis(&cohort))?,
        Commands::Classify {
            visit_days,
            duration,
            retained_90,
            retained_summer,
        } => {
            let sample = CustomerRecord::sample(visit_days, duration, retained_summer, retained_90);
            let classifier = prepare_configured(&config.classifier, &cohort);
            let result = classifier.classify(&sample);
            let thresholds = robust_thresholds_from_data(&cohort);
            let output = ClassifyOutput {
                actions: recommended_actions(result.code),
                eta_days: estimate_eta(config.eta.policy, &sample, Some(&thresholds)),
                eta_policy: config.eta.policy,
                result,
            };
            print_json(&output)?;
        }
        Commands::Distribution => {
            let classifier = prepare_configured(&config.classifier, &cohort);
            print_json(&persona_distribution(classifier.as_ref(), &cohort))?;
        }
        Commands::Dashboard => {
            let dashboard = PersonaDashboard::new(&config.classifier);
            print_json(&dashboard.snapshot(&cohort))?;
        }
        Commands::Simulate {
            from,
            to,
            duration,
            retained_90,
            retained_summer,
        } => {
            if from > to {
                anyhow::bail!("--from ({from}) must not exceed --to ({to})");
            }
            let points: Vec<SimulationPoint> = (from..=to)
                .map(|v| SimulationPoint {
                    visit_days: v,
                    eta_days: decay_repurchase_eta_days(&CustomerRecord::sample(
                        v as f64,
                        duration,
                        retained_summer,
                        retained_90,
                    )),
                })
                .collect();
            print_json(&points)?;
        }
    }

    Ok(())
}

fn load_cohort(path: Option<&str>) -> anyhow::Result<Vec<CustomerRecord>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cohort file {path}"))?;
    decode_cohort(&raw).with_context(|| format!("Failed to decode cohort file {path}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
