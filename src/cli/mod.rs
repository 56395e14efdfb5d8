//! Command-line interface for the training, deployment and inference pipelines
//! and for exploratory analysis of the dataset.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::{
    BivariateAnalysisStrategy, InspectionStrategy, MissingValuesAnalysis, MultivariateAnalysis,
    SimpleMissingValuesAnalysis, SimpleMultivariateAnalysis, UnivariateAnalysisStrategy,
};
use crate::config::PipelineConfig;
use crate::data::DataIngestorFactory;
use crate::pipeline::{
    dynamic_importer, model_loader, run_deployment_pipeline, run_inference_pipeline,
    run_training_pipeline, StepRecord, StepStatus,
};
use crate::registry::LocalArtifactStore;
use crate::server::run_server;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_run(msg: &str) {
    println!("  {} {}", accent("›"), msg);
}

fn kv(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

fn print_steps(steps: &[StepRecord]) {
    for step in steps {
        let mark = match step.status {
            StepStatus::Succeeded => ok("✓"),
            StepStatus::Failed => "✗".red(),
        };
        println!("  {} {:<28} {}", mark, step.name, dim(&format!("{} ms", step.duration_ms)));
    }
}

fn print_block(text: &str) {
    for line in text.lines() {
        println!("  {}", line);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "prices")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "House price prediction: training, deployment, inference and analysis")]
#[command(long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Input archive, overrides the configured data path
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the training pipeline and report test metrics
    Train,

    /// Train, register, and promote the model when the policy allows
    Deploy {
        /// Serve the model after a successful deployment
        #[arg(long)]
        serve: bool,
    },

    /// Send a split-orientation payload to the production model
    Predict {
        /// Payload file; a built-in sample is used when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Serve the production model over HTTP
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,
    },

    /// Inspect data types or summary statistics
    Inspect {
        #[arg(long, value_enum, default_value = "summary")]
        strategy: InspectArg,
    },

    /// Exploratory analysis
    Analyze {
        #[command(subcommand)]
        analysis: AnalyzeCommand,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InspectArg {
    Dtypes,
    Summary,
}

#[derive(Subcommand)]
pub enum AnalyzeCommand {
    /// Missing values per column
    Missing,

    /// Distribution of one feature
    Univariate {
        feature: String,

        /// Treat the feature as categorical
        #[arg(long)]
        categorical: bool,

        #[arg(long, default_value = "30")]
        bins: usize,
    },

    /// Relationship between two features
    Bivariate {
        feature1: String,
        feature2: String,

        /// `feature1` is categorical
        #[arg(long)]
        categorical: bool,
    },

    /// Correlation heatmap and pair plot
    Multivariate {
        /// Comma-separated numeric columns; all numeric columns when omitted
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Resolve configuration from the file, environment and flags
pub fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?.with_env_overrides(),
        None => PipelineConfig::from_env_or_default(),
    };
    Ok(match &cli.data {
        Some(data) => config.with_data_path(data),
        None => config,
    })
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Train => cmd_train(&config),
        Commands::Deploy { serve } => cmd_deploy(&config, serve).await,
        Commands::Predict { input } => cmd_predict(&config, input).await,
        Commands::Serve { port, host } => cmd_serve(config, port, host).await,
        Commands::Inspect { strategy } => cmd_inspect(&config, strategy),
        Commands::Analyze { analysis } => cmd_analyze(&config, analysis),
    }
}

pub fn cmd_train(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Train");
    step_run(&format!("Training on {}", config.data_path.display()));

    let start = Instant::now();
    let outcome = run_training_pipeline(config)?;
    print_steps(&outcome.steps);

    println!();
    kv("Rows (train/test)", &format!("{} / {}", outcome.n_train, outcome.n_test));
    for (name, value) in outcome.metrics.iter() {
        kv(name, &format!("{:.6}", value));
    }
    kv("Run", &outcome.run_id);
    kv("Time", &format!("{:.3}s", start.elapsed().as_secs_f64()));
    println!();
    Ok(())
}

pub async fn cmd_deploy(config: &PipelineConfig, serve: bool) -> anyhow::Result<()> {
    section("Deploy");
    let store = LocalArtifactStore::open(config.models_dir())?;

    let outcome = run_deployment_pipeline(config, &store)?;
    print_steps(&outcome.training.steps);
    println!();
    kv("Model", &format!("{} v{}", config.model_name, outcome.version));
    kv("MSE", &format!("{:.6}", outcome.training.metrics.mse()));
    kv("R-Squared", &format!("{:.6}", outcome.training.metrics.r_squared()));
    match &outcome.rejection {
        None => println!("  {} promoted to production", ok("✓")),
        Some(reason) => println!("  {} not deployed: {}", "!".yellow(), reason),
    }
    println!();

    if serve && outcome.deployed {
        run_server(Arc::new(outcome.training.model), config.service.clone()).await?;
    }
    Ok(())
}

pub async fn cmd_predict(config: &PipelineConfig, input: Option<PathBuf>) -> anyhow::Result<()> {
    section("Predict");
    let payload = match input {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => dynamic_importer(),
    };
    let store = LocalArtifactStore::open(config.models_dir())?;

    let predictions = run_inference_pipeline(config, &store, &payload).await?;
    let target_transform = model_loader(&store, &config.model_name)?
        .metadata()
        .target_transform;
    for (i, p) in predictions.iter().enumerate() {
        match target_transform {
            Some(t) => kv(&format!("row {}", i), &format!("{:.6}  ({:.2})", p, t.inverse(*p))),
            None => kv(&format!("row {}", i), &format!("{:.6}", p)),
        }
    }
    println!();
    Ok(())
}

pub async fn cmd_serve(
    mut config: PipelineConfig,
    port: Option<u16>,
    host: Option<String>,
) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.service.port = port;
    }
    if let Some(host) = host {
        config.service.host = host;
    }
    let store = LocalArtifactStore::open(config.models_dir())?;
    let model = model_loader(&store, &config.model_name)?;

    section("Serve");
    kv("Model", &config.model_name);
    kv("Address", &format!("http://{}:{}", config.service.host, config.service.port));
    println!();
    run_server(Arc::new(model), config.service).await
}

fn load_dataset(config: &PipelineConfig) -> anyhow::Result<DataFrame> {
    let df = DataIngestorFactory::for_path(&config.data_path)?
        .with_extract_dir(&config.extract_dir)
        .ingest(&config.data_path)?;
    Ok(df)
}

pub fn cmd_inspect(config: &PipelineConfig, strategy: InspectArg) -> anyhow::Result<()> {
    let df = load_dataset(config)?;
    let strategy = match strategy {
        InspectArg::Dtypes => InspectionStrategy::DataTypes,
        InspectArg::Summary => InspectionStrategy::SummaryStatistics,
    };
    section("Inspect");
    print_block(&strategy.inspect(&df)?.to_string());
    println!();
    Ok(())
}

pub fn cmd_analyze(config: &PipelineConfig, analysis: AnalyzeCommand) -> anyhow::Result<()> {
    let df = load_dataset(config)?;
    let report = match analysis {
        AnalyzeCommand::Missing => SimpleMissingValuesAnalysis.analyze(&df)?.to_string(),
        AnalyzeCommand::Univariate {
            feature,
            categorical,
            bins,
        } => {
            let strategy = if categorical {
                UnivariateAnalysisStrategy::Categorical
            } else {
                UnivariateAnalysisStrategy::Numerical { bins }
            };
            strategy.analyze(&df, &feature)?.to_string()
        }
        AnalyzeCommand::Bivariate {
            feature1,
            feature2,
            categorical,
        } => {
            let strategy = if categorical {
                BivariateAnalysisStrategy::CategoricalVsNumerical
            } else {
                BivariateAnalysisStrategy::NumericalVsNumerical
            };
            strategy.analyze(&df, &feature1, &feature2)?.to_string()
        }
        AnalyzeCommand::Multivariate { columns } => {
            let analysis = if columns.is_empty() {
                SimpleMultivariateAnalysis::default()
            } else {
                SimpleMultivariateAnalysis::with_columns(columns)
            };
            analysis.analyze(&df)?.to_string()
        }
    };

    section("Analyze");
    print_block(&report);
    println!();
    Ok(())
}
