// ========================================================================================
//
//                      The Service Orchestrator: HeartPredict
//
// ========================================================================================
//
// This binary owns the process lifecycle. It parses arguments, resolves
// configuration, loads the model exactly once, and hands an immutable prediction
// service to whichever front end was requested.
//
// ### Startup Contract ###
//
// 1.  Fail Before Serving: A missing or unreadable model artifact aborts the
//     process before any socket is bound. The server never runs without a model.
//
// 2.  Single Ownership: The loaded model lives inside one `PredictionService`.
//     Request handlers and batch workers receive clones that share the same
//     read-only handle.
//
// 3.  Layered Configuration: Defaults, then an optional TOML file, then flags
//     and their environment variables.

use clap::{Args, Parser, Subcommand};
use heartpredict::batch;
use heartpredict::config::{ConfigLayer, DEFAULT_MODEL_FILE, ServeConfig};
use heartpredict::http;
use heartpredict::predict::PredictionService;
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

// ========================================================================================
//                         Command-Line Interface Definition
// ========================================================================================

#[derive(Parser)]
#[command(
    name = "heartpredict",
    version,
    about = "Cardiac risk prediction over a strict feature-normalization contract."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction API over HTTP
    Serve(ServeArgs),

    /// Score a CSV file of records (outputs: predictions.tsv)
    Infer {
        /// Path to a comma-separated file whose header row names the input fields
        input: PathBuf,

        /// Path to the trained model file (.toml)
        #[arg(long, env = "MODEL_FILE", default_value = DEFAULT_MODEL_FILE)]
        model: PathBuf,

        /// Where to write the tab-separated predictions
        #[arg(long, default_value = "predictions.tsv")]
        output: PathBuf,
    },

    /// Print the structure of a trained model
    Inspect {
        /// Path to the trained model file (.toml)
        #[arg(long, env = "MODEL_FILE", default_value = DEFAULT_MODEL_FILE)]
        model: PathBuf,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Optional TOML file with `model`, `host`, `port` and `allow_origins` keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the trained model file (.toml)
    #[arg(long, env = "MODEL_FILE")]
    model: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Allowed CORS origin; repeat the flag or pass a comma-separated list
    #[arg(long = "allow-origin", env = "ALLOW_ORIGINS", value_delimiter = ',')]
    allow_origins: Option<Vec<String>>,
}

impl ServeArgs {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            model: self.model.clone(),
            host: self.host.clone(),
            port: self.port,
            allow_origins: self.allow_origins.clone(),
        }
    }
}

// ========================================================================================
//                           The Main Orchestration Logic
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => serve_command(&args),
        Commands::Infer {
            input,
            model,
            output,
        } => infer_command(&input, &model, &output),
        Commands::Inspect { model } => inspect_command(&model),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn serve_command(args: &ServeArgs) -> Result<(), Box<dyn Error>> {
    let config = ServeConfig::resolve(args.config.as_deref(), args.overrides())?;

    let service = load_service(&config.model_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http::serve(&config, service))?;
    Ok(())
}

fn infer_command(input: &Path, model: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let start_time = Instant::now();
    let service = load_service(model)?;

    println!("> Scoring records from: {}", input.display());
    let scored = batch::run_batch(&service, input, output)?;
    println!(
        "> Wrote {} predictions to {} in {:.2?}",
        scored,
        output.display(),
        start_time.elapsed()
    );
    Ok(())
}

fn inspect_command(model: &Path) -> Result<(), Box<dyn Error>> {
    let service = load_service(model)?;
    println!("{}", service.summary());
    Ok(())
}

/// Loads the model artifact; any failure here is fatal to the command.
fn load_service(model_path: &Path) -> Result<PredictionService, Box<dyn Error>> {
    let service = PredictionService::load(model_path)?;
    let summary = service.summary();
    info!(
        "Loaded model from {} type: {} ({} features)",
        model_path.display(),
        summary.kind,
        summary
            .n_features_in
            .map_or_else(|| "undeclared".to_string(), |n| n.to_string())
    );
    Ok(service)
}
