use anyhow::Result;
use clap::Parser;
use ecotune::config::Config;
use ecotune::llm::OracleSession;
use ecotune::report::TuningLog;
use ecotune::tuner::{Outcome, Tuner};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ecotune",
    about = "LLM-driven attribute tuning loop for a Java predator-prey simulator",
    version
)]
struct Args {
    /// Directory containing the simulation sources (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Override the maximum number of tuning iterations
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Override the model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// Skip sending the simulator codebase as priming context
    #[arg(long)]
    no_codebase: bool,

    /// Override the tuning log path
    #[arg(long)]
    log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let path = args.path.canonicalize()?;

    let mut config = Config::load(&path);
    if let Some(iterations) = args.iterations {
        config.max_iterations = iterations;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if args.no_codebase {
        config.send_codebase = false;
    }

    let Some(api_key) = config.api_key() else {
        anyhow::bail!(
            "No API key configured. Set OPENROUTER_API_KEY or add openrouter_api_key to ecotune.toml."
        );
    };

    let log_path = args.log.unwrap_or_else(|| path.join(&config.log_file));
    let mut log = TuningLog::create(&log_path)?;

    let oracle = OracleSession::new(api_key, config.model.clone(), config.max_history_messages);
    let mut tuner = Tuner::new(&path, config, oracle);
    let outcome = tuner.run(&mut log).await?;

    match outcome {
        Outcome::Stable { iterations } => {
            println!("\n✅ Stability achieved in {} iterations.", iterations);
        }
        Outcome::TimedOut { iterations } => {
            println!("\n❌ Stability not reached within {} iterations.", iterations);
        }
    }
    println!("Log file saved to: {}", log.path().display());

    Ok(())
}
