use clap::{Parser, Subcommand};
use log::error;
use show_scheduler::consumer::{JsonConsumer, LogConsumer, ResultConsumer};
use show_scheduler::roster::seed_roster;
use show_scheduler::{
    GlobalOptimizer, HighsBackend, JsonRosterFile, OptimizerConfig, Roster, ScheduleError, server,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about = "Schedules shows into slots and students into shows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP solve endpoint.
    Serve {
        #[arg(long, env = "SHOW_SCHEDULER_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,
    },
    /// Solve a roster JSON file and print the solution.
    Solve {
        roster: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Solve the built-in seed roster.
    Demo,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { addr } => server::run_server(&addr)
            .await
            .map_err(|e| error!("Server failed: {}", e)),
        Command::Solve { roster, config } => {
            tokio::task::block_in_place(|| solve_file(&roster, config.as_deref()))
        }
        Command::Demo => tokio::task::block_in_place(|| {
            solve_and_report(&seed_roster(), &OptimizerConfig::default())
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

fn solve_file(roster: &std::path::Path, config: Option<&std::path::Path>) -> Result<(), ()> {
    let config = match config {
        Some(path) => OptimizerConfig::from_json_file(path)
            .map_err(|e| error!("Failed to load config: {}", e))?,
        None => OptimizerConfig::default(),
    };
    let roster = JsonRosterFile::new(roster)
        .load()
        .map_err(|e| error!("{}", ScheduleError::from(e)))?;
    solve_and_report(&roster, &config)
}

fn solve_and_report(roster: &Roster, config: &OptimizerConfig) -> Result<(), ()> {
    let backend = HighsBackend::new(config.solver.clone());
    let optimized = GlobalOptimizer::from_config(&backend, config)
        .optimize(roster)
        .map_err(|e| error!("{}", e))?;

    let mut consumers: Vec<Box<dyn ResultConsumer>> = vec![
        Box::new(LogConsumer),
        Box::new(JsonConsumer::new(std::io::stdout())),
    ];
    for consumer in &mut consumers {
        consumer
            .consume(&optimized.solution)
            .map_err(|e| error!("Failed to write solution: {}", e))?;
    }
    Ok(())
}
