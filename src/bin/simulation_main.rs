// simulation_main.rs
use std::process::ExitCode;
use std::sync::Arc;
use two_junction_sim::config::SimulationConfig;
use two_junction_sim::error::SimulationError;
use two_junction_sim::monitoring::event_log::LogSink;
use two_junction_sim::simulation_engine::simulation::run_simulation;

async fn run() -> Result<(), SimulationError> {
    let arg = std::env::args().nth(1);
    let config = SimulationConfig::default().with_vehicle_arg(arg.as_deref());

    let summary = run_simulation(config, Arc::new(LogSink)).await?;
    println!("{summary}");
    log::info!(target: "traffic", "{}", serde_json::to_string(&summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("simulation aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
