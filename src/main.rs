mod config;
mod display;
mod fetcher;
mod models;
mod publisher;
mod tasks;

use config::Config;
use display::Formatter;
use fetcher::ElectionClient;
use log::{error, info};
use publisher::MqttPublisher;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    info!("Starting election display ticker...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Election {} ({}) -> {}:{} topic {}",
        config.api.election_id,
        config.api.stage,
        config.mqtt.broker,
        config.mqtt.port,
        config.mqtt.topic
    );

    let source = match ElectionClient::new(config.api.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let formatter = Formatter::new(config.display.clone());
    let sink = MqttPublisher::new(config.mqtt.clone());

    tokio::select! {
        _ = tasks::results_poller::poll_results_task(&source, &formatter, &sink, config.poll_interval) => {
            error!("Results poller stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }
}
