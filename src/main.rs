// src/main.rs
mod api;
mod capacity;
mod config;
mod distributor;
mod geometry;
mod layout;
mod model;
mod optimizer;
mod orientation;
mod types;

use config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let packing = app_config.optimizer.packing_config();

    println!("🚀 Load planner starting...");
    println!(
        "⚙️ Unit cap {}, container gap {}, epsilon {}",
        packing.max_units, packing.container_gap, packing.general_epsilon
    );
    api::start_api_server(app_config.api, app_config.optimizer).await;
}
