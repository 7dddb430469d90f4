mod app;
mod attendees;
mod auth;
mod config;
mod db;
mod error;
mod events;
#[cfg(test)]
mod memory;
mod params;
mod policy;
mod state;
mod telemetry;
mod users;

use crate::{config::AppConfig, state::AppState, telemetry::LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(LogFormat::from_env());

    let config = AppConfig::from_env()?;
    let state = AppState::init(config).await?;
    let addr = state.config.addr()?;

    app::serve(app::build_app(state), addr).await
}
