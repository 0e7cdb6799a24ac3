use std::env::set_var;
use std::net::SocketAddr;

use lambda_http::{run, Error};
use lobby_api::{config::AppConfig, create_app, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = AppConfig::from_env()?;
    init_tracing(config.lambda);

    let app_state = AppState::from_config(&config).await?;
    let app = create_app(app_state, config.cors_layer());

    if config.lambda {
        set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");
        info!(
            "Starting lobby API on AWS Lambda ({:?} lifecycle)",
            config.lifecycle_policy
        );
        return run(app).await;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Lobby API listening on {} ({:?} lifecycle)",
        addr, config.lifecycle_policy
    );
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(lambda: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // CloudWatch picks up structured lines; ANSI colours only make sense locally.
    if lambda {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_ansi(false)
            .without_time()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
