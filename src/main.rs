mod analysis;
mod app;
mod chat;
mod config;
mod dosing;
mod errors;
mod images;
mod llm;
mod meals;
mod session;
mod settings;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealdose=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init()?;
    let settings = app_state.config.default_settings;
    tracing::info!(
        icr = settings.icr(),
        cf = settings.cf(),
        target_bs = settings.target_bs(),
        "session started"
    );

    app::serve(app::build_app(app_state)).await
}
