//! services/bot/src/bin/bot.rs

use avatar_core::{
    calculator::AvatarCalculator, content::ContentTable, dialogue::DialogueController,
    session::SessionStore,
};
use bot_lib::{
    adapters::{PdfReportRenderer, TelegramTransport},
    chat::run_dispatcher,
    config::Config,
    error::ApiError,
    shutdown::cancel_on_signal,
    web::{relay_router, RelayState},
};
use std::sync::Arc;
use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting bot...");

    // --- 2. Load Content ---
    let content = Arc::new(ContentTable::embedded()?);
    info!("Content table v{} loaded", content.version());

    // --- 3. Initialize Service Adapters ---
    let bot = Bot::new(config.bot_token.clone());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    if let Err(e) = transport.register_commands().await {
        warn!("Could not register bot commands: {}", e);
    }
    let renderer = Arc::new(PdfReportRenderer::new(
        config.avatar_images_dir.clone(),
        &config.font_path,
        &config.font_bold_path,
    ));

    // --- 4. Build the Dialogue Controller ---
    let controller = Arc::new(DialogueController::new(
        Arc::new(SessionStore::new()),
        AvatarCalculator::new(content),
        transport.clone(),
        renderer,
        config.consultation_url.clone(),
    ));

    // --- 5. Start the Notification Relay ---
    if config.internal_api_token.is_none() {
        warn!("INTERNAL_API_TOKEN is not set; the relay will reject every request");
    }
    let relay_state = Arc::new(RelayState::from_config(transport, &config));
    let app = relay_router(relay_state);
    let listener = tokio::net::TcpListener::bind(config.relay_address).await?;
    info!("Notification relay listening on {}", config.relay_address);

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone())?;
    let relay = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    });

    // --- 6. Run the Telegram Dispatcher (returns on SIGINT or SIGTERM) ---
    run_dispatcher(bot, controller, shutdown.clone()).await;

    shutdown.cancel();
    relay.await??;
    info!("Notification relay stopped");

    Ok(())
}
