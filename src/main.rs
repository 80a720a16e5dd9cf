#[cfg_attr(not(feature = "web-server"), allow(dead_code))]
mod api;
mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use handlers::RecipeHandler;
use services::speech::sweep_stale_audio;
use services::{GoogleTtsService, GroqService, InferenceService, SpeechService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting Smart Recipe Assistant...");

    let config = Config::from_env()?;

    let inference: Arc<dyn InferenceService> = Arc::new(GroqService::new(
        config.groq_api_key.clone(),
        config.groq_base_url.clone(),
        config.text_model.clone(),
        config.vision_model.clone(),
    ));
    log::info!(
        "✅ Groq service initialized (text: {}, vision: {})",
        config.text_model,
        config.vision_model
    );

    let speech: Arc<dyn SpeechService> = Arc::new(GoogleTtsService::new(
        config.tts_lang.clone(),
        config.audio_dir.clone(),
    ));
    log::info!("✅ Speech service initialized (lang: {}, dir: {})", config.tts_lang, config.audio_dir.display());

    let recipe_handler = Arc::new(RecipeHandler::new(inference, speech));
    log::info!("✅ Recipe handler initialized");

    // Periodic cleanup of synthesized audio
    let audio_dir = config.audio_dir.clone();
    let audio_max_age = config.audio_max_age;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(10 * 60));
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_stale_audio(&audio_dir, audio_max_age) {
                log::warn!("⚠️ Audio sweep failed: {:#}", e);
            }
        }
    });
    log::info!("✅ Audio sweep started (max age: {} min)", audio_max_age.as_secs() / 60);

    #[cfg(feature = "web-server")]
    {
        use api::server::create_router;

        let app = create_router(recipe_handler.clone(), config.audio_dir.clone());
        let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
        log::info!("🌐 Web server listening on {}", config.bind_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("❌ Web server stopped: {}", e);
            }
        });

        println!("\n🧑‍🍳 Your Own Chef is running: http://{}", config.bind_addr);
    }

    #[cfg(not(feature = "web-server"))]
    {
        let _ = &recipe_handler;
        log::warn!("⚠️ Built without the web-server feature, nothing is serving requests");
    }

    println!("🛑 Press Ctrl+C to stop\n");

    tokio::signal::ctrl_c().await?;
    log::info!("🛑 Shutting down...");

    Ok(())
}
