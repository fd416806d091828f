use anyhow::Result;
use clap::Parser;
use scribed::cli::Cli;
use scribed::config::Config;
use scribed::models::{ModelRegistry, ModelSize, WhisperLoader};
use scribed::server;
use scribed::session::manager::SessionManager;
use scribed::vad::{EnergyVad, EnergyVadConfig, VoiceActivityGate};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path)?.with_env_overrides();
    cli.apply_to(&mut config);
    config.validate()?;

    let loader = WhisperLoader::new(config.stt.model_dir.clone());
    let models = Arc::new(ModelRegistry::new(Arc::new(loader)));

    // Administrative warm-up; failure is reported but not fatal
    if let Some(model) = &cli.preload {
        let model: ModelSize = model.parse()?;
        match models.get_or_load(model).await {
            Ok(_) => info!(model = %model, "model preloaded"),
            Err(e) => warn!(model = %model, error = %e, "failed to preload model"),
        }
    }

    let gate = VoiceActivityGate::new(Arc::new(EnergyVad::new(EnergyVadConfig {
        speech_threshold: config.audio.vad_threshold,
        frame_ms: config.audio.vad_frame_ms,
        hangover_ms: config.audio.vad_hangover_ms,
    })));

    let manager = Arc::new(SessionManager::new(config.clone(), models, gate)?);
    manager.clone().spawn_idle_sweep();

    info!(
        version = %scribed::version_string(),
        backend = scribed::defaults::gpu_backend(),
        max_sessions = config.limits.max_sessions,
        "starting scribed"
    );

    server::run(&config.server, manager).await?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scribed=info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
