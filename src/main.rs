use std::{net::SocketAddr, sync::Arc};

use guildtune::{
    audio::SymphoniaOpener,
    common::{AnyResult, BuildInfo, logger},
    configs::Config,
    player::{AudioService, PlayerMap},
    server::AppState,
    sources::{SourceManager, ytdlp::cleanup_temp_files},
    transport,
    voice::LoopbackTransport,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let (config, config_path) = Config::load()?;
    logger::init(config.logging.as_ref());

    let build = BuildInfo::default();
    info!(
        "guildtune {} ({}@{}, {})",
        build.version,
        build.branch,
        build.short_commit(),
        build.profile
    );
    match config_path {
        Some(path) => info!("Loaded configuration from {}", path),
        None => warn!("No config.toml found, using built-in defaults"),
    }

    let stale = cleanup_temp_files(&config.sources.temp_dir);
    if stale > 0 {
        info!(
            "Removed {} stale download(s) from {}",
            stale,
            config.sources.temp_dir.display()
        );
    }

    let service = Arc::new(AudioService::new(
        Arc::new(PlayerMap::new()),
        Arc::new(LoopbackTransport::new(&config.voice.output_dir)),
        Arc::new(SymphoniaOpener::new(&config.player)),
        config.player.clone(),
    ));
    let sources = Arc::new(SourceManager::new(&config.sources));
    info!("Enabled sources: {}", sources.names().join(", "));

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = Arc::new(AppState::new(service.clone(), sources, config));
    let app = transport::http_server::router(state);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown requested");
        })
        .await?;

    service.shutdown().await;
    info!("All players stopped");
    Ok(())
}
