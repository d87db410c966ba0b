/// Playlister Server - playlist store and song catalog
use anyhow::Context;
use clap::{Parser, Subcommand};
use playlister_core::{Backend, DatabaseManager, NewSong, PlaylisterError, SongSort};
use playlister_server::{config::ServerConfig, create_router, services::AuthService, state::AppState};
use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "playlister-server")]
#[command(about = "Playlist store and song catalog server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend override (document or relational)
    #[arg(short, long, global = true, env = "PLAYLISTER_BACKEND")]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Replace the song catalog with the songs in a JSON file
    ResetSongs {
        /// File shaped like `{"songs": [{"title", "artist", "year", "youTubeId"}]}`
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    songs: Vec<NewSong>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "playlister_server=info,playlister_storage=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::ResetSongs { file } => reset_songs(&config, &file).await?,
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Playlister Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!("Backend: {}", config.database.backend);

    // Initialize database
    let db = playlister_storage::open_database(&config.database).await?;

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiration_hours,
        config.auth.secure_cookies,
        config.auth.bcrypt_cost,
    ));
    tracing::info!("Auth service initialized");

    // Build application state and router
    let app_state = AppState::new(Arc::clone(&db), auth_service);
    let app = create_router(app_state, &config.server.allowed_origins);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await?;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn reset_songs(config: &ServerConfig, file: &std::path::Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let seed: SeedFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", file.display()))?;

    let db = playlister_storage::open_database(&config.database).await?;

    let existing = db.get_all_songs(SongSort::default()).await?;
    for song in &existing {
        db.delete_song(&song.id).await?;
    }
    tracing::info!("Removed {} catalog songs", existing.len());

    let mut created = 0usize;
    for song in seed.songs {
        let key = format!("{} by {} ({})", song.title, song.artist, song.year);
        match db.create_song(song).await {
            Ok(_) => created += 1,
            Err(PlaylisterError::DuplicateEntry(_)) => {
                tracing::warn!("Skipping duplicate song {}", key);
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!("Seeded {} catalog songs", created);

    db.close().await?;
    Ok(())
}
