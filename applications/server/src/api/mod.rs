/// API route modules
pub mod auth;
pub mod health;
pub mod playlists;
pub mod songs;

use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the application router.
///
/// Routes that need a session enforce it through their extractors, so public
/// and protected routes share one router.
pub fn create_router(app_state: AppState, allowed_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/loggedIn", get(auth::logged_in))
        .route("/update", put(auth::update_user));

    let store_routes = Router::new()
        .route("/playlist", post(playlists::create_playlist))
        .route(
            "/playlist/:id",
            get(playlists::get_playlist)
                .put(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlistpairs", get(playlists::playlist_pairs))
        .route("/playlists", get(playlists::search_playlists));

    let song_routes = Router::new()
        .route("/", get(songs::list_songs).post(songs::create_song))
        .route("/stats", get(songs::song_stats))
        .route("/check/exists", get(songs::song_exists))
        .route(
            "/:id",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        .route("/:id/listen", post(songs::increment_listens));

    Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/store", store_routes)
        .nest("/songs", song_routes)
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(cors_layer(allowed_origins))
        .with_state(app_state)
}

/// Credentialed CORS for the configured browser origins
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
