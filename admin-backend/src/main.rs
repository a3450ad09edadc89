use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

mod auth;
mod config;
mod controllers;
mod db;
mod middleware;
mod models;
mod response;

use auth::{LocalSessions, RemoteAuth, TokenVerifier};
use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub verifier: Arc<dyn TokenVerifier>,
}

/// SPA fallback handler - serves index.html for client-side routing
async fn spa_fallback(index: web::Data<PathBuf>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open(index.as_path())?)
}

fn build_verifier(config: &Config, db: Arc<Database>) -> io::Result<Arc<dyn TokenVerifier>> {
    match config.auth_provider_url.as_deref() {
        Some(url) => {
            let remote = RemoteAuth::new(url, config.auth_provider_api_key.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
            log::info!("Validating bearer tokens against {}", url);
            Ok(Arc::new(remote))
        }
        None => {
            log::info!("Validating bearer tokens against local sessions");
            Ok(Arc::new(LocalSessions::new(db)))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).map_err(|e| io::Error::other(e.to_string()))?;
    let db = Arc::new(db);

    let verifier = build_verifier(&config, db.clone())?;

    // Static files are served only when the dist directory actually exists
    let frontend_dist = config
        .frontend_dist
        .clone()
        .filter(|dir| {
            let exists = std::path::Path::new(dir).is_dir();
            if !exists {
                log::warn!("Frontend dist {} not found - static file serving disabled", dir);
            }
            exists
        });
    if let Some(dir) = &frontend_dist {
        log::info!("Serving frontend from: {}", dir);
    }

    let state = web::Data::new(AppState {
        db,
        config,
        verifier,
    });

    log::info!("Starting admin backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(state.clone())
            .app_data(response::json_config())
            .app_data(response::query_config())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure);

        if let Some(dir) = &frontend_dist {
            app = app
                .app_data(web::Data::new(PathBuf::from(dir).join("index.html")))
                .service(
                    Files::new("/", dir.clone())
                        .index_file("index.html")
                        .default_handler(web::to(spa_fallback)),
                );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
