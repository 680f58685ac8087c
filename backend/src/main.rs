use actix_web::{web, App, HttpServer};
use docket_backend::config::AppConfig;
use docket_backend::job_controller;
use docket_backend::services;
use docket_backend::state::AppState;
use docket_backend::store::Database;
use env_logger::Env;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = AppConfig::from_env();
    let url = format!("http://{}:{}", config.host, config.port);

    let db = Database::open(&config.database_path).map_err(std::io::Error::other)?;
    let store = config.object_store.build();
    let (state, rx) = AppState::new(db, store, &config);

    // Start job updater task
    let updater_state = state.jobs.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    info!(
        "Server running at {} (database {}, object store {:?})",
        url, config.database_path, config.object_store
    );

    let json_limit = config.json_limit_bytes;
    HttpServer::new(move || {
        App::new()
            .app_data(services::json_config(json_limit))
            .app_data(web::Data::new(state.clone()))
            .service(services::workspaces::configure_routes())
            .service(services::workspaces::configure_alias_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
