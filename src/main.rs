use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use timesheets::database::init_database;
use timesheets::database::memory::{
    InMemoryDelegationDirectory, InMemoryDocumentStore, InMemoryTimesheetStore,
};
use timesheets::middleware::RequestIdMiddleware;
use timesheets::{AppState, Config, routes};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (also reads .env)
    let config = Config::from_env()?;
    config.validate()?;

    env_logger::init();

    log::info!(
        "Starting timesheet service (environment: {})",
        config.environment
    );

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = init_database(database_url).await?;
            log::info!("Database initialized");
            AppState::postgres(pool, &config)
        }
        None => {
            log::warn!(
                "DATABASE_URL not set; using in-memory stores, data will not survive a restart"
            );
            AppState::in_memory(
                InMemoryTimesheetStore::new(),
                InMemoryDelegationDirectory::new(),
                InMemoryDocumentStore::new(),
                &config,
            )
        }
    };

    let state_data = web::Data::new(state);
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
