mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use crate::mail::sendmail::{mailer_from_env, Mailer};
use service::{
    job_service::JobService,
    listing_service::ListingService,
    notification_service::NotificationService,
    payment_gateway::{MockGateway, PaymentGateway},
    payment_service::PaymentService,
    proposal_service::ProposalService,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub mailer: Arc<dyn Mailer>,
    // Services
    pub job_service: Arc<JobService<DBClient>>,
    pub proposal_service: Arc<ProposalService<DBClient>>,
    pub payment_service: Arc<PaymentService<DBClient>>,
    pub listing_service: Arc<ListingService<DBClient>>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);
        let mailer = mailer_from_env();

        let notification_service = Arc::new(NotificationService::new(
            db_client_arc.clone(),
            mailer.clone(),
        ));
        let job_service = Arc::new(JobService::new(db_client_arc.clone()));
        let listing_service = Arc::new(ListingService::new(db_client_arc.clone()));

        let proposal_service = Arc::new(ProposalService::new(
            db_client_arc.clone(),
            notification_service.clone(),
        ));

        let gateway: Arc<dyn PaymentGateway> = Arc::new(MockGateway::with_latency(
            Duration::from_millis(config.gateway_latency_ms),
        ));
        let payment_service = Arc::new(PaymentService::new(
            db_client_arc.clone(),
            gateway,
            notification_service.clone(),
        ));

        Self {
            env: config,
            db_client: db_client_arc,
            mailer,
            job_service,
            proposal_service,
            payment_service,
            listing_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    // Connect to PostgreSQL
    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);

    let allowed_origins = vec![
        "http://localhost:5173".parse::<HeaderValue>().unwrap(),
        "http://localhost:8000".parse::<HeaderValue>().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
