use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use config::Config;
use errors::AppError;
use payments::{DisabledGateway, PaymentGateway, StripeGateway};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod domain;
mod errors;
mod handlers;
mod middlewares;
mod models;
mod payments;
mod schema;
mod utils;

#[cfg(test)]
mod test_init_app;

pub struct GlobalState{
    pub pool: Pool<Postgres>,
    pub config: Config,
    pub payments: Arc<dyn PaymentGateway>,
}

/// Browser access for the configured frontend origins, with cookies.
pub fn cors(config:&Config) -> Cors{
    config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> Result<(), AppError>{

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&config.database_url)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "cannot connect to the database");
        AppError::DbConnect
    })?;

    sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "migrations failed");
        AppError::Migration
    })?;

    let payments: Arc<dyn PaymentGateway> = match StripeGateway::from_config(&config.stripe) {
        Some(gateway) => Arc::new(gateway),
        None => {
            warn!("STRIPE_SECRET_KEY is not set, paid checkouts are disabled");
            Arc::new(DisabledGateway)
        }
    };

    let address = config.bind_address;

    let global_state = GlobalState{pool, config, payments};

    let app_data = web::Data::new(global_state);

    info!(%address, "the server is running");

    HttpServer::new(
        move||{
            App::new()
            .app_data(app_data.clone())
            .wrap(cors(&app_data.config))
            .wrap(Logger::default())
            .configure(handlers::configure)
        }
    ).bind(address)
    .map_err(|_e|AppError::SocketBind)?
    .run()
    .await
    .map_err(|_e|AppError::ServerStart)?;

    Ok(())

}
