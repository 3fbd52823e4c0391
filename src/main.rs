use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler, http::create_app,
    local_bookings::LocalBookings,
};
use axum::Router;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod availability;
mod backend;
mod booking_draft;
mod configuration;
mod configuration_handler;
#[cfg(feature = "postgres")]
mod database_interface;
mod http;
mod local_bookings;
mod opening_hours;
#[cfg(feature = "postgres")]
mod schema;
#[cfg(test)]
mod testutils;
mod types;

fn local_app(configuration: ConfigurationHandler) -> Router {
    let backend = LocalBookings::default();
    if let Err(err) = backend.insert_example_grounds() {
        error!(%err, "Failed to insert example grounds");
    }
    info!("Bookings are kept in memory and lost on restart");
    create_app(backend, configuration)
}

#[cfg(feature = "postgres")]
async fn connect_database(database_url: &str) -> database_interface::DatabaseInterface {
    use std::time::Duration;
    use tokio::time::sleep;

    loop {
        match database_interface::DatabaseInterface::new(database_url) {
            Ok(backend) => {
                info!("Successfully connected to database");
                break backend;
            }
            Err(err) => {
                error!(?err, "Failed to establish database connection. Retry in 1 sec. You may want to restart without a database URL (in-memory bookings).");
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = ConfigurationHandler::parse_arguments();

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(?err, "Failed to bind {address}");
            return;
        }
    };
    info!("Ground booking accessible at {address}");

    let app = match configuration.database_url() {
        #[cfg(feature = "postgres")]
        Some(database_url) => {
            let backend = connect_database(&database_url).await;
            create_app(backend, configuration)
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("Built without the `postgres` feature, ignoring the database URL");
            local_app(configuration)
        }
        None => local_app(configuration),
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!(?err, "Server stopped");
    }
}
