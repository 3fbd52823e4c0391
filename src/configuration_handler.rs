use crate::configuration::Configuration;
use clap::Parser;
use tracing::debug;

/// Slot availability and booking service for sports grounds.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct ConfigurationHandler {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// PostgreSQL connection URL. Bookings are kept in memory when omitted.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "BOOKING_HORIZON_DAYS", default_value_t = 30)]
    booking_horizon_days: u32,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            debug!(?err, "No .env file loaded");
        }
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn booking_horizon_days(&self) -> u32 {
        self.booking_horizon_days
    }
}
