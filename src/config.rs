//! Application configuration loaded from environment variables.

use std::{env, str::FromStr};

use tracing::level_filters::LevelFilter;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} has an invalid value: {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
	/// A PostgreSQL URL, or `memory://` for the in-memory store.
	pub database_url: String,
	pub max_connections: u32,
	pub host: String,
	pub port: u16,
	pub log_level: LevelFilter,
	/// Export traces and metrics over OTLP.
	pub otel: bool,
	/// The account with this email is granted staff.
	pub admin_email: Option<String>,
}

impl Config {
	/// Load configuration from environment variables.
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

		Ok(Self {
			database_url: lookup("DATABASE_URL").ok_or(Error::Missing("DATABASE_URL"))?,
			max_connections: parsed(
				"DATABASE_MAX_CONNECTIONS",
				var("DATABASE_MAX_CONNECTIONS", "10"),
			)?,
			host: var("HOST", "127.0.0.1"),
			port: parsed("PORT", var("PORT", "3000"))?,
			log_level: parsed("LOG_LEVEL", var("LOG_LEVEL", "info"))?,
			otel: parsed("OTEL_ENABLED", var("OTEL_ENABLED", "false"))?,
			admin_email: lookup("ADMIN_EMAIL")
				.map(|email| email.trim().to_string())
				.filter(|email| !email.is_empty()),
		})
	}
}

fn parsed<T: FromStr>(name: &'static str, value: String) -> Result<T, Error> {
	value
		.trim()
		.parse()
		.map_err(|_| Error::Invalid { name, value })
}
