use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError, GovernorLayer,
};

use crate::error::AppError;

pub type Config = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Per-IP rate limits. They key on the peer address, so the server has to be
/// started with connect info.
pub struct Limits {
	/// Applied to the blog routes.
	pub default: Arc<Config>,
	/// Applied to authentication, where every request hashes a password.
	pub secure: Arc<Config>,
}

impl Limits {
	pub fn new() -> Self {
		Self {
			default: Arc::new(
				GovernorConfigBuilder::default()
					.per_second(10)
					.burst_size(50)
					.use_headers()
					.error_handler(error_handler)
					.finish()
					.expect("default rate limit must be non-zero"),
			),
			secure: Arc::new(
				GovernorConfigBuilder::default()
					.per_second(1)
					.use_headers()
					.error_handler(error_handler)
					.finish()
					.expect("auth rate limit must be non-zero"),
			),
		}
	}

	pub fn default_layer(&self) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
		GovernorLayer {
			config: self.default.clone(),
		}
	}

	pub fn secure_layer(&self) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
		GovernorLayer {
			config: self.secure.clone(),
		}
	}

	/// Drops stale entries from the limiter storage once a minute.
	pub fn spawn_cleanup(&self) {
		let limiters = [self.default.limiter().clone(), self.secure.limiter().clone()];
		let interval = Duration::from_secs(60);

		std::thread::spawn(move || loop {
			std::thread::sleep(interval);

			for limiter in &limiters {
				tracing::debug!(size = limiter.len(), "rate limiting storage size");

				limiter.retain_recent();
			}
		});
	}
}

impl Default for Limits {
	fn default() -> Self {
		Self::new()
	}
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}
