#![warn(clippy::pedantic)]

mod access;
mod config;
mod error;
mod extract;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{Extension, Router};
use tower::{Layer, ServiceBuilder};
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{config::Config, store::Store};

pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store or a hash configuration (if it's expensive to create).
///
/// For dependencies only used by a single handler, you can combine states instead.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: Store,
	pub hasher: Argon2<'static>,
	/// Accounts registered with this email are staff.
	pub admin_email: Option<Arc<str>>,
}

impl State {
	pub fn new(store: Store) -> Self {
		Self {
			store,
			hasher: Argon2::default(),
			admin_email: None,
		}
	}

	pub fn with_admin_email(mut self, email: Option<&str>) -> Self {
		self.admin_email = email.map(Arc::from);
		self
	}

	pub fn is_admin_email(&self, email: &str) -> bool {
		self.admin_email
			.as_deref()
			.is_some_and(|admin| admin.eq_ignore_ascii_case(email))
	}
}

/// Builds the application router with its documentation and middleware.
///
/// Rate limits are only applied when `limits` is given, since they need the
/// peer address from the connect info.
pub fn app(state: State, limits: Option<&ratelimit::Limits>) -> Router {
	aide::gen::on_error(|error| tracing::error!(%error, "failed to generate api docs"));
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();
	let mut blog = route::routes();
	let mut auth = route::auth::routes();

	if let Some(limits) = limits {
		blog = blog.layer(limits.default_layer());
		auth = auth.layer(limits.secure_layer());
	}

	ApiRouter::new()
		.merge(blog)
		.nest("/auth", auth)
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(CorsLayer::permissive())
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(
					TraceLayer::new_for_http()
						.make_span_with(trace::make_span)
						.on_response(trace::on_response),
				),
		)
		.with_state(state)
}

/// Wraps the application so that paths with a trailing slash reach the same routes.
///
/// Path normalization has to run before routing, so the application is mounted
/// as the fallback of an otherwise empty router.
pub fn service(app: Router) -> Router {
	Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(app))
}

/// Grants staff to the configured admin account if it already exists.
async fn promote_admin(store: &Store, email: &str) {
	match store.promote_staff(email).await {
		Ok(true) => tracing::info!(email, "granted staff to the admin account"),
		Ok(false) => tracing::info!(email, "admin account will be staff once registered"),
		Err(error) => tracing::error!(%error, "failed to promote the admin account"),
	}
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for the shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(&config);

	let store = store::connect(&config)
		.await
		.expect("failed to open the store");

	match store.reconcile_comment_counts().await {
		Ok(0) => {}
		Ok(fixed) => tracing::warn!(fixed, "reconciled drifted comment counts"),
		Err(error) => tracing::error!(%error, "failed to reconcile comment counts"),
	}

	if let Some(email) = &config.admin_email {
		promote_admin(&store, email).await;
	}

	let limits = ratelimit::Limits::new();
	limits.spawn_cleanup();

	let state = State::new(store).with_admin_email(config.admin_email.as_deref());
	let app = service(app(state, Some(&limits)));

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!(host = %config.host, port = config.port, "listening");

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await
	.expect("server error");
}
