use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{access::Denied, error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(String),
	#[error("email already taken")]
	EmailTaken,
	#[error("forbidden: {0}")]
	Forbidden(#[from] Denied),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/profile/:username", get_with(get_profile, get_profile_docs))
		.api_route(
			"/edit_profile/:username",
			get_with(get_own_profile, get_own_profile_docs)
				.put_with(update_profile, update_profile_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::EmailTaken => StatusCode::CONFLICT,
			Self::Forbidden(..) => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownUser(username) => error::Message::new("unknown_user")
				.detail("username", username.as_str())
				.into_vec(),
			Self::EmailTaken => error::Message::new("email_taken").field("email").into_vec(),
			Self::Forbidden(denied) => error::Message::new("forbidden")
				.detail("reason", denied.to_string())
				.into_vec(),
		}
	}
}
