use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, store};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable error code or a human-readable explanation.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional structured information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody<'a> {
	pub errors: Vec<Message<'a>>,
}

/// Describes how an error is presented to the client.
///
/// The [`std::fmt::Display`] implementation is only logged, so it can contain
/// sensitive information. Everything returned from [`ErrorShape::errors`] is sent.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>> {
		Message::new(self.to_string()).into_vec()
	}
}

/// Errors shared by every route.
///
/// Not an [`ErrorShape`], so that `RouteError::from` stays unambiguous.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("rate limited")]
	RateLimit(tower_governor::GovernorError),
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) | Self::Path(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::Store(store::Error::Conflict(..)) => StatusCode::CONFLICT,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimit(error) => match error {
				tower_governor::GovernorError::TooManyRequests { .. } => {
					StatusCode::TOO_MANY_REQUESTS
				}
				tower_governor::GovernorError::Other { code, .. } => *code,
				tower_governor::GovernorError::UnableToExtractKey => {
					StatusCode::INTERNAL_SERVER_ERROR
				}
			},
		}
	}

	pub fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.message.as_ref().unwrap_or(&error.code).to_string())
							.field(field.to_string())
					})
				})
				.collect(),
			Self::Json(..) => Message::new("invalid_body").into_vec(),
			Self::Query(error) => Message::new(error.body_text()).into_vec(),
			Self::Path(error) => Message::new(error.body_text()).into_vec(),
			Self::Store(store::Error::Conflict(constraint)) => Message::new("conflict")
				.detail("constraint", *constraint)
				.into_vec(),
			Self::Store(..) => Vec::new(),
			Self::RateLimit(error) => match error {
				tower_governor::GovernorError::TooManyRequests { wait_time, .. } => {
					Message::new("rate_limited")
						.detail("wait_time", *wait_time)
						.into_vec()
				}
				_ => Vec::new(),
			},
		}
	}
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl From<tower_governor::GovernorError> for AppError {
	fn from(error: tower_governor::GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			// keep the schema rejection's own body, it lists every failing path
			Self::Json(rejection) => rejection.into_response(),
			Self::RateLimit(ref error) => {
				let headers = match error {
					tower_governor::GovernorError::TooManyRequests { headers, .. }
					| tower_governor::GovernorError::Other { headers, .. } => headers.clone(),
					tower_governor::GovernorError::UnableToExtractKey => None,
				};

				let mut response = respond(&self, self.status(), self.errors());

				if let Some(headers) = headers {
					response.headers_mut().extend(headers);
				}

				response
			}
			error => respond(&error, error.status(), error.errors()),
		}
	}
}

/// An error returned from a route, either specific to the route module (`T`)
/// or shared by the whole application.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T> {
	#[error(transparent)]
	Route(T),
	#[error(transparent)]
	App(#[from] AppError),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<store::Error> for RouteError<T> {
	fn from(error: store::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<validator::ValidationErrors> for RouteError<T> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Self;
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => respond(&error, error.status(), error.errors()),
			Self::App(error) => error.into_response(),
		}
	}
}

fn respond(
	error: &dyn std::error::Error,
	status: StatusCode,
	errors: Vec<Message<'_>>,
) -> Response<Body> {
	if status.is_server_error() {
		tracing::error!(%error, "request failed");
	} else {
		tracing::debug!(%error, %status, "request rejected");
	}

	(status, Json(ErrorBody { errors })).into_response()
}

#[cfg(test)]
mod test {
	use super::*;

	#[derive(Debug, thiserror::Error)]
	#[error("gone")]
	struct Gone;

	impl ErrorShape for Gone {
		fn status(&self) -> StatusCode {
			StatusCode::GONE
		}
	}

	#[test]
	fn test_message_details() {
		let message = Message::new("unknown_post").detail("post", 3).field("id");

		let value = serde_json::to_value(&message).unwrap();

		assert_eq!(value["content"], "unknown_post");
		assert_eq!(value["field"], "id");
		assert_eq!(value["details"]["post"], 3);
	}

	#[test]
	fn test_message_skips_empty_fields() {
		let value = serde_json::to_value(Message::new("x")).unwrap();

		assert!(value.get("field").is_none());
		assert!(value.get("details").is_none());
	}

	#[test]
	fn test_route_error_status() {
		let response = RouteError::from(Gone).into_response();
		assert_eq!(response.status(), StatusCode::GONE);

		let response =
			RouteError::<Gone>::from(store::Error::Conflict("category_slug_key")).into_response();
		assert_eq!(response.status(), StatusCode::CONFLICT);
	}
}
