use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	access::Viewer,
	error::RouteError,
	openapi::SECURITY_SCHEME_SESSION,
	route::auth,
	session,
	store::Store,
};

/// Extracts the session and related user from the request.
///
/// If there is no session cookie, a [`auth::Error::NotAuthenticated`] is returned.
/// If the session is invalid, a [`auth::Error::InvalidSessionCookie`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

impl Session {
	pub fn viewer(&self) -> Viewer {
		Viewer::from(&self.user)
	}
}

/// Reads the raw session id from the `Cookie` headers.
fn session_cookie(parts: &request::Parts) -> Option<String> {
	parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.map(|cookie| cookie.value().to_owned())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session_id = session_cookie(parts).ok_or(auth::Error::NotAuthenticated)?;
		let session_id =
			Uuid::parse_str(&session_id).map_err(|_| auth::Error::InvalidSessionCookie)?;

		let store = Store::from_ref(state);
		let user = store
			.find_user_by_session(session_id)
			.await?
			.ok_or(auth::Error::InvalidSessionCookie)?;

		Ok(Self {
			user,
			id: session_id,
		})
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

/// Like [`Session`], but anonymous requests are let through.
///
/// A missing, malformed or expired session cookie all count as anonymous.
#[derive(Debug, Default)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
	pub fn viewer(&self) -> Viewer {
		self.0.as_ref().map_or(Viewer::Anonymous, Session::viewer)
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Some(session_id) = session_cookie(parts).and_then(|id| Uuid::parse_str(&id).ok())
		else {
			return Ok(Self(None));
		};

		let store = Store::from_ref(state);
		let session = store
			.find_user_by_session(session_id)
			.await?
			.map(|user| Session {
				user,
				id: session_id,
			});

		Ok(Self(session))
	}
}

impl OperationInput for MaybeSession {}
