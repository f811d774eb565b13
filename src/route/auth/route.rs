use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	session,
	store::{self, constraint, Store},
	AppState,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Log in
/// Logs in to an account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = state
		.store
		.find_user_by_email(&auth.email)
		.await?
		.ok_or(Error::InvalidUsernameOrPassword)?;

	let hashed = hash_password(&state.hasher, &auth.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		tracing::debug!(user = %user.id, "rejected login with a wrong password");

		return Err(Error::InvalidUsernameOrPassword.into());
	}

	let session = state.store.create_session(user.id).await?;
	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Log out
/// Logs out of the authenticated account and clears the session cookie.
#[route(tag = tag::AUTH, secure, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(store): State<Store>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	store.delete_session(session.id).await?;

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Register account
/// Registers a new account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Session>"), response(status = 409, description = "The username or email is already taken."))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &user_id).map_err(Error::Argon)?;
	let is_staff = state.is_admin_email(&auth.email);

	let user = state
		.store
		.create_user(model::NewUser {
			id: user_id,
			email: auth.email,
			username: auth.username,
			password: hashed.to_vec(),
			is_staff,
		})
		.await
		.map_err(|error| match error {
			store::Error::Conflict(constraint::USER_EMAIL) => Error::EmailTaken.into(),
			store::Error::Conflict(constraint::USER_USERNAME) => Error::UsernameTaken.into(),
			error => RouteError::from(error),
		})?;

	let session = state.store.create_session(user.id).await?;
	let cookie = session::create_cookie(session.id);

	tracing::info!(user = %user.id, username = %user.username, is_staff, "user registered");

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH, secure)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}
