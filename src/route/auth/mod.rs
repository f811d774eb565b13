use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, session, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("password validation error")]
	Argon(#[from] argon2::Error),
	#[error("not authenticated")]
	NotAuthenticated,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword | Self::NotAuthenticated | Self::InvalidSessionCookie => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::NotAuthenticated | Self::InvalidSessionCookie => {
				error::Message::new(self.to_string())
					.detail("login_url", session::LOGIN_URL)
					.into_vec()
			}
			Self::UsernameTaken => error::Message::new(self.to_string())
				.field("username")
				.into_vec(),
			Self::EmailTaken => error::Message::new(self.to_string())
				.field("email")
				.into_vec(),
			Self::Argon(..) => Vec::new(),
			Self::InvalidUsernameOrPassword => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let fixture = Fixture::new().await;
		let server = &fixture.server;

		let response = server
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = server
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let session = response.json::<Value>()["session_id"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = server
			.get("/auth/me")
			.add_header(COOKIE, session_cookie(&session))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["username"], "john");

		let response = server
			.get("/auth/logout")
			.add_header(COOKIE, session_cookie(&session))
			.await;

		assert_eq!(response.status_code(), 204);

		let response = server
			.get("/auth/me")
			.add_header(COOKIE, session_cookie(&session))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_login_rejections() {
		let fixture = Fixture::new().await;
		let server = &fixture.server;

		let response = server
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = server
			.post("/auth/register")
			.json(&json!({
				"email": "other@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "username");

		let response = server
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "wrong-password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);

		let response = server.get("/auth/me").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["errors"][0]["details"]["login_url"],
			"/auth/login"
		);
	}

	#[tokio::test]
	async fn test_admin_email_registers_staff() {
		let fixture = Fixture::with_admin("root@blogicum.test").await;
		let server = &fixture.server;

		let mut sessions = Vec::new();

		for (email, username) in [("Root@Blogicum.test", "root"), ("john@smith.com", "john")] {
			let response = server
				.post("/auth/register")
				.json(&json!({
					"email": email,
					"username": username,
					"password": "hunter2hunter",
				}))
				.await;

			assert_eq!(response.status_code(), 200);

			sessions.push(
				response.json::<Value>()["session_id"]
					.as_str()
					.unwrap()
					.to_owned(),
			);
		}

		let staff = [true, false];

		for (session, is_staff) in sessions.iter().zip(staff) {
			let response = server
				.get("/auth/me")
				.add_header(COOKIE, session_cookie(session))
				.await;

			assert_eq!(response.json::<Value>()["is_staff"], is_staff);

			let response = server
				.post("/categories")
				.add_header(COOKIE, session_cookie(session))
				.json(&json!({
					"title": "Travel",
					"description": "Places",
					"slug": format!("travel-{is_staff}"),
				}))
				.await;

			assert_eq!(response.status_code(), if is_staff { 200 } else { 403 });
		}
	}

	#[sqlx::test]
	async fn test_signup_flow_on_postgres(pool: sqlx::PgPool) {
		let fixture = Fixture::postgres(pool).await;
		let server = &fixture.server;

		let response = server
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = server
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "johnny",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "email");

		let response = server
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let session = response.json::<Value>()["session_id"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = server
			.get("/auth/me")
			.add_header(COOKIE, session_cookie(&session))
			.await;

		assert_eq!(response.json::<Value>()["username"], "john");
	}
}
