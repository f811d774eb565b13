use aide::axum::{
	routing::{get_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{access::Denied, error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown location {0}")]
	UnknownLocation(i64),
	#[error("forbidden: {0}")]
	Forbidden(#[from] Denied),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/locations",
			get_with(get_locations, get_locations_docs)
				.post_with(create_location, create_location_docs),
		)
		.api_route(
			"/locations/:id",
			put_with(update_location, update_location_docs)
				.delete_with(delete_location, delete_location_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownLocation(..) => StatusCode::NOT_FOUND,
			Self::Forbidden(..) => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownLocation(location) => error::Message::new("unknown_location")
				.detail("location", *location)
				.into_vec(),
			Self::Forbidden(denied) => error::Message::new("forbidden")
				.detail("reason", denied.to_string())
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_location_management() {
		let fixture = Fixture::new().await;
		let user = fixture.user("alice").await;
		let staff = fixture.staff("root").await;

		let response = fixture
			.server
			.post("/locations")
			.add_header(COOKIE, cookie(&user))
			.json(&json!({ "name": "Moscow" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.post("/locations")
			.add_header(COOKIE, cookie(&staff))
			.json(&json!({ "name": "Moscow" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let id = response.json::<Value>()["id"].as_i64().unwrap();

		let response = fixture
			.server
			.post("/locations")
			.add_header(COOKIE, cookie(&staff))
			.json(&json!({ "name": "Hidden", "is_published": false }))
			.await;

		assert_eq!(response.status_code(), 200);

		let locations = fixture.server.get("/locations").await.json::<Value>();

		assert_eq!(locations.as_array().unwrap().len(), 1);
		assert_eq!(locations[0]["name"], "Moscow");

		let response = fixture
			.server
			.put(&format!("/locations/{id}"))
			.add_header(COOKIE, cookie(&staff))
			.json(&json!({ "name": "Saint Petersburg" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["name"], "Saint Petersburg");

		let response = fixture
			.server
			.delete(&format!("/locations/{id}"))
			.add_header(COOKIE, cookie(&staff))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = fixture
			.server
			.put(&format!("/locations/{id}"))
			.add_header(COOKIE, cookie(&staff))
			.json(&json!({ "name": "Gone" }))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
