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
	#[error("unknown category {0}")]
	UnknownCategory(String),
	#[error("slug already taken")]
	SlugTaken,
	#[error("forbidden: {0}")]
	Forbidden(#[from] Denied),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/category/:slug", get_with(get_category, get_category_docs))
		.api_route(
			"/categories",
			get_with(get_categories, get_categories_docs)
				.post_with(create_category, create_category_docs),
		)
		.api_route(
			"/categories/:slug",
			put_with(update_category, update_category_docs)
				.delete_with(delete_category, delete_category_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownCategory(..) => StatusCode::NOT_FOUND,
			Self::SlugTaken => StatusCode::CONFLICT,
			Self::Forbidden(..) => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownCategory(slug) => error::Message::new("unknown_category")
				.detail("category", slug.as_str())
				.into_vec(),
			Self::SlugTaken => error::Message::new("slug_taken").field("slug").into_vec(),
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
	async fn test_unpublished_category_is_hidden() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let travel = fixture.category("travel", false).await;
		let news = fixture.category("news", true).await;

		fixture.post(&author, Some(travel.id), past(), true).await;
		let visible = fixture.post(&author, Some(news.id), past(), true).await;

		let response = fixture.server.get("/category/travel").await;

		assert_eq!(response.status_code(), 404);

		let home = fixture.server.get("/").await.json::<Value>();

		assert_eq!(home["count"], 1);
		assert_eq!(home["items"][0]["id"], visible.id);

		let response = fixture.server.get("/category/news").await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["category"]["slug"], "news");
		assert_eq!(body["posts"]["count"], 1);

		let response = fixture.server.get("/category/missing").await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_category_management_is_staff_only() {
		let fixture = Fixture::new().await;
		let user = fixture.user("alice").await;
		let staff = fixture.staff("root").await;

		let input = json!({
			"title": "Travel",
			"description": "Places",
			"slug": "travel",
		});

		let response = fixture
			.server
			.post("/categories")
			.add_header(COOKIE, cookie(&user))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.post("/categories")
			.add_header(COOKIE, cookie(&staff))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["is_published"], true);

		let response = fixture
			.server
			.post("/categories")
			.add_header(COOKIE, cookie(&staff))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 409);

		let response = fixture
			.server
			.post("/categories")
			.add_header(COOKIE, cookie(&staff))
			.json(&json!({
				"title": "Bad",
				"description": "",
				"slug": "not a slug",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let response = fixture
			.server
			.put("/categories/travel")
			.add_header(COOKIE, cookie(&staff))
			.json(&json!({ "is_published": false }))
			.await;

		assert_eq!(response.status_code(), 200);

		let categories = fixture.server.get("/categories").await.json::<Value>();

		assert_eq!(categories, json!([]));

		let response = fixture
			.server
			.delete("/categories/travel")
			.add_header(COOKIE, cookie(&staff))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = fixture
			.server
			.delete("/categories/travel")
			.add_header(COOKIE, cookie(&staff))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
