use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{access::Denied, error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown or unpublished category {0}")]
	UnknownCategory(i64),
	#[error("unknown or unpublished location {0}")]
	UnknownLocation(i64),
	#[error("forbidden: {0}")]
	Forbidden(#[from] Denied),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_home, get_home_docs))
		.api_route("/posts/create", post_with(create_post, create_post_docs))
		.api_route("/posts/:id", get_with(get_post, get_post_docs))
		.api_route(
			"/posts/:id/edit",
			get_with(get_editable_post, get_editable_post_docs)
				.put_with(update_post, update_post_docs),
		)
		.api_route(
			"/posts/:id/delete",
			post_with(delete_post, delete_post_docs).delete_with(delete_post, delete_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::UnknownCategory(..) | Self::UnknownLocation(..) => StatusCode::BAD_REQUEST,
			Self::Forbidden(..) => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", *post)
				.into_vec(),
			Self::UnknownCategory(category) => error::Message::new("unknown_category")
				.field("category")
				.detail("category", *category)
				.into_vec(),
			Self::UnknownLocation(location) => error::Message::new("unknown_location")
				.field("location")
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
	use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};

	use crate::test::*;

	#[tokio::test]
	async fn test_home_feed_shows_only_public_posts() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let news = fixture.category("news", true).await;
		let travel = fixture.category("travel", false).await;

		let public = fixture.post(&author, Some(news.id), past(), true).await;
		fixture.post(&author, Some(news.id), past(), false).await;
		fixture.post(&author, Some(news.id), future(), true).await;
		fixture.post(&author, Some(travel.id), past(), true).await;
		fixture.post(&author, None, past(), true).await;

		let response = fixture.server.get("/").await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["count"], 1);
		assert_eq!(body["items"][0]["id"], public.id);
	}

	#[tokio::test]
	async fn test_detail_visibility() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let other = fixture.user("bob").await;
		let news = fixture.category("news", true).await;

		let public = fixture.post(&author, Some(news.id), past(), true).await;
		let draft = fixture.post(&author, Some(news.id), past(), false).await;

		let response = fixture.server.get(&format!("/posts/{}", public.id)).await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["comments"], json!([]));

		let response = fixture.server.get(&format!("/posts/{}", draft.id)).await;
		assert_eq!(response.status_code(), 404);

		let response = fixture
			.server
			.get(&format!("/posts/{}", draft.id))
			.add_header(COOKIE, cookie(&other))
			.await;
		assert_eq!(response.status_code(), 404);

		let response = fixture
			.server
			.get(&format!("/posts/{}", draft.id))
			.add_header(COOKIE, cookie(&author))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["title"], draft.title);
	}

	#[tokio::test]
	async fn test_pagination_clamps_to_last_page() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let news = fixture.category("news", true).await;

		let mut ids = Vec::new();

		for hours in 1..=25 {
			let post = fixture
				.post(&author, Some(news.id), hours_ago(hours), true)
				.await;

			ids.push(post.id);
		}

		let ids_of = |body: &Value| {
			body["items"]
				.as_array()
				.unwrap()
				.iter()
				.map(|post| post["id"].as_i64().unwrap())
				.collect::<Vec<_>>()
		};

		let first = fixture.server.get("/").await.json::<Value>();

		assert_eq!(ids_of(&first), ids[..10]);
		assert_eq!(first["pages"], 3);
		assert_eq!(first["has_previous"], false);

		let third = fixture
			.server
			.get("/")
			.add_query_param("page", "3")
			.await.json::<Value>();

		assert_eq!(ids_of(&third), ids[20..]);
		assert_eq!(third["has_next"], false);

		let clamped = fixture
			.server
			.get("/")
			.add_query_param("page", "4")
			.await.json::<Value>();

		assert_eq!(clamped["page"], 3);
		assert_eq!(ids_of(&clamped), ids[20..]);

		let garbage = fixture
			.server
			.get("/")
			.add_query_param("page", "abc")
			.await.json::<Value>();

		assert_eq!(garbage["page"], 1);
	}

	#[tokio::test]
	async fn test_create_post() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let news = fixture.category("news", true).await;
		let hidden = fixture.category("hidden", false).await;

		let input = json!({
			"title": "Hello",
			"text": "World",
			"pub_date": past(),
			"category": news.id,
		});

		let response = fixture.server.post("/posts/create").json(&input).await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["errors"][0]["details"]["login_url"],
			"/auth/login"
		);

		let response = fixture
			.server
			.post("/posts/create")
			.add_header(COOKIE, cookie(&author))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 200);

		let post = response.json::<Value>();

		assert_eq!(post["author"]["username"], "alice");
		assert_eq!(post["category"]["slug"], "news");
		assert_eq!(post["comment_count"], 0);

		let response = fixture
			.server
			.post("/posts/create")
			.add_header(COOKIE, cookie(&author))
			.json(&json!({
				"title": "Hello",
				"text": "World",
				"pub_date": past(),
				"category": hidden.id,
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "category");

		let response = fixture
			.server
			.post("/posts/create")
			.add_header(COOKIE, cookie(&author))
			.json(&json!({
				"title": "",
				"text": "World",
				"pub_date": past(),
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_only_author_can_edit() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let other = fixture.user("bob").await;
		let news = fixture.category("news", true).await;
		let post = fixture.post(&author, Some(news.id), past(), true).await;

		let input = json!({
			"title": "Edited",
			"text": "Edited text",
			"pub_date": past(),
			"category": news.id,
		});

		let response = fixture
			.server
			.put(&format!("/posts/{}/edit", post.id))
			.add_header(COOKIE, cookie(&other))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.get(&format!("/posts/{}/edit", post.id))
			.add_header(COOKIE, cookie(&other))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.put(&format!("/posts/{}/edit", post.id))
			.add_header(COOKIE, cookie(&author))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 200);

		let response = fixture.server.get(&format!("/posts/{}", post.id)).await;

		assert_eq!(response.json::<Value>()["title"], "Edited");

		let response = fixture
			.server
			.put("/posts/9999/edit")
			.add_header(COOKIE, cookie(&author))
			.json(&input)
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_delete_post() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let other = fixture.user("bob").await;
		let news = fixture.category("news", true).await;
		let post = fixture.post(&author, Some(news.id), past(), true).await;

		let response = fixture
			.server
			.delete(&format!("/posts/{}/delete", post.id))
			.add_header(COOKIE, cookie(&other))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.post(&format!("/posts/{}/delete", post.id))
			.add_header(COOKIE, cookie(&author))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = fixture.server.get(&format!("/posts/{}", post.id)).await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_trailing_slash_routes() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let news = fixture.category("news", true).await;
		let post = fixture.post(&author, Some(news.id), past(), true).await;

		let response = fixture.server.get(&format!("/posts/{}/", post.id)).await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["id"], post.id);

		let response = fixture.server.get("/category/news/").await;
		assert_eq!(response.status_code(), 200);

		let response = fixture
			.server
			.post(&format!("/posts/{}/comment/", post.id))
			.add_header(COOKIE, cookie(&author))
			.json(&json!({ "text": "first" }))
			.await;
		assert_eq!(response.status_code(), 200);
	}

	#[tokio::test]
	async fn test_cors_and_malformed_body() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;

		let response = fixture
			.server
			.get("/")
			.add_header(ORIGIN, HeaderValue::from_static("https://blogicum.test"))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header(ACCESS_CONTROL_ALLOW_ORIGIN), "*");

		let response = fixture
			.server
			.post("/posts/create")
			.add_header(COOKIE, cookie(&author))
			.json(&json!({ "title": 5 }))
			.await;

		assert_eq!(response.status_code(), 400);
	}
}
