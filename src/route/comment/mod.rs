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
	#[error("unknown comment {comment} on post {post}")]
	UnknownComment { post: i64, comment: i64 },
	#[error("forbidden: {0}")]
	Forbidden(#[from] Denied),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/posts/:id/comment",
			post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/posts/:id/comment/:comment_id",
			get_with(get_comment, get_comment_docs).put_with(update_comment, update_comment_docs),
		)
		.api_route(
			"/posts/:id/delete/:comment_id",
			post_with(delete_comment, delete_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment { .. } => StatusCode::NOT_FOUND,
			Self::Forbidden(..) => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", *post)
				.into_vec(),
			Self::UnknownComment { post, comment } => error::Message::new("unknown_comment")
				.detail("post", *post)
				.detail("comment", *comment)
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
	async fn test_comment_count_follows_writes() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let reader = fixture.user("bob").await;
		let news = fixture.category("news", true).await;
		let post = fixture.post(&author, Some(news.id), past(), true).await;

		let mut comments = Vec::new();

		for n in 0..5 {
			let response = fixture
				.server
				.post(&format!("/posts/{}/comment", post.id))
				.add_header(COOKIE, cookie(&reader))
				.json(&json!({ "text": format!("comment {n}") }))
				.await;

			assert_eq!(response.status_code(), 200);

			comments.push(response.json::<Value>()["id"].as_i64().unwrap());
		}

		for comment in &comments[..2] {
			let response = fixture
				.server
				.delete(&format!("/posts/{}/delete/{comment}", post.id))
				.add_header(COOKIE, cookie(&reader))
				.await;

			assert_eq!(response.status_code(), 200);
		}

		let body = fixture
			.server
			.get(&format!("/posts/{}", post.id))
			.await
			.json::<Value>();

		assert_eq!(body["comment_count"], 3);
		assert_eq!(body["comments"].as_array().unwrap().len(), 3);
		assert_eq!(body["comments"][0]["text"], "comment 2");
		assert_eq!(body["comments"][0]["author"]["username"], "bob");
	}

	#[tokio::test]
	async fn test_cannot_comment_on_hidden_post() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let reader = fixture.user("bob").await;
		let news = fixture.category("news", true).await;
		let draft = fixture.post(&author, Some(news.id), past(), false).await;

		let response = fixture
			.server
			.post(&format!("/posts/{}/comment", draft.id))
			.add_header(COOKIE, cookie(&reader))
			.json(&json!({ "text": "hello" }))
			.await;

		assert_eq!(response.status_code(), 404);

		let response = fixture
			.server
			.post(&format!("/posts/{}/comment", draft.id))
			.add_header(COOKIE, cookie(&author))
			.json(&json!({ "text": "note to self" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = fixture
			.server
			.post(&format!("/posts/{}/comment", draft.id))
			.json(&json!({ "text": "anonymous" }))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_only_author_can_change_comment() {
		let fixture = Fixture::new().await;
		let author = fixture.user("alice").await;
		let other = fixture.user("bob").await;
		let news = fixture.category("news", true).await;
		let post = fixture.post(&author, Some(news.id), past(), true).await;

		let comment = fixture
			.server
			.post(&format!("/posts/{}/comment", post.id))
			.add_header(COOKIE, cookie(&author))
			.json(&json!({ "text": "first" }))
			.await
			.json::<Value>()["id"]
			.as_i64()
			.unwrap();

		let path = format!("/posts/{}/comment/{comment}", post.id);

		let response = fixture
			.server
			.put(&path)
			.add_header(COOKIE, cookie(&other))
			.json(&json!({ "text": "hijacked" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.post(&format!("/posts/{}/delete/{comment}", post.id))
			.add_header(COOKIE, cookie(&other))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = fixture
			.server
			.put(&path)
			.add_header(COOKIE, cookie(&author))
			.json(&json!({ "text": "edited" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = fixture
			.server
			.get(&path)
			.add_header(COOKIE, cookie(&author))
			.await;

		assert_eq!(response.json::<Value>()["text"], "edited");

		let response = fixture
			.server
			.get(&format!("/posts/{}/comment/9999", post.id))
			.add_header(COOKIE, cookie(&author))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
