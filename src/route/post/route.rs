use axum::extract::{Path, State};
use chrono::Utc;
use macros::route;

use crate::{
	access::{self, PostFilter},
	extract::{Json, MaybeSession, Query, Session},
	openapi::tag,
	store::Store,
};

use super::{model, Error, RouteError};

/// Checks that the category and location a post refers to exist and are published.
async fn check_references(store: &Store, input: &model::PostInput) -> Result<(), RouteError> {
	if let Some(id) = input.category {
		match store.find_category_by_id(id).await? {
			Some(category) if category.is_published => {}
			_ => return Err(Error::UnknownCategory(id).into()),
		}
	}

	if let Some(id) = input.location {
		match store.find_location(id).await? {
			Some(location) if location.is_published => {}
			_ => return Err(Error::UnknownLocation(id).into()),
		}
	}

	Ok(())
}

/// Fetches a post that only its author may change.
async fn find_own_post(
	store: &Store,
	session: &Session,
	post_id: i64,
) -> Result<model::Post, RouteError> {
	let post = store
		.find_post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	access::ensure_author(session.viewer(), post.author.id).map_err(Error::Forbidden)?;

	Ok(post)
}

/// Home feed
/// Returns a page of public posts across all categories, latest publication date first.
#[route(tag = tag::POST)]
pub async fn get_home(
	State(store): State<Store>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::Page<model::Post>>, RouteError> {
	let posts = store
		.page_posts(&PostFilter::home(Utc::now()), &paginate)
		.await?;

	Ok(Json(posts))
}

/// Get post
/// Returns a single post with its comments. Hidden posts are only returned to their author.
#[route(tag = tag::POST, response(status = 404, description = "The post does not exist or is hidden."))]
pub async fn get_post(
	State(store): State<Store>,
	session: MaybeSession,
	Path(post_id): Path<i64>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = store
		.find_post(post_id)
		.await?
		.filter(|post| access::can_view(post, session.viewer(), Utc::now()))
		.ok_or(Error::UnknownPost(post_id))?;

	let comments = store.list_comments(post.id).await?;

	Ok(Json(model::PostDetail { post, comments }))
}

/// Create post
/// Publishes a new post authored by the current user.
#[route(tag = tag::POST, secure)]
pub async fn create_post(
	State(store): State<Store>,
	session: Session,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::Post>, RouteError> {
	check_references(&store, &input).await?;

	let post = store.create_post(session.user.id, &input).await?;

	tracing::info!(post = post.id, author = %session.user.username, "post created");

	Ok(Json(post))
}

/// Get editable post
/// Returns a post so that its author can edit it.
#[route(tag = tag::POST, secure, response(status = 403, description = "The post belongs to someone else."))]
pub async fn get_editable_post(
	State(store): State<Store>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<Json<model::Post>, RouteError> {
	Ok(Json(find_own_post(&store, &session, post_id).await?))
}

/// Update post
/// Replaces the writable fields of a post. Only the author may do this.
#[route(tag = tag::POST, secure, response(status = 403, description = "The post belongs to someone else."))]
pub async fn update_post(
	State(store): State<Store>,
	session: Session,
	Path(post_id): Path<i64>,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::Post>, RouteError> {
	find_own_post(&store, &session, post_id).await?;
	check_references(&store, &input).await?;

	let post = store
		.update_post(post_id, &input)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	Ok(Json(post))
}

/// Delete post
/// Deletes a post and its comments. Only the author may do this.
#[route(tag = tag::POST, secure, response(status = 403, description = "The post belongs to someone else."))]
pub async fn delete_post(
	State(store): State<Store>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<(), RouteError> {
	find_own_post(&store, &session, post_id).await?;

	if !store.delete_post(post_id).await? {
		return Err(Error::UnknownPost(post_id).into());
	}

	tracing::info!(post = post_id, "post deleted");

	Ok(())
}
