use axum::extract::{Path, State};
use chrono::Utc;
use macros::route;

use crate::{
	access,
	extract::{self, Json, Session},
	openapi::tag,
	store::Store,
};

use super::{model, Error, RouteError};

/// Fetches a comment that only its author may change.
async fn find_own_comment(
	store: &Store,
	session: &Session,
	path: &model::CommentPath,
) -> Result<model::Comment, RouteError> {
	let comment = store
		.find_comment(path.id, path.comment_id)
		.await?
		.ok_or(Error::UnknownComment {
			post: path.id,
			comment: path.comment_id,
		})?;

	access::ensure_author(session.viewer(), comment.author.id).map_err(Error::Forbidden)?;

	Ok(comment)
}

/// Add comment
/// Comments on a post. The post has to be visible to the commenter.
#[route(tag = tag::COMMENT, secure, response(status = 404, description = "The post does not exist or is hidden."))]
pub async fn create_comment(
	State(store): State<Store>,
	session: Session,
	Path(post_id): Path<i64>,
	Json(input): Json<model::CommentInput>,
) -> Result<Json<model::Comment>, RouteError> {
	store
		.find_post(post_id)
		.await?
		.filter(|post| access::can_view(post, session.viewer(), Utc::now()))
		.ok_or(Error::UnknownPost(post_id))?;

	// the post can still disappear between the lookup and the insert
	let comment = store
		.create_comment(post_id, session.user.id, &input)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	tracing::info!(post = post_id, comment = comment.id, "comment created");

	Ok(Json(comment))
}

/// Get comment
/// Returns a comment so that its author can edit it.
#[route(tag = tag::COMMENT, secure, response(status = 403, description = "The comment belongs to someone else."))]
pub async fn get_comment(
	State(store): State<Store>,
	session: Session,
	extract::Path(path): extract::Path<model::CommentPath>,
) -> Result<Json<model::Comment>, RouteError> {
	Ok(Json(find_own_comment(&store, &session, &path).await?))
}

/// Update comment
/// Replaces the text of a comment. Only the author may do this.
#[route(tag = tag::COMMENT, secure, response(status = 403, description = "The comment belongs to someone else."))]
pub async fn update_comment(
	State(store): State<Store>,
	session: Session,
	extract::Path(path): extract::Path<model::CommentPath>,
	Json(input): Json<model::CommentInput>,
) -> Result<Json<model::Comment>, RouteError> {
	find_own_comment(&store, &session, &path).await?;

	let comment = store
		.update_comment(path.id, path.comment_id, &input)
		.await?
		.ok_or(Error::UnknownComment {
			post: path.id,
			comment: path.comment_id,
		})?;

	Ok(Json(comment))
}

/// Delete comment
/// Deletes a comment and updates the comment count of its post. Only the author may do this.
#[route(tag = tag::COMMENT, secure, response(status = 403, description = "The comment belongs to someone else."))]
pub async fn delete_comment(
	State(store): State<Store>,
	session: Session,
	extract::Path(path): extract::Path<model::CommentPath>,
) -> Result<(), RouteError> {
	find_own_comment(&store, &session, &path).await?;

	if !store.delete_comment(path.id, path.comment_id).await? {
		return Err(Error::UnknownComment {
			post: path.id,
			comment: path.comment_id,
		}
		.into());
	}

	tracing::info!(post = path.id, comment = path.comment_id, "comment deleted");

	Ok(())
}
