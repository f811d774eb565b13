use axum::extract::{Path, State};
use chrono::Utc;
use macros::route;

use crate::{
	access::{Denied, PostFilter},
	extract::{Json, MaybeSession, Query, Session},
	openapi::tag,
	store::{self, constraint, Store},
};

use super::{model, Error, RouteError};

/// Fails unless `username` names the session user.
fn ensure_owner(session: &Session, username: &str) -> Result<(), Error> {
	if session.user.username == username {
		Ok(())
	} else {
		Err(Error::Forbidden(Denied::NotOwner))
	}
}

/// Get profile
/// Returns a user's profile with a page of their posts. The owner also sees their hidden posts.
#[route(tag = tag::PROFILE, response(status = 404, description = "The user does not exist."))]
pub async fn get_profile(
	State(store): State<Store>,
	session: MaybeSession,
	Path(username): Path<String>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::ProfilePage>, RouteError> {
	let user = store
		.find_user_by_username(&username)
		.await?
		.ok_or(Error::UnknownUser(username))?;

	let viewer = session.viewer();
	let posts = store
		.page_posts(&PostFilter::author(user.id, viewer, Utc::now()), &paginate)
		.await?;

	let own = viewer.is(user.id);

	Ok(Json(model::ProfilePage {
		profile: model::Profile::of(user, own),
		posts,
	}))
}

/// Get own profile
/// Returns the editable profile of the current user.
#[route(tag = tag::PROFILE, secure, response(status = 403, description = "The profile belongs to someone else."))]
pub async fn get_own_profile(
	session: Session,
	Path(username): Path<String>,
) -> Result<Json<model::Profile>, RouteError> {
	ensure_owner(&session, &username)?;

	Ok(Json(model::Profile::of(session.user, true)))
}

/// Update profile
/// Updates the name and email of the current user.
#[route(tag = tag::PROFILE, secure, response(status = 403, description = "The profile belongs to someone else."), response(status = 409, description = "The email is already taken."))]
pub async fn update_profile(
	State(store): State<Store>,
	session: Session,
	Path(username): Path<String>,
	Json(input): Json<model::ProfileInput>,
) -> Result<Json<model::Profile>, RouteError> {
	ensure_owner(&session, &username)?;

	let user = store
		.update_profile(session.user.id, &input)
		.await
		.map_err(|error| match error {
			store::Error::Conflict(constraint::USER_EMAIL) => Error::EmailTaken.into(),
			error => RouteError::from(error),
		})?;

	Ok(Json(model::Profile::of(user, true)))
}
