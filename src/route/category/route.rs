use axum::extract::{Path, State};
use chrono::Utc;
use macros::route;

use crate::{
	access::{self, PostFilter},
	extract::{Json, Query, Session},
	openapi::tag,
	store::{self, constraint, Store},
};

use super::{model, Error, RouteError};

fn slug_conflict(error: store::Error) -> RouteError {
	match error {
		store::Error::Conflict(constraint::CATEGORY_SLUG) => Error::SlugTaken.into(),
		error => error.into(),
	}
}

/// Category feed
/// Returns a published category with a page of its public posts, latest publication date first.
#[route(tag = tag::CATEGORY, response(status = 404, description = "The category does not exist or is unpublished."))]
pub async fn get_category(
	State(store): State<Store>,
	Path(slug): Path<String>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::CategoryPage>, RouteError> {
	let category = store
		.find_category(&slug)
		.await?
		.filter(|category| category.is_published)
		.ok_or(Error::UnknownCategory(slug))?;

	let posts = store
		.page_posts(&PostFilter::category(category.id, Utc::now()), &paginate)
		.await?;

	Ok(Json(model::CategoryPage { category, posts }))
}

/// List categories
/// Returns every published category, ordered by title.
#[route(tag = tag::CATEGORY)]
pub async fn get_categories(
	State(store): State<Store>,
) -> Result<Json<Vec<model::Category>>, RouteError> {
	Ok(Json(store.list_categories().await?))
}

/// Create category
/// Creates a new category. Only staff may do this.
#[route(tag = tag::CATEGORY, secure, response(status = 409, description = "The slug is already taken."))]
pub async fn create_category(
	State(store): State<Store>,
	session: Session,
	Json(input): Json<model::CreateCategory>,
) -> Result<Json<model::Category>, RouteError> {
	access::ensure_staff(&session.user).map_err(Error::Forbidden)?;

	let category = store.create_category(&input).await.map_err(slug_conflict)?;

	tracing::info!(category = %category.slug, "category created");

	Ok(Json(category))
}

/// Update category
/// Updates the given fields of a category. Only staff may do this.
#[route(tag = tag::CATEGORY, secure, response(status = 409, description = "The new slug is already taken."))]
pub async fn update_category(
	State(store): State<Store>,
	session: Session,
	Path(slug): Path<String>,
	Json(input): Json<model::UpdateCategory>,
) -> Result<Json<model::Category>, RouteError> {
	access::ensure_staff(&session.user).map_err(Error::Forbidden)?;

	let category = store
		.update_category(&slug, &input)
		.await
		.map_err(slug_conflict)?
		.ok_or(Error::UnknownCategory(slug))?;

	Ok(Json(category))
}

/// Delete category
/// Deletes a category. Its posts are kept but no longer filed under any category. Only staff may do this.
#[route(tag = tag::CATEGORY, secure)]
pub async fn delete_category(
	State(store): State<Store>,
	session: Session,
	Path(slug): Path<String>,
) -> Result<(), RouteError> {
	access::ensure_staff(&session.user).map_err(Error::Forbidden)?;

	if !store.delete_category(&slug).await? {
		return Err(Error::UnknownCategory(slug).into());
	}

	tracing::info!(category = %slug, "category deleted");

	Ok(())
}
