use axum::extract::{Path, State};
use macros::route;

use crate::{
	access,
	extract::{Json, Session},
	openapi::tag,
	store::Store,
};

use super::{model, Error, RouteError};

/// List locations
/// Returns every published location, ordered by name.
#[route(tag = tag::LOCATION)]
pub async fn get_locations(
	State(store): State<Store>,
) -> Result<Json<Vec<model::Location>>, RouteError> {
	Ok(Json(store.list_locations().await?))
}

/// Create location
/// Creates a new location. Only staff may do this.
#[route(tag = tag::LOCATION, secure)]
pub async fn create_location(
	State(store): State<Store>,
	session: Session,
	Json(input): Json<model::CreateLocation>,
) -> Result<Json<model::Location>, RouteError> {
	access::ensure_staff(&session.user).map_err(Error::Forbidden)?;

	let location = store.create_location(&input).await?;

	tracing::info!(location = location.id, "location created");

	Ok(Json(location))
}

/// Update location
/// Updates the given fields of a location. Only staff may do this.
#[route(tag = tag::LOCATION, secure)]
pub async fn update_location(
	State(store): State<Store>,
	session: Session,
	Path(location_id): Path<i64>,
	Json(input): Json<model::UpdateLocation>,
) -> Result<Json<model::Location>, RouteError> {
	access::ensure_staff(&session.user).map_err(Error::Forbidden)?;

	let location = store
		.update_location(location_id, &input)
		.await?
		.ok_or(Error::UnknownLocation(location_id))?;

	Ok(Json(location))
}

/// Delete location
/// Deletes a location. Its posts are kept but no longer attached to any location. Only staff may do this.
#[route(tag = tag::LOCATION, secure)]
pub async fn delete_location(
	State(store): State<Store>,
	session: Session,
	Path(location_id): Path<i64>,
) -> Result<(), RouteError> {
	access::ensure_staff(&session.user).map_err(Error::Forbidden)?;

	if !store.delete_location(location_id).await? {
		return Err(Error::UnknownLocation(location_id).into());
	}

	tracing::info!(location = location_id, "location deleted");

	Ok(())
}
