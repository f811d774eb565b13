use aide::axum::ApiRouter;

use crate::AppState;

pub mod auth;
pub mod category;
pub mod comment;
pub mod docs;
pub mod location;
pub mod model;
pub mod post;
pub mod profile;

/// The blog itself: feeds, posts, comments, categories, locations and profiles.
pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.merge(post::routes())
		.merge(comment::routes())
		.merge(category::routes())
		.merge(location::routes())
		.merge(profile::routes())
}
