pub use crate::route::model::{Page, Paginate};

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::route::post::model::Post;

#[inline]
fn published() -> bool {
	true
}

/// Slugs appear in URLs, so only latin letters, digits, hyphens and underscores are allowed.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
	if slug
		.chars()
		.any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
	{
		return Err(ValidationError::new("slug may only contain latin letters, digits, hyphens and underscores"));
	}

	Ok(())
}

/// A thematic category that posts can be filed under.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Category {
	/// The unique identifier of the category.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The title of the category.
	#[validate(length(min = 1, max = 256))]
	pub title: String,
	/// A longer description of the category.
	pub description: String,
	/// The unique, URL-safe identifier of the category.
	#[validate(length(min = 1, max = 64), custom(function = "validate_slug"))]
	pub slug: String,
	/// Unpublished categories hide all of their posts.
	#[serde(default = "published")]
	pub is_published: bool,
	/// The creation time of the category.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A category with a page of its visible posts.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CategoryPage {
	pub category: Category,
	pub posts: Page<Post>,
}
