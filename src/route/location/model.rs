use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[inline]
fn published() -> bool {
	true
}

/// A geographic tag that posts can be attached to.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Location {
	/// The unique identifier of the location.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The name of the place.
	#[validate(length(min = 1, max = 256))]
	pub name: String,
	/// Unpublished locations cannot be attached to new posts.
	#[serde(default = "published")]
	pub is_published: bool,
	/// The creation time of the location.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}
