use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::route::post::model::Author;

/// A comment left on a post.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Comment {
	/// The unique identifier of the comment.
	pub id: i64,
	/// The post the comment belongs to.
	pub post_id: i64,
	pub text: String,
	pub author: Author,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentInput {
	#[validate(length(min = 1, max = 4096))]
	pub text: String,
}

/// Identifies a comment under its post.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentPath {
	/// The post id.
	pub id: i64,
	pub comment_id: i64,
}
