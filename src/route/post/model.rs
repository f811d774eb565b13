pub use crate::route::model::{Page, Paginate};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::comment::model::Comment;

#[inline]
fn published() -> bool {
	true
}

/// The public identity of a post or comment author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Author {
	pub id: Uuid,
	pub username: String,
}

/// The category a post is filed under.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CategoryRef {
	pub id: i64,
	pub slug: String,
	pub title: String,
	pub is_published: bool,
}

/// The location a post is attached to.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LocationRef {
	pub id: i64,
	pub name: String,
	pub is_published: bool,
}

/// A single post, created by a user.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: i64,
	/// The title of the post.
	pub title: String,
	/// The content of the post.
	pub text: String,
	/// The post is hidden from everyone but its author until this time.
	pub pub_date: DateTime<Utc>,
	/// The user that created the post.
	pub author: Author,
	pub category: Option<CategoryRef>,
	pub location: Option<LocationRef>,
	pub is_published: bool,
	/// An optional image URL.
	pub image: Option<String>,
	/// The number of comments on the post.
	pub comment_count: i64,
	/// The creation time of the post.
	pub created_at: DateTime<Utc>,
}

/// A post with its comments, oldest comment first.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	#[serde(flatten)]
	pub post: Post,
	pub comments: Vec<Comment>,
}

/// The writable fields of a post, used both to create and to edit one.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct PostInput {
	#[validate(length(min = 1, max = 256))]
	pub title: String,
	#[validate(length(min = 1))]
	pub text: String,
	/// Setting this in the future schedules the post.
	pub pub_date: DateTime<Utc>,
	#[serde(default = "published")]
	pub is_published: bool,
	/// The id of a published category.
	#[serde(default)]
	pub category: Option<i64>,
	/// The id of a published location.
	#[serde(default)]
	pub location: Option<i64>,
	#[serde(default)]
	#[validate(length(min = 1, max = 512))]
	pub image: Option<String>,
}
