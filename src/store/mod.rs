//! Repository-style access to everything the service persists.
//!
//! Routes only talk to [`Repository`]. The PostgreSQL implementation is used in
//! production, the in-memory one for local development (`DATABASE_URL=memory://`)
//! and tests.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use uuid::Uuid;

use crate::{
	access::PostFilter,
	config::Config,
	route::{
		auth::model::{NewUser, Session, User},
		category::model::{Category, CreateCategory, UpdateCategory},
		comment::model::{Comment, CommentInput},
		location::model::{CreateLocation, Location, UpdateLocation},
		model::{Page, Paginate},
		post::model::{Post, PostInput},
		profile::model::ProfileInput,
	},
};

/// Names of the unique constraints a write can violate.
pub mod constraint {
	pub const USER_EMAIL: &str = "user_email_key";
	pub const USER_USERNAME: &str = "user_username_key";
	pub const CATEGORY_SLUG: &str = "category_slug_key";
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	/// A unique constraint was violated, see [`constraint`].
	#[error("unique constraint {0} violated")]
	Conflict(&'static str),
	/// A row that was just written could not be read back.
	#[error("{0} vanished during the request")]
	Vanished(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The shared store handle.
pub type Store = Arc<dyn Repository>;

#[axum::async_trait]
pub trait Repository: Send + Sync {
	async fn create_user(&self, user: NewUser) -> Result<User>;
	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
	async fn find_user_by_session(&self, session_id: Uuid) -> Result<Option<User>>;
	async fn update_profile(&self, user_id: Uuid, input: &ProfileInput) -> Result<User>;
	/// Grants staff to the user with this email. Returns `false` when there is no such user.
	async fn promote_staff(&self, email: &str) -> Result<bool>;

	async fn create_session(&self, user_id: Uuid) -> Result<Session>;
	async fn delete_session(&self, session_id: Uuid) -> Result<()>;

	/// Published categories, ordered by title.
	async fn list_categories(&self) -> Result<Vec<Category>>;
	async fn find_category(&self, slug: &str) -> Result<Option<Category>>;
	async fn find_category_by_id(&self, id: i64) -> Result<Option<Category>>;
	async fn create_category(&self, input: &CreateCategory) -> Result<Category>;
	async fn update_category(&self, slug: &str, input: &UpdateCategory)
		-> Result<Option<Category>>;
	/// Deletes a category, detaching its posts. Returns whether it existed.
	async fn delete_category(&self, slug: &str) -> Result<bool>;

	/// Published locations, ordered by name.
	async fn list_locations(&self) -> Result<Vec<Location>>;
	async fn find_location(&self, id: i64) -> Result<Option<Location>>;
	async fn create_location(&self, input: &CreateLocation) -> Result<Location>;
	async fn update_location(&self, id: i64, input: &UpdateLocation) -> Result<Option<Location>>;
	/// Deletes a location, detaching its posts. Returns whether it existed.
	async fn delete_location(&self, id: i64) -> Result<bool>;

	/// One page of the posts matching `filter`, newest `pub_date` first.
	async fn page_posts(&self, filter: &PostFilter, paginate: &Paginate) -> Result<Page<Post>>;
	/// Finds a post regardless of its visibility.
	async fn find_post(&self, id: i64) -> Result<Option<Post>>;
	async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post>;
	async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>>;
	/// Deletes a post with its comments. Returns whether it existed.
	async fn delete_post(&self, id: i64) -> Result<bool>;

	/// Comments on a post, oldest first.
	async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;
	async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>>;
	/// Adds a comment and refreshes the post's comment count in the same write.
	/// Returns `None` if the post does not exist.
	async fn create_comment(
		&self,
		post_id: i64,
		author_id: Uuid,
		input: &CommentInput,
	) -> Result<Option<Comment>>;
	async fn update_comment(
		&self,
		post_id: i64,
		comment_id: i64,
		input: &CommentInput,
	) -> Result<Option<Comment>>;
	/// Removes a comment and refreshes the post's comment count in the same write.
	async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<bool>;
	/// Recomputes every drifted comment count. Returns how many posts were fixed.
	async fn reconcile_comment_counts(&self) -> Result<u64>;
}

/// Opens the store configured by `DATABASE_URL`, running migrations when it is PostgreSQL.
pub async fn connect(config: &Config) -> Result<Store> {
	if config.database_url.starts_with(memory::SCHEME) {
		tracing::warn!("using the in-memory store, nothing will be persisted");

		return Ok(Arc::new(memory::MemoryStore::new()));
	}

	let store = postgres::PgStore::connect(&config.database_url, config.max_connections).await?;

	store.migrate().await?;

	Ok(Arc::new(store))
}
