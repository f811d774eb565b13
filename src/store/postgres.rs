use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};
use uuid::Uuid;

use super::{constraint, Error, Repository, Result};
use crate::{
	access::PostFilter,
	route::{
		auth::model::{NewUser, Session, User},
		category::model::{Category, CreateCategory, UpdateCategory},
		comment::model::{Author, Comment, CommentInput},
		location::model::{CreateLocation, Location, UpdateLocation},
		model::{Page, Paginate},
		post::model::{CategoryRef, LocationRef, Post, PostInput},
		profile::model::ProfileInput,
	},
};

/// Selects every column [`PostRow`] needs. Callers append the rest of the query.
macro_rules! select_post {
	() => {
		r#"
			SELECT
				p.id, p.title, p.text, p.pub_date, p.is_published, p.image,
				p.comment_count, p.created_at,
				p.author_id, u.username AS author_username,
				c.id AS category_id, c.slug AS category_slug,
				c.title AS category_title, c.is_published AS category_is_published,
				l.id AS location_id, l.name AS location_name,
				l.is_published AS location_is_published
			FROM post p
			JOIN "user" u ON u.id = p.author_id
			LEFT JOIN category c ON c.id = p.category_id
			LEFT JOIN location l ON l.id = p.location_id
		"#
	};
}

/// Mirrors [`PostFilter::matches`]: `$1` category, `$2` author, `$3` viewer, `$4` now.
macro_rules! filter_posts {
	() => {
		r#"
			WHERE ($1::BIGINT IS NULL OR p.category_id = $1)
				AND ($2::UUID IS NULL OR p.author_id = $2)
				AND (
					($3::UUID IS NOT NULL AND p.author_id = $3)
					OR (
						p.is_published
						AND COALESCE(c.is_published, FALSE)
						AND p.pub_date < $4
					)
				)
		"#
	};
}

macro_rules! select_comment {
	() => {
		r#"
			SELECT c.id, c.post_id, c.text, c.created_at, c.author_id, u.username AS author_username
			FROM comment c
			JOIN "user" u ON u.id = c.author_id
		"#
	};
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: i64,
	title: String,
	text: String,
	pub_date: DateTime<Utc>,
	is_published: bool,
	image: Option<String>,
	comment_count: i64,
	created_at: DateTime<Utc>,
	author_id: Uuid,
	author_username: String,
	category_id: Option<i64>,
	category_slug: Option<String>,
	category_title: Option<String>,
	category_is_published: Option<bool>,
	location_id: Option<i64>,
	location_name: Option<String>,
	location_is_published: Option<bool>,
}

impl From<PostRow> for Post {
	fn from(row: PostRow) -> Self {
		let category = match (row.category_id, row.category_slug, row.category_title) {
			(Some(id), Some(slug), Some(title)) => Some(CategoryRef {
				id,
				slug,
				title,
				is_published: row.category_is_published.unwrap_or(false),
			}),
			_ => None,
		};

		let location = match (row.location_id, row.location_name) {
			(Some(id), Some(name)) => Some(LocationRef {
				id,
				name,
				is_published: row.location_is_published.unwrap_or(false),
			}),
			_ => None,
		};

		Self {
			id: row.id,
			title: row.title,
			text: row.text,
			pub_date: row.pub_date,
			author: Author {
				id: row.author_id,
				username: row.author_username,
			},
			category,
			location,
			is_published: row.is_published,
			image: row.image,
			comment_count: row.comment_count,
			created_at: row.created_at,
		}
	}
}

#[derive(sqlx::FromRow)]
struct CommentRow {
	id: i64,
	post_id: i64,
	text: String,
	created_at: DateTime<Utc>,
	author_id: Uuid,
	author_username: String,
}

impl From<CommentRow> for Comment {
	fn from(row: CommentRow) -> Self {
		Self {
			id: row.id,
			post_id: row.post_id,
			text: row.text,
			author: Author {
				id: row.author_id,
				username: row.author_username,
			},
			created_at: row.created_at,
		}
	}
}

/// Maps unique violations on known constraints to [`Error::Conflict`].
fn conflict(error: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref database) = error {
		if database.is_unique_violation() {
			let known = [
				constraint::USER_EMAIL,
				constraint::USER_USERNAME,
				constraint::CATEGORY_SLUG,
			];

			if let Some(name) = known
				.into_iter()
				.find(|name| database.constraint() == Some(*name))
			{
				return Error::Conflict(name);
			}
		}
	}

	Error::Database(error)
}

/// Sets `comment_count` from a live count of the post's comments.
async fn refresh_comment_count(conn: &mut PgConnection, post_id: i64) -> Result<()> {
	sqlx::query(
		r#"
			UPDATE post
			SET comment_count = (SELECT COUNT(*) FROM comment WHERE post_id = $1)
			WHERE id = $1
		"#,
	)
	.bind(post_id)
	.execute(conn)
	.await?;

	Ok(())
}

/// Locks the post row so concurrent comment writes on it are serialized.
async fn lock_post(conn: &mut PgConnection, post_id: i64) -> Result<bool> {
	let id = sqlx::query_scalar::<_, i64>("SELECT id FROM post WHERE id = $1 FOR UPDATE")
		.bind(post_id)
		.fetch_optional(conn)
		.await?;

	Ok(id.is_some())
}

pub struct PgStore {
	pool: PgPool,
}

impl From<PgPool> for PgStore {
	fn from(pool: PgPool) -> Self {
		Self { pool }
	}
}

impl PgStore {
	pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await?;

		Ok(pool.into())
	}

	pub async fn migrate(&self) -> Result<()> {
		sqlx::migrate!().run(&self.pool).await?;

		tracing::info!("database migrations applied");

		Ok(())
	}
}

#[axum::async_trait]
impl Repository for PgStore {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, username, password, is_staff)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.password)
		.bind(user.is_staff)
		.fetch_one(&self.pool)
		.await
		.map_err(conflict)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
				.bind(username)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn find_user_by_session(&self, session_id: Uuid) -> Result<Option<User>> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn update_profile(&self, user_id: Uuid, input: &ProfileInput) -> Result<User> {
		sqlx::query_as::<_, User>(
			r#"
				UPDATE "user"
				SET first_name = $1, last_name = $2, email = $3
				WHERE id = $4
				RETURNING *
			"#,
		)
		.bind(&input.first_name)
		.bind(&input.last_name)
		.bind(&input.email)
		.bind(user_id)
		.fetch_one(&self.pool)
		.await
		.map_err(conflict)
	}

	async fn promote_staff(&self, email: &str) -> Result<bool> {
		let status = sqlx::query(r#"UPDATE "user" SET is_staff = TRUE WHERE LOWER(email) = LOWER($1)"#)
			.bind(email)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session> {
		Ok(sqlx::query_as::<_, Session>(
			"INSERT INTO session (user_id) VALUES ($1) RETURNING *",
		)
		.bind(user_id)
		.fetch_one(&self.pool)
		.await?)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn list_categories(&self) -> Result<Vec<Category>> {
		Ok(sqlx::query_as::<_, Category>(
			"SELECT * FROM category WHERE is_published ORDER BY title, id",
		)
		.fetch_all(&self.pool)
		.await?)
	}

	async fn find_category(&self, slug: &str) -> Result<Option<Category>> {
		Ok(
			sqlx::query_as::<_, Category>("SELECT * FROM category WHERE slug = $1")
				.bind(slug)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn find_category_by_id(&self, id: i64) -> Result<Option<Category>> {
		Ok(
			sqlx::query_as::<_, Category>("SELECT * FROM category WHERE id = $1")
				.bind(id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn create_category(&self, input: &CreateCategory) -> Result<Category> {
		sqlx::query_as::<_, Category>(
			r#"
				INSERT INTO category (title, description, slug, is_published)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.description)
		.bind(&input.slug)
		.bind(input.is_published)
		.fetch_one(&self.pool)
		.await
		.map_err(conflict)
	}

	async fn update_category(
		&self,
		slug: &str,
		input: &UpdateCategory,
	) -> Result<Option<Category>> {
		sqlx::query_as::<_, Category>(
			r#"
				UPDATE category
				SET
					title = COALESCE($1, title),
					description = COALESCE($2, description),
					slug = COALESCE($3, slug),
					is_published = COALESCE($4, is_published)
				WHERE slug = $5
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.description)
		.bind(&input.slug)
		.bind(input.is_published)
		.bind(slug)
		.fetch_optional(&self.pool)
		.await
		.map_err(conflict)
	}

	async fn delete_category(&self, slug: &str) -> Result<bool> {
		let status = sqlx::query("DELETE FROM category WHERE slug = $1")
			.bind(slug)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list_locations(&self) -> Result<Vec<Location>> {
		Ok(sqlx::query_as::<_, Location>(
			"SELECT * FROM location WHERE is_published ORDER BY name, id",
		)
		.fetch_all(&self.pool)
		.await?)
	}

	async fn find_location(&self, id: i64) -> Result<Option<Location>> {
		Ok(
			sqlx::query_as::<_, Location>("SELECT * FROM location WHERE id = $1")
				.bind(id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn create_location(&self, input: &CreateLocation) -> Result<Location> {
		Ok(sqlx::query_as::<_, Location>(
			"INSERT INTO location (name, is_published) VALUES ($1, $2) RETURNING *",
		)
		.bind(&input.name)
		.bind(input.is_published)
		.fetch_one(&self.pool)
		.await?)
	}

	async fn update_location(&self, id: i64, input: &UpdateLocation) -> Result<Option<Location>> {
		Ok(sqlx::query_as::<_, Location>(
			r#"
				UPDATE location
				SET name = COALESCE($1, name), is_published = COALESCE($2, is_published)
				WHERE id = $3
				RETURNING *
			"#,
		)
		.bind(&input.name)
		.bind(input.is_published)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn delete_location(&self, id: i64) -> Result<bool> {
		let status = sqlx::query("DELETE FROM location WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn page_posts(&self, filter: &PostFilter, paginate: &Paginate) -> Result<Page<Post>> {
		let count = sqlx::query_scalar::<_, i64>(concat!(
			r#"
				SELECT COUNT(*) FROM post p
				LEFT JOIN category c ON c.id = p.category_id
			"#,
			filter_posts!()
		))
		.bind(filter.category_id())
		.bind(filter.author_id())
		.bind(filter.viewer.id())
		.bind(filter.now)
		.fetch_one(&self.pool)
		.await?;

		let window = paginate.window(count);

		let posts = sqlx::query_as::<_, PostRow>(concat!(
			select_post!(),
			filter_posts!(),
			r#"
				ORDER BY p.pub_date DESC, p.id DESC
				LIMIT $5 OFFSET $6
			"#
		))
		.bind(filter.category_id())
		.bind(filter.author_id())
		.bind(filter.viewer.id())
		.bind(filter.now)
		.bind(window.limit())
		.bind(window.offset())
		.fetch_all(&self.pool)
		.await?;

		Ok(window.into_page(posts.into_iter().map(Post::from).collect()))
	}

	async fn find_post(&self, id: i64) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, PostRow>(concat!(select_post!(), "WHERE p.id = $1"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post.map(Post::from))
	}

	async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post> {
		let id = sqlx::query_scalar::<_, i64>(
			r#"
				INSERT INTO post (
					title, text, pub_date, author_id, category_id, location_id, is_published, image
				)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
				RETURNING id
			"#,
		)
		.bind(&input.title)
		.bind(&input.text)
		.bind(input.pub_date)
		.bind(author_id)
		.bind(input.category)
		.bind(input.location)
		.bind(input.is_published)
		.bind(&input.image)
		.fetch_one(&self.pool)
		.await?;

		self.find_post(id).await?.ok_or(Error::Vanished("post"))
	}

	async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>> {
		let status = sqlx::query(
			r#"
				UPDATE post
				SET
					title = $1, text = $2, pub_date = $3, category_id = $4,
					location_id = $5, is_published = $6, image = $7
				WHERE id = $8
			"#,
		)
		.bind(&input.title)
		.bind(&input.text)
		.bind(input.pub_date)
		.bind(input.category)
		.bind(input.location)
		.bind(input.is_published)
		.bind(&input.image)
		.bind(id)
		.execute(&self.pool)
		.await?;

		if status.rows_affected() == 0 {
			return Ok(None);
		}

		self.find_post(id).await
	}

	async fn delete_post(&self, id: i64) -> Result<bool> {
		let status = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
		let comments = sqlx::query_as::<_, CommentRow>(concat!(
			select_comment!(),
			"WHERE c.post_id = $1 ORDER BY c.created_at, c.id"
		))
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(comments.into_iter().map(Comment::from).collect())
	}

	async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
		let comment = sqlx::query_as::<_, CommentRow>(concat!(
			select_comment!(),
			"WHERE c.post_id = $1 AND c.id = $2"
		))
		.bind(post_id)
		.bind(comment_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(comment.map(Comment::from))
	}

	async fn create_comment(
		&self,
		post_id: i64,
		author_id: Uuid,
		input: &CommentInput,
	) -> Result<Option<Comment>> {
		let mut tx = self.pool.begin().await?;

		if !lock_post(&mut tx, post_id).await? {
			return Ok(None);
		}

		let id = sqlx::query_scalar::<_, i64>(
			"INSERT INTO comment (text, author_id, post_id) VALUES ($1, $2, $3) RETURNING id",
		)
		.bind(&input.text)
		.bind(author_id)
		.bind(post_id)
		.fetch_one(&mut *tx)
		.await?;

		refresh_comment_count(&mut tx, post_id).await?;

		tx.commit().await?;

		self.find_comment(post_id, id)
			.await?
			.ok_or(Error::Vanished("comment"))
			.map(Some)
	}

	async fn update_comment(
		&self,
		post_id: i64,
		comment_id: i64,
		input: &CommentInput,
	) -> Result<Option<Comment>> {
		let status = sqlx::query("UPDATE comment SET text = $1 WHERE post_id = $2 AND id = $3")
			.bind(&input.text)
			.bind(post_id)
			.bind(comment_id)
			.execute(&self.pool)
			.await?;

		if status.rows_affected() == 0 {
			return Ok(None);
		}

		self.find_comment(post_id, comment_id).await
	}

	async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<bool> {
		let mut tx = self.pool.begin().await?;

		if !lock_post(&mut tx, post_id).await? {
			return Ok(false);
		}

		let status = sqlx::query("DELETE FROM comment WHERE post_id = $1 AND id = $2")
			.bind(post_id)
			.bind(comment_id)
			.execute(&mut *tx)
			.await?;

		if status.rows_affected() == 0 {
			return Ok(false);
		}

		refresh_comment_count(&mut tx, post_id).await?;

		tx.commit().await?;

		Ok(true)
	}

	async fn reconcile_comment_counts(&self) -> Result<u64> {
		let status = sqlx::query(
			r#"
				UPDATE post p
				SET comment_count = live.count
				FROM (
					SELECT post.id, COUNT(comment.id) AS count
					FROM post
					LEFT JOIN comment ON comment.post_id = post.id
					GROUP BY post.id
				) live
				WHERE p.id = live.id AND p.comment_count <> live.count
			"#,
		)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected())
	}
}
