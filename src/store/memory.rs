//! In-memory store, used for local development and tests.
//!
//! Every table lives behind one [`RwLock`], so each write is atomic with respect
//! to every other request. Data is lost on process restart.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
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

/// URL scheme selecting this store.
pub const SCHEME: &str = "memory:";

struct PostRow {
	id: i64,
	title: String,
	text: String,
	pub_date: DateTime<Utc>,
	author_id: Uuid,
	category_id: Option<i64>,
	location_id: Option<i64>,
	is_published: bool,
	image: Option<String>,
	comment_count: i64,
	created_at: DateTime<Utc>,
}

struct CommentRow {
	id: i64,
	post_id: i64,
	author_id: Uuid,
	text: String,
	created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	categories: BTreeMap<i64, Category>,
	locations: BTreeMap<i64, Location>,
	posts: BTreeMap<i64, PostRow>,
	comments: BTreeMap<i64, CommentRow>,
	/// Shared sequence for every `BIGSERIAL`-like id.
	sequence: i64,
}

impl Tables {
	fn next_id(&mut self) -> i64 {
		self.sequence += 1;
		self.sequence
	}

	fn author(&self, id: Uuid) -> Author {
		Author {
			id,
			username: self
				.users
				.get(&id)
				.map(|user| user.username.clone())
				.unwrap_or_default(),
		}
	}

	fn post(&self, row: &PostRow) -> Post {
		Post {
			id: row.id,
			title: row.title.clone(),
			text: row.text.clone(),
			pub_date: row.pub_date,
			author: self.author(row.author_id),
			category: row
				.category_id
				.and_then(|id| self.categories.get(&id))
				.map(|category| CategoryRef {
					id: category.id,
					slug: category.slug.clone(),
					title: category.title.clone(),
					is_published: category.is_published,
				}),
			location: row
				.location_id
				.and_then(|id| self.locations.get(&id))
				.map(|location| LocationRef {
					id: location.id,
					name: location.name.clone(),
					is_published: location.is_published,
				}),
			is_published: row.is_published,
			image: row.image.clone(),
			comment_count: row.comment_count,
			created_at: row.created_at,
		}
	}

	fn comment(&self, row: &CommentRow) -> Comment {
		Comment {
			id: row.id,
			post_id: row.post_id,
			text: row.text.clone(),
			author: self.author(row.author_id),
			created_at: row.created_at,
		}
	}

	fn find_comment(&self, post_id: i64, comment_id: i64) -> Option<&CommentRow> {
		self.comments
			.get(&comment_id)
			.filter(|comment| comment.post_id == post_id)
	}

	fn refresh_comment_count(&mut self, post_id: i64) {
		let count = self
			.comments
			.values()
			.filter(|comment| comment.post_id == post_id)
			.count();

		if let Some(post) = self.posts.get_mut(&post_id) {
			post.comment_count = i64::try_from(count).unwrap_or(i64::MAX);
		}
	}

	fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
		self.users
			.values()
			.any(|user| user.username == username && Some(user.id) != except)
	}

	fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
		self.users
			.values()
			.any(|user| user.email == email && Some(user.id) != except)
	}
}

#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[axum::async_trait]
impl Repository for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		let mut tables = self.tables.write().await;

		if tables.email_taken(&user.email, None) {
			return Err(Error::Conflict(constraint::USER_EMAIL));
		}

		if tables.username_taken(&user.username, None) {
			return Err(Error::Conflict(constraint::USER_USERNAME));
		}

		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			username: user.username,
			first_name: String::new(),
			last_name: String::new(),
			is_staff: user.is_staff,
			created_at: Utc::now(),
		};

		tables.users.insert(user.id, user.clone());

		Ok(user)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables.users.values().find(|user| user.email == email).cloned())
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn find_user_by_session(&self, session_id: Uuid) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|session| tables.users.get(&session.user_id))
			.cloned())
	}

	async fn update_profile(&self, user_id: Uuid, input: &ProfileInput) -> Result<User> {
		let mut tables = self.tables.write().await;

		if tables.email_taken(&input.email, Some(user_id)) {
			return Err(Error::Conflict(constraint::USER_EMAIL));
		}

		let user = tables
			.users
			.get_mut(&user_id)
			.ok_or(Error::Vanished("user"))?;

		user.first_name.clone_from(&input.first_name);
		user.last_name.clone_from(&input.last_name);
		user.email.clone_from(&input.email);

		Ok(user.clone())
	}

	async fn promote_staff(&self, email: &str) -> Result<bool> {
		let mut tables = self.tables.write().await;

		let Some(user) = tables
			.users
			.values_mut()
			.find(|user| user.email.eq_ignore_ascii_case(email))
		else {
			return Ok(false);
		};

		user.is_staff = true;

		Ok(true)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session> {
		let mut tables = self.tables.write().await;
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		tables.sessions.insert(session.id, session.clone());

		Ok(session)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		self.tables.write().await.sessions.remove(&session_id);

		Ok(())
	}

	async fn list_categories(&self) -> Result<Vec<Category>> {
		let tables = self.tables.read().await;
		let mut categories = tables
			.categories
			.values()
			.filter(|category| category.is_published)
			.cloned()
			.collect::<Vec<_>>();

		categories.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

		Ok(categories)
	}

	async fn find_category(&self, slug: &str) -> Result<Option<Category>> {
		let tables = self.tables.read().await;

		Ok(tables
			.categories
			.values()
			.find(|category| category.slug == slug)
			.cloned())
	}

	async fn find_category_by_id(&self, id: i64) -> Result<Option<Category>> {
		Ok(self.tables.read().await.categories.get(&id).cloned())
	}

	async fn create_category(&self, input: &CreateCategory) -> Result<Category> {
		let mut tables = self.tables.write().await;

		if tables
			.categories
			.values()
			.any(|category| category.slug == input.slug)
		{
			return Err(Error::Conflict(constraint::CATEGORY_SLUG));
		}

		let category = Category {
			id: tables.next_id(),
			title: input.title.clone(),
			description: input.description.clone(),
			slug: input.slug.clone(),
			is_published: input.is_published,
			created_at: Utc::now(),
		};

		tables.categories.insert(category.id, category.clone());

		Ok(category)
	}

	async fn update_category(
		&self,
		slug: &str,
		input: &UpdateCategory,
	) -> Result<Option<Category>> {
		let mut tables = self.tables.write().await;

		let Some(id) = tables
			.categories
			.values()
			.find(|category| category.slug == slug)
			.map(|category| category.id)
		else {
			return Ok(None);
		};

		if let Some(new_slug) = &input.slug {
			if tables
				.categories
				.values()
				.any(|category| &category.slug == new_slug && category.id != id)
			{
				return Err(Error::Conflict(constraint::CATEGORY_SLUG));
			}
		}

		let Some(category) = tables.categories.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(title) = &input.title {
			category.title.clone_from(title);
		}
		if let Some(description) = &input.description {
			category.description.clone_from(description);
		}
		if let Some(slug) = &input.slug {
			category.slug.clone_from(slug);
		}
		if let Some(is_published) = input.is_published {
			category.is_published = is_published;
		}

		Ok(Some(category.clone()))
	}

	async fn delete_category(&self, slug: &str) -> Result<bool> {
		let mut tables = self.tables.write().await;

		let Some(id) = tables
			.categories
			.values()
			.find(|category| category.slug == slug)
			.map(|category| category.id)
		else {
			return Ok(false);
		};

		tables.categories.remove(&id);

		for post in tables.posts.values_mut() {
			if post.category_id == Some(id) {
				post.category_id = None;
			}
		}

		Ok(true)
	}

	async fn list_locations(&self) -> Result<Vec<Location>> {
		let tables = self.tables.read().await;
		let mut locations = tables
			.locations
			.values()
			.filter(|location| location.is_published)
			.cloned()
			.collect::<Vec<_>>();

		locations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

		Ok(locations)
	}

	async fn find_location(&self, id: i64) -> Result<Option<Location>> {
		Ok(self.tables.read().await.locations.get(&id).cloned())
	}

	async fn create_location(&self, input: &CreateLocation) -> Result<Location> {
		let mut tables = self.tables.write().await;
		let location = Location {
			id: tables.next_id(),
			name: input.name.clone(),
			is_published: input.is_published,
			created_at: Utc::now(),
		};

		tables.locations.insert(location.id, location.clone());

		Ok(location)
	}

	async fn update_location(&self, id: i64, input: &UpdateLocation) -> Result<Option<Location>> {
		let mut tables = self.tables.write().await;

		let Some(location) = tables.locations.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(name) = &input.name {
			location.name.clone_from(name);
		}
		if let Some(is_published) = input.is_published {
			location.is_published = is_published;
		}

		Ok(Some(location.clone()))
	}

	async fn delete_location(&self, id: i64) -> Result<bool> {
		let mut tables = self.tables.write().await;

		if tables.locations.remove(&id).is_none() {
			return Ok(false);
		}

		for post in tables.posts.values_mut() {
			if post.location_id == Some(id) {
				post.location_id = None;
			}
		}

		Ok(true)
	}

	async fn page_posts(&self, filter: &PostFilter, paginate: &Paginate) -> Result<Page<Post>> {
		let tables = self.tables.read().await;

		let mut posts = tables
			.posts
			.values()
			.map(|row| tables.post(row))
			.filter(|post| filter.matches(post))
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

		let window = paginate.window(i64::try_from(posts.len()).unwrap_or(i64::MAX));
		let items = posts
			.into_iter()
			.skip(usize::try_from(window.offset()).unwrap_or(0))
			.take(usize::try_from(window.limit()).unwrap_or(0))
			.collect();

		Ok(window.into_page(items))
	}

	async fn find_post(&self, id: i64) -> Result<Option<Post>> {
		let tables = self.tables.read().await;

		Ok(tables.posts.get(&id).map(|row| tables.post(row)))
	}

	async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post> {
		let mut tables = self.tables.write().await;
		let row = PostRow {
			id: tables.next_id(),
			title: input.title.clone(),
			text: input.text.clone(),
			pub_date: input.pub_date,
			author_id,
			category_id: input.category,
			location_id: input.location,
			is_published: input.is_published,
			image: input.image.clone(),
			comment_count: 0,
			created_at: Utc::now(),
		};

		let post = tables.post(&row);
		tables.posts.insert(row.id, row);

		Ok(post)
	}

	async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>> {
		let mut tables = self.tables.write().await;

		let Some(row) = tables.posts.get_mut(&id) else {
			return Ok(None);
		};

		row.title.clone_from(&input.title);
		row.text.clone_from(&input.text);
		row.pub_date = input.pub_date;
		row.category_id = input.category;
		row.location_id = input.location;
		row.is_published = input.is_published;
		row.image.clone_from(&input.image);

		Ok(tables.posts.get(&id).map(|row| tables.post(row)))
	}

	async fn delete_post(&self, id: i64) -> Result<bool> {
		let mut tables = self.tables.write().await;

		if tables.posts.remove(&id).is_none() {
			return Ok(false);
		}

		tables.comments.retain(|_, comment| comment.post_id != id);

		Ok(true)
	}

	async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
		let tables = self.tables.read().await;
		let mut comments = tables
			.comments
			.values()
			.filter(|comment| comment.post_id == post_id)
			.map(|comment| tables.comment(comment))
			.collect::<Vec<_>>();

		comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

		Ok(comments)
	}

	async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
		let tables = self.tables.read().await;

		Ok(tables
			.find_comment(post_id, comment_id)
			.map(|comment| tables.comment(comment)))
	}

	async fn create_comment(
		&self,
		post_id: i64,
		author_id: Uuid,
		input: &CommentInput,
	) -> Result<Option<Comment>> {
		let mut tables = self.tables.write().await;

		if !tables.posts.contains_key(&post_id) {
			return Ok(None);
		}

		let row = CommentRow {
			id: tables.next_id(),
			post_id,
			author_id,
			text: input.text.clone(),
			created_at: Utc::now(),
		};

		let comment = tables.comment(&row);

		tables.comments.insert(row.id, row);
		tables.refresh_comment_count(post_id);

		Ok(Some(comment))
	}

	async fn update_comment(
		&self,
		post_id: i64,
		comment_id: i64,
		input: &CommentInput,
	) -> Result<Option<Comment>> {
		let mut tables = self.tables.write().await;

		let Some(row) = tables
			.comments
			.get_mut(&comment_id)
			.filter(|comment| comment.post_id == post_id)
		else {
			return Ok(None);
		};

		row.text.clone_from(&input.text);

		Ok(tables
			.find_comment(post_id, comment_id)
			.map(|comment| tables.comment(comment)))
	}

	async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<bool> {
		let mut tables = self.tables.write().await;

		if tables.find_comment(post_id, comment_id).is_none() {
			return Ok(false);
		}

		tables.comments.remove(&comment_id);
		tables.refresh_comment_count(post_id);

		Ok(true)
	}

	async fn reconcile_comment_counts(&self) -> Result<u64> {
		let mut tables = self.tables.write().await;
		let ids = tables.posts.keys().copied().collect::<Vec<_>>();
		let mut fixed = 0;

		for id in ids {
			let before = tables.posts.get(&id).map(|post| post.comment_count);

			tables.refresh_comment_count(id);

			if tables.posts.get(&id).map(|post| post.comment_count) != before {
				fixed += 1;
			}
		}

		Ok(fixed)
	}
}
