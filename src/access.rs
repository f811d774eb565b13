//! Visibility and ownership rules.
//!
//! Every function here takes the viewer explicitly. Nothing reads the current
//! user from the request.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::route::{auth::model::User, post::model::Post};

/// Who is looking at a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
	#[default]
	Anonymous,
	User(Uuid),
}

impl Viewer {
	pub fn id(self) -> Option<Uuid> {
		match self {
			Self::Anonymous => None,
			Self::User(id) => Some(id),
		}
	}

	/// Whether the viewer is the user `id`.
	pub fn is(self, id: Uuid) -> bool {
		self.id() == Some(id)
	}
}

impl From<&User> for Viewer {
	fn from(user: &User) -> Self {
		Self::User(user.id)
	}
}

/// Why a mutation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
	#[error("only the author can change this")]
	NotAuthor,
	#[error("only staff can change this")]
	NotStaff,
	#[error("only the owner can change this profile")]
	NotOwner,
}

/// Whether `post` can be seen by anyone at `now`.
///
/// A post without a category is never public.
pub fn is_public(post: &Post, now: DateTime<Utc>) -> bool {
	post.is_published
		&& post
			.category
			.as_ref()
			.is_some_and(|category| category.is_published)
		&& post.pub_date < now
}

/// Whether `viewer` can see `post` at `now`. Authors always see their own posts.
pub fn can_view(post: &Post, viewer: Viewer, now: DateTime<Utc>) -> bool {
	viewer.is(post.author.id) || is_public(post, now)
}

/// Fails unless `viewer` is the author `author_id`.
pub fn ensure_author(viewer: Viewer, author_id: Uuid) -> Result<(), Denied> {
	if viewer.is(author_id) {
		Ok(())
	} else {
		Err(Denied::NotAuthor)
	}
}

pub fn ensure_staff(user: &User) -> Result<(), Denied> {
	if user.is_staff {
		Ok(())
	} else {
		Err(Denied::NotStaff)
	}
}

/// Which posts a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	All,
	Category(i64),
	Author(Uuid),
}

/// A listing query: a scope, the viewer and the moment visibility is judged at.
///
/// The home and category feeds only ever show public posts. The author feed also
/// shows the viewer's own hidden posts when the viewer is that author.
#[derive(Debug, Clone, Copy)]
pub struct PostFilter {
	pub scope: Scope,
	pub viewer: Viewer,
	pub now: DateTime<Utc>,
}

impl PostFilter {
	pub fn home(now: DateTime<Utc>) -> Self {
		Self {
			scope: Scope::All,
			viewer: Viewer::Anonymous,
			now,
		}
	}

	pub fn category(category_id: i64, now: DateTime<Utc>) -> Self {
		Self {
			scope: Scope::Category(category_id),
			viewer: Viewer::Anonymous,
			now,
		}
	}

	pub fn author(author_id: Uuid, viewer: Viewer, now: DateTime<Utc>) -> Self {
		Self {
			scope: Scope::Author(author_id),
			viewer,
			now,
		}
	}

	pub fn category_id(&self) -> Option<i64> {
		match self.scope {
			Scope::Category(id) => Some(id),
			_ => None,
		}
	}

	pub fn author_id(&self) -> Option<Uuid> {
		match self.scope {
			Scope::Author(id) => Some(id),
			_ => None,
		}
	}

	pub fn matches(&self, post: &Post) -> bool {
		let in_scope = match self.scope {
			Scope::All => true,
			Scope::Category(id) => post.category.as_ref().is_some_and(|c| c.id == id),
			Scope::Author(id) => post.author.id == id,
		};

		in_scope && can_view(post, self.viewer, self.now)
	}
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use super::*;
	use crate::route::post::model::{Author, CategoryRef};

	fn post(author: Uuid, category_published: Option<bool>) -> Post {
		let now = Utc::now();

		Post {
			id: 1,
			title: "title".into(),
			text: "text".into(),
			pub_date: now - Duration::hours(1),
			author: Author {
				id: author,
				username: "author".into(),
			},
			category: category_published.map(|is_published| CategoryRef {
				id: 7,
				slug: "travel".into(),
				title: "Travel".into(),
				is_published,
			}),
			location: None,
			is_published: true,
			image: None,
			comment_count: 0,
			created_at: now,
		}
	}

	#[test]
	fn test_public_post() {
		let post = post(Uuid::new_v4(), Some(true));

		assert!(is_public(&post, Utc::now()));
		assert!(can_view(&post, Viewer::Anonymous, Utc::now()));
	}

	#[test]
	fn test_hidden_posts() {
		let author = Uuid::new_v4();
		let now = Utc::now();

		let mut unpublished = post(author, Some(true));
		unpublished.is_published = false;

		let mut scheduled = post(author, Some(true));
		scheduled.pub_date = now + Duration::days(1);

		let hidden_category = post(author, Some(false));
		let no_category = post(author, None);

		for post in [&unpublished, &scheduled, &hidden_category, &no_category] {
			assert!(!is_public(post, now));
			assert!(!can_view(post, Viewer::Anonymous, now));
			assert!(!can_view(post, Viewer::User(Uuid::new_v4()), now));
			assert!(can_view(post, Viewer::User(author), now));
		}
	}

	#[test]
	fn test_pub_date_is_exclusive() {
		let post = post(Uuid::new_v4(), Some(true));

		assert!(!is_public(&post, post.pub_date));
	}

	#[test]
	fn test_ensure_author() {
		let author = Uuid::new_v4();

		assert_eq!(ensure_author(Viewer::User(author), author), Ok(()));
		assert_eq!(
			ensure_author(Viewer::User(Uuid::new_v4()), author),
			Err(Denied::NotAuthor)
		);
		assert_eq!(
			ensure_author(Viewer::Anonymous, author),
			Err(Denied::NotAuthor)
		);
	}

	#[test]
	fn test_filter_scopes() {
		let author = Uuid::new_v4();
		let now = Utc::now();

		let mut hidden = post(author, Some(true));
		hidden.is_published = false;
		let public = post(author, Some(true));

		assert!(PostFilter::home(now).matches(&public));
		assert!(!PostFilter::home(now).matches(&hidden));
		assert!(PostFilter::category(7, now).matches(&public));
		assert!(!PostFilter::category(8, now).matches(&public));

		let own = PostFilter::author(author, Viewer::User(author), now);
		let other = PostFilter::author(author, Viewer::Anonymous, now);

		assert!(own.matches(&hidden));
		assert!(!other.matches(&hidden));
		assert!(other.matches(&public));
		assert!(!PostFilter::author(Uuid::new_v4(), Viewer::Anonymous, now).matches(&public));
	}
}
