pub use crate::route::model::{Page, Paginate};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::{auth::model::User, post::model::Post};

/// The public part of a user.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Profile {
	pub username: String,
	pub first_name: String,
	pub last_name: String,
	/// Only included when the profile belongs to the viewer.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Profile {
	/// Builds the profile of `user`, exposing the email only to its owner.
	pub fn of(user: User, own: bool) -> Self {
		Self {
			username: user.username,
			first_name: user.first_name,
			last_name: user.last_name,
			email: own.then_some(user.email),
			created_at: user.created_at,
		}
	}
}

/// A profile with a page of the posts the viewer may see.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ProfilePage {
	pub profile: Profile,
	pub posts: Page<Post>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ProfileInput {
	#[validate(length(max = 150))]
	pub first_name: String,
	#[validate(length(max = 150))]
	pub last_name: String,
	#[validate(email)]
	pub email: String,
}
