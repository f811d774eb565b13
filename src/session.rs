use cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Where unauthenticated clients are sent to obtain a session.
pub const LOGIN_URL: &str = "/auth/login";

/// Creates a session cookie with no expiry.
///
/// Debug builds drop the `Secure` flag so the cookie works over plain HTTP locally.
pub fn create_cookie(session_id: Uuid) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one.
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}
