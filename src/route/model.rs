use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number of items on every page.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	///
	/// A missing or malformed value selects the first page, and values outside
	/// of the available range are clamped to the first or last page.
	pub page: Option<String>,
}

impl Paginate {
	pub fn new(page: i64) -> Self {
		Self {
			page: Some(page.to_string()),
		}
	}

	/// The requested page number, before clamping.
	pub fn requested(&self) -> i64 {
		self.page
			.as_deref()
			.and_then(|page| page.trim().parse().ok())
			.unwrap_or(1)
	}

	/// Resolves the requested page against a result set of `count` items.
	pub fn window(&self, count: i64) -> Window {
		let count = count.max(0);
		// an empty result set still has one (empty) page
		let pages = ((count + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
		let page = self.requested().clamp(1, pages);

		Window { page, pages, count }
	}
}

/// A resolved page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
	pub page: i64,
	pub pages: i64,
	pub count: i64,
}

impl Window {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * PAGE_SIZE
	}

	pub fn limit(&self) -> i64 {
		PAGE_SIZE
	}

	/// Wraps the items fetched for this window.
	pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
		Page {
			items,
			page: self.page,
			pages: self.pages,
			count: self.count,
			has_previous: self.page > 1,
			has_next: self.page < self.pages,
		}
	}
}

/// A single page of an ordered result set.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// The 1-indexed number of this page.
	pub page: i64,
	/// The total number of pages, at least 1.
	pub pages: i64,
	/// The total number of items across all pages.
	pub count: i64,
	pub has_previous: bool,
	pub has_next: bool,
}

#[cfg(test)]
mod test {
	use super::*;

	fn window(page: Option<&str>, count: i64) -> Window {
		Paginate {
			page: page.map(Into::into),
		}
		.window(count)
	}

	#[test]
	fn test_paginate_defaults_to_first_page() {
		assert_eq!(window(None, 25).page, 1);
		assert_eq!(window(Some(""), 25).page, 1);
		assert_eq!(window(Some("abc"), 25).page, 1);
		assert_eq!(window(Some("1.5"), 25).page, 1);
	}

	#[test]
	fn test_paginate_offset() {
		let mut paginate = Paginate::new(1);

		assert_eq!(paginate.window(25).offset(), 0);

		paginate = Paginate::new(2);

		assert_eq!(paginate.window(25).offset(), 10);

		paginate = Paginate::new(3);

		assert_eq!(paginate.window(25).offset(), 20);
		assert_eq!(paginate.window(25).limit(), 10);
	}

	#[test]
	fn test_paginate_clamps_out_of_range() {
		let last = window(Some("4"), 25);

		assert_eq!(last.page, 3);
		assert_eq!(last.pages, 3);

		assert_eq!(window(Some("0"), 25).page, 1);
		assert_eq!(window(Some("-7"), 25).page, 1);
		assert_eq!(window(Some("99999999999999999999"), 25).page, 1);
	}

	#[test]
	fn test_paginate_empty() {
		let window = window(Some("3"), 0);

		assert_eq!(window.page, 1);
		assert_eq!(window.pages, 1);

		let page = window.into_page(Vec::<()>::new());

		assert!(!page.has_previous);
		assert!(!page.has_next);
	}

	#[test]
	fn test_page_neighbours() {
		let page = window(Some("2"), 25).into_page(vec![0; 10]);

		assert!(page.has_previous);
		assert!(page.has_next);

		let page = window(Some("3"), 25).into_page(vec![0; 5]);

		assert!(page.has_previous);
		assert!(!page.has_next);
		assert_eq!(page.count, 25);
	}
}
