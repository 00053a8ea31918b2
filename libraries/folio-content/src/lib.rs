//! Folio - Content Cache
//!
//! Bounded cache for fetched text content (page markdown, playlist
//! documents). The cache is an ordinary value owned by whoever needs it;
//! there is no process-wide instance.
//!
//! # Example
//!
//! ```rust
//! use folio_content::ContentCache;
//!
//! let cache = ContentCache::new(16);
//! let body = cache
//!     .get_or_try_insert_with("/posts/hello.md", || {
//!         Ok::<_, std::io::Error>("# Hello".to_string())
//!     })
//!     .unwrap();
//! assert_eq!(&*body, "# Hello");
//!
//! // Served from the cache from now on
//! assert!(cache.get("/posts/hello.md").is_some());
//! ```

mod cache;
mod error;

pub use cache::ContentCache;
pub use error::{ContentError, Result};
