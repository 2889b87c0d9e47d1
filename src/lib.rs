//! Single-file JSON store for posts, users, and refresh tokens.
//!
//! The whole state is one JSON document. Every call re-reads the file, and
//! every mutating call rewrites it atomically (temp file + rename) inside one
//! exclusive critical section, so concurrent creates get distinct ids.
//!
//! ```rust,no_run
//! use chirp_store::ChirpStore;
//!
//! let store = ChirpStore::open("database.json").unwrap();
//! let user = store.create_user("a@example.com", "<hash>").unwrap();
//! let post = store.create_post("hello", user.id).unwrap();
//! assert_eq!(store.get_post(post.id).unwrap(), post);
//! ```
//!
//! **Single-process only.** Handles in one process share a lock per file;
//! separate processes opening the same file will clobber each other.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod lock;
pub mod persist;
pub mod serializer;
pub mod store;

pub use document::{Document, IdPolicy, Post, RefreshToken, User};
pub use error::{Error, Missing, Result};
pub use store::{ChirpStore, ChirpStoreBuilder, TOKEN_BYTES};
