//! The persisted document and its record types.
//!
//! Field names here are the on-disk contract and must not change:
//!
//! ```text
//! {
//!   "chirps":         { "<id>":    {"id", "body", "author_id"} },
//!   "users":          { "<id>":    {"id", "email", "password", "is_chirpy_red"} },
//!   "refresh_tokens": { "<token>": {"token", "expiration", "id"} }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A short text post. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Positive id, unique within `posts`.
    pub id: u32,
    /// Post text. The store does no trimming or length checks.
    pub body: String,
    /// Id of the authoring user.
    pub author_id: u32,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Positive id, unique within `users`.
    pub id: u32,
    /// Login email.
    pub email: String,
    /// Credential hash, produced and verified by the caller.
    #[serde(rename = "password")]
    pub password_hash: String,
    /// Premium flag, flipped by an external event.
    #[serde(rename = "is_chirpy_red", default)]
    pub is_upgraded: bool,
}

/// A long-lived opaque credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// 64 lowercase hex characters (32 random bytes).
    pub token: String,
    /// Absolute expiry instant.
    #[serde(rename = "expiration")]
    pub expires_at: DateTime<Utc>,
    /// Id of the user the token was issued to.
    #[serde(rename = "id")]
    pub owner_user_id: u32,
}

impl RefreshToken {
    /// A token is expired once `now` reaches `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Everything the store persists, loaded and saved as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Posts keyed by id.
    #[serde(rename = "chirps", default, deserialize_with = "null_as_empty")]
    pub posts: BTreeMap<u32, Post>,
    /// Users keyed by id.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: BTreeMap<u32, User>,
    /// Refresh tokens keyed by the token string.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub refresh_tokens: BTreeMap<String, RefreshToken>,
}

impl Document {
    /// `true` when all three collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.users.is_empty() && self.refresh_tokens.is_empty()
    }
}

// Older writers emit `null` for collections that were never populated.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// How new post and user ids are chosen.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// `len(collection) + 1`. Matches existing data files, but after a
    /// deletion the next id can land on a live record; creation then fails
    /// with [`AlreadyExists`](crate::Error::AlreadyExists).
    #[default]
    CollectionSize,
    /// Highest existing id + 1. Never collides with a live record, though
    /// deleting the newest record lets its id be handed out again.
    MaxPlusOne,
}

impl IdPolicy {
    /// Id the next record in `collection` would get, or `None` once the id
    /// space is exhausted.
    #[must_use]
    pub fn next_id<V>(self, collection: &BTreeMap<u32, V>) -> Option<u32> {
        match self {
            IdPolicy::CollectionSize => u32::try_from(collection.len()).ok()?.checked_add(1),
            IdPolicy::MaxPlusOne => match collection.keys().next_back() {
                Some(max) => max.checked_add(1),
                None => Some(1),
            },
        }
    }
}
