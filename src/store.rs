//! Core store type and builder.

use crate::document::{Document, IdPolicy, Post, RefreshToken, User};
use crate::error::{Error, Missing, Result};
use crate::lock::{self, FileLock};
use crate::persist;
use crate::serializer::{JsonSerializer, Serializer};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Random bytes per refresh token, before hex encoding.
pub const TOKEN_BYTES: usize = 32;

/// Single-file store for posts, users and refresh tokens.
///
/// Holds nothing in memory between calls: every operation re-reads the
/// file, and every mutating operation writes the whole document back. Each
/// operation runs under one exclusive lock shared by all handles on the
/// same file in this process, so concurrent creates never hand out the same
/// id or drop each other's writes.
///
/// The byte encoding is `S`, JSON unless the builder was given another
/// [`Serializer`].
///
/// Cloning is cheap and the clone shares the lock.
#[derive(Clone)]
pub struct ChirpStore<S = JsonSerializer> {
    path: PathBuf,
    serializer: S,
    id_policy: IdPolicy,
    lock: FileLock,
}

impl ChirpStore {
    /// Open (or create) a store at `path` with compact JSON and legacy
    /// id numbering.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Start configuring a new store. Call [`.build()`](ChirpStoreBuilder::build)
    /// when ready.
    pub fn builder(path: impl AsRef<Path>) -> ChirpStoreBuilder {
        ChirpStoreBuilder::new(path)
    }
}

impl<S: Serializer> ChirpStore<S> {

    /// Path to the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id policy this handle creates records with.
    #[must_use]
    pub fn id_policy(&self) -> IdPolicy {
        self.id_policy
    }

    // ---- document ----

    /// Read and parse the whole file.
    pub fn load_document(&self) -> Result<Document> {
        let _guard = self.lock.lock();
        persist::load(&self.path, &self.serializer)
    }

    /// Replace the whole file with `doc`.
    pub fn save_document(&self, doc: &Document) -> Result<()> {
        let _guard = self.lock.lock();
        persist::save(&self.path, doc, &self.serializer)
    }

    // ---- posts ----

    /// Store a new post and return it. `body` is stored as given.
    pub fn create_post(&self, body: impl Into<String>, author_id: u32) -> Result<Post> {
        let body = body.into();
        let policy = self.id_policy;
        self.mutate(|doc| {
            let id = policy
                .next_id(&doc.posts)
                .ok_or(Error::IdsExhausted { kind: "post" })?;
            if doc.posts.contains_key(&id) {
                return Err(Error::AlreadyExists { kind: "post", id });
            }
            let post = Post {
                id,
                body,
                author_id,
            };
            doc.posts.insert(id, post.clone());
            Ok(post)
        })
    }

    /// All posts. Callers sort as they need to.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.load_document()?.posts.into_values().collect())
    }

    /// All posts written by `author_id`.
    pub fn list_posts_by_author(&self, author_id: u32) -> Result<Vec<Post>> {
        Ok(self
            .load_document()?
            .posts
            .into_values()
            .filter(|p| p.author_id == author_id)
            .collect())
    }

    /// Look up one post.
    pub fn get_post(&self, id: u32) -> Result<Post> {
        self.load_document()?
            .posts
            .remove(&id)
            .ok_or(Error::NotFound(Missing::Post(id)))
    }

    /// Remove a post. Remaining posts keep their ids.
    pub fn delete_post(&self, id: u32) -> Result<()> {
        self.mutate(|doc| {
            doc.posts
                .remove(&id)
                .map(drop)
                .ok_or(Error::NotFound(Missing::Post(id)))
        })
    }

    // ---- users ----

    /// Register a user. Fails with [`Error::AlreadyExists`] if the id the
    /// policy picks is already taken.
    pub fn create_user(
        &self,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<User> {
        let email = email.into();
        let password_hash = password_hash.into();
        let policy = self.id_policy;
        self.mutate(|doc| {
            let id = policy
                .next_id(&doc.users)
                .ok_or(Error::IdsExhausted { kind: "user" })?;
            if doc.users.contains_key(&id) {
                return Err(Error::AlreadyExists { kind: "user", id });
            }
            let user = User {
                id,
                email,
                password_hash,
                is_upgraded: false,
            };
            doc.users.insert(id, user.clone());
            Ok(user)
        })
    }

    /// All users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.load_document()?.users.into_values().collect())
    }

    /// Look up one user by id.
    pub fn get_user(&self, id: u32) -> Result<User> {
        self.load_document()?
            .users
            .remove(&id)
            .ok_or(Error::NotFound(Missing::User(id)))
    }

    /// Look up a user by exact email match. If several records share the
    /// address the lowest id wins.
    pub fn find_user_by_email(&self, email: &str) -> Result<User> {
        self.load_document()?
            .users
            .into_values()
            .find(|u| u.email == email)
            .ok_or(Error::NotFound(Missing::UserEmail))
    }

    /// Replace the mutable fields of user `id` and return the new record.
    pub fn update_user(
        &self,
        id: u32,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        is_upgraded: bool,
    ) -> Result<User> {
        let email = email.into();
        let password_hash = password_hash.into();
        self.mutate(|doc| {
            let user = doc
                .users
                .get_mut(&id)
                .ok_or(Error::NotFound(Missing::User(id)))?;
            user.email = email;
            user.password_hash = password_hash;
            user.is_upgraded = is_upgraded;
            Ok(user.clone())
        })
    }

    /// Set only the upgraded flag, leaving email and hash alone.
    pub fn set_upgraded(&self, id: u32, is_upgraded: bool) -> Result<User> {
        self.mutate(|doc| {
            let user = doc
                .users
                .get_mut(&id)
                .ok_or(Error::NotFound(Missing::User(id)))?;
            user.is_upgraded = is_upgraded;
            Ok(user.clone())
        })
    }

    // ---- refresh tokens ----

    /// Issue a fresh random token for `owner_user_id`.
    pub fn create_refresh_token(
        &self,
        owner_user_id: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        self.mutate(|doc| {
            let mut token = generate_token();
            while doc.refresh_tokens.contains_key(&token) {
                token = generate_token();
            }
            let record = RefreshToken {
                token: token.clone(),
                expires_at,
                owner_user_id,
            };
            doc.refresh_tokens.insert(token, record.clone());
            Ok(record)
        })
    }

    /// Validate `token` against the wall clock.
    pub fn check_refresh_token(&self, token: &str) -> Result<RefreshToken> {
        self.check_refresh_token_at(token, Utc::now())
    }

    /// Validate `token` as of `now`. Expired tokens stay in the store until
    /// revoked.
    pub fn check_refresh_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshToken> {
        let record = self
            .load_document()?
            .refresh_tokens
            .remove(token)
            .ok_or(Error::NotFound(Missing::RefreshToken))?;
        if record.is_expired_at(now) {
            return Err(Error::Expired);
        }
        Ok(record)
    }

    /// Delete `token`, expired or not.
    pub fn revoke_token(&self, token: &str) -> Result<()> {
        self.mutate(|doc| {
            doc.refresh_tokens
                .remove(token)
                .map(drop)
                .ok_or(Error::NotFound(Missing::RefreshToken))
        })
    }

    /// Delete every token owned by `owner_user_id`. Returns how many went.
    pub fn revoke_user_tokens(&self, owner_user_id: u32) -> Result<usize> {
        self.mutate(|doc| {
            let before = doc.refresh_tokens.len();
            doc.refresh_tokens
                .retain(|_, t| t.owner_user_id != owner_user_id);
            Ok(before - doc.refresh_tokens.len())
        })
    }

    // ---- internal ----

    /// Load, apply `f`, and save, all under the lock. Nothing is written
    /// when `f` fails.
    fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _guard = self.lock.lock();
        let mut doc = persist::load(&self.path, &self.serializer)?;
        let out = f(&mut doc)?;
        persist::save(&self.path, &doc, &self.serializer)?;
        Ok(out)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for ChirpStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChirpStore")
            .field("path", &self.path)
            .field("id_policy", &self.id_policy)
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}

fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`ChirpStore`].
///
/// ```rust,no_run
/// use chirp_store::{ChirpStore, IdPolicy};
///
/// let store = ChirpStore::builder("database.json")
///     .pretty(true)
///     .id_policy(IdPolicy::MaxPlusOne)
///     .build()
///     .unwrap();
/// ```
pub struct ChirpStoreBuilder<S = JsonSerializer> {
    path: PathBuf,
    serializer: S,
    id_policy: IdPolicy,
}

impl ChirpStoreBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            serializer: JsonSerializer::new(),
            id_policy: IdPolicy::default(),
        }
    }

    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.serializer = if yes {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };
        self
    }
}

impl<S: Serializer> ChirpStoreBuilder<S> {
    /// Encode the document with `serializer` instead of JSON. Files written
    /// this way are only readable by a store using the same encoding.
    pub fn serializer<T: Serializer>(self, serializer: T) -> ChirpStoreBuilder<T> {
        ChirpStoreBuilder {
            path: self.path,
            serializer,
            id_policy: self.id_policy,
        }
    }

    /// How new post and user ids are picked (default:
    /// [`IdPolicy::CollectionSize`]).
    pub fn id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    /// Create the backing file if needed and return a handle. The file is
    /// not parsed here.
    pub fn build(self) -> Result<ChirpStore<S>> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("store path is empty".into()));
        }

        persist::ensure_file(&self.path)?;
        let canonical = self
            .path
            .canonicalize()
            .map_err(|e| Error::Io(format!("{}: {e}", self.path.display())))?;

        tracing::debug!(
            path = %canonical.display(),
            id_policy = ?self.id_policy,
            "opened store"
        );

        Ok(ChirpStore {
            lock: lock::for_path(&canonical),
            path: self.path,
            serializer: self.serializer,
            id_policy: self.id_policy,
        })
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for ChirpStoreBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChirpStoreBuilder")
            .field("path", &self.path)
            .field("serializer", &self.serializer)
            .field("id_policy", &self.id_policy)
            .finish()
    }
}
