use chirp_store::ChirpStore;
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), chirp_store::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let path = std::env::temp_dir().join("chirp_store_example_basic.json");
    let _ = std::fs::remove_file(&path);
    let store = ChirpStore::open(&path)?;

    // users
    let alice = store.create_user("alice@example.com", "<hash-1>")?;
    let bob = store.create_user("bob@example.com", "<hash-2>")?;
    println!("created {alice:?}");
    println!("created {bob:?}");
    let alice = store.set_upgraded(alice.id, true)?;
    println!("upgraded {alice:?}");

    // posts, newest first
    store.create_post("first post", alice.id)?;
    store.create_post("hello from bob", bob.id)?;
    store.create_post("second post", alice.id)?;
    let mut posts = store.list_posts()?;
    posts.sort_by(|a, b| b.id.cmp(&a.id));
    for p in &posts {
        println!("#{} by {}: {}", p.id, p.author_id, p.body);
    }
    store.delete_post(1)?;
    println!("after delete: {} posts", store.list_posts()?.len());

    // refresh tokens
    let rt = store.create_refresh_token(alice.id, Utc::now() + Duration::days(60))?;
    println!("issued token {}..", &rt.token[..8]);
    println!("check: {:?}", store.check_refresh_token(&rt.token).map(|t| t.owner_user_id));
    store.revoke_token(&rt.token)?;
    println!("after revoke: {:?}", store.check_refresh_token(&rt.token).err());

    let _ = std::fs::remove_file(&path);
    Ok(())
}
