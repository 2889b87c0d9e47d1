use chirp_store::{ChirpStore, IdPolicy};

fn main() -> Result<(), chirp_store::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("chirp_store_example_builder.json");
    let _ = std::fs::remove_file(&path);

    // pretty-printed JSON, ids that never land on a live record
    let store = ChirpStore::builder(&path)
        .pretty(true)
        .id_policy(IdPolicy::MaxPlusOne)
        .build()?;

    store.create_post("one", 1)?;
    store.create_post("two", 1)?;
    store.delete_post(1)?;
    let three = store.create_post("three", 1)?;
    println!("new id after delete: {}", three.id);

    // the file on disk is now nicely indented
    let contents = std::fs::read_to_string(store.path())?;
    println!("On-disk JSON:\n{contents}");

    println!("\nDebug output: {store:?}");

    let _ = std::fs::remove_file(&path);
    Ok(())
}
