use chirp_store::ChirpStore;
use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::path::PathBuf;

fn bench_path(name: &str, size: usize) -> PathBuf {
    std::env::temp_dir().join(format!("chirp_store_bench_{}_{}.json", name, size))
}

fn populated(name: &str, size: usize) -> (PathBuf, ChirpStore) {
    let path = bench_path(name, size);
    let _ = std::fs::remove_file(&path);
    let store = ChirpStore::open(&path).unwrap();
    for i in 0..size {
        store.create_post(format!("post number {i}"), (i % 10) as u32).unwrap();
    }
    (path, store)
}

fn bench_create_post(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_post");
    group.sample_size(20);
    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (path, store) = populated("create", size);
            b.iter(|| {
                let post = store.create_post("benchmark", 1).unwrap();
                store.delete_post(post.id).unwrap();
            });
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_list_posts(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_posts");
    for size in [100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (path, store) = populated("list", size);
            b.iter(|| black_box(store.list_posts().unwrap()));
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_check_token(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_refresh_token");
    for size in [10, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let path = bench_path("token", size);
            let _ = std::fs::remove_file(&path);
            let store = ChirpStore::open(&path).unwrap();
            let expires = Utc::now() + Duration::days(1);
            let mut last = None;
            for i in 0..size {
                last = Some(store.create_refresh_token(i as u32, expires).unwrap());
            }
            let token = last.unwrap().token;
            b.iter(|| black_box(store.check_refresh_token(&token).unwrap()));
            let _ = std::fs::remove_file(&path);
        });
    }
}

criterion_group!(benches, bench_create_post, bench_list_posts, bench_check_token);
criterion_main!(benches);
