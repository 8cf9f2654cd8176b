//! Concurrent load-or-build and retrieval over one snapshot location

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    index_service, local_config, temp_dir, write_document, CountingProvider, HEALING_MAP,
};
use futures::future::join_all;
use healmap::services::{HealmapPipeline, IndexOrigin, IndexRegistry, Retriever};

#[tokio::test]
async fn test_concurrent_load_or_build_runs_one_build() {
    let dir = temp_dir();
    let document = write_document(dir.path(), HEALING_MAP);
    let provider = Arc::new(CountingProvider::new(32, Duration::from_millis(100)));
    let service = index_service(dir.path(), &document, provider.clone(), 20);

    let (a, b) = tokio::join!(service.load_or_build(), service.load_or_build());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(provider.batches(), 1);
    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_independent_services_on_one_location_build_once() {
    let dir = temp_dir();
    let document = write_document(dir.path(), HEALING_MAP);
    let provider = Arc::new(CountingProvider::new(32, Duration::from_millis(100)));
    let first = index_service(dir.path(), &document, provider.clone(), 20);
    let second = index_service(dir.path(), &document, provider.clone(), 20);

    let (a, b) = tokio::join!(first.load_or_build(), second.load_or_build());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(provider.batches(), 1, "builds for one location");
    assert_eq!(a.snapshot.passages, b.snapshot.passages);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pipelines_from_config_build_once() {
    let dir = temp_dir();
    let config = local_config(dir.path());

    let handles = (0..4).map(|_| {
        let config = config.clone();
        tokio::spawn(async move {
            let pipeline = HealmapPipeline::from_config(&config).await?;
            pipeline.prepare_index(false).await.map(|(_, origin)| origin)
        })
    });

    let origins: Vec<IndexOrigin> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(
        origins.iter().filter(|o| **o == IndexOrigin::Built).count(),
        1,
        "origins: {origins:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_spawned_callers_share_one_index() {
    let dir = temp_dir();
    let document = write_document(dir.path(), HEALING_MAP);
    let provider = Arc::new(CountingProvider::new(32, Duration::from_millis(50)));
    let registry = IndexRegistry::new();

    let handles = (0..8).map(|_| {
        let service = index_service(dir.path(), &document, provider.clone(), 20)
            .with_registry(registry.clone());
        tokio::spawn(async move { service.load_or_build().await })
    });

    let indexes: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(provider.batches(), 1);
    assert!(indexes.iter().all(|i| Arc::ptr_eq(i, &indexes[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_retrieval_over_shared_index() {
    let dir = temp_dir();
    let document = write_document(dir.path(), HEALING_MAP);
    let provider = Arc::new(CountingProvider::new(64, Duration::ZERO));
    let index = index_service(dir.path(), &document, provider.clone(), 20)
        .load_or_build()
        .await
        .unwrap();
    let retriever = Retriever::new(provider);

    let queries = ["worth", "voice", "belonging", "space"];
    let handles = queries.into_iter().map(|query| {
        let index = Arc::clone(&index);
        let retriever = retriever.clone();
        tokio::spawn(async move { retriever.search(&index, query, 2).await })
    });

    for joined in join_all(handles).await {
        let result = joined.unwrap().unwrap();
        assert_eq!(result.len(), 2);
        let distances = result.distances();
        assert!(distances[0] <= distances[1]);
    }
}
