use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use reel_blob::{
    BlobConfig, BlobError, BlobId, BlobKind, BlobPut, BlobStore, ByteStream, FsBlobStore,
    MemoryBlobStore,
};

const CHUNK: u64 = 64;

/// Test factory functions
fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Split into uneven pieces so chunk boundaries never line up with buffers
fn body_from(data: &[u8]) -> ByteStream {
    let pieces: Vec<std::io::Result<Bytes>> = data
        .chunks(37)
        .map(|p| Ok(Bytes::copy_from_slice(p)))
        .collect();
    Box::pin(futures_util::stream::iter(pieces))
}

fn channel_body(mut rx: mpsc::Receiver<std::io::Result<Bytes>>) -> ByteStream {
    Box::pin(async_stream::stream! {
        while let Some(item) = rx.recv().await {
            yield item;
        }
    })
}

async fn collect(stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    let mut stream = stream;
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}

fn config() -> BlobConfig {
    BlobConfig::new().with_chunk_size(CHUNK)
}

async fn stores() -> (tempfile::TempDir, Vec<(&'static str, Arc<dyn BlobStore>)>) {
    let dir = tempfile::tempdir().unwrap();
    let fs_store = FsBlobStore::open(dir.path(), config()).await.unwrap();
    let mem_store = MemoryBlobStore::with_config(config()).unwrap();
    (
        dir,
        vec![
            ("memory", Arc::new(mem_store) as Arc<dyn BlobStore>),
            ("fs", Arc::new(fs_store) as Arc<dyn BlobStore>),
        ],
    )
}

#[tokio::test]
async fn full_read_round_trips() {
    let (_dir, stores) = stores().await;
    let data = payload(10_000);

    for (name, store) in stores {
        let object = store
            .ingest(
                BlobPut::new(BlobKind::Video)
                    .with_filename("movie.mp4")
                    .with_content_type("video/mp4"),
                body_from(&data),
            )
            .await
            .unwrap();

        assert_eq!(object.length, 10_000, "{name}");
        assert_eq!(object.chunk_size, CHUNK, "{name}");
        assert!(object.checksum.is_some(), "{name}");

        let stat = store.stat(&object.id).await.unwrap();
        assert_eq!(stat, object, "{name}");

        let bytes = collect(store.read_range(&object.id, 0, object.length - 1).await.unwrap()).await;
        assert_eq!(bytes, data, "{name}");
    }
}

#[tokio::test]
async fn ranges_around_chunk_boundaries_are_exact() {
    let (_dir, stores) = stores().await;
    let data = payload(1_000);
    let points = [0u64, 1, 62, 63, 64, 65, 127, 128, 129, 500, 959, 960, 998, 999];

    for (name, store) in stores {
        let object = store
            .ingest(BlobPut::default(), body_from(&data))
            .await
            .unwrap();

        for &start in &points {
            for &end in points.iter().filter(|&&e| e >= start) {
                let bytes = collect(store.read_range(&object.id, start, end).await.unwrap()).await;
                assert_eq!(
                    bytes,
                    &data[start as usize..=end as usize],
                    "{name}: {start}-{end}"
                );
            }
        }
    }
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let (_dir, stores) = stores().await;
    let data = payload(10_000);

    for (name, store) in stores {
        let object = store.ingest(BlobPut::default(), body_from(&data)).await.unwrap();
        let first = collect(store.read_range(&object.id, 5000, 5999).await.unwrap()).await;
        let second = collect(store.read_range(&object.id, 5000, 5999).await.unwrap()).await;

        assert_eq!(first.len(), 1000, "{name}");
        assert_eq!(first, second, "{name}");
        assert_eq!(first, &data[5000..6000], "{name}");
    }
}

#[tokio::test]
async fn end_is_clamped_and_bad_windows_rejected() {
    let (_dir, stores) = stores().await;
    let data = payload(10_000);

    for (name, store) in stores {
        let object = store.ingest(BlobPut::default(), body_from(&data)).await.unwrap();

        let tail = collect(store.read_range(&object.id, 9990, 20_000).await.unwrap()).await;
        assert_eq!(tail, &data[9990..], "{name}");

        for (start, end) in [(10_000, 10_005), (10, 5)] {
            let err = store.read_range(&object.id, start, end).await.err().unwrap();
            assert!(
                matches!(err, BlobError::RangeNotSatisfiable { length: 10_000, .. }),
                "{name}: {err}"
            );
        }
    }
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (_dir, stores) = stores().await;
    for (name, store) in stores {
        let id = BlobId::new();
        assert!(store.stat(&id).await.unwrap_err().is_not_found(), "{name}");
        assert!(store.read_range(&id, 0, 0).await.err().unwrap().is_not_found(), "{name}");
        assert!(store.delete(&id).await.unwrap_err().is_not_found(), "{name}");
    }
}

#[tokio::test]
async fn empty_blob_is_stored_but_has_no_readable_range() {
    let (_dir, stores) = stores().await;
    for (name, store) in stores {
        let object = store.ingest(BlobPut::default(), body_from(&[])).await.unwrap();
        assert_eq!(object.length, 0, "{name}");
        assert_eq!(store.stat(&object.id).await.unwrap().length, 0, "{name}");
        assert!(store.read_range(&object.id, 0, 0).await.is_err(), "{name}");
    }
}

#[tokio::test]
async fn deleted_blob_disappears() {
    let (_dir, stores) = stores().await;
    for (name, store) in stores {
        let object = store.ingest(BlobPut::default(), body_from(b"poster")).await.unwrap();
        store.delete(&object.id).await.unwrap();
        assert!(store.stat(&object.id).await.unwrap_err().is_not_found(), "{name}");
    }
}

#[tokio::test]
async fn size_limit_aborts_ingest() {
    let (_dir, stores) = stores().await;
    for (name, store) in stores {
        let err = store
            .ingest(BlobPut::default().with_max_bytes(100), body_from(&payload(500)))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::TooLarge { limit: 100 }), "{name}: {err}");
    }
}

#[tokio::test]
async fn concurrent_ingests_get_distinct_ids() {
    let (_dir, stores) = stores().await;
    for (name, store) in stores {
        let a = payload(300);
        let b: Vec<u8> = payload(300).into_iter().rev().collect();

        let (ra, rb) = tokio::join!(
            store.ingest(BlobPut::default(), body_from(&a)),
            store.ingest(BlobPut::default(), body_from(&b)),
        );
        let (oa, ob) = (ra.unwrap(), rb.unwrap());

        assert_ne!(oa.id, ob.id, "{name}");
        assert_eq!(collect(store.read_range(&oa.id, 0, 299).await.unwrap()).await, a, "{name}");
        assert_eq!(collect(store.read_range(&ob.id, 0, 299).await.unwrap()).await, b, "{name}");
    }
}

#[tokio::test]
async fn memory_ingest_in_progress_is_invisible() {
    let store = Arc::new(MemoryBlobStore::with_config(config()).unwrap());
    let (tx, rx) = mpsc::channel(4);

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.ingest(BlobPut::default(), channel_body(rx)).await }
    });

    tx.send(Ok(Bytes::from(payload(200)))).await.unwrap();
    tokio::task::yield_now().await;
    assert!(store.is_empty());

    drop(tx);
    let object = task.await.unwrap().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.stat(&object.id).await.unwrap().length, 200);
}

#[tokio::test]
async fn fs_ingest_in_progress_is_invisible_and_failures_are_swept() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsBlobStore::open(dir.path(), config()).await.unwrap());
    let objects = dir.path().join("objects");
    let staging = dir.path().join("staging");

    let (tx, rx) = mpsc::channel(4);
    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.ingest(BlobPut::default(), channel_body(rx)).await }
    });
    tx.send(Ok(Bytes::from(payload(200)))).await.unwrap();

    // Wait until the first chunks hit the staging area.
    let mut staged = false;
    for _ in 0..200 {
        if std::fs::read_dir(&staging).unwrap().next().is_some() {
            staged = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(staged);
    assert_eq!(std::fs::read_dir(&objects).unwrap().count(), 0);

    // The client drops mid-upload.
    tx.send(Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")))
        .await
        .unwrap();
    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, BlobError::IngestFailed { .. }));

    assert_eq!(std::fs::read_dir(&objects).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
}

#[tokio::test]
async fn fs_open_sweeps_stale_staging() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("staging").join("leftover");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("chunk-00000000"), b"partial").unwrap();

    let store = FsBlobStore::open(dir.path(), config()).await.unwrap();
    assert_eq!(store.root(), dir.path());
    assert!(!stale.exists());
}

#[tokio::test]
async fn fs_objects_survive_reopen_with_other_chunk_size() {
    let dir = tempfile::tempdir().unwrap();
    let data = payload(1_000);

    let id = {
        let store = FsBlobStore::open(dir.path(), config()).await.unwrap();
        store.ingest(BlobPut::default(), body_from(&data)).await.unwrap().id
    };

    let reopened = FsBlobStore::open(dir.path(), BlobConfig::new().with_chunk_size(300))
        .await
        .unwrap();
    let bytes = collect(reopened.read_range(&id, 100, 899).await.unwrap()).await;
    assert_eq!(bytes, &data[100..900]);
}

#[tokio::test]
async fn fs_rejects_metadata_with_zero_chunk_size() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), config()).await.unwrap();
    let object = store.ingest(BlobPut::default(), body_from(&payload(200))).await.unwrap();

    let meta = dir.path().join("objects").join(object.id.as_str()).join("meta.json");
    let mut json: serde_json::Value = serde_json::from_slice(&std::fs::read(&meta).unwrap()).unwrap();
    json["chunkSize"] = 0.into();
    std::fs::write(&meta, serde_json::to_vec(&json).unwrap()).unwrap();

    assert!(matches!(store.stat(&object.id).await, Err(BlobError::Serialization { .. })));
    assert!(matches!(
        store.read_range(&object.id, 0, 5).await,
        Err(BlobError::Serialization { .. })
    ));
}

#[tokio::test]
async fn fs_ingest_publishes_under_objects() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), config()).await.unwrap();
    let object = store.ingest(BlobPut::default(), body_from(&payload(300))).await.unwrap();

    let published = dir.path().join("objects").join(object.id.as_str());
    assert!(published.join("meta.json").exists());
    assert!(published.join("chunk-00000004").exists());
    assert_eq!(std::fs::read_dir(dir.path().join("staging")).unwrap().count(), 0);
}

#[tokio::test]
async fn dropping_a_read_midway_releases_the_object() {
    let (_dir, stores) = stores().await;
    let data = payload(CHUNK as usize * 8);

    for (name, store) in stores {
        let object = store.ingest(BlobPut::default(), body_from(&data)).await.unwrap();

        let mut stream = store.read_range(&object.id, 0, data.len() as u64 - 1).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(&first[..], &data[..CHUNK as usize], "{name}");
        drop(stream);

        // Nothing holds the object once the reader is gone
        store.delete(&object.id).await.unwrap();
        assert!(store.stat(&object.id).await.unwrap_err().is_not_found(), "{name}");
    }
}
