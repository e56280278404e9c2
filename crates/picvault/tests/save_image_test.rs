//! Tests for saving images through the coordinator.

mod common;

use common::{Harness, image_bytes, png};
use image::ImageFormat;
use picvault::{ImageService, MetadataRepository, PicvaultErrorKind, ThumbnailErrorKind, Upload};
use picvault_storage::{content_address, object_key};

#[tokio::test]
async fn test_identical_bytes_save_once() {
    let h = Harness::new();
    let data = png(1);

    let first = h.save("holidays", "beach.png", data.clone(), &["a"]).await;
    let second = h.save("holidays", "copy.png", data, &["b"]).await;

    assert_eq!(first, second);
    assert_eq!(h.metadata.image_count().await, 1);
    assert_eq!(h.objects.object_count("holidays").await, 1);

    // The duplicate save does not touch the original's tags
    let tags = h.service.tags_for_images(&[first]).await.unwrap();
    assert_eq!(tags[&first], vec!["a".to_string()]);
}

#[tokio::test]
async fn test_same_bytes_in_two_directories() {
    let h = Harness::new();
    let data = png(1);

    let a = h.save("holidays", "beach.png", data.clone(), &[]).await;
    let b = h.save("work", "beach.png", data, &[]).await;

    assert_ne!(a, b);
    assert_eq!(h.metadata.image_count().await, 2);

    // One thumbnail object serves both rows
    assert_eq!(h.objects.object_count(h.service.thumbnail_bucket()).await, 1);
}

#[tokio::test]
async fn test_save_records_blob_addresses() {
    let h = Harness::new();
    let data = png(3);
    let id = h.save("holidays", "Beach.PNG", data.clone(), &[]).await;

    let view = h.service.get_image(id).await.unwrap();
    assert_eq!(view.name, "Beach.PNG");
    assert_eq!(view.ext, "PNG");
    assert_eq!(view.size, data.len() as i64);
    assert_eq!(view.directory, "holidays");

    let key = object_key(&content_address(&data), "PNG");
    let stored = h.service.blobs().fetch("holidays", &key).await.unwrap();
    assert_eq!(stored, data);
}

#[tokio::test]
async fn test_thumbnail_is_stored_in_shared_bucket() {
    let h = Harness::new();
    let data = image_bytes(1200, 800, 9, ImageFormat::Png);
    let id = h.save("holidays", "wide.png", data, &[]).await;

    let mut tx = h.metadata.begin().await.unwrap();
    let image = tx.find_image(id).unwrap().unwrap();
    tx.rollback().unwrap();

    assert_eq!(image.thumbnail_ext, "png");
    let thumbnail = h
        .service
        .blobs()
        .fetch(
            h.service.thumbnail_bucket(),
            &object_key(&image.thumbnail_code, &image.thumbnail_ext),
        )
        .await
        .unwrap();

    // Keyed by the thumbnail's own bytes
    assert_eq!(content_address(&thumbnail), image.thumbnail_code);

    let decoded = image::load_from_memory(&thumbnail).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (600, 400));
}

#[tokio::test]
async fn test_gif_thumbnail_falls_back_to_jpeg() {
    let h = Harness::new();
    let data = image_bytes(40, 20, 5, ImageFormat::Gif);
    let id = h.save("anim", "loop.gif", data, &[]).await;

    let view = h.service.get_image(id).await.unwrap();
    assert_eq!(view.ext, "gif");
    assert!(view.thumbnail_url.contains(".jpg"));
}

#[tokio::test]
async fn test_tags_created_on_demand() {
    let h = Harness::new();
    h.service.create_tag("existing").await.unwrap();

    let id = h.save("d", "x.png", png(1), &["existing", "Fresh", "fresh"]).await;

    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["existing", "Fresh", "fresh"]);
    assert_eq!(h.service.list_tags().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_repeated_tag_links_once() {
    let h = Harness::new();
    let id = h.save("d", "x.png", png(1), &["a", "a"]).await;

    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["a".to_string()]);
    assert_eq!(h.metadata.link_count().await, 1);
}

#[tokio::test]
async fn test_undecodable_upload_is_not_catalogued() {
    let h = Harness::new();
    let err = h
        .service
        .save_image(Upload::new("d", "notes.png", b"not an image".to_vec()).with_tags(["a"]))
        .await
        .unwrap_err();

    match err.kind() {
        PicvaultErrorKind::Thumbnail(e) => {
            assert!(matches!(e.kind, ThumbnailErrorKind::Decode(_)))
        }
        other => panic!("expected thumbnail error, got {}", other),
    }
    assert!(!err.is_client_error());

    assert_eq!(h.metadata.image_count().await, 0);
    assert_eq!(h.metadata.tag_count().await, 0);
    // The original blob stays behind
    assert_eq!(h.objects.object_count("d").await, 1);
}

#[tokio::test]
async fn test_empty_directory_is_rejected() {
    let h = Harness::new();
    let err = h
        .service
        .save_image(Upload::new("", "x.png", png(1)))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), PicvaultErrorKind::Storage(_)));
    assert_eq!(h.metadata.image_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_identical_saves_share_one_row() {
    let h = Harness::new();
    let service: ImageService = h.service.clone();
    let data = png(11);

    let mut handles = Vec::new();
    for n in 0..8 {
        let service = service.clone();
        let data = data.clone();
        handles.push(tokio::spawn(async move {
            service
                .save_image(Upload::new("race", format!("copy{}.png", n), data))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(h.metadata.image_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_saves_on_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let store = picvault::FileSystemObjectStore::new(dir.path(), "https://img.example.com", "s3cret")
        .unwrap();
    let metadata = picvault::MemoryMetadataRepository::new();
    let service = ImageService::new(
        picvault::BlobStore::new(std::sync::Arc::new(store)),
        std::sync::Arc::new(metadata.clone()),
        picvault::Thumbnailer::default(),
    );
    let data = image_bytes(900, 700, 3, ImageFormat::Png);

    let mut handles = Vec::new();
    for n in 0..8 {
        let service = service.clone();
        let data = data.clone();
        handles.push(tokio::spawn(async move {
            service
                .save_image(Upload::new("race", format!("copy{}.png", n), data))
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(metadata.image_count().await, 1);

    let view = service.get_image(ids[0]).await.unwrap();
    assert!(view.url.starts_with("https://img.example.com/race/"));
}
