//! Tests for listings, tag intersection and views.

mod common;

use common::{Harness, ids, names, png};
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test]
async fn test_tag_intersection() {
    let h = Harness::new();
    let i1 = h.save("d", "1.png", png(1), &["a", "b"]).await;
    let i2 = h.save("d", "2.png", png(2), &["a"]).await;
    let i3 = h.save("d", "3.png", png(3), &["a", "b", "c"]).await;
    h.save("elsewhere", "4.png", png(4), &["a", "b", "c"]).await;

    let ab = h.service.list_images("d", &names(&["a", "b"]), 1, 10).await.unwrap();
    assert_eq!(ids(&ab), HashSet::from([i1, i3]));
    assert_eq!(ab.total, 2);

    let abc = h
        .service
        .list_images("d", &names(&["a", "b", "c"]), 1, 10)
        .await
        .unwrap();
    assert_eq!(ids(&abc), HashSet::from([i3]));

    let all = h.service.list_images("d", &[], 1, 10).await.unwrap();
    assert_eq!(ids(&all), HashSet::from([i1, i2, i3]));
    assert_eq!(all.total, 3);
}

#[tokio::test]
async fn test_pagination_newest_first() {
    let h = Harness::new();
    let mut saved = Vec::new();
    for n in 0..25 {
        saved.push(h.save("d", &format!("{}.png", n), png(n), &[]).await);
    }

    let page = h.service.list_images("d", &[], 2, 10).await.unwrap();
    assert_eq!(page.total, 25);

    // Ranks 11..=20 of the newest-first order
    let expected: Vec<i64> = saved.iter().rev().skip(10).take(10).copied().collect();
    let actual: Vec<i64> = page.images.iter().map(|image| image.id).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_non_positive_page_values_use_defaults() {
    let h = Harness::new();
    for n in 0..12 {
        h.save("d", &format!("{}.png", n), png(n), &[]).await;
    }

    let page = h.service.list_images("d", &[], 0, -5).await.unwrap();
    assert_eq!(page.images.len(), 10);
    assert_eq!(page.total, 12);
}

#[tokio::test]
async fn test_unknown_directory_is_empty() {
    let h = Harness::new();
    let page = h.service.list_images("nowhere", &[], 1, 10).await.unwrap();
    assert!(page.images.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_tags_for_images_round_trip() {
    let h = Harness::new();
    let untagged = h.save("d", "1.png", png(1), &[]).await;
    let tagged = h.save("d", "2.png", png(2), &["a", "b"]).await;

    let tags = h.service.tags_for_images(&[untagged, tagged]).await.unwrap();
    assert_eq!(tags[&untagged], Vec::<String>::new());

    let set: HashSet<&str> = tags[&tagged].iter().map(String::as_str).collect();
    assert_eq!(set, HashSet::from(["a", "b"]));
}

#[tokio::test]
async fn test_describe_images() {
    let h = Harness::new();
    let service = h.service.clone().with_url_ttl(Duration::from_secs(60));
    let id = h.save("d", "beach.png", png(1), &["summer"]).await;

    let page = service.list_images("d", &[], 1, 10).await.unwrap();
    let views = service.describe_images(&page).await.unwrap();

    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.id, id);
    assert_eq!(view.name, "beach.png");
    assert_eq!(view.tags, vec!["summer".to_string()]);
    assert!(view.url.starts_with("memory://d/"));
    assert!(view.url.contains(".png"));
    assert!(view.thumbnail_url.starts_with("memory://tmp-thumbnail/"));
}

#[tokio::test]
async fn test_get_missing_image() {
    let h = Harness::new();
    let err = h.service.get_image(404).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_list_directories_hides_thumbnail_bucket() {
    let h = Harness::new();
    h.save("holidays", "1.png", png(1), &[]).await;
    h.save("work", "2.png", png(2), &[]).await;

    let directories = h.service.list_directories().await.unwrap();
    assert_eq!(directories, vec!["holidays".to_string(), "work".to_string()]);
}

#[tokio::test]
async fn test_cached_tags_follow_mutations() {
    let (h, cache) = Harness::with_cache();
    let id = h.save("d", "1.png", png(1), &["a"]).await;

    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["a".to_string()]);
    assert_eq!(cache.len(), 1);

    h.service
        .add_tags_to_images(&[id], &names(&["b"]))
        .await
        .unwrap();
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["a".to_string(), "b".to_string()]);

    h.service.replace_image_tags(id, &names(&["c"])).await.unwrap();
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["c".to_string()]);

    let c = h.service.list_tags().await.unwrap().into_iter().find(|t| t.tag_name == "c").unwrap();
    h.service.rename_tag(c.id, "renamed").await.unwrap();
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["renamed".to_string()]);

    h.service.delete_tag(c.id).await.unwrap();
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert!(tags[&id].is_empty());

    h.service.delete_images(&[id]).await.unwrap();
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert!(!tags.contains_key(&id));
}
