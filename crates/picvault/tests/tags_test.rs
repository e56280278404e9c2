//! Tests for tag management.

mod common;

use common::{Harness, ids, names, png};
use picvault::PicvaultErrorKind;
use std::collections::HashSet;

#[tokio::test]
async fn test_create_tag_twice_conflicts() {
    let h = Harness::new();
    h.service.create_tag("x").await.unwrap();

    let err = h.service.create_tag("x").await.unwrap_err();
    assert!(err.is_conflict());
    assert!(err.is_client_error());
    assert_eq!(h.service.list_tags().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_tag_name_rejected() {
    let h = Harness::new();
    let err = h.service.create_tag("").await.unwrap_err();
    assert!(matches!(err.kind(), PicvaultErrorKind::Validation(_)));
}

#[tokio::test]
async fn test_list_tags_oldest_first() {
    let h = Harness::new();
    for name in ["m", "z", "a"] {
        h.service.create_tag(name).await.unwrap();
    }

    let listed: Vec<String> = h
        .service
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|tag| tag.tag_name)
        .collect();
    assert_eq!(listed, vec!["m", "z", "a"]);
}

#[tokio::test]
async fn test_rename_tag_rules() {
    let h = Harness::new();
    let x = h.service.create_tag("x").await.unwrap();
    h.service.create_tag("y").await.unwrap();

    assert!(h.service.rename_tag(x.id, "y").await.unwrap_err().is_conflict());
    assert!(h.service.rename_tag(777, "q").await.unwrap_err().is_not_found());

    // Same name is a no-op
    let same = h.service.rename_tag(x.id, "x").await.unwrap();
    assert_eq!(same.tag_name, "x");

    let renamed = h.service.rename_tag(x.id, "z").await.unwrap();
    assert_eq!(renamed.id, x.id);
    assert_eq!(renamed.tag_name, "z");
}

#[tokio::test]
async fn test_delete_tag_keeps_images() {
    let h = Harness::new();
    let id = h.save("d", "1.png", png(1), &["x", "y"]).await;
    let x = h
        .service
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .find(|tag| tag.tag_name == "x")
        .unwrap();

    h.service.delete_tag(x.id).await.unwrap();

    assert!(h.service.get_image(id).await.is_ok());
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["y".to_string()]);

    let tagged_x = h.service.list_images("d", &names(&["x"]), 1, 10).await.unwrap();
    assert_eq!(tagged_x.total, 0);

    assert!(h.service.delete_tag(x.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_add_tags_to_images() {
    let h = Harness::new();
    let a = h.save("d", "1.png", png(1), &["old"]).await;
    let b = h.save("d", "2.png", png(2), &[]).await;

    h.service
        .add_tags_to_images(&[a, b], &names(&["old", "new"]))
        .await
        .unwrap();

    let page = h
        .service
        .list_images("d", &names(&["old", "new"]), 1, 10)
        .await
        .unwrap();
    assert_eq!(ids(&page), HashSet::from([a, b]));

    let tags = h.service.tags_for_images(&[a]).await.unwrap();
    assert_eq!(tags[&a], vec!["old".to_string(), "new".to_string()]);
}

#[tokio::test]
async fn test_add_tags_requires_every_image() {
    let h = Harness::new();
    let a = h.save("d", "1.png", png(1), &[]).await;

    let err = h
        .service
        .add_tags_to_images(&[a, 4040], &names(&["t"]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // Nothing was committed
    assert!(h.service.tags_for_images(&[a]).await.unwrap()[&a].is_empty());
    assert!(h.service.list_tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_image_tags() {
    let h = Harness::new();
    let id = h.save("d", "1.png", png(1), &["a", "b"]).await;

    h.service.replace_image_tags(id, &names(&["c", "a"])).await.unwrap();
    let tags = h.service.tags_for_images(&[id]).await.unwrap();
    assert_eq!(tags[&id], vec!["c".to_string(), "a".to_string()]);

    h.service.replace_image_tags(id, &[]).await.unwrap();
    assert!(h.service.tags_for_images(&[id]).await.unwrap()[&id].is_empty());

    assert!(h.service.replace_image_tags(999, &names(&["x"])).await.unwrap_err().is_not_found());
}
