//! Integration tests against a live PostgreSQL.
//!
//! Run with `--features pg-tests` and `DATABASE_URL` pointing at a scratch
//! database. Every test works inside one transaction and rolls it back.

#![cfg(feature = "pg-tests")]

use picvault_database::PgMetadataRepository;
use picvault_metadata::{
    DatabaseErrorKind, ImageQuery, MetadataRepository, MetadataTransaction, NewImage,
    NewImageBuilder, Page,
};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

async fn repository() -> PgMetadataRepository {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for pg-tests");
    let repo = PgMetadataRepository::connect(&url, 4).expect("pool");
    repo.migrate().await.expect("migrations");
    repo
}

/// A name no committed row uses.
fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

fn new_image(directory: &str, code: &str) -> NewImage {
    NewImageBuilder::default()
        .image_name(format!("{}.jpg", code))
        .image_code(code)
        .thumbnail_code(format!("t{}", code))
        .thumbnail_ext("jpg")
        .ext("jpg")
        .size(64)
        .directory(directory)
        .build()
        .expect("complete builder")
}

fn tag_image(tx: &mut Box<dyn MetadataTransaction>, image_id: i64, names: &[String]) {
    for name in names {
        let tag = tx.ensure_tag(name).unwrap();
        tx.link_image_tag(image_id, tag.id).unwrap();
    }
}

#[tokio::test]
async fn test_image_address_is_unique() {
    let repo = repository().await;
    let dir = unique("dir");
    let mut tx = repo.begin().await.unwrap();

    let image = tx.create_image(&new_image(&dir, "abc")).unwrap();
    let err = tx.create_image(&new_image(&dir, "abc")).unwrap_err();
    assert!(matches!(err.kind, DatabaseErrorKind::Conflict(_)));

    // The conflict did not abort the transaction
    let found = tx.find_image_by_address(&dir, "abc").unwrap();
    assert_eq!(found.map(|i| i.id), Some(image.id));

    tx.rollback().unwrap();
}

#[tokio::test]
async fn test_tag_lifecycle() {
    let repo = repository().await;
    let name = unique("tag");
    let renamed = unique("renamed");
    let mut tx = repo.begin().await.unwrap();

    let tag = tx.create_tag(&name).unwrap();
    let err = tx.create_tag(&name).unwrap_err();
    assert!(matches!(err.kind, DatabaseErrorKind::Conflict(_)));
    assert_eq!(tx.ensure_tag(&name).unwrap().id, tag.id);

    let updated = tx.rename_tag(tag.id, &renamed).unwrap();
    assert_eq!(updated.tag_name, renamed);
    assert!(tx.find_tag_by_name(&name).unwrap().is_none());

    tx.delete_tag(tag.id).unwrap();
    let err = tx.delete_tag(tag.id).unwrap_err();
    assert!(matches!(err.kind, DatabaseErrorKind::NotFound(_)));

    tx.rollback().unwrap();
}

#[tokio::test]
async fn test_intersection_and_links() {
    let repo = repository().await;
    let dir = unique("dir");
    let (a, b, c) = (unique("a"), unique("b"), unique("c"));
    let mut tx = repo.begin().await.unwrap();

    let i1 = tx.create_image(&new_image(&dir, "one")).unwrap();
    let i2 = tx.create_image(&new_image(&dir, "two")).unwrap();
    let i3 = tx.create_image(&new_image(&dir, "three")).unwrap();
    tag_image(&mut tx, i1.id, &[a.clone(), b.clone()]);
    tag_image(&mut tx, i2.id, &[a.clone()]);
    tag_image(&mut tx, i3.id, &[a.clone(), b.clone(), c.clone()]);

    let tag_a = tx.find_tag_by_name(&a).unwrap().unwrap();
    assert!(!tx.link_image_tag(i1.id, tag_a.id).unwrap());

    let ids = |page: &picvault_metadata::ImagePage| -> HashSet<i64> {
        page.images.iter().map(|image| image.id).collect()
    };

    let ab = tx
        .query_images(&ImageQuery::new(&dir, Page::default()).with_tags([&a, &b, &a]))
        .unwrap();
    assert_eq!(ids(&ab), HashSet::from([i1.id, i3.id]));
    assert_eq!(ab.total, 2);

    let abc = tx
        .query_images(&ImageQuery::new(&dir, Page::default()).with_tags([&a, &b, &c]))
        .unwrap();
    assert_eq!(ids(&abc), HashSet::from([i3.id]));

    let all = tx.query_images(&ImageQuery::new(&dir, Page::default())).unwrap();
    assert_eq!(all.total, 3);

    let tags = tx.tags_for_images(&[i1.id, i2.id]).unwrap();
    assert_eq!(tags[&i1.id], vec![a.clone(), b.clone()]);
    assert_eq!(tags[&i2.id], vec![a.clone()]);

    tx.rollback().unwrap();
}

#[tokio::test]
async fn test_pagination_total() {
    let repo = repository().await;
    let dir = unique("dir");
    let mut tx = repo.begin().await.unwrap();

    for n in 0..25 {
        tx.create_image(&new_image(&dir, &format!("img{}", n))).unwrap();
    }

    // Rows share the transaction timestamp, so order falls back to id
    let page = tx
        .query_images(&ImageQuery::new(&dir, Page::new(2, 10)))
        .unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.images.len(), 10);
    assert!(page.images.windows(2).all(|w| w[0].id > w[1].id));

    tx.rollback().unwrap();
}

#[tokio::test]
async fn test_drop_rolls_back() {
    let repo = repository().await;
    let dir = unique("dir");

    {
        let mut tx = repo.begin().await.unwrap();
        tx.create_image(&new_image(&dir, "abc")).unwrap();
    }

    let mut tx = repo.begin().await.unwrap();
    assert!(tx.find_image_by_address(&dir, "abc").unwrap().is_none());
    tx.rollback().unwrap();
}
