//! Directory listings and tag intersection.

use crate::DatabaseResult;
use crate::models::ImageRow;
use crate::schema::{image, image_tag, tag};
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Text};
use picvault_metadata::{Image, ImagePage, ImageQuery};
use std::collections::HashMap;

/// Images in the directory that carry every name in `$2`, where `$3` is the
/// number of distinct names.
const MATCHED_IMAGES: &str = "
    SELECT i.id
    FROM image i
    JOIN image_tag it ON it.image_id = i.id
    JOIN tag t ON t.id = it.tag_id
    WHERE i.directory = $1 AND t.tag_name = ANY($2)
    GROUP BY i.id
    HAVING COUNT(DISTINCT t.id) = $3";

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

/// Run an [`ImageQuery`].
#[tracing::instrument(skip(conn), fields(directory = %query.directory(), tags = query.tags().len()))]
pub(crate) fn query_images(conn: &mut PgConnection, query: &ImageQuery) -> DatabaseResult<ImagePage> {
    let page = query.page();

    let (total, rows) = if query.tags().is_empty() {
        let total = image::table
            .filter(image::directory.eq(query.directory()))
            .count()
            .get_result::<i64>(conn)?;
        let rows = image::table
            .filter(image::directory.eq(query.directory()))
            .order((image::created_at.desc(), image::id.desc()))
            .limit(page.limit())
            .offset(page.offset())
            .select(ImageRow::as_select())
            .load(conn)?;
        (total, rows)
    } else {
        let wanted = query.tags().len() as i64;

        let total = diesel::sql_query(format!(
            "SELECT COUNT(*) AS total FROM ({}) matched",
            MATCHED_IMAGES
        ))
        .bind::<Text, _>(query.directory())
        .bind::<Array<Text>, _>(query.tags().as_slice())
        .bind::<BigInt, _>(wanted)
        .get_result::<CountRow>(conn)?
        .total;

        let rows = diesel::sql_query(format!(
            "SELECT image.* FROM image JOIN ({}) matched ON matched.id = image.id
             ORDER BY image.created_at DESC, image.id DESC
             LIMIT $4 OFFSET $5",
            MATCHED_IMAGES
        ))
        .bind::<Text, _>(query.directory())
        .bind::<Array<Text>, _>(query.tags().as_slice())
        .bind::<BigInt, _>(wanted)
        .bind::<BigInt, _>(page.limit())
        .bind::<BigInt, _>(page.offset())
        .load::<ImageRow>(conn)?;

        (total, rows)
    };

    tracing::debug!(total, returned = rows.len(), "Listed images");
    Ok(ImagePage {
        images: rows.into_iter().map(Image::from).collect(),
        total,
    })
}

/// Tag names per existing image, in link order.
#[tracing::instrument(skip(conn, ids), fields(count = ids.len()))]
pub(crate) fn tags_for_images(
    conn: &mut PgConnection,
    ids: &[i64],
) -> DatabaseResult<HashMap<i64, Vec<String>>> {
    let existing: Vec<i64> = image::table
        .filter(image::id.eq_any(ids))
        .select(image::id)
        .load(conn)?;

    let pairs: Vec<(i64, String)> = image_tag::table
        .inner_join(tag::table)
        .filter(image_tag::image_id.eq_any(&existing))
        .order(image_tag::id.asc())
        .select((image_tag::image_id, tag::tag_name))
        .load(conn)?;

    let mut tags: HashMap<i64, Vec<String>> =
        existing.into_iter().map(|id| (id, Vec::new())).collect();
    for (image_id, name) in pairs {
        tags.entry(image_id).or_default().push(name);
    }
    Ok(tags)
}
