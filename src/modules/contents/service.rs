//! Content repository.
//!
//! Rows are read first and then hydrated with their categories and faculties
//! in two batched queries. Link writes go through a single transaction that
//! resolves every category id before any faculty id, so the first missing id
//! in request order is the one reported.

use std::collections::HashMap;

use h5p_hub_cache::{RedisCache, invalidate, keys, read_through};
use h5p_hub_core::AppError;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument, warn};

use crate::modules::categories::model::Category;
use crate::modules::categories::service::CategoryService;
use crate::modules::contents::model::{
    Content, ContentRow, CreateContentDto, NewContent, UpdateContentDto,
};
use crate::modules::faculties::model::Faculty;
use crate::modules::faculties::service::FacultyService;

const CONTENT_COLUMNS: &str = "c.id, c.name, c.info, c.preview_image, c.h5p_json_path";

pub struct ContentService;

fn not_found(id: i64) -> AppError {
    AppError::not_found(anyhow::anyhow!("H5P content not found with id: {}", id))
}

fn required_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Content name is required"
        )));
    }
    Ok(name.to_string())
}

#[derive(FromRow)]
struct LinkedCategory {
    content_id: i64,
    #[sqlx(flatten)]
    category: Category,
}

#[derive(FromRow)]
struct LinkedFaculty {
    content_id: i64,
    #[sqlx(flatten)]
    faculty: Faculty,
}

/// The two link tables share a shape and differ only in names.
#[derive(Debug, Clone, Copy)]
enum Link {
    Category,
    Faculty,
}

impl Link {
    fn table(self) -> &'static str {
        match self {
            Link::Category => "h5p_content_categories",
            Link::Faculty => "h5p_content_faculties",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Link::Category => "category_id",
            Link::Faculty => "faculty_id",
        }
    }

    async fn ensure_exist(self, conn: &mut PgConnection, ids: &[i64]) -> Result<(), AppError> {
        match self {
            Link::Category => CategoryService::ensure_exist(conn, ids).await,
            Link::Faculty => FacultyService::ensure_exist(conn, ids).await,
        }
    }

    async fn insert(self, conn: &mut PgConnection, content_id: i64, ids: &[i64]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {} (h5p_content_id, {}) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            self.table(),
            self.column()
        );
        sqlx::query(&sql).bind(content_id).bind(ids).execute(conn).await?;
        Ok(())
    }

    async fn delete(self, conn: &mut PgConnection, content_id: i64, target: Option<i64>) -> Result<(), AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE h5p_content_id = $1 AND ($2::BIGINT IS NULL OR {} = $2)",
            self.table(),
            self.column()
        );
        sqlx::query(&sql).bind(content_id).bind(target).execute(conn).await?;
        Ok(())
    }
}

async fn ensure_content_exists(conn: &mut PgConnection, id: i64) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM h5p_contents WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await?;

    if exists { Ok(()) } else { Err(not_found(id)) }
}

/// Attaches categories and faculties to `rows`, preserving row order.
async fn hydrate(db: &PgPool, rows: Vec<ContentRow>) -> Result<Vec<Content>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let linked_categories = sqlx::query_as::<_, LinkedCategory>(
        "SELECT l.h5p_content_id AS content_id, cat.id, cat.name
         FROM h5p_content_categories l
         JOIN categories cat ON cat.id = l.category_id
         WHERE l.h5p_content_id = ANY($1)
         ORDER BY cat.id",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let linked_faculties = sqlx::query_as::<_, LinkedFaculty>(
        "SELECT l.h5p_content_id AS content_id, f.id, f.name, f.description
         FROM h5p_content_faculties l
         JOIN faculties f ON f.id = l.faculty_id
         WHERE l.h5p_content_id = ANY($1)
         ORDER BY f.id",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
    for linked in linked_categories {
        categories.entry(linked.content_id).or_default().push(linked.category);
    }

    let mut faculties: HashMap<i64, Vec<Faculty>> = HashMap::new();
    for linked in linked_faculties {
        faculties.entry(linked.content_id).or_default().push(linked.faculty);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_content(
                categories.remove(&id).unwrap_or_default(),
                faculties.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

async fn fetch_rows(db: &PgPool, filter: &str, bind: Option<BindValue<'_>>) -> Result<Vec<ContentRow>, AppError> {
    let sql = format!("SELECT {CONTENT_COLUMNS} FROM h5p_contents c {filter} ORDER BY c.id");
    let query = sqlx::query_as::<_, ContentRow>(&sql);
    let query = match bind {
        Some(BindValue::Id(id)) => query.bind(id),
        Some(BindValue::Text(text)) => query.bind(text),
        None => query,
    };
    Ok(query.fetch_all(db).await?)
}

enum BindValue<'a> {
    Id(i64),
    Text(&'a str),
}

impl ContentService {
    #[instrument(skip(db, cache))]
    pub async fn get_all(db: &PgPool, cache: Option<&RedisCache>) -> Result<Vec<Content>, AppError> {
        read_through(cache, &keys::contents::list(), || async {
            let rows = fetch_rows(db, "", None).await?;
            hydrate(db, rows).await
        })
        .await
    }

    #[instrument(skip(db, cache))]
    pub async fn get_by_id(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: i64,
    ) -> Result<Content, AppError> {
        read_through(cache, &keys::contents::by_id(id), || Self::load(db, id)).await
    }

    /// Reads one content straight from the database.
    async fn load(db: &PgPool, id: i64) -> Result<Content, AppError> {
        let rows = fetch_rows(db, "WHERE c.id = $1", Some(BindValue::Id(id))).await?;
        hydrate(db, rows)
            .await?
            .pop()
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db))]
    pub async fn search(db: &PgPool, name: &str) -> Result<Vec<Content>, AppError> {
        let rows = fetch_rows(
            db,
            "WHERE STRPOS(LOWER(c.name), LOWER($1)) > 0",
            Some(BindValue::Text(name)),
        )
        .await?;
        hydrate(db, rows).await
    }

    #[instrument(skip(db))]
    pub async fn by_category(db: &PgPool, category_id: i64) -> Result<Vec<Content>, AppError> {
        let rows = fetch_rows(
            db,
            "WHERE EXISTS (SELECT 1 FROM h5p_content_categories l
                           WHERE l.h5p_content_id = c.id AND l.category_id = $1)",
            Some(BindValue::Id(category_id)),
        )
        .await?;
        hydrate(db, rows).await
    }

    #[instrument(skip(db))]
    pub async fn by_category_name(db: &PgPool, name: &str) -> Result<Vec<Content>, AppError> {
        let rows = fetch_rows(
            db,
            "WHERE EXISTS (SELECT 1 FROM h5p_content_categories l
                           JOIN categories cat ON cat.id = l.category_id
                           WHERE l.h5p_content_id = c.id AND LOWER(cat.name) = LOWER($1))",
            Some(BindValue::Text(name)),
        )
        .await?;
        hydrate(db, rows).await
    }

    #[instrument(skip(db))]
    pub async fn by_faculty(db: &PgPool, faculty_id: i64) -> Result<Vec<Content>, AppError> {
        let rows = fetch_rows(
            db,
            "WHERE EXISTS (SELECT 1 FROM h5p_content_faculties l
                           WHERE l.h5p_content_id = c.id AND l.faculty_id = $1)",
            Some(BindValue::Id(faculty_id)),
        )
        .await?;
        hydrate(db, rows).await
    }

    #[instrument(skip(db))]
    pub async fn by_faculty_name(db: &PgPool, name: &str) -> Result<Vec<Content>, AppError> {
        let rows = fetch_rows(
            db,
            "WHERE EXISTS (SELECT 1 FROM h5p_content_faculties l
                           JOIN faculties f ON f.id = l.faculty_id
                           WHERE l.h5p_content_id = c.id AND LOWER(f.name) = LOWER($1))",
            Some(BindValue::Text(name)),
        )
        .await?;
        hydrate(db, rows).await
    }

    /// Inserts and commits a content row without links.
    #[instrument(skip(db))]
    pub async fn insert_row(db: &PgPool, content: &NewContent) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO h5p_contents (name, info, preview_image, h5p_json_path)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&content.name)
        .bind(&content.info)
        .bind(&content.preview_image)
        .bind(&content.h5p_json_path)
        .fetch_one(db)
        .await?;

        info!(content.id = %id, content.name = %content.name, "Content row inserted");

        Ok(id)
    }

    /// Links an existing content to categories and faculties in one transaction.
    ///
    /// Category ids are checked before faculty ids, each in the given order.
    /// On a missing id nothing is linked and the content row is left as is.
    #[instrument(skip(db))]
    pub async fn link(
        db: &PgPool,
        content_id: i64,
        category_ids: &[i64],
        faculty_ids: &[i64],
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        Link::Category.ensure_exist(&mut tx, category_ids).await?;
        Link::Faculty.ensure_exist(&mut tx, faculty_ids).await?;

        Link::Category.insert(&mut tx, content_id, category_ids).await?;
        Link::Faculty.insert(&mut tx, content_id, faculty_ids).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Creates a content, then links it.
    ///
    /// A failed link step leaves the content persisted without links and
    /// returns the link error.
    #[instrument(skip(db, cache))]
    pub async fn create(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateContentDto,
    ) -> Result<Content, AppError> {
        let new_content = NewContent {
            name: required_name(&dto.name)?,
            info: dto.info,
            preview_image: dto.preview_image,
            h5p_json_path: dto.h5p_json_path,
        };

        let id = Self::insert_row(db, &new_content).await?;
        let linked = Self::link(db, id, &dto.category_ids, &dto.faculty_ids).await;

        invalidate::content(cache, Some(id)).await;

        if let Err(e) = linked {
            warn!(content.id = %id, error = %e.error, "Content created without links");
            return Err(e);
        }

        Self::load(db, id).await
    }

    #[instrument(skip(db, cache))]
    pub async fn update(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: i64,
        dto: UpdateContentDto,
    ) -> Result<Content, AppError> {
        let name = dto.name.as_deref().map(required_name).transpose()?;

        let mut tx = db.begin().await?;

        let updated = sqlx::query(
            "UPDATE h5p_contents
             SET name = COALESCE($1, name),
                 info = COALESCE($2, info),
                 preview_image = COALESCE($3, preview_image),
                 h5p_json_path = COALESCE($4, h5p_json_path)
             WHERE id = $5",
        )
        .bind(name)
        .bind(dto.info)
        .bind(dto.preview_image)
        .bind(dto.h5p_json_path)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(not_found(id));
        }

        if let Some(category_ids) = &dto.category_ids {
            Self::replace_in(&mut tx, Link::Category, id, category_ids).await?;
        }
        if let Some(faculty_ids) = &dto.faculty_ids {
            Self::replace_in(&mut tx, Link::Faculty, id, faculty_ids).await?;
        }

        tx.commit().await?;

        invalidate::content(cache, Some(id)).await;

        Self::load(db, id).await
    }

    #[instrument(skip(db, cache))]
    pub async fn delete(db: &PgPool, cache: Option<&RedisCache>, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM h5p_contents WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        invalidate::content(cache, Some(id)).await;

        info!(content.id = %id, "Content deleted");

        Ok(())
    }

    pub async fn add_category(
        db: &PgPool,
        cache: Option<&RedisCache>,
        content_id: i64,
        category_id: i64,
    ) -> Result<Content, AppError> {
        Self::add_link(db, cache, Link::Category, content_id, category_id).await
    }

    pub async fn remove_category(
        db: &PgPool,
        cache: Option<&RedisCache>,
        content_id: i64,
        category_id: i64,
    ) -> Result<Content, AppError> {
        Self::remove_link(db, cache, Link::Category, content_id, category_id).await
    }

    pub async fn replace_categories(
        db: &PgPool,
        cache: Option<&RedisCache>,
        content_id: i64,
        category_ids: &[i64],
    ) -> Result<Content, AppError> {
        Self::replace_links(db, cache, Link::Category, content_id, category_ids).await
    }

    pub async fn add_faculty(
        db: &PgPool,
        cache: Option<&RedisCache>,
        content_id: i64,
        faculty_id: i64,
    ) -> Result<Content, AppError> {
        Self::add_link(db, cache, Link::Faculty, content_id, faculty_id).await
    }

    pub async fn remove_faculty(
        db: &PgPool,
        cache: Option<&RedisCache>,
        content_id: i64,
        faculty_id: i64,
    ) -> Result<Content, AppError> {
        Self::remove_link(db, cache, Link::Faculty, content_id, faculty_id).await
    }

    pub async fn replace_faculties(
        db: &PgPool,
        cache: Option<&RedisCache>,
        content_id: i64,
        faculty_ids: &[i64],
    ) -> Result<Content, AppError> {
        Self::replace_links(db, cache, Link::Faculty, content_id, faculty_ids).await
    }

    #[instrument(skip(db, cache))]
    async fn add_link(
        db: &PgPool,
        cache: Option<&RedisCache>,
        link: Link,
        content_id: i64,
        target_id: i64,
    ) -> Result<Content, AppError> {
        let mut tx = db.begin().await?;

        ensure_content_exists(&mut tx, content_id).await?;
        link.ensure_exist(&mut tx, &[target_id]).await?;
        link.insert(&mut tx, content_id, &[target_id]).await?;

        tx.commit().await?;

        invalidate::content(cache, Some(content_id)).await;

        Self::load(db, content_id).await
    }

    #[instrument(skip(db, cache))]
    async fn remove_link(
        db: &PgPool,
        cache: Option<&RedisCache>,
        link: Link,
        content_id: i64,
        target_id: i64,
    ) -> Result<Content, AppError> {
        let mut tx = db.begin().await?;

        ensure_content_exists(&mut tx, content_id).await?;
        link.ensure_exist(&mut tx, &[target_id]).await?;
        link.delete(&mut tx, content_id, Some(target_id)).await?;

        tx.commit().await?;

        invalidate::content(cache, Some(content_id)).await;

        Self::load(db, content_id).await
    }

    #[instrument(skip(db, cache))]
    async fn replace_links(
        db: &PgPool,
        cache: Option<&RedisCache>,
        link: Link,
        content_id: i64,
        ids: &[i64],
    ) -> Result<Content, AppError> {
        let mut tx = db.begin().await?;

        ensure_content_exists(&mut tx, content_id).await?;
        Self::replace_in(&mut tx, link, content_id, ids).await?;

        tx.commit().await?;

        invalidate::content(cache, Some(content_id)).await;

        Self::load(db, content_id).await
    }

    /// Validates every id before dropping the current links.
    async fn replace_in(
        conn: &mut PgConnection,
        link: Link,
        content_id: i64,
        ids: &[i64],
    ) -> Result<(), AppError> {
        link.ensure_exist(conn, ids).await?;
        link.delete(conn, content_id, None).await?;
        link.insert(conn, content_id, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = not_found(7);
        assert_eq!(err.status.as_u16(), 404);
        assert_eq!(err.error.to_string(), "H5P content not found with id: 7");
    }

    #[test]
    fn test_required_name() {
        assert_eq!(required_name(" Quiz ").unwrap(), "Quiz");
        assert_eq!(required_name("").unwrap_err().status.as_u16(), 400);
    }

    #[test]
    fn test_link_tables() {
        assert_eq!(Link::Category.table(), "h5p_content_categories");
        assert_eq!(Link::Category.column(), "category_id");
        assert_eq!(Link::Faculty.table(), "h5p_content_faculties");
        assert_eq!(Link::Faculty.column(), "faculty_id");
    }
}
