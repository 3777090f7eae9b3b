use h5p_hub_cache::{RedisCache, invalidate, keys, read_through};
use h5p_hub_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::modules::categories::model::{Category, CategoryDto};

pub struct CategoryService;

fn not_found(id: i64) -> AppError {
    AppError::not_found(anyhow::anyhow!("Category not found with id: {}", id))
}

fn validated_name(dto: &CategoryDto) -> Result<String, AppError> {
    let name = dto.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Category name is required"
        )));
    }
    Ok(name.to_string())
}

fn map_unique_violation(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!(category.name = %name, "Attempted to use an existing category name");
        return AppError::bad_request(anyhow::anyhow!("Category with this name already exists"));
    }
    AppError::from(e)
}

impl CategoryService {
    #[instrument(skip(db, cache))]
    pub async fn get_all(db: &PgPool, cache: Option<&RedisCache>) -> Result<Vec<Category>, AppError> {
        read_through(cache, &keys::categories::list(), || async {
            let categories =
                sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name, id")
                    .fetch_all(db)
                    .await?;
            Ok::<_, AppError>(categories)
        })
        .await
    }

    #[instrument(skip(db, cache))]
    pub async fn get_by_id(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: i64,
    ) -> Result<Category, AppError> {
        read_through(cache, &keys::categories::by_id(id), || async {
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| not_found(id))
        })
        .await
    }

    #[instrument(skip(db))]
    pub async fn search(db: &PgPool, name: &str) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM categories
             WHERE STRPOS(LOWER(name), LOWER($1)) > 0
             ORDER BY name, id",
        )
        .bind(name)
        .fetch_all(db)
        .await?;

        Ok(categories)
    }

    #[instrument(skip(db, cache))]
    pub async fn create(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CategoryDto,
    ) -> Result<Category, AppError> {
        let name = validated_name(&dto)?;

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&name)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, &name))?;

        invalidate::category(cache, Some(category.id)).await;

        info!(category.id = %category.id, category.name = %category.name, "Category created");

        Ok(category)
    }

    #[instrument(skip(db, cache))]
    pub async fn update(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: i64,
        dto: CategoryDto,
    ) -> Result<Category, AppError> {
        let name = validated_name(&dto)?;

        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(&name)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| map_unique_violation(e, &name))?
        .ok_or_else(|| not_found(id))?;

        invalidate::category(cache, Some(id)).await;

        Ok(category)
    }

    #[instrument(skip(db, cache))]
    pub async fn delete(db: &PgPool, cache: Option<&RedisCache>, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        invalidate::category(cache, Some(id)).await;

        info!(category.id = %id, "Category deleted");

        Ok(())
    }

    /// Fails with not-found naming the first id in `ids` that has no row.
    pub async fn ensure_exist<'e, E>(executor: E, ids: &[i64]) -> Result<(), AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let missing: Option<i64> = sqlx::query_scalar(
            "SELECT requested.id
             FROM UNNEST($1::BIGINT[]) WITH ORDINALITY AS requested(id, position)
             LEFT JOIN categories c ON c.id = requested.id
             WHERE c.id IS NULL
             ORDER BY requested.position
             LIMIT 1",
        )
        .bind(ids)
        .fetch_optional(executor)
        .await?;

        match missing {
            Some(id) => Err(not_found(id)),
            None => Ok(()),
        }
    }
}
