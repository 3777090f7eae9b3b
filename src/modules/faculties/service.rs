use h5p_hub_cache::{RedisCache, invalidate, keys, read_through};
use h5p_hub_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::faculties::model::{CreateFacultyDto, Faculty, UpdateFacultyDto};

pub struct FacultyService;

fn not_found(id: i64) -> AppError {
    AppError::not_found(anyhow::anyhow!("Faculty not found with id: {}", id))
}

fn required_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Faculty name is required"
        )));
    }
    Ok(name.to_string())
}

impl FacultyService {
    #[instrument(skip(db, cache))]
    pub async fn get_all(db: &PgPool, cache: Option<&RedisCache>) -> Result<Vec<Faculty>, AppError> {
        read_through(cache, &keys::faculties::list(), || async {
            let faculties = sqlx::query_as::<_, Faculty>(
                "SELECT id, name, description FROM faculties ORDER BY name, id",
            )
            .fetch_all(db)
            .await?;
            Ok::<_, AppError>(faculties)
        })
        .await
    }

    #[instrument(skip(db, cache))]
    pub async fn get_by_id(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: i64,
    ) -> Result<Faculty, AppError> {
        read_through(cache, &keys::faculties::by_id(id), || async {
            sqlx::query_as::<_, Faculty>(
                "SELECT id, name, description FROM faculties WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found(id))
        })
        .await
    }

    #[instrument(skip(db, cache))]
    pub async fn create(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateFacultyDto,
    ) -> Result<Faculty, AppError> {
        let name = required_name(&dto.name)?;

        let faculty = sqlx::query_as::<_, Faculty>(
            "INSERT INTO faculties (name, description) VALUES ($1, $2)
             RETURNING id, name, description",
        )
        .bind(&name)
        .bind(&dto.description)
        .fetch_one(db)
        .await?;

        invalidate::faculty(cache, Some(faculty.id)).await;

        info!(faculty.id = %faculty.id, faculty.name = %faculty.name, "Faculty created");

        Ok(faculty)
    }

    #[instrument(skip(db, cache))]
    pub async fn update(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: i64,
        dto: UpdateFacultyDto,
    ) -> Result<Faculty, AppError> {
        let name = dto.name.as_deref().map(required_name).transpose()?;

        let faculty = sqlx::query_as::<_, Faculty>(
            "UPDATE faculties
             SET name = COALESCE($1, name),
                 description = COALESCE($2, description)
             WHERE id = $3
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(dto.description)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found(id))?;

        invalidate::faculty(cache, Some(id)).await;

        Ok(faculty)
    }

    #[instrument(skip(db, cache))]
    pub async fn delete(db: &PgPool, cache: Option<&RedisCache>, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM faculties WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        invalidate::faculty(cache, Some(id)).await;

        info!(faculty.id = %id, "Faculty deleted");

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
             LEFT JOIN faculties f ON f.id = requested.id
             WHERE f.id IS NULL
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  Medicine ").unwrap(), "Medicine");
    }

    #[test]
    fn test_required_name_rejects_blank() {
        let err = required_name("   ").unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[test]
    fn test_not_found_message() {
        let err = not_found(42);
        assert_eq!(err.status.as_u16(), 404);
        assert_eq!(err.error.to_string(), "Faculty not found with id: 42");
    }
}
