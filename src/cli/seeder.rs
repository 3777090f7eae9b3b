use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

pub const SAMPLE_CONTENT_PREFIX: &str = "Sample Content";

pub const SAMPLE_CATEGORIES: &[&str] = &[
    "Interactive Video",
    "Course Presentation",
    "Quiz",
    "Drag and Drop",
    "Flashcards",
];

pub const SAMPLE_FACULTIES: &[(&str, &str)] = &[
    ("Faculty of Science", "Physics, chemistry and biology"),
    ("Faculty of Arts", "Languages, history and philosophy"),
    ("Faculty of Engineering", "Civil, electrical and mechanical engineering"),
    ("Faculty of Medicine", "Clinical and pre-clinical studies"),
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub faculties: usize,
    pub contents: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub contents: u64,
    pub categories: u64,
    pub faculties: u64,
}

/// Picks the link target for the `index`-th sample content.
fn round_robin(ids: &[i64], index: usize) -> Option<i64> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

fn sample_content_name(n: usize) -> String {
    format!("{} {}", SAMPLE_CONTENT_PREFIX, n)
}

async fn seed_categories(tx: &mut Transaction<'_, Postgres>) -> Result<Vec<i64>, sqlx::Error> {
    let names: Vec<String> = SAMPLE_CATEGORIES.iter().map(|s| s.to_string()).collect();

    sqlx::query(
        "INSERT INTO categories (name) SELECT UNNEST($1::TEXT[]) ON CONFLICT (name) DO NOTHING",
    )
    .bind(&names)
    .execute(&mut **tx)
    .await?;

    sqlx::query_scalar("SELECT id FROM categories WHERE name = ANY($1::TEXT[]) ORDER BY id")
        .bind(&names)
        .fetch_all(&mut **tx)
        .await
}

async fn seed_faculties(tx: &mut Transaction<'_, Postgres>) -> Result<Vec<i64>, sqlx::Error> {
    let names: Vec<String> = SAMPLE_FACULTIES.iter().map(|(n, _)| n.to_string()).collect();
    let descriptions: Vec<String> = SAMPLE_FACULTIES.iter().map(|(_, d)| d.to_string()).collect();

    // faculty names are not unique in the schema, so skip the ones already present
    sqlx::query(
        r#"INSERT INTO faculties (name, description)
           SELECT s.name, s.description
           FROM UNNEST($1::TEXT[], $2::TEXT[]) AS s(name, description)
           WHERE NOT EXISTS (SELECT 1 FROM faculties f WHERE f.name = s.name)"#,
    )
    .bind(&names)
    .bind(&descriptions)
    .execute(&mut **tx)
    .await?;

    sqlx::query_scalar(
        r#"SELECT MIN(id) FROM faculties
           WHERE name = ANY($1::TEXT[])
           GROUP BY name
           ORDER BY MIN(id)"#,
    )
    .bind(&names)
    .fetch_all(&mut **tx)
    .await
}

/// Seeds sample categories, faculties and `num_contents` contents linked
/// round-robin to them. Existing sample categories and faculties are reused.
///
/// Writes go straight to the database; cached reads catch up once their TTL
/// expires.
pub async fn seed_catalog(db: &PgPool, num_contents: usize) -> Result<SeedSummary, sqlx::Error> {
    let start_time = Instant::now();

    println!("🌱 Starting catalog seeding...");
    println!("   - Contents: {}", num_contents);

    let mut tx = db.begin().await?;

    let category_ids = seed_categories(&mut tx).await?;
    let faculty_ids = seed_faculties(&mut tx).await?;
    println!(
        "   ✓ {} categories and {} faculties ready",
        category_ids.len(),
        faculty_ids.len()
    );

    let offset: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM h5p_contents WHERE name LIKE $1 || '%'")
            .bind(SAMPLE_CONTENT_PREFIX)
            .fetch_one(&mut *tx)
            .await?;

    let insert_start = Instant::now();
    let names: Vec<String> = (1..=num_contents)
        .map(|i| sample_content_name(offset as usize + i))
        .collect();
    let infos: Vec<String> = names
        .iter()
        .map(|name| format!("{} generated by the seeder", name))
        .collect();

    let content_ids: Vec<i64> = sqlx::query_scalar(
        r#"INSERT INTO h5p_contents (name, info)
           SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[])
           RETURNING id"#,
    )
    .bind(&names)
    .bind(&infos)
    .fetch_all(&mut *tx)
    .await?;

    let (linked_contents, linked_categories): (Vec<i64>, Vec<i64>) = content_ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| round_robin(&category_ids, i).map(|c| (*id, c)))
        .unzip();

    sqlx::query(
        r#"INSERT INTO h5p_content_categories (h5p_content_id, category_id)
           SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[])"#,
    )
    .bind(&linked_contents)
    .bind(&linked_categories)
    .execute(&mut *tx)
    .await?;

    let (linked_contents, linked_faculties): (Vec<i64>, Vec<i64>) = content_ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| round_robin(&faculty_ids, i).map(|f| (*id, f)))
        .unzip();

    sqlx::query(
        r#"INSERT INTO h5p_content_faculties (h5p_content_id, faculty_id)
           SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[])"#,
    )
    .bind(&linked_contents)
    .bind(&linked_faculties)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} contents in {:?}",
        content_ids.len(),
        insert_start.elapsed()
    );
    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());

    Ok(SeedSummary {
        categories: category_ids.len(),
        faculties: faculty_ids.len(),
        contents: content_ids.len(),
    })
}

/// Removes sample contents, then sample categories and faculties. Link rows
/// go with them through `ON DELETE CASCADE`.
pub async fn clear_seeded_data(db: &PgPool) -> Result<ClearSummary, sqlx::Error> {
    println!("🗑️  Clearing seeded data...");

    let category_names: Vec<String> = SAMPLE_CATEGORIES.iter().map(|s| s.to_string()).collect();
    let faculty_names: Vec<String> = SAMPLE_FACULTIES.iter().map(|(n, _)| n.to_string()).collect();

    let mut tx = db.begin().await?;

    let contents = sqlx::query("DELETE FROM h5p_contents WHERE name LIKE $1 || '%'")
        .bind(SAMPLE_CONTENT_PREFIX)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let categories = sqlx::query("DELETE FROM categories WHERE name = ANY($1::TEXT[])")
        .bind(&category_names)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let faculties = sqlx::query("DELETE FROM faculties WHERE name = ANY($1::TEXT[])")
        .bind(&faculty_names)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    println!(
        "✅ Removed {} contents, {} categories, {} faculties",
        contents, categories, faculties
    );

    Ok(ClearSummary {
        contents,
        categories,
        faculties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_cycles_ids() {
        let ids = [10, 20, 30];

        let picked: Vec<_> = (0..5).filter_map(|i| round_robin(&ids, i)).collect();

        assert_eq!(picked, vec![10, 20, 30, 10, 20]);
    }

    #[test]
    fn test_round_robin_empty() {
        assert_eq!(round_robin(&[], 3), None);
    }

    #[test]
    fn test_sample_content_name_uses_prefix() {
        assert_eq!(sample_content_name(7), "Sample Content 7");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_seed_then_clear(pool: PgPool) {
        let summary = seed_catalog(&pool, 7).await.unwrap();

        assert_eq!(summary.contents, 7);
        assert_eq!(summary.categories, SAMPLE_CATEGORIES.len());
        assert_eq!(summary.faculties, SAMPLE_FACULTIES.len());

        let again = seed_catalog(&pool, 2).await.unwrap();
        assert_eq!(again.faculties, SAMPLE_FACULTIES.len());

        let faculty_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM faculties")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(faculty_count as usize, SAMPLE_FACULTIES.len());

        let cleared = clear_seeded_data(&pool).await.unwrap();
        assert_eq!(cleared.contents, 9);

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM h5p_content_categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }
}
