use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewProduct, Product, ProductChanges};

const COLUMNS: &str = "id, name, price, stock, created_at, updated_at";

/// Persistence seam for products. Handlers only ever see this trait.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, fields: NewProduct) -> StoreResult<Product>;

    /// Every product, in insertion order.
    async fn find_all(&self) -> StoreResult<Vec<Product>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Product>;

    /// Overwrites only the supplied fields and refreshes `updated_at`.
    async fn update_by_id(&self, id: i64, changes: ProductChanges) -> StoreResult<Product>;

    /// Number of rows removed, 0 or 1.
    async fn delete_by_id(&self, id: i64) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}

#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn create(&self, fields: NewProduct) -> StoreResult<Product> {
        let now = Utc::now();
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, price, stock, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_all(&self) -> StoreResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(products)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Product> {
        sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_by_id(&self, id: i64, changes: ProductChanges) -> StoreResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET name       = COALESCE($1, name),
                 price      = COALESCE($2, price),
                 stock      = COALESCE($3, stock),
                 updated_at = $4
             WHERE id = $5
             RETURNING {COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.price)
        .bind(changes.stock)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        super::ping(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn lamp() -> NewProduct {
        NewProduct {
            name: "Desk Lamp".to_string(),
            price: 19.5,
            stock: 4,
        }
    }

    async fn repo() -> SqliteProductRepository {
        SqliteProductRepository::new(memory_pool().await)
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let repo = repo().await;
        let product = repo.create(lamp()).await.unwrap();

        assert!(product.id > 0);
        assert_eq!(product.name, "Desk Lamp");
        assert_eq!(product.price, 19.5);
        assert_eq!(product.stock, 4);
        assert_eq!(product.created_at, product.updated_at);
    }

    #[tokio::test]
    async fn duplicate_name_is_a_unique_violation() {
        let repo = repo().await;
        repo.create(lamp()).await.unwrap();

        let err = repo.create(lamp()).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn names_differing_only_in_case_are_distinct() {
        let repo = repo().await;
        repo.create(lamp()).await.unwrap();

        let mut shouty = lamp();
        shouty.name = "DESK LAMP".to_string();
        assert!(repo.create(shouty).await.is_ok());
    }

    #[tokio::test]
    async fn check_constraints_back_up_the_validator() {
        let repo = repo().await;
        let mut bad = lamp();
        bad.price = -1.0;

        match repo.create(bad).await.unwrap_err() {
            StoreError::ValidationFailure(messages) => {
                assert_eq!(messages, vec!["Price cannot be negative.".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut short = lamp();
        short.name = "X".to_string();
        assert!(matches!(
            repo.create(short).await.unwrap_err(),
            StoreError::ValidationFailure(_)
        ));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let repo = repo().await;
        for name in ["Zebra Mug", "Alpha Pen", "Mango Jam"] {
            repo.create(NewProduct {
                name: name.to_string(),
                price: 1.0,
                stock: 1,
            })
            .await
            .unwrap();
        }

        let names: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Zebra Mug", "Alpha Pen", "Mango Jam"]);
    }

    #[tokio::test]
    async fn find_by_id_reports_missing_rows() {
        let repo = repo().await;
        let created = repo.create(lamp()).await.unwrap();

        assert_eq!(repo.find_by_id(created.id).await.unwrap(), created);
        assert!(matches!(
            repo.find_by_id(created.id + 100).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_merges_supplied_fields_only() {
        let repo = repo().await;
        let created = repo.create(lamp()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = repo
            .update_by_id(
                created.id,
                ProductChanges {
                    price: Some(9.99),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.stock, created.stock);
        assert_eq!(updated.price, 9.99);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn update_to_taken_name_conflicts() {
        let repo = repo().await;
        repo.create(lamp()).await.unwrap();
        let other = repo
            .create(NewProduct {
                name: "Floor Lamp".to_string(),
                price: 40.0,
                stock: 2,
            })
            .await
            .unwrap();

        let err = repo
            .update_by_id(
                other.id,
                ProductChanges {
                    name: Some("Desk Lamp".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let repo = repo().await;
        let err = repo
            .update_by_id(
                42,
                ProductChanges {
                    stock: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn delete_reports_affected_rows() {
        let repo = repo().await;
        let created = repo.create(lamp()).await.unwrap();

        assert_eq!(repo.delete_by_id(created.id).await.unwrap(), 1);
        assert_eq!(repo.delete_by_id(created.id).await.unwrap(), 0);
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = repo().await;
        let first = repo.create(lamp()).await.unwrap();
        repo.delete_by_id(first.id).await.unwrap();

        let second = repo.create(lamp()).await.unwrap();
        assert!(second.id > first.id);
    }
}
