//! PostgreSQL-backed stock store.

use async_trait::async_trait;
use common::{Money, OrderId, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{Result, StockError};
use crate::record::ProductRecord;
use crate::store::{DebitedLine, StockDebit, StockStore};

/// PostgreSQL stock store.
///
/// Every conditional update is expressed as a single `UPDATE ... WHERE`
/// statement so the availability check and the write are one atomic step in
/// the database; multi-line debits run inside one transaction.
#[derive(Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Creates a new PostgreSQL stock store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_record(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            name: row.try_get("name")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
        })
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    async fn insert_product(&self, record: ProductRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (product_id, name, unit_price_cents, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(record.product_id.as_str())
        .bind(&record.name)
        .bind(record.unit_price.cents())
        .bind(record.quantity as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StockError::ProductExists(record.product_id));
        }
        Ok(())
    }

    async fn get(&self, product_id: &ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "SELECT product_id, name, unit_price_cents, quantity FROM products WHERE product_id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<u32> {
        // Arithmetic in BIGINT so the full delta range reaches the condition;
        // a result the INTEGER column cannot hold fails the assignment cast.
        let row = sqlx::query(
            r#"
            UPDATE products
            SET quantity = (quantity + $2::BIGINT)::INTEGER
            WHERE product_id = $1 AND quantity + $2::BIGINT >= 0
            RETURNING quantity
            "#,
        )
        .bind(product_id.as_str())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.try_get::<i32, _>("quantity")? as u32),
            // The update matched nothing: missing product or underflow.
            None => match self.get(product_id).await? {
                Some(record) => Err(StockError::NegativeStock {
                    product_id: product_id.clone(),
                    available: record.quantity,
                    delta,
                }),
                None => Err(StockError::ProductNotFound(product_id.clone())),
            },
        }
    }

    async fn debit_all(&self, lines: &[StockDebit]) -> Result<Vec<DebitedLine>> {
        let mut tx = self.pool.begin().await?;
        let mut debited = Vec::with_capacity(lines.len());

        for line in lines {
            let row = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - $2
                WHERE product_id = $1 AND quantity >= $2
                RETURNING unit_price_cents
                "#,
            )
            .bind(line.product_id.as_str())
            .bind(line.quantity as i32)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(row) => debited.push(DebitedLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                }),
                None => {
                    // Distinguish the failure, then drop the transaction so
                    // every prior line's debit rolls back.
                    let available: Option<i32> =
                        sqlx::query_scalar("SELECT quantity FROM products WHERE product_id = $1")
                            .bind(line.product_id.as_str())
                            .fetch_optional(&mut *tx)
                            .await?;

                    return Err(match available {
                        Some(available) => StockError::InsufficientStock {
                            product_id: line.product_id.clone(),
                            available: available as u32,
                            requested: line.quantity,
                        },
                        None => StockError::ProductNotFound(line.product_id.clone()),
                    });
                }
            }
        }

        tx.commit().await?;
        metrics::counter!("stock_debits_total").increment(debited.len() as u64);
        Ok(debited)
    }

    async fn restore_all(&self, lines: &[StockDebit]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for line in lines {
            let result = sqlx::query(
                "UPDATE products SET quantity = quantity + $2 WHERE product_id = $1",
            )
            .bind(line.product_id.as_str())
            .bind(line.quantity as i32)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::warn!(product_id = %line.product_id, "restore skipped, product gone");
            }
        }

        tx.commit().await?;
        metrics::counter!("stock_restores_total").increment(lines.len() as u64);
        Ok(())
    }

    async fn commit_order(&self, order_id: OrderId) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO stock_commits (order_id) VALUES ($1) ON CONFLICT (order_id) DO NOTHING",
        )
        .bind(order_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_committed(&self, order_id: OrderId) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_commits WHERE order_id = $1")
                .bind(order_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }
}
