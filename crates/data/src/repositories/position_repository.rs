//! Position repository for observation rows.

use crate::store::{PositionPatch, PositionQuery, SortOrder};
use chrono::{DateTime, Utc};
use lpscope_domain::{
    CanonicalKey, CaptureId, Observation, ObservationId, PositionFields, PositionRowId, Section,
    SourceKind, StoredPosition,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::sync::Arc;

fn decode_error(err: lpscope_domain::DomainError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

/// Builds a stored position from a `positions` row.
fn position_from_row(row: &PgRow) -> Result<StoredPosition, sqlx::Error> {
    let protocol_key: String = row.try_get("protocol_key")?;
    let pair: String = row.try_get("pair")?;
    let section: String = row.try_get("section")?;
    let source: String = row.try_get("source")?;
    let captured_at: DateTime<Utc> = row.try_get("captured_at")?;

    let fields = PositionFields {
        balance: row.try_get("balance")?,
        pending_yield: row.try_get("pending_yield")?,
        apy: row.try_get("apy")?,
        range_min: row.try_get("range_min")?,
        range_max: row.try_get("range_max")?,
        current_price: row.try_get("current_price")?,
        token0_amount: row.try_get("token0_amount")?,
        token1_amount: row.try_get("token1_amount")?,
        token0_value: row.try_get("token0_value")?,
        token1_value: row.try_get("token1_value")?,
        token0_percentage: row.try_get("token0_percentage")?,
        token1_percentage: row.try_get("token1_percentage")?,
    };

    let observation = Observation {
        id: ObservationId(row.try_get("observation_id")?),
        protocol: row.try_get("protocol")?,
        raw_pair_label: row.try_get("raw_pair_label")?,
        captured_at,
        section: section.parse::<Section>().map_err(decode_error)?,
        token0: row.try_get("token0")?,
        token1: row.try_get("token1")?,
        fields,
        source: source.parse::<SourceKind>().map_err(decode_error)?,
    };

    Ok(StoredPosition {
        id: PositionRowId(row.try_get("id")?),
        capture_id: CaptureId(row.try_get("capture_id")?),
        key: CanonicalKey::new(&protocol_key, pair),
        observation,
    })
}

/// Appends the WHERE clause for a query's filters.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PositionQuery) {
    builder.push(" WHERE TRUE");
    if let Some(capture_id) = query.capture_id {
        builder.push(" AND capture_id = ").push_bind(capture_id.0);
    }
    if let Some(key) = &query.key {
        builder
            .push(" AND protocol_key = ")
            .push_bind(key.protocol().to_string())
            .push(" AND pair = ")
            .push_bind(key.pair().to_string());
    }
    if let Some(protocol) = &query.protocol {
        builder
            .push(" AND protocol_key = ")
            .push_bind(CanonicalKey::fold_protocol(protocol));
    }
}

/// Repository for position rows.
#[derive(Clone)]
pub struct PositionRepository {
    pool: Arc<PgPool>,
}

impl PositionRepository {
    /// Creates a new PositionRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a position row.
    ///
    /// # Errors
    /// Returns an error if the query fails or the capture does not exist.
    pub async fn insert(&self, position: &StoredPosition) -> Result<(), sqlx::Error> {
        let obs = &position.observation;
        let f = &obs.fields;
        sqlx::query(
            r#"
            INSERT INTO positions (id, capture_id, observation_id, source, protocol,
                                   protocol_key, pair, raw_pair_label, section, token0, token1,
                                   captured_at, balance, pending_yield, apy, range_min,
                                   range_max, current_price, token0_amount, token1_amount,
                                   token0_value, token1_value, token0_percentage,
                                   token1_percentage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(position.id.0)
        .bind(position.capture_id.0)
        .bind(obs.id.0)
        .bind(obs.source.as_str())
        .bind(&obs.protocol)
        .bind(position.key.protocol())
        .bind(position.key.pair())
        .bind(&obs.raw_pair_label)
        .bind(obs.section.as_str())
        .bind(&obs.token0)
        .bind(&obs.token1)
        .bind(obs.captured_at)
        .bind(f.balance)
        .bind(f.pending_yield)
        .bind(f.apy)
        .bind(f.range_min)
        .bind(f.range_max)
        .bind(f.current_price)
        .bind(f.token0_amount)
        .bind(f.token1_amount)
        .bind(f.token0_value)
        .bind(f.token1_value)
        .bind(f.token0_percentage)
        .bind(f.token1_percentage)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// Applies a patch to one row, leaving unset columns untouched.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn update(&self, id: PositionRowId, patch: &PositionPatch) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE positions SET
                token0 = COALESCE($2, token0),
                token1 = COALESCE($3, token1),
                token0_percentage = COALESCE($4, token0_percentage),
                token1_percentage = COALESCE($5, token1_percentage),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&patch.token0)
        .bind(&patch.token1)
        .bind(patch.token0_percentage)
        .bind(patch.token1_percentage)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Selects rows matching a query.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn select(&self, query: &PositionQuery) -> Result<Vec<StoredPosition>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM positions");
        push_filters(&mut builder, query);
        builder.push(match query.order {
            SortOrder::Ascending => " ORDER BY captured_at ASC, id ASC",
            SortOrder::Descending => " ORDER BY captured_at DESC, id ASC",
        });
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(self.pool.as_ref()).await?;
        rows.iter().map(position_from_row).collect()
    }

    /// Deletes rows matching a query's filters.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn delete(&self, query: &PositionQuery) -> Result<u64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM positions");
        push_filters(&mut builder, query);
        let result = builder.build().execute(self.pool.as_ref()).await?;
        Ok(result.rows_affected())
    }
}
