use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    domain::{EnergyRecordRow, MonthlyEnergyRecord, RecordDraft},
    error::StoreError,
};

const RECORD_COLUMNS: &str = r#"
    id::text AS id,
    year,
    month,
    consumption_kwh,
    amount_billed,
    amount_paid,
    tariff_flag,
    unit_price_flag,
    flag_amount_billed,
    unit_price_energy,
    unit_price_distribution,
    levy_billed,
    levy_collected,
    levy_customer_count,
    delinquency_rate,
    notes,
    updated_at
"#;

fn into_records(rows: Vec<EnergyRecordRow>) -> Result<Vec<MonthlyEnergyRecord>, StoreError> {
    rows.into_iter().map(MonthlyEnergyRecord::try_from).collect()
}

/// Map a write failure, turning the `(year, month)` unique violation into a
/// duplicate-period error.
fn map_write_error(err: sqlx::Error, draft: &RecordDraft) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicatePeriod {
                year: draft.period.year,
                month: draft.period.month,
            };
        }
    }
    StoreError::Backend(err)
}

/// Fetch records in chronological order, optionally for a single year.
pub async fn list_records(pool: &PgPool, year: Option<i32>) -> Result<Vec<MonthlyEnergyRecord>, StoreError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {RECORD_COLUMNS} FROM energy_records"));
    if let Some(year) = year {
        builder.push(" WHERE year = ").push_bind(year);
    }
    builder.push(" ORDER BY year, month");

    let rows = builder
        .build_query_as::<EnergyRecordRow>()
        .fetch_all(pool)
        .await?;

    into_records(rows)
}

/// The most recent billing month, if any.
pub async fn latest_record(pool: &PgPool) -> Result<Option<MonthlyEnergyRecord>, StoreError> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM energy_records ORDER BY year DESC, month DESC LIMIT 1");
    let row = sqlx::query_as::<_, EnergyRecordRow>(&sql)
        .fetch_optional(pool)
        .await?;

    row.map(MonthlyEnergyRecord::try_from).transpose()
}

/// Distinct years with at least one record, newest first.
pub async fn available_years(pool: &PgPool) -> Result<Vec<i32>, StoreError> {
    let years = sqlx::query_scalar::<_, i32>("SELECT DISTINCT year FROM energy_records ORDER BY year DESC")
        .fetch_all(pool)
        .await?;

    Ok(years)
}

pub async fn insert_record(pool: &PgPool, draft: &RecordDraft) -> Result<MonthlyEnergyRecord, StoreError> {
    let sql = format!(
        r#"
        INSERT INTO energy_records (
            year, month, consumption_kwh, amount_billed, amount_paid,
            tariff_flag, unit_price_flag, flag_amount_billed,
            unit_price_energy, unit_price_distribution,
            levy_billed, levy_collected, levy_customer_count,
            delinquency_rate, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {RECORD_COLUMNS}
        "#
    );

    let row = bind_draft(sqlx::query_as::<_, EnergyRecordRow>(&sql), draft)
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, draft))?;

    MonthlyEnergyRecord::try_from(row)
}

pub async fn update_record(
    pool: &PgPool,
    id: &str,
    draft: &RecordDraft,
) -> Result<MonthlyEnergyRecord, StoreError> {
    let sql = format!(
        r#"
        UPDATE energy_records SET
            year = $1,
            month = $2,
            consumption_kwh = $3,
            amount_billed = $4,
            amount_paid = $5,
            tariff_flag = $6,
            unit_price_flag = $7,
            flag_amount_billed = $8,
            unit_price_energy = $9,
            unit_price_distribution = $10,
            levy_billed = $11,
            levy_collected = $12,
            levy_customer_count = $13,
            delinquency_rate = $14,
            notes = $15,
            updated_at = now()
        WHERE id::text = $16
        RETURNING {RECORD_COLUMNS}
        "#
    );

    let row = bind_draft(sqlx::query_as::<_, EnergyRecordRow>(&sql), draft)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_write_error(e, draft))?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    MonthlyEnergyRecord::try_from(row)
}

pub async fn delete_record(pool: &PgPool, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM energy_records WHERE id::text = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    Ok(())
}

type RowQuery<'q> = sqlx::query::QueryAs<'q, Postgres, EnergyRecordRow, sqlx::postgres::PgArguments>;

/// Bind the fifteen draft columns in `$1..$15` order.
fn bind_draft<'q>(query: RowQuery<'q>, draft: &'q RecordDraft) -> RowQuery<'q> {
    query
        .bind(draft.period.year)
        .bind(draft.period.month as i32)
        .bind(draft.consumption_kwh)
        .bind(draft.amount_billed)
        .bind(draft.amount_paid)
        .bind(draft.tariff_flag.kind().code())
        .bind(draft.tariff_flag.stored_unit_price())
        .bind(draft.flag_amount_billed)
        .bind(draft.unit_price_energy)
        .bind(draft.unit_price_distribution)
        .bind(draft.levy.billed)
        .bind(draft.levy.collected)
        .bind(draft.levy.customer_count)
        .bind(draft.delinquency_rate)
        .bind(draft.notes.as_deref())
}
