//! Postgres company store.
//!
//! List-valued and nested fields live in JSONB columns; the upstream
//! identifier is guarded by a partial unique index, and
//! `create_or_merge_by_external_id` serializes concurrent creation of the
//! same identified company through a transactional upsert.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use talentgraph_common::{
    CompanyCandidate, CompanyLocation, CompanyRecord, FundingInfo, TalentGraphError,
};
use tracing::info;
use uuid::Uuid;

use super::CompanyStore;
use crate::merge::merge_candidate;

const SELECT_COLUMNS: &str = "id, external_id, name, domain, website, description, \
     employee_count, employee_range, year_founded, industries, locations, funding, \
     created_at, updated_at";

pub struct PgCompanyStore {
    pool: PgPool,
}

impl PgCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the companies schema if it does not exist. Idempotent.
    pub async fn migrate(&self) -> Result<(), TalentGraphError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS companies (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                external_id TEXT,
                name TEXT NOT NULL,
                domain TEXT,
                website TEXT,
                description TEXT,
                employee_count INTEGER,
                employee_range TEXT,
                year_founded INTEGER,
                industries JSONB NOT NULL DEFAULT '[]'::jsonb,
                locations JSONB NOT NULL DEFAULT '[]'::jsonb,
                funding JSONB,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS companies_external_id_key
                ON companies (external_id) WHERE external_id IS NOT NULL",
            "CREATE INDEX IF NOT EXISTS companies_name_lower_idx
                ON companies (lower(name) text_pattern_ops)",
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        info!("Company schema migrated");
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for PgCompanyStore {
    async fn create(
        &self,
        candidate: &CompanyCandidate,
    ) -> Result<CompanyRecord, TalentGraphError> {
        validate_name(candidate)?;
        let row = sqlx::query(&format!(
            "INSERT INTO companies
                 (external_id, name, domain, website, description, employee_count,
                  employee_range, year_founded, industries, locations, funding)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&candidate.external_id)
        .bind(&candidate.name)
        .bind(&candidate.domain)
        .bind(&candidate.website)
        .bind(&candidate.description)
        .bind(candidate.employee_count.map(|n| n as i32))
        .bind(&candidate.employee_range)
        .bind(candidate.year_founded)
        .bind(Json(&candidate.industries))
        .bind(Json(&candidate.locations))
        .bind(candidate.funding.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row_to_record(&row)
    }

    async fn update(
        &self,
        id: Uuid,
        record: &CompanyRecord,
    ) -> Result<CompanyRecord, TalentGraphError> {
        let row = sqlx::query(&format!(
            "UPDATE companies SET
                 external_id = $2, name = $3, domain = $4, website = $5,
                 description = $6, employee_count = $7, employee_range = $8,
                 year_founded = $9, industries = $10, locations = $11,
                 funding = $12, updated_at = now()
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(&record.external_id)
        .bind(&record.name)
        .bind(&record.domain)
        .bind(&record.website)
        .bind(&record.description)
        .bind(record.employee_count.map(|n| n as i32))
        .bind(&record.employee_range)
        .bind(record.year_founded)
        .bind(Json(&record.industries))
        .bind(Json(&record.locations))
        .bind(record.funding.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| TalentGraphError::Store(format!("no company with id {id}")))?;

        row_to_record(&row)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CompanyRecord>, TalentGraphError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM companies WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn search_by_name_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CompanyRecord>, TalentGraphError> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM companies
             WHERE lower(name) LIKE $1
             ORDER BY created_at, id
             LIMIT $2"
        ))
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn create_or_merge_by_external_id(
        &self,
        candidate: &CompanyCandidate,
    ) -> Result<(CompanyRecord, bool), TalentGraphError> {
        let Some(external_id) = candidate.external_id.as_deref() else {
            return self.create(candidate).await.map(|r| (r, true));
        };
        validate_name(candidate)?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO companies
                 (external_id, name, domain, website, description, employee_count,
                  employee_range, year_founded, industries, locations, funding)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (external_id) WHERE external_id IS NOT NULL DO NOTHING
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(external_id)
        .bind(&candidate.name)
        .bind(&candidate.domain)
        .bind(&candidate.website)
        .bind(&candidate.description)
        .bind(candidate.employee_count.map(|n| n as i32))
        .bind(&candidate.employee_range)
        .bind(candidate.year_founded)
        .bind(Json(&candidate.industries))
        .bind(Json(&candidate.locations))
        .bind(candidate.funding.as_ref().map(Json))
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;

        if let Some(row) = inserted {
            let record = row_to_record(&row)?;
            tx.commit().await.map_err(store_err)?;
            return Ok((record, true));
        }

        // Lost the insert race (or the row predates us): merge under a row
        // lock so the other writer's data is not clobbered.
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM companies WHERE external_id = $1 FOR UPDATE"
        ))
        .bind(external_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?
        .ok_or_else(|| {
            TalentGraphError::Store(format!(
                "company with external_id {external_id} vanished during upsert"
            ))
        })?;
        let existing = row_to_record(&row)?;
        let merged = merge_candidate(&existing, candidate);

        let row = sqlx::query(&format!(
            "UPDATE companies SET
                 name = $2, domain = $3, website = $4, description = $5,
                 employee_count = $6, employee_range = $7, year_founded = $8,
                 industries = $9, locations = $10, funding = $11, updated_at = now()
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(existing.id)
        .bind(&merged.name)
        .bind(&merged.domain)
        .bind(&merged.website)
        .bind(&merged.description)
        .bind(merged.employee_count.map(|n| n as i32))
        .bind(&merged.employee_range)
        .bind(merged.year_founded)
        .bind(Json(&merged.industries))
        .bind(Json(&merged.locations))
        .bind(merged.funding.as_ref().map(Json))
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        let record = row_to_record(&row)?;
        tx.commit().await.map_err(store_err)?;
        Ok((record, false))
    }
}

fn validate_name(candidate: &CompanyCandidate) -> Result<(), TalentGraphError> {
    if candidate.name.trim().is_empty() {
        return Err(TalentGraphError::Validation(
            "company name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn store_err(err: sqlx::Error) -> TalentGraphError {
    TalentGraphError::Store(err.to_string())
}

/// Escape LIKE wildcards so a prefix is matched literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn row_to_record(row: &PgRow) -> Result<CompanyRecord, TalentGraphError> {
    let industries: Json<Vec<String>> = row.try_get("industries").map_err(store_err)?;
    let locations: Json<Vec<CompanyLocation>> = row.try_get("locations").map_err(store_err)?;
    let funding: Option<Json<FundingInfo>> = row.try_get("funding").map_err(store_err)?;
    let employee_count: Option<i32> = row.try_get("employee_count").map_err(store_err)?;

    Ok(CompanyRecord {
        id: row.try_get("id").map_err(store_err)?,
        external_id: row.try_get("external_id").map_err(store_err)?,
        name: row.try_get("name").map_err(store_err)?,
        domain: row.try_get("domain").map_err(store_err)?,
        website: row.try_get("website").map_err(store_err)?,
        description: row.try_get("description").map_err(store_err)?,
        employee_count: employee_count.and_then(|n| u32::try_from(n).ok()),
        employee_range: row.try_get("employee_range").map_err(store_err)?,
        year_founded: row.try_get("year_founded").map_err(store_err)?,
        industries: industries.0,
        locations: locations.0,
        funding: funding.map(|f| f.0),
        created_at: row.try_get("created_at").map_err(store_err)?,
        updated_at: row.try_get("updated_at").map_err(store_err)?,
    })
}
