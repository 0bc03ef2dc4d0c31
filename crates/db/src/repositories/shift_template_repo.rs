//! Repository for the `shift_templates` table.

use chrono::NaiveTime;
use sqlx::PgPool;
use staffhub_core::types::DbId;

use crate::models::shift_template::{CreateShiftTemplate, ShiftTemplate, UpdateShiftTemplate};

const TEMPLATE_COLUMNS: &str = "\
    id, name, description, start_time, end_time, has_break, break_minutes, \
    overtime_eligible, is_active, sort_order, created_at, updated_at";

/// Provides CRUD operations for shift templates.
pub struct ShiftTemplateRepo;

impl ShiftTemplateRepo {
    /// Create a new template.
    pub async fn create(
        pool: &PgPool,
        input: &CreateShiftTemplate,
    ) -> Result<ShiftTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO shift_templates \
                 (name, description, start_time, end_time, has_break, break_minutes, \
                  overtime_eligible, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 0)) \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftTemplate>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.has_break)
            .bind(input.break_minutes)
            .bind(input.overtime_eligible)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ShiftTemplate>, sqlx::Error> {
        let query = format!("SELECT {TEMPLATE_COLUMNS} FROM shift_templates WHERE id = $1");
        sqlx::query_as::<_, ShiftTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active templates in sort order.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<ShiftTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM shift_templates \
             WHERE is_active = TRUE ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, ShiftTemplate>(&query).fetch_all(pool).await
    }

    /// List every template, active or not.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ShiftTemplate>, sqlx::Error> {
        let query =
            format!("SELECT {TEMPLATE_COLUMNS} FROM shift_templates ORDER BY sort_order, id");
        sqlx::query_as::<_, ShiftTemplate>(&query).fetch_all(pool).await
    }

    /// List active overtime-eligible templates.
    pub async fn list_overtime_eligible(pool: &PgPool) -> Result<Vec<ShiftTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM shift_templates \
             WHERE is_active = TRUE AND overtime_eligible = TRUE \
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, ShiftTemplate>(&query).fetch_all(pool).await
    }

    /// List active templates whose window overlaps `[start, end)`.
    pub async fn list_overlapping(
        pool: &PgPool,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<ShiftTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM shift_templates \
             WHERE is_active = TRUE AND start_time < $2 AND $1 < end_time \
             ORDER BY start_time, id"
        );
        sqlx::query_as::<_, ShiftTemplate>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Update a template's settings. Returns the updated row, or `None` if
    /// not found.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateShiftTemplate,
    ) -> Result<Option<ShiftTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_templates SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 start_time = COALESCE($4, start_time), \
                 end_time = COALESCE($5, end_time), \
                 has_break = COALESCE($6, has_break), \
                 break_minutes = COALESCE($7, break_minutes), \
                 overtime_eligible = COALESCE($8, overtime_eligible), \
                 sort_order = COALESCE($9, sort_order), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftTemplate>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.has_break)
            .bind(input.break_minutes)
            .bind(input.overtime_eligible)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a template. A visibility flag only: existing assignments
    /// keep their denormalised planned windows.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<Option<ShiftTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE shift_templates SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        sqlx::query_as::<_, ShiftTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
