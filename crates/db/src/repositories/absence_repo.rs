//! Read-only repository for the `approved_absences` table.
//!
//! The absence/leave collaborator owns writes; this service only consumes
//! approved ranges for conflict detection.

use chrono::NaiveDate;
use sqlx::PgPool;
use staffhub_core::types::DbId;

use crate::models::absence::ApprovedAbsence;

const ABSENCE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, absence_type, created_at";

pub struct AbsenceRepo;

impl AbsenceRepo {
    /// List approved absences covering `date` for an employee.
    pub async fn list_covering(
        pool: &PgPool,
        employee_id: DbId,
        date: NaiveDate,
    ) -> Result<Vec<ApprovedAbsence>, sqlx::Error> {
        let query = format!(
            "SELECT {ABSENCE_COLUMNS} FROM approved_absences \
             WHERE employee_id = $1 AND start_date <= $2 AND end_date >= $2 \
             ORDER BY start_date"
        );
        sqlx::query_as::<_, ApprovedAbsence>(&query)
            .bind(employee_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }
}
