//! Read-only repository for the `employees` directory table.

use sqlx::PgPool;
use staffhub_core::types::DbId;

use crate::models::employee::Employee;

const EMPLOYEE_COLUMNS: &str =
    "id, display_name, department, is_active, created_at, updated_at";

pub struct EmployeeRepo;

impl EmployeeRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active employees, the population for bulk payroll runs.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE is_active = TRUE ORDER BY id"
        );
        sqlx::query_as::<_, Employee>(&query).fetch_all(pool).await
    }
}
