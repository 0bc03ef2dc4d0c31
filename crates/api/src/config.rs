use staffhub_core::violation::DetectionPolicy;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Attendance policy knobs used by detection and the sweeps.
    pub attendance: AttendancePolicy,
}

/// Tolerances and sweep windows for the attendance subsystem.
#[derive(Debug, Clone)]
pub struct AttendancePolicy {
    /// Minutes of lateness tolerated before a LATE violation (default: `10`).
    pub late_tolerance_minutes: i64,
    /// Minutes of early departure tolerated (default: `10`).
    pub early_leave_tolerance_minutes: i64,
    /// Minutes past planned end before a missing check-in becomes NO_SHOW
    /// (default: `60`).
    pub no_show_grace_minutes: i64,
    /// Days without an explanation before a violation counts as overdue
    /// (default: `3`).
    pub explanation_sla_days: i64,
    /// Days past a schedule's end date before auto-archive (default: `30`).
    pub auto_archive_days: i64,
    /// Days of inactivity before a DRAFT schedule is cleaned up
    /// (default: `90`).
    pub draft_cleanup_days: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `LATE_TOLERANCE_MINUTES`       | `10`                    |
    /// | `EARLY_LEAVE_TOLERANCE_MINUTES`| `10`                    |
    /// | `NO_SHOW_GRACE_MINUTES`        | `60`                    |
    /// | `EXPLANATION_SLA_DAYS`         | `3`                     |
    /// | `AUTO_ARCHIVE_DAYS`            | `30`                    |
    /// | `DRAFT_CLEANUP_DAYS`           | `90`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            attendance: AttendancePolicy::from_env(),
        }
    }
}

impl AttendancePolicy {
    pub fn from_env() -> Self {
        fn env_i64(name: &str, default: i64) -> i64 {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        Self {
            late_tolerance_minutes: env_i64("LATE_TOLERANCE_MINUTES", 10),
            early_leave_tolerance_minutes: env_i64("EARLY_LEAVE_TOLERANCE_MINUTES", 10),
            no_show_grace_minutes: env_i64("NO_SHOW_GRACE_MINUTES", 60),
            explanation_sla_days: env_i64("EXPLANATION_SLA_DAYS", 3),
            auto_archive_days: env_i64("AUTO_ARCHIVE_DAYS", 30),
            draft_cleanup_days: env_i64("DRAFT_CLEANUP_DAYS", 90),
        }
    }

    /// The detection policy these knobs describe.
    pub fn detection_policy(&self) -> DetectionPolicy {
        DetectionPolicy {
            late_tolerance_minutes: self.late_tolerance_minutes,
            early_leave_tolerance_minutes: self.early_leave_tolerance_minutes,
            ..DetectionPolicy::default()
        }
    }
}
