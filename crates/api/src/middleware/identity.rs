//! Identity extractor for Axum handlers.
//!
//! Authentication lives in the upstream gateway, which forwards the
//! resolved identity in `x-user-id` and `x-user-role` headers. The role is
//! interpreted into capabilities exactly once, here; handlers pass the
//! check's outcome into core operations instead of re-reading roles.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use staffhub_core::error::CoreError;
use staffhub_core::permissions::{Capability, Role};
use staffhub_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// The caller identity resolved by the gateway.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     auth.require(Capability::ManageSchedules)?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
}

impl AuthUser {
    /// Check a capability, rejecting with 403 when the role lacks it.
    pub fn require(&self, cap: Capability) -> Result<(), AppError> {
        self.role.require(cap).map_err(AppError::Core)
    }

    /// Allow acting on `owner_id`'s record: the owner themselves, or any
    /// caller holding `delegate`.
    pub fn require_self_or(&self, owner_id: DbId, delegate: Capability) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            self.require(delegate)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id: DbId = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing or malformed x-user-id header".into(),
                ))
            })?;

        let role_name = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing x-user-role header".into(),
                ))
            })?;

        let role = Role::parse(role_name).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Unknown role '{role_name}'"
            )))
        })?;

        Ok(AuthUser { user_id, role })
    }
}
