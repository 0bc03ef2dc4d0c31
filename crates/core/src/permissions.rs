//! Role and capability resolution.
//!
//! Authentication is owned by the upstream gateway; requests arrive with a
//! pre-resolved role name. That name is interpreted exactly once, here, into
//! a set of [`Capability`] values. Business logic takes the outcome of a
//! capability check as an explicit precondition and never re-reads roles.

use crate::error::CoreError;

/// Well-known role names as sent by the gateway.
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_ACCOUNTANT: &str = "accountant";
pub const ROLE_EMPLOYEE: &str = "employee";

/// A caller's role, parsed from the gateway header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Accountant,
    Employee,
}

impl Role {
    pub fn parse(name: &str) -> Option<Role> {
        match name {
            ROLE_ADMIN => Some(Role::Admin),
            ROLE_MANAGER => Some(Role::Manager),
            ROLE_ACCOUNTANT => Some(Role::Accountant),
            ROLE_EMPLOYEE => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Manager => ROLE_MANAGER,
            Role::Accountant => ROLE_ACCOUNTANT,
            Role::Employee => ROLE_EMPLOYEE,
        }
    }
}

/// Fine-grained permissions granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, update, and deactivate shift templates.
    ManageTemplates,
    /// Create, edit, publish, archive, and cancel schedules.
    ManageSchedules,
    /// Create and cancel individual shift assignments.
    AssignShifts,
    /// Check in and out of one's own assignments.
    CheckSelfInOut,
    /// Resolve and escalate violations, review explanations and evidence.
    ReviewViolations,
    /// Submit explanations for one's own violations.
    SubmitExplanations,
    /// Approve and reject shift swap requests.
    ReviewSwaps,
    /// Calculate, approve, pay, and cancel payrolls.
    ManagePayroll,
    /// Read payroll statistics and reports.
    ViewPayrollReports,
    /// Trigger the no-show, auto-archive, and detection sweeps.
    RunSweeps,
}

/// Capabilities granted to each role.
///
/// Admin holds every capability. Employees act only on their own records;
/// the per-record ownership check is enforced by the operation itself.
pub fn capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::Admin => &[
            ManageTemplates,
            ManageSchedules,
            AssignShifts,
            CheckSelfInOut,
            ReviewViolations,
            SubmitExplanations,
            ReviewSwaps,
            ManagePayroll,
            ViewPayrollReports,
            RunSweeps,
        ],
        Role::Manager => &[
            ManageTemplates,
            ManageSchedules,
            AssignShifts,
            CheckSelfInOut,
            ReviewViolations,
            ReviewSwaps,
            ViewPayrollReports,
            RunSweeps,
        ],
        Role::Accountant => &[ManagePayroll, ViewPayrollReports],
        Role::Employee => &[CheckSelfInOut, SubmitExplanations],
    }
}

impl Role {
    pub fn has(&self, cap: Capability) -> bool {
        capabilities(*self).contains(&cap)
    }

    /// Check a capability, returning `Forbidden` when the role lacks it.
    pub fn require(&self, cap: Capability) -> Result<(), CoreError> {
        if self.has(cap) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "Role '{}' lacks the {cap:?} capability",
                self.as_str()
            )))
        }
    }
}
