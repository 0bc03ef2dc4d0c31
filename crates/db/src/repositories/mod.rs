mod absence_repo;
mod audit_log_repo;
mod employee_repo;
mod evidence_repo;
mod explanation_repo;
mod payroll_repo;
mod shift_assignment_repo;
mod shift_schedule_repo;
mod shift_template_repo;
mod swap_repo;
mod violation_repo;

pub use absence_repo::AbsenceRepo;
pub use audit_log_repo::AuditLogRepo;
pub use employee_repo::EmployeeRepo;
pub use evidence_repo::EvidenceRepo;
pub use explanation_repo::{ExplanationRepo, ReviewOutcome, SubmitOutcome};
pub use payroll_repo::{CalcOutcome, PayrollRepo};
pub use shift_assignment_repo::{CreateOutcome, ShiftAssignmentRepo};
pub use shift_schedule_repo::ShiftScheduleRepo;
pub use shift_template_repo::ShiftTemplateRepo;
pub use swap_repo::{SwapDecisionOutcome, SwapRepo};
pub use violation_repo::ViolationRepo;
