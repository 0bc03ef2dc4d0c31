pub mod absence;
pub mod audit_log;
pub mod employee;
pub mod explanation;
pub mod payroll;
pub mod shift_assignment;
pub mod shift_schedule;
pub mod shift_template;
pub mod swap;
pub mod violation;
