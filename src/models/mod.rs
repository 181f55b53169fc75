//! Typed mirrors of the ERP doctypes this service reads and writes.
//!
//! Records are fetched per request and never stored locally. Link fields
//! (designation, department, template, ...) are ERP document names.

pub mod accounting;
pub mod appraisal;
pub mod asset;
pub mod employee;
pub mod leave;
pub mod payroll;
pub mod recruitment;
pub mod user;

pub use accounting::{
    Company, ExpenseClaim, ExpenseClaimDetail, InvoiceKind, InvoiceSummary, PurchaseInvoice,
    SalesInvoice,
};
pub use appraisal::{
    Appraisal, AppraisalCycle, AppraisalCycleEmployee, AppraisalTemplate, EmployeeFeedbackCriteria,
    Kra,
};
pub use asset::{Asset, AssetMovement, AssetMovementItem};
pub use employee::{Bank, BankAccount, Department, Designation, Employee};
pub use leave::{LeaveApplication, LeaveType};
pub use payroll::{PayrollEntry, SalaryDetail, SalarySlip};
pub use recruitment::{JobApplicant, JobOpening};
pub use user::{User, UserRole, UserRoleRow};
