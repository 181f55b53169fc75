pub mod accounting;
pub mod appraisals;
pub mod assets;
pub mod auth;
pub mod common;
pub mod dashboard;
pub mod employees;
pub mod health;
pub mod leaves;
pub mod payroll;
pub mod recruitment;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    erp::ErpClient,
    services::{
        accounting::AccountingService, appraisals::AppraisalService, assets::AssetService,
        auth::AuthService, bank_accounts::BankAccountService, company::CompanyService,
        dashboard::DashboardService, employees::EmployeeService, leaves::LeaveService,
        payroll::PayrollService, recruitment::RecruitmentService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers. All of them share one ERP client.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub dashboard: Arc<DashboardService>,
    pub employees: Arc<EmployeeService>,
    pub bank_accounts: Arc<BankAccountService>,
    pub leaves: Arc<LeaveService>,
    pub payroll: Arc<PayrollService>,
    pub accounting: Arc<AccountingService>,
    pub company: Arc<CompanyService>,
    pub recruitment: Arc<RecruitmentService>,
    pub appraisals: Arc<AppraisalService>,
    pub assets: Arc<AssetService>,
}

impl AppServices {
    pub fn new(erp: &ErpClient, config: &AppConfig) -> Self {
        let default_company = config.default_company().map(str::to_string);

        Self {
            auth: Arc::new(AuthService::new(erp.clone())),
            dashboard: Arc::new(DashboardService::new(erp.clone())),
            employees: Arc::new(EmployeeService::new(erp.clone(), default_company.clone())),
            bank_accounts: Arc::new(BankAccountService::new(erp.clone())),
            leaves: Arc::new(LeaveService::new(erp.clone())),
            payroll: Arc::new(PayrollService::new(erp.clone(), config.payroll.clone())),
            accounting: Arc::new(AccountingService::new(erp.clone(), default_company.clone())),
            company: Arc::new(CompanyService::new(erp.clone())),
            recruitment: Arc::new(RecruitmentService::new(erp.clone(), default_company.clone())),
            appraisals: Arc::new(AppraisalService::new(erp.clone(), default_company)),
            assets: Arc::new(AssetService::new(erp.clone())),
        }
    }
}
