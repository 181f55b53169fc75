use serde::Serialize;
use tracing::{instrument, warn};

use crate::{
    erp::{Doctype, ErpClient, ErpResult, ListQuery},
    models::{Department, Employee, JobOpening, LeaveApplication, SalarySlip},
};

/// HR landing-page summary. Every section is optional in effect: a section
/// the ERP could not serve is reported empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HrDashboard {
    pub active_employees: u64,
    pub pending_leaves: Vec<LeaveApplication>,
    pub open_job_openings: u64,
    pub draft_salary_slips: u64,
    pub departments: Vec<Department>,
    /// Names of the sections that failed to load.
    pub unavailable: Vec<&'static str>,
}

#[derive(Clone)]
pub struct DashboardService {
    erp: ErpClient,
}

impl DashboardService {
    pub fn new(erp: ErpClient) -> Self {
        Self { erp }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> HrDashboard {
        let active = ListQuery::new().eq("status", "Active");
        let open = ListQuery::new().eq("status", "Open");
        let drafts = ListQuery::new().eq("docstatus", 0);

        let (employees, leaves, openings, slips, departments) = futures::join!(
            self.erp.count(Employee::DOCTYPE, &active),
            self.erp.get_list::<LeaveApplication>(
                open.clone().order_by("from_date asc").limit(10)
            ),
            self.erp.count(JobOpening::DOCTYPE, &open),
            self.erp.count(SalarySlip::DOCTYPE, &drafts),
            self.erp
                .get_list::<Department>(ListQuery::new().order_by("department_name asc").all()),
        );

        let mut unavailable = Vec::new();
        HrDashboard {
            active_employees: section("active_employees", employees, &mut unavailable),
            pending_leaves: section("pending_leaves", leaves, &mut unavailable),
            open_job_openings: section("open_job_openings", openings, &mut unavailable),
            draft_salary_slips: section("draft_salary_slips", slips, &mut unavailable),
            departments: section("departments", departments, &mut unavailable),
            unavailable,
        }
    }
}

fn section<T: Default>(
    name: &'static str,
    result: ErpResult<T>,
    failed: &mut Vec<&'static str>,
) -> T {
    result.unwrap_or_else(|err| {
        warn!(section = name, error = %err, "dashboard section unavailable");
        failed.push(name);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErpConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn failed_sections_are_empty_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/method/frappe.client.get_count"))
            .and(query_param("doctype", "Employee"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": 42 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/method/frappe.client.get_count"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Leave%20Application"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "name": "HR-LAP-0001", "employee": "EMP-1", "status": "Open" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Department"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let erp = ErpClient::new(&ErpConfig {
            base_url: server.uri(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            request_timeout_secs: 5,
        })
        .unwrap();
        let dashboard = DashboardService::new(erp).summary().await;

        assert_eq!(dashboard.active_employees, 42);
        assert_eq!(dashboard.pending_leaves.len(), 1);
        assert_eq!(dashboard.open_job_openings, 0);
        assert!(dashboard.departments.is_empty());
        assert!(dashboard.unavailable.contains(&"departments"));
        assert!(dashboard.unavailable.contains(&"draft_salary_slips"));
        assert!(!dashboard.unavailable.contains(&"active_employees"));
    }
}
