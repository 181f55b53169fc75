use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{non_blank, parse_date};
use crate::{
    erp::{Doctype, ErpClient, ListQuery},
    errors::ServiceError,
    models::{
        Appraisal, AppraisalCycle, AppraisalTemplate, Designation, EmployeeFeedbackCriteria, Kra,
    },
};

pub const DEFAULT_TEMPLATE: &str = "Standard Appraisal";

/// Key result areas of the default template with their weightage.
const KRAS: [(&str, f64); 3] = [
    ("Work Quality", 34.0),
    ("Timeliness", 33.0),
    ("Collaboration", 33.0),
];

/// Feedback criteria of the default template with their weightage.
const CRITERIA: [(&str, f64); 3] = [
    ("Communication", 34.0),
    ("Ownership", 33.0),
    ("Problem Solving", 33.0),
];

#[derive(Debug, Deserialize, Validate)]
pub struct NewAppraisalCycle {
    #[serde(default)]
    #[validate(length(min = 1, message = "cycle_name is required"))]
    pub cycle_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "start_date is required"))]
    pub start_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "end_date is required"))]
    pub end_date: String,
    pub company: Option<String>,
    pub kra_evaluation_method: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppraisalFilter {
    pub cycle: Option<String>,
    pub employee: Option<String>,
}

/// Outcome of starting an appraisal cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleInitiation {
    pub cycle: String,
    pub appraisees: usize,
    /// Appraisee rows that had no template and got the default one.
    pub templates_assigned: usize,
    pub designations_linked: Vec<String>,
    /// Records created while bootstrapping the default template,
    /// as `"<Doctype>: <name>"`.
    pub bootstrapped: Vec<String>,
    /// Whatever `create_appraisals` reported back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

#[derive(Clone)]
pub struct AppraisalService {
    erp: ErpClient,
    default_company: Option<String>,
}

impl AppraisalService {
    pub fn new(erp: ErpClient, default_company: Option<String>) -> Self {
        Self {
            erp,
            default_company,
        }
    }

    pub async fn cycles(&self) -> Result<Vec<AppraisalCycle>, ServiceError> {
        Ok(self
            .erp
            .get_list(ListQuery::new().order_by("start_date desc").all())
            .await?)
    }

    #[instrument(skip(self, input), fields(cycle = %input.cycle_name))]
    pub async fn create_cycle(
        &self,
        input: NewAppraisalCycle,
    ) -> Result<AppraisalCycle, ServiceError> {
        let start = parse_date("start_date", &input.start_date)?;
        let end = parse_date("end_date", &input.end_date)?;
        if start > end {
            return Err(ServiceError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let mut body = json!({
            "cycle_name": input.cycle_name.trim(),
            "start_date": start,
            "end_date": end,
            "kra_evaluation_method": non_blank(input.kra_evaluation_method.as_deref())
                .unwrap_or("Manual Rating"),
        });
        if let Some(company) = non_blank(input.company.as_deref()).or(self.default_company.as_deref())
        {
            body["company"] = json!(company);
        }
        if let Some(description) = non_blank(input.description.as_deref()) {
            body["description"] = json!(description);
        }

        let cycle = self
            .erp
            .insert::<AppraisalCycle, _>(&body)
            .await
            .map_err(|err| {
                ServiceError::from(err).conflict_on_duplicate(format!(
                    "Appraisal cycle {} already exists",
                    input.cycle_name.trim()
                ))
            })?;
        info!(cycle = %cycle.name, "appraisal cycle created");
        Ok(cycle)
    }

    #[instrument(skip(self))]
    pub async fn appraisals(&self, filter: &AppraisalFilter) -> Result<Vec<Appraisal>, ServiceError> {
        let query = ListQuery::new()
            .eq_opt("appraisal_cycle", non_blank(filter.cycle.as_deref()))
            .eq_opt("employee", non_blank(filter.employee.as_deref()))
            .order_by("employee_name asc")
            .all();
        Ok(self.erp.get_list(query).await?)
    }

    /// Starts a cycle: makes sure the default template and its KRAs and
    /// criteria exist, links it to designations that have none, pulls the
    /// appraisees, fills in missing templates and creates the appraisals.
    ///
    /// Every existence check runs on every call, so repeating it creates
    /// nothing new. Bootstrap failures are logged and skipped; failures in
    /// the steps after it are returned.
    #[instrument(skip(self))]
    pub async fn initiate(&self, cycle_name: &str) -> Result<CycleInitiation, ServiceError> {
        if self.erp.find_doc::<AppraisalCycle>(cycle_name).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Appraisal cycle {} not found",
                cycle_name
            )));
        }

        let bootstrapped = self.bootstrap_template().await;
        let designations_linked = self.link_designations().await?;

        let pulled = self
            .erp
            .run_doc_method(AppraisalCycle::DOCTYPE, cycle_name, "set_employees")
            .await?;
        let mut cycle = match pulled.doc::<AppraisalCycle>()? {
            Some(cycle) => cycle,
            None => self.erp.get_doc::<AppraisalCycle>(cycle_name).await?,
        };

        let mut templates_assigned = 0;
        for row in &mut cycle.appraisees {
            if non_blank(row.appraisal_template.as_deref()).is_none() {
                row.appraisal_template = Some(DEFAULT_TEMPLATE.to_string());
                templates_assigned += 1;
            }
        }
        if !cycle.appraisees.is_empty() {
            let mut body = json!({ "appraisees": cycle.appraisees });
            if let Some(modified) = &cycle.modified {
                body["modified"] = json!(modified);
            }
            cycle = self
                .erp
                .update::<AppraisalCycle, _>(cycle_name, &body)
                .await?;
        }

        let created = self
            .erp
            .run_doc_method(AppraisalCycle::DOCTYPE, cycle_name, "create_appraisals")
            .await?;

        info!(
            cycle = %cycle_name,
            appraisees = cycle.appraisees.len(),
            templates_assigned,
            bootstrapped = bootstrapped.len(),
            "appraisal cycle initiated"
        );
        Ok(CycleInitiation {
            cycle: cycle_name.to_string(),
            appraisees: cycle.appraisees.len(),
            templates_assigned,
            designations_linked,
            bootstrapped,
            message: created.message,
        })
    }

    /// Creates whichever of the default KRAs, criteria and template are
    /// missing. Returns what was created.
    async fn bootstrap_template(&self) -> Vec<String> {
        let mut created = Vec::new();
        for (title, _) in KRAS {
            self.ensure::<Kra>(title, json!({ "title": title }), &mut created)
                .await;
        }
        for (criteria, _) in CRITERIA {
            self.ensure::<EmployeeFeedbackCriteria>(
                criteria,
                json!({ "criteria": criteria }),
                &mut created,
            )
            .await;
        }

        let goals: Vec<Value> = KRAS
            .iter()
            .map(|(kra, weight)| json!({ "key_result_area": kra, "per_weightage": weight }))
            .collect();
        let rating_criteria: Vec<Value> = CRITERIA
            .iter()
            .map(|(criteria, weight)| json!({ "criteria": criteria, "per_weightage": weight }))
            .collect();
        self.ensure::<AppraisalTemplate>(
            DEFAULT_TEMPLATE,
            json!({
                "template_title": DEFAULT_TEMPLATE,
                "goals": goals,
                "rating_criteria": rating_criteria,
            }),
            &mut created,
        )
        .await;
        created
    }

    async fn ensure<T: Doctype>(&self, name: &str, body: Value, created: &mut Vec<String>) {
        match self.erp.find_doc::<T>(name).await {
            Ok(Some(_)) => {}
            Ok(None) => match self.erp.insert::<T, _>(&body).await {
                Ok(_) => {
                    info!(doctype = T::DOCTYPE, name = %name, "appraisal prerequisite created");
                    created.push(format!("{}: {}", T::DOCTYPE, name));
                }
                Err(err) => warn!(
                    doctype = T::DOCTYPE,
                    name = %name,
                    error = %err,
                    "could not create appraisal prerequisite"
                ),
            },
            Err(err) => warn!(
                doctype = T::DOCTYPE,
                name = %name,
                error = %err,
                "could not look up appraisal prerequisite"
            ),
        }
    }

    /// Points every designation without an appraisal template at the default one.
    async fn link_designations(&self) -> Result<Vec<String>, ServiceError> {
        let designations: Vec<Designation> = self
            .erp
            .get_list(
                ListQuery::new()
                    .fields(&["name", "appraisal_template"])
                    .all(),
            )
            .await?;

        let mut linked = Vec::new();
        for designation in designations {
            if non_blank(designation.appraisal_template.as_deref()).is_some() {
                continue;
            }
            self.erp
                .update::<Designation, _>(
                    &designation.name,
                    &json!({ "appraisal_template": DEFAULT_TEMPLATE }),
                )
                .await?;
            linked.push(designation.name);
        }
        if !linked.is_empty() {
            info!(count = linked.len(), "designations linked to default appraisal template");
        }
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErpConfig;
    use axum::http::StatusCode;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> AppraisalService {
        AppraisalService::new(
            ErpClient::new(&ErpConfig {
                base_url: server.uri(),
                api_key: "key".into(),
                api_secret: "secret".into(),
                request_timeout_secs: 5,
            })
            .unwrap(),
            None,
        )
    }

    async fn cycle_exists(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/resource/Appraisal%20Cycle/Q3-2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Q3-2024", "modified": "2024-07-01 00:00:00" }
            })))
            .mount(server)
            .await;
    }

    async fn cycle_methods(server: &MockServer, appraisees: Value) {
        Mock::given(method("POST"))
            .and(path("/api/method/run_doc_method"))
            .and(body_partial_json(json!({ "method": "set_employees" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{ "name": "Q3-2024", "modified": "2024-07-01 00:00:01", "appraisees": appraisees }]
            })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/method/run_doc_method"))
            .and(body_partial_json(json!({ "method": "create_appraisals" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "queued" })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn first_run_bootstraps_and_patches_rows() {
        let server = MockServer::start().await;
        cycle_exists(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(
                r"^/api/resource/(KRA|Employee%20Feedback%20Criteria|Appraisal%20Template)/.+$",
            ))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(
                r"^/api/resource/(KRA|Employee%20Feedback%20Criteria|Appraisal%20Template)$",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "x" } })))
            .expect(7)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Designation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "name": "Engineer", "appraisal_template": null },
                    { "name": "Manager", "appraisal_template": "Leadership" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/resource/Designation/Engineer"))
            .and(body_partial_json(json!({ "appraisal_template": "Standard Appraisal" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "Engineer" } })))
            .expect(1)
            .mount(&server)
            .await;
        cycle_methods(
            &server,
            json!([
                { "employee": "EMP-1", "appraisal_template": null },
                { "employee": "EMP-2", "appraisal_template": "Leadership" }
            ]),
        )
        .await;
        Mock::given(method("PUT"))
            .and(path("/api/resource/Appraisal%20Cycle/Q3-2024"))
            .and(body_partial_json(json!({
                "modified": "2024-07-01 00:00:01",
                "appraisees": [
                    { "employee": "EMP-1", "appraisal_template": "Standard Appraisal" },
                    { "employee": "EMP-2", "appraisal_template": "Leadership" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Q3-2024", "appraisees": [{ "employee": "EMP-1" }, { "employee": "EMP-2" }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = service(&server).initiate("Q3-2024").await.unwrap();
        assert_eq!(outcome.bootstrapped.len(), 7);
        assert!(outcome.bootstrapped.contains(&"KRA: Timeliness".to_string()));
        assert_eq!(outcome.designations_linked, vec!["Engineer".to_string()]);
        assert_eq!(outcome.templates_assigned, 1);
        assert_eq!(outcome.appraisees, 2);
        assert_eq!(outcome.message, Some(json!("queued")));
    }

    #[tokio::test]
    async fn repeat_run_creates_nothing() {
        let server = MockServer::start().await;
        cycle_exists(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(
                r"^/api/resource/(KRA|Employee%20Feedback%20Criteria|Appraisal%20Template)/.+$",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "x" } })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/api/resource/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Designation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "name": "Engineer", "appraisal_template": "Standard Appraisal" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/api/resource/Designation/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        cycle_methods(
            &server,
            json!([{ "employee": "EMP-1", "appraisal_template": "Standard Appraisal" }]),
        )
        .await;
        Mock::given(method("PUT"))
            .and(path("/api/resource/Appraisal%20Cycle/Q3-2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Q3-2024", "appraisees": [{ "employee": "EMP-1" }] }
            })))
            .mount(&server)
            .await;

        let outcome = service(&server).initiate("Q3-2024").await.unwrap();
        assert!(outcome.bootstrapped.is_empty());
        assert!(outcome.designations_linked.is_empty());
        assert_eq!(outcome.templates_assigned, 0);
    }

    #[tokio::test]
    async fn bootstrap_failures_do_not_stop_initiation() {
        let server = MockServer::start().await;
        cycle_exists(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(
                r"^/api/resource/(KRA|Employee%20Feedback%20Criteria|Appraisal%20Template)/.+$",
            ))
            .respond_with(ResponseTemplate::new(403).set_body_string("not permitted"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Designation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;
        cycle_methods(&server, json!([])).await;

        let outcome = service(&server).initiate("Q3-2024").await.unwrap();
        assert!(outcome.bootstrapped.is_empty());
        assert_eq!(outcome.appraisees, 0);
    }

    #[tokio::test]
    async fn failing_set_employees_is_returned() {
        let server = MockServer::start().await;
        cycle_exists(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(
                r"^/api/resource/(KRA|Employee%20Feedback%20Criteria|Appraisal%20Template)/.+$",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "x" } })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Designation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/method/run_doc_method"))
            .respond_with(ResponseTemplate::new(500).set_body_string("set_employees exploded"))
            .mount(&server)
            .await;

        let err = service(&server).initiate("Q3-2024").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.upstream_details().as_deref(), Some("set_employees exploded"));
    }

    #[tokio::test]
    async fn unknown_cycle_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Appraisal%20Cycle/Nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = service(&server).initiate("Nope").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
