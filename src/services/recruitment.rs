use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use super::{non_blank, parse_date};
use crate::{
    erp::{ErpClient, ErpError, ListQuery},
    errors::ServiceError,
    models::{JobApplicant, JobOpening},
};

#[derive(Debug, Clone, Serialize)]
pub struct RecruitmentOverview {
    pub openings: Vec<JobOpening>,
    pub applicants: Vec<JobApplicant>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewJobOpening {
    #[serde(default)]
    #[validate(length(min = 1, message = "job_title is required"))]
    pub job_title: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "vacancies must be at least 1"))]
    pub vacancies: Option<u32>,
    pub closes_on: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewJobApplicant {
    #[serde(default)]
    #[validate(length(min = 1, message = "applicant_name is required"))]
    pub applicant_name: String,
    #[serde(default)]
    #[validate(email(message = "email_id must be a valid email address"))]
    pub email_id: String,
    /// Job Opening the applicant applies to.
    #[serde(default)]
    #[validate(length(min = 1, message = "job_title is required"))]
    pub job_title: String,
    pub phone_number: Option<String>,
    pub source: Option<String>,
}

/// Statuses a Job Applicant may be moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicantStatus {
    Open,
    Replied,
    Rejected,
    Hold,
    Accepted,
}

impl ApplicantStatus {
    pub const ALL: [ApplicantStatus; 5] = [
        Self::Open,
        Self::Replied,
        Self::Rejected,
        Self::Hold,
        Self::Accepted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Replied => "Replied",
            Self::Rejected => "Rejected",
            Self::Hold => "Hold",
            Self::Accepted => "Accepted",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| {
                ServiceError::BadRequest(format!(
                    "status must be one of Open, Replied, Rejected, Hold, Accepted; got {:?}",
                    value
                ))
            })
    }
}

#[derive(Clone)]
pub struct RecruitmentService {
    erp: ErpClient,
    default_company: Option<String>,
}

impl RecruitmentService {
    pub fn new(erp: ErpClient, default_company: Option<String>) -> Self {
        Self {
            erp,
            default_company,
        }
    }

    /// Openings and applicants, fetched concurrently.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<RecruitmentOverview, ServiceError> {
        let (openings, applicants) = tokio::try_join!(
            self.erp
                .get_list::<JobOpening>(ListQuery::new().order_by("posted_on desc").all()),
            self.erp
                .get_list::<JobApplicant>(ListQuery::new().order_by("creation desc").all())
        )?;
        Ok(RecruitmentOverview {
            openings,
            applicants,
        })
    }

    #[instrument(skip(self, input), fields(job_title = %input.job_title))]
    pub async fn create_opening(&self, input: NewJobOpening) -> Result<JobOpening, ServiceError> {
        let mut body = json!({
            "job_title": input.job_title.trim(),
            "status": "Open",
            "vacancies": input.vacancies.unwrap_or(1),
        });
        if let Some(closes_on) = non_blank(input.closes_on.as_deref()) {
            body["closes_on"] = json!(parse_date("closes_on", closes_on)?);
        }
        let optional = [
            ("designation", input.designation.as_deref()),
            ("department", input.department.as_deref()),
            ("description", input.description.as_deref()),
        ];
        for (field, value) in optional {
            if let Some(value) = non_blank(value) {
                body[field] = json!(value);
            }
        }
        if let Some(company) = non_blank(input.company.as_deref()).or(self.default_company.as_deref())
        {
            body["company"] = json!(company);
        }

        let opening: JobOpening = self.erp.insert::<JobOpening, _>(&body).await?;
        info!(opening = %opening.name, "job opening created");
        Ok(opening)
    }

    #[instrument(skip(self, input), fields(job_title = %input.job_title))]
    pub async fn create_applicant(
        &self,
        input: NewJobApplicant,
    ) -> Result<JobApplicant, ServiceError> {
        let mut body = json!({
            "applicant_name": input.applicant_name.trim(),
            "email_id": input.email_id.trim(),
            "job_title": input.job_title.trim(),
            "status": ApplicantStatus::Open.as_str(),
        });
        if let Some(phone) = non_blank(input.phone_number.as_deref()) {
            body["phone_number"] = json!(phone);
        }
        if let Some(source) = non_blank(input.source.as_deref()) {
            body["source"] = json!(source);
        }

        let applicant = self
            .erp
            .insert::<JobApplicant, _>(&body)
            .await
            .map_err(|err| {
                ServiceError::from(err).conflict_on_duplicate(format!(
                    "An applicant with email {} already exists",
                    input.email_id.trim()
                ))
            })?;
        info!(applicant = %applicant.name, "job applicant created");
        Ok(applicant)
    }

    #[instrument(skip(self))]
    pub async fn update_applicant_status(
        &self,
        id: &str,
        status: ApplicantStatus,
    ) -> Result<JobApplicant, ServiceError> {
        self.erp
            .update::<JobApplicant, _>(id, &json!({ "status": status.as_str() }))
            .await
            .map_err(|err| not_found_or(err, id))
    }
}

fn not_found_or(err: ErpError, id: &str) -> ServiceError {
    if err.is_not_found() {
        ServiceError::NotFound(format!("Job applicant {} not found", id))
    } else {
        err.into()
    }
}
