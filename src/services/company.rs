use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};

use super::non_blank;
use crate::{
    erp::{ErpClient, ErpError},
    errors::ServiceError,
    models::Company,
};

const RENAME_METHOD: &str = "frappe.client.rename_doc";

/// Fields the client may not set directly on a company update.
const READ_ONLY_FIELDS: [&str; 4] = ["name", "modified", "creation", "docstatus"];

#[derive(Debug, Default, Deserialize)]
pub struct CompanyUpdate {
    /// A new name renames the document before the other fields are written.
    pub company_name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Clone)]
pub struct CompanyService {
    erp: ErpClient,
}

impl CompanyService {
    pub fn new(erp: ErpClient) -> Self {
        Self { erp }
    }

    pub async fn get(&self, name: &str) -> Result<Company, ServiceError> {
        self.erp
            .find_doc(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", name)))
    }

    /// Renames the company when `company_name` differs from `name`, then
    /// writes the remaining fields against the current `modified` stamp.
    #[instrument(skip(self, update))]
    pub async fn update(&self, name: &str, update: CompanyUpdate) -> Result<Company, ServiceError> {
        let new_name = non_blank(update.company_name.as_deref()).map(str::to_string);
        let target = match new_name.as_deref() {
            Some(new_name) if new_name != name => self.rename(name, new_name).await?,
            _ => name.to_string(),
        };

        // The rename bumps `modified`; writing with the old one is rejected.
        let current = self.get(&target).await?;

        let mut body = update.fields;
        for field in READ_ONLY_FIELDS {
            body.remove(field);
        }
        if let Some(new_name) = new_name {
            body.insert("company_name".into(), Value::String(new_name));
        }
        if body.is_empty() {
            return Ok(current);
        }
        if let Some(modified) = current.modified {
            body.insert("modified".into(), Value::String(modified));
        }

        let company: Company = self
            .erp
            .update::<Company, _>(&target, &body)
            .await
            .map_err(|err| not_found_or(err, &target))?;
        info!(company = %company.name, "company updated");
        Ok(company)
    }

    /// Returns the document name after the rename.
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<String, ServiceError> {
        let payload = json!({
            "doctype": "Company",
            "old_name": old_name,
            "new_name": new_name,
            "merge": false,
        });
        match self.erp.call_method::<Value, _>(RENAME_METHOD, &payload).await {
            Ok(renamed) => {
                let renamed = renamed.as_str().unwrap_or(new_name).to_string();
                info!(from = %old_name, to = %renamed, "company renamed");
                Ok(renamed)
            }
            Err(err) if err.is_not_found() => {
                // An earlier attempt may have renamed it already
                warn!(from = %old_name, to = %new_name, "rename target missing; checking new name");
                match self.erp.find_doc::<Company>(new_name).await? {
                    Some(company) => Ok(company.name),
                    None => Err(ServiceError::NotFound(format!(
                        "Company {} not found",
                        old_name
                    ))),
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn not_found_or(err: ErpError, name: &str) -> ServiceError {
    if err.is_not_found() {
        ServiceError::NotFound(format!("Company {} not found", name))
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErpConfig;
    use axum::http::StatusCode;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> CompanyService {
        CompanyService::new(
            ErpClient::new(&ErpConfig {
                base_url: server.uri(),
                api_key: "key".into(),
                api_secret: "secret".into(),
                request_timeout_secs: 5,
            })
            .unwrap(),
        )
    }

    fn update(body: Value) -> CompanyUpdate {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn extra_fields_are_collected() {
        let update = update(json!({ "company_name": "Acme", "tax_id": "GST-1" }));
        assert_eq!(update.company_name.as_deref(), Some("Acme"));
        assert_eq!(update.fields.get("tax_id"), Some(&json!("GST-1")));
        assert!(!update.fields.contains_key("company_name"));
    }

    #[tokio::test]
    async fn rename_then_update_with_fresh_modified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.rename_doc"))
            .and(body_partial_json(json!({ "old_name": "Acme", "new_name": "Acme Labs" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Acme Labs" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Company/Acme%20Labs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Acme Labs", "modified": "2024-07-01 10:00:00.000001" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/resource/Company/Acme%20Labs"))
            .and(body_partial_json(json!({
                "company_name": "Acme Labs",
                "tax_id": "GST-1",
                "modified": "2024-07-01 10:00:00.000001"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Acme Labs", "company_name": "Acme Labs", "tax_id": "GST-1" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let company = service(&server)
            .update(
                "Acme",
                update(json!({ "company_name": "Acme Labs", "tax_id": "GST-1" })),
            )
            .await
            .unwrap();
        assert_eq!(company.name, "Acme Labs");
        assert_eq!(company.tax_id.as_deref(), Some("GST-1"));
    }

    #[tokio::test]
    async fn missing_rename_source_is_accepted_when_new_name_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.rename_doc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Company/Acme%20Labs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Acme Labs", "modified": "2024-07-02 09:00:00" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/resource/Company/Acme%20Labs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Acme Labs" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let company = service(&server)
            .update("Acme", update(json!({ "company_name": "Acme Labs" })))
            .await
            .unwrap();
        assert_eq!(company.name, "Acme Labs");
    }

    #[tokio::test]
    async fn rename_of_unknown_company_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.rename_doc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Company/Ghost%20Labs"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = service(&server)
            .update("Ghost", update(json!({ "company_name": "Ghost Labs" })))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unchanged_name_skips_rename() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/frappe.client.rename_doc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Company/Acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Acme", "modified": "2024-07-02 09:00:00" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/resource/Company/Acme"))
            .and(body_partial_json(json!({ "phone_no": "+91 100" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Acme", "phone_no": "+91 100" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        service(&server)
            .update(
                "Acme",
                update(json!({ "company_name": "Acme", "phone_no": "+91 100", "name": "x" })),
            )
            .await
            .unwrap();
    }
}
