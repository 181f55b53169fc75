use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::{Doctype, ErpError, ListQuery};
use crate::config::ErpConfig;

pub type ErpResult<T> = Result<T, ErpError>;

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct MessageEnvelope<T> {
    #[serde(default)]
    message: Option<T>,
}

/// Body returned by `/api/method/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Body returned by `/api/method/run_doc_method`: the document as saved after
/// the method ran, plus whatever the method itself returned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocMethodResponse {
    #[serde(default)]
    pub docs: Vec<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl DocMethodResponse {
    /// The updated document, decoded into its typed mirror.
    pub fn doc<T: DeserializeOwned>(&self) -> ErpResult<Option<T>> {
        self.docs
            .first()
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ErpError::Decode(e.to_string()))
    }
}

/// Authenticated client for the Frappe/ERPNext REST API.
///
/// Every call is a single attempt: failures are reported, never retried.
#[derive(Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    base_url: Url,
    authorization: String,
}

impl ErpClient {
    pub fn new(config: &ErpConfig) -> ErpResult<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ErpError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ErpError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            authorization: format!("token {}:{}", config.api_key, config.api_secret),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> ErpResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ErpError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn resource_url(&self, doctype: &str, name: Option<&str>) -> ErpResult<Url> {
        match name {
            Some(name) => self.url(&["api", "resource", doctype, name]),
            None => self.url(&["api", "resource", doctype]),
        }
    }

    fn method_url(&self, method: &str) -> ErpResult<Url> {
        self.url(&["api", "method", method])
    }

    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.authorization.as_str())
            .header(ACCEPT, "application/json")
    }

    async fn dispatch(&self, builder: RequestBuilder) -> ErpResult<String> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let started = Instant::now();
        counter!("erp.requests", 1, "method" => method.to_string());

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                counter!("erp.errors", 1, "kind" => "transport");
                warn!(%method, %path, error = %err, "ERP request failed");
                return Err(err.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;
        let elapsed = started.elapsed();
        histogram!("erp.request.duration_ms", elapsed.as_millis() as f64);
        debug!(
            %method,
            %path,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "ERP response"
        );

        if !status.is_success() {
            counter!("erp.errors", 1, "kind" => "status");
            return Err(ErpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> ErpResult<T> {
        let body = if body.trim().is_empty() { "{}" } else { body };
        serde_json::from_str(body).map_err(|e| ErpError::Decode(e.to_string()))
    }

    fn data<T: DeserializeOwned>(body: &str) -> ErpResult<T> {
        let envelope: DataEnvelope<T> = Self::decode(body)?;
        envelope
            .data
            .ok_or_else(|| ErpError::Decode("response carries no `data` field".to_string()))
    }

    fn message<R: DeserializeOwned + Default>(body: &str) -> ErpResult<R> {
        let envelope: MessageEnvelope<R> = Self::decode(body)?;
        Ok(envelope.message.unwrap_or_default())
    }

    /// Lists documents of `T`'s doctype. Uses `T::LIST_FIELDS` unless the
    /// query names its own fields. A missing `data` field yields an empty list.
    pub async fn get_list<T: Doctype>(&self, query: ListQuery) -> ErpResult<Vec<T>> {
        let query = if query.has_fields() {
            query
        } else {
            query.fields(T::LIST_FIELDS)
        };
        let url = self.resource_url(T::DOCTYPE, None)?;
        let body = self
            .dispatch(self.authorized(Method::GET, url).query(&query.to_params()))
            .await?;
        let envelope: DataEnvelope<Vec<T>> = Self::decode(&body)?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Counts documents matching the query's filters.
    pub async fn count(&self, doctype: &str, query: &ListQuery) -> ErpResult<u64> {
        let mut params = vec![("doctype", doctype.to_string())];
        if let Some(filters) = query.filters_json() {
            params.push(("filters", filters));
        }
        self.get_method("frappe.client.get_count", &params).await
    }

    pub async fn get_doc<T: Doctype>(&self, name: &str) -> ErpResult<T> {
        let url = self.resource_url(T::DOCTYPE, Some(name))?;
        let body = self.dispatch(self.authorized(Method::GET, url)).await?;
        Self::data(&body)
    }

    /// Like [`ErpClient::get_doc`], but a missing document is `Ok(None)`.
    pub async fn find_doc<T: Doctype>(&self, name: &str) -> ErpResult<Option<T>> {
        match self.get_doc(name).await {
            Ok(doc) => Ok(Some(doc)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn insert<T, B>(&self, body: &B) -> ErpResult<T>
    where
        T: Doctype,
        B: Serialize + ?Sized,
    {
        let url = self.resource_url(T::DOCTYPE, None)?;
        let body = self
            .dispatch(self.authorized(Method::POST, url).json(body))
            .await?;
        Self::data(&body)
    }

    pub async fn update<T, B>(&self, name: &str, body: &B) -> ErpResult<T>
    where
        T: Doctype,
        B: Serialize + ?Sized,
    {
        let url = self.resource_url(T::DOCTYPE, Some(name))?;
        let body = self
            .dispatch(self.authorized(Method::PUT, url).json(body))
            .await?;
        Self::data(&body)
    }

    pub async fn delete(&self, doctype: &str, name: &str) -> ErpResult<()> {
        let url = self.resource_url(doctype, Some(name))?;
        self.dispatch(self.authorized(Method::DELETE, url)).await?;
        Ok(())
    }

    /// POSTs to a whitelisted method and returns its `message`.
    pub async fn call_method<R, B>(&self, method: &str, body: &B) -> ErpResult<R>
    where
        R: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let url = self.method_url(method)?;
        let body = self
            .dispatch(self.authorized(Method::POST, url).json(body))
            .await?;
        Self::message(&body)
    }

    /// GETs a whitelisted method and returns its `message`.
    pub async fn get_method<R>(&self, method: &str, params: &[(&str, String)]) -> ErpResult<R>
    where
        R: DeserializeOwned + Default,
    {
        let url = self.method_url(method)?;
        let body = self
            .dispatch(self.authorized(Method::GET, url).query(params))
            .await?;
        Self::message(&body)
    }

    /// Runs a whitelisted method on a saved document.
    pub async fn run_doc_method(
        &self,
        doctype: &str,
        name: &str,
        method: &str,
    ) -> ErpResult<DocMethodResponse> {
        let url = self.method_url("run_doc_method")?;
        let payload = json!({ "dt": doctype, "dn": name, "method": method });
        let body = self
            .dispatch(self.authorized(Method::POST, url).json(&payload))
            .await?;
        Self::decode(&body)
    }

    /// Checks a user's credentials. Sent without the API token so the ERP
    /// evaluates the password itself.
    pub async fn login(&self, usr: &str, pwd: &str) -> ErpResult<LoginResponse> {
        let url = self.method_url("login")?;
        let request = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&json!({ "usr": usr, "pwd": pwd }));
        let body = self.dispatch(request).await?;
        Self::decode(&body)
    }

    pub async fn ping(&self) -> ErpResult<()> {
        self.get_method::<Value>("ping", &[]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, SalarySlip};
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ErpClient {
        ErpClient::new(&ErpConfig {
            base_url: server.uri(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            request_timeout_secs: 5,
        })
        .expect("client")
    }

    #[tokio::test]
    async fn sends_token_header_and_encoded_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Salary%20Slip"))
            .and(header("Authorization", "token key:secret"))
            .and(query_param("filters", r#"[["payroll_entry","=","PE-0001"]]"#))
            .and(query_param("limit_page_length", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "name": "SS-1", "employee": "EMP-1", "gross_pay": 1000.0 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let slips: Vec<SalarySlip> = client_for(&server)
            .get_list(ListQuery::new().eq("payroll_entry", "PE-0001").all())
            .await
            .unwrap();
        assert_eq!(slips.len(), 1);
        assert_eq!(slips[0].name, "SS-1");
    }

    #[tokio::test]
    async fn missing_data_yields_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Employee"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let employees: Vec<Employee> = client_for(&server)
            .get_list(ListQuery::new())
            .await
            .unwrap();
        assert!(employees.is_empty());
    }

    #[tokio::test]
    async fn doc_without_data_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Employee/HR-EMP-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "HR-EMP-1", "first_name": "Grace" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Employee/HR-EMP-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let employee: Employee = client.get_doc("HR-EMP-1").await.unwrap();
        assert_eq!(employee.first_name.as_deref(), Some("Grace"));

        let err = client.get_doc::<Employee>("HR-EMP-2").await.unwrap_err();
        assert_matches!(err, ErpError::Decode(_));
    }

    #[tokio::test]
    async fn non_success_status_carries_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resource/Employee/EMP-404"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"exc_type":"DoesNotExistError"}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_doc::<Employee>("EMP-404").await.unwrap_err();
        assert_matches!(err, ErpError::Status { status: 404, ref body } if body.contains("DoesNotExistError"));

        let missing = client.find_doc::<Employee>("EMP-404").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn login_skips_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/login"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/method/login"))
            .and(body_json(json!({ "usr": "a@b.c", "pwd": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Logged In",
                "full_name": "Ada Lovelace"
            })))
            .mount(&server)
            .await;

        let login = client_for(&server).login("a@b.c", "pw").await.unwrap();
        assert_eq!(login.full_name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn run_doc_method_posts_doc_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/method/run_doc_method"))
            .and(body_json(json!({
                "dt": "Appraisal Cycle",
                "dn": "FY 2024",
                "method": "set_employees"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{ "name": "FY 2024", "appraisees": [] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .run_doc_method("Appraisal Cycle", "FY 2024", "set_employees")
            .await
            .unwrap();
        assert_eq!(response.docs.len(), 1);
    }

    #[test]
    fn rejects_relative_base_url() {
        let err = ErpClient::new(&ErpConfig {
            base_url: "erp.local".to_string(),
            api_key: "k".to_string(),
            api_secret: "s".to_string(),
            request_timeout_secs: 5,
        })
        .err()
        .expect("invalid url");
        assert_matches!(err, ErpError::InvalidUrl(_));
    }
}
