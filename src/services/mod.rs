// HR
pub mod appraisals;
pub mod auth;
pub mod bank_accounts;
pub mod dashboard;
pub mod employees;
pub mod leaves;
pub mod recruitment;

// Payroll and finance
pub mod accounting;
pub mod company;
pub mod payroll;

// Fixed assets
pub mod assets;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Parses an ISO `YYYY-MM-DD` date from a request field.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::BadRequest(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

/// Serializes a request into an ERP document body, dropping unset fields.
pub(crate) fn document_body<T: Serialize>(input: &T) -> Result<Map<String, Value>, ServiceError> {
    match serde_json::to_value(input)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        _ => Err(ServiceError::InternalError(
            "request did not serialize to an object".to_string(),
        )),
    }
}

/// Trims a string and treats blanks as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_date_rejects_non_iso_input() {
        assert_eq!(
            parse_date("from_date", "2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        let err = parse_date("from_date", "01/03/2024").unwrap_err();
        assert!(err.to_string().contains("from_date"));
    }

    #[test]
    fn document_body_drops_nulls() {
        #[derive(Serialize)]
        struct Input {
            a: Option<u8>,
            b: &'static str,
        }
        let body = document_body(&Input { a: None, b: "x" }).unwrap();
        assert_eq!(Value::Object(body), json!({ "b": "x" }));
    }
}
