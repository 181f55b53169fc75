//! Client for the Frappe/ERPNext REST API.
//!
//! Resources live under `/api/resource/<Doctype>[/<name>]`, whitelisted
//! server methods under `/api/method/<dotted.path>`. Requests authenticate
//! with `Authorization: token <key>:<secret>`.

mod client;
mod error;
mod query;

pub use client::{DocMethodResponse, ErpClient, ErpResult, LoginResponse};
pub use error::ErpError;
pub use query::{Filter, ListQuery};

use serde::de::DeserializeOwned;

/// A typed mirror of an ERP doctype.
pub trait Doctype: DeserializeOwned + Send {
    /// Doctype name as the ERP spells it, e.g. `"Salary Slip"`.
    const DOCTYPE: &'static str;

    /// Fields requested by list calls that do not name their own.
    const LIST_FIELDS: &'static [&'static str] = &["name"];
}
