use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use super::{non_blank, parse_date};
use crate::{
    erp::{ErpClient, ListQuery},
    errors::ServiceError,
    models::{Asset, AssetMovement},
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
pub struct AssetFilter {
    pub status: Option<String>,
    pub location: Option<String>,
    pub custodian: Option<String>,
    pub asset_category: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub purpose: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPurpose {
    Transfer,
    Issue,
    Receipt,
}

impl MovementPurpose {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.trim() {
            "Transfer" => Ok(Self::Transfer),
            "Issue" => Ok(Self::Issue),
            "Receipt" => Ok(Self::Receipt),
            other => Err(ServiceError::BadRequest(format!(
                "purpose must be Transfer, Issue or Receipt, got {:?}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "Transfer",
            Self::Issue => "Issue",
            Self::Receipt => "Receipt",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewAssetMovement {
    #[serde(default)]
    #[validate(length(min = 1, message = "purpose is required"))]
    pub purpose: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "asset is required"))]
    pub asset: String,
    pub target_location: Option<String>,
    pub to_employee: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`; defaults to now.
    pub transaction_date: Option<String>,
    pub company: Option<String>,
}

#[derive(Clone)]
pub struct AssetService {
    erp: ErpClient,
}

impl AssetService {
    pub fn new(erp: ErpClient) -> Self {
        Self { erp }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>, ServiceError> {
        let query = ListQuery::new()
            .eq_opt("status", non_blank(filter.status.as_deref()))
            .eq_opt("location", non_blank(filter.location.as_deref()))
            .eq_opt("custodian", non_blank(filter.custodian.as_deref()))
            .eq_opt("asset_category", non_blank(filter.asset_category.as_deref()))
            .eq_opt("company", non_blank(filter.company.as_deref()))
            .order_by("asset_name asc")
            .all();
        Ok(self.erp.get_list(query).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Asset, ServiceError> {
        self.erp
            .find_doc(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<AssetMovement>, ServiceError> {
        let query = ListQuery::new()
            .eq_opt("purpose", non_blank(filter.purpose.as_deref()))
            .eq_opt("company", non_blank(filter.company.as_deref()))
            .order_by("transaction_date desc")
            .all();
        Ok(self.erp.get_list(query).await?)
    }

    /// Records and submits a movement of one asset. The source location and
    /// custodian are taken from the asset as it stands.
    #[instrument(skip(self, input), fields(asset = %input.asset))]
    pub async fn create_movement(
        &self,
        input: NewAssetMovement,
    ) -> Result<AssetMovement, ServiceError> {
        let purpose = MovementPurpose::parse(&input.purpose)?;
        let target_location = non_blank(input.target_location.as_deref());
        let to_employee = non_blank(input.to_employee.as_deref());
        if target_location.is_none() && to_employee.is_none() {
            return Err(ServiceError::BadRequest(
                "target_location or to_employee is required".to_string(),
            ));
        }
        if purpose == MovementPurpose::Issue && to_employee.is_none() {
            return Err(ServiceError::BadRequest(
                "an Issue movement needs to_employee".to_string(),
            ));
        }
        let transaction_date = match non_blank(input.transaction_date.as_deref()) {
            Some(value) => parse_datetime(value)?,
            None => Utc::now().naive_utc(),
        };

        let asset = self.get(input.asset.trim()).await?;
        let row = json!({
            "asset": asset.name,
            "source_location": asset.location,
            "target_location": target_location,
            "from_employee": asset.custodian,
            "to_employee": to_employee,
        });
        let mut body = json!({
            "purpose": purpose.as_str(),
            "transaction_date": transaction_date.format(DATETIME_FORMAT).to_string(),
            "assets": [row],
            "docstatus": 1,
        });
        if let Some(company) = non_blank(input.company.as_deref()).or(asset.company.as_deref()) {
            body["company"] = json!(company);
        }

        let movement: AssetMovement = self.erp.insert::<AssetMovement, _>(&body).await?;
        info!(movement = %movement.name, purpose = purpose.as_str(), "asset movement submitted");
        Ok(movement)
    }
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, ServiceError> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT) {
        return Ok(datetime);
    }
    let date = parse_date("transaction_date", value)?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default())
}
