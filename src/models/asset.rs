use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::erp::Doctype;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: String,
    pub asset_name: Option<String>,
    /// Linked Item.
    pub item_code: Option<String>,
    pub asset_category: Option<String>,
    pub location: Option<String>,
    /// Employee currently holding the asset.
    pub custodian: Option<String>,
    pub status: Option<String>,
    pub company: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub gross_purchase_amount: Option<f64>,
}

impl Doctype for Asset {
    const DOCTYPE: &'static str = "Asset";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "asset_name",
        "item_code",
        "asset_category",
        "location",
        "custodian",
        "status",
        "company",
        "purchase_date",
        "gross_purchase_amount",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMovementItem {
    pub asset: Option<String>,
    pub source_location: Option<String>,
    pub target_location: Option<String>,
    pub from_employee: Option<String>,
    pub to_employee: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMovement {
    #[serde(default)]
    pub name: String,
    pub purpose: Option<String>,
    pub company: Option<String>,
    /// Datetime as the ERP formats it (`YYYY-MM-DD HH:MM:SS`).
    pub transaction_date: Option<String>,
    pub docstatus: Option<u8>,
    #[serde(default)]
    pub assets: Vec<AssetMovementItem>,
}

impl Doctype for AssetMovement {
    const DOCTYPE: &'static str = "Asset Movement";
    const LIST_FIELDS: &'static [&'static str] =
        &["name", "purpose", "company", "transaction_date", "docstatus"];
}
