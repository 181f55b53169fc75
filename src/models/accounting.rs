use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::erp::Doctype;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesInvoice {
    #[serde(default)]
    pub name: String,
    pub customer: Option<String>,
    pub customer_name: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub grand_total: Option<f64>,
    pub outstanding_amount: Option<f64>,
    pub currency: Option<String>,
    pub docstatus: Option<u8>,
}

impl Doctype for SalesInvoice {
    const DOCTYPE: &'static str = "Sales Invoice";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "customer",
        "customer_name",
        "posting_date",
        "due_date",
        "status",
        "grand_total",
        "outstanding_amount",
        "currency",
        "docstatus",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseInvoice {
    #[serde(default)]
    pub name: String,
    pub supplier: Option<String>,
    pub supplier_name: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub grand_total: Option<f64>,
    pub outstanding_amount: Option<f64>,
    pub currency: Option<String>,
    pub docstatus: Option<u8>,
}

impl Doctype for PurchaseInvoice {
    const DOCTYPE: &'static str = "Purchase Invoice";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "supplier",
        "supplier_name",
        "posting_date",
        "due_date",
        "status",
        "grand_total",
        "outstanding_amount",
        "currency",
        "docstatus",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Sales,
    Purchase,
}

impl InvoiceKind {
    pub fn doctype(self) -> &'static str {
        match self {
            InvoiceKind::Sales => SalesInvoice::DOCTYPE,
            InvoiceKind::Purchase => PurchaseInvoice::DOCTYPE,
        }
    }

    /// Link field naming the counterparty on this kind of invoice.
    pub fn party_field(self) -> &'static str {
        match self {
            InvoiceKind::Sales => "customer",
            InvoiceKind::Purchase => "supplier",
        }
    }
}

/// Invoice shape shared by the sales and purchase sides of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: String,
    pub kind: InvoiceKind,
    pub counterparty: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub grand_total: f64,
    pub outstanding_amount: f64,
    pub currency: Option<String>,
}

impl From<SalesInvoice> for InvoiceSummary {
    fn from(inv: SalesInvoice) -> Self {
        Self {
            id: inv.name,
            kind: InvoiceKind::Sales,
            counterparty: inv.customer_name.or(inv.customer),
            posting_date: inv.posting_date,
            due_date: inv.due_date,
            status: inv.status,
            grand_total: inv.grand_total.unwrap_or_default(),
            outstanding_amount: inv.outstanding_amount.unwrap_or_default(),
            currency: inv.currency,
        }
    }
}

impl From<PurchaseInvoice> for InvoiceSummary {
    fn from(inv: PurchaseInvoice) -> Self {
        Self {
            id: inv.name,
            kind: InvoiceKind::Purchase,
            counterparty: inv.supplier_name.or(inv.supplier),
            posting_date: inv.posting_date,
            due_date: inv.due_date,
            status: inv.status,
            grand_total: inv.grand_total.unwrap_or_default(),
            outstanding_amount: inv.outstanding_amount.unwrap_or_default(),
            currency: inv.currency,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    pub company_name: Option<String>,
    pub abbr: Option<String>,
    pub default_currency: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub website: Option<String>,
    /// Last-modified timestamp; the ERP rejects updates carrying a stale one.
    pub modified: Option<String>,
}

impl Doctype for Company {
    const DOCTYPE: &'static str = "Company";
    const LIST_FIELDS: &'static [&'static str] =
        &["name", "company_name", "abbr", "default_currency", "country"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseClaimDetail {
    pub expense_date: Option<NaiveDate>,
    pub expense_type: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub sanctioned_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseClaim {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub approval_status: Option<String>,
    pub total_claimed_amount: Option<f64>,
    pub total_sanctioned_amount: Option<f64>,
    pub docstatus: Option<u8>,
    #[serde(default)]
    pub expenses: Vec<ExpenseClaimDetail>,
}

impl Doctype for ExpenseClaim {
    const DOCTYPE: &'static str = "Expense Claim";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "employee",
        "employee_name",
        "posting_date",
        "status",
        "approval_status",
        "total_claimed_amount",
        "total_sanctioned_amount",
        "docstatus",
    ];
}
