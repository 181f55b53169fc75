use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::non_blank;
use crate::{
    erp::{ErpClient, ErpResult, ListQuery},
    errors::ServiceError,
    models::{Bank, BankAccount},
};

const PARTY_TYPE: &str = "Employee";

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct BankAccountInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "bank is required"))]
    pub bank: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "account_number is required"))]
    pub account_number: String,
    pub account_name: Option<String>,
    pub branch_code: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankAccountUpsert {
    pub account: BankAccount,
    /// `false` when an existing record was updated.
    pub created: bool,
}

/// Keeps one Bank Account per employee.
///
/// Upserts for the same employee run one at a time within the process, and a
/// create the ERP rejects as a duplicate falls back to updating the record
/// that won.
#[derive(Clone)]
pub struct BankAccountService {
    erp: ErpClient,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl BankAccountService {
    pub fn new(erp: ErpClient) -> Self {
        Self {
            erp,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub async fn get(&self, employee: &str) -> Result<Option<BankAccount>, ServiceError> {
        Ok(self.find(employee, None).await?)
    }

    #[instrument(skip(self, input), fields(bank = %input.bank))]
    pub async fn upsert(
        &self,
        employee: &str,
        input: &BankAccountInput,
    ) -> Result<BankAccountUpsert, ServiceError> {
        let lock = self.locks.entry(employee.to_string()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.upsert_locked(employee, input).await
        };
        drop(lock);
        self.locks
            .remove_if(employee, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn upsert_locked(
        &self,
        employee: &str,
        input: &BankAccountInput,
    ) -> Result<BankAccountUpsert, ServiceError> {
        let bank = input.bank.trim();
        let account_number = input.account_number.trim();
        self.ensure_bank(bank).await;

        let account_name = non_blank(input.account_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} - {}", employee, bank));
        let create = json!({
            "account_name": account_name,
            "bank": bank,
            "bank_account_no": account_number,
            "branch_code": non_blank(input.branch_code.as_deref()),
            "party_type": PARTY_TYPE,
            "party": employee,
            "is_default": u8::from(input.is_default.unwrap_or(false)),
            "is_company_account": 0,
        });
        let update = update_body(employee, bank, account_number, input);

        if let Some(existing) = self.find(employee, Some(account_number)).await? {
            let account = self.erp.update::<BankAccount, _>(&existing.name, &update).await?;
            info!(account = %account.name, "bank account updated");
            return Ok(BankAccountUpsert {
                account,
                created: false,
            });
        }

        match self.erp.insert::<BankAccount, _>(&create).await {
            Ok(account) => {
                info!(account = %account.name, "bank account created");
                Ok(BankAccountUpsert {
                    account,
                    created: true,
                })
            }
            Err(err) if err.is_duplicate() => {
                warn!(employee = %employee, "bank account create raced; updating instead");
                let existing = self
                    .find(employee, Some(account_number))
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Conflict(format!(
                            "Bank account for employee {} already exists",
                            employee
                        ))
                    })?;
                let account = self.erp.update::<BankAccount, _>(&existing.name, &update).await?;
                Ok(BankAccountUpsert {
                    account,
                    created: false,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The employee's account, preferring the one with `account_number`.
    async fn find(
        &self,
        employee: &str,
        account_number: Option<&str>,
    ) -> ErpResult<Option<BankAccount>> {
        let accounts: Vec<BankAccount> = self
            .erp
            .get_list(
                ListQuery::new()
                    .eq("party_type", PARTY_TYPE)
                    .eq("party", employee)
                    .order_by("is_default desc, modified desc")
                    .all(),
            )
            .await?;

        let preferred = account_number.and_then(|number| {
            accounts
                .iter()
                .position(|a| a.bank_account_no.as_deref() == Some(number))
        });
        Ok(match preferred {
            Some(idx) => accounts.into_iter().nth(idx),
            None => accounts.into_iter().next(),
        })
    }

    /// Creates the Bank record if missing. Failures are logged and ignored;
    /// the account write that follows reports any real problem.
    async fn ensure_bank(&self, bank: &str) {
        match self.erp.find_doc::<Bank>(bank).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(err) = self
                    .erp
                    .insert::<Bank, _>(&json!({ "bank_name": bank }))
                    .await
                {
                    warn!(bank = %bank, error = %err, "could not create bank");
                }
            }
            Err(err) => warn!(bank = %bank, error = %err, "could not look up bank"),
        }
    }
}

/// Fields for an existing account. Optional fields the caller left out are
/// not sent, so the values already stored in the ERP survive.
fn update_body(
    employee: &str,
    bank: &str,
    account_number: &str,
    input: &BankAccountInput,
) -> Value {
    let mut body = Map::new();
    body.insert("bank".into(), json!(bank));
    body.insert("bank_account_no".into(), json!(account_number));
    body.insert("party_type".into(), json!(PARTY_TYPE));
    body.insert("party".into(), json!(employee));
    if let Some(account_name) = non_blank(input.account_name.as_deref()) {
        body.insert("account_name".into(), json!(account_name));
    }
    if let Some(branch_code) = non_blank(input.branch_code.as_deref()) {
        body.insert("branch_code".into(), json!(branch_code));
    }
    if let Some(is_default) = input.is_default {
        body.insert("is_default".into(), json!(u8::from(is_default)));
    }
    Value::Object(body)
}
