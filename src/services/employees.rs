use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{document_body, non_blank, parse_date};
use crate::{
    erp::{Doctype, ErpClient, ErpError, ListQuery},
    errors::ServiceError,
    models::{Department, Designation, Employee},
};

/// Query parameters accepted by the employee list.
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeFilter {
    pub status: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub company: Option<String>,
    /// Substring match on the employee's full name.
    pub search: Option<String>,
    /// Page offset. Without a `limit` every matching row is returned.
    pub start: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct NewEmployee {
    #[serde(default)]
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    pub last_name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "gender is required"))]
    pub gender: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "date_of_birth is required"))]
    pub date_of_birth: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "date_of_joining is required"))]
    pub date_of_joining: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub reports_to: Option<String>,
    pub holiday_list: Option<String>,
    pub user_id: Option<String>,
    pub company_email: Option<String>,
    pub cell_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub date_of_joining: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub reports_to: Option<String>,
    pub holiday_list: Option<String>,
    pub user_id: Option<String>,
    pub company_email: Option<String>,
    pub cell_number: Option<String>,
}

#[derive(Clone)]
pub struct EmployeeService {
    erp: ErpClient,
    default_company: Option<String>,
}

impl EmployeeService {
    pub fn new(erp: ErpClient, default_company: Option<String>) -> Self {
        Self {
            erp,
            default_company,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, ServiceError> {
        let mut query = ListQuery::new()
            .eq_opt("status", non_blank(filter.status.as_deref()))
            .eq_opt("department", non_blank(filter.department.as_deref()))
            .eq_opt("designation", non_blank(filter.designation.as_deref()))
            .eq_opt("company", non_blank(filter.company.as_deref()))
            .order_by("employee_name asc")
            .all();
        if let Some(search) = non_blank(filter.search.as_deref()) {
            query = query.filter("employee_name", "like", format!("%{}%", search));
        }
        if let Some(limit) = filter.limit.filter(|l| *l > 0) {
            query = query.limit(limit);
        }
        if let Some(start) = filter.start {
            query = query.start(start);
        }
        Ok(self.erp.get_list(query).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Employee, ServiceError> {
        self.erp
            .find_doc(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))
    }

    /// Creates the employee, first creating any designation or department
    /// it names that the ERP does not know yet.
    #[instrument(skip(self, input), fields(first_name = %input.first_name))]
    pub async fn create(&self, input: NewEmployee) -> Result<Employee, ServiceError> {
        parse_date("date_of_birth", &input.date_of_birth)?;
        parse_date("date_of_joining", &input.date_of_joining)?;

        let company = non_blank(input.company.as_deref())
            .or(self.default_company.as_deref())
            .map(str::to_string);

        let mut body = document_body(&input)?;
        if let Some(designation) = non_blank(input.designation.as_deref()) {
            self.ensure_designation(designation).await?;
            body.insert("designation".into(), json!(designation));
        }
        if let Some(department) = non_blank(input.department.as_deref()) {
            let name = self.ensure_department(department, company.as_deref()).await?;
            body.insert("department".into(), Value::String(name));
        }
        if let Some(company) = company {
            body.insert("company".into(), Value::String(company));
        }
        body.entry("status").or_insert_with(|| json!("Active"));

        let employee: Employee = self.erp.insert::<Employee, _>(&body).await?;
        info!(employee = %employee.name, "employee created");
        Ok(employee)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: EmployeeUpdate) -> Result<Employee, ServiceError> {
        if let Some(dob) = non_blank(update.date_of_birth.as_deref()) {
            parse_date("date_of_birth", dob)?;
        }
        if let Some(doj) = non_blank(update.date_of_joining.as_deref()) {
            parse_date("date_of_joining", doj)?;
        }

        let mut body = document_body(&update)?;
        if body.is_empty() {
            return Err(ServiceError::BadRequest("no fields to update".to_string()));
        }
        if let Some(designation) = non_blank(update.designation.as_deref()) {
            self.ensure_designation(designation).await?;
            body.insert("designation".into(), json!(designation));
        }
        if let Some(department) = non_blank(update.department.as_deref()) {
            let company = non_blank(update.company.as_deref()).or(self.default_company.as_deref());
            let name = self.ensure_department(department, company).await?;
            body.insert("department".into(), Value::String(name));
        }

        self.erp
            .update::<Employee, _>(id, &body)
            .await
            .map_err(|err| not_found_or(err, id))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.erp
            .delete(Employee::DOCTYPE, id)
            .await
            .map_err(|err| not_found_or(err, id))?;
        info!(employee = %id, "employee deleted");
        Ok(())
    }

    pub async fn designations(&self) -> Result<Vec<Designation>, ServiceError> {
        Ok(self
            .erp
            .get_list(ListQuery::new().order_by("name asc").all())
            .await?)
    }

    pub async fn departments(&self) -> Result<Vec<Department>, ServiceError> {
        Ok(self
            .erp
            .get_list(ListQuery::new().order_by("department_name asc").all())
            .await?)
    }

    /// Makes sure the designation exists. Returns whether it had to be created.
    pub async fn ensure_designation(&self, name: &str) -> Result<bool, ServiceError> {
        if self.erp.find_doc::<Designation>(name).await?.is_some() {
            return Ok(false);
        }
        match self
            .erp
            .insert::<Designation, _>(&json!({ "designation_name": name }))
            .await
        {
            Ok(_) => {
                info!(designation = %name, "designation created");
                Ok(true)
            }
            // Someone else created it in the meantime
            Err(err) if err.is_duplicate() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Resolves a department by document name or display name, creating it
    /// when neither matches. Returns the ERP document name, which carries the
    /// company abbreviation suffix.
    pub async fn ensure_department(
        &self,
        department: &str,
        company: Option<&str>,
    ) -> Result<String, ServiceError> {
        if let Some(found) = self.erp.find_doc::<Department>(department).await? {
            return Ok(found.name);
        }

        let by_label: Vec<Department> = self
            .erp
            .get_list(
                ListQuery::new()
                    .eq("department_name", department)
                    .eq_opt("company", company)
                    .fields(&["name"])
                    .limit(1),
            )
            .await?;
        if let Some(found) = by_label.into_iter().next() {
            return Ok(found.name);
        }

        let mut body = json!({ "department_name": department });
        if let Some(company) = company {
            body["company"] = json!(company);
        }
        match self.erp.insert::<Department, _>(&body).await {
            Ok(created) => {
                info!(department = %created.name, "department created");
                Ok(created.name)
            }
            Err(err) if err.is_duplicate() => {
                warn!(department = %department, "department appeared while creating it");
                Ok(department.to_string())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn not_found_or(err: ErpError, id: &str) -> ServiceError {
    if err.is_not_found() {
        ServiceError::NotFound(format!("Employee {} not found", id))
    } else {
        err.into()
    }
}
