use serde_json::{json, Value};

/// A single `[field, operator, value]` condition in Frappe's filter syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Filter {
    fn to_json(&self) -> Value {
        json!([self.field, self.operator, self.value])
    }
}

/// Builder for `/api/resource/<Doctype>` list queries.
///
/// Filters and fields are sent JSON-encoded, the way the Frappe REST API
/// expects them. A limit of `0` asks the ERP for every matching row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    filters: Vec<Filter>,
    fields: Vec<String>,
    order_by: Option<String>,
    limit: Option<u32>,
    start: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, "=", value)
    }

    /// Adds an equality filter only when a value is present.
    pub fn eq_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// Lifts the ERP's default page size of 20.
    pub fn all(self) -> Self {
        self.limit(0)
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn filters_json(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        let list: Vec<Value> = self.filters.iter().map(Filter::to_json).collect();
        Some(Value::Array(list).to_string())
    }

    /// Query-string pairs for the request.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(filters) = self.filters_json() {
            params.push(("filters", filters));
        }
        if !self.fields.is_empty() {
            params.push(("fields", json!(self.fields).to_string()));
        }
        if let Some(order_by) = &self.order_by {
            params.push(("order_by", order_by.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit_page_length", limit.to_string()));
        }
        if let Some(start) = self.start {
            params.push(("limit_start", start.to_string()));
        }
        params
    }
}
