use serde::{Deserialize, Serialize};
use std::fmt;

use crate::erp::Doctype;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRoleRow {
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<u8>,
    #[serde(default)]
    pub roles: Vec<UserRoleRow>,
}

impl Doctype for User {
    const DOCTYPE: &'static str = "User";
    const LIST_FIELDS: &'static [&'static str] = &["name", "full_name", "email", "enabled"];
}

/// Dashboard role derived from the ERP roles a user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    HrManager,
    Accountant,
    Employee,
}

impl UserRole {
    /// Picks the most privileged dashboard role among the user's ERP roles.
    pub fn from_erp_roles<'a>(roles: impl IntoIterator<Item = &'a str>) -> Self {
        let mut best = UserRole::Employee;
        for role in roles {
            let candidate = match role {
                "Administrator" | "System Manager" => UserRole::Admin,
                "HR Manager" | "HR User" => UserRole::HrManager,
                "Accounts Manager" | "Accounts User" => UserRole::Accountant,
                _ => UserRole::Employee,
            };
            if candidate.rank() > best.rank() {
                best = candidate;
            }
        }
        best
    }

    fn rank(self) -> u8 {
        match self {
            UserRole::Admin => 3,
            UserRole::HrManager => 2,
            UserRole::Accountant => 1,
            UserRole::Employee => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::HrManager => "hr_manager",
            UserRole::Accountant => "accountant",
            UserRole::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "hr_manager" => Some(UserRole::HrManager),
            "accountant" => Some(UserRole::Accountant),
            "employee" => Some(UserRole::Employee),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_privileged_role_wins() {
        assert_eq!(
            UserRole::from_erp_roles(["Employee", "Accounts User", "HR Manager"]),
            UserRole::HrManager
        );
        assert_eq!(
            UserRole::from_erp_roles(["System Manager", "HR User"]),
            UserRole::Admin
        );
        assert_eq!(UserRole::from_erp_roles(["Employee"]), UserRole::Employee);
        assert_eq!(UserRole::from_erp_roles(std::iter::empty()), UserRole::Employee);
    }

    #[test]
    fn role_names_round_trip_through_cookie_values() {
        for role in [
            UserRole::Admin,
            UserRole::HrManager,
            UserRole::Accountant,
            UserRole::Employee,
        ] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("root"), None);
    }
}
