use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Coach,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Coach => "coach",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "coach" => Ok(UserRole::Coach),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

/// Authenticated caller as supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn student(user_id: Uuid) -> Self {
        Self::new(user_id, UserRole::Student)
    }

    pub fn coach(user_id: Uuid) -> Self {
        Self::new(user_id, UserRole::Coach)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
