//! Back-office users and their role permissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{require_text, DbError, DbResult};

pub const DEFAULT_LANGUAGE: &str = "fr";

text_enum! {
    /// Access role of a back-office user
    pub enum Role ("role") {
        Admin => "admin",
        QualityManager => "quality_manager",
        DataSteward => "data_steward",
        Viewer => "viewer",
    }
}

text_enum! {
    /// A single capability checked by the API
    pub enum Permission ("permission") {
        SuppliersRead => "suppliers:read",
        SuppliersWrite => "suppliers:write",
        SuppliersDelete => "suppliers:delete",
        CampaignsRead => "campaigns:read",
        CampaignsWrite => "campaigns:write",
        CampaignsDelete => "campaigns:delete",
        ImdsRead => "imds:read",
        ImdsWrite => "imds:write",
        ImdsValidate => "imds:validate",
        PcfRead => "pcf:read",
        PcfWrite => "pcf:write",
        PcfValidate => "pcf:validate",
        UsersRead => "users:read",
        UsersWrite => "users:write",
        SettingsRead => "settings:read",
        SettingsWrite => "settings:write",
        ChatUse => "chat:use",
    }
}

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => Permission::ALL,
            Role::QualityManager => &[
                SuppliersRead,
                SuppliersWrite,
                CampaignsRead,
                CampaignsWrite,
                ImdsRead,
                ImdsWrite,
                ImdsValidate,
                PcfRead,
                PcfWrite,
                PcfValidate,
                ChatUse,
            ],
            Role::DataSteward => &[
                SuppliersRead,
                SuppliersWrite,
                CampaignsRead,
                ImdsRead,
                ImdsWrite,
                PcfRead,
                PcfWrite,
                ChatUse,
            ],
            Role::Viewer => &[SuppliersRead, CampaignsRead, ImdsRead, PcfRead, ChatUse],
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub language: String,
    pub theme: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub language: Option<String>,
}

impl NewUser {
    pub fn validate(&mut self) -> DbResult<()> {
        if self.email.trim().is_empty() || self.name.trim().is_empty() {
            return Err(DbError::invalid("email and name are required"));
        }
        self.email = self.email.trim().to_ascii_lowercase();
        if !self.email.contains('@') {
            return Err(DbError::invalid(format!("invalid email: {}", self.email)));
        }
        require_text("name", &self.name)
    }
}

/// Partial update; the id travels in the body for `PUT /users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub language: Option<String>,
    pub theme: Option<String>,
    pub is_active: Option<bool>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /users` and `DELETE /users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserQuery {
    pub id: Option<i64>,
    pub email: Option<String>,
}
