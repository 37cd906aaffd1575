//! Back-office user queries

use rusqlite::{params, Row};
use serde_json::json;

use super::{found, is_unique_violation, now_ts, opt_ts, ts, ts_text, Database};
use crate::core::error::{DbError, DbResult};
use crate::entities::user::{NewUser, Role, User, UserPatch, DEFAULT_LANGUAGE};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        name: row.get("name")?,
        avatar_url: row.get("avatar_url")?,
        role: row.get("role")?,
        department: row.get("department")?,
        job_title: row.get("job_title")?,
        language: row.get("language")?,
        theme: row.get("theme")?,
        is_active: row.get("is_active")?,
        last_login_at: opt_ts(row, "last_login_at")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

impl Database {
    /// Active user with this email
    pub fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        let email = email.trim().to_ascii_lowercase();
        found(
            self.conn.query_row(
                "SELECT * FROM users WHERE email = ?1 AND is_active = 1",
                [&email],
                user_from_row,
            ),
            "user",
            email,
        )
    }

    pub fn get_user(&self, id: i64) -> DbResult<User> {
        found(
            self.conn
                .query_row("SELECT * FROM users WHERE id = ?1", [id], user_from_row),
            "user",
            id,
        )
    }

    /// All users, newest first
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM users ORDER BY created_at DESC, id DESC")?;
        let rows = stmt.query_map([], user_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn create_user(&mut self, mut new: NewUser) -> DbResult<User> {
        new.validate()?;
        let role = new.role.unwrap_or(Role::Viewer);
        let language = new
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);

        let result = self.conn.execute(
            "INSERT INTO users (email, name, avatar_url, role, department, job_title, language,
                                is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
            params![
                new.email,
                new.name.trim(),
                new.avatar_url,
                role,
                new.department,
                new.job_title,
                language,
                now_ts(),
            ],
        );
        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(DbError::Conflict(format!("user {} already exists", new.email)));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.record_event("user.created", None, None, json!({ "id": id, "role": role }))?;
        self.get_user(id)
    }

    pub fn update_user(&mut self, id: i64, patch: UserPatch) -> DbResult<User> {
        let current = self.get_user(id)?;
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DbError::invalid("name is required"));
            }
        }

        self.conn.execute(
            "UPDATE users SET
                name = COALESCE(?2, name),
                avatar_url = COALESCE(?3, avatar_url),
                role = COALESCE(?4, role),
                department = COALESCE(?5, department),
                job_title = COALESCE(?6, job_title),
                language = COALESCE(?7, language),
                theme = COALESCE(?8, theme),
                is_active = COALESCE(?9, is_active),
                last_login_at = COALESCE(?10, last_login_at),
                updated_at = ?11
             WHERE id = ?1",
            params![
                id,
                patch.name.as_deref().map(str::trim),
                patch.avatar_url,
                patch.role,
                patch.department,
                patch.job_title,
                patch.language,
                patch.theme,
                patch.is_active,
                patch.last_login_at.map(ts_text),
                now_ts(),
            ],
        )?;

        let mut data = json!({ "id": id });
        if let Some(role) = patch.role.filter(|r| *r != current.role) {
            data["from"] = json!(current.role);
            data["to"] = json!(role);
        }
        self.record_event("user.updated", None, None, data)?;
        self.get_user(id)
    }

    /// Soft delete: the row stays but the user can no longer sign in
    pub fn deactivate_user(&mut self, id: i64) -> DbResult<User> {
        self.get_user(id)?;
        self.conn.execute(
            "UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1",
            params![id, now_ts()],
        )?;
        self.record_event("user.deactivated", None, None, json!({ "id": id }))?;
        self.get_user(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Option<Role>) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Camille Martin".to_string(),
            role,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults() {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user(new_user("camille@oem.example", None)).unwrap();
        assert_eq!(user.role, Role::Viewer);
        assert_eq!(user.language, "fr");
        assert!(user.is_active);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_user(new_user("camille@oem.example", None)).unwrap();
        let err = db
            .create_user(new_user("Camille@OEM.example", Some(Role::Admin)))
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn test_lookup_by_email_skips_inactive() {
        let mut db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(new_user("steward@oem.example", Some(Role::DataSteward)))
            .unwrap();
        assert_eq!(db.get_user_by_email("STEWARD@oem.example").unwrap().id, user.id);

        db.deactivate_user(user.id).unwrap();
        assert!(matches!(
            db.get_user_by_email("steward@oem.example"),
            Err(DbError::NotFound { .. })
        ));
        assert!(!db.get_user(user.id).unwrap().is_active);
    }

    #[test]
    fn test_update_and_list() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db.create_user(new_user("a@oem.example", None)).unwrap();
        let b = db.create_user(new_user("b@oem.example", None)).unwrap();

        let promoted = db
            .update_user(
                a.id,
                UserPatch {
                    role: Some(Role::QualityManager),
                    theme: Some("dark".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(promoted.role, Role::QualityManager);
        assert_eq!(promoted.theme.as_deref(), Some("dark"));
        assert_eq!(promoted.name, "Camille Martin");

        let ids: Vec<i64> = db.list_users().unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn test_every_update_is_recorded() {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user(new_user("alice@oem.example", None)).unwrap();

        db.update_user(
            user.id,
            UserPatch {
                name: Some("Alice B".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let events = db.recent_events(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "user.updated");
        assert!(events[0].data.get("from").is_none());

        db.update_user(
            user.id,
            UserPatch {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .unwrap();
        let events = db.recent_events(10).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data["from"], "viewer");
        assert_eq!(events[0].data["to"], "admin");
    }
}
