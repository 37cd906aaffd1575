//! Supplier portal queries - access tokens and portal submissions
//!
//! A token grants one supplier contact access to the portal, optionally
//! scoped to a single campaign. Every token-authenticated call checks the
//! token again; nothing is cached between calls.

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension, Row, ToSql};
use serde_json::json;

use super::{found, json_list, list, now_ts, opt_ts, ts, ts_text, Database};
use crate::core::error::{DbError, DbResult};
use crate::entities::portal::{
    fingerprint, generate_token, portal_url, AccessToken, IssuedToken, NewPortalSubmission,
    PortalPatch, PortalStatus, PortalSubmission, TokenRequest, DEFAULT_EMISSIONS_UNIT,
};

/// Admin listings return at most this many rows
pub const ADMIN_LIST_LIMIT: i64 = 100;

const TOKEN_SELECT: &str = "SELECT t.*, s.name AS supplier_name, c.name AS campaign_name
     FROM supplier_access_tokens t
     LEFT JOIN suppliers s ON s.id = t.supplier_id
     LEFT JOIN campaigns c ON c.id = t.campaign_id";

const SUBMISSION_SELECT: &str = "SELECT ps.*, s.name AS supplier_name, c.name AS campaign_name
     FROM portal_submissions ps
     LEFT JOIN suppliers s ON s.id = ps.supplier_id
     LEFT JOIN campaigns c ON c.id = ps.campaign_id";

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<AccessToken> {
    Ok(AccessToken {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        campaign_id: row.get("campaign_id")?,
        token: row.get("token")?,
        contact_email: row.get("contact_email")?,
        contact_name: row.get("contact_name")?,
        expires_at: ts(row, "expires_at")?,
        is_active: row.get("is_active")?,
        created_by: row.get("created_by")?,
        created_at: ts(row, "created_at")?,
        last_used_at: opt_ts(row, "last_used_at")?,
        use_count: row.get("use_count")?,
        supplier_name: row.get("supplier_name")?,
        campaign_name: row.get("campaign_name")?,
    })
}

fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<PortalSubmission> {
    Ok(PortalSubmission {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        campaign_id: row.get("campaign_id")?,
        token_id: row.get("token_id")?,
        submission_type: row.get("submission_type")?,
        mds_id: row.get("mds_id")?,
        part_number: row.get("part_number")?,
        part_name: row.get("part_name")?,
        oem: row.get("oem")?,
        product_name: row.get("product_name")?,
        emissions_total: row.get("emissions_total")?,
        emissions_unit: row.get("emissions_unit")?,
        perimeter: row.get("perimeter")?,
        methodology: row.get("methodology")?,
        reference_year: row.get("reference_year")?,
        notes: row.get("notes")?,
        attachments: list(row, "attachments")?,
        status: row.get("status")?,
        submitted_at: opt_ts(row, "submitted_at")?,
        reviewed_at: opt_ts(row, "reviewed_at")?,
        reviewed_by: row.get("reviewed_by")?,
        review_notes: row.get("review_notes")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
        supplier_name: row.get("supplier_name")?,
        campaign_name: row.get("campaign_name")?,
    })
}

fn invalid_token() -> DbError {
    DbError::Unauthorized("invalid or expired token".to_string())
}

impl Database {
    /// Issue a new portal token for a supplier contact
    pub fn issue_token(
        &mut self,
        req: TokenRequest,
        default_days: i64,
        public_url: &str,
    ) -> DbResult<IssuedToken> {
        let (supplier_id, days) = req.validate(default_days)?;
        self.get_supplier(supplier_id)?;
        if let Some(campaign_id) = req.campaign_id {
            self.get_campaign(campaign_id)?;
        }

        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + Duration::days(days);

        self.conn.execute(
            "INSERT INTO supplier_access_tokens (supplier_id, campaign_id, token, contact_email,
                                                 contact_name, expires_at, is_active, created_by,
                                                 created_at, use_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, 0)",
            params![
                supplier_id,
                req.campaign_id,
                token,
                req.contact_email.trim(),
                req.contact_name,
                ts_text(expires_at),
                req.created_by,
                ts_text(now),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.record_event(
            "portal.token_issued",
            Some(supplier_id),
            req.campaign_id,
            json!({ "token_id": id, "fingerprint": fingerprint(&token), "expires_days": days }),
        )?;

        let url = portal_url(public_url, &token);
        Ok(IssuedToken {
            token: self.get_token(id)?,
            portal_url: url,
        })
    }

    pub fn get_token(&self, id: i64) -> DbResult<AccessToken> {
        found(
            self.conn
                .query_row(&format!("{} WHERE t.id = ?1", TOKEN_SELECT), [id], token_from_row),
            "token",
            id,
        )
    }

    /// Find an active, unexpired token without recording a use
    pub fn lookup_token(&self, token: &str) -> DbResult<AccessToken> {
        self.conn
            .query_row(
                &format!(
                    "{} WHERE t.token = ?1 AND t.is_active = 1 AND t.expires_at > ?2",
                    TOKEN_SELECT
                ),
                params![token, now_ts()],
                token_from_row,
            )
            .optional()?
            .ok_or_else(invalid_token)
    }

    /// Check a token and record the use
    pub fn verify_token(&mut self, token: &str) -> DbResult<AccessToken> {
        let found = self.lookup_token(token)?;
        self.conn.execute(
            "UPDATE supplier_access_tokens
             SET last_used_at = ?2, use_count = use_count + 1
             WHERE id = ?1",
            params![found.id, now_ts()],
        )?;
        self.record_event(
            "portal.token_used",
            Some(found.supplier_id),
            found.campaign_id,
            json!({ "token_id": found.id, "fingerprint": fingerprint(&found.token) }),
        )?;
        self.get_token(found.id)
    }

    /// Tokens newest first; without a supplier the listing is capped
    pub fn list_tokens(&self, supplier_id: Option<i64>) -> DbResult<Vec<AccessToken>> {
        let mut stmt;
        let rows = match supplier_id {
            Some(sid) => {
                stmt = self.conn.prepare(&format!(
                    "{} WHERE t.supplier_id = ?1 ORDER BY t.created_at DESC, t.id DESC",
                    TOKEN_SELECT
                ))?;
                stmt.query_map([sid], token_from_row)?
            }
            None => {
                stmt = self.conn.prepare(&format!(
                    "{} ORDER BY t.created_at DESC, t.id DESC LIMIT ?1",
                    TOKEN_SELECT
                ))?;
                stmt.query_map([ADMIN_LIST_LIMIT], token_from_row)?
            }
        };
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Deactivate a token selected by id or by its value
    pub fn revoke_token(&mut self, id: Option<i64>, token: Option<&str>) -> DbResult<AccessToken> {
        let changed = match (id, token) {
            (Some(id), _) => self.conn.execute(
                "UPDATE supplier_access_tokens SET is_active = 0 WHERE id = ?1",
                [id],
            )?,
            (None, Some(token)) => self.conn.execute(
                "UPDATE supplier_access_tokens SET is_active = 0 WHERE token = ?1",
                [token],
            )?,
            (None, None) => return Err(DbError::invalid("id or token is required")),
        };
        if changed == 0 {
            return Err(DbError::not_found(
                "token",
                id.map(|i| i.to_string())
                    .unwrap_or_else(|| token.map(fingerprint).unwrap_or_default()),
            ));
        }

        let revoked = match id {
            Some(id) => self.get_token(id)?,
            None => found(
                self.conn.query_row(
                    &format!("{} WHERE t.token = ?1", TOKEN_SELECT),
                    [token.unwrap_or_default()],
                    token_from_row,
                ),
                "token",
                "",
            )?,
        };
        self.record_event(
            "portal.token_revoked",
            Some(revoked.supplier_id),
            revoked.campaign_id,
            json!({ "token_id": revoked.id, "fingerprint": fingerprint(&revoked.token) }),
        )?;
        Ok(revoked)
    }

    pub fn get_submission(&self, id: i64) -> DbResult<PortalSubmission> {
        found(
            self.conn.query_row(
                &format!("{} WHERE ps.id = ?1", SUBMISSION_SELECT),
                [id],
                submission_from_row,
            ),
            "submission",
            id,
        )
    }

    /// One submission, as seen by a token holder; anything outside the
    /// token's supplier and campaign is reported as forbidden
    pub fn get_submission_for_token(&self, token: &str, id: i64) -> DbResult<PortalSubmission> {
        let access = self.lookup_token(token)?;
        let submission = self.get_submission(id).map_err(|e| match e {
            DbError::NotFound { .. } => DbError::Forbidden("access denied".to_string()),
            other => other,
        })?;
        if !access.covers(submission.supplier_id, submission.campaign_id) {
            return Err(DbError::Forbidden("access denied".to_string()));
        }
        Ok(submission)
    }

    /// Submissions visible to a token holder
    pub fn list_submissions_for_token(&self, token: &str) -> DbResult<Vec<PortalSubmission>> {
        let access = self.lookup_token(token)?;
        let mut sql = format!("{} WHERE ps.supplier_id = ?", SUBMISSION_SELECT);
        let mut values: Vec<&dyn ToSql> = Vec::new();
        values.push(&access.supplier_id);
        if let Some(campaign_id) = &access.campaign_id {
            sql.push_str(" AND ps.campaign_id = ?");
            values.push(campaign_id);
        }
        sql.push_str(" ORDER BY ps.created_at DESC, ps.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(values.as_slice(), submission_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Admin listing, newest first
    pub fn list_submissions(&self, supplier_id: Option<i64>) -> DbResult<Vec<PortalSubmission>> {
        let mut stmt;
        let rows = match supplier_id {
            Some(sid) => {
                stmt = self.conn.prepare(&format!(
                    "{} WHERE ps.supplier_id = ?1 ORDER BY ps.created_at DESC, ps.id DESC",
                    SUBMISSION_SELECT
                ))?;
                stmt.query_map([sid], submission_from_row)?
            }
            None => {
                stmt = self.conn.prepare(&format!(
                    "{} ORDER BY ps.created_at DESC, ps.id DESC LIMIT ?1",
                    SUBMISSION_SELECT
                ))?;
                stmt.query_map([ADMIN_LIST_LIMIT], submission_from_row)?
            }
        };
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Create a draft; supplier and campaign come from the token
    pub fn create_submission(&mut self, req: NewPortalSubmission) -> DbResult<PortalSubmission> {
        let access = self.lookup_token(&req.token)?;
        let kind = req.submission_type()?;
        if let Some(total) = req.emissions_total {
            if !total.is_finite() || total < 0.0 {
                return Err(DbError::invalid("emissions_total must be a non-negative number"));
            }
        }

        let now = now_ts();
        let unit = req
            .emissions_unit
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_EMISSIONS_UNIT);

        self.conn.execute(
            "INSERT INTO portal_submissions (supplier_id, campaign_id, token_id, submission_type,
                                             mds_id, part_number, part_name, oem, product_name,
                                             emissions_total, emissions_unit, perimeter,
                                             methodology, reference_year, notes, attachments,
                                             status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?18)",
            params![
                access.supplier_id,
                access.campaign_id,
                access.id,
                kind,
                req.mds_id,
                req.part_number,
                req.part_name,
                req.oem,
                req.product_name,
                req.emissions_total,
                unit,
                req.perimeter,
                req.methodology,
                req.reference_year,
                req.notes,
                json_list(&req.attachments),
                PortalStatus::Draft,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.record_event(
            "portal.submission_created",
            Some(access.supplier_id),
            access.campaign_id,
            json!({ "id": id, "type": kind }),
        )?;
        self.get_submission(id)
    }

    /// Update a submission, either as the supplier (with a token) or as a reviewer
    pub fn update_submission(&mut self, id: i64, patch: PortalPatch) -> DbResult<PortalSubmission> {
        if let Some(token) = patch.token.as_deref() {
            self.get_submission_for_token(token, id)?;
            if let Some(status) = patch.status {
                if !status.supplier_settable() {
                    return Err(DbError::Forbidden(format!(
                        "suppliers cannot set status '{}'",
                        status
                    )));
                }
            }
        } else {
            self.get_submission(id)?;
        }
        if let Some(total) = patch.emissions_total {
            if !total.is_finite() || total < 0.0 {
                return Err(DbError::invalid("emissions_total must be a non-negative number"));
            }
        }

        let now = now_ts();
        let submitted_at = (patch.status == Some(PortalStatus::Submitted)).then(|| now.clone());
        let review = patch.status.map_or(false, |s| s.is_review());
        let reviewed_at = review.then(|| now.clone());
        let reviewed_by = if review { patch.reviewed_by.clone() } else { None };
        let review_notes = if review { patch.review_notes.clone() } else { None };
        let attachments = patch.attachments.as_deref().map(json_list);

        self.conn.execute(
            "UPDATE portal_submissions SET
                mds_id = COALESCE(?2, mds_id),
                part_number = COALESCE(?3, part_number),
                part_name = COALESCE(?4, part_name),
                oem = COALESCE(?5, oem),
                product_name = COALESCE(?6, product_name),
                emissions_total = COALESCE(?7, emissions_total),
                emissions_unit = COALESCE(?8, emissions_unit),
                perimeter = COALESCE(?9, perimeter),
                methodology = COALESCE(?10, methodology),
                reference_year = COALESCE(?11, reference_year),
                notes = COALESCE(?12, notes),
                attachments = COALESCE(?13, attachments),
                status = COALESCE(?14, status),
                submitted_at = COALESCE(?15, submitted_at),
                reviewed_at = COALESCE(?16, reviewed_at),
                reviewed_by = COALESCE(?17, reviewed_by),
                review_notes = COALESCE(?18, review_notes),
                updated_at = ?19
             WHERE id = ?1",
            params![
                id,
                patch.mds_id,
                patch.part_number,
                patch.part_name,
                patch.oem,
                patch.product_name,
                patch.emissions_total,
                patch.emissions_unit,
                patch.perimeter,
                patch.methodology,
                patch.reference_year,
                patch.notes,
                attachments,
                patch.status,
                submitted_at,
                reviewed_at,
                reviewed_by,
                review_notes,
                now,
            ],
        )?;

        let updated = self.get_submission(id)?;
        self.record_event(
            "portal.submission_updated",
            Some(updated.supplier_id),
            updated.campaign_id,
            json!({ "id": id, "status": updated.status }),
        )?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::campaign::{CampaignType, NewCampaign};
    use crate::entities::portal::SubmissionType;
    use crate::entities::supplier::NewSupplier;

    const URL: &str = "http://localhost:3000";

    struct Fixture {
        db: Database,
        supplier: i64,
        other: i64,
        campaign: i64,
    }

    fn fixture() -> Fixture {
        let mut db = Database::open_in_memory().unwrap();
        let supplier = db.create_supplier(NewSupplier::new("Continental")).unwrap().id;
        let other = db.create_supplier(NewSupplier::new("Plastic Omnium")).unwrap().id;
        let campaign = db
            .create_campaign(NewCampaign::new("PCF 2025", CampaignType::Pcf))
            .unwrap()
            .id;
        Fixture {
            db,
            supplier,
            other,
            campaign,
        }
    }

    fn issue(db: &mut Database, supplier: i64, campaign: Option<i64>) -> String {
        db.issue_token(
            TokenRequest {
                supplier_id: Some(supplier),
                campaign_id: campaign,
                contact_email: "contact@supplier.example".to_string(),
                ..Default::default()
            },
            30,
            URL,
        )
        .unwrap()
        .token
        .token
    }

    fn draft(token: &str, kind: &str) -> NewPortalSubmission {
        NewPortalSubmission {
            token: token.to_string(),
            submission_type: Some(kind.to_string()),
            product_name: Some("Brake caliper".to_string()),
            emissions_total: Some(18.2),
            ..Default::default()
        }
    }

    #[test]
    fn test_issue_returns_portal_url() {
        let mut f = fixture();
        let issued = f
            .db
            .issue_token(
                TokenRequest {
                    supplier_id: Some(f.supplier),
                    contact_email: "a@b.example".to_string(),
                    expires_days: Some(7),
                    ..Default::default()
                },
                30,
                URL,
            )
            .unwrap();
        assert_eq!(issued.token.token.len(), 64);
        assert_eq!(
            issued.portal_url,
            format!("{}/portal?token={}", URL, issued.token.token)
        );
        assert_eq!(issued.token.supplier_name.as_deref(), Some("Continental"));
        let days = (issued.token.expires_at - issued.token.created_at).num_days();
        assert_eq!(days, 7);
    }

    #[test]
    fn test_issue_for_unknown_supplier() {
        let mut f = fixture();
        let err = f
            .db
            .issue_token(
                TokenRequest {
                    supplier_id: Some(999),
                    contact_email: "a@b.example".to_string(),
                    ..Default::default()
                },
                30,
                URL,
            )
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_verify_counts_uses() {
        let mut f = fixture();
        let token = issue(&mut f.db, f.supplier, None);
        f.db.verify_token(&token).unwrap();
        let again = f.db.verify_token(&token).unwrap();
        assert_eq!(again.use_count, 2);
        assert!(again.last_used_at.is_some());

        let events = f.db.recent_events(10).unwrap();
        let used: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == "portal.token_used")
            .collect();
        assert_eq!(used.len(), 2);
        assert_eq!(used[0].supplier_id, Some(f.supplier));
        assert_eq!(used[0].data["token_id"], again.id);
        assert!(!used[0].data.to_string().contains(&token));

        assert!(matches!(
            f.db.verify_token("not-a-token"),
            Err(DbError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut f = fixture();
        let token = issue(&mut f.db, f.supplier, None);
        f.db.conn
            .execute(
                "UPDATE supplier_access_tokens SET expires_at = ?1",
                [ts_text(Utc::now() - Duration::minutes(1))],
            )
            .unwrap();
        assert!(matches!(
            f.db.verify_token(&token),
            Err(DbError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_revoke_by_id_or_token() {
        let mut f = fixture();
        let a = issue(&mut f.db, f.supplier, None);
        let b = issue(&mut f.db, f.supplier, None);

        let revoked = f.db.revoke_token(None, Some(&a)).unwrap();
        assert!(!revoked.is_active);
        assert!(f.db.verify_token(&a).is_err());

        let b_id = f.db.lookup_token(&b).unwrap().id;
        f.db.revoke_token(Some(b_id), None).unwrap();
        assert!(f.db.verify_token(&b).is_err());

        assert!(matches!(
            f.db.revoke_token(None, None),
            Err(DbError::Invalid(_))
        ));
        assert!(matches!(
            f.db.revoke_token(Some(999), None),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_tokens() {
        let mut f = fixture();
        issue(&mut f.db, f.supplier, None);
        let newest = issue(&mut f.db, f.other, None);

        let all = f.db.list_tokens(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].token, newest);
        assert_eq!(f.db.list_tokens(Some(f.supplier)).unwrap().len(), 1);
    }

    #[test]
    fn test_submission_scoped_to_token() {
        let mut f = fixture();
        let scoped = issue(&mut f.db, f.supplier, Some(f.campaign));
        let open = issue(&mut f.db, f.supplier, None);

        let sub = f.db.create_submission(draft(&scoped, "pcf")).unwrap();
        assert_eq!(sub.supplier_id, f.supplier);
        assert_eq!(sub.campaign_id, Some(f.campaign));
        assert_eq!(sub.status, PortalStatus::Draft);
        assert_eq!(sub.emissions_unit, "kg CO2e");
        assert_eq!(sub.submission_type, SubmissionType::Pcf);

        f.db.create_submission(draft(&open, "imds")).unwrap();

        assert_eq!(f.db.list_submissions_for_token(&scoped).unwrap().len(), 1);
        assert_eq!(f.db.list_submissions_for_token(&open).unwrap().len(), 2);
        assert_eq!(f.db.list_submissions(Some(f.other)).unwrap().len(), 0);
    }

    #[test]
    fn test_campaign_token_cannot_reach_other_campaigns() {
        let mut f = fixture();
        let scoped = issue(&mut f.db, f.supplier, Some(f.campaign));
        let open = issue(&mut f.db, f.supplier, None);
        let outside = f.db.create_submission(draft(&open, "imds")).unwrap();
        let inside = f.db.create_submission(draft(&scoped, "pcf")).unwrap();

        assert_eq!(f.db.get_submission_for_token(&scoped, inside.id).unwrap().id, inside.id);
        assert_eq!(f.db.get_submission_for_token(&open, inside.id).unwrap().id, inside.id);
        assert!(matches!(
            f.db.get_submission_for_token(&scoped, outside.id),
            Err(DbError::Forbidden(_))
        ));

        let err = f
            .db
            .update_submission(
                outside.id,
                PortalPatch {
                    token: Some(scoped),
                    notes: Some("edited from another campaign".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Forbidden(_)));
        assert_eq!(f.db.get_submission(outside.id).unwrap().notes, None);
    }

    #[test]
    fn test_create_submission_errors() {
        let mut f = fixture();
        let token = issue(&mut f.db, f.supplier, None);
        assert!(matches!(
            f.db.create_submission(draft("bogus", "pcf")),
            Err(DbError::Unauthorized(_))
        ));
        assert!(matches!(
            f.db.create_submission(draft(&token, "reach")),
            Err(DbError::Invalid(_))
        ));
    }

    #[test]
    fn test_supplier_update_rules() {
        let mut f = fixture();
        let mine = issue(&mut f.db, f.supplier, None);
        let theirs = issue(&mut f.db, f.other, None);
        let sub = f.db.create_submission(draft(&mine, "pcf")).unwrap();

        let submitted = f
            .db
            .update_submission(
                sub.id,
                PortalPatch {
                    token: Some(mine.clone()),
                    status: Some(PortalStatus::Submitted),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(submitted.status, PortalStatus::Submitted);
        assert!(submitted.submitted_at.is_some());

        let err = f
            .db
            .update_submission(
                sub.id,
                PortalPatch {
                    token: Some(theirs),
                    notes: Some("hijack".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Forbidden(_)));

        let err = f
            .db
            .update_submission(
                sub.id,
                PortalPatch {
                    token: Some(mine),
                    status: Some(PortalStatus::Validated),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Forbidden(_)));
    }

    #[test]
    fn test_review_stamps() {
        let mut f = fixture();
        let token = issue(&mut f.db, f.supplier, None);
        let sub = f.db.create_submission(draft(&token, "imds")).unwrap();

        let reviewed = f
            .db
            .update_submission(
                sub.id,
                PortalPatch {
                    status: Some(PortalStatus::Rejected),
                    reviewed_by: Some("quality@oem.example".to_string()),
                    review_notes: Some("Missing MDS id".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(reviewed.reviewed_at.is_some());
        assert_eq!(reviewed.reviewed_by.as_deref(), Some("quality@oem.example"));
        assert_eq!(reviewed.review_notes.as_deref(), Some("Missing MDS id"));
    }
}
