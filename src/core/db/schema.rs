//! Database schema initialization

use rusqlite::OptionalExtension;

use super::{Database, SCHEMA_VERSION};
use crate::core::error::{DbError, DbResult};

impl Database {
    /// Create missing tables and verify the stored schema version
    pub(super) fn init_schema(&mut self) -> DbResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);",
        )?;

        let found: Option<i32> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .optional()?
            .flatten();

        if let Some(found) = found {
            if found > SCHEMA_VERSION {
                return Err(DbError::Schema {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
        }

        self.conn.execute_batch(
            r#"
            -- Supplier master data
            CREATE TABLE IF NOT EXISTS suppliers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT UNIQUE,
                name TEXT NOT NULL,
                parent_group TEXT,
                country_code TEXT,
                region TEXT,
                supplier_type TEXT,
                supply_chain_level TEXT,
                main_part_families TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_suppliers_name ON suppliers(name);
            CREATE INDEX IF NOT EXISTS idx_suppliers_country ON suppliers(country_code);

            CREATE TABLE IF NOT EXISTS supplier_contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
                full_name TEXT NOT NULL,
                role TEXT,
                email TEXT,
                phone TEXT,
                languages TEXT NOT NULL DEFAULT '[]',
                preferred_channels TEXT NOT NULL DEFAULT '[]',
                time_zone TEXT,
                is_primary INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_contacts_supplier ON supplier_contacts(supplier_id);

            -- One profile row per supplier
            CREATE TABLE IF NOT EXISTS imds_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL UNIQUE REFERENCES suppliers(id) ON DELETE CASCADE,
                imds_id TEXT,
                oems_served TEXT NOT NULL DEFAULT '[]',
                on_time_submission_rate REAL,
                oem_rejection_rate REAL,
                avg_submission_leadtime_days REAL,
                support_level TEXT,
                notes TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pcf_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL UNIQUE REFERENCES suppliers(id) ON DELETE CASCADE,
                pcf_maturity TEXT,
                tools_used TEXT NOT NULL DEFAULT '[]',
                pcf_count INTEGER NOT NULL DEFAULT 0,
                scopes_covered TEXT NOT NULL DEFAULT '[]',
                reference_years TEXT NOT NULL DEFAULT '[]',
                frameworks TEXT NOT NULL DEFAULT '[]',
                data_quality_score REAL,
                notes TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS supplier_hub_metadata (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL UNIQUE REFERENCES suppliers(id) ON DELETE CASCADE,
                priority TEXT,
                regulatory_risk TEXT,
                climate_risk TEXT,
                program_status TEXT,
                strategic_notes TEXT,
                updated_at TEXT NOT NULL
            );

            -- Campaigns and enrollment
            CREATE TABLE IF NOT EXISTS campaigns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                objective TEXT,
                start_date TEXT,
                end_date TEXT,
                target_part_families TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'draft',
                created_by TEXT NOT NULL DEFAULT 'system',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_campaigns_status ON campaigns(status);

            CREATE TABLE IF NOT EXISTS campaign_supplier_status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'not_started',
                last_contact_at TEXT,
                reminders_sent INTEGER NOT NULL DEFAULT 0,
                progression_score REAL,
                notes TEXT,
                updated_at TEXT NOT NULL,
                UNIQUE (campaign_id, supplier_id)
            );
            CREATE INDEX IF NOT EXISTS idx_css_supplier ON campaign_supplier_status(supplier_id);

            -- Submissions
            CREATE TABLE IF NOT EXISTS imds_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
                campaign_id INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
                internal_ref TEXT,
                mds_id TEXT NOT NULL,
                part_number TEXT NOT NULL,
                part_name TEXT,
                oem TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                rejection_reason TEXT,
                iteration_count INTEGER NOT NULL DEFAULT 0,
                submitted_at TEXT,
                validated_at TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_imds_supplier ON imds_submissions(supplier_id);
            CREATE INDEX IF NOT EXISTS idx_imds_campaign ON imds_submissions(campaign_id);

            CREATE TABLE IF NOT EXISTS pcf_declarations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
                campaign_id INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
                product_ref TEXT NOT NULL,
                product_name TEXT,
                perimeter TEXT NOT NULL,
                reference_year INTEGER NOT NULL,
                total_emissions_kgco2e REAL NOT NULL,
                method TEXT NOT NULL,
                frameworks TEXT NOT NULL DEFAULT '[]',
                emission_factor_sources TEXT NOT NULL DEFAULT '[]',
                uncertainty TEXT,
                validation_status TEXT NOT NULL DEFAULT 'pending',
                validation_notes TEXT,
                validated_at TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_pcf_supplier ON pcf_declarations(supplier_id);
            CREATE INDEX IF NOT EXISTS idx_pcf_campaign ON pcf_declarations(campaign_id);
            CREATE INDEX IF NOT EXISTS idx_pcf_created ON pcf_declarations(created_at);

            -- Supplier portal
            CREATE TABLE IF NOT EXISTS supplier_access_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
                campaign_id INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
                token TEXT NOT NULL UNIQUE,
                contact_email TEXT NOT NULL,
                contact_name TEXT,
                expires_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by TEXT,
                created_at TEXT NOT NULL,
                last_used_at TEXT,
                use_count INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_tokens_supplier ON supplier_access_tokens(supplier_id);

            CREATE TABLE IF NOT EXISTS portal_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                supplier_id INTEGER NOT NULL REFERENCES suppliers(id) ON DELETE CASCADE,
                campaign_id INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
                token_id INTEGER REFERENCES supplier_access_tokens(id) ON DELETE SET NULL,
                submission_type TEXT NOT NULL,
                mds_id TEXT,
                part_number TEXT,
                part_name TEXT,
                oem TEXT,
                product_name TEXT,
                emissions_total REAL,
                emissions_unit TEXT NOT NULL DEFAULT 'kg CO2e',
                perimeter TEXT,
                methodology TEXT,
                reference_year INTEGER,
                notes TEXT,
                attachments TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'draft',
                submitted_at TEXT,
                reviewed_at TEXT,
                reviewed_by TEXT,
                review_notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_portal_supplier ON portal_submissions(supplier_id);

            -- Back-office accounts
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                avatar_url TEXT,
                role TEXT NOT NULL DEFAULT 'viewer',
                department TEXT,
                job_title TEXT,
                language TEXT NOT NULL DEFAULT 'fr',
                theme TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                last_login_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Append-only audit trail
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                supplier_id INTEGER REFERENCES suppliers(id) ON DELETE SET NULL,
                campaign_id INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
                data TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
            "#,
        )?;

        if found.is_none() {
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }

        Ok(())
    }
}
