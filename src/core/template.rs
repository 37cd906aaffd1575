//! Supplier invitation text rendered from embedded Tera templates

use miette::Diagnostic;
use rust_embed::Embed;
use tera::{Context, Tera};
use thiserror::Error;

use crate::entities::portal::IssuedToken;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const INVITATION: &str = "invitation.txt.tera";

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    #[diagnostic(code(sect::template::not_found))]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    #[diagnostic(code(sect::template::render))]
    RenderError(String),
}

/// Renders the texts sent to suppliers
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                let source = std::str::from_utf8(&content.data)
                    .map_err(|e| TemplateError::RenderError(format!("{}: {}", filename, e)))?;
                tera.add_raw_template(filename, source)
                    .map_err(|e| TemplateError::RenderError(e.to_string()))?;
            }
        }

        Ok(Self { tera })
    }

    /// Invitation email body for a freshly issued portal token
    pub fn invitation(&self, issued: &IssuedToken) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == INVITATION) {
            return Err(TemplateError::NotFound(INVITATION.to_string()));
        }

        let token = &issued.token;
        let days = (token.expires_at - token.created_at).num_hours().max(0) as f64 / 24.0;

        let mut context = Context::new();
        context.insert(
            "supplier_name",
            token
                .supplier_name
                .as_deref()
                .unwrap_or("votre entreprise"),
        );
        context.insert("contact_name", &token.contact_name);
        context.insert("campaign_name", &token.campaign_name);
        context.insert("portal_url", &issued.portal_url);
        context.insert("expires_days", &(days.round() as i64));
        context.insert(
            "expires_on",
            &token.expires_at.format("%Y-%m-%d").to_string(),
        );

        self.tera
            .render(INVITATION, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Database;
    use crate::entities::portal::TokenRequest;
    use crate::entities::supplier::NewSupplier;

    #[test]
    fn test_invitation_mentions_link_and_expiry() {
        let mut db = Database::open_in_memory().unwrap();
        let sup = db.create_supplier(NewSupplier::new("Valeo")).unwrap();
        let issued = db
            .issue_token(
                TokenRequest {
                    supplier_id: Some(sup.id),
                    contact_email: "pcf@valeo.example".to_string(),
                    contact_name: Some("Jeanne".to_string()),
                    expires_days: Some(14),
                    ..Default::default()
                },
                30,
                "https://sect.example/",
            )
            .unwrap();

        let text = TemplateRenderer::new().unwrap().invitation(&issued).unwrap();
        assert!(text.contains("Valeo"));
        assert!(text.contains("Bonjour Jeanne"));
        assert!(text.contains(&issued.portal_url));
        assert!(text.contains("14 jours"));
        assert!(!text.contains("campagne"));
    }
}
