//! Session and identity rendering

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use super::Formattable;
use super::json::format_json;
use super::table::{FieldRow, format_table};
use crate::cli::OutputFormat;
use credkeeper::client::{Identity, Role};
use credkeeper::config::Config;
use credkeeper::error::Result;
use credkeeper::session::{Session, fingerprint};
use credkeeper::store::StoreBackend;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Point-in-time view of the session and where it lives.
///
/// Credentials are shown as fingerprints only.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub config_file: String,
    pub api_url: String,
    pub store: String,
    pub authenticated: bool,
    pub admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    pub renewal_held: bool,
}

impl SessionSummary {
    pub fn new(session: &Session, config: &Config, config_path: &Path) -> Result<Self> {
        let store = match config.store {
            StoreBackend::Memory => "memory".to_string(),
            backend => format!(
                "{} ({})",
                store_name(backend),
                config.store_location()?.display()
            ),
        };
        let identity = session.identity.as_ref();

        Ok(Self {
            config_file: config_path.display().to_string(),
            api_url: config.api_url.clone(),
            store,
            authenticated: session.is_authenticated(),
            admin: session.is_admin(),
            username: identity.map(|i| i.username.clone()),
            email: identity.map(|i| i.email.clone()),
            role: identity.map(|i| i.role),
            access: session.access.as_deref().map(fingerprint),
            renewal_held: session.renewal.is_some(),
        })
    }

    fn pretty(&self) -> String {
        let mut lines = vec![
            format!("{}\n", "credkeeper Session Status".bold()),
            format!("Config file: {}", self.config_file.cyan()),
            format!("API URL: {}", self.api_url.cyan()),
            format!("Store: {}", self.store),
            String::new(),
        ];

        match (&self.username, self.authenticated) {
            (Some(username), true) => {
                let role = self.role.map(|r| r.to_string()).unwrap_or_default();
                lines.push(format!(
                    "{} Signed in as {} ({})",
                    "✓".green(),
                    username.bold(),
                    role
                ));
                if let Some(ref email) = self.email {
                    lines.push(format!("  Email: {}", email));
                }
                if let Some(ref access) = self.access {
                    lines.push(format!("  Access credential: {}", access.dimmed()));
                }
                if self.renewal_held {
                    lines.push(format!("{} Renewal credential held", "✓".green()));
                } else {
                    lines.push(format!(
                        "{} No renewal credential (session ends when access expires)",
                        "○".dimmed()
                    ));
                }
            }
            _ => {
                lines.push(format!("{} Not signed in", "✗".red()));
                lines.push("  → Run 'credkeeper login' to sign in".to_string());
            }
        }

        lines.join("\n")
    }

    fn rows(&self) -> Vec<FieldRow> {
        vec![
            FieldRow::new("Config file", self.config_file.clone()),
            FieldRow::new("API URL", self.api_url.clone()),
            FieldRow::new("Store", self.store.clone()),
            FieldRow::new("Authenticated", yes_no(self.authenticated)),
            FieldRow::new("Admin", yes_no(self.admin)),
            FieldRow::new("Username", self.username.clone().unwrap_or_default()),
            FieldRow::new("Email", self.email.clone().unwrap_or_default()),
            FieldRow::new("Access", self.access.clone().unwrap_or_default()),
            FieldRow::new("Renewal held", yes_no(self.renewal_held)),
        ]
    }
}

impl Formattable for SessionSummary {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.pretty()),
            OutputFormat::Table => Ok(format_table(&self.rows())),
            OutputFormat::Json => Ok(format_json(self)?),
        }
    }
}

impl Formattable for Identity {
    fn format(&self, format: OutputFormat) -> Result<String> {
        let last_login = self
            .last_login
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| "never".to_string());

        match format {
            OutputFormat::Pretty => Ok([
                format!("{} ({})", self.username.bold(), self.role),
                format!("  Email: {}", self.email),
                format!("  Member since: {}", self.created_at.format(TIME_FORMAT)),
                format!("  Last login: {}", last_login),
            ]
            .join("\n")),
            OutputFormat::Table => Ok(format_table(&[
                FieldRow::new("ID", self.id.to_string()),
                FieldRow::new("Username", self.username.clone()),
                FieldRow::new("Email", self.email.clone()),
                FieldRow::new("Role", self.role.to_string()),
                FieldRow::new("Created", self.created_at.format(TIME_FORMAT).to_string()),
                FieldRow::new("Last login", last_login),
            ])),
            OutputFormat::Json => Ok(format_json(self)?),
        }
    }
}

fn store_name(backend: StoreBackend) -> &'static str {
    match backend {
        StoreBackend::File => "file",
        StoreBackend::Sqlite => "sqlite",
        StoreBackend::Memory => "memory",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
