use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use evently_crypto::cipher::PLACEHOLDER_SECRETS;

/// Runtime configuration, read once at startup from `EVENTLY_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub docs_db_path: PathBuf,
    pub jwt_secret: String,
    pub encryption_secret: String,
    pub public_dir: PathBuf,
    pub public_url: String,
    pub payment_url: Option<String>,
    pub admin_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let port = or("EVENTLY_PORT", "3000")
            .parse()
            .context("EVENTLY_PORT must be a port number")?;

        Ok(Self {
            host: or("EVENTLY_HOST", "0.0.0.0"),
            port,
            db_path: or("EVENTLY_DB_PATH", "evently.db").into(),
            docs_db_path: or("EVENTLY_DOCS_DB_PATH", "evently-docs.db").into(),
            jwt_secret: required_secret(var("EVENTLY_JWT_SECRET"), "EVENTLY_JWT_SECRET")?,
            encryption_secret: required_secret(
                var("EVENTLY_ENCRYPTION_SECRET"),
                "EVENTLY_ENCRYPTION_SECRET",
            )?,
            public_dir: or("EVENTLY_PUBLIC_DIR", "public").into(),
            public_url: or("EVENTLY_PUBLIC_URL", "http://localhost:3000"),
            payment_url: var("EVENTLY_PAYMENT_URL"),
            admin_email: var("EVENTLY_ADMIN_EMAIL"),
        })
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join("uploads")
    }
}

fn required_secret(value: Option<String>, key: &str) -> Result<String> {
    match value {
        None => bail!("{key} is unset; set it in the environment or .env"),
        Some(v) if PLACEHOLDER_SECRETS.contains(&v.as_str()) => {
            bail!("{key} is still a placeholder value")
        }
        Some(v) => Ok(v),
    }
}
