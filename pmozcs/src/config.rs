//! Configuration du client ZCS
//!
//! Aucun fichier n'est requis : [`ZcsConfig::default()`] est valide. Une
//! configuration YAML peut être chargée puis surchargée par des variables
//! d'environnement `PMOZCS__<CHAMP>`.
//!
//! ```yaml
//! server: mail.example.com
//! port: 7071
//! username: admin@example.com
//! password: secret
//! namespace: admin
//! calendar:
//!   organizer_address: planning@example.com
//!   organizer_name: Planning
//!   room_domain: rooms.example.com
//! ```

use crate::soap::Namespace;
use crate::transport::{DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_SOAP_PATH, HttpOptions};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};
use tracing::info;

const ENV_PREFIX: &str = "PMOZCS__";

// Default values for configuration
const DEFAULT_PORT: u16 = 7071;
const DEFAULT_SCHEME: &str = "https";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_path() -> String {
    DEFAULT_SOAP_PATH.to_string()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_max_response_bytes() -> u64 {
    DEFAULT_MAX_RESPONSE_BYTES
}

fn default_namespace() -> String {
    Namespace::Account.urn().to_string()
}

/// Paramètres propres au déploiement pour les rendez-vous
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Adresse de l'organisateur des rendez-vous créés
    pub organizer_address: String,
    pub organizer_name: String,
    /// Domaine des adresses de salles (`<salle>@<room_domain>`)
    pub room_domain: String,
}

/// Configuration du client ZCS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZcsConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
    /// URN ou nom court (`admin`, `mail`...)
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub calendar: Option<CalendarSettings>,
}

impl Default for ZcsConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_PORT,
            scheme: default_scheme(),
            path: default_path(),
            username: None,
            password: None,
            verify_tls: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            namespace: default_namespace(),
            debug: false,
            calendar: None,
        }
    }
}

impl ZcsConfig {
    /// Parse une configuration YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid ZCS configuration")
    }

    /// Charge un fichier YAML puis applique les surcharges d'environnement
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading ZCS configuration");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read ZCS configuration {}", path.display()))?;

        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applique les variables `PMOZCS__<CHAMP>` présentes dans l'environnement
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|field| env::var(format!("{ENV_PREFIX}{field}")).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("SERVER") {
            self.server = Some(server);
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid {ENV_PREFIX}PORT value: {port}"))?;
        }
        if let Some(scheme) = lookup("SCHEME") {
            self.scheme = scheme;
        }
        if let Some(path) = lookup("PATH") {
            self.path = path;
        }
        if let Some(username) = lookup("USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("PASSWORD") {
            self.password = Some(password);
        }
        if let Some(verify) = lookup("VERIFY_TLS") {
            self.verify_tls = parse_bool(&verify)?;
        }
        if let Some(timeout) = lookup("CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid {ENV_PREFIX}CONNECT_TIMEOUT_SECS value: {timeout}"))?;
        }
        if let Some(max) = lookup("MAX_RESPONSE_BYTES") {
            self.max_response_bytes = max
                .parse()
                .with_context(|| format!("Invalid {ENV_PREFIX}MAX_RESPONSE_BYTES value: {max}"))?;
        }
        if let Some(namespace) = lookup("NAMESPACE") {
            self.namespace = namespace;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = parse_bool(&debug)?;
        }
        Ok(())
    }

    /// URL complète de l'endpoint SOAP
    pub fn endpoint(&self) -> Result<String> {
        let server = self
            .server
            .as_deref()
            .ok_or_else(|| anyhow!("No ZCS server configured"))?;
        Ok(format!("{}://{}:{}{}", self.scheme, server, self.port, self.path))
    }

    pub fn namespace(&self) -> Result<Namespace> {
        self.namespace.parse().map_err(|err: String| anyhow!(err))
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            verify_tls: self.verify_tls,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_response_bytes: self.max_response_bytes,
        }
    }

    /// Identifiants si les deux sont configurés
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid boolean value: {other}")),
    }
}
