//! Transport HTTP des enveloppes SOAP

use std::fmt;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;
use ureq::tls::TlsConfig;

/// Content-Type d'une enveloppe SOAP 1.2
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Chemin de l'endpoint SOAP sur le serveur ZCS
pub const DEFAULT_SOAP_PATH: &str = "/service/admin/soap";

/// Timeout de connexion par défaut
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Taille maximale d'une réponse par défaut (1 Gio).
///
/// Une recherche d'annuaire avec `applyCos` sur un gros domaine dépasse
/// largement la limite de 10 Mio de `ureq`.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 1024 * 1024 * 1024;

/// Échec d'un envoi : message de diagnostic et code numérique
/// (statut HTTP quand il est connu, 0 sinon)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
    pub code: u32,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>, code: u32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Envoi bloquant d'un document vers un endpoint fixe
pub trait Transport: Send {
    /// POST `payload` et retourne le corps brut de la réponse
    fn execute(&self, payload: &str) -> Result<Vec<u8>, TransportFailure>;
}

/// Options du transport HTTP
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Vérification des certificats TLS
    pub verify_tls: bool,
    pub connect_timeout: Duration,
    /// Au-delà, la lecture du corps échoue
    pub max_response_bytes: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            verify_tls: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Transport HTTP(S) basé sur `ureq`
pub struct HttpTransport {
    endpoint: String,
    agent: Agent,
    max_response_bytes: u64,
}

impl HttpTransport {
    /// Crée un transport vers `endpoint` avec les options par défaut
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_options(endpoint, HttpOptions::default())
    }

    /// Transport vers `https://server:port/service/admin/soap`
    pub fn for_server(server: &str, port: u16) -> Self {
        Self::new(format!("https://{server}:{port}{DEFAULT_SOAP_PATH}"))
    }

    pub fn with_options(endpoint: impl Into<String>, options: HttpOptions) -> Self {
        // Les faults arrivent en HTTP 500 : le corps doit rester lisible,
        // donc pas d'Error::StatusCode.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(options.connect_timeout))
            .tls_config(
                TlsConfig::builder()
                    .disable_verification(!options.verify_tls)
                    .build(),
            )
            .build();

        Self {
            endpoint: endpoint.into(),
            agent: config.into(),
            max_response_bytes: options.max_response_bytes,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn execute(&self, payload: &str) -> Result<Vec<u8>, TransportFailure> {
        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", SOAP_CONTENT_TYPE)
            .send(payload)
            .map_err(|err| {
                TransportFailure::new(
                    format!("HTTP error when sending SOAP request to {}: {err}", self.endpoint),
                    0,
                )
            })?;

        let status = u32::from(response.status().as_u16());

        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_vec()
            .map_err(|err| {
                TransportFailure::new(format!("Failed to read SOAP response body: {err}"), status)
            })?;

        debug!(endpoint = %self.endpoint, status, bytes = body.len(), "SOAP response received");

        if body.is_empty() {
            return Err(TransportFailure::new(
                format!("Empty response from {} (HTTP status {status})", self.endpoint),
                status,
            ));
        }

        Ok(body)
    }
}
