//! Gestion des erreurs pour le client SOAP ZCS

use std::fmt;
use thiserror::Error;

/// Type Result personnalisé pour pmozcs
pub type Result<T> = std::result::Result<T, ZcsError>;

/// Type d'entité manquante signalée par un fault `account.NO_SUCH_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Domain,
    Account,
    Alias,
    /// Class of service
    Cos,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Domain => "Domain",
            EntityKind::Account => "Account",
            EntityKind::Alias => "Alias",
            EntityKind::Cos => "Cos",
        };
        f.write_str(label)
    }
}

/// Erreurs de communication avec le webservice
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Aucun transport configuré sur le client
    #[error(
        "No valid connection has been established, have you connected and authenticated with the ZCS Soap webservice?"
    )]
    NotConnected,

    /// Échec réseau, timeout ou réponse vide
    #[error("Transport failure (code {code}): {message}")]
    Failed { message: String, code: u32 },

    /// La réponse n'est pas un document XML exploitable
    #[error("Malformed SOAP response: {0}")]
    MalformedResponse(String),
}

/// Erreurs possibles lors de l'utilisation du client ZCS
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZcsError {
    /// Erreur de transport (pas de connexion, réseau, réponse illisible)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Entité inconnue du serveur (fault `account.NO_SUCH_*`)
    #[error("{0} cannot be found")]
    EntityNotFound(EntityKind),

    /// Tout autre fault serveur, le code est conservé tel quel
    #[error("{code}")]
    Webservice {
        code: String,
        reason: Option<String>,
        trace: Option<String>,
    },

    /// Échec de sérialisation de l'enveloppe sortante
    #[error("XML serialization error: {0}")]
    Xml(String),

    /// Paramètres de requête mal formés
    #[error("Invalid request params: {0}")]
    InvalidParams(String),

    /// Objet d'entrée inutilisable pour construire une entité
    #[error("Invalid entity input: {0}")]
    InvalidEntity(String),
}

impl ZcsError {
    /// Crée une erreur de transport depuis un message et un code
    pub fn transport_failed(message: impl Into<String>, code: u32) -> Self {
        ZcsError::Transport(TransportError::Failed {
            message: message.into(),
            code,
        })
    }

    /// Crée une erreur de réponse malformée
    pub fn malformed(message: impl Into<String>) -> Self {
        ZcsError::Transport(TransportError::MalformedResponse(message.into()))
    }

    /// Vérifie si l'erreur vient de la couche transport
    pub fn is_transport(&self) -> bool {
        matches!(self, ZcsError::Transport(_))
    }

    /// Vérifie si l'erreur signale une entité introuvable
    pub fn is_not_found(&self) -> bool {
        matches!(self, ZcsError::EntityNotFound(_))
    }

    /// Retourne le type d'entité introuvable, s'il y a lieu
    pub fn not_found_kind(&self) -> Option<EntityKind> {
        match self {
            ZcsError::EntityNotFound(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Retourne le code de fault brut d'une erreur webservice
    pub fn fault_code(&self) -> Option<&str> {
        match self {
            ZcsError::Webservice { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<xmltree::Error> for ZcsError {
    fn from(err: xmltree::Error) -> Self {
        ZcsError::Xml(err.to_string())
    }
}
