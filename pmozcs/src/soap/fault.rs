//! SOAP Faults ZCS

use crate::error::{EntityKind, ZcsError};
use xmltree::Element;

/// Codes de fault connus
pub mod fault_codes {
    pub const NO_SUCH_DOMAIN: &str = "account.NO_SUCH_DOMAIN";
    pub const NO_SUCH_ACCOUNT: &str = "account.NO_SUCH_ACCOUNT";
    pub const NO_SUCH_ALIAS: &str = "account.NO_SUCH_ALIAS";
    pub const NO_SUCH_COS: &str = "account.NO_SUCH_COS";
}

/// Erreur SOAP (Fault) renvoyée par le serveur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Code d'erreur (ex: "account.NO_SUCH_ACCOUNT")
    pub code: String,

    /// Description lisible
    pub reason: Option<String>,

    /// Trace de diagnostic, opaque
    pub trace: Option<String>,
}

impl Fault {
    /// Extrait un fault d'un élément `Fault`.
    ///
    /// Le code vient de `Detail/Error/Code`, à défaut de `Code/Value`.
    pub fn from_element(fault: &Element) -> Self {
        let error = fault
            .get_child("Detail")
            .and_then(|detail| detail.get_child("Error"));

        let code = error
            .and_then(|e| child_text(e, "Code"))
            .or_else(|| {
                fault
                    .get_child("Code")
                    .and_then(|c| child_text(c, "Value"))
            })
            .unwrap_or_default();

        let reason = fault
            .get_child("Reason")
            .and_then(|r| child_text(r, "Text"));

        let trace = error.and_then(|e| child_text(e, "Trace"));

        Self {
            code,
            reason,
            trace,
        }
    }

    /// Convertit le fault en erreur typée
    pub fn into_error(self) -> ZcsError {
        match translate_fault_code(&self.code) {
            ZcsError::Webservice { code, .. } => ZcsError::Webservice {
                code,
                reason: self.reason,
                trace: self.trace,
            },
            known => known,
        }
    }
}

fn child_text(parent: &Element, name: &str) -> Option<String> {
    parent
        .get_child(name)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Traduit un code de fault en erreur typée.
///
/// Les codes inconnus donnent une [`ZcsError::Webservice`] qui porte le
/// code brut, inchangé.
pub fn translate_fault_code(code: &str) -> ZcsError {
    match code {
        fault_codes::NO_SUCH_DOMAIN => ZcsError::EntityNotFound(EntityKind::Domain),
        fault_codes::NO_SUCH_ACCOUNT => ZcsError::EntityNotFound(EntityKind::Account),
        fault_codes::NO_SUCH_ALIAS => ZcsError::EntityNotFound(EntityKind::Alias),
        fault_codes::NO_SUCH_COS => ZcsError::EntityNotFound(EntityKind::Cos),
        other => ZcsError::Webservice {
            code: other.to_string(),
            reason: None,
            trace: None,
        },
    }
}
