//! # Module SOAP - enveloppes Zimbra
//!
//! Ce module implémente le format d'enveloppe propre au serveur ZCS :
//! un en-tête `context` (jeton d'authentification, session) conservé d'une
//! requête à l'autre, et un `Body` reconstruit avant chaque action.
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`] : document sortant (Header/context + Body/action)
//! - [`Params`] / [`Param`] : paramètres d'une action, encodés en XML
//! - [`SoapResponse`] : réponse parsée (Body ou Fault)
//! - [`Fault`] : erreur serveur, traduite par [`translate_fault_code`]
//!
//! ## Example
//!
//! ```
//! use pmozcs::soap::{Namespace, Params, SoapEnvelope, encode_params};
//!
//! let mut envelope = SoapEnvelope::new();
//! envelope.set_context_field("authToken", "0_abc");
//!
//! let action = envelope.add_action("GetAccountRequest", Namespace::Admin, &[]);
//! let params = Params::new().object(
//!     "account",
//!     Params::new().text("chris@example.com").attribute("by", "name"),
//! );
//! encode_params(action, &params);
//!
//! let xml = envelope.to_xml().unwrap();
//! assert!(xml.contains(r#"<account by="name">chris@example.com</account>"#));
//! ```

mod debug;
mod envelope;
mod fault;
mod params;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use debug::{TracingSink, WireDirection, WireSink, format_xml};
pub use envelope::SoapEnvelope;
pub use fault::{Fault, fault_codes, translate_fault_code};
pub use params::{AttrValue, Param, Params, encode_params};
pub use parser::{SoapResponse, parse_soap_response};

/// Namespace de l'enveloppe SOAP 1.2
pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Namespace de l'élément `context` et des erreurs serveur
pub const CONTEXT_NS: &str = "urn:zimbra";

/// Namespaces des actions ZCS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Account,
    Admin,
    AdminExt,
    Mail,
    Replication,
    Sync,
    Voice,
}

impl Namespace {
    /// URN utilisée dans l'attribut `xmlns` de l'action
    pub fn urn(&self) -> &'static str {
        match self {
            Namespace::Account => "urn:zimbraAccount",
            Namespace::Admin => "urn:zimbraAdmin",
            Namespace::AdminExt => "urn:zimbraAdminExt",
            Namespace::Mail => "urn:zimbraMail",
            Namespace::Replication => "urn:zimbraRepl",
            Namespace::Sync => "urn:zimbraSync",
            Namespace::Voice => "urn:zimbraVoice",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.urn())
    }
}

impl FromStr for Namespace {
    type Err = String;

    /// Accepte l'URN complète (`urn:zimbraAdmin`) ou le nom court (`admin`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.trim().trim_start_matches("urn:zimbra").to_ascii_lowercase();
        match short.as_str() {
            "" | "account" => Ok(Namespace::Account),
            "admin" => Ok(Namespace::Admin),
            "adminext" | "admin-ext" | "admin_ext" => Ok(Namespace::AdminExt),
            "mail" => Ok(Namespace::Mail),
            "repl" | "replication" => Ok(Namespace::Replication),
            "sync" => Ok(Namespace::Sync),
            "voice" => Ok(Namespace::Voice),
            _ => Err(format!("Unknown ZCS namespace: {s}")),
        }
    }
}
