//! # pmozcs - Client SOAP pour Zimbra Collaboration Suite
//!
//! Cette crate fournit un client bloquant pour l'API SOAP d'un serveur ZCS :
//! construction des enveloppes, envoi HTTP(S), parsing des réponses et
//! traduction des faults en erreurs typées.
//!
//! ## Vue d'ensemble
//!
//! - Authentification (`AuthRequest`) et conservation du jeton dans le
//!   `context` de l'enveloppe
//! - Envoi de n'importe quelle action avec des [`Params`] ordonnés
//! - Entités typées ([`Account`], [`Alias`], [`Domain`]) construites depuis
//!   les réponses
//! - Requêtes d'administration ([`admin`]), utilisateur ([`user`]) et de
//!   calendrier ([`mail`])
//!
//! ## Structure des modules
//!
//! ```text
//! pmozcs/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # SoapClient : requête/réponse
//! │   ├── transport.rs        # Transport HTTP (ureq)
//! │   ├── config.rs           # Configuration YAML + environnement
//! │   ├── error.rs            # Gestion des erreurs
//! │   ├── soap/               # Enveloppe, paramètres, faults, parsing
//! │   ├── entity/             # Account, Alias, Domain
//! │   ├── admin/              # Requêtes urn:zimbraAdmin
//! │   ├── user.rs             # Requêtes urn:zimbraAccount
//! │   └── mail.rs             # Calendrier urn:zimbraMail
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmozcs::SoapClient;
//! use pmozcs::admin::AccountAdmin;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut client = SoapClient::connect("mail.example.com", 7071, "admin", "secret")?;
//!
//!     for account in AccountAdmin::new(&mut client).get_account_list_by_domain("example.com")? {
//!         println!("{:?} {:?}", account.name(), account.account_status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Gestion des erreurs
//!
//! ```rust,ignore
//! use pmozcs::{EntityKind, ZcsError};
//!
//! match admin.get_account("ghost@example.com", AccountBy::Name, &[]) {
//!     Ok(account) => println!("{:?}", account.id()),
//!     Err(ZcsError::EntityNotFound(EntityKind::Account)) => println!("Unknown account"),
//!     Err(ZcsError::Webservice { code, .. }) => println!("Server fault {code}"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
//!
//! ## Debug
//!
//! [`SoapClient::set_debug`] fait écrire chaque requête et chaque réponse,
//! indentées, précédées de `## REQUEST` / `## RESPONSE`. Par défaut elles
//! partent dans `tracing` (cible `pmozcs::wire`).

pub mod admin;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod mail;
pub mod soap;
pub mod transport;
pub mod user;

pub use client::SoapClient;
pub use config::{CalendarSettings, ZcsConfig};
pub use entity::{Account, Alias, AttributeBag, Domain, Entity};
pub use error::{EntityKind, Result, TransportError, ZcsError};
pub use soap::{Namespace, Param, Params};
pub use transport::{HttpOptions, HttpTransport, Transport, TransportFailure};
