//! Requêtes d'administration (`urn:zimbraAdmin`)
//!
//! Chaque API emprunte le client le temps des appels. Les requêtes partent
//! dans le namespace admin sans changer celui du client.
//!
//! # Exemple
//!
//! ```rust,no_run
//! use pmozcs::SoapClient;
//! use pmozcs::admin::{AccountAdmin, AccountBy};
//!
//! fn main() -> pmozcs::Result<()> {
//!     let mut client = SoapClient::connect("mail.example.com", 7071, "admin", "secret")?;
//!     let account = AccountAdmin::new(&mut client)
//!         .get_account("chris@example.com", AccountBy::Name, &[])?;
//!     println!("{:?}", account.host());
//!     Ok(())
//! }
//! ```

mod account;
mod alias;
mod domain;

pub use account::{AccountAdmin, AccountBy, QuotaUsage};
pub use alias::AliasAdmin;
pub use domain::{DomainAdmin, DomainBy};

use crate::entity::Entity;
use crate::error::{Result, ZcsError};
use xmltree::Element;

/// Exclut le compte de synchronisation GAL de chaque domaine
pub const GALSYNC_EXCLUSION_QUERY: &str = "!(uid=galsync)";

/// Élément de réponse `name` sous le `Body`
pub(crate) fn response_element<'a>(body: &'a Element, name: &str) -> Result<&'a Element> {
    body.get_child(name)
        .ok_or_else(|| ZcsError::malformed(format!("missing {name} element in SOAP body")))
}

/// Éléments enfants d'une réponse
pub(crate) fn response_children<'a>(body: &'a Element, name: &str) -> Result<Vec<&'a Element>> {
    Ok(response_element(body, name)?
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .collect())
}

/// Première entité d'une réponse
pub(crate) fn first_entity<E: Entity>(body: &Element, name: &str) -> Result<Option<E>> {
    Ok(response_children(body, name)?
        .into_iter()
        .next()
        .map(E::from_xml))
}

/// Toutes les entités d'une réponse
pub(crate) fn entity_list<E: Entity>(body: &Element, name: &str) -> Result<Vec<E>> {
    Ok(response_children(body, name)?
        .into_iter()
        .map(E::from_xml)
        .collect())
}
