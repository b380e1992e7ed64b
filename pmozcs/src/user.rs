//! Requêtes d'un utilisateur authentifié (`urn:zimbraAccount`)
//!
//! Les appels partent dans le namespace compte, quel que soit celui du
//! client.

use crate::admin::{first_entity, response_children, response_element};
use crate::client::SoapClient;
use crate::entity::{Account, Entity};
use crate::error::{EntityKind, Result, ZcsError};
use crate::soap::{Namespace, Params};
use std::fmt;
use tracing::debug;

/// Dossier partagé par un compte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRef {
    pub owner_id: String,
    pub folder_id: String,
}

impl fmt::Display for ShareRef {
    /// `ownerId:folderId`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_id, self.folder_id)
    }
}

/// API utilisateur
pub struct UserApi<'a> {
    client: &'a mut SoapClient,
}

impl<'a> UserApi<'a> {
    pub fn new(client: &'a mut SoapClient) -> Self {
        Self { client }
    }

    /// Compte visible par l'utilisateur, par identifiant
    pub fn get_account(&mut self, account_id: &str) -> Result<Account> {
        let params = Params::new().object(
            "account",
            Params::new().text(account_id).attribute("by", "id"),
        );
        let body = self
            .client
            .request_in(Namespace::Account, "GetAccountRequest", &[], &params)?;

        first_entity(&body, "GetAccountResponse")?
            .ok_or(ZcsError::EntityNotFound(EntityKind::Account))
    }

    /// Premier partage publié par `username`.
    ///
    /// Son `ownerId` est l'identifiant du compte. `None` si le compte ne
    /// partage rien.
    pub fn get_account_id_by_username(&mut self, username: &str) -> Result<Option<ShareRef>> {
        let params = Params::new().object(
            "owner",
            Params::new().attribute("by", "name").text(username),
        );
        let body = self
            .client
            .request_in(Namespace::Account, "GetShareInfoRequest", &[], &params)?;

        let Some(share) = response_element(&body, "GetShareInfoResponse")?.get_child("share")
        else {
            debug!(username, "No share published");
            return Ok(None);
        };

        let attr = |key: &str| {
            share.attributes.get(key).cloned().ok_or_else(|| {
                ZcsError::malformed(format!("share of {username} has no {key} attribute"))
            })
        };

        Ok(Some(ShareRef {
            owner_id: attr("ownerId")?,
            folder_id: attr("folderId")?,
        }))
    }

    /// Recherche dans la GAL les entrées dont le nom commence par `query`
    pub fn search_gal(&mut self, query: &str) -> Result<Vec<Account>> {
        let params = Params::new().scalar("name", query).object(
            "searchFilter",
            Params::new().object(
                "conds",
                Params::new().object(
                    "cond",
                    Params::new().attributes([
                        ("attr", "name"),
                        ("op", "startswith"),
                        ("value", query),
                    ]),
                ),
            ),
        );
        let body = self
            .client
            .request_in(Namespace::Account, "SearchGalRequest", &[], &params)?;

        let contacts: Vec<Account> = response_children(&body, "SearchGalResponse")?
            .into_iter()
            .filter(|e| e.name == "cn")
            .map(Account::from_xml)
            .collect();

        debug!(query, count = contacts.len(), "GAL entries found");
        Ok(contacts)
    }
}
