//! Requêtes d'administration des alias

use super::{entity_list, first_entity};
use crate::client::SoapClient;
use crate::entity::Alias;
use crate::error::{EntityKind, Result, ZcsError};
use crate::soap::{Namespace, Params};
use tracing::info;

const ALIAS_SEARCH: &[(&str, &str)] = &[("types", "aliases")];

/// API d'administration des alias
pub struct AliasAdmin<'a> {
    client: &'a mut SoapClient,
}

impl<'a> AliasAdmin<'a> {
    pub fn new(client: &'a mut SoapClient) -> Self {
        Self { client }
    }

    /// Récupère un alias par son identifiant
    pub fn get_alias(&mut self, alias_id: &str) -> Result<Alias> {
        let params = Params::new().scalar("query", format!("(zimbraId={alias_id})"));
        let body = self.client.request_in(
            Namespace::Admin,
            "SearchDirectoryRequest",
            ALIAS_SEARCH,
            &params,
        )?;

        first_entity(&body, "SearchDirectoryResponse")?
            .ok_or(ZcsError::EntityNotFound(EntityKind::Alias))
    }

    /// Alias pointant vers un compte
    pub fn get_alias_list_by_account(&mut self, account_id: &str) -> Result<Vec<Alias>> {
        let params = Params::new().scalar("query", format!("(zimbraAliasTargetId={account_id})"));
        let body = self.client.request_in(
            Namespace::Admin,
            "SearchDirectoryRequest",
            ALIAS_SEARCH,
            &params,
        )?;

        entity_list(&body, "SearchDirectoryResponse")
    }

    /// Ajoute un alias au compte cible.
    ///
    /// Le serveur ne renvoie ni l'alias créé ni son identifiant : seul le
    /// succès de l'appel est connu.
    pub fn create_alias(&mut self, alias: &Alias) -> Result<()> {
        let target = alias
            .target_id()
            .ok_or_else(|| ZcsError::InvalidEntity("alias has no target id".to_string()))?;
        let name = alias
            .name()
            .ok_or_else(|| ZcsError::InvalidEntity("alias has no name".to_string()))?;

        info!(alias = name, target, "Adding account alias");
        let params = Params::new().scalar("id", target).scalar("alias", name);
        self.client
            .request_in(Namespace::Admin, "AddAccountAliasRequest", &[], &params)?;
        Ok(())
    }
}
