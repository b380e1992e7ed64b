//! Requêtes d'administration des domaines

use super::{entity_list, first_entity};
use crate::client::SoapClient;
use crate::entity::Domain;
use crate::error::{EntityKind, Result, ZcsError};
use crate::soap::{Namespace, Params};

/// Clé de recherche d'un domaine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainBy {
    Id,
    #[default]
    Name,
    VirtualHostname,
}

impl DomainBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainBy::Id => "id",
            DomainBy::Name => "name",
            DomainBy::VirtualHostname => "virtualHostname",
        }
    }
}

/// API d'administration des domaines
pub struct DomainAdmin<'a> {
    client: &'a mut SoapClient,
}

impl<'a> DomainAdmin<'a> {
    pub fn new(client: &'a mut SoapClient) -> Self {
        Self { client }
    }

    pub fn get_domain(&mut self, domain: &str, by: DomainBy) -> Result<Domain> {
        let params = Params::new().object(
            "domain",
            Params::new().text(domain).attribute("by", by.as_str()),
        );
        let body = self
            .client
            .request_in(Namespace::Admin, "GetDomainRequest", &[], &params)?;

        first_entity(&body, "GetDomainResponse")?
            .ok_or(ZcsError::EntityNotFound(EntityKind::Domain))
    }

    /// Tous les domaines du serveur
    pub fn get_domain_list(&mut self) -> Result<Vec<Domain>> {
        let body = self.client.request_in(
            Namespace::Admin,
            "GetAllDomainsRequest",
            &[],
            &Params::new(),
        )?;

        entity_list(&body, "GetAllDomainsResponse")
    }
}
