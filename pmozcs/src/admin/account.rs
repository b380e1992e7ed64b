//! Requêtes d'administration des comptes

use super::{GALSYNC_EXCLUSION_QUERY, entity_list, first_entity, response_element};
use crate::client::SoapClient;
use crate::entity::{Account, Entity, ID_KEY, NAME_KEY, property_params, strip_properties};
use crate::error::{EntityKind, Result, ZcsError};
use crate::soap::{Namespace, Params};
use tracing::{debug, info};

/// Propriétés jamais envoyées à la création
const CREATE_EXCLUDED: &[&str] = &[ID_KEY, NAME_KEY, "cn", "uid", "userPassword", "zimbraMailHost"];

/// Propriétés jamais envoyées à la mise à jour : le nom est immuable et
/// l'identifiant passe dans `<id>`
const UPDATE_EXCLUDED: &[&str] = &[ID_KEY, NAME_KEY, "uid", "userPassword", "zimbraMailHost"];

/// Clé de recherche d'un compte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountBy {
    #[default]
    Id,
    Name,
    ForeignPrincipal,
}

impl AccountBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountBy::Id => "id",
            AccountBy::Name => "name",
            AccountBy::ForeignPrincipal => "foreignPrincipal",
        }
    }
}

/// Quota d'un compte, en octets (`limit` à 0 : illimité)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub limit: u64,
    pub used: u64,
}

/// API d'administration des comptes
pub struct AccountAdmin<'a> {
    client: &'a mut SoapClient,
}

impl<'a> AccountAdmin<'a> {
    pub fn new(client: &'a mut SoapClient) -> Self {
        Self { client }
    }

    /// Récupère un compte.
    ///
    /// `attrs` limite les attributs renvoyés par le serveur.
    pub fn get_account(&mut self, account: &str, by: AccountBy, attrs: &[&str]) -> Result<Account> {
        let joined = attrs.join(",");
        let mut attributes = Vec::new();
        if !attrs.is_empty() {
            attributes.push(("attrs", joined.as_str()));
        }

        let params = Params::new().object(
            "account",
            Params::new().text(account).attribute("by", by.as_str()),
        );

        let body = self
            .client
            .request_in(Namespace::Admin, "GetAccountRequest", &attributes, &params)?;

        first_entity(&body, "GetAccountResponse")?
            .ok_or(ZcsError::EntityNotFound(EntityKind::Account))
    }

    /// Liste les comptes d'un domaine
    pub fn get_account_list_by_domain(&mut self, domain: &str) -> Result<Vec<Account>> {
        self.search_accounts(&[("domain", domain), ("applyCos", "1"), ("types", "accounts")])
    }

    /// Liste tous les comptes
    pub fn get_account_list(&mut self) -> Result<Vec<Account>> {
        self.search_accounts(&[("applyCos", "1"), ("types", "accounts")])
    }

    fn search_accounts(&mut self, attributes: &[(&str, &str)]) -> Result<Vec<Account>> {
        let params = Params::new().scalar("query", GALSYNC_EXCLUSION_QUERY);
        let body = self.client.request_in(
            Namespace::Admin,
            "SearchDirectoryRequest",
            attributes,
            &params,
        )?;

        let accounts: Vec<Account> = entity_list(&body, "SearchDirectoryResponse")?;
        debug!(count = accounts.len(), "Accounts found");
        Ok(accounts)
    }

    /// Crée un compte et retourne la version du serveur
    pub fn create_account(&mut self, account: &Account) -> Result<Account> {
        let mut properties = account.to_property_map();
        let name = properties
            .get(NAME_KEY)
            .and_then(|values| values.first())
            .cloned()
            .ok_or_else(|| ZcsError::InvalidEntity("account has no name".to_string()))?;
        let password = properties
            .get("userPassword")
            .and_then(|values| values.first())
            .cloned();

        strip_properties(&mut properties, CREATE_EXCLUDED);

        let mut params = Params::new().scalar("name", name.as_str());
        if let Some(password) = password {
            params = params.scalar("password", password);
        }
        for (key, param) in property_params(&properties).entries() {
            params = params.push(key.clone(), param.clone());
        }

        info!(name = %name, "Creating account");
        let body = self
            .client
            .request_in(Namespace::Admin, "CreateAccountRequest", &[], &params)?;

        first_entity(&body, "CreateAccountResponse")?
            .ok_or_else(|| ZcsError::malformed("CreateAccountResponse without account"))
    }

    /// Met à jour un compte existant
    pub fn update_account(&mut self, account: &Account) -> Result<Account> {
        let id = account
            .id()
            .ok_or_else(|| ZcsError::InvalidEntity("account has no id".to_string()))?;

        let mut properties = account.to_property_map();
        strip_properties(&mut properties, UPDATE_EXCLUDED);

        let mut params = Params::new().scalar("id", id);
        for (key, param) in property_params(&properties).entries() {
            params = params.push(key.clone(), param.clone());
        }

        info!(id, "Updating account");
        let body = self
            .client
            .request_in(Namespace::Admin, "ModifyAccountRequest", &[], &params)?;

        first_entity(&body, "ModifyAccountResponse")?
            .ok_or_else(|| ZcsError::malformed("ModifyAccountResponse without account"))
    }

    /// Quota et utilisation d'un compte
    pub fn get_account_quota_usage(&mut self, account_id: &str) -> Result<QuotaUsage> {
        let body = self.client.request_in(
            Namespace::Admin,
            "GetQuotaUsageRequest",
            &[],
            &Params::new(),
        )?;

        let record = response_element(&body, "GetQuotaUsageResponse")?
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .find(|e| {
                e.name == "account" && e.attributes.get("id").map(String::as_str) == Some(account_id)
            })
            .ok_or(ZcsError::EntityNotFound(EntityKind::Account))?;

        // limit="0" veut dire illimité : une valeur absente ne doit pas s'y confondre
        let read = |key: &str| {
            record
                .attributes
                .get(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .ok_or_else(|| {
                    ZcsError::malformed(format!(
                        "quota usage of account {account_id} has no valid {key} attribute"
                    ))
                })
        };

        Ok(QuotaUsage {
            limit: read("limit")?,
            used: read("used")?,
        })
    }

    /// Supprime un compte
    pub fn delete_account(&mut self, account_id: &str) -> Result<()> {
        info!(id = account_id, "Deleting account");
        self.client.request_in(
            Namespace::Admin,
            "DeleteAccountRequest",
            &[],
            &Params::new().scalar("id", account_id),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{MockTransport, body_xml, fault_xml};

    const ACCOUNT_FRAGMENT: &str = r#"<account name="chris@example.com" id="acc-1">
  <a n="uid">chris</a>
  <a n="zimbraMailHost">mail.example.com</a>
  <a n="zimbraAccountStatus">active</a>
</account>"#;

    fn client_with(transport: &MockTransport) -> SoapClient {
        SoapClient::with_transport(transport.clone())
    }

    #[test]
    fn get_account_sends_selector_and_attrs() {
        let transport = MockTransport::new();
        transport.reply(body_xml(&format!(
            r#"<GetAccountResponse xmlns="urn:zimbraAdmin">{ACCOUNT_FRAGMENT}</GetAccountResponse>"#
        )));
        let mut client = client_with(&transport);

        let account = AccountAdmin::new(&mut client)
            .get_account("chris@example.com", AccountBy::Name, &["uid", "zimbraMailHost"])
            .unwrap();

        assert_eq!(account.id(), Some("acc-1"));
        assert_eq!(account.host(), Some("mail.example.com"));

        let sent = transport.last_sent();
        assert!(sent.contains(
            r#"<GetAccountRequest xmlns="urn:zimbraAdmin" attrs="uid,zimbraMailHost">"#
        ));
        assert!(sent.contains(r#"<account by="name">chris@example.com</account>"#));
    }

    #[test]
    fn get_account_propagates_not_found() {
        let transport = MockTransport::new();
        transport.reply(fault_xml("account.NO_SUCH_ACCOUNT"));
        let mut client = client_with(&transport);

        let err = AccountAdmin::new(&mut client)
            .get_account("ghost", AccountBy::Id, &[])
            .unwrap_err();
        assert_eq!(err.not_found_kind(), Some(EntityKind::Account));
    }

    #[test]
    fn account_list_by_domain_excludes_galsync() {
        let transport = MockTransport::new();
        transport.reply(body_xml(&format!(
            r#"<SearchDirectoryResponse xmlns="urn:zimbraAdmin" more="0" searchTotal="2">{ACCOUNT_FRAGMENT}<account name="bob@example.com" id="acc-2"/></SearchDirectoryResponse>"#
        )));
        let mut client = client_with(&transport);

        let accounts = AccountAdmin::new(&mut client)
            .get_account_list_by_domain("example.com")
            .unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].name(), Some("bob@example.com"));

        let sent = transport.last_sent();
        assert!(sent.contains(r#"domain="example.com" applyCos="1" types="accounts""#));
        assert!(sent.contains("<query>!(uid=galsync)</query>"));
    }

    #[test]
    fn create_account_strips_server_managed_fields() {
        let transport = MockTransport::new();
        transport.reply(body_xml(&format!(
            r#"<CreateAccountResponse xmlns="urn:zimbraAdmin">{ACCOUNT_FRAGMENT}</CreateAccountResponse>"#
        )));
        let mut client = client_with(&transport);

        let mut account = Account::new("chris@example.com");
        account
            .set_id("should-not-be-sent")
            .set_password("s3cret")
            .set_username("chris")
            .set_common_name("Chris")
            .set_host("mail.example.com")
            .set_display_name("Chris R.");

        let created = AccountAdmin::new(&mut client).create_account(&account).unwrap();
        assert_eq!(created.id(), Some("acc-1"));

        let sent = transport.last_sent();
        assert!(sent.contains("<name>chris@example.com</name>"));
        assert!(sent.contains("<password>s3cret</password>"));
        assert!(sent.contains(r#"<a n="displayName">Chris R.</a>"#));
        assert!(!sent.contains("zimbraId"));
        assert!(!sent.contains("should-not-be-sent"));
        assert!(!sent.contains(r#"n="uid""#));
        assert!(!sent.contains(r#"n="cn""#));
        assert!(!sent.contains("userPassword"));
        assert!(!sent.contains("zimbraMailHost"));
    }

    #[test]
    fn update_account_sends_id_and_keeps_cn() {
        let transport = MockTransport::new();
        transport.reply(body_xml(&format!(
            r#"<ModifyAccountResponse xmlns="urn:zimbraAdmin">{ACCOUNT_FRAGMENT}</ModifyAccountResponse>"#
        )));
        let mut client = client_with(&transport);

        let mut account = Account::new("chris@example.com");
        account
            .set_id("acc-1")
            .set_password("VALUE-BLOCKED")
            .set_common_name("Chris")
            .set_account_status("locked");

        AccountAdmin::new(&mut client).update_account(&account).unwrap();

        let sent = transport.last_sent();
        assert!(sent.contains("<id>acc-1</id>"));
        assert!(sent.contains(r#"<a n="cn">Chris</a>"#));
        assert!(sent.contains(r#"<a n="zimbraAccountStatus">locked</a>"#));
        assert!(!sent.contains("VALUE-BLOCKED"));
        assert!(!sent.contains("<name>"));
    }

    #[test]
    fn update_account_without_id_is_rejected_before_dispatch() {
        let transport = MockTransport::new();
        let mut client = client_with(&transport);

        let err = AccountAdmin::new(&mut client)
            .update_account(&Account::new("x@example.com"))
            .unwrap_err();

        assert!(matches!(err, ZcsError::InvalidEntity(_)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn quota_usage_reads_matching_account() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<GetQuotaUsageResponse xmlns="urn:zimbraAdmin" more="0" searchTotal="2">
  <account name="a@example.com" id="acc-0" limit="0" used="10"/>
  <account name="chris@example.com" id="acc-1" limit="52428800" used="1024"/>
</GetQuotaUsageResponse>"#,
        ));
        let mut client = client_with(&transport);

        let usage = AccountAdmin::new(&mut client)
            .get_account_quota_usage("acc-1")
            .unwrap();
        assert_eq!(
            usage,
            QuotaUsage {
                limit: 52_428_800,
                used: 1024
            }
        );
    }

    #[test]
    fn quota_usage_without_limit_is_malformed() {
        let transport = MockTransport::new();
        transport
            .reply(body_xml(
                r#"<GetQuotaUsageResponse xmlns="urn:zimbraAdmin"><account name="chris@example.com" id="acc-1" used="1024"/></GetQuotaUsageResponse>"#,
            ))
            .reply(body_xml(
                r#"<GetQuotaUsageResponse xmlns="urn:zimbraAdmin"><account name="chris@example.com" id="acc-1" limit="lots" used="1024"/></GetQuotaUsageResponse>"#,
            ));
        let mut client = client_with(&transport);
        let mut admin = AccountAdmin::new(&mut client);

        for _ in 0..2 {
            let err = admin.get_account_quota_usage("acc-1").unwrap_err();
            assert!(matches!(
                err,
                ZcsError::Transport(crate::error::TransportError::MalformedResponse(_))
            ));
        }
    }

    #[test]
    fn unlimited_quota_reads_as_zero_limit() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<GetQuotaUsageResponse xmlns="urn:zimbraAdmin"><account name="chris@example.com" id="acc-1" limit="0" used="42"/></GetQuotaUsageResponse>"#,
        ));
        let mut client = client_with(&transport);

        let usage = AccountAdmin::new(&mut client)
            .get_account_quota_usage("acc-1")
            .unwrap();
        assert_eq!(usage, QuotaUsage { limit: 0, used: 42 });
    }

    #[test]
    fn delete_account_sends_id() {
        let transport = MockTransport::new();
        transport.reply(body_xml(r#"<DeleteAccountResponse xmlns="urn:zimbraAdmin"/>"#));
        let mut client = client_with(&transport);

        AccountAdmin::new(&mut client).delete_account("acc-1").unwrap();
        assert!(transport.last_sent().contains("<id>acc-1</id>"));
    }
}
