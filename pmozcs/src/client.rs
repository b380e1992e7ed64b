//! Client SOAP ZCS
//!
//! Ce module fournit [`SoapClient`], qui orchestre une requête complète :
//! remise à zéro du `Body`, construction de l'action, envoi par le
//! [`Transport`], parsing de la réponse et traduction des faults.
//!
//! Un client possède une enveloppe mutable : il n'est pas fait pour être
//! partagé entre threads. Chaque appelant concurrent utilise son propre
//! client.

use crate::config::ZcsConfig;
use crate::error::{Result, TransportError, ZcsError};
use crate::soap::{
    Namespace, Params, SoapEnvelope, TracingSink, WireDirection, WireSink, encode_params,
    format_xml, parse_soap_response,
};
use crate::transport::{HttpTransport, Transport};
use tracing::{debug, info, warn};
use xmltree::Element;

/// Client SOAP bas-niveau
pub struct SoapClient {
    envelope: SoapEnvelope,
    transport: Option<Box<dyn Transport>>,
    namespace: Namespace,
    debug: bool,
    sink: Box<dyn WireSink>,
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SoapClient {
    /// Crée un client sans transport.
    ///
    /// Toute requête échoue avec [`TransportError::NotConnected`] tant
    /// qu'aucun transport n'est défini.
    pub fn new() -> Self {
        Self {
            envelope: SoapEnvelope::new(),
            transport: None,
            namespace: Namespace::default(),
            debug: false,
            sink: Box::new(TracingSink),
        }
    }

    /// Crée un client utilisant `transport`
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        let mut client = Self::new();
        client.set_transport(transport);
        client
    }

    /// Crée un client HTTPS vers `server:port` et s'authentifie
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use pmozcs::SoapClient;
    ///
    /// fn main() -> pmozcs::Result<()> {
    ///     let client = SoapClient::connect("mail.example.com", 7071, "admin", "secret")?;
    ///     println!("{:?}", client.context_field("authToken"));
    ///     Ok(())
    /// }
    /// ```
    pub fn connect(server: &str, port: u16, username: &str, password: &str) -> Result<Self> {
        let mut client = Self::with_transport(HttpTransport::for_server(server, port));
        client.authenticate(username, password)?;
        Ok(client)
    }

    /// Crée un client depuis une [`ZcsConfig`].
    ///
    /// S'authentifie si des identifiants sont configurés.
    pub fn from_config(config: &ZcsConfig) -> anyhow::Result<Self> {
        let endpoint = config.endpoint()?;
        info!(endpoint = %endpoint, "Creating ZCS SOAP client");

        let mut client = Self::with_transport(HttpTransport::with_options(
            endpoint,
            config.http_options(),
        ));
        client.set_namespace(config.namespace()?);
        client.set_debug(config.debug);

        if let Some((username, password)) = config.credentials() {
            client.authenticate(username, password)?;
        }

        Ok(client)
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Some(Box::new(transport));
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Namespace utilisé par [`SoapClient::request`]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn set_namespace(&mut self, namespace: Namespace) {
        self.namespace = namespace;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Active ou coupe l'écho des messages SOAP
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Remplace la destination de l'écho debug
    pub fn set_wire_sink(&mut self, sink: impl WireSink + 'static) {
        self.sink = Box::new(sink);
    }

    /// S'authentifie et conserve le jeton dans le `context`.
    ///
    /// Toutes les requêtes suivantes de ce client sont authentifiées.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<String> {
        info!(username, "Authenticating against ZCS");

        let params = Params::new()
            .scalar("account", username)
            .scalar("password", password);
        let body = self.request("AuthRequest", &[], &params)?;

        let token = body
            .get_child("AuthResponse")
            .and_then(|response| response.get_child("authToken"))
            .and_then(|elem| elem.get_text())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ZcsError::malformed("AuthResponse without authToken"))?;

        self.set_context_field("authToken", &token);
        debug!("Authentication successful");

        Ok(token)
    }

    /// Envoie une action dans le namespace courant et retourne le `Body`
    pub fn request(
        &mut self,
        action: &str,
        attributes: &[(&str, &str)],
        params: &Params,
    ) -> Result<Element> {
        let namespace = self.namespace;
        self.request_in(namespace, action, attributes, params)
    }

    /// Envoie une action dans `namespace` sans changer celui du client
    pub fn request_in(
        &mut self,
        namespace: Namespace,
        action: &str,
        attributes: &[(&str, &str)],
        params: &Params,
    ) -> Result<Element> {
        let Some(transport) = self.transport.as_ref() else {
            return Err(TransportError::NotConnected.into());
        };

        self.envelope.reset_body();
        let action_elem = self.envelope.add_action(action, namespace, attributes);
        encode_params(action_elem, params);

        let xml = self.envelope.to_xml()?;
        if self.debug {
            self.sink.emit(WireDirection::Request, &format_xml(&xml));
        }

        debug!(action, namespace = %namespace, "Sending SOAP request");
        let raw = transport
            .execute(&xml)
            .map_err(|failure| ZcsError::transport_failed(failure.message, failure.code))?;

        if raw.is_empty() {
            return Err(ZcsError::transport_failed(
                format!("Empty response for {action}"),
                0,
            ));
        }

        if self.debug {
            let text = String::from_utf8_lossy(&raw);
            self.sink.emit(WireDirection::Response, &format_xml(&text));
        }

        let response = parse_soap_response(&raw)?;
        if let Some(fault) = response.fault() {
            warn!(action, code = %fault.code, "ZCS returned a SOAP fault");
            return Err(fault.into_error());
        }

        Ok(response.body)
    }

    /// Définit un champ du `context` (mise à jour sur place si présent)
    pub fn set_context_field(&mut self, name: &str, value: &str) {
        self.envelope.set_context_field(name, value);
    }

    /// Élément `context` envoyé avec chaque requête
    pub fn context(&self) -> &Element {
        self.envelope.context()
    }

    pub fn context_field(&self, name: &str) -> Option<String> {
        self.envelope.context_field(name)
    }

    /// Dernière enveloppe construite, sérialisée
    pub fn to_xml(&self) -> Result<String> {
        self.envelope.to_xml()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::EntityKind;
    use crate::transport::TransportFailure;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    pub(crate) const AUTH_TOKEN: &str = "0_1c1c96a3c39aa5771c14a954b386d45e0da24be9_69643d33363a31386662303831662d386663642d343834332d616239372d6135663465653937666339303b6578703d31333a313333363639383637373436383b61646d696e3d313a313b76763d313a313b747970653d363a7a696d6272613b";

    pub(crate) fn auth_success_xml() -> String {
        format!(
            r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Header>
    <context xmlns="urn:zimbra">
      <change token="9836"/>
    </context>
  </soap:Header>
  <soap:Body>
    <AuthResponse xmlns="urn:zimbraAdmin">
      <authToken>{AUTH_TOKEN}</authToken>
      <lifetime>43200000</lifetime>
      <a n="zimbraIsDomainAdminAccount">false</a>
    </AuthResponse>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    pub(crate) fn fault_xml(code: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Header>
    <context xmlns="urn:zimbra"/>
  </soap:Header>
  <soap:Body>
    <soap:Fault>
      <soap:Code>
        <soap:Value>soap:Sender</soap:Value>
      </soap:Code>
      <soap:Reason>
        <soap:Text>authentication failed for [admin]</soap:Text>
      </soap:Reason>
      <soap:Detail>
        <Error xmlns="urn:zimbra">
          <Code>{code}</Code>
          <Trace>btpool0-14://mail.webruimte.eu:7071/service/admin/soap:1336654190637:40a62659afaeacf2</Trace>
        </Error>
      </soap:Detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    pub(crate) fn body_xml(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Header><context xmlns="urn:zimbra"/></soap:Header>
  <soap:Body>{inner}</soap:Body>
</soap:Envelope>"#
        )
    }

    /// Transport scripté : rejoue des réponses et garde les requêtes envoyées
    #[derive(Clone, Default)]
    pub(crate) struct MockTransport {
        responses: Arc<Mutex<VecDeque<std::result::Result<Vec<u8>, TransportFailure>>>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(&self, xml: impl Into<String>) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(xml.into().into_bytes()));
            self
        }

        pub(crate) fn fail(&self, message: &str, code: u32) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(TransportFailure::new(message, code)));
            self
        }

        pub(crate) fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        pub(crate) fn last_sent(&self) -> String {
            self.sent().last().cloned().unwrap_or_default()
        }
    }

    impl Transport for MockTransport {
        fn execute(&self, payload: &str) -> std::result::Result<Vec<u8>, TransportFailure> {
            self.sent.lock().unwrap().push(payload.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl WireSink for RecordingSink {
        fn emit(&self, direction: WireDirection, xml: &str) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("{}\n{}", direction.banner(), xml));
        }
    }

    #[test]
    fn failed_auth_returns_webservice_error_with_code() {
        let transport = MockTransport::new();
        transport.reply(fault_xml("account.AUTH_FAILED"));
        let mut client = SoapClient::with_transport(transport);

        let err = client.authenticate("foo", "bar").unwrap_err();
        assert_eq!(err.fault_code(), Some("account.AUTH_FAILED"));
        assert_eq!(err.to_string(), "account.AUTH_FAILED");
        assert!(client.context_field("authToken").is_none());
    }

    #[test]
    fn context_holds_token_after_successful_auth() {
        let transport = MockTransport::new();
        transport.reply(auth_success_xml());
        let mut client = SoapClient::with_transport(transport);

        let token = client.authenticate("foo", "bar").unwrap();
        assert_eq!(token, AUTH_TOKEN);

        let context = client.context();
        let auth = context.get_child("authToken").unwrap();
        assert_eq!(auth.get_text().as_deref(), Some(AUTH_TOKEN));
    }

    #[test]
    fn request_without_transport_is_not_connected() {
        let mut client = SoapClient::new();

        let err = client.authenticate("foo", "bar").unwrap_err();
        assert_eq!(err, ZcsError::Transport(TransportError::NotConnected));
    }

    #[test]
    fn failed_transport_keeps_message_and_code() {
        let transport = MockTransport::new();
        transport.fail("Could not resolve host: zcs.invalid", 6);
        let mut client = SoapClient::with_transport(transport);

        let err = client.authenticate("foo", "bar").unwrap_err();
        assert_eq!(
            err,
            ZcsError::Transport(TransportError::Failed {
                message: "Could not resolve host: zcs.invalid".to_string(),
                code: 6,
            })
        );
    }

    #[test]
    fn empty_response_is_a_transport_failure_not_a_parse_error() {
        let transport = MockTransport::new();
        transport.reply("");
        let mut client = SoapClient::with_transport(transport);

        let err = client.authenticate("foo", "bar").unwrap_err();
        assert!(matches!(
            err,
            ZcsError::Transport(TransportError::Failed { .. })
        ));
    }

    #[test]
    fn garbage_response_is_malformed() {
        let transport = MockTransport::new();
        transport.reply("<html><body>502 Bad Gateway");
        let mut client = SoapClient::with_transport(transport);

        let err = client.request("NoOpRequest", &[], &Params::new()).unwrap_err();
        assert!(matches!(
            err,
            ZcsError::Transport(TransportError::MalformedResponse(_))
        ));
    }

    #[test]
    fn known_fault_maps_to_entity_not_found() {
        let transport = MockTransport::new();
        transport.reply(fault_xml("account.NO_SUCH_ACCOUNT"));
        let mut client = SoapClient::with_transport(transport);

        let err = client
            .request("GetAccountRequest", &[], &Params::new())
            .unwrap_err();
        assert_eq!(err, ZcsError::EntityNotFound(EntityKind::Account));
    }

    #[test]
    fn request_accepts_params_and_attributes() {
        let transport = MockTransport::new();
        transport
            .reply(auth_success_xml())
            .reply(auth_success_xml())
            .reply(auth_success_xml());
        let mut client = SoapClient::with_transport(transport.clone());
        client.authenticate("foo", "bar").unwrap();

        client
            .request("foobar", &[], &Params::new().scalar("id", "foobarbaz"))
            .unwrap();
        assert!(client.to_xml().unwrap().contains("<id>foobarbaz</id>"));

        client
            .request("foobar", &[("name", "fizzbuzz")], &Params::new())
            .unwrap();
        let xml = transport.last_sent();
        assert!(xml.contains(r#"name="fizzbuzz""#));
        assert!(!xml.contains("<id>foobarbaz</id>"));
        assert!(xml.contains(&format!("<authToken>{AUTH_TOKEN}</authToken>")));
    }

    #[test]
    fn request_uses_client_namespace_unless_overridden() {
        let transport = MockTransport::new();
        transport.reply(auth_success_xml()).reply(auth_success_xml());
        let mut client = SoapClient::with_transport(transport.clone());
        client.set_namespace(Namespace::Admin);

        client.request("PingRequest", &[], &Params::new()).unwrap();
        assert!(transport.last_sent().contains(r#"<PingRequest xmlns="urn:zimbraAdmin""#));

        client
            .request_in(Namespace::Mail, "PingRequest", &[], &Params::new())
            .unwrap();
        assert!(transport.last_sent().contains(r#"<PingRequest xmlns="urn:zimbraMail""#));
        assert_eq!(client.namespace(), Namespace::Admin);
    }

    #[test]
    fn debug_echoes_request_and_response_only_when_enabled() {
        let transport = MockTransport::new();
        transport.reply(auth_success_xml()).reply(auth_success_xml());
        let sink = RecordingSink::default();
        let mut client = SoapClient::with_transport(transport);
        client.set_wire_sink(sink.clone());

        client.authenticate("foo", "bar").unwrap();
        assert!(sink.lines.lock().unwrap().is_empty());

        client.set_debug(true);
        client.authenticate("foo", "bar").unwrap();

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("## REQUEST"));
        assert!(lines[0].contains("AuthRequest"));
        assert!(lines[1].starts_with("## RESPONSE"));
        assert!(lines[1].contains("AuthResponse"));
    }
}
