//! Parser des réponses SOAP ZCS

use super::Fault;
use crate::error::{Result, ZcsError};
use std::io::BufReader;
use xmltree::Element;

/// Réponse SOAP parsée
#[derive(Debug, Clone)]
pub struct SoapResponse {
    /// En-tête SOAP optionnel
    pub header: Option<Element>,

    /// Corps SOAP : réponses d'action ou un unique `Fault`
    pub body: Element,
}

impl SoapResponse {
    /// Retourne le fault contenu dans le corps, s'il y en a un
    pub fn fault(&self) -> Option<Fault> {
        self.body.get_child("Fault").map(Fault::from_element)
    }

    /// Retourne l'élément de réponse `name` (ex: "AuthResponse")
    pub fn action_response(&self, name: &str) -> Option<&Element> {
        self.body.get_child(name)
    }
}

/// Parse une réponse SOAP à partir de bytes XML
pub fn parse_soap_response(xml: &[u8]) -> Result<SoapResponse> {
    let reader = BufReader::new(xml);
    let root = Element::parse(reader).map_err(|err| ZcsError::malformed(err.to_string()))?;

    if !root.name.ends_with("Envelope") {
        return Err(ZcsError::malformed(format!(
            "expected a SOAP Envelope, found <{}>",
            root.name
        )));
    }

    let header = root
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .find(|e| e.name.ends_with("Header"))
        .cloned();

    let body = root
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .find(|e| e.name.ends_with("Body"))
        .cloned()
        .ok_or_else(|| ZcsError::malformed("missing SOAP Body"))?;

    Ok(SoapResponse { header, body })
}
