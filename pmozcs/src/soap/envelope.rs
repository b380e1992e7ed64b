//! Enveloppe SOAP sortante

use super::{CONTEXT_NS, Namespace, SOAP_ENVELOPE_NS};
use crate::error::{Result, ZcsError};
use xmltree::{Element, EmitterConfig, XMLNode};

/// Enveloppe SOAP d'un client
///
/// Le `context` de l'en-tête survit d'une requête à l'autre (jeton
/// d'authentification, session), le `Body` est remis à zéro avant chaque
/// action.
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    context: Element,
    body: Element,
}

impl Default for SoapEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl SoapEnvelope {
    /// Crée une enveloppe avec un `context` et un `Body` vides
    pub fn new() -> Self {
        let mut context = Element::new("context");
        context
            .attributes
            .insert("xmlns".to_string(), CONTEXT_NS.to_string());

        Self {
            context,
            body: Element::new("soap:Body"),
        }
    }

    /// Définit un champ du `context`.
    ///
    /// Un champ existant est mis à jour sur place, un nouveau champ est
    /// ajouté à la fin.
    pub fn set_context_field(&mut self, name: &str, value: &str) {
        let existing = self
            .context
            .children
            .iter_mut()
            .find_map(|node| match node {
                XMLNode::Element(elem) if elem.name == name => Some(elem),
                _ => None,
            });

        match existing {
            Some(elem) => {
                elem.children.clear();
                elem.children.push(XMLNode::Text(value.to_string()));
            }
            None => {
                let mut field = Element::new(name);
                field.children.push(XMLNode::Text(value.to_string()));
                self.context.children.push(XMLNode::Element(field));
            }
        }
    }

    /// Élément `context` de l'en-tête
    pub fn context(&self) -> &Element {
        &self.context
    }

    /// Texte d'un champ du `context`
    pub fn context_field(&self, name: &str) -> Option<String> {
        self.context
            .get_child(name)
            .and_then(|elem| elem.get_text())
            .map(|text| text.into_owned())
    }

    /// Vide le `Body`
    pub fn reset_body(&mut self) {
        self.body.children.clear();
    }

    /// Ajoute l'élément d'action sous le `Body` et le retourne pour y
    /// encoder les paramètres.
    pub fn add_action(
        &mut self,
        action: &str,
        namespace: Namespace,
        attributes: &[(&str, &str)],
    ) -> &mut Element {
        let mut elem = Element::new(action);
        elem.attributes
            .insert("xmlns".to_string(), namespace.urn().to_string());
        for (key, value) in attributes {
            elem.attributes.insert((*key).to_string(), (*value).to_string());
        }

        self.body.children.push(XMLNode::Element(elem));
        match self.body.children.last_mut() {
            Some(XMLNode::Element(elem)) => elem,
            _ => unreachable!("the action element was just pushed"),
        }
    }

    /// Élément `Body` courant
    pub fn body(&self) -> &Element {
        &self.body
    }

    /// Assemble le document complet
    pub fn to_element(&self) -> Element {
        let mut header = Element::new("soap:Header");
        header.children.push(XMLNode::Element(self.context.clone()));

        let mut envelope = Element::new("soap:Envelope");
        envelope
            .attributes
            .insert("xmlns:soap".to_string(), SOAP_ENVELOPE_NS.to_string());
        envelope.children.push(XMLNode::Element(header));
        envelope.children.push(XMLNode::Element(self.body.clone()));
        envelope
    }

    /// Sérialise l'enveloppe en texte XML.
    ///
    /// La sortie est déterministe : attributs et enfants sont écrits dans
    /// leur ordre d'insertion.
    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(true)
            .perform_indent(false);
        self.to_element().write_with_config(&mut buf, config)?;

        String::from_utf8(buf).map_err(|err| ZcsError::Xml(err.to_string()))
    }
}
