//! Paramètres d'action et leur encodage XML

use crate::error::{Result, ZcsError};
use serde_json::Value;
use xmltree::{Element, XMLNode};

/// Clé réservée du format JSON pour un groupe d'attributs
const ATTRIBUTES_KEY: &str = "attributes";

/// Clé réservée du format JSON pour le texte de l'élément courant
const TEXT_KEY: &str = "_";

/// Valeur d'un attribut XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    /// Écrit `TRUE` ou `FALSE`
    Bool(bool),
}

impl AttrValue {
    pub fn as_xml(&self) -> String {
        match self {
            AttrValue::Text(text) => text.clone(),
            AttrValue::Bool(true) => "TRUE".to_string(),
            AttrValue::Bool(false) => "FALSE".to_string(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::Text(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Text(value.to_string())
    }
}

/// Un paramètre d'action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// `<key>value</key>`
    Scalar(String),
    /// Attributs posés sur l'élément courant, la clé est ignorée
    Attributes(Vec<(String, AttrValue)>),
    /// `<key>...</key>` encodé récursivement
    Object(Params),
    /// Une occurrence de `<key>` par élément, sans dédoublonnage
    Sequence(Vec<Param>),
}

/// Paramètres ordonnés d'un élément.
///
/// L'ordre d'insertion est conservé tel quel dans le XML produit : certaines
/// actions du serveur sont sensibles à la position des enfants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    text: Option<String>,
    entries: Vec<(String, Param)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, Param)] {
        &self.entries
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Ajoute un paramètre brut
    pub fn push(mut self, key: impl Into<String>, param: Param) -> Self {
        self.entries.push((key.into(), param));
        self
    }

    /// Ajoute `<key>value</key>`
    pub fn scalar(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, Param::Scalar(value.into()))
    }

    /// Ajoute un enfant `<key>` décrit par `params`
    pub fn object(self, key: impl Into<String>, params: Params) -> Self {
        self.push(key, Param::Object(params))
    }

    /// Ajoute une suite d'éléments frères `<key>`
    pub fn sequence(self, key: impl Into<String>, items: Vec<Param>) -> Self {
        self.push(key, Param::Sequence(items))
    }

    /// Pose un attribut sur l'élément courant
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let pair = (name.into(), value.into());
        let group = self.entries.iter_mut().find_map(|(key, param)| match param {
            Param::Attributes(pairs) if key == ATTRIBUTES_KEY => Some(pairs),
            _ => None,
        });

        match group {
            Some(pairs) => pairs.push(pair),
            None => self
                .entries
                .push((ATTRIBUTES_KEY.to_string(), Param::Attributes(vec![pair]))),
        }
        self
    }

    /// Pose plusieurs attributs sur l'élément courant
    pub fn attributes<K, V, I>(self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .fold(self, |params, (name, value)| params.attribute(name, value))
    }

    /// Définit le texte de l'élément courant
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.text = Some(value.into());
        self
    }

    /// Construit des paramètres depuis une structure JSON imbriquée.
    ///
    /// - `"attributes": {...}` pose des attributs sur l'élément courant
    /// - `"_": "..."` définit le texte de l'élément courant
    /// - un tableau produit autant d'éléments frères
    /// - un objet produit un enfant encodé récursivement
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut params = Params::new();
                for (key, value) in map {
                    params = match (key.as_str(), value) {
                        (ATTRIBUTES_KEY, Value::Object(attrs)) => {
                            let pairs = attrs
                                .iter()
                                .map(|(name, value)| (name.clone(), json_attr_value(value)))
                                .collect();
                            params.push(key.clone(), Param::Attributes(pairs))
                        }
                        (TEXT_KEY, value) if !value.is_object() && !value.is_array() => {
                            params.text(json_scalar(value))
                        }
                        _ => params.push(key.clone(), json_param(value)?),
                    };
                }
                Ok(params)
            }
            other => Err(ZcsError::InvalidParams(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

fn json_param(value: &Value) -> Result<Param> {
    Ok(match value {
        Value::Object(_) => Param::Object(Params::from_json(value)?),
        Value::Array(items) => Param::Sequence(
            items
                .iter()
                .map(json_param)
                .collect::<Result<Vec<_>>>()?,
        ),
        scalar => Param::Scalar(json_scalar(scalar)),
    })
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_attr_value(value: &Value) -> AttrValue {
    match value {
        Value::Bool(flag) => AttrValue::Bool(*flag),
        other => AttrValue::Text(json_scalar(other)),
    }
}

/// Encode `params` sur `element`
pub fn encode_params(element: &mut Element, params: &Params) {
    if let Some(text) = &params.text {
        element.children.push(XMLNode::Text(text.clone()));
    }

    for (key, param) in &params.entries {
        encode_param(element, key, param);
    }
}

fn encode_param(element: &mut Element, key: &str, param: &Param) {
    match param {
        Param::Scalar(value) => {
            let mut child = Element::new(key);
            child.children.push(XMLNode::Text(value.clone()));
            element.children.push(XMLNode::Element(child));
        }
        Param::Attributes(pairs) => {
            for (name, value) in pairs {
                element.attributes.insert(name.clone(), value.as_xml());
            }
        }
        Param::Object(nested) => {
            let mut child = Element::new(key);
            encode_params(&mut child, nested);
            element.children.push(XMLNode::Element(child));
        }
        Param::Sequence(items) => {
            for item in items {
                encode_param(element, key, item);
            }
        }
    }
}
