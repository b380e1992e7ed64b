//! Entités ZCS et leur conversion depuis/vers le format du serveur
//!
//! Le serveur décrit une entité par quelques attributs racine (`id`,
//! `name`) et une suite plate de `<a n="clé">valeur</a>`. Chaque entité
//! déclare une table de correspondance clé serveur → champ ; les autres
//! clés sont conservées telles quelles dans un [`AttributeBag`].
//!
//! ```
//! use pmozcs::entity::{Account, Entity};
//!
//! let xml = r#"<account id="42" name="chris@example.com">
//!     <a n="uid">chris</a>
//!     <a n="zimbraMailHost">mail.example.com</a>
//!     <a n="zimbraPrefLocale">fr</a>
//! </account>"#;
//! let elem = xmltree::Element::parse(xml.as_bytes()).unwrap();
//! let account = Account::from_xml(&elem);
//!
//! assert_eq!(account.username(), Some("chris"));
//! assert_eq!(account.host(), Some("mail.example.com"));
//! assert_eq!(account.attributes().get("zimbraPrefLocale"), Some("fr"));
//! ```

use crate::error::{Result, ZcsError};
use crate::soap::{Param, Params};
use indexmap::IndexMap;
use serde_json::Value;
use xmltree::Element;

/// Génère une entité : champs déclarés, accesseurs et implémentation
/// de [`Entity`].
///
/// Chaque ligne `champ, setter => "cléServeur"` déclare un champ texte.
/// Une clé commençant par `@` désigne un attribut de l'élément racine.
/// Une ligne de tête `@name => "cléServeur";` fait de cette clé un synonyme
/// du nom de l'entité.
macro_rules! zcs_entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( @name => $name_key:literal; )?
            $(
                $(#[$fmeta:meta])*
                $field:ident, $setter:ident => $key:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            id: Option<String>,
            name: Option<String>,
            $( $field: Option<String>, )*
            attrs: $crate::entity::AttributeBag,
        }

        impl $name {
            /// Crée une entité portant seulement un nom
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: Some(name.into()),
                    ..Self::default()
                }
            }

            pub fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
                self.id = Some(id.into());
                self
            }

            pub fn name(&self) -> Option<&str> {
                self.name.as_deref()
            }

            pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
                self.name = Some(name.into());
                self
            }

            $(
                $(#[$fmeta])*
                pub fn $field(&self) -> Option<&str> {
                    self.$field.as_deref()
                }

                pub fn $setter(&mut self, value: impl Into<String>) -> &mut Self {
                    self.$field = Some(value.into());
                    self
                }
            )*

            /// Attributs non déclarés, clés serveur inchangées
            pub fn attributes(&self) -> &$crate::entity::AttributeBag {
                &self.attrs
            }

            pub fn attributes_mut(&mut self) -> &mut $crate::entity::AttributeBag {
                &mut self.attrs
            }
        }

        impl $crate::entity::Entity for $name {
            fn datamap() -> &'static [(&'static str, &'static str)] {
                &[ $( ($key, stringify!($field)) ),* ]
            }

            $(
                fn name_key() -> Option<&'static str> {
                    Some($name_key)
                }
            )?

            fn entity_id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn entity_name(&self) -> Option<&str> {
                self.name.as_deref()
            }

            fn set_entity_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn set_entity_name(&mut self, name: String) {
                self.name = Some(name);
            }

            fn field(&self, field: &str) -> Option<&str> {
                match field {
                    $( stringify!($field) => self.$field.as_deref(), )*
                    _ => None,
                }
            }

            fn field_slot(&mut self, field: &str) -> Option<&mut Option<String>> {
                match field {
                    $( stringify!($field) => Some(&mut self.$field), )*
                    _ => None,
                }
            }

            fn bag(&self) -> &$crate::entity::AttributeBag {
                &self.attrs
            }

            fn bag_mut(&mut self) -> &mut $crate::entity::AttributeBag {
                &mut self.attrs
            }
        }
    };
}

mod account;
mod alias;
mod domain;

pub use account::Account;
pub use alias::Alias;
pub use domain::Domain;

/// Clé serveur de l'identifiant
pub const ID_KEY: &str = "zimbraId";

/// Clé de la table de propriétés portant le nom (attribut racine)
pub const NAME_KEY: &str = "@name";

/// Propriétés sortantes d'une entité, clés serveur dans l'ordre
pub type PropertyMap = IndexMap<String, Vec<String>>;

/// Attributs serveur non déclarés par l'entité.
///
/// Une clé répétée garde toutes ses valeurs, dans l'ordre reçu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBag(IndexMap<String, Vec<String>>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Première valeur de `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Ajoute une valeur à `key`
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Remplace toutes les valeurs de `key`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// Entité typée projetée depuis la représentation plate du serveur
pub trait Entity: Default {
    /// Correspondance (clé serveur, champ)
    fn datamap() -> &'static [(&'static str, &'static str)];

    fn entity_id(&self) -> Option<&str>;
    fn entity_name(&self) -> Option<&str>;
    fn set_entity_id(&mut self, id: String);
    fn set_entity_name(&mut self, name: String);

    /// Clé serveur portant aussi le nom de l'entité
    fn name_key() -> Option<&'static str> {
        None
    }

    /// Valeur d'un champ déclaré
    fn field(&self, field: &str) -> Option<&str>;
    fn field_slot(&mut self, field: &str) -> Option<&mut Option<String>>;

    fn bag(&self) -> &AttributeBag;
    fn bag_mut(&mut self) -> &mut AttributeBag;

    /// Champ associé à une clé serveur
    fn field_for_key(key: &str) -> Option<&'static str> {
        Self::datamap()
            .iter()
            .find(|(server_key, _)| *server_key == key)
            .map(|(_, field)| *field)
    }

    /// Range une paire clé/valeur serveur dans le champ déclaré ou le sac
    fn apply_server_attribute(&mut self, key: &str, value: String) {
        if key == ID_KEY && self.entity_id().is_none() {
            self.set_entity_id(value);
            return;
        }
        if key == ID_KEY {
            return;
        }

        if Self::name_key() == Some(key) {
            if self.entity_name().is_none() {
                self.set_entity_name(value);
            }
            return;
        }

        if let Some(field) = Self::field_for_key(key) {
            if let Some(slot) = self.field_slot(field) {
                if slot.is_none() {
                    *slot = Some(value);
                    return;
                }
            }
        }
        self.bag_mut().push(key, value);
    }

    /// Construit l'entité depuis un fragment XML du serveur.
    ///
    /// Les clés inconnues ne sont pas des erreurs : elles vont dans le sac
    /// d'attributs.
    fn from_xml(element: &Element) -> Self {
        let mut entity = Self::default();

        for (attr, value) in &element.attributes {
            match attr.as_str() {
                "id" => entity.set_entity_id(value.clone()),
                "name" => entity.set_entity_name(value.clone()),
                other => {
                    let key = format!("@{other}");
                    if let Some(field) = Self::field_for_key(&key) {
                        if let Some(slot) = entity.field_slot(field) {
                            *slot = Some(value.clone());
                        }
                    }
                }
            }
        }

        for child in element.children.iter().filter_map(|n| n.as_element()) {
            if child.name != "a" {
                continue;
            }
            let Some(key) = child.attributes.get("n") else {
                continue;
            };
            let value = child
                .get_text()
                .map(|text| text.into_owned())
                .unwrap_or_default();
            entity.apply_server_attribute(key, value);
        }

        entity
    }

    /// Construit l'entité depuis un objet JSON dont les clés sont les noms
    /// de champs (`display_name` ou `displayname`).
    ///
    /// Les clés non déclarées sont traitées comme des clés serveur.
    fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ZcsError::InvalidEntity(format!(
                "expected a JSON object, got {value}"
            )));
        };

        let mut entity = Self::default();
        for (key, value) in map {
            if value.is_null() {
                continue;
            }

            match key.as_str() {
                "id" => entity.set_entity_id(json_text(value)),
                "name" => entity.set_entity_name(json_text(value)),
                "attributes" if value.is_object() => {
                    if let Value::Object(attrs) = value {
                        for (attr, attr_value) in attrs {
                            push_json_values(entity.bag_mut(), attr, attr_value);
                        }
                    }
                }
                other => {
                    let field = semantic_field::<Self>(other).or_else(|| Self::field_for_key(other));
                    match field.and_then(|f| entity.field_slot(f)) {
                        Some(slot) => *slot = Some(json_text(value)),
                        None => push_json_values(entity.bag_mut(), other, value),
                    }
                }
            }
        }

        Ok(entity)
    }

    /// Table de propriétés sortante : `zimbraId`, `@name`, champs déclarés
    /// sous leur clé serveur, puis le sac d'attributs.
    fn to_property_map(&self) -> PropertyMap {
        let mut map = PropertyMap::new();

        if let Some(id) = self.entity_id() {
            map.insert(ID_KEY.to_string(), vec![id.to_string()]);
        }
        if let Some(name) = self.entity_name() {
            map.insert(NAME_KEY.to_string(), vec![name.to_string()]);
            if let Some(key) = Self::name_key() {
                map.insert(key.to_string(), vec![name.to_string()]);
            }
        }
        for (server_key, field) in Self::datamap() {
            if let Some(value) = self.field(field) {
                map.insert((*server_key).to_string(), vec![value.to_string()]);
            }
        }
        for (key, values) in self.bag().iter() {
            map.entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }

        map
    }
}

fn semantic_field<E: Entity>(key: &str) -> Option<&'static str> {
    let wanted = key.to_ascii_lowercase();
    E::datamap()
        .iter()
        .map(|(_, field)| *field)
        .find(|field| *field == wanted || field.replace('_', "") == wanted)
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

fn push_json_values(bag: &mut AttributeBag, key: &str, value: &Value) {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .for_each(|item| bag.push(key, json_text(item))),
        Value::Null => {}
        other => bag.push(key, json_text(other)),
    }
}

/// Retire des propriétés qui ne doivent pas être renvoyées au serveur
pub fn strip_properties(map: &mut PropertyMap, keys: &[&str]) {
    for key in keys {
        map.shift_remove(*key);
    }
}

/// Encode une table de propriétés en suite de `<a n="clé">valeur</a>`.
///
/// Les clés `@...` (attributs racine) ne sont pas encodées.
pub fn property_params(map: &PropertyMap) -> Params {
    let items: Vec<Param> = map
        .iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .flat_map(|(key, values)| {
            values.iter().map(move |value| {
                Param::Object(Params::new().attribute("n", key.as_str()).text(value.as_str()))
            })
        })
        .collect();

    if items.is_empty() {
        Params::new()
    } else {
        Params::new().sequence("a", items)
    }
}
