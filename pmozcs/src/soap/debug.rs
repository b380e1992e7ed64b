//! Écho des messages SOAP échangés (mode debug)

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use tracing::debug;

/// Sens d'un message sur le fil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireDirection {
    Request,
    Response,
}

impl WireDirection {
    pub fn banner(&self) -> &'static str {
        match self {
            WireDirection::Request => "## REQUEST",
            WireDirection::Response => "## RESPONSE",
        }
    }
}

/// Destination des messages échoués quand le debug est actif
pub trait WireSink: Send {
    fn emit(&self, direction: WireDirection, xml: &str);
}

/// Sink par défaut : `tracing` au niveau debug, cible `pmozcs::wire`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WireSink for TracingSink {
    fn emit(&self, direction: WireDirection, xml: &str) {
        debug!(target: "pmozcs::wire", "{}\n{}", direction.banner(), xml);
    }
}

/// Indente un document XML pour le rendre lisible.
///
/// Retourne le texte d'origine s'il n'est pas du XML bien formé.
pub fn format_xml(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => {
                if writer.write_event(event).is_err() {
                    return xml.to_string();
                }
            }
            Err(_) => return xml.to_string(),
        }
    }

    String::from_utf8(writer.into_inner()).unwrap_or_else(|_| xml.to_string())
}
