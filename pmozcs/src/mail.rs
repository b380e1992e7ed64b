//! Calendrier de l'utilisateur connecté (`urn:zimbraMail`)
//!
//! Les adresses de l'organisateur et des salles viennent de
//! [`CalendarSettings`], jamais du code.

use crate::client::SoapClient;
use crate::config::CalendarSettings;
use crate::error::{Result, ZcsError};
use crate::soap::{Namespace, Params};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use xmltree::Element;

/// Format des dates de composant (`s`, `e`, `inst`)
const COMPONENT_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date au format attendu par les composants d'invitation
pub fn component_date(date: &DateTime<Utc>) -> String {
    date.format(COMPONENT_DATE_FORMAT).to_string()
}

/// Rendez-vous tel que renvoyé par une recherche
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Appointment {
    pub id: String,
    pub uid: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    /// Début de chaque occurrence dans la fenêtre, en millisecondes epoch
    pub instances: Vec<i64>,
}

impl Appointment {
    fn from_xml(elem: &Element) -> Self {
        let attr = |key: &str| elem.attributes.get(key).cloned();
        let instances = elem
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .filter(|e| e.name == "inst")
            .filter_map(|e| e.attributes.get("s").and_then(|s| s.parse().ok()))
            .collect();

        Self {
            id: attr("id").unwrap_or_default(),
            uid: attr("uid"),
            name: attr("name"),
            location: attr("loc"),
            instances,
        }
    }
}

/// Rendez-vous à créer dans une salle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub subject: String,
    /// Description HTML
    pub description: String,
    /// Nom de la salle, aussi partie locale de son adresse
    pub location: String,
}

/// Identifiants renvoyés à la création
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAppointment {
    pub cal_item_id: Option<String>,
    pub inv_id: Option<String>,
}

/// API calendrier
pub struct CalendarApi<'a> {
    client: &'a mut SoapClient,
    settings: CalendarSettings,
}

impl<'a> CalendarApi<'a> {
    pub fn new(client: &'a mut SoapClient, settings: CalendarSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    fn room_address(&self, room: &str) -> String {
        format!("{room}@{}", self.settings.room_domain)
    }

    /// Rendez-vous dont une occurrence tombe entre `start` et `end`
    pub fn get_appointments(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        self.search_appointments("Item:all", start, end)
    }

    /// Rendez-vous nommés `name` dans le dossier `folder_id` (ex: un
    /// `ownerId:folderId` de partage), sur la fenêtre donnée
    pub fn get_appointments_by_user_id(
        &mut self,
        folder_id: &str,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let query = format!(r#"inid:"{folder_id}" #name:"{name}""#);
        self.search_appointments(&query, start, end)
    }

    fn search_appointments(
        &mut self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let start_ms = start.timestamp_millis().to_string();
        let end_ms = end.timestamp_millis().to_string();
        let attributes = [
            ("calExpandInstStart", start_ms.as_str()),
            ("calExpandInstEnd", end_ms.as_str()),
            ("types", "appointment"),
        ];

        let body = self.client.request_in(
            Namespace::Mail,
            "SearchRequest",
            &attributes,
            &Params::new().scalar("query", query),
        )?;

        let response = body
            .get_child("SearchResponse")
            .ok_or_else(|| ZcsError::malformed("missing SearchResponse element in SOAP body"))?;

        let appointments: Vec<Appointment> = response
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .filter(|e| e.name == "appt")
            .map(Appointment::from_xml)
            .collect();

        debug!(query, count = appointments.len(), "Appointments found");
        Ok(appointments)
    }

    /// Règles de récurrence d'un rendez-vous
    pub fn get_recurrence(&mut self, appointment_id: &str) -> Result<Element> {
        let body = self.client.request_in(
            Namespace::Mail,
            "GetRecurRequest",
            &[("id", appointment_id)],
            &Params::new(),
        )?;

        body.get_child("GetRecurResponse")
            .cloned()
            .ok_or_else(|| ZcsError::malformed("missing GetRecurResponse element in SOAP body"))
    }

    /// Rendez-vous complet (contenu inclus) par UID
    pub fn get_appointment(&mut self, uid: &str) -> Result<Element> {
        let body = self.client.request_in(
            Namespace::Mail,
            "GetAppointmentRequest",
            &[("uid", uid), ("includeContent", "1")],
            &Params::new(),
        )?;

        body.get_child("GetAppointmentResponse")
            .and_then(|r| r.get_child("appt"))
            .cloned()
            .ok_or_else(|| ZcsError::malformed("GetAppointmentResponse without appt"))
    }

    /// Réserve une salle
    pub fn create_appointment(&mut self, appointment: &NewAppointment) -> Result<CreatedAppointment> {
        let room = self.room_address(&appointment.location);

        let component = Params::new()
            .object(
                "at",
                Params::new().attributes([
                    ("role", "NON"),
                    ("ptst", "NE"),
                    ("cutype", "RES"),
                    ("rsvp", "0"),
                    ("a", room.as_str()),
                    ("d", appointment.location.as_str()),
                ]),
            )
            .attributes([
                ("status", "CONF"),
                ("fb", "B"),
                ("allDay", "0"),
                ("name", appointment.subject.as_str()),
                ("loc", appointment.location.as_str()),
            ])
            .object(
                "s",
                Params::new().attribute("d", component_date(&appointment.start)),
            )
            .object(
                "e",
                Params::new().attribute("d", component_date(&appointment.end)),
            )
            .object(
                "or",
                Params::new().attributes([
                    ("a", self.settings.organizer_address.as_str()),
                    ("d", self.settings.organizer_name.as_str()),
                ]),
            )
            .scalar("descHtml", appointment.description.as_str())
            .scalar("desc", appointment.subject.as_str())
            .object(
                "alarm",
                Params::new().attribute("action", "DISPLAY").object(
                    "trigger",
                    Params::new().object("rel", Params::new().attribute("m", 1u32)),
                ),
            );

        let message = Params::new()
            .object("inv", Params::new().object("comp", component))
            .object(
                "e",
                Params::new().attributes([
                    ("a", room.as_str()),
                    ("p", appointment.location.as_str()),
                    ("t", "t"),
                ]),
            )
            .scalar("su", appointment.subject.as_str());

        info!(subject = %appointment.subject, room = %room, "Creating appointment");
        let body = self.client.request_in(
            Namespace::Mail,
            "CreateAppointmentRequest",
            &[],
            &Params::new().object("m", message),
        )?;

        let response = body
            .get_child("CreateAppointmentResponse")
            .ok_or_else(|| ZcsError::malformed("missing CreateAppointmentResponse element"))?;

        Ok(CreatedAppointment {
            cal_item_id: response.attributes.get("calItemId").cloned(),
            inv_id: response.attributes.get("invId").cloned(),
        })
    }

    /// Annule l'occurrence du `date`
    pub fn cancel_appointment(&mut self, id: &str, date: DateTime<Utc>) -> Result<()> {
        info!(id, date = %date, "Cancelling appointment instance");
        let params = Params::new().object(
            "inst",
            Params::new().attribute("d", component_date(&date)),
        );
        self.client.request_in(
            Namespace::Mail,
            "CancelAppointmentRequest",
            &[("id", id), ("comp", "0")],
            &params,
        )?;
        Ok(())
    }

    /// Annule toutes les occurrences
    pub fn delete_appointment_series(&mut self, id: &str) -> Result<()> {
        info!(id, "Cancelling appointment series");
        self.client.request_in(
            Namespace::Mail,
            "CancelAppointmentRequest",
            &[("id", id), ("comp", "0")],
            &Params::new(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{MockTransport, body_xml};
    use chrono::TimeZone;

    fn settings() -> CalendarSettings {
        CalendarSettings {
            organizer_address: "planning@example.com".to_string(),
            organizer_name: "Planning".to_string(),
            room_domain: "rooms.example.com".to_string(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 8, 31, hour, 0, 0).unwrap()
    }

    #[test]
    fn component_date_is_utc_basic_format() {
        assert_eq!(component_date(&at(5)), "20130831T050000Z");
    }

    #[test]
    fn appointments_search_uses_millisecond_window() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<SearchResponse xmlns="urn:zimbraMail" offset="0" more="0">
  <appt id="257" uid="abc-123" name="Scrum" loc="Dev Room">
    <inst s="1377925200000"/>
    <inst s="1378011600000"/>
  </appt>
  <appt id="301" name="Review"/>
</SearchResponse>"#,
        ));
        let mut client = SoapClient::with_transport(transport.clone());

        let appointments = CalendarApi::new(&mut client, settings())
            .get_appointments(at(5), at(6))
            .unwrap();

        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].uid.as_deref(), Some("abc-123"));
        assert_eq!(appointments[0].location.as_deref(), Some("Dev Room"));
        assert_eq!(appointments[0].instances, vec![1377925200000, 1378011600000]);
        assert!(appointments[1].instances.is_empty());

        let sent = transport.last_sent();
        assert!(sent.contains(
            r#"<SearchRequest xmlns="urn:zimbraMail" calExpandInstStart="1377925200000" calExpandInstEnd="1377928800000" types="appointment">"#
        ));
        assert!(sent.contains("<query>Item:all</query>"));
    }

    #[test]
    fn appointments_by_folder_and_name() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<SearchResponse xmlns="urn:zimbraMail" offset="0" more="0"><appt id="acc-7:512" name="Scrum"><inst s="1377925200000"/></appt></SearchResponse>"#,
        ));
        let mut client = SoapClient::with_transport(transport.clone());

        let appointments = CalendarApi::new(&mut client, settings())
            .get_appointments_by_user_id("acc-7:10", "Scrum", at(5), at(6))
            .unwrap();

        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].instances, vec![1377925200000]);

        let sent = transport.last_sent();
        assert!(sent.contains(r#"calExpandInstStart="1377925200000" calExpandInstEnd="1377928800000""#));
        let request = crate::soap::parse_soap_response(sent.as_bytes()).unwrap();
        let query = request
            .body
            .get_child("SearchRequest")
            .and_then(|r| r.get_child("query"))
            .and_then(|q| q.get_text())
            .map(|t| t.into_owned());
        assert_eq!(query.as_deref(), Some(r#"inid:"acc-7:10" #name:"Scrum""#));
    }

    #[test]
    fn recurrence_by_appointment_id() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<GetRecurResponse xmlns="urn:zimbraMail"><comp><recur><add><rule freq="WEE"/></add></recur></comp></GetRecurResponse>"#,
        ));
        let mut client = SoapClient::with_transport(transport.clone());

        let recur = CalendarApi::new(&mut client, settings())
            .get_recurrence("257")
            .unwrap();

        assert!(recur.get_child("comp").is_some());
        assert!(
            transport
                .last_sent()
                .contains(r#"<GetRecurRequest xmlns="urn:zimbraMail" id="257""#)
        );
    }

    #[test]
    fn get_appointment_returns_appt_element() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<GetAppointmentResponse xmlns="urn:zimbraMail"><appt id="257" uid="abc-123"><inv/></appt></GetAppointmentResponse>"#,
        ));
        let mut client = SoapClient::with_transport(transport.clone());

        let appt = CalendarApi::new(&mut client, settings())
            .get_appointment("abc-123")
            .unwrap();
        assert_eq!(appt.attributes.get("id").map(String::as_str), Some("257"));
        assert!(
            transport
                .last_sent()
                .contains(r#"uid="abc-123" includeContent="1""#)
        );
    }

    #[test]
    fn create_appointment_addresses_room_from_settings() {
        let transport = MockTransport::new();
        transport.reply(body_xml(
            r#"<CreateAppointmentResponse xmlns="urn:zimbraMail" calItemId="400" invId="400-399" apptId="400"/>"#,
        ));
        let mut client = SoapClient::with_transport(transport.clone());

        let created = CalendarApi::new(&mut client, settings())
            .create_appointment(&NewAppointment {
                start: at(9),
                end: at(10),
                subject: "Sprint review".to_string(),
                description: "<p>Demo</p>".to_string(),
                location: "boardroom".to_string(),
            })
            .unwrap();

        assert_eq!(created.cal_item_id.as_deref(), Some("400"));
        assert_eq!(created.inv_id.as_deref(), Some("400-399"));

        let sent = transport.last_sent();
        assert!(sent.contains(r#"<CreateAppointmentRequest xmlns="urn:zimbraMail"><m><inv><comp"#));
        assert!(sent.contains(r#"a="boardroom@rooms.example.com""#));
        assert!(sent.contains(r#"<or a="planning@example.com" d="Planning""#));
        assert!(sent.contains(r#"<s d="20130831T090000Z""#));
        assert!(sent.contains(r#"<e d="20130831T100000Z""#));
        assert!(sent.contains("<su>Sprint review</su>"));
        assert!(sent.contains("&lt;p>Demo&lt;/p>") || sent.contains("&lt;p&gt;Demo&lt;/p&gt;"));
    }

    #[test]
    fn cancel_instance_and_series() {
        let transport = MockTransport::new();
        transport
            .reply(body_xml(r#"<CancelAppointmentResponse xmlns="urn:zimbraMail"/>"#))
            .reply(body_xml(r#"<CancelAppointmentResponse xmlns="urn:zimbraMail"/>"#));
        let mut client = SoapClient::with_transport(transport.clone());
        let mut calendar = CalendarApi::new(&mut client, settings());

        calendar.cancel_appointment("257", at(5)).unwrap();
        calendar.delete_appointment_series("257").unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains(r#"id="257" comp="0""#));
        assert!(sent[0].contains(r#"<inst d="20130831T050000Z""#));
        assert!(sent[1].contains(r#"id="257" comp="0""#));
        assert!(!sent[1].contains("<inst"));
    }
}
