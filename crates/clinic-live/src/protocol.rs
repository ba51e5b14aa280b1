//! Wire format of the live-update endpoint.
//!
//! Every frame is a JSON envelope `{ "type": ..., "data": ... }`. The client
//! sends one message type; the server sends a snapshot or a change signal.

use clinic_core::CollectionsSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProtocolError;

/// Server: full snapshot of the five collections.
pub const INITIAL_DATA: &str = "INITIAL_DATA";
/// Server: a patient was added; the patients collection is out of date.
pub const NEW_PATIENT: &str = "NEW_PATIENT";

/// Messages the client sends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Ask for an `INITIAL_DATA` snapshot. Sent once per opened connection.
    RequestInitialData,
}

impl ClientMessage {
    /// Serialized frame text.
    pub fn to_text(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Messages the server sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    /// Replace all five collections.
    InitialData(Box<CollectionsSnapshot>),
    /// Mark the patients collection stale.
    NewPatient,
    /// A type this client does not handle.
    Unknown(String),
}

impl ServerMessage {
    /// Decode one frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        match envelope.kind.as_str() {
            INITIAL_DATA => {
                let data = envelope
                    .data
                    .ok_or(ProtocolError::MissingData(INITIAL_DATA))?;
                Ok(Self::InitialData(Box::new(serde_json::from_value(data)?)))
            }
            NEW_PATIENT => Ok(Self::NewPatient),
            _ => Ok(Self::Unknown(envelope.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn request_initial_data_frame() {
        assert_eq!(
            ClientMessage::RequestInitialData.to_text().unwrap(),
            r#"{"type":"REQUEST_INITIAL_DATA"}"#
        );
    }

    #[test]
    fn parses_initial_data() {
        let text = r#"{"type":"INITIAL_DATA","data":{
            "patients":[{"id":1,"name":"Kim","nationality":"KR","status":"waiting"}],
            "treatments":[],"appointments":[],"patientVisits":[],"treatmentOutcomes":[]
        }}"#;
        let ServerMessage::InitialData(snapshot) = ServerMessage::parse(text).unwrap() else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.patients.len(), 1);
        assert_eq!(snapshot.patients[0].name, "Kim");
    }

    #[test]
    fn new_patient_ignores_data() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"NEW_PATIENT","data":{"id":5}}"#).unwrap(),
            ServerMessage::NewPatient
        );
    }

    #[test]
    fn unknown_type_is_kept() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"STAFF_UPDATE"}"#).unwrap(),
            ServerMessage::Unknown("STAFF_UPDATE".into())
        );
    }

    #[test]
    fn initial_data_without_data_is_error() {
        assert_matches!(
            ServerMessage::parse(r#"{"type":"INITIAL_DATA"}"#),
            Err(ProtocolError::MissingData(INITIAL_DATA))
        );
    }

    #[test]
    fn initial_data_missing_collection_is_error() {
        let text = r#"{"type":"INITIAL_DATA","data":{"patients":[]}}"#;
        assert_matches!(ServerMessage::parse(text), Err(ProtocolError::Json(_)));
    }

    #[test]
    fn non_json_is_error() {
        assert_matches!(ServerMessage::parse("hello"), Err(ProtocolError::Json(_)));
        assert_matches!(ServerMessage::parse(r#"{"data":1}"#), Err(ProtocolError::Json(_)));
    }
}
