//! Domain records exchanged with the clinic backend.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the server's
//! JSON wire format. Unknown fields are ignored on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Staff role tag carried on the authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Physician.
    Doctor,
    /// Nursing staff.
    Nurse,
    /// Medical interpreter for international patients.
    Interpreter,
    /// Clinic administrator.
    Admin,
    /// General staff.
    Staff,
    /// Any tag the client does not know about.
    #[serde(other)]
    Other,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Interpreter => "interpreter",
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user, as returned by the session probe and by login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user ID.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Role tag.
    pub role: Role,
}

/// Client-side authentication state.
///
/// A steady two-node cycle: `Anonymous` is both the initial state and the
/// state reached after logout or a rejected probe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No session is materialized.
    #[default]
    Anonymous,
    /// A fully populated session.
    Authenticated(User),
}

impl SessionState {
    /// Build the state from the cached current-user value.
    pub fn from_user(user: Option<User>) -> Self {
        user.map_or(Self::Anonymous, Self::Authenticated)
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collections
// ─────────────────────────────────────────────────────────────────────────────

/// A clinic patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Patient ID.
    pub id: i64,
    /// Full name.
    pub name: String,
    /// ISO country code.
    pub nationality: String,
    /// Visit status (`waiting`, `in_progress`, `completed`).
    pub status: String,
    /// Preferred language code.
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// A course of treatment for a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    /// Treatment ID.
    pub id: i64,
    /// Owning patient.
    pub patient_id: i64,
    /// Treatment category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Progress status.
    pub status: String,
    /// Cost as a decimal string. The server sends either a string or a
    /// bare number.
    #[serde(deserialize_with = "cost_text")]
    pub cost: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CostWire {
    Text(String),
    Number(serde_json::Number),
}

fn cost_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match CostWire::deserialize(deserializer)? {
        CostWire::Text(text) => text,
        CostWire::Number(n) => n.to_string(),
    })
}

/// A scheduled appointment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Appointment ID.
    pub id: i64,
    /// Patient being seen.
    pub patient_id: i64,
    /// Attending doctor.
    pub doctor_id: i64,
    /// Scheduled time.
    pub date: DateTime<Utc>,
    /// Appointment status.
    pub status: String,
}

/// A recorded patient visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientVisit {
    /// Visit ID.
    pub id: i64,
    /// Visiting patient.
    pub patient_id: i64,
    /// When the visit happened.
    pub visit_date: DateTime<Utc>,
    /// `initial`, `follow_up`, or `emergency`.
    pub visit_type: String,
    /// Duration in minutes.
    pub duration: u32,
}

/// The recorded result of a treatment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentOutcome {
    /// Outcome ID.
    pub id: i64,
    /// Treatment this outcome belongs to.
    pub treatment_id: i64,
    /// Score from 1 to 5.
    pub effectiveness_score: u8,
    /// Whether a follow-up visit is needed.
    pub followup_needed: bool,
    /// Free-form clinician notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Full snapshot of the five domain collections, as pushed by the
/// live-update endpoint in an `INITIAL_DATA` message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionsSnapshot {
    /// All patients.
    pub patients: Vec<Patient>,
    /// All treatments.
    pub treatments: Vec<Treatment>,
    /// All appointments.
    pub appointments: Vec<Appointment>,
    /// All patient visits.
    pub patient_visits: Vec<PatientVisit>,
    /// All treatment outcomes.
    pub treatment_outcomes: Vec<TreatmentOutcome>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_decodes_from_login_response() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "username": "doc1",
            "name": "Dr. Lee",
            "role": "doctor"
        }))
        .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Dr. Lee");
        assert_eq!(user.role, Role::Doctor);
    }

    #[test]
    fn unknown_role_decodes_to_other() {
        let user: User = serde_json::from_value(json!({
            "id": 2,
            "username": "x",
            "name": "X",
            "role": "receptionist"
        }))
        .unwrap();
        assert_eq!(user.role, Role::Other);
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Interpreter.to_string(), "interpreter");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn session_state_from_user() {
        assert_eq!(SessionState::from_user(None), SessionState::Anonymous);

        let user = User {
            id: 1,
            username: "doc1".into(),
            name: "Dr. Lee".into(),
            role: Role::Doctor,
        };
        let state = SessionState::from_user(Some(user.clone()));
        assert!(state.is_authenticated());
        assert_eq!(state.user(), Some(&user));
    }

    #[test]
    fn treatment_type_field_renamed() {
        let t: Treatment = serde_json::from_value(json!({
            "id": 6,
            "patientId": 6,
            "type": "acne",
            "status": "in_progress",
            "cost": "450000"
        }))
        .unwrap();
        assert_eq!(t.kind, "acne");
        let back = serde_json::to_value(&t).unwrap();
        assert_eq!(back["type"], "acne");
        assert_eq!(back["patientId"], 6);
    }

    #[test]
    fn treatment_cost_accepts_numbers() {
        let treatments: Vec<Treatment> = serde_json::from_value(json!([
            {"id": 1, "patientId": 1, "type": "diet", "status": "completed", "cost": 1200},
            {"id": 2, "patientId": 2, "type": "diet", "status": "completed", "cost": 99.5},
            {"id": 3, "patientId": 3, "type": "diet", "status": "completed", "cost": "550000"}
        ]))
        .unwrap();
        let costs: Vec<&str> = treatments.iter().map(|t| t.cost.as_str()).collect();
        assert_eq!(costs, ["1200", "99.5", "550000"]);

        let back = serde_json::to_value(&treatments[0]).unwrap();
        assert_eq!(back["cost"], "1200");
    }

    #[test]
    fn treatment_cost_rejects_other_shapes() {
        let result = serde_json::from_value::<Treatment>(json!({
            "id": 1, "patientId": 1, "type": "diet", "status": "completed", "cost": [1]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_decodes_camel_case_collections() {
        let snapshot: CollectionsSnapshot = serde_json::from_value(json!({
            "patients": [
                {"id": 1, "name": "John Smith", "nationality": "US", "status": "waiting", "preferredLanguage": "en"}
            ],
            "treatments": [],
            "appointments": [
                {"id": 1, "patientId": 1, "doctorId": 1, "date": "2026-03-01T09:00:00Z", "status": "scheduled"}
            ],
            "patientVisits": [
                {"id": 1, "patientId": 1, "visitDate": "2026-03-01T09:00:00Z", "visitType": "initial", "duration": 45}
            ],
            "treatmentOutcomes": [
                {"id": 1, "treatmentId": 1, "effectivenessScore": 4, "followupNeeded": true, "notes": null, "recordedAt": "2026-03-02T10:00:00Z"}
            ]
        }))
        .unwrap();
        assert_eq!(snapshot.patients.len(), 1);
        assert_eq!(snapshot.patients[0].preferred_language.as_deref(), Some("en"));
        assert_eq!(snapshot.appointments[0].doctor_id, 1);
        assert_eq!(snapshot.patient_visits[0].duration, 45);
        assert!(snapshot.treatment_outcomes[0].followup_needed);
        assert!(snapshot.treatment_outcomes[0].notes.is_none());
    }

    #[test]
    fn snapshot_missing_collection_fails() {
        let result: Result<CollectionsSnapshot, _> = serde_json::from_value(json!({
            "patients": []
        }));
        assert!(result.is_err());
    }
}
