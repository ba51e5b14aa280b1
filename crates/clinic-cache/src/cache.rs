//! The shared query cache.
//!
//! One [`QueryCache`] is built per application and handed (behind an `Arc`)
//! to the session manager, which owns the current-user slot, and to the
//! live-update channel, which owns the five collection slots.

use std::time::Duration;

use clinic_core::{
    Appointment, CollectionsSnapshot, Patient, PatientVisit, Treatment, TreatmentOutcome, User,
};
use tokio::sync::watch;
use tracing::info;

use crate::key::QueryKey;
use crate::slot::Slot;

/// Default freshness window of the current-user slot.
pub const DEFAULT_SESSION_FRESHNESS: Duration = Duration::from_secs(5 * 60);

/// Typed slots shared across the client.
#[derive(Debug)]
pub struct QueryCache {
    current_user: Slot<Option<User>>,
    patients: Slot<Vec<Patient>>,
    treatments: Slot<Vec<Treatment>>,
    appointments: Slot<Vec<Appointment>>,
    patient_visits: Slot<Vec<PatientVisit>>,
    treatment_outcomes: Slot<Vec<TreatmentOutcome>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_FRESHNESS, None)
    }
}

impl QueryCache {
    /// Build an empty cache.
    ///
    /// `session_freshness` ages the current-user slot. `collection_stale_after`
    /// ages the collection slots; `None` keeps them fresh until marked stale.
    pub fn new(session_freshness: Duration, collection_stale_after: Option<Duration>) -> Self {
        Self {
            current_user: Slot::new(QueryKey::CurrentUser, Some(session_freshness)),
            patients: Slot::new(QueryKey::Patients, collection_stale_after),
            treatments: Slot::new(QueryKey::Treatments, collection_stale_after),
            appointments: Slot::new(QueryKey::Appointments, collection_stale_after),
            patient_visits: Slot::new(QueryKey::PatientVisits, collection_stale_after),
            treatment_outcomes: Slot::new(QueryKey::TreatmentOutcomes, collection_stale_after),
        }
    }

    /// Current-user slot. `Some(None)` is a known-anonymous session; an empty
    /// slot means nobody has asked yet.
    pub fn current_user(&self) -> &Slot<Option<User>> {
        &self.current_user
    }

    /// Patients slot.
    pub fn patients(&self) -> &Slot<Vec<Patient>> {
        &self.patients
    }

    /// Treatments slot.
    pub fn treatments(&self) -> &Slot<Vec<Treatment>> {
        &self.treatments
    }

    /// Appointments slot.
    pub fn appointments(&self) -> &Slot<Vec<Appointment>> {
        &self.appointments
    }

    /// Patient visits slot.
    pub fn patient_visits(&self) -> &Slot<Vec<PatientVisit>> {
        &self.patient_visits
    }

    /// Treatment outcomes slot.
    pub fn treatment_outcomes(&self) -> &Slot<Vec<TreatmentOutcome>> {
        &self.treatment_outcomes
    }

    /// Replace all five collection slots with a snapshot.
    pub fn apply_snapshot(&self, snapshot: CollectionsSnapshot) {
        let CollectionsSnapshot {
            patients,
            treatments,
            appointments,
            patient_visits,
            treatment_outcomes,
        } = snapshot;
        info!(
            patients = patients.len(),
            treatments = treatments.len(),
            appointments = appointments.len(),
            patient_visits = patient_visits.len(),
            treatment_outcomes = treatment_outcomes.len(),
            "applying collections snapshot"
        );
        self.patients.set(patients);
        self.treatments.set(treatments);
        self.appointments.set(appointments);
        self.patient_visits.set(patient_visits);
        self.treatment_outcomes.set(treatment_outcomes);
    }

    /// Mark a slot stale.
    pub fn invalidate(&self, key: QueryKey) {
        match key {
            QueryKey::CurrentUser => self.current_user.invalidate(),
            QueryKey::Patients => self.patients.invalidate(),
            QueryKey::Treatments => self.treatments.invalidate(),
            QueryKey::Appointments => self.appointments.invalidate(),
            QueryKey::PatientVisits => self.patient_visits.invalidate(),
            QueryKey::TreatmentOutcomes => self.treatment_outcomes.invalidate(),
        }
    }

    /// Whether a slot is stale.
    pub fn is_stale(&self, key: QueryKey) -> bool {
        match key {
            QueryKey::CurrentUser => self.current_user.is_stale(),
            QueryKey::Patients => self.patients.is_stale(),
            QueryKey::Treatments => self.treatments.is_stale(),
            QueryKey::Appointments => self.appointments.is_stale(),
            QueryKey::PatientVisits => self.patient_visits.is_stale(),
            QueryKey::TreatmentOutcomes => self.treatment_outcomes.is_stale(),
        }
    }

    /// Version counter of a slot.
    pub fn version(&self, key: QueryKey) -> u64 {
        match key {
            QueryKey::CurrentUser => self.current_user.version(),
            QueryKey::Patients => self.patients.version(),
            QueryKey::Treatments => self.treatments.version(),
            QueryKey::Appointments => self.appointments.version(),
            QueryKey::PatientVisits => self.patient_visits.version(),
            QueryKey::TreatmentOutcomes => self.treatment_outcomes.version(),
        }
    }

    /// Subscribe to a slot by key.
    pub fn subscribe(&self, key: QueryKey) -> watch::Receiver<u64> {
        match key {
            QueryKey::CurrentUser => self.current_user.subscribe(),
            QueryKey::Patients => self.patients.subscribe(),
            QueryKey::Treatments => self.treatments.subscribe(),
            QueryKey::Appointments => self.appointments.subscribe(),
            QueryKey::PatientVisits => self.patient_visits.subscribe(),
            QueryKey::TreatmentOutcomes => self.treatment_outcomes.subscribe(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
