//! Stable slot keys.

use clinic_core::constants::{
    APPOINTMENTS_PATH, AUTH_USER_PATH, PATIENT_VISITS_PATH, PATIENTS_PATH, TREATMENT_OUTCOMES_PATH,
    TREATMENTS_PATH,
};

/// Name of a cache slot. Each key is the REST path that refills it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The authenticated user (or its absence).
    CurrentUser,
    /// Patients collection.
    Patients,
    /// Treatments collection.
    Treatments,
    /// Appointments collection.
    Appointments,
    /// Patient visits collection.
    PatientVisits,
    /// Treatment outcomes collection.
    TreatmentOutcomes,
}

impl QueryKey {
    /// The five domain collections, in snapshot order.
    pub const COLLECTIONS: [Self; 5] = [
        Self::Patients,
        Self::Treatments,
        Self::Appointments,
        Self::PatientVisits,
        Self::TreatmentOutcomes,
    ];

    /// REST path backing this slot.
    pub fn path(self) -> &'static str {
        match self {
            Self::CurrentUser => AUTH_USER_PATH,
            Self::Patients => PATIENTS_PATH,
            Self::Treatments => TREATMENTS_PATH,
            Self::Appointments => APPOINTMENTS_PATH,
            Self::PatientVisits => PATIENT_VISITS_PATH,
            Self::TreatmentOutcomes => TREATMENT_OUTCOMES_PATH,
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
