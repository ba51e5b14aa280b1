//! Collection reads backed by the shared cache.

use std::sync::Arc;

use clinic_cache::{QueryCache, QueryKey};
use clinic_core::{Appointment, Patient, PatientVisit, Treatment, TreatmentOutcome};

use crate::client::ApiClient;
use crate::errors::Result;

/// Reads the five domain collections through the cache, re-fetching a slot
/// from its REST path when it is empty or stale.
#[derive(Clone, Debug)]
pub struct CollectionFetcher {
    client: ApiClient,
    cache: Arc<QueryCache>,
}

impl CollectionFetcher {
    /// Bind a fetcher to a client and a cache.
    pub fn new(client: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    /// All patients.
    pub async fn patients(&self) -> Result<Arc<Vec<Patient>>> {
        self.cache
            .patients()
            .get_or_fetch(|| self.client.get_json(QueryKey::Patients.path()))
            .await
    }

    /// All treatments.
    pub async fn treatments(&self) -> Result<Arc<Vec<Treatment>>> {
        self.cache
            .treatments()
            .get_or_fetch(|| self.client.get_json(QueryKey::Treatments.path()))
            .await
    }

    /// All appointments.
    pub async fn appointments(&self) -> Result<Arc<Vec<Appointment>>> {
        self.cache
            .appointments()
            .get_or_fetch(|| self.client.get_json(QueryKey::Appointments.path()))
            .await
    }

    /// All patient visits.
    pub async fn patient_visits(&self) -> Result<Arc<Vec<PatientVisit>>> {
        self.cache
            .patient_visits()
            .get_or_fetch(|| self.client.get_json(QueryKey::PatientVisits.path()))
            .await
    }

    /// All treatment outcomes.
    pub async fn treatment_outcomes(&self) -> Result<Arc<Vec<TreatmentOutcome>>> {
        self.cache
            .treatment_outcomes()
            .get_or_fetch(|| self.client.get_json(QueryKey::TreatmentOutcomes.path()))
            .await
    }

    /// Read one collection by key, refilling it if needed. Returns the
    /// number of records now cached. The current-user slot is not a
    /// collection and reads as zero.
    pub async fn read(&self, key: QueryKey) -> Result<usize> {
        Ok(match key {
            QueryKey::CurrentUser => 0,
            QueryKey::Patients => self.patients().await?.len(),
            QueryKey::Treatments => self.treatments().await?.len(),
            QueryKey::Appointments => self.appointments().await?.len(),
            QueryKey::PatientVisits => self.patient_visits().await?.len(),
            QueryKey::TreatmentOutcomes => self.treatment_outcomes().await?.len(),
        })
    }
}
