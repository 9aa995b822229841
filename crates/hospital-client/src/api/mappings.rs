use serde_json::Value;
use tracing::instrument;

use super::{ListBody, Saved, unwrap_saved};
use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::Result;
use crate::types::{MappingForm, MappingUpdate, PatientDoctorMapping};

const BASE: &str = "/api/mappings/";

/// Patient-doctor assignments
#[derive(Debug, Clone)]
pub struct MappingsApi {
    client: AuthenticatedClient,
}

impl MappingsApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PatientDoctorMapping>> {
        let body: ListBody<PatientDoctorMapping> =
            self.client.send_json(ApiRequest::get(BASE)).await?;
        Ok(body.into_vec())
    }

    /// All doctors assigned to one patient.
    #[instrument(skip(self))]
    pub async fn by_patient(&self, patient_id: u64) -> Result<Vec<PatientDoctorMapping>> {
        let body: ListBody<PatientDoctorMapping> = self
            .client
            .send_json(ApiRequest::get(format!("{BASE}patient/{patient_id}/")))
            .await?;
        Ok(body.into_vec())
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, form: &MappingForm) -> Result<Saved<PatientDoctorMapping>> {
        let body: Value = self
            .client
            .send_json(ApiRequest::post(BASE).json(form)?)
            .await?;
        unwrap_saved(body, "mapping", BASE)
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: u64,
        update: &MappingUpdate,
    ) -> Result<Saved<PatientDoctorMapping>> {
        let path = format!("{BASE}{id}/update/");
        let body: Value = self
            .client
            .send_json(ApiRequest::put(path.as_str()).json(update)?)
            .await?;
        unwrap_saved(body, "mapping", &path)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("{BASE}{id}/")))
            .await
    }
}
