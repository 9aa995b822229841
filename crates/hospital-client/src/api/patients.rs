use serde_json::Value;
use tracing::instrument;

use super::{ListBody, Saved, unwrap_saved};
use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::Result;
use crate::types::{Patient, PatientForm, PatientUpdate};

const BASE: &str = "/api/patients/";

#[derive(Debug, Clone)]
pub struct PatientsApi {
    client: AuthenticatedClient,
}

impl PatientsApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Patient>> {
        let body: ListBody<Patient> = self.client.send_json(ApiRequest::get(BASE)).await?;
        Ok(body.into_vec())
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, form: &PatientForm) -> Result<Saved<Patient>> {
        let body: Value = self
            .client
            .send_json(ApiRequest::post(BASE).json(form)?)
            .await?;
        unwrap_saved(body, "patient", BASE)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: u64) -> Result<Patient> {
        self.client.send_json(ApiRequest::get(item_path(id))).await
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: u64, update: &PatientUpdate) -> Result<Saved<Patient>> {
        let path = item_path(id);
        let body: Value = self
            .client
            .send_json(ApiRequest::put(path.as_str()).json(update)?)
            .await?;
        unwrap_saved(body, "patient", &path)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.send_empty(ApiRequest::delete(item_path(id))).await
    }
}

fn item_path(id: u64) -> String {
    format!("{BASE}{id}/")
}
