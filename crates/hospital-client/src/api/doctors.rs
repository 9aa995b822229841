use serde_json::Value;
use tracing::instrument;

use super::{ListBody, Saved, unwrap_saved};
use crate::client::{ApiRequest, AuthenticatedClient};
use crate::error::Result;
use crate::types::{Doctor, DoctorForm, DoctorUpdate};

// Doctor writes use action suffixes (`create/`, `update/`, `delete/`).
const BASE: &str = "/api/doctors/";

#[derive(Debug, Clone)]
pub struct DoctorsApi {
    client: AuthenticatedClient,
}

impl DoctorsApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Doctor>> {
        let body: ListBody<Doctor> = self.client.send_json(ApiRequest::get(BASE)).await?;
        Ok(body.into_vec())
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, form: &DoctorForm) -> Result<Saved<Doctor>> {
        let path = format!("{BASE}create/");
        let body: Value = self
            .client
            .send_json(ApiRequest::post(path.as_str()).json(form)?)
            .await?;
        unwrap_saved(body, "doctor", &path)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: u64) -> Result<Doctor> {
        self.client
            .send_json(ApiRequest::get(format!("{BASE}{id}/")))
            .await
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: u64, update: &DoctorUpdate) -> Result<Saved<Doctor>> {
        let path = format!("{BASE}{id}/update/");
        let body: Value = self
            .client
            .send_json(ApiRequest::put(path.as_str()).json(update)?)
            .await?;
        unwrap_saved(body, "doctor", &path)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("{BASE}{id}/delete/")))
            .await
    }
}
