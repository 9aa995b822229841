//! Record endpoints
//!
//! One API struct per record type. All of them go through [`AuthenticatedClient`], so
//! every call is authenticated and recovers from an expired access token.

mod doctors;
mod mappings;
mod patients;
mod response;

pub use doctors::DoctorsApi;
pub use mappings::MappingsApi;
pub use patients::PatientsApi;
pub use response::Saved;

pub(crate) use response::{ListBody, unwrap_saved};

use crate::client::AuthenticatedClient;

/// Entry point bundling the three record APIs over one client.
#[derive(Debug, Clone)]
pub struct RecordsApi {
    pub patients: PatientsApi,
    pub doctors: DoctorsApi,
    pub mappings: MappingsApi,
}

impl RecordsApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self {
            patients: PatientsApi::new(client.clone()),
            doctors: DoctorsApi::new(client.clone()),
            mappings: MappingsApi::new(client),
        }
    }
}
