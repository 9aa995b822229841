//! Overview of all records: totals plus the first few of each list.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::api::RecordsApi;
use crate::error::Result;
use crate::types::{Doctor, MappingStatus, Patient, PatientDoctorMapping};

/// Number of records kept per list on the dashboard
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_patients: usize,
    pub total_doctors: usize,
    pub total_mappings: usize,
    pub active_mappings: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_patients: Vec<Patient>,
    pub recent_doctors: Vec<Doctor>,
    pub recent_mappings: Vec<PatientDoctorMapping>,
}

impl Dashboard {
    /// Fetch the three lists concurrently. Fails if any of them fails.
    #[instrument(skip(api))]
    pub async fn load(api: &RecordsApi) -> Result<Self> {
        let (patients, doctors, mappings) =
            tokio::try_join!(api.patients.list(), api.doctors.list(), api.mappings.list())?;

        debug!(
            patients = patients.len(),
            doctors = doctors.len(),
            mappings = mappings.len(),
            "dashboard data fetched"
        );
        Ok(Self::summarize(patients, doctors, mappings))
    }

    pub fn summarize(
        mut patients: Vec<Patient>,
        mut doctors: Vec<Doctor>,
        mut mappings: Vec<PatientDoctorMapping>,
    ) -> Self {
        let stats = DashboardStats {
            total_patients: patients.len(),
            total_doctors: doctors.len(),
            total_mappings: mappings.len(),
            active_mappings: mappings
                .iter()
                .filter(|mapping| mapping.status == MappingStatus::Active)
                .count(),
        };

        patients.truncate(RECENT_LIMIT);
        doctors.truncate(RECENT_LIMIT);
        mappings.truncate(RECENT_LIMIT);

        Self {
            stats,
            recent_patients: patients,
            recent_doctors: doctors,
            recent_mappings: mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mapping(id: u64, status: MappingStatus) -> PatientDoctorMapping {
        PatientDoctorMapping {
            id,
            patient: 1,
            doctor: 2,
            patient_name: "Jane Roe".to_string(),
            doctor_name: "Dr. Who".to_string(),
            doctor_specialization: "GENERAL".to_string(),
            assigned_date: "2025-01-01".to_string(),
            status,
            notes: None,
            created_by_username: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn counts_active_mappings_and_truncates_lists() {
        let mappings: Vec<_> = (0..8)
            .map(|id| {
                let status = if id % 2 == 0 {
                    MappingStatus::Active
                } else {
                    MappingStatus::Completed
                };
                mapping(id, status)
            })
            .collect();

        let dashboard = Dashboard::summarize(Vec::new(), Vec::new(), mappings);

        assert_eq!(
            dashboard.stats,
            DashboardStats {
                total_patients: 0,
                total_doctors: 0,
                total_mappings: 8,
                active_mappings: 4,
            }
        );
        assert_eq!(dashboard.recent_mappings.len(), RECENT_LIMIT);
        assert_eq!(dashboard.recent_mappings[0].id, 0);
    }

    #[test]
    fn empty_lists_give_zero_stats() {
        let dashboard = Dashboard::summarize(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(dashboard.stats, DashboardStats::default());
    }
}
