//! Record commands for patients, doctors and patient-doctor mappings
//!
//! Create and update read a JSON body (`--data` or `--file`). Updates are partial: fields
//! left out of the body are not sent.

use anyhow::{Context, Result};
use clap::Parser;
use hospital_client::Saved;
use hospital_client::types::{
    DoctorForm, DoctorUpdate, MappingForm, MappingUpdate, PatientForm, PatientUpdate,
};
use serde::Serialize;

use super::{AppContext, JsonInput};
use crate::output;

#[derive(Parser)]
pub enum PatientCommand {
    /// List all patients
    List,

    /// Show one patient
    Get { id: u64 },

    /// Create a patient from a JSON body
    ///
    /// Example:
    ///   hospital-admin patients create --data '{"first_name": "Jane", "last_name": "Roe",
    ///     "email": "jane@example.org", "phone_number": "555-0100",
    ///     "date_of_birth": "1990-04-12", "gender": "F", "address": "1 Main St",
    ///     "city": "Springfield", "state": "IL", "zip_code": "62701"}'
    Create {
        #[command(flatten)]
        input: JsonInput,
    },

    /// Update fields of a patient
    Update {
        id: u64,

        #[command(flatten)]
        input: JsonInput,
    },

    /// Delete a patient
    Delete { id: u64 },
}

#[derive(Parser)]
pub enum DoctorCommand {
    /// List all doctors
    List,

    /// Show one doctor
    Get { id: u64 },

    /// Create a doctor from a JSON body
    Create {
        #[command(flatten)]
        input: JsonInput,
    },

    /// Update fields of a doctor
    ///
    /// Example:
    ///   hospital-admin doctors update 7 --data '{"is_available": false}'
    Update {
        id: u64,

        #[command(flatten)]
        input: JsonInput,
    },

    /// Delete a doctor
    Delete { id: u64 },
}

#[derive(Parser)]
pub enum MappingCommand {
    /// List all patient-doctor mappings
    List,

    /// List the doctors assigned to one patient
    ByPatient { patient_id: u64 },

    /// Assign a doctor to a patient
    ///
    /// Example:
    ///   hospital-admin mappings create --data '{"patient": 1, "doctor": 2, "status": "ACTIVE"}'
    Create {
        #[command(flatten)]
        input: JsonInput,
    },

    /// Update fields of a mapping
    Update {
        id: u64,

        #[command(flatten)]
        input: JsonInput,
    },

    /// Delete a mapping
    Delete { id: u64 },
}

pub async fn handle_patient_command(ctx: &AppContext, command: PatientCommand) -> Result<()> {
    ctx.require_login()?;
    let api = &ctx.records.patients;

    match command {
        PatientCommand::List => {
            let patients = api.list().await.context("Failed to list patients")?;
            if ctx.json {
                return output::print_json(&patients);
            }
            output::print_patients(&patients);
        }
        PatientCommand::Get { id } => {
            let patient = api
                .get(id)
                .await
                .with_context(|| format!("Failed to fetch patient {}", id))?;
            if ctx.json {
                return output::print_json(&patient);
            }
            output::print_patient(&patient);
        }
        PatientCommand::Create { input } => {
            let form: PatientForm = input.parse()?;
            let saved = api.create(&form).await.context("Failed to create patient")?;
            report_saved(ctx, &saved, "Patient created", output::print_patient)?;
        }
        PatientCommand::Update { id, input } => {
            let update: PatientUpdate = input.parse()?;
            let saved = api
                .update(id, &update)
                .await
                .with_context(|| format!("Failed to update patient {}", id))?;
            report_saved(ctx, &saved, "Patient updated", output::print_patient)?;
        }
        PatientCommand::Delete { id } => {
            api.delete(id)
                .await
                .with_context(|| format!("Failed to delete patient {}", id))?;
            println!("Deleted patient {}", id);
        }
    }

    Ok(())
}

pub async fn handle_doctor_command(ctx: &AppContext, command: DoctorCommand) -> Result<()> {
    ctx.require_login()?;
    let api = &ctx.records.doctors;

    match command {
        DoctorCommand::List => {
            let doctors = api.list().await.context("Failed to list doctors")?;
            if ctx.json {
                return output::print_json(&doctors);
            }
            output::print_doctors(&doctors);
        }
        DoctorCommand::Get { id } => {
            let doctor = api
                .get(id)
                .await
                .with_context(|| format!("Failed to fetch doctor {}", id))?;
            if ctx.json {
                return output::print_json(&doctor);
            }
            output::print_doctor(&doctor);
        }
        DoctorCommand::Create { input } => {
            let form: DoctorForm = input.parse()?;
            let saved = api.create(&form).await.context("Failed to create doctor")?;
            report_saved(ctx, &saved, "Doctor created", output::print_doctor)?;
        }
        DoctorCommand::Update { id, input } => {
            let update: DoctorUpdate = input.parse()?;
            let saved = api
                .update(id, &update)
                .await
                .with_context(|| format!("Failed to update doctor {}", id))?;
            report_saved(ctx, &saved, "Doctor updated", output::print_doctor)?;
        }
        DoctorCommand::Delete { id } => {
            api.delete(id)
                .await
                .with_context(|| format!("Failed to delete doctor {}", id))?;
            println!("Deleted doctor {}", id);
        }
    }

    Ok(())
}

pub async fn handle_mapping_command(ctx: &AppContext, command: MappingCommand) -> Result<()> {
    ctx.require_login()?;
    let api = &ctx.records.mappings;

    match command {
        MappingCommand::List => {
            let mappings = api.list().await.context("Failed to list mappings")?;
            if ctx.json {
                return output::print_json(&mappings);
            }
            output::print_mappings(&mappings);
        }
        MappingCommand::ByPatient { patient_id } => {
            let mappings = api
                .by_patient(patient_id)
                .await
                .with_context(|| format!("Failed to list mappings of patient {}", patient_id))?;
            if ctx.json {
                return output::print_json(&mappings);
            }
            output::print_mappings(&mappings);
        }
        MappingCommand::Create { input } => {
            let form: MappingForm = input.parse()?;
            let saved = api.create(&form).await.context("Failed to create mapping")?;
            report_saved(ctx, &saved, "Mapping created", output::print_mapping)?;
        }
        MappingCommand::Update { id, input } => {
            let update: MappingUpdate = input.parse()?;
            let saved = api
                .update(id, &update)
                .await
                .with_context(|| format!("Failed to update mapping {}", id))?;
            report_saved(ctx, &saved, "Mapping updated", output::print_mapping)?;
        }
        MappingCommand::Delete { id } => {
            api.delete(id)
                .await
                .with_context(|| format!("Failed to delete mapping {}", id))?;
            println!("Deleted mapping {}", id);
        }
    }

    Ok(())
}

fn report_saved<T: Serialize>(
    ctx: &AppContext,
    saved: &Saved<T>,
    fallback: &str,
    print: fn(&T),
) -> Result<()> {
    if ctx.json {
        return output::print_json(&saved.record);
    }
    println!("{}", saved.message.as_deref().unwrap_or(fallback));
    print(&saved.record);
    Ok(())
}
