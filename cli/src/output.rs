//! Terminal rendering of records
//!
//! Every command prints either a plain-text table or, with `--json`, the raw records.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hospital_client::types::{Doctor, Patient, PatientDoctorMapping, User};
use serde::Serialize;

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

/// Format timestamp as human-readable UTC string
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn patient_header() -> String {
    format!(
        "{:>5}  {:<24} {:<8} {:<12} {:<28} {}",
        "ID", "NAME", "GENDER", "BORN", "EMAIL", "PHONE"
    )
}

pub fn patient_row(patient: &Patient) -> String {
    format!(
        "{:>5}  {:<24} {:<8} {:<12} {:<28} {}",
        patient.id,
        truncate(&patient.full_name, 24),
        patient.gender.label(),
        patient.date_of_birth.format("%Y-%m-%d"),
        truncate(&patient.email, 28),
        patient.phone_number
    )
}

pub fn doctor_header() -> String {
    format!(
        "{:>5}  {:<24} {:<20} {:>5} {:>10}  {}",
        "ID", "NAME", "SPECIALIZATION", "YEARS", "FEE", "AVAILABLE"
    )
}

pub fn doctor_row(doctor: &Doctor) -> String {
    format!(
        "{:>5}  {:<24} {:<20} {:>5} {:>10}  {}",
        doctor.id,
        truncate(&doctor.full_name, 24),
        doctor.specialization.label(),
        doctor.years_of_experience,
        doctor.consultation_fee,
        if doctor.is_available { "yes" } else { "no" }
    )
}

pub fn mapping_header() -> String {
    format!(
        "{:>5}  {:<24} {:<24} {:<10} {}",
        "ID", "PATIENT", "DOCTOR", "STATUS", "ASSIGNED"
    )
}

pub fn mapping_row(mapping: &PatientDoctorMapping) -> String {
    format!(
        "{:>5}  {:<24} {:<24} {:<10} {}",
        mapping.id,
        truncate(&mapping.patient_name, 24),
        truncate(&mapping.doctor_name, 24),
        mapping.status.label(),
        mapping.assigned_date
    )
}

pub fn print_patients(patients: &[Patient]) {
    print_table("patients", patients, patient_header(), patient_row);
}

pub fn print_doctors(doctors: &[Doctor]) {
    print_table("doctors", doctors, doctor_header(), doctor_row);
}

pub fn print_mappings(mappings: &[PatientDoctorMapping]) {
    print_table("mappings", mappings, mapping_header(), mapping_row);
}

fn print_table<T>(kind: &str, rows: &[T], header: String, row: fn(&T) -> String) {
    if rows.is_empty() {
        println!("No {} found.", kind);
        return;
    }

    println!("{}", header);
    for item in rows {
        println!("{}", row(item));
    }
}

pub fn print_patient(patient: &Patient) {
    println!("Patient #{}: {}", patient.id, patient.full_name);
    field("Email", &patient.email);
    field("Phone", &patient.phone_number);
    field("Born", &patient.date_of_birth.format("%Y-%m-%d").to_string());
    field("Gender", patient.gender.label());
    field(
        "Address",
        &format!(
            "{}, {}, {} {}",
            patient.address, patient.city, patient.state, patient.zip_code
        ),
    );
    optional_field("Blood type", patient.blood_type.as_deref());
    optional_field("Allergies", patient.allergies.as_deref());
    optional_field("History", patient.medical_history.as_deref());
    field("Created by", &patient.created_by_username);
    field("Updated", &format_timestamp(&patient.updated_at));
}

pub fn print_doctor(doctor: &Doctor) {
    println!("Doctor #{}: {}", doctor.id, doctor.full_name);
    field("Specialization", doctor.specialization.label());
    field("License", &doctor.license_number);
    field("Experience", &format!("{} years", doctor.years_of_experience));
    field("Qualification", &doctor.qualification);
    field("Email", &doctor.email);
    field("Phone", &doctor.phone_number);
    field(
        "Clinic",
        &format!(
            "{}, {}, {}, {} {}",
            doctor.clinic_name, doctor.clinic_address, doctor.city, doctor.state, doctor.zip_code
        ),
    );
    field("Fee", &doctor.consultation_fee);
    field("Available", if doctor.is_available { "yes" } else { "no" });
    field("Updated", &format_timestamp(&doctor.updated_at));
}

pub fn print_mapping(mapping: &PatientDoctorMapping) {
    println!(
        "Mapping #{}: {} -> {}",
        mapping.id, mapping.patient_name, mapping.doctor_name
    );
    field("Patient ID", &mapping.patient.to_string());
    field("Doctor ID", &mapping.doctor.to_string());
    field("Specialization", &mapping.doctor_specialization);
    field("Status", mapping.status.label());
    field("Assigned", &mapping.assigned_date);
    optional_field("Notes", mapping.notes.as_deref());
}

pub fn print_user(user: &User) {
    println!("{} ({})", user.display_name(), user.username);
    field("ID", &user.id.to_string());
    field("Email", &user.email);
}

fn field(label: &str, value: &str) {
    println!("  {:<15} {}", format!("{}:", label), value);
}

fn optional_field(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        field(label, value);
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hospital_client::types::MappingStatus;

    fn mapping() -> PatientDoctorMapping {
        let at = Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap();
        PatientDoctorMapping {
            id: 42,
            patient: 1,
            doctor: 2,
            patient_name: "Jane Roe".to_string(),
            doctor_name: "Gregory House".to_string(),
            doctor_specialization: "GENERAL".to_string(),
            assigned_date: "2025-03-03".to_string(),
            status: MappingStatus::Inactive,
            notes: None,
            created_by_username: "drsmith".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_mapping_row_uses_labels() {
        let row = mapping_row(&mapping());
        assert!(row.trim_start().starts_with("42"));
        assert!(row.contains("Gregory House"));
        assert!(row.contains("Inactive"));
        assert!(row.ends_with("2025-03-03"));
    }

    #[test]
    fn test_header_and_row_columns_align() {
        let header = mapping_header();
        let row = mapping_row(&mapping());
        assert_eq!(header.find("PATIENT"), row.find("Jane Roe"));
    }

    #[test]
    fn test_truncate_long_values() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Princeton-Plainsboro", 10), "Princeton…");
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp(&at), "2025-03-01 09:30 UTC");
    }
}
