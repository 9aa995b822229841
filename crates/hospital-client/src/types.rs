//! Wire types for the records API
//!
//! Records (`Patient`, `Doctor`, `PatientDoctorMapping`) are what the server returns.
//! Forms are what the client sends on create; `*Update` types are partial forms for
//! updates, where `None` fields are left out of the request body.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::token::BearerToken;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Access/refresh pair as issued on login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: BearerToken,
    pub refresh: BearerToken,
}

/// Body returned by the login and register endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
    pub tokens: Credentials,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Password confirmation
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

// ============================================================================
// Choice enums
// ============================================================================

/// Error returned when parsing a choice value that the API does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownChoice {
    kind: &'static str,
    value: String,
    expected: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => ($code:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Value sent over the wire.
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Human readable label.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|choice| {
                        choice.code().eq_ignore_ascii_case(value)
                            || choice.label().eq_ignore_ascii_case(value)
                    })
                    .ok_or_else(|| UnknownChoice {
                        kind: $kind,
                        value: value.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|choice| choice.code())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

choice_enum!(
    Gender, "gender" {
        Male => ("M", "Male"),
        Female => ("F", "Female"),
        Other => ("O", "Other"),
    }
);

choice_enum!(
    /// Medical specialization of a doctor
    Specialization, "specialization" {
        Cardiology => ("CARDIOLOGY", "Cardiology"),
        Dermatology => ("DERMATOLOGY", "Dermatology"),
        Emergency => ("EMERGENCY", "Emergency Medicine"),
        Endocrinology => ("ENDOCRINOLOGY", "Endocrinology"),
        Gastroenterology => ("GASTROENTEROLOGY", "Gastroenterology"),
        General => ("GENERAL", "General Medicine"),
        Neurology => ("NEUROLOGY", "Neurology"),
        Oncology => ("ONCOLOGY", "Oncology"),
        Orthopedics => ("ORTHOPEDICS", "Orthopedics"),
        Pediatrics => ("PEDIATRICS", "Pediatrics"),
        Psychiatry => ("PSYCHIATRY", "Psychiatry"),
        Radiology => ("RADIOLOGY", "Radiology"),
        Surgery => ("SURGERY", "Surgery"),
        Urology => ("UROLOGY", "Urology"),
        Other => ("OTHER", "Other"),
    }
);

choice_enum!(
    /// Lifecycle of a patient-doctor assignment
    MappingStatus, "mapping status" {
        Active => ("ACTIVE", "Active"),
        Inactive => ("INACTIVE", "Inactive"),
        Completed => ("COMPLETED", "Completed"),
    }
);

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub created_by_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub specialization: Specialization,
    pub license_number: String,
    pub years_of_experience: u32,
    pub qualification: String,
    pub clinic_name: String,
    pub clinic_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    /// Decimal amount rendered by the server as a string (e.g. `"150.00"`)
    pub consultation_fee: String,
    pub is_available: bool,
    #[serde(default)]
    pub created_by_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDoctorMapping {
    pub id: u64,
    pub patient: u64,
    pub doctor: u64,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub doctor_specialization: String,
    pub assigned_date: String,
    pub status: MappingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub specialization: Specialization,
    pub license_number: String,
    pub years_of_experience: u32,
    pub qualification: String,
    pub clinic_name: String,
    pub clinic_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub consultation_fee: f64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Specialization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingForm {
    pub patient: u64,
    pub doctor: u64,
    pub status: MappingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MappingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
