//! Onboarding record (pipeline input) and employee data models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Onboarding lifecycle of an employee.
///
/// Moves forward only: `Pending → Completed` or `Pending → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl OnboardingStatus {
    pub fn can_transition_to(&self, target: OnboardingStatus) -> bool {
        use OnboardingStatus::*;
        matches!((self, target), (Pending, Completed) | (Pending, Failed))
    }
}

impl std::fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A new-hire submission, as received from the HR front-end.
///
/// Required fields default to empty on deserialization so that
/// [`validate`](Self::validate) can name the missing one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub start_date: String,
    /// Equipment flags, e.g. `{"laptop": true, "monitor": false}`.
    #[serde(default)]
    pub equipment: BTreeMap<String, bool>,
    /// System access flags, e.g. `{"email": true, "github": true}`.
    #[serde(default)]
    pub access: BTreeMap<String, bool>,
}

impl OnboardingRecord {
    pub fn new(
        name: impl Into<String>,
        position: impl Into<String>,
        department: impl Into<String>,
        start_date: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            position: position.into(),
            department: department.into(),
            start_date: start_date.into(),
            ..Default::default()
        }
    }

    /// Reject records with blank required fields or a malformed start date.
    pub fn validate(&self) -> Result<(), RecordError> {
        let required = [
            ("name", &self.name),
            ("position", &self.position),
            ("department", &self.department),
            ("startDate", &self.start_date),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(RecordError::MissingField(field));
            }
        }
        self.parsed_start_date()?;
        Ok(())
    }

    pub fn parsed_start_date(&self) -> Result<NaiveDate, RecordError> {
        NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").map_err(|_| {
            RecordError::InvalidStartDate {
                value: self.start_date.clone(),
            }
        })
    }
}

/// The employee section of the onboarding state and of the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub name: String,
    pub position: String,
    pub department: String,
    pub start_date: String,
    pub equipment_needs: Vec<String>,
    pub system_access: Vec<String>,
    pub training_requirements: Vec<String>,
    pub status: OnboardingStatus,
}

impl Employee {
    /// Render the employee as prompt lines (name, position, department).
    pub fn to_prompt_section(&self) -> String {
        format!(
            "Employee Name: {}\nPosition: {}\nDepartment: {}",
            self.name, self.position, self.department
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_camel_case() {
        let json = r#"{
            "name": "Jane Smith",
            "position": "Marketing Manager",
            "department": "Marketing",
            "startDate": "2023-06-15",
            "equipment": {"laptop": true, "monitor": false}
        }"#;
        let record: OnboardingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.start_date, "2023-06-15");
        assert_eq!(record.equipment.get("laptop"), Some(&true));
        assert!(record.access.is_empty());
        assert!(record.id.is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn missing_required_field_is_named() {
        let json = r#"{"name": "Jane", "position": "PM", "startDate": "2023-06-15"}"#;
        let record: OnboardingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.validate(), Err(RecordError::MissingField("department")));
    }

    #[test]
    fn blank_name_is_rejected() {
        let record = OnboardingRecord::new("   ", "PM", "Product", "2023-06-15");
        assert_eq!(record.validate(), Err(RecordError::MissingField("name")));
    }

    #[test]
    fn malformed_start_date_is_rejected() {
        let record = OnboardingRecord::new("Jane", "PM", "Product", "15/06/2023");
        assert!(matches!(
            record.validate(),
            Err(RecordError::InvalidStartDate { .. })
        ));
    }

    #[test]
    fn status_only_moves_forward() {
        use OnboardingStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Failed));
    }

    #[test]
    fn status_display_matches_serde() {
        use OnboardingStatus::*;
        for status in [Pending, Completed, Failed] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{status}\""), json);
        }
    }

    #[test]
    fn employee_serializes_result_shape() {
        let employee = Employee {
            name: "Jane".into(),
            position: "PM".into(),
            department: "Product".into(),
            start_date: "2023-06-15".into(),
            equipment_needs: vec!["Laptop".into()],
            system_access: vec!["Email".into()],
            training_requirements: vec![],
            status: OnboardingStatus::Pending,
        };
        let value = serde_json::to_value(&employee).unwrap();
        assert_eq!(value["startDate"], "2023-06-15");
        assert_eq!(value["equipmentNeeds"][0], "Laptop");
        assert_eq!(value["systemAccess"][0], "Email");
        assert_eq!(value["trainingRequirements"], serde_json::json!([]));
        assert_eq!(value["status"], "pending");
    }
}
