//! Maps submission flags to canonical requirement lists.

use std::collections::BTreeMap;

use super::model::OnboardingRecord;

/// Equipment flag name → display name, in output order.
pub const EQUIPMENT_VOCABULARY: &[(&str, &str)] = &[
    ("laptop", "Laptop"),
    ("monitor", "Monitor"),
    ("keyboard", "Keyboard"),
    ("mouse", "Mouse"),
    ("headset", "Headset"),
];

/// Access flag name → display name, in output order.
pub const ACCESS_VOCABULARY: &[(&str, &str)] = &[
    ("email", "Email"),
    ("github", "GitHub"),
    ("slack", "Slack"),
    ("jira", "Jira"),
    ("drive", "Google Drive"),
];

/// Every employee gets at least a laptop and email.
pub const DEFAULT_EQUIPMENT: &str = "Laptop";
pub const DEFAULT_ACCESS: &str = "Email";

/// Canonical requirement lists derived from a record's flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementLists {
    pub equipment_needs: Vec<String>,
    pub system_access: Vec<String>,
}

/// Map a record's preference flags to requirement lists.
///
/// Output follows vocabulary order, not flag order. Unknown flags are ignored.
pub fn map_preferences(record: &OnboardingRecord) -> RequirementLists {
    RequirementLists {
        equipment_needs: map_flags(&record.equipment, EQUIPMENT_VOCABULARY, DEFAULT_EQUIPMENT),
        system_access: map_flags(&record.access, ACCESS_VOCABULARY, DEFAULT_ACCESS),
    }
}

fn map_flags(
    flags: &BTreeMap<String, bool>,
    vocabulary: &[(&str, &str)],
    fallback: &str,
) -> Vec<String> {
    let selected: Vec<String> = vocabulary
        .iter()
        .filter(|(flag, _)| flags.get(*flag).copied().unwrap_or(false))
        .map(|(_, display)| display.to_string())
        .collect();

    if selected.is_empty() {
        vec![fallback.to_string()]
    } else {
        selected
    }
}
