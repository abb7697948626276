//! Prompt builders for the three onboarding stages.

use crate::llm::ChatMessage;

use super::model::Employee;

/// JSON key the equipment stage reads for equipment.
pub const EQUIPMENT_KEY: &str = "equipment_needs";
/// JSON key the equipment stage reads for system access.
pub const ACCESS_KEY: &str = "system_access";
/// JSON key the training stage reads.
pub const TRAINING_KEY: &str = "training_requirements";

pub const EQUIPMENT_ACCESS_SCHEMA: &str =
    r#"{"equipment_needs": ["string", ...], "system_access": ["string", ...]}"#;
pub const TRAINING_SCHEMA: &str = r#"{"training_requirements": ["string", ...]}"#;

/// Prompt for the info validation stage. The answer is advisory text.
pub fn info_validation_prompt(employee: &Employee) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are an HR assistant helping with employee onboarding. \
             Validate the following employee information and add any missing details.",
        ),
        ChatMessage::user(format!(
            "{}\nStart Date: {}",
            employee.to_prompt_section(),
            employee.start_date
        )),
    ]
}

/// Prompt asking for equipment and system access lists.
pub fn equipment_access_prompt(employee: &Employee) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are an IT specialist helping with employee onboarding. \
             Determine appropriate equipment and system access based on the role.",
        ),
        ChatMessage::user(format!(
            "Based on the following employee information, list required equipment and system access:\n\
             {}\n\
             Respond in JSON format with '{EQUIPMENT_KEY}' and '{ACCESS_KEY}' as lists.",
            employee.to_prompt_section()
        )),
    ]
}

/// Prompt asking for a training plan, with earlier conversation as context.
pub fn training_plan_prompt(employee: &Employee, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are a training coordinator helping with employee onboarding. \
             Create a training plan for the new employee. \
             Your response MUST be valid JSON with double quotes, containing ONLY a \
             'training_requirements' list with no additional text before or after the JSON.",
        ),
        ChatMessage::user(format!(
            "Based on the following employee information and previous onboarding steps, \
             determine appropriate training requirements:\n\
             {}\n\
             Equipment: {}\n\
             System Access: {}\n\n\
             Context from previous steps:\n{context}\n\n\
             Return a JSON object with only a '{TRAINING_KEY}' key containing an array of strings. \
             Do not include any explanations or text outside the JSON.",
            employee.to_prompt_section(),
            employee.equipment_needs.join(", "),
            employee.system_access.join(", "),
        )),
    ]
}

/// Flatten a prompt into the text stored in the conversation log.
pub fn render_prompt(prompt: &[ChatMessage]) -> String {
    prompt
        .iter()
        .map(|m| format!("{}: {}", capitalize(&m.role.to_string()), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
