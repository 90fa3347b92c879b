//! Prompt construction.
//!
//! Everything here is a pure function of its inputs: the same preferences always
//! produce the same instruction text.

use crate::user::{UNSET_TOKEN, UserPreferences};

/// Fixed system instruction for model A.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a logical analysis assistant. \
Analyse the user's question in depth, covering:\n\
1. The core points of the question\n\
2. Possible approaches to a solution\n\
3. Key factors that need to be considered\n\
4. The reasoning process\n\
Provide a structured analysis. Do not add a personable tone; focus on logic and facts.";

/// Builds model B's system instruction from the user's preferences.
///
/// Absent fields render as the literal [`UNSET_TOKEN`], and the instruction tells
/// the model what that token means, so "not provided" is never confused with an
/// empty preference.
pub fn build_system_prompt(preferences: &UserPreferences) -> String {
    let title = match preferences.preferred_title.as_deref() {
        Some(title) => format!("Please address the user as \"{title}\""),
        None => UNSET_TOKEN.to_string(),
    };

    format!(
        "# User information\n\
         - Profession: {profession}\n\
         - Preferred form of address: {title}\n\
         - Reply style: {style}\n\
         - Additional information: {info}\n\n\
         # Instructions\n\
         Based on the user information above, talk with the user in a suitable tone and \
         form of address. Stay professional while making sure replies match the user's \
         expectations and preferences. If an item is {unset}, the user did not provide it.",
        profession = render(&preferences.profession),
        style = render(&preferences.reply_style),
        info = render(&preferences.additional_info),
        unset = UNSET_TOKEN,
    )
}

/// Wraps model A's analysis and the user's question into model B's user turn.
pub fn compose_reply_request(analysis: &str, question: &str) -> String {
    format!(
        "Based on the following logical analysis, give the user a warm, personable reply:\n\n\
         [Logical analysis]\n{analysis}\n\n\
         [User's original question]\n{question}\n\n\
         Combine the analysis with a reply that matches the user's preferences."
    )
}

fn render(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(UNSET_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_fields_render_literal_token() {
        let prompt = build_system_prompt(&UserPreferences::unset());

        assert!(prompt.contains("- Profession: None\n"));
        assert!(prompt.contains("- Preferred form of address: None\n"));
        assert!(prompt.contains("- Reply style: None\n"));
        assert!(prompt.contains("- Additional information: None\n"));
        assert!(prompt.contains("If an item is None, the user did not provide it."));
    }

    #[test]
    fn test_title_renders_as_instruction() {
        let prefs = UserPreferences::from_answers("pilot", "Captain", "short and dry", "");
        let prompt = build_system_prompt(&prefs);

        assert!(prompt.contains("- Profession: pilot\n"));
        assert!(prompt.contains("- Preferred form of address: Please address the user as \"Captain\"\n"));
        assert!(prompt.contains("- Reply style: short and dry\n"));
        assert!(prompt.contains("- Additional information: None\n"));
    }

    #[test]
    fn test_prompt_ignores_timestamp() {
        let mut first = UserPreferences::from_answers("a", "b", "c", "d");
        let second = first.clone();
        first.last_updated = first.last_updated - chrono::Duration::days(3);

        assert_eq!(build_system_prompt(&first), build_system_prompt(&second));
    }

    #[test]
    fn test_reply_request_contains_both_parts() {
        let request = compose_reply_request("step 1: think", "what now?");

        assert!(request.contains("[Logical analysis]\nstep 1: think\n"));
        assert!(request.contains("[User's original question]\nwhat now?\n"));
    }
}
