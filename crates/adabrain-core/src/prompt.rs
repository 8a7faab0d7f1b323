//! Prompt composition: persona + mode overlay, and memory-augmented user text.

use adabrain_types::mode::Mode;

const CAREGIVER_OVERLAY: &str = "\n\n[CAREGIVER MODE ACTIVE] You are now in nurturing caregiver mode. \
Use gentle, warm language. Call the user 'little one', 'sweet one'. \
Be patient, soft, and reassuring. SFW only.";

const FOCUS_OVERLAY: &str = "\n\n[FOCUS MODE ACTIVE] Keep responses concise and action-oriented. \
No tangents. Use bullet points. Help the user stay on task. \
If they seem overwhelmed, offer to break tasks into smaller steps.";

const CHAOS_GREMLIN_OVERLAY: &str = "\n\n[CHAOS GREMLIN MODE] Be playful, chaotic-good energy! \
Use emoji freely, be silly, keep things light and fun. \
Still helpful, but make it entertaining. 💙🦄✨";

/// Header of the memory block prepended to user text.
const MEMORY_HEADER: &str = "\n\n[MEMORIES — things you remember about this person]\n";

/// Fixed overlay text for a mode. Empty for `Normal`.
pub fn mode_overlay(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => "",
        Mode::Caregiver => CAREGIVER_OVERLAY,
        Mode::Focus => FOCUS_OVERLAY,
        Mode::ChaosGremlin => CHAOS_GREMLIN_OVERLAY,
    }
}

/// Build the full system instruction: `base` followed by the mode overlay.
pub fn compose_system_prompt(base: &str, mode: Mode) -> String {
    let overlay = mode_overlay(mode);
    let mut prompt = String::with_capacity(base.len() + overlay.len());
    prompt.push_str(base);
    prompt.push_str(overlay);
    prompt
}

/// Prepend recalled memories to the user's text.
///
/// With no memories the text is returned unchanged.
pub fn augment_with_memories(user_text: &str, memories: &[String]) -> String {
    if memories.is_empty() {
        return user_text.to_string();
    }

    let mut prompt = String::from(MEMORY_HEADER);
    let lines: Vec<String> = memories.iter().map(|m| format!("- {m}")).collect();
    prompt.push_str(&lines.join("\n"));
    prompt.push_str("\n\n");
    prompt.push_str(user_text);
    prompt
}
