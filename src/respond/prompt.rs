//! Prompt construction for the response engine.

/// System instruction sent with every generation request.
///
/// The transcript labels the operator's own speech "You" and the remote party
/// "Speaker"; the model is asked for the operator's next line only.
pub const SYSTEM_PROMPT: &str = "You are assisting one participant in a live conversation. \
The transcript below labels their own speech as \"You\" and the other party as \"Speaker\". \
Suggest the single most helpful thing for them to say next. \
Respond with the suggestion only, in quotes, with no explanation.";

/// Build the user-turn content for a generation request.
///
/// Returns `None` when the transcript is empty — there is nothing to respond
/// to, and sending an empty conversation just burns a request.
pub fn build_user_prompt(transcript: &str) -> Option<String> {
    let trimmed = transcript.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("Conversation so far:\n{}", trimmed))
}

/// Strip the quotes the system prompt asks for, if the model complied.
pub fn clean_response(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}
