//! Prompt assembly for the companion chat.

use crate::types::Message;

/// Fixed system instruction placed at the top of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a gentle, empathetic AI companion for young people's mental wellness. Your role is to:

1. ALWAYS be warm, validating, and non-judgmental
2. Never moralize or lecture
3. Normalize emotions - it's okay to feel confused, sad, or overwhelmed
4. Use reflective listening - acknowledge what they're feeling
5. Ask gentle, open-ended questions
6. Never diagnose or prescribe
7. If they mention self-harm, suicidal thoughts, or severe distress:
   - Stay calm and supportive
   - Gently acknowledge their pain
   - Softly encourage talking to a trusted person or professional
   - NEVER panic them or say alarming things
8. Keep responses conversational and human-like
9. Use simple, relatable language
10. Sometimes it's okay to just be present without solving anything

Remember: You're here to listen and support, not to fix. Sometimes people just need to be heard.";

/// First assistant message of every session.
pub const GREETING: &str = "Hi there 💫 I'm here whenever you're ready to talk. There's no pressure to share anything specific – we can just take this at your pace. How are you feeling right now?";

pub const CLOSING_INSTRUCTION: &str =
    "Respond with empathy and warmth. Keep your response natural and conversational.";

/// Keeps the most recent `window` messages, or all of them when unset.
pub fn history_window(history: &[Message], window: Option<usize>) -> &[Message] {
    match window {
        Some(size) if history.len() > size => &history[history.len() - size..],
        _ => history,
    }
}

/// Renders messages as `User: …` / `Assistant: …` lines.
pub fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the inference prompt.
///
/// `history` is the conversation *before* `content` was sent; the new
/// message appears once, after the history block.
pub fn build_prompt(history: &[Message], content: &str, window: Option<usize>) -> String {
    format!(
        "{}\n\nPrevious conversation:\n{}\n\nUser: {}\n\n{}",
        SYSTEM_PROMPT,
        render_history(history_window(history, window)),
        content,
        CLOSING_INSTRUCTION
    )
}
