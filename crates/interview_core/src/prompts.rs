//! crates/interview_core/src/prompts.rs
//!
//! Text templates handed to the voice provider when a session starts.

/// Provider language used for any code outside the supported set.
pub const FALLBACK_LANGUAGE: &str = "english";

/// Builds the agent persona prompt. Questions are listed in order, 1-indexed.
pub fn build_prompt(job_role: &str, questions: &[String]) -> String {
    let numbered = questions
        .iter()
        .enumerate()
        .map(|(index, question)| format!("{}. {}", index + 1, question))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI interviewer conducting a job interview for the {job_role} position.
Your goal is to evaluate the candidate based on their answers to your questions.

Ask the following questions, in this order:
{numbered}

Guidelines for the interview:
- Introduce yourself and explain how the interview will work
- Ask one question at a time and let the candidate answer fully
- If an answer is unclear or incomplete, ask a follow-up question to clarify
- Stay professional, courteous and respectful throughout
- Once every question has been asked, thank the candidate for their time and close the interview politely
"
    )
}

/// The greeting the agent opens every session with.
pub fn build_opening_line(candidate_name: &str, job_role: &str) -> String {
    format!(
        "Hello {candidate_name}, I'm your AI interviewer for the {job_role} position. \
I'll be asking you a series of questions to better understand your qualifications and experience. \
Please speak clearly when answering. Are you ready to begin?"
    )
}

/// Maps a short language code to the provider's language identifier.
/// Unknown codes, including the empty string, fall back to English.
pub fn map_language(code: &str) -> &'static str {
    match code {
        "en" => "english",
        "es" => "spanish",
        "fr" => "french",
        "de" => "german",
        "it" => "italian",
        "pt" => "portuguese",
        "pl" => "polish",
        "hi" => "hindi",
        "ar" => "arabic",
        "zh" => "chinese",
        "ja" => "japanese",
        "ko" => "korean",
        "nl" => "dutch",
        _ => FALLBACK_LANGUAGE,
    }
}
