//! Prompt text shared by every provider.
//!
//! Both providers get the same instructions and confidence bands so their
//! scores are comparable.

/// System instruction sent alongside the user prompt.
pub const SYSTEM_PROMPT: &str = "You verify whether photos submitted for a challenge \
actually show what the challenge asks for. You are strict but fair, you never guess \
about things that are not visible, and you always answer with a single JSON object \
and nothing else.";

/// Confidence bands the model must use.
pub const CONFIDENCE_BANDS: [(&str, &str); 5] = [
    ("0.9-1.0", "excellent match: the image clearly and fully satisfies the challenge"),
    ("0.7-0.9", "good match: the challenge is satisfied with minor doubts"),
    ("0.5-0.7", "partial match: some elements are present, others are missing or unclear"),
    ("0.2-0.5", "weak match: the image is only loosely related to the challenge"),
    ("0.0-0.2", "no match: the image does not show what the challenge asks for"),
];

/// Build the user prompt for one challenge description.
pub fn challenge_prompt(challenge_description: &str) -> String {
    let bands = CONFIDENCE_BANDS
        .iter()
        .map(|(range, meaning)| format!("- {range}: {meaning}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this image and decide whether it satisfies the following challenge:\n\
         \"{challenge}\"\n\n\
         Please:\n\
         1. Describe what you see in the image\n\
         2. Compare it with what the challenge asks for\n\
         3. Give a confidence score from 0.0 to 1.0 that the image satisfies the challenge\n\
         4. Justify your score\n\n\
         Use these confidence bands:\n{bands}\n\n\
         Answer ONLY with JSON in exactly this shape:\n\
         {{\"confidence\": 0.85, \"analysis\": \"your detailed analysis here\"}}",
        challenge = challenge_description.trim(),
    )
}
