use shared::domain::ChatTurn;

pub fn render_history(transcript: &[ChatTurn]) -> String {
    transcript
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn converse_prompt(transcript: &[ChatTurn]) -> String {
    format!(
        "You are an AI map assistant, an oracle of surreal and mystical places. \
Based on the conversation history, decide if the user wants to chat, or if they are asking for a new location.\n\
- If they want to chat, answer with kind \"chat\" and put your reply in \"text\".\n\
- If they want a new location (or you are suggesting one), answer with kind \"location\", \
the place \"name\", its \"coords\" as [latitude, longitude], and a brief, esoteric \"intro\" \
that will be shown in the chat.\n\n\
Conversation History:\n{}",
        render_history(transcript)
    )
}

pub fn suggest_prompt(excluded: &[String]) -> String {
    let mut prompt = String::from(
        "Suggest a real-world surreal or mystical location not from the standard well-known lists. \
Answer with its \"name\", its \"coords\" as [latitude, longitude], and a brief, esoteric \"intro\".",
    );
    if !excluded.is_empty() {
        prompt.push_str("\nDo not suggest any of these: ");
        prompt.push_str(&excluded.join(", "));
        prompt.push('.');
    }
    prompt
}
