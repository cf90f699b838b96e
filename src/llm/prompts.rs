/// Longest word count a dashboard summary may have
pub const SUMMARY_MAX_WORDS: usize = 100;

/// Prompt asking for a short prose description of one dashboard match.
///
/// `metadata_json` is the flattened unit; `title` is the dashboard title,
/// which the model should treat as the dashboard's name.
pub fn summary_prompt(metadata_json: &str, title: Option<&str>) -> String {
    let name_hint = match title {
        Some(title) if !title.trim().is_empty() => {
            format!("The dashboard is called \"{}\".", title.trim())
        }
        _ => "The dashboard title is the first title field in the metadata.".to_string(),
    };

    format!(
        r#"{metadata}

Summarize the dashboard described by the metadata above as a prose description of the dashboard's intent, in {max} words or less. {name_hint}
Write plain prose: no lists, no headings, no preamble.

Summary:"#,
        metadata = truncate_for_llm(metadata_json),
        max = SUMMARY_MAX_WORDS,
        name_hint = name_hint,
    )
}

/// Truncate metadata to fit within small-model context limits
fn truncate_for_llm(text: &str) -> &str {
    const MAX_CHARS: usize = 8_000;
    match text.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
