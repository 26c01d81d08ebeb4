//! # Analysis Prompts
//!
//! Default prompt templates sent to the analysis service. The CLI allows both to
//! be overridden from configuration.

/// The system prompt for article analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You analyse news articles for a Singapore news map. Respond ONLY with a valid JSON object, with no explanation, no markdown and no extra text.";

/// The user prompt for article analysis.
///
/// Placeholders: `{title}`, `{content}`
pub const ANALYSIS_USER_PROMPT: &str = r#"Given the following news article, respond with a JSON object with these fields:
- is_sg_related: true if the article is about Singapore, false otherwise
- place: the best Singapore place, building or office to put a map marker for this article (be specific, e.g. 'Changi Airport', 'Orchard Towers', 'Google Asia Pacific')
- sentiment: positive, negative, or neutral
- reason: a short reason for the sentiment
- emoji: a single emoji that best represents the sentiment

News title: {title}
News content: {content}"#;

/// Fills the user prompt template with an article's title and content.
/// Substitution is a single pass; placeholders inside the inserted text stay
/// literal.
pub fn render_user_prompt(template: &str, title: &str, content: &str) -> String {
    let mut rendered = String::with_capacity(template.len() + title.len() + content.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{title}") {
            rendered.push_str(title);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{content}") {
            rendered.push_str(content);
            rest = after;
        } else {
            rendered.push('{');
            rest = &tail[1..];
        }
    }
    rendered.push_str(rest);
    rendered
}
