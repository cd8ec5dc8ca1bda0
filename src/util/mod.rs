pub mod fetcher;
pub mod parser;
pub mod poster;

/// Cuts `input` to at most `max` characters, marking the cut with `...`.
pub fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }

    let kept: String = input.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
