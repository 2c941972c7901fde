use tracing::warn;

/// Sanitizes user input before it is stored or embedded in a prompt.
///
/// Drops control characters below 0x20 (NUL included) except tab, LF and CR,
/// collapses all whitespace runs (newlines included) to single spaces, and
/// truncates to `max_length` characters with trailing whitespace trimmed.
///
/// Idempotent: `sanitize_input(sanitize_input(x, n), n) == sanitize_input(x, n)`.
pub fn sanitize_input(text: &str, max_length: Option<usize>) -> String {
    if text.is_empty() {
        return String::new();
    }

    let filtered: String = text
        .chars()
        .filter(|&c| c as u32 >= 32 || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    let mut cleaned = filtered.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(max) = max_length {
        if cleaned.chars().count() > max {
            cleaned = cleaned
                .chars()
                .take(max)
                .collect::<String>()
                .trim_end()
                .to_string();
            warn!("Input truncated to {max} characters");
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_control_characters() {
        let out = sanitize_input("hello\u{0}world\u{1}\u{8}!", None);
        assert_eq!(out, "helloworld!");
        assert!(out
            .chars()
            .all(|c| c as u32 >= 32 || matches!(c, '\t' | '\n' | '\r')));
    }

    #[test]
    fn test_collapses_whitespace_runs() {
        assert_eq!(
            sanitize_input("what   is\n\nyour\t\texperience ?", None),
            "what is your experience ?"
        );
    }

    #[test]
    fn test_truncates_and_trims_trailing_whitespace() {
        let out = sanitize_input("abcd efgh", Some(5));
        assert_eq!(out, "abcd");
        assert!(out.chars().count() <= 5);
    }

    #[test]
    fn test_respects_max_length_for_any_input() {
        let long = "x".repeat(2000);
        assert!(sanitize_input(&long, Some(500)).chars().count() <= 500);
    }

    #[test]
    fn test_empty_input_yields_empty_string() {
        assert_eq!(sanitize_input("", Some(100)), "");
        assert_eq!(sanitize_input("   \n\t  ", None), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "plain question",
            "  spaced \u{0} out \n\n question  ",
            "x y z",
        ];
        for input in inputs {
            let once = sanitize_input(input, Some(50));
            let twice = sanitize_input(&once, Some(50));
            assert_eq!(once, twice, "sanitize not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_idempotent_after_truncation() {
        let input = "word ".repeat(200);
        let once = sanitize_input(&input, Some(123));
        assert_eq!(sanitize_input(&once, Some(123)), once);
    }
}
