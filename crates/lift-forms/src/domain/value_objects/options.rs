//! Option list helpers for choice fields

/// Split free-text option input: one option per line, trimmed, blanks dropped.
pub fn parse_options_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Inverse of [`parse_options_text`] for pre-populating the edit surface.
pub fn options_to_text(options: &[String]) -> String {
    options.join("\n")
}

/// Trim and drop blank entries from an already split list.
pub fn clean_options<I, S>(options: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    options
        .into_iter()
        .map(|o| o.as_ref().trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_dropped() {
        assert_eq!(parse_options_text("A\n\nB"), vec!["A", "B"]);
        assert_eq!(parse_options_text("  Red \r\n  \n Blue"), vec!["Red", "Blue"]);
    }

    #[test]
    fn test_all_blank() {
        assert!(parse_options_text("\n  \n").is_empty());
        assert!(clean_options(["", " "]).is_empty());
    }
}
