/// Truncate a string to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn shorter_strings_pass_through() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn longer_strings_are_capped() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn multibyte_boundaries_are_respected() {
        assert_eq!(truncate_chars("héllo wörld", 6), "héllo ");
        assert_eq!(truncate_chars("日本語のテキスト", 3), "日本語");
    }
}
