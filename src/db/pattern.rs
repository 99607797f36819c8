/// Translate a shell-style glob (`*` and `?` wildcards) into a SQL LIKE
/// pattern. All title matching in the repository goes through this one
/// translation.
pub fn glob_to_like(glob: &str) -> String {
    glob.replace('*', "%").replace('?', "_")
}

#[cfg(test)]
mod tests {
    use super::glob_to_like;

    #[test]
    fn star_becomes_percent() {
        assert_eq!(glob_to_like("*Retro*"), "%Retro%");
        assert_eq!(glob_to_like("*"), "%");
    }

    #[test]
    fn question_mark_becomes_underscore() {
        assert_eq!(glob_to_like("Z?0"), "Z_0");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(glob_to_like("Nixie Clock"), "Nixie Clock");
        assert_eq!(glob_to_like(""), "");
    }

    #[test]
    fn mixed_wildcards_translate_together() {
        assert_eq!(glob_to_like("*Z?0 Project*"), "%Z_0 Project%");
    }
}
