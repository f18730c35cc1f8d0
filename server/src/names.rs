//! Display name rules.

use shared::{ClientId, PlayerRecord, NAME_MAX_LEN, NAME_MIN_LEN};

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | ',' | '!' | '?' | '\'' | '-')
}

/// Returns the trimmed name if it is an acceptable display name.
///
/// A missing name, a trimmed length outside the allowed range, or any
/// character outside letters, digits, space and `. , ! ? ' -` is rejected.
pub fn validate(name: Option<&str>) -> Option<String> {
    let trimmed = name?.trim();
    let len = trimmed.chars().count();

    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return None;
    }
    if !trimmed.chars().all(is_allowed_char) {
        return None;
    }

    Some(trimmed.to_string())
}

/// Case-insensitive check of `name` against every live player except `exclude`.
pub fn is_taken<'a, I>(players: I, name: &str, exclude: Option<ClientId>) -> bool
where
    I: IntoIterator<Item = &'a PlayerRecord>,
{
    let wanted = name.to_lowercase();
    players
        .into_iter()
        .filter(|player| Some(player.id) != exclude)
        .any(|player| player.name.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Vec3, PALETTE};

    fn player(id: ClientId, name: &str) -> PlayerRecord {
        PlayerRecord::new(id, name.to_string(), Vec3::default(), PALETTE[0])
    }

    #[test]
    fn test_validate_accepts_allowed_names() {
        assert_eq!(validate(Some("Bob")), Some("Bob".to_string()));
        assert_eq!(validate(Some("Mr. O'Neil-2, hi!?")), Some("Mr. O'Neil-2, hi!?".to_string()));
        assert_eq!(validate(Some("abcdefghijklmnopqrst")), Some("abcdefghijklmnopqrst".to_string()));
    }

    #[test]
    fn test_validate_trims_before_checking() {
        assert_eq!(validate(Some("   Alice  ")), Some("Alice".to_string()));
        assert_eq!(validate(Some("  ab  ")), None);
    }

    #[test]
    fn test_validate_rejects_bad_lengths() {
        assert_eq!(validate(None), None);
        assert_eq!(validate(Some("")), None);
        assert_eq!(validate(Some("ab")), None);
        assert_eq!(validate(Some("abcdefghijklmnopqrstu")), None);
    }

    #[test]
    fn test_validate_rejects_bad_characters() {
        for name in ["bob_1", "<script>", "tab\tname", "emoji😀", "semi;colon", "Zoë"] {
            assert_eq!(validate(Some(name)), None, "{:?} should be rejected", name);
        }
    }

    #[test]
    fn test_validate_accepts_exactly_the_allowed_charset() {
        for c in (0u8..=127).map(char::from) {
            let name = format!("ab{}c", c);
            let expected = c.is_ascii_alphanumeric() || " .,!?'-".contains(c);
            assert_eq!(validate(Some(name.as_str())).is_some(), expected, "char {:?}", c);
        }
    }

    #[test]
    fn test_is_taken_is_case_insensitive() {
        let players = vec![player(1, "bob"), player(2, "Alice")];
        assert!(is_taken(&players, "Bob", None));
        assert!(is_taken(&players, "ALICE", None));
        assert!(!is_taken(&players, "Carol", None));
    }

    #[test]
    fn test_is_taken_excludes_self() {
        let players = vec![player(1, "bob"), player(2, "Alice")];
        assert!(!is_taken(&players, "BOB", Some(1)));
        assert!(is_taken(&players, "BOB", Some(2)));
    }
}
