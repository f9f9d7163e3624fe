use rand::Rng;

/// Join-code alphabet: upper-case letters and digits without `I`, `O`, `0`, `1`.
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LENGTH: usize = 8;

/// Generate a random 8-character room code.
#[must_use]
pub fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| char::from(ROOM_CODE_CHARS[rng.gen_range(0..ROOM_CODE_CHARS.len())]))
        .collect()
}

/// Check length and alphabet, ignoring case.
#[must_use]
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .bytes()
            .all(|b| ROOM_CODE_CHARS.contains(&b.to_ascii_uppercase()))
}

/// Normalize a user-entered code (trimmed, upper case).
#[must_use]
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_valid() {
        for _ in 0..200 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(is_valid_room_code(&code));
        }
    }

    #[test]
    fn test_collisions_are_rare() {
        let codes: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_room_code()).collect();
        assert!(codes.len() > 995);
    }

    #[test]
    fn test_is_valid_room_code() {
        assert!(is_valid_room_code("ABCD2345"));
        assert!(is_valid_room_code("abcd2345"));
        assert!(!is_valid_room_code("ABCD234"));
        assert!(!is_valid_room_code("ABCD23450"));
        assert!(!is_valid_room_code("ABCDO123"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_room_code("  abcd2345 "), "ABCD2345");
    }
}
