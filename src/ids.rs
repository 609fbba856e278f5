//! Public file identifier generation.
//!
//! Public ids are opaque tokens embedded in share links. Short ids keep the
//! links compact; owners can opt into long ids that are infeasible to guess
//! by enumeration. Uniqueness is enforced by the database, callers retry on
//! collision keeping the same length class.

use rand::Rng;

/// Alphabet for public ids, 64 symbols.
pub const ALPHABET: &[u8; 63] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Length of a short public id.
pub const SHORT_LEN: usize = 5;

/// Length of a long public id.
pub const LONG_LEN: usize = 50;

/// Generates a fresh public id of the requested length class.
pub fn generate(long: bool) -> String {
    let len = if long { LONG_LEN } else { SHORT_LEN };
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Length class of an existing id, so a collided id can be regenerated
/// within the same class.
pub fn is_long(id: &str) -> bool {
    id.len() >= LONG_LEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_id_has_expected_length() {
        assert_eq!(generate(false).len(), SHORT_LEN);
    }

    #[test]
    fn long_id_has_expected_length() {
        assert_eq!(generate(true).len(), LONG_LEN);
    }

    #[test]
    fn ids_use_only_the_alphabet() {
        let id = generate(true);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)), "unexpected symbol in {id}");
    }

    #[test]
    fn long_ids_are_distinct() {
        assert_ne!(generate(true), generate(true));
    }

    #[test]
    fn length_class_is_detected() {
        assert!(!is_long(&generate(false)));
        assert!(is_long(&generate(true)));
    }
}
