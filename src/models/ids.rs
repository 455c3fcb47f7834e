//! Document identifiers.
//!
//! Free-standing documents get random v4 ids. Documents that must be unique
//! per (user, class) pair get a v5 id derived from the pair, so creating them
//! twice collides on the same key.
use uuid::Uuid;

const NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_4c2a_8b3e_4f07_a9d5_2c61_e0b8_7f34);

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn pair_id(kind: &str, owner: &str, target: &str) -> String {
    let name = format!("{}\u{1f}{}\u{1f}{}", kind, owner, target);
    Uuid::new_v5(&NAMESPACE, name.as_bytes()).to_string()
}

pub fn is_valid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_id_is_stable_and_distinct() {
        let a = pair_id("inscripcion", "user-1", "Telemetría");
        let b = pair_id("inscripcion", "user-1", "Telemetría");
        let c = pair_id("inscripcion", "user-2", "Telemetría");
        let d = pair_id("tiempo", "user-1", "Telemetría");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(is_valid(&a));
    }

    #[test]
    fn test_pair_id_separator_prevents_ambiguity() {
        assert_ne!(pair_id("k", "ab", "c"), pair_id("k", "a", "bc"));
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(&new_id()));
        assert!(!is_valid("64f0c2a1e4b0"));
        assert!(!is_valid(""));
    }
}
