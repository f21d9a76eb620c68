use chrono::NaiveDateTime;
use shutterlink_types::rand::{self, Rng};

/// Length of a generated access code.
pub const ACCESS_CODE_LEN: usize = 24;

const ACCESS_CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("gallery is not active")]
    Inactive,
    #[error("gallery expired at {expired_at}")]
    Expired { expired_at: NaiveDateTime },
}

/// Decides whether a resolved gallery may be shown to a client at `now`.
///
/// A gallery stays open up to and including its expiry instant.
pub fn check_access(
    is_active: bool,
    expires_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<(), AccessDenied> {
    if !is_active {
        return Err(AccessDenied::Inactive);
    }
    if let Some(expired_at) = expires_at
        && now > expired_at
    {
        return Err(AccessDenied::Expired { expired_at });
    }
    Ok(())
}

/// Draws a fresh unguessable access code from the thread-local CSPRNG.
pub fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| {
            let index = rng.random_range(0..ACCESS_CODE_ALPHABET.len());
            ACCESS_CODE_ALPHABET[index] as char
        })
        .collect()
}

/// Cheap pre-check so obviously bogus codes never reach the database.
///
/// Accepts any lowercase alphanumeric code between 8 and 64 characters so
/// shorter codes issued by older deployments keep resolving.
pub fn is_well_formed_code(code: &str) -> bool {
    (8..=64).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn open_without_expiry() {
        assert_eq!(check_access(true, None, at(12)), Ok(()));
    }

    #[test]
    fn expiry_is_inclusive() {
        assert_eq!(check_access(true, Some(at(12)), at(12)), Ok(()));
        assert_eq!(
            check_access(true, Some(at(12)), at(12) + Duration::seconds(1)),
            Err(AccessDenied::Expired { expired_at: at(12) })
        );
    }

    #[test]
    fn inactive_wins_over_expired() {
        assert_eq!(
            check_access(false, Some(at(1)), at(12)),
            Err(AccessDenied::Inactive)
        );
    }

    #[test]
    fn generated_codes_are_well_formed_and_distinct() {
        let a = generate_access_code();
        let b = generate_access_code();
        assert_eq!(a.len(), ACCESS_CODE_LEN);
        assert!(is_well_formed_code(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_codes() {
        assert!(!is_well_formed_code("short"));
        assert!(!is_well_formed_code("UPPERCASE123"));
        assert!(!is_well_formed_code("has/slash/inside"));
        assert!(!is_well_formed_code(&"a".repeat(65)));
        assert!(is_well_formed_code("abc123def456"));
    }
}
