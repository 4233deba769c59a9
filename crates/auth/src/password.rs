//! Password hashing and verification (bcrypt).
//!
//! Pure functions over their inputs; no IO, no clock.

use userman_core::AuthError;

// bcrypt does not export its cost bounds; these mirror the crate's own
// private MIN_COST/MAX_COST used by its range check.
const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Hash a password with the given bcrypt cost.
///
/// A cost outside bcrypt's valid range is clamped to the default cost rather
/// than rejected, so a misconfigured deployment degrades to a safe setting
/// instead of refusing every registration.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let cost = if (MIN_COST..=MAX_COST).contains(&cost) {
        cost
    } else {
        bcrypt::DEFAULT_COST
    };

    bcrypt::hash(password, cost).map_err(|_| AuthError::Hashing)
}

/// Compare a password against a stored hash.
///
/// Any structural problem with the hash is treated as a non-match, never
/// propagated: a corrupt row must read as "wrong password", not a crash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trip() {
        let hash = hash_password("Secret123!", MIN_COST).unwrap();
        assert!(verify_password("Secret123!", &hash));
        assert!(!verify_password("Secret123?", &hash));
    }

    #[test]
    fn out_of_range_cost_clamps_instead_of_failing() {
        // 0 and 99 are both outside bcrypt's valid range.
        assert!(hash_password("pw", 0).is_ok());
        assert!(hash_password("pw", 99).is_ok());
    }

    #[test]
    fn malformed_hash_is_a_non_match() {
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
        assert!(!verify_password("pw", ""));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn verify_accepts_own_hash_and_rejects_others(
            password in "[a-zA-Z0-9]{1,24}",
            other in "[a-zA-Z0-9]{1,24}",
        ) {
            let hash = hash_password(&password, MIN_COST).unwrap();
            prop_assert!(verify_password(&password, &hash));
            if other != password {
                prop_assert!(!verify_password(&other, &hash));
            }
        }
    }
}
