//! Receipt identifiers.
//!
//! Identifiers are 16 bytes from the operating system's secure random source
//! rendered as `8-4-4-4-12` lowercase hex. The bytes are used verbatim, so the
//! result is UUID-shaped without claiming a UUID version.

use crate::metrics::METRICS;
use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Uuid;

/// Generates a fresh receipt identifier.
///
/// Never fails: if the secure source is unavailable the identifier falls back
/// to the current time in nanoseconds, which can collide under rapid calls.
pub fn new_id() -> String {
    id_from_rng(&mut OsRng)
}

/// Draws an identifier from `rng`, falling back to a timestamp when the
/// generator reports an error.
pub fn id_from_rng<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => format_id(bytes),
        Err(error) => {
            tracing::warn!(%error, "secure random source failed, using timestamp identifier");
            METRICS.record_id_fallback();
            timestamp_id()
        }
    }
}

/// Formats raw bytes as a hyphenated lowercase hex identifier.
pub fn format_id(bytes: [u8; 16]) -> String {
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

fn timestamp_id() -> String {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos.to_string())
        .unwrap_or_else(|| format!("{}{:09}", now.timestamp(), now.timestamp_subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::collections::HashSet;

    static ID_SHAPE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
    });

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    #[test]
    fn new_id_has_canonical_shape() {
        let id = new_id();
        assert!(ID_SHAPE.is_match(&id), "unexpected id shape: {id}");
    }

    #[test]
    fn format_id_keeps_bytes_verbatim() {
        let bytes = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        assert_eq!(format_id(bytes), "00112233-4455-6677-8899-aabbccddeeff");
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn failing_rng_falls_back_to_timestamp() {
        let id = id_from_rng(&mut FailingRng);
        assert!(!id.is_empty());
        assert!(id.bytes().all(|b| b.is_ascii_digit()), "unexpected fallback id: {id}");
    }
}
