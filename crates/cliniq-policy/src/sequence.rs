//! Per-cabinet invoice number allocation.
//!
//! Numbers are sequential within one cabinet (`F-0001`, `F-0002`, ...)
//! and allocated optimistically: seed from the most recently created
//! invoice, then probe candidates until one is free. Concurrent
//! allocations may skip numbers; gaps are accepted, duplicates are not.
//! The storage layer's unique `(cabinet_id, number)` index backstops
//! whatever race the probe window leaves open.

use chrono::Utc;
use cliniq_core::error::CliniqResult;
use cliniq_core::repository::InvoiceRepository;
use uuid::Uuid;

/// Prefix carried by every generated number.
pub const NUMBER_PREFIX: &str = "F";

/// Probe attempts before falling back to a timestamp-derived number.
const MAX_ATTEMPTS: u32 = 3;

pub struct SequenceGenerator;

impl SequenceGenerator {
    /// Allocate the next invoice number for a cabinet.
    ///
    /// Exhausted candidates never surface as an error: after the retry
    /// budget the number degrades to `F-<unix-millis>` and allocation
    /// still succeeds.
    pub async fn next_invoice_number<R: InvoiceRepository>(
        invoices: &R,
        cabinet_id: Uuid,
    ) -> CliniqResult<String> {
        let seed = match invoices.last_created(cabinet_id).await? {
            Some(invoice) => parse_suffix(&invoice.number).unwrap_or(0),
            None => 0,
        };

        for attempt in 0..MAX_ATTEMPTS {
            let candidate = format_number(seed + 1 + u64::from(attempt));
            if invoices
                .get_by_number(cabinet_id, &candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
        }

        let fallback = format!("{NUMBER_PREFIX}-{}", Utc::now().timestamp_millis());
        tracing::warn!(
            cabinet_id = %cabinet_id,
            fallback = %fallback,
            "invoice number allocation exhausted its retries, using timestamp fallback"
        );
        Ok(fallback)
    }
}

/// Trailing numeric suffix of an invoice number, if it has one.
fn parse_suffix(number: &str) -> Option<u64> {
    number.rsplit('-').next()?.parse().ok()
}

fn format_number(n: u64) -> String {
    format!("{NUMBER_PREFIX}-{n:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_four_digit_padding() {
        assert_eq!(format_number(1), "F-0001");
        assert_eq!(format_number(42), "F-0042");
        assert_eq!(format_number(12345), "F-12345");
    }

    #[test]
    fn parses_the_trailing_suffix() {
        assert_eq!(parse_suffix("F-0007"), Some(7));
        assert_eq!(parse_suffix("F-12345"), Some(12345));
        // Timestamp fallbacks keep the sequence going from a large seed.
        assert_eq!(parse_suffix("F-1724601600000"), Some(1_724_601_600_000));
    }

    #[test]
    fn malformed_numbers_reset_the_seed() {
        assert_eq!(parse_suffix("INV"), None);
        assert_eq!(parse_suffix("F-"), None);
        assert_eq!(parse_suffix("F-00A7"), None);
    }
}
