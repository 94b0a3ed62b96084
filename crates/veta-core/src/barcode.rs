//! # Scale Barcode Decoder
//!
//! Decodes the fixed-width numeric barcode printed by the weighing scale.
//!
//! ## Wire Format (bit-exact)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  18 ASCII digit characters:                                             │
//! │                                                                         │
//! │   index:  0   1 ─── 6   7 ──── 11   12 ─── 16   17                     │
//! │          ┌─┐ ┌───────┐ ┌─────────┐ ┌─────────┐ ┌─┐                     │
//! │          │0│ │PPPPPP │ │ WWWWW   │ │ TTTTT   │ │C│                     │
//! │          └─┘ └───────┘ └─────────┘ └─────────┘ └─┘                     │
//! │         flag  product    weight      total    check                    │
//! │               code       (grams)    (whole Bs) digit                   │
//! │                                                                         │
//! │  "0" + "000123" + "01500" + "00075" + "0"                              │
//! │        → product "000123", 1.500 kg, Bs 75                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Anything that is not exactly 18 digits with a leading `'0'` flag is NOT a
//! scale code — the caller falls back to standard catalog barcode lookup.
//! That is a normal outcome, not an error, hence `Option` rather than `Result`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::SCALE_BARCODE_LEN;

// =============================================================================
// Scale Reading
// =============================================================================

/// Ephemeral value decoded from one scale barcode scan.
///
/// Consumed once by the reservation flow; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScaleReading {
    /// 6-digit product code as the literal string from the label.
    ///
    /// Leading zeros are significant: `"000123"` must never be collapsed to
    /// `123` or it will no longer match the catalog's scale codes.
    pub product_code: String,

    /// Weight in kilograms, 3-decimal precision (label carries grams).
    #[ts(as = "String")]
    pub weight_kg: Decimal,

    /// Total price for the package in whole Bolivianos.
    pub total_price: Money,

    /// Check digit from byte 17. Decoded but NOT validated: the legacy scales
    /// never published their checksum algorithm and the source system never
    /// verified it. Kept so a future algorithm can be wired in.
    pub check_digit: u8,

    /// The raw 18-character barcode as scanned.
    pub raw: String,
}

// =============================================================================
// Decoder
// =============================================================================

/// Decodes a scanned barcode as a scale label, if it is one.
///
/// ## Acceptance
/// Input is a scale code iff it is exactly 18 characters, all decimal digits,
/// and the first digit is `'0'` (the scale flag). Everything else returns
/// `None` and the caller treats the input as a standard catalog barcode.
///
/// ## Properties
/// Total, deterministic, and pure: for every valid input,
/// `weight_kg == grams / 1000` and `total_price == the 5-digit Bs field`.
///
/// ## Example
/// ```rust
/// use veta_core::barcode::decode_scale_barcode;
/// use veta_core::money::Money;
/// use rust_decimal_macros::dec;
///
/// let reading = decode_scale_barcode("000012301500000750").unwrap();
/// assert_eq!(reading.product_code, "000123");
/// assert_eq!(reading.weight_kg, dec!(1.500));
/// assert_eq!(reading.total_price, Money::from_bs(75));
///
/// assert!(decode_scale_barcode("7791234567890").is_none()); // EAN-13
/// ```
pub fn decode_scale_barcode(barcode: &str) -> Option<ScaleReading> {
    let bytes = barcode.as_bytes();

    if bytes.len() != SCALE_BARCODE_LEN {
        return None;
    }
    if !bytes.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Scale flag digit
    if bytes[0] != b'0' {
        return None;
    }

    // All-digit slices of a digit-checked string; parses cannot fail.
    let product_code = barcode[1..7].to_string();
    let grams: i64 = barcode[7..12].parse().ok()?;
    let total_bs: i64 = barcode[12..17].parse().ok()?;
    let check_digit = bytes[17] - b'0';

    Some(ScaleReading {
        product_code,
        weight_kg: Decimal::new(grams, 3),
        total_price: Money::from_bs(total_bs),
        check_digit,
        raw: barcode.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_valid_label() {
        // "0" + "000123" + "01500" + "00075" + "0"
        let reading = decode_scale_barcode("000012301500000750").unwrap();
        assert_eq!(reading.product_code, "000123");
        assert_eq!(reading.weight_kg, dec!(1.500));
        assert_eq!(reading.total_price, Money::from_bs(75));
        assert_eq!(reading.check_digit, 0);
        assert_eq!(reading.raw, "000012301500000750");
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let reading = decode_scale_barcode("000000700250000421").unwrap();
        assert_eq!(reading.product_code, "000007");
        assert_eq!(reading.weight_kg, dec!(0.250));
        assert_eq!(reading.total_price, Money::from_bs(42));
    }

    #[test]
    fn test_gram_precision() {
        // "0" + "999999" + "00001" + "00001" + "1"
        let reading = decode_scale_barcode("099999900001000011").unwrap();
        assert_eq!(reading.weight_kg, dec!(0.001));
        assert_eq!(reading.total_price, Money::from_bs(1));
    }

    #[test]
    fn test_wrong_length_is_not_scale_code() {
        assert!(decode_scale_barcode("").is_none());
        assert!(decode_scale_barcode("0123").is_none());
        assert!(decode_scale_barcode("7791234567890").is_none()); // EAN-13
        assert!(decode_scale_barcode("0000123015000007501").is_none()); // 19
    }

    #[test]
    fn test_non_digit_is_not_scale_code() {
        assert!(decode_scale_barcode("00001230150000075X").is_none());
        assert!(decode_scale_barcode("ABCDEFGHIJKLMNOPQR").is_none());
        // Unicode digit lookalikes must not slip through the byte check
        assert!(decode_scale_barcode("٠0001230150000075٠").is_none());
    }

    #[test]
    fn test_wrong_flag_is_not_scale_code() {
        // Right length and digits, but flag is '1'
        assert!(decode_scale_barcode("100012301500000750").is_none());
    }

    #[test]
    fn test_check_digit_decoded_not_validated() {
        // Same payload, different check digits: both decode identically
        let a = decode_scale_barcode("000012301500000750").unwrap();
        let b = decode_scale_barcode("000012301500000759").unwrap();
        assert_eq!(a.product_code, b.product_code);
        assert_eq!(a.weight_kg, b.weight_kg);
        assert_eq!(a.total_price, b.total_price);
        assert_eq!(b.check_digit, 9);
    }

    #[test]
    fn test_deterministic() {
        let once = decode_scale_barcode("000012301500000750");
        let twice = decode_scale_barcode("000012301500000750");
        assert_eq!(once, twice);
    }
}
