//! Weight reconciliation: net weight from weighbridge gross and tare

use rust_decimal::Decimal;

use crate::types::{coerce_optional_decimal, round_weight};

/// Derive the net weight in MT.
///
/// With both gross and tare supplied the net weight is `gross - tare`,
/// clamped at zero. Otherwise the directly entered net weight is used,
/// and a missing one counts as zero.
pub fn reconcile(
    gross: Option<Decimal>,
    tare: Option<Decimal>,
    manual_net: Option<Decimal>,
) -> Decimal {
    let net = match (gross, tare) {
        (Some(gross), Some(tare)) => gross
            .checked_sub(tare)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO),
        _ => manual_net.unwrap_or(Decimal::ZERO),
    };
    round_weight(net)
}

/// [`reconcile`] over raw form input. Non-numeric text counts as zero,
/// empty text as "not supplied".
pub fn reconcile_str(gross: &str, tare: &str, manual_net: &str) -> Decimal {
    reconcile(
        coerce_optional_decimal(gross),
        coerce_optional_decimal(tare),
        coerce_optional_decimal(manual_net),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_gross_minus_tare() {
        assert_eq!(reconcile(Some(dec("10.5")), Some(dec("0.5")), None), dec("10.0"));
    }

    #[test]
    fn test_tare_exceeding_gross_clamps_to_zero() {
        assert_eq!(reconcile(Some(dec("8")), Some(dec("9")), None), Decimal::ZERO);
    }

    #[test]
    fn test_derived_value_ignores_manual_entry() {
        assert_eq!(
            reconcile(Some(dec("12")), Some(dec("2")), Some(dec("99"))),
            dec("10")
        );
    }

    #[test]
    fn test_manual_net_when_tare_missing() {
        assert_eq!(reconcile(Some(dec("12")), None, Some(dec("11.25"))), dec("11.25"));
        assert_eq!(reconcile(None, None, Some(dec("4.2"))), dec("4.2"));
        assert_eq!(reconcile(None, Some(dec("1")), None), Decimal::ZERO);
    }

    #[test]
    fn test_weight_precision() {
        assert_eq!(
            reconcile(Some(dec("10.12345")), Some(dec("0.1")), None),
            dec("10.023")
        );
    }

    #[test]
    fn test_reconcile_str_coerces_garbage() {
        assert_eq!(reconcile_str("10.5", "0.5", ""), dec("10.0"));
        assert_eq!(reconcile_str("ten", "0.5", ""), Decimal::ZERO);
        assert_eq!(reconcile_str("", "0.5", "3"), dec("3"));
        assert_eq!(reconcile_str("", "", "n/a"), Decimal::ZERO);
    }
}
