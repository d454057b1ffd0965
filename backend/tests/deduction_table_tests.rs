//! Quality deduction table tests
//!
//! Threshold bands from the bundled table:
//! - Moisture > 17% → 2% of gross, 16–17% → 1%
//! - Foreign matter > 2% → 1%
//! - Damage/discolor > 8% → 2%, 7–8% → 1%, 6–7% → 0.5%

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{Commodity, OrderSide, QualityDeductionTable};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn table() -> QualityDeductionTable {
    QualityDeductionTable::bundled().unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_moisture_bands() {
        let table = table();
        let gross = dec("25000");
        let lookup = |v: &str| table.lookup_deduction(Commodity::Paddy, "moisture", dec(v), gross);

        assert_eq!(lookup("18"), dec("500.00"));
        assert_eq!(lookup("17"), dec("250.00"));
        assert_eq!(lookup("16.5"), dec("250.00"));
        assert_eq!(lookup("16"), dec("250.00"));
        assert_eq!(lookup("15.9"), Decimal::ZERO);
    }

    #[test]
    fn test_foreign_matter_band() {
        let table = table();
        let gross = dec("10000");
        assert_eq!(
            table.lookup_deduction(Commodity::Wheat, "foreign_matter", dec("2.5"), gross),
            dec("100.00")
        );
        assert_eq!(
            table.lookup_deduction(Commodity::Wheat, "foreign_matter", dec("2"), gross),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_damage_discolor_bands() {
        let table = table();
        let gross = dec("10000");
        let lookup = |v: &str| table.lookup_deduction(Commodity::Maize, "damage_discolor", dec(v), gross);

        assert_eq!(lookup("9"), dec("200.00"));
        assert_eq!(lookup("7.5"), dec("100.00"));
        assert_eq!(lookup("6.5"), dec("50.00"));
        assert_eq!(lookup("6"), dec("50.00"));
        assert_eq!(lookup("5.99"), Decimal::ZERO);
    }

    #[test]
    fn test_parameter_aliases() {
        let table = table();
        let gross = dec("10000");
        assert_eq!(
            table.lookup_deduction(Commodity::Paddy, "MOI", dec("18"), gross),
            dec("200.00")
        );
        assert_eq!(
            table.lookup_deduction(Commodity::Paddy, "Damage-Discolor", dec("9"), gross),
            table.lookup_deduction(Commodity::Paddy, "damage_discolor", dec("9"), gross)
        );
    }

    #[test]
    fn test_unknown_parameter_is_zero() {
        let table = table();
        assert_eq!(
            table.lookup_deduction(Commodity::Wheat, "aflatoxin", dec("50"), dec("10000")),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_side_specific_rule_wins() {
        let json = r#"{"rules":[
            {"commodity":"wheat","parameter":"moisture","bands":[{"above":"14","percent_of_gross":"1"}]},
            {"commodity":"wheat","side":"sale","parameter":"moisture","bands":[{"above":"14","percent_of_gross":"3"}]}
        ]}"#;
        let table = QualityDeductionTable::from_json(json).unwrap();
        let gross = dec("1000");

        assert_eq!(
            table.lookup_deduction_for(OrderSide::Sale, Commodity::Wheat, "moisture", dec("15"), gross),
            dec("30.00")
        );
        assert_eq!(
            table.lookup_deduction_for(OrderSide::Purchase, Commodity::Wheat, "moisture", dec("15"), gross),
            dec("10.00")
        );
        assert_eq!(
            table.lookup_deduction(Commodity::Wheat, "moisture", dec("15"), gross),
            dec("10.00")
        );
    }

    #[test]
    fn test_negative_percent_rejected() {
        let json = r#"{"rules":[
            {"commodity":"maize","parameter":"moisture","bands":[{"above":"14","percent_of_gross":"-1"}]}
        ]}"#;
        assert!(QualityDeductionTable::from_json(json).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn percent_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=300i64).prop_map(|n| Decimal::new(n, 1)) // 0.0% to 30.0%
    }

    fn gross_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn commodity_strategy() -> impl Strategy<Value = Commodity> {
        prop_oneof![
            Just(Commodity::Paddy),
            Just(Commodity::Wheat),
            Just(Commodity::Maize)
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Suggestions are between zero and the largest band (2% of gross)
        #[test]
        fn prop_suggestion_bounded(
            commodity in commodity_strategy(),
            value in percent_strategy(),
            gross in gross_strategy()
        ) {
            let table = table();
            for parameter in ["moisture", "foreign_matter", "damage_discolor"] {
                let amount = table.lookup_deduction(commodity, parameter, value, gross);
                prop_assert!(amount >= Decimal::ZERO);
                prop_assert!(amount <= gross * dec("0.02") + dec("0.01"));
            }
        }

        /// Hectolitre weight is charged only under the configured floor, and
        /// a lighter grain never draws a smaller suggestion
        #[test]
        fn prop_hlw_floor(
            a in (600i64..=850i64).prop_map(|n| Decimal::new(n, 1)),
            b in (600i64..=850i64).prop_map(|n| Decimal::new(n, 1)),
            gross in gross_strategy()
        ) {
            let table = QualityDeductionTable::from_json(
                r#"{"rules": [{"commodity": "wheat", "parameter": "hlw", "bands": [
                    {"below": "75", "inclusive": true, "percent_of_gross": "1"},
                    {"below": "72", "percent_of_gross": "2"}
                ]}]}"#,
            ).unwrap();
            let hlw = |v| table.lookup_deduction(Commodity::Wheat, "hlw", v, gross);
            let (light, heavy) = if a <= b { (a, b) } else { (b, a) };

            prop_assert!(hlw(light) >= hlw(heavy));
            if heavy > dec("75") {
                prop_assert_eq!(hlw(heavy), Decimal::ZERO);
            }
        }

        /// A higher reading never yields a smaller suggestion
        #[test]
        fn prop_suggestion_monotonic(
            commodity in commodity_strategy(),
            a in percent_strategy(),
            b in percent_strategy(),
            gross in gross_strategy()
        ) {
            let table = table();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            for parameter in ["moisture", "foreign_matter", "damage_discolor"] {
                prop_assert!(
                    table.lookup_deduction(commodity, parameter, low, gross)
                        <= table.lookup_deduction(commodity, parameter, high, gross)
                );
            }
        }
    }
}
