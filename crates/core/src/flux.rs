/// Decimal places kept in the scientific mantissa of a flux value.
pub const FLUX_DECIMALS: usize = 6;

/// Rounds a flux to [`FLUX_DECIMALS`] decimals of its scientific mantissa.
///
/// Flux tallies are sums of partial tallies from every worker, and the order
/// of that sum depends on the worker count. Rounding before the flux enters
/// a matrix removes those last-bit differences, so runs on different worker
/// counts build bit-identical matrices. The rounding goes through the exact
/// decimal expansion, which makes it idempotent.
///
/// Zero, negative, and non-finite values are returned unchanged; the matrix
/// builder rejects the latter two.
#[must_use]
pub fn truncate_flux(flux: f64) -> f64 {
    if flux <= 0.0 || !flux.is_finite() {
        return flux;
    }
    format!("{flux:.prec$e}", prec = FLUX_DECIMALS)
        .parse()
        .unwrap_or(flux)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn keeps_seven_significant_digits() {
        assert_eq!(truncate_flux(1.234_567_891e14), 1.234_568e14);
        assert_eq!(truncate_flux(9.999_999_6e13), 1.0e14);
        assert_eq!(truncate_flux(0.0), 0.0);
    }

    #[test]
    fn idempotent_at_the_sixth_decimal_boundary() {
        let values = [
            1.000_000_5e14,
            2.345_678_5e12,
            9.999_999_5e13,
            1.0e-3,
            7.777_777e10,
            1.000_000_499_999e14,
        ];
        for value in values {
            let once = truncate_flux(value);
            let twice = truncate_flux(once);
            assert_eq!(once.to_bits(), twice.to_bits(), "value {value:e}");
        }
    }

    #[test]
    fn hides_summation_order() {
        let parts = [3.1e13, 2.7e13, 1.9e13, 4.4e13];
        let forward: f64 = parts.iter().sum();
        let backward: f64 = parts.iter().rev().sum();
        assert_eq!(
            truncate_flux(forward).to_bits(),
            truncate_flux(backward).to_bits()
        );
    }

    proptest! {
        #[test]
        fn truncation_is_idempotent(mantissa in 1.0f64..10.0, exponent in -5i32..20) {
            let value = mantissa * 10f64.powi(exponent);
            let once = truncate_flux(value);
            prop_assert_eq!(once.to_bits(), truncate_flux(once).to_bits());
        }

        #[test]
        fn truncation_error_is_below_half_a_unit(mantissa in 1.0f64..10.0, exponent in 0i32..18) {
            let value = mantissa * 10f64.powi(exponent);
            let rel = (truncate_flux(value) - value).abs() / value;
            prop_assert!(rel <= 5.0e-7 + 1e-15);
        }
    }
}
