//! Linear transform turning an implementation quantity into a factor.
use crate::error::{FlowGraphError, Result};
use serde::{Deserialize, Serialize};

/// `value = a * quantity + b`.
///
/// Relative mode reads `value` as a multiplicative factor. Absolute mode reads it
/// as a delta on a reference amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub a: f64,
    pub b: f64,
    pub quantity: f64,
    pub is_absolute: bool,
}

impl Formula {
    pub fn relative(a: f64, b: f64, quantity: f64) -> Self {
        Self { a, b, quantity, is_absolute: false }
    }

    pub fn absolute(a: f64, b: f64, quantity: f64) -> Self {
        Self { a, b, quantity, is_absolute: true }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.a * self.quantity + self.b
    }

    /// Multiplicative factor applied to `reference`.
    pub fn factor(&self, reference: f64) -> Result<f64> {
        let value = self.value();
        let factor = if !self.is_absolute {
            value
        } else if reference == 0.0 {
            if value != 0.0 {
                return Err(FlowGraphError::invalid(format!(
                    "absolute change of {} on a zero reference amount",
                    value
                )));
            }
            1.0
        } else {
            (reference + value) / reference
        };

        if !factor.is_finite() || factor < 0.0 {
            return Err(FlowGraphError::invalid(format!("formula yields factor {}", factor)));
        }
        Ok(factor)
    }

    /// Signed change of `amount` when the part's factor is applied.
    pub fn delta(&self, amount: f64, reference: f64) -> Result<f64> {
        Ok(amount * (self.factor(reference)? - 1.0))
    }

    /// Fraction of each implementation flow moved onto a new flow.
    ///
    /// Relative mode moves `value` of the flow; absolute mode moves `value` in
    /// total, spread over the flows in proportion to their amounts.
    pub fn shift_fraction(&self, reference: f64) -> Result<f64> {
        if !self.is_absolute {
            return self.factor(reference);
        }
        let value = self.value();
        if reference == 0.0 {
            if value != 0.0 {
                return Err(FlowGraphError::invalid(format!(
                    "absolute shift of {} on a zero reference amount",
                    value
                )));
            }
            return Ok(0.0);
        }
        let fraction = value / reference;
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(FlowGraphError::invalid(format!("formula yields shift fraction {}", fraction)));
        }
        Ok(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Formula::relative(0.0, 2.0, 5.0), 10.0, 2.0)] // doubling, quantity ignored
    #[case(Formula::relative(0.5, 0.0, 0.5), 10.0, 0.25)]
    #[case(Formula::relative(1.0, 1.0, -0.2), 0.0, 0.8)] // relative ignores the reference
    #[case(Formula::absolute(1.0, 0.0, 5.0), 10.0, 1.5)]
    #[case(Formula::absolute(0.0, -10.0, 0.0), 10.0, 0.0)]
    #[case(Formula::absolute(0.0, 0.0, 3.0), 0.0, 1.0)]
    fn test_factor(#[case] formula: Formula, #[case] reference: f64, #[case] expected: f64) {
        assert!((formula.factor(reference).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_change_on_zero_reference_fails() {
        let err = Formula::absolute(1.0, 0.0, 4.0).factor(0.0).unwrap_err();
        assert!(matches!(err, FlowGraphError::InvalidState { .. }));
    }

    #[rstest]
    #[case(Formula::relative(0.0, -1.0, 0.0), 10.0)]
    #[case(Formula::absolute(0.0, -11.0, 0.0), 10.0)]
    fn test_negative_factor_fails(#[case] formula: Formula, #[case] reference: f64) {
        assert!(formula.factor(reference).is_err());
    }

    #[rstest]
    #[case(Formula::relative(0.0, 0.5, 0.0), 10.0, 0.5)]
    #[case(Formula::absolute(0.0, 3.0, 0.0), 10.0, 0.3)]
    #[case(Formula::absolute(1.0, 0.0, 4.0), 16.0, 0.25)]
    #[case(Formula::absolute(0.0, 0.0, 0.0), 0.0, 0.0)]
    fn test_shift_fraction(#[case] formula: Formula, #[case] reference: f64, #[case] expected: f64) {
        assert!((formula.shift_fraction(reference).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_shift_on_zero_reference_fails() {
        let err = Formula::absolute(0.0, 2.0, 0.0).shift_fraction(0.0).unwrap_err();
        assert!(matches!(err, FlowGraphError::InvalidState { .. }));
    }

    #[test]
    fn test_delta() {
        assert_eq!(Formula::relative(0.0, 2.0, 0.0).delta(10.0, 10.0).unwrap(), 10.0);
        assert_eq!(Formula::absolute(0.0, -5.0, 0.0).delta(4.0, 20.0).unwrap(), -1.0);
    }
}
