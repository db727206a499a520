use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Arithmetic was attempted between two different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// A split was requested with no parts.
    #[error("Cannot split an amount into zero parts")]
    EmptySplit,

    /// Split weights were negative or summed to zero.
    #[error("Split weights must be non-negative with a positive sum")]
    InvalidWeights,
}

/// An immutable monetary amount in a single currency.
///
/// Amounts are decimals, never floats. Arithmetic between two values is
/// fallible: mixing currencies is a [`MoneyError::CurrencyMismatch`], not a
/// silent coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    amount: Decimal,
    currency_code: String,
}

impl Money {
    /// Creates a new amount in the given currency.
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// Returns zero in the given currency.
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Returns the decimal amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the ISO currency code.
    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns true if both values share a currency.
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency_code == other.currency_code
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency_code.clone(),
                right: other.currency_code.clone(),
            })
        }
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, &self.currency_code))
    }

    /// Subtracts another amount of the same currency.
    ///
    /// The result may be negative; callers validating ledger amounts reject
    /// negative values before anything is recorded.
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, &self.currency_code))
    }

    /// Returns the smaller of two amounts of the same currency.
    pub fn min(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(
            self.amount.min(other.amount),
            &self.currency_code,
        ))
    }

    /// Splits this amount into one part per weight, proportionally.
    ///
    /// Parts are rounded towards zero at this amount's scale; the rounding
    /// remainder is assigned to the first part, so the parts always sum back
    /// to the whole exactly.
    pub fn split_proportional(&self, weights: &[Decimal]) -> Result<Vec<Money>, MoneyError> {
        if weights.is_empty() {
            return Err(MoneyError::EmptySplit);
        }
        if weights.iter().any(|w| w.is_sign_negative() && !w.is_zero()) {
            return Err(MoneyError::InvalidWeights);
        }
        let total_weight: Decimal = weights.iter().sum();
        if total_weight.is_zero() {
            return Err(MoneyError::InvalidWeights);
        }

        let scale = self.amount.scale();
        let mut parts: Vec<Money> = weights
            .iter()
            .map(|weight| {
                let share = (self.amount * weight / total_weight)
                    .round_dp_with_strategy(scale, RoundingStrategy::ToZero);
                Money::new(share, &self.currency_code)
            })
            .collect();

        let allocated: Decimal = parts.iter().map(|part| part.amount).sum();
        let remainder = self.amount - allocated;
        if !remainder.is_zero() {
            parts[0].amount += remainder;
        }

        Ok(parts)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, "USD")
    }

    #[test]
    fn add_and_subtract_same_currency() {
        let a = usd(dec!(10.00));
        let b = usd(dec!(2.50));

        assert_eq!(a.add(&b).unwrap(), usd(dec!(12.50)));
        assert_eq!(a.subtract(&b).unwrap(), usd(dec!(7.50)));
    }

    #[test]
    fn mixing_currencies_fails() {
        let dollars = usd(dec!(10.00));
        let euros = Money::new(dec!(10.00), "EUR");

        let err = dollars.add(&euros).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                left: "USD".to_string(),
                right: "EUR".to_string(),
            }
        );
        assert!(dollars.subtract(&euros).is_err());
        assert!(dollars.min(&euros).is_err());
    }

    #[test]
    fn subtract_may_go_negative() {
        let a = usd(dec!(1.00));
        let b = usd(dec!(3.00));
        let diff = a.subtract(&b).unwrap();
        assert!(diff.is_negative());
        assert_eq!(diff.amount(), dec!(-2.00));
    }

    #[test]
    fn sign_queries() {
        assert!(usd(dec!(0.01)).is_positive());
        assert!(usd(dec!(0.00)).is_zero());
        assert!(usd(dec!(-0.01)).is_negative());
    }

    #[test]
    fn split_proportional_conserves_the_whole() {
        let total = usd(dec!(100.00));
        let parts = total
            .split_proportional(&[dec!(1), dec!(1), dec!(1)])
            .unwrap();

        assert_eq!(parts.len(), 3);
        // Remainder lands on the first part.
        assert_eq!(parts[0], usd(dec!(33.34)));
        assert_eq!(parts[1], usd(dec!(33.33)));
        assert_eq!(parts[2], usd(dec!(33.33)));

        let sum = parts
            .iter()
            .try_fold(usd(dec!(0.00)), |acc, part| acc.add(part))
            .unwrap();
        assert_eq!(sum, total);
    }

    #[test]
    fn split_proportional_respects_weights() {
        let total = usd(dec!(90.00));
        let parts = total.split_proportional(&[dec!(2), dec!(1)]).unwrap();
        assert_eq!(parts[0], usd(dec!(60.00)));
        assert_eq!(parts[1], usd(dec!(30.00)));
    }

    #[test]
    fn split_rejects_bad_weights() {
        let total = usd(dec!(10.00));
        assert_eq!(total.split_proportional(&[]), Err(MoneyError::EmptySplit));
        assert_eq!(
            total.split_proportional(&[dec!(0), dec!(0)]),
            Err(MoneyError::InvalidWeights)
        );
        assert_eq!(
            total.split_proportional(&[dec!(1), dec!(-1)]),
            Err(MoneyError::InvalidWeights)
        );
    }

    #[test]
    fn display_includes_currency() {
        assert_eq!(usd(dec!(12.34)).to_string(), "12.34 USD");
    }

    #[test]
    fn serialization_roundtrip() {
        let money = usd(dec!(42.05));
        let json = serde_json::to_string(&money).unwrap();
        assert!(json.contains("\"currencyCode\":\"USD\""));
        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(money, deserialized);
    }
}
