//! Apportionment of a requested amount across payment instruments.

use std::collections::HashSet;

use common::{Money, OrderInstrumentId};
use instrument::OrderPaymentInstrument;
use ledger::Ledger;
use rust_decimal::Decimal;

use crate::error::{OrchestrationError, Result};

/// One instrument's share of an allocated total.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub instrument: OrderPaymentInstrument,
    pub amount: Money,
}

/// Splits `total` across `candidates`, respecting per-instrument limits.
///
/// Candidates are visited in the caller-supplied order; that order is the
/// customer/business priority (gift card before credit card). Each candidate
/// contributes up to its remaining headroom, the limit minus what the
/// ledger already counts against it, and an unlimited instrument absorbs
/// whatever is still needed. Instruments restricted to a single standing
/// reservation are skipped outright while one is open.
///
/// Never under-allocates silently: when the candidates cannot cover the
/// total the whole call fails with `InsufficientInstrumentCapacity`. The
/// returned parts always sum to `total` exactly.
pub fn allocate(
    total: &Money,
    candidates: &[OrderPaymentInstrument],
    ledger: &Ledger,
) -> Result<Vec<Allocation>> {
    if total.currency_code() != ledger.currency_code() {
        return Err(OrchestrationError::CurrencyMismatch {
            left: total.currency_code().to_string(),
            right: ledger.currency_code().to_string(),
        });
    }

    let mut remaining = total.amount();
    let mut allocations = Vec::new();
    let mut seen: HashSet<OrderInstrumentId> = HashSet::new();

    for candidate in candidates {
        if remaining <= Decimal::ZERO {
            break;
        }
        if !seen.insert(candidate.guid) {
            continue;
        }
        if candidate.instrument.single_reserve_per_instrument
            && ledger.has_open_reservation(candidate.guid)
        {
            tracing::debug!(
                instrument = %candidate.guid,
                "skipping single-reserve instrument with an open reservation"
            );
            continue;
        }

        let available = if candidate.is_unlimited() {
            remaining
        } else {
            if candidate.limit.currency_code() != ledger.currency_code() {
                return Err(OrchestrationError::CurrencyMismatch {
                    left: candidate.limit.currency_code().to_string(),
                    right: ledger.currency_code().to_string(),
                });
            }
            let used = ledger.used_balance(candidate.guid).amount();
            (candidate.limit.amount() - used).max(Decimal::ZERO)
        };

        let share = remaining.min(available);
        if share > Decimal::ZERO {
            allocations.push(Allocation {
                instrument: candidate.clone(),
                amount: Money::new(share, ledger.currency_code()),
            });
            remaining -= share;
        }
    }

    if remaining > Decimal::ZERO {
        let covered = total.amount() - remaining;
        return Err(OrchestrationError::InsufficientInstrumentCapacity {
            requested: total.clone(),
            available: Money::new(covered, ledger.currency_code()),
        });
    }

    Ok(allocations)
}
