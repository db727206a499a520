use std::collections::{HashMap, HashSet};

use common::{EventId, Money, OrderInstrumentId, OrderNumber};
use instrument::OrderPaymentInstrument;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event::{PaymentEvent, TransactionType};

/// Folded state of one reservation chain: a root RESERVE event plus every
/// event that consumed, adjusted or reversed it.
///
/// Amounts are tracked as raw decimals; the ledger guarantees a single
/// currency across all of its events, so the [`Money`] wrappers are
/// reconstructed at the query edge.
#[derive(Debug, Clone)]
pub struct ChainState {
    pub root_guid: EventId,

    /// The order-scoped instrument the chain was recorded against.
    pub instrument: OrderPaymentInstrument,

    /// Gateway data of the latest approved reservation event, forwarded on
    /// follow-up charge and modification calls.
    pub reservation_data: HashMap<String, String>,

    currency_code: String,
    open: Decimal,
    charged: Decimal,
    credited: Decimal,
    cancelled: Decimal,
    refundable_charges: Vec<(EventId, Decimal)>,
}

impl ChainState {
    fn new(root: &PaymentEvent, currency_code: &str) -> Self {
        Self {
            root_guid: root.guid,
            instrument: root.order_payment_instrument.clone(),
            reservation_data: HashMap::new(),
            currency_code: currency_code.to_string(),
            open: Decimal::ZERO,
            charged: Decimal::ZERO,
            credited: Decimal::ZERO,
            cancelled: Decimal::ZERO,
            refundable_charges: Vec::new(),
        }
    }

    fn apply(&mut self, event: &PaymentEvent) {
        if !event.is_approved() {
            return;
        }
        let amount = event.amount.amount();
        match event.transaction_type {
            TransactionType::Reserve => {
                assert_eq!(
                    event.guid, self.root_guid,
                    "reservation event {} is not the root of its chain",
                    event.guid
                );
                self.open = amount;
                self.reservation_data = event.event_data.clone();
            }
            TransactionType::ModifyReserve => {
                self.open = amount;
                self.reservation_data = event.event_data.clone();
            }
            TransactionType::Charge => {
                self.charged += amount;
                self.open -= amount;
                assert!(
                    self.open >= Decimal::ZERO,
                    "charge {} overdraws reservation {}",
                    event.guid,
                    self.root_guid
                );
                self.refundable_charges.push((event.guid, amount));
            }
            TransactionType::CancelReserve => {
                self.cancelled += amount;
                self.open -= amount;
                assert!(
                    self.open >= Decimal::ZERO,
                    "cancellation {} overdraws reservation {}",
                    event.guid,
                    self.root_guid
                );
            }
            TransactionType::Credit => {
                self.credited += amount;
                self.consume_refundable(event.parent_guid, amount);
            }
        }
    }

    /// Reduces the refundable remainder of this chain's charge events by a
    /// credited amount: the named parent charge first, then oldest-first.
    fn consume_refundable(&mut self, parent: Option<EventId>, mut amount: Decimal) {
        if let Some(parent_guid) = parent
            && let Some((_, remaining)) = self
                .refundable_charges
                .iter_mut()
                .find(|(guid, _)| *guid == parent_guid)
        {
            let taken = amount.min(*remaining);
            *remaining -= taken;
            amount -= taken;
        }
        for (_, remaining) in self.refundable_charges.iter_mut() {
            if amount.is_zero() {
                break;
            }
            let taken = amount.min(*remaining);
            *remaining -= taken;
            amount -= taken;
        }
        assert!(
            amount.is_zero(),
            "credit overdraws charges on reservation {}",
            self.root_guid
        );
    }

    fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, &self.currency_code)
    }

    /// Amount still reserved and neither charged nor cancelled.
    pub fn open(&self) -> Money {
        self.money(self.open)
    }

    /// Gross amount charged against this reservation.
    pub fn charged(&self) -> Money {
        self.money(self.charged)
    }

    /// Amount credited back out of this chain's charges.
    pub fn credited(&self) -> Money {
        self.money(self.credited)
    }

    /// Amount of the reservation released without charging.
    pub fn cancelled(&self) -> Money {
        self.money(self.cancelled)
    }

    /// Charged amount not yet credited back.
    pub fn refundable(&self) -> Money {
        self.money(self.charged - self.credited)
    }

    /// The chain's effective reservation: open plus everything already
    /// settled against it either way.
    pub fn reserved_total(&self) -> Money {
        self.money(self.open + self.charged + self.cancelled)
    }

    /// The order-scoped instrument guid of this chain.
    pub fn instrument_guid(&self) -> OrderInstrumentId {
        self.instrument.guid
    }

    /// Charge events with a positive refundable remainder, oldest first.
    pub fn refundable_charges(&self) -> Vec<(EventId, Money)> {
        self.refundable_charges
            .iter()
            .filter(|(_, remaining)| *remaining > Decimal::ZERO)
            .map(|(guid, remaining)| (*guid, self.money(*remaining)))
            .collect()
    }
}

/// Append-only ordered log of payment events for one order.
///
/// The ledger is a value: `append` returns a new ledger and never edits or
/// removes an event. Every balance a decision depends on is computed by
/// folding the event list, re-sorted by (timestamp, sequence) so correctness
/// survives events arriving out of strict chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    reference_id: OrderNumber,
    currency_code: String,
    events: Vec<PaymentEvent>,
}

impl Ledger {
    /// Creates an empty ledger for one order in one currency.
    pub fn new(reference_id: OrderNumber, currency_code: impl Into<String>) -> Self {
        Self {
            reference_id,
            currency_code: currency_code.into(),
            events: Vec::new(),
        }
    }

    /// The order number this ledger records.
    pub fn reference_id(&self) -> &OrderNumber {
        &self.reference_id
    }

    /// The single currency every event in this ledger uses.
    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    /// Zero in this ledger's currency.
    pub fn zero_amount(&self) -> Money {
        Money::zero(&self.currency_code)
    }

    /// The events, ordered by timestamp then append sequence.
    pub fn events(&self) -> &[PaymentEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True when an event with this guid is already recorded.
    pub fn contains(&self, guid: EventId) -> bool {
        self.events.iter().any(|event| event.guid == guid)
    }

    /// Returns a new ledger with `new_events` appended.
    ///
    /// Append is a set-union keyed by event guid: replaying the same events
    /// is a no-op, never a duplication. Genuinely new events receive the
    /// next sequence numbers and the whole log is re-sorted by
    /// (timestamp, sequence).
    ///
    /// # Panics
    ///
    /// Panics when an event violates a ledger invariant (wrong order
    /// reference, wrong currency, negative amount, missing parent, or an
    /// overdrawn reservation). Upstream validation makes these unreachable;
    /// tripping one means a caller bypassed the orchestrator's checks.
    #[must_use]
    pub fn append(&self, new_events: Vec<PaymentEvent>) -> Ledger {
        let mut next = self.clone();
        let mut known: HashSet<EventId> = next.events.iter().map(|event| event.guid).collect();
        let mut sequence = next
            .events
            .iter()
            .map(|event| event.sequence)
            .max()
            .map_or(0, |highest| highest + 1);

        for mut event in new_events {
            if !known.insert(event.guid) {
                continue;
            }
            assert_eq!(
                event.reference_id, next.reference_id,
                "event {} belongs to order {}, not {}",
                event.guid, event.reference_id, next.reference_id
            );
            assert_eq!(
                event.amount.currency_code(),
                next.currency_code,
                "event {} is in {}, ledger holds {}",
                event.guid,
                event.amount.currency_code(),
                next.currency_code
            );
            assert!(
                !event.amount.is_negative(),
                "event {} carries a negative amount",
                event.guid
            );
            event.sequence = sequence;
            sequence += 1;
            next.events.push(event);
        }

        next.events
            .sort_by(|a, b| (a.timestamp, a.sequence).cmp(&(b.timestamp, b.sequence)));
        // Folding validates parent linkage and reservation balances.
        let _ = next.chains();
        next
    }

    /// Folds the ledger into per-reservation chain states, in order of each
    /// chain root's first appearance.
    pub fn chains(&self) -> Vec<ChainState> {
        let mut ordered: Vec<&PaymentEvent> = self.events.iter().collect();
        ordered.sort_by(|a, b| (a.timestamp, a.sequence).cmp(&(b.timestamp, b.sequence)));

        let by_guid: HashMap<EventId, &PaymentEvent> = ordered
            .iter()
            .map(|event| (event.guid, *event))
            .collect();

        let mut chains: Vec<ChainState> = Vec::new();
        let mut chain_index: HashMap<EventId, usize> = HashMap::new();

        for &event in &ordered {
            let root_guid = self.resolve_root(event, &by_guid);
            let index = match chain_index.get(&root_guid) {
                Some(index) => *index,
                None => {
                    let root_event = by_guid
                        .get(&root_guid)
                        .copied()
                        .unwrap_or_else(|| panic!("chain root {root_guid} absent from ledger"));
                    chains.push(ChainState::new(root_event, &self.currency_code));
                    chain_index.insert(root_guid, chains.len() - 1);
                    chains.len() - 1
                }
            };
            chains[index].apply(event);
        }

        chains
    }

    fn resolve_root(
        &self,
        event: &PaymentEvent,
        by_guid: &HashMap<EventId, &PaymentEvent>,
    ) -> EventId {
        let mut current = event;
        // Parent links are acyclic by construction; the hop bound is a
        // defensive backstop.
        for _ in 0..=self.events.len() {
            match current.parent_guid {
                None => return current.guid,
                Some(parent_guid) => {
                    current = by_guid.get(&parent_guid).copied().unwrap_or_else(|| {
                        panic!(
                            "event {} references parent {} absent from ledger {}",
                            current.guid, parent_guid, self.reference_id
                        )
                    });
                }
            }
        }
        panic!("parent linkage cycle detected in ledger {}", self.reference_id);
    }

    /// Chain states for one instrument, oldest reservation first.
    pub fn chains_for(&self, instrument: OrderInstrumentId) -> Vec<ChainState> {
        self.chains()
            .into_iter()
            .filter(|chain| chain.instrument_guid() == instrument)
            .collect()
    }

    /// Chains of this instrument still holding an open amount.
    pub fn open_chains(&self, instrument: OrderInstrumentId) -> Vec<ChainState> {
        self.chains_for(instrument)
            .into_iter()
            .filter(|chain| chain.open().is_positive())
            .collect()
    }

    /// Chains of this instrument with a positive refundable amount.
    pub fn refundable_chains(&self, instrument: OrderInstrumentId) -> Vec<ChainState> {
        self.chains_for(instrument)
            .into_iter()
            .filter(|chain| chain.refundable().is_positive())
            .collect()
    }

    fn sum_for(&self, instrument: OrderInstrumentId, amount: impl Fn(&ChainState) -> Decimal) -> Money {
        let total = self
            .chains_for(instrument)
            .iter()
            .map(amount)
            .sum::<Decimal>();
        Money::new(total, &self.currency_code)
    }

    /// Reserved amount not yet charged or cancelled.
    pub fn open_balance(&self, instrument: OrderInstrumentId) -> Money {
        self.sum_for(instrument, |chain| chain.open)
    }

    /// Charged amount net of credits.
    pub fn charged_balance(&self, instrument: OrderInstrumentId) -> Money {
        self.sum_for(instrument, |chain| chain.charged - chain.credited)
    }

    /// Total credited back to the instrument.
    pub fn credited_balance(&self, instrument: OrderInstrumentId) -> Money {
        self.sum_for(instrument, |chain| chain.credited)
    }

    /// Total released without charging.
    pub fn cancelled_balance(&self, instrument: OrderInstrumentId) -> Money {
        self.sum_for(instrument, |chain| chain.cancelled)
    }

    /// Effective reservations ever secured on the instrument: open amounts
    /// plus everything charged or cancelled out of them.
    pub fn reserved_balance(&self, instrument: OrderInstrumentId) -> Money {
        self.sum_for(instrument, |chain| chain.open + chain.charged + chain.cancelled)
    }

    /// The amount counted against the instrument's spending limit: open
    /// holds plus net settled charges.
    pub fn used_balance(&self, instrument: OrderInstrumentId) -> Money {
        self.sum_for(instrument, |chain| chain.open + chain.charged - chain.credited)
    }

    /// True when the instrument holds at least one open reservation.
    pub fn has_open_reservation(&self, instrument: OrderInstrumentId) -> bool {
        !self.open_chains(instrument).is_empty()
    }

    /// True when at least one approved charge was recorded for the
    /// instrument.
    pub fn has_approved_charge(&self, instrument: OrderInstrumentId) -> bool {
        self.events.iter().any(|event| {
            event.instrument_guid() == instrument
                && event.transaction_type == TransactionType::Charge
                && event.is_approved()
        })
    }

    /// The chain containing the given event, if the event is recorded.
    pub fn chain_of(&self, guid: EventId) -> Option<ChainState> {
        let event = self.events.iter().find(|event| event.guid == guid)?;
        let by_guid: HashMap<EventId, &PaymentEvent> = self
            .events
            .iter()
            .map(|event| (event.guid, event))
            .collect();
        let root_guid = self.resolve_root(event, &by_guid);
        self.chains()
            .into_iter()
            .find(|chain| chain.root_guid == root_guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PaymentStatus;
    use chrono::{TimeZone, Utc};
    use common::ProviderConfigId;
    use instrument::{OrderPaymentInstrument, PaymentInstrument};
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, "USD")
    }

    fn binding(limit: Money) -> OrderPaymentInstrument {
        OrderPaymentInstrument::new(
            OrderNumber::new("20000-1"),
            PaymentInstrument::new("Visa ending 4242", ProviderConfigId::new()),
            limit,
        )
    }

    fn ledger() -> Ledger {
        Ledger::new(OrderNumber::new("20000-1"), "USD")
    }

    fn event(
        transaction_type: TransactionType,
        instrument: &OrderPaymentInstrument,
        amount: Money,
        at_millis: i64,
    ) -> PaymentEvent {
        let mut event = PaymentEvent::new(
            transaction_type,
            PaymentStatus::Approved,
            instrument.clone(),
            amount,
        );
        event.timestamp = Utc.timestamp_millis_opt(at_millis).unwrap();
        event
    }

    fn child(mut event: PaymentEvent, parent: EventId) -> PaymentEvent {
        event.parent_guid = Some(parent);
        event
    }

    #[test]
    fn append_assigns_monotonic_sequences() {
        let instrument = binding(Money::zero("USD"));
        let first = event(TransactionType::Reserve, &instrument, usd(dec!(10.00)), 1);
        let second = event(TransactionType::Reserve, &instrument, usd(dec!(5.00)), 2);

        let ledger = ledger().append(vec![first, second]);
        let sequences: Vec<u64> = ledger.events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);

        let third = event(TransactionType::Reserve, &instrument, usd(dec!(1.00)), 3);
        let ledger = ledger.append(vec![third]);
        assert_eq!(ledger.events()[2].sequence, 2);
    }

    #[test]
    fn append_is_idempotent_per_guid() {
        let instrument = binding(Money::zero("USD"));
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(10.00)), 1);

        let once = ledger().append(vec![reserve.clone()]);
        let twice = once.append(vec![reserve.clone()]);
        assert_eq!(twice.len(), 1);

        // Duplicates within one batch collapse too.
        let batched = ledger().append(vec![reserve.clone(), reserve]);
        assert_eq!(batched.len(), 1);
    }

    #[test]
    fn identical_timestamps_order_by_sequence() {
        let instrument = binding(Money::zero("USD"));
        let first = event(TransactionType::Reserve, &instrument, usd(dec!(1.00)), 7);
        let second = event(TransactionType::Reserve, &instrument, usd(dec!(2.00)), 7);
        let first_guid = first.guid;
        let second_guid = second.guid;

        let ledger = ledger().append(vec![first, second]);
        let order: Vec<EventId> = ledger.events().iter().map(|e| e.guid).collect();
        assert_eq!(order, vec![first_guid, second_guid]);
    }

    #[test]
    fn balances_fold_reserve_charge_cancel_credit() {
        let instrument = binding(Money::zero("USD"));
        let guid = instrument.guid;
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(100.00)), 1);
        let reserve_guid = reserve.guid;
        let ledger = ledger().append(vec![reserve]);

        assert_eq!(ledger.open_balance(guid), usd(dec!(100.00)));
        assert_eq!(ledger.charged_balance(guid), usd(dec!(0.00)));

        let charge = child(
            event(TransactionType::Charge, &instrument, usd(dec!(40.00)), 2),
            reserve_guid,
        );
        let ledger = ledger.append(vec![charge]);
        assert_eq!(ledger.open_balance(guid), usd(dec!(60.00)));
        assert_eq!(ledger.charged_balance(guid), usd(dec!(40.00)));

        let cancel = child(
            event(TransactionType::CancelReserve, &instrument, usd(dec!(60.00)), 3),
            reserve_guid,
        );
        let ledger = ledger.append(vec![cancel]);
        assert_eq!(ledger.open_balance(guid), usd(dec!(0.00)));
        assert_eq!(ledger.cancelled_balance(guid), usd(dec!(60.00)));

        let credit = child(
            event(TransactionType::Credit, &instrument, usd(dec!(15.00)), 4),
            reserve_guid,
        );
        let ledger = ledger.append(vec![credit]);
        assert_eq!(ledger.charged_balance(guid), usd(dec!(25.00)));
        assert_eq!(ledger.credited_balance(guid), usd(dec!(15.00)));
        assert_eq!(ledger.used_balance(guid), usd(dec!(25.00)));
    }

    #[test]
    fn modify_replaces_the_open_amount() {
        let instrument = binding(Money::zero("USD"));
        let guid = instrument.guid;
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(100.00)), 1);
        let reserve_guid = reserve.guid;

        let modify = child(
            event(TransactionType::ModifyReserve, &instrument, usd(dec!(70.00)), 2),
            reserve_guid,
        );
        let ledger = ledger().append(vec![reserve, modify]);

        assert_eq!(ledger.open_balance(guid), usd(dec!(70.00)));
        assert_eq!(ledger.reserved_balance(guid), usd(dec!(70.00)));
    }

    #[test]
    fn non_approved_events_do_not_move_balances() {
        let instrument = binding(Money::zero("USD"));
        let guid = instrument.guid;
        let mut declined = event(TransactionType::Reserve, &instrument, usd(dec!(50.00)), 1);
        declined.status = PaymentStatus::Declined;
        let mut failed = event(TransactionType::Reserve, &instrument, usd(dec!(25.00)), 2);
        failed.status = PaymentStatus::Failed;

        let ledger = ledger().append(vec![declined, failed]);
        assert_eq!(ledger.open_balance(guid), usd(dec!(0.00)));
        assert!(!ledger.has_open_reservation(guid));
    }

    #[test]
    fn charged_plus_cancelled_never_exceeds_reserved() {
        let instrument = binding(Money::zero("USD"));
        let guid = instrument.guid;
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(100.00)), 1);
        let reserve_guid = reserve.guid;
        let charge = child(
            event(TransactionType::Charge, &instrument, usd(dec!(55.00)), 2),
            reserve_guid,
        );
        let cancel = child(
            event(TransactionType::CancelReserve, &instrument, usd(dec!(45.00)), 3),
            reserve_guid,
        );

        let ledger = ledger().append(vec![reserve, charge, cancel]);
        let settled = ledger
            .charged_balance(guid)
            .add(&ledger.cancelled_balance(guid))
            .unwrap();
        assert!(settled.amount() <= ledger.reserved_balance(guid).amount());
        assert_eq!(ledger.open_balance(guid), usd(dec!(0.00)));
    }

    #[test]
    #[should_panic(expected = "overdraws reservation")]
    fn overdrawn_reservation_is_fatal() {
        let instrument = binding(Money::zero("USD"));
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(10.00)), 1);
        let reserve_guid = reserve.guid;
        let charge = child(
            event(TransactionType::Charge, &instrument, usd(dec!(11.00)), 2),
            reserve_guid,
        );
        let _ = ledger().append(vec![reserve, charge]);
    }

    #[test]
    #[should_panic(expected = "absent from ledger")]
    fn orphan_parent_is_fatal() {
        let instrument = binding(Money::zero("USD"));
        let charge = child(
            event(TransactionType::Charge, &instrument, usd(dec!(1.00)), 1),
            EventId::new(),
        );
        let _ = ledger().append(vec![charge]);
    }

    #[test]
    #[should_panic(expected = "belongs to order")]
    fn wrong_order_reference_is_fatal() {
        let foreign = OrderPaymentInstrument::new(
            OrderNumber::new("99999-9"),
            PaymentInstrument::new("Visa ending 4242", ProviderConfigId::new()),
            Money::zero("USD"),
        );
        let reserve = event(TransactionType::Reserve, &foreign, usd(dec!(1.00)), 1);
        let _ = ledger().append(vec![reserve]);
    }

    #[test]
    fn refundable_charges_consume_oldest_first() {
        let instrument = binding(Money::zero("USD"));
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(100.00)), 1);
        let reserve_guid = reserve.guid;
        let first_charge = child(
            event(TransactionType::Charge, &instrument, usd(dec!(30.00)), 2),
            reserve_guid,
        );
        let first_charge_guid = first_charge.guid;
        let second_charge = child(
            event(TransactionType::Charge, &instrument, usd(dec!(20.00)), 3),
            reserve_guid,
        );
        let second_charge_guid = second_charge.guid;
        // No parent named: the credit consumes the oldest charge first.
        let credit = child(
            event(TransactionType::Credit, &instrument, usd(dec!(35.00)), 4),
            reserve_guid,
        );

        let ledger = ledger().append(vec![reserve, first_charge, second_charge, credit]);
        let chain = ledger.chain_of(first_charge_guid).unwrap();
        let refundable = chain.refundable_charges();
        assert_eq!(refundable, vec![(second_charge_guid, usd(dec!(15.00)))]);
        assert_eq!(chain.refundable(), usd(dec!(15.00)));
    }

    #[test]
    fn chain_of_resolves_through_parent_links() {
        let instrument = binding(Money::zero("USD"));
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(50.00)), 1);
        let reserve_guid = reserve.guid;
        let modify = child(
            event(TransactionType::ModifyReserve, &instrument, usd(dec!(45.00)), 2),
            reserve_guid,
        );
        let modify_guid = modify.guid;

        let ledger = ledger().append(vec![reserve, modify]);
        let chain = ledger.chain_of(modify_guid).unwrap();
        assert_eq!(chain.root_guid, reserve_guid);
        assert_eq!(chain.open(), usd(dec!(45.00)));
        assert!(ledger.chain_of(EventId::new()).is_none());
    }

    #[test]
    fn ledger_serialization_roundtrip() {
        let instrument = binding(Money::zero("USD"));
        let reserve = event(TransactionType::Reserve, &instrument, usd(dec!(42.00)), 1);
        let ledger = ledger().append(vec![reserve]);

        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("\"referenceId\""));
        let deserialized: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(ledger, deserialized);
        assert_eq!(
            deserialized.open_balance(instrument.guid),
            usd(dec!(42.00))
        );
    }
}
