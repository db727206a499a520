//! The transaction orchestrator.
//!
//! Each operation is a pure transformation of (request, ledger snapshot)
//! into new payment events, with exactly one gateway call per instrument
//! touched. Validation happens strictly before any call goes out: a
//! rejected request leaves the caller's ledger untouched and the gateway
//! unaware. Gateway declines and failures are not errors; they come back
//! as events for the caller to interpret.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use common::{EventId, IdempotencyKey, Money, OrderInstrumentId};
use futures_util::future::join_all;
use instrument::OrderPaymentInstrument;
use ledger::{
    ChainState, EVENT_DATA_ERROR_DETAIL, EVENT_DATA_PROVIDER_REFERENCE, EVENT_DATA_TIMEOUT,
    Ledger, PaymentEvent, PaymentStatus, TransactionType,
};
use rust_decimal::Decimal;

use crate::allocator::allocate;
use crate::error::{OrchestrationError, Result};
use crate::gateway::{GatewayRequest, GatewayStatus, PaymentGateway};
use crate::request::{
    CancelAllReservationsRequest, CancelReservationRequest, ChargeRequest, CreditRequest,
    ModifyReservationRequest, OrderContext, ReserveRequest,
};
use crate::response::PaymentApiResponse;

/// One planned event: its parent link, type and amount.
///
/// For MODIFY_RESERVE portions the amount is the chain's new open amount;
/// for everything else it is the amount moved by this portion.
struct Portion {
    parent: Option<EventId>,
    transaction_type: TransactionType,
    amount: Decimal,
}

/// One planned gateway call against one instrument, with the events it
/// produces once the outcome is known.
struct InstrumentCall {
    instrument: OrderPaymentInstrument,
    transaction_type: TransactionType,
    amount: Decimal,
    portions: Vec<Portion>,
    reservation_data: HashMap<String, String>,
    /// Status recorded when the provider errors out: FAILED, or SKIPPED for
    /// downward adjustments whose hold simply expires provider-side.
    failure_status: PaymentStatus,
    original_instrument: bool,
}

/// Orchestrates payment operations against a gateway port.
///
/// Holds no mutable state: concurrent invocations for different orders are
/// safe, and serializing writes per order is the caller's responsibility.
pub struct Orchestrator<G: PaymentGateway> {
    gateway: G,
    call_timeout: Duration,
}

impl<G: PaymentGateway> Orchestrator<G> {
    /// Creates an orchestrator; every gateway call is bounded by
    /// `call_timeout`, after which the outcome is recorded as FAILED.
    pub fn new(gateway: G, call_timeout: Duration) -> Self {
        Self {
            gateway,
            call_timeout,
        }
    }

    async fn instrumented<F>(operation: &'static str, fut: F) -> Result<PaymentApiResponse>
    where
        F: Future<Output = Result<PaymentApiResponse>>,
    {
        metrics::counter!("payment_operations_total", "operation" => operation).increment(1);
        let start = std::time::Instant::now();
        let result = fut.await;
        metrics::histogram!("payment_operation_duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());
        result
    }

    /// Places holds for an amount across the selected instruments.
    ///
    /// Partial approval is allowed and reported: instruments that succeeded
    /// are never rolled back because a later one declined; the caller sees
    /// the mixed outcome and decides whether to cancel.
    #[tracing::instrument(skip(self, request), fields(order = %request.order_context.order_number))]
    pub async fn reserve(&self, request: ReserveRequest) -> Result<PaymentApiResponse> {
        Self::instrumented("reserve", self.reserve_inner(request)).await
    }

    async fn reserve_inner(&self, request: ReserveRequest) -> Result<PaymentApiResponse> {
        ensure_selected(&request.instruments)?;
        ensure_currency(&request.amount, &request.ledger)?;
        if !request.amount.is_positive() {
            return Ok(PaymentApiResponse::new(&request.ledger, Vec::new()));
        }

        let allocations = allocate(&request.amount, &request.instruments, &request.ledger)?;
        let calls = allocations
            .into_iter()
            .map(|allocation| InstrumentCall {
                transaction_type: TransactionType::Reserve,
                amount: allocation.amount.amount(),
                portions: vec![Portion {
                    parent: None,
                    transaction_type: TransactionType::Reserve,
                    amount: allocation.amount.amount(),
                }],
                reservation_data: HashMap::new(),
                failure_status: PaymentStatus::Failed,
                original_instrument: true,
                instrument: allocation.instrument,
            })
            .collect();

        let events = self
            .dispatch(calls, &request.order_context, &request.custom_request_data, &request.ledger)
            .await;
        Ok(PaymentApiResponse::new(&request.ledger, events))
    }

    /// Settles up to the requested total against standing reservations.
    ///
    /// Fails with `ChargeExceedsReservation` before any gateway call when
    /// the selected instruments' open reservations cannot cover the total.
    #[tracing::instrument(skip(self, request), fields(order = %request.order_context.order_number))]
    pub async fn charge(&self, request: ChargeRequest) -> Result<PaymentApiResponse> {
        Self::instrumented("charge", self.charge_inner(request)).await
    }

    async fn charge_inner(&self, request: ChargeRequest) -> Result<PaymentApiResponse> {
        ensure_selected(&request.instruments)?;
        ensure_currency(&request.total_chargeable_amount, &request.ledger)?;
        if !request.total_chargeable_amount.is_positive() {
            return Ok(PaymentApiResponse::new(&request.ledger, Vec::new()));
        }

        let ledger = &request.ledger;
        let mut eligible: Vec<(&OrderPaymentInstrument, Vec<ChainState>)> = Vec::new();
        for instrument in dedup(&request.instruments) {
            if !instrument.instrument.supports_multi_charge
                && ledger.has_approved_charge(instrument.guid)
            {
                tracing::debug!(
                    instrument = %instrument.guid,
                    "skipping single-charge instrument with a prior charge"
                );
                continue;
            }
            let chains = ledger.open_chains(instrument.guid);
            if !chains.is_empty() {
                eligible.push((instrument, chains));
            }
        }

        let available: Decimal = eligible
            .iter()
            .flat_map(|(_, chains)| chains)
            .map(|chain| chain.open().amount())
            .sum();
        let requested = request.total_chargeable_amount.amount();
        if requested > available {
            return Err(OrchestrationError::ChargeExceedsReservation {
                requested: request.total_chargeable_amount.clone(),
                available: Money::new(available, ledger.currency_code()),
            });
        }

        let mut remaining = requested;
        let mut calls = Vec::new();
        for (instrument, chains) in eligible {
            if remaining <= Decimal::ZERO {
                break;
            }
            let mut portions = Vec::new();
            let mut call_amount = Decimal::ZERO;
            let mut reservation_data: Option<HashMap<String, String>> = None;
            for chain in chains {
                if remaining <= Decimal::ZERO {
                    break;
                }
                let take = remaining.min(chain.open().amount());
                portions.push(Portion {
                    parent: Some(chain.root_guid),
                    transaction_type: TransactionType::Charge,
                    amount: take,
                });
                call_amount += take;
                remaining -= take;
                reservation_data.get_or_insert_with(|| chain.reservation_data.clone());
            }
            if call_amount > Decimal::ZERO {
                calls.push(InstrumentCall {
                    instrument: instrument.clone(),
                    transaction_type: TransactionType::Charge,
                    amount: call_amount,
                    portions,
                    reservation_data: reservation_data.unwrap_or_default(),
                    failure_status: PaymentStatus::Failed,
                    original_instrument: true,
                });
            }
        }

        let events = self
            .dispatch(calls, &request.order_context, &request.custom_request_data, ledger)
            .await;
        Ok(PaymentApiResponse::new(ledger, events))
    }

    /// Adjusts the standing reservations to a new total without charging.
    #[tracing::instrument(skip(self, request), fields(order = %request.order_context.order_number))]
    pub async fn modify_reservation(
        &self,
        request: ModifyReservationRequest,
    ) -> Result<PaymentApiResponse> {
        Self::instrumented("modify_reservation", self.modify_reservation_inner(request)).await
    }

    async fn modify_reservation_inner(
        &self,
        request: ModifyReservationRequest,
    ) -> Result<PaymentApiResponse> {
        ensure_selected(&request.instruments)?;
        ensure_currency(&request.amount, &request.ledger)?;

        let ledger = &request.ledger;
        let selected = dedup(&request.instruments);
        let open_chains: Vec<(&OrderPaymentInstrument, Vec<ChainState>)> = selected
            .iter()
            .filter_map(|instrument| {
                let chains = ledger.open_chains(instrument.guid);
                (!chains.is_empty()).then(|| (*instrument, chains))
            })
            .collect();

        let open_total: Decimal = open_chains
            .iter()
            .flat_map(|(_, chains)| chains)
            .map(|chain| chain.open().amount())
            .sum();
        let charged_net: Decimal = selected
            .iter()
            .map(|instrument| ledger.charged_balance(instrument.guid).amount())
            .sum();
        let requested = request.amount.amount();
        let difference = requested - (open_total + charged_net);

        if difference.is_zero() {
            return Ok(PaymentApiResponse::new(ledger, Vec::new()));
        }

        if open_chains.is_empty() && difference > Decimal::ZERO {
            // Nothing standing to adjust: reserve the difference afresh.
            tracing::info!(order = %request.order_context.order_number,
                "no open reservation to modify, reserving the difference");
            let reserve_request = ReserveRequest {
                instruments: request.instruments.clone(),
                amount: Money::new(difference, ledger.currency_code()),
                ledger: request.ledger.clone(),
                order_context: request.order_context.clone(),
                custom_request_data: request.custom_request_data.clone(),
            };
            return self.reserve_inner(reserve_request).await;
        }

        let calls = if difference > Decimal::ZERO {
            // An increase is absorbed by the first open reservation on an
            // instrument without a ceiling.
            let target = open_chains
                .iter()
                .filter(|(instrument, _)| instrument.is_unlimited())
                .flat_map(|(instrument, chains)| {
                    chains.first().map(|chain| (*instrument, chain))
                })
                .next();
            let Some((instrument, chain)) = target else {
                return Err(OrchestrationError::InsufficientInstrumentCapacity {
                    requested: Money::new(difference, ledger.currency_code()),
                    available: ledger.zero_amount(),
                });
            };
            let new_open = chain.open().amount() + difference;
            vec![InstrumentCall {
                instrument: instrument.clone(),
                transaction_type: TransactionType::ModifyReserve,
                amount: new_open,
                portions: vec![Portion {
                    parent: Some(chain.root_guid),
                    transaction_type: TransactionType::ModifyReserve,
                    amount: new_open,
                }],
                reservation_data: chain.reservation_data.clone(),
                failure_status: PaymentStatus::Failed,
                original_instrument: true,
            }]
        } else {
            if requested < charged_net {
                return Err(OrchestrationError::ReservationBelowChargedAmount {
                    requested: request.amount.clone(),
                    charged: Money::new(charged_net, ledger.currency_code()),
                });
            }
            let mut to_release = -difference;
            let mut calls = Vec::new();
            for (instrument, chains) in &open_chains {
                if to_release <= Decimal::ZERO {
                    break;
                }
                let mut portions = Vec::new();
                let mut released = Decimal::ZERO;
                let mut kept_open = Decimal::ZERO;
                let mut reservation_data: Option<HashMap<String, String>> = None;
                for chain in chains {
                    if to_release <= Decimal::ZERO {
                        break;
                    }
                    let open = chain.open().amount();
                    let reduce = to_release.min(open);
                    let new_open = open - reduce;
                    to_release -= reduce;
                    released += reduce;
                    if new_open.is_zero() {
                        portions.push(Portion {
                            parent: Some(chain.root_guid),
                            transaction_type: TransactionType::CancelReserve,
                            amount: open,
                        });
                    } else {
                        portions.push(Portion {
                            parent: Some(chain.root_guid),
                            transaction_type: TransactionType::ModifyReserve,
                            amount: new_open,
                        });
                        kept_open += new_open;
                    }
                    reservation_data.get_or_insert_with(|| chain.reservation_data.clone());
                }
                if portions.is_empty() {
                    continue;
                }
                let all_cancelled = portions
                    .iter()
                    .all(|portion| portion.transaction_type == TransactionType::CancelReserve);
                calls.push(InstrumentCall {
                    instrument: (*instrument).clone(),
                    transaction_type: if all_cancelled {
                        TransactionType::CancelReserve
                    } else {
                        TransactionType::ModifyReserve
                    },
                    amount: if all_cancelled { released } else { kept_open },
                    portions,
                    reservation_data: reservation_data.unwrap_or_default(),
                    failure_status: PaymentStatus::Skipped,
                    original_instrument: true,
                });
            }
            debug_assert!(to_release <= Decimal::ZERO);
            calls
        };

        let events = self
            .dispatch(calls, &request.order_context, &request.custom_request_data, ledger)
            .await;
        Ok(PaymentApiResponse::new(ledger, events))
    }

    /// Releases an amount held by specifically named reservation events.
    #[tracing::instrument(skip(self, request), fields(order = %request.order_context.order_number))]
    pub async fn cancel_reservation(
        &self,
        request: CancelReservationRequest,
    ) -> Result<PaymentApiResponse> {
        Self::instrumented("cancel_reservation", self.cancel_reservation_inner(request)).await
    }

    async fn cancel_reservation_inner(
        &self,
        request: CancelReservationRequest,
    ) -> Result<PaymentApiResponse> {
        ensure_selected(&request.instruments)?;
        ensure_currency(&request.amount, &request.ledger)?;

        let ledger = &request.ledger;
        let mut chains: Vec<ChainState> = Vec::new();
        let mut seen_roots: HashSet<EventId> = HashSet::new();
        for guid in &request.selected_payment_events_to_cancel {
            let Some(chain) = ledger.chain_of(*guid) else {
                return Err(OrchestrationError::UnknownPaymentEvent(*guid));
            };
            if seen_roots.insert(chain.root_guid) {
                chains.push(chain);
            }
        }

        let open_total: Decimal = chains.iter().map(|chain| chain.open().amount()).sum();
        let requested = request.amount.amount();
        if requested > open_total {
            return Err(OrchestrationError::OverCancellation {
                requested: request.amount.clone(),
                open: Money::new(open_total, ledger.currency_code()),
            });
        }
        if !request.amount.is_positive() {
            return Ok(PaymentApiResponse::new(ledger, Vec::new()));
        }

        // Release oldest reservations first, regardless of naming order.
        let ledger_order: HashMap<EventId, usize> = ledger
            .chains()
            .iter()
            .enumerate()
            .map(|(position, chain)| (chain.root_guid, position))
            .collect();
        chains.sort_by_key(|chain| {
            ledger_order
                .get(&chain.root_guid)
                .copied()
                .unwrap_or(usize::MAX)
        });

        let selected_guids: HashSet<OrderInstrumentId> =
            request.instruments.iter().map(|i| i.guid).collect();
        let mut remaining = requested;
        let mut calls: Vec<InstrumentCall> = Vec::new();
        let mut call_index: HashMap<OrderInstrumentId, usize> = HashMap::new();
        for chain in &chains {
            if remaining <= Decimal::ZERO {
                break;
            }
            let take = remaining.min(chain.open().amount());
            if take <= Decimal::ZERO {
                continue;
            }
            remaining -= take;
            let index = match call_index.get(&chain.instrument_guid()) {
                Some(index) => *index,
                None => {
                    calls.push(InstrumentCall {
                        instrument: chain.instrument.clone(),
                        transaction_type: TransactionType::CancelReserve,
                        amount: Decimal::ZERO,
                        portions: Vec::new(),
                        reservation_data: chain.reservation_data.clone(),
                        failure_status: PaymentStatus::Failed,
                        original_instrument: selected_guids.contains(&chain.instrument_guid()),
                    });
                    call_index.insert(chain.instrument_guid(), calls.len() - 1);
                    calls.len() - 1
                }
            };
            calls[index].amount += take;
            calls[index].portions.push(Portion {
                parent: Some(chain.root_guid),
                transaction_type: TransactionType::CancelReserve,
                amount: take,
            });
        }

        let events = self
            .dispatch(calls, &request.order_context, &request.custom_request_data, ledger)
            .await;
        Ok(PaymentApiResponse::new(ledger, events))
    }

    /// Releases every open reservation on the given instruments.
    ///
    /// Used at order-abandonment time; a ledger with nothing open yields an
    /// empty success.
    #[tracing::instrument(skip(self, request), fields(order = %request.order_context.order_number))]
    pub async fn cancel_all_reservations(
        &self,
        request: CancelAllReservationsRequest,
    ) -> Result<PaymentApiResponse> {
        Self::instrumented(
            "cancel_all_reservations",
            self.cancel_all_reservations_inner(request),
        )
        .await
    }

    async fn cancel_all_reservations_inner(
        &self,
        request: CancelAllReservationsRequest,
    ) -> Result<PaymentApiResponse> {
        ensure_selected(&request.instruments)?;

        let mut ledger = request.ledger.clone();
        let mut events = Vec::new();
        for instrument in dedup(&request.instruments) {
            let chains = ledger.open_chains(instrument.guid);
            if chains.is_empty() {
                continue;
            }
            let open = ledger.open_balance(instrument.guid);
            let cancel_request = CancelReservationRequest {
                instruments: vec![instrument.clone()],
                selected_payment_events_to_cancel: chains
                    .iter()
                    .map(|chain| chain.root_guid)
                    .collect(),
                amount: open,
                ledger: ledger.clone(),
                order_context: request.order_context.clone(),
                custom_request_data: request.custom_request_data.clone(),
            };
            let response = self.cancel_reservation_inner(cancel_request).await?;
            events.extend(response.events);
            ledger = response.ledger;
        }

        Ok(PaymentApiResponse { events, ledger })
    }

    /// Reverses settled charges on the selected instruments.
    ///
    /// The only operation with no reservation precondition: it undoes
    /// completed charges, not open holds.
    #[tracing::instrument(skip(self, request), fields(order = %request.order_context.order_number))]
    pub async fn credit(&self, request: CreditRequest) -> Result<PaymentApiResponse> {
        Self::instrumented("credit", self.credit_inner(request)).await
    }

    async fn credit_inner(&self, request: CreditRequest) -> Result<PaymentApiResponse> {
        ensure_selected(&request.selected_order_payment_instruments)?;
        ensure_currency(&request.amount, &request.ledger)?;

        let ledger = &request.ledger;
        let selected = dedup(&request.selected_order_payment_instruments);
        let refundable: Vec<(&OrderPaymentInstrument, Vec<ChainState>)> = selected
            .iter()
            .filter_map(|instrument| {
                let chains = ledger.refundable_chains(instrument.guid);
                (!chains.is_empty()).then(|| (*instrument, chains))
            })
            .collect();

        let refundable_total: Decimal = refundable
            .iter()
            .flat_map(|(_, chains)| chains)
            .map(|chain| chain.refundable().amount())
            .sum();
        let requested = request.amount.amount();
        if requested > refundable_total {
            return Err(OrchestrationError::CreditExceedsCharged {
                requested: request.amount.clone(),
                refundable: Money::new(refundable_total, ledger.currency_code()),
            });
        }
        if !request.amount.is_positive() {
            return Ok(PaymentApiResponse::new(ledger, Vec::new()));
        }

        let mut remaining = requested;
        let mut calls = Vec::new();
        for (instrument, chains) in refundable {
            if remaining <= Decimal::ZERO {
                break;
            }
            let mut portions = Vec::new();
            let mut call_amount = Decimal::ZERO;
            let mut charge_data: Option<HashMap<String, String>> = None;
            for chain in chains {
                if remaining <= Decimal::ZERO {
                    break;
                }
                for (charge_guid, charge_remaining) in chain.refundable_charges() {
                    if remaining <= Decimal::ZERO {
                        break;
                    }
                    let take = remaining.min(charge_remaining.amount());
                    if take <= Decimal::ZERO {
                        continue;
                    }
                    portions.push(Portion {
                        parent: Some(charge_guid),
                        transaction_type: TransactionType::Credit,
                        amount: take,
                    });
                    call_amount += take;
                    remaining -= take;
                    charge_data.get_or_insert_with(|| {
                        ledger
                            .events()
                            .iter()
                            .find(|event| event.guid == charge_guid)
                            .map(|event| event.event_data.clone())
                            .unwrap_or_default()
                    });
                }
            }
            if call_amount > Decimal::ZERO {
                calls.push(InstrumentCall {
                    instrument: instrument.clone(),
                    transaction_type: TransactionType::Credit,
                    amount: call_amount,
                    portions,
                    reservation_data: charge_data.unwrap_or_default(),
                    failure_status: PaymentStatus::Failed,
                    original_instrument: true,
                });
            }
        }

        let events = self
            .dispatch(calls, &request.order_context, &request.custom_request_data, ledger)
            .await;
        Ok(PaymentApiResponse::new(ledger, events))
    }

    /// Fans the planned calls out to the gateway, one per instrument, and
    /// turns each outcome into payment events.
    ///
    /// Calls run concurrently and independently; a failure or timeout on
    /// one instrument never aborts the others. Every call is bounded by the
    /// configured timeout and always leaves an auditable event.
    async fn dispatch(
        &self,
        calls: Vec<InstrumentCall>,
        order_context: &OrderContext,
        custom_request_data: &HashMap<String, String>,
        ledger: &Ledger,
    ) -> Vec<PaymentEvent> {
        let currency = ledger.currency_code();
        let prepared: Vec<(InstrumentCall, Vec<EventId>)> = calls
            .into_iter()
            .map(|call| {
                let guids: Vec<EventId> = call.portions.iter().map(|_| EventId::new()).collect();
                (call, guids)
            })
            .collect();

        let futures = prepared.iter().map(|(call, guids)| {
            let request = GatewayRequest {
                transaction_type: call.transaction_type,
                instrument: call.instrument.clone(),
                amount: Money::new(call.amount, currency),
                order_context: order_context.clone(),
                idempotency_key: IdempotencyKey::from_event(guids[0]),
                reservation_data: call.reservation_data.clone(),
                custom_request_data: custom_request_data.clone(),
            };
            async move { tokio::time::timeout(self.call_timeout, self.gateway.execute(request)).await }
        });
        let outcomes = join_all(futures).await;

        let mut events = Vec::new();
        for ((call, guids), outcome) in prepared.into_iter().zip(outcomes) {
            let (status, event_data) = match outcome {
                Ok(Ok(response)) => {
                    let mut data = response.data;
                    match response.status {
                        GatewayStatus::Approved => {
                            data.insert(
                                EVENT_DATA_PROVIDER_REFERENCE.to_string(),
                                response.provider_reference_id,
                            );
                            (PaymentStatus::Approved, data)
                        }
                        GatewayStatus::Declined => {
                            data.insert(
                                EVENT_DATA_PROVIDER_REFERENCE.to_string(),
                                response.provider_reference_id,
                            );
                            if let Some(detail) = response.error_detail {
                                data.insert(EVENT_DATA_ERROR_DETAIL.to_string(), detail);
                            }
                            (PaymentStatus::Declined, data)
                        }
                        GatewayStatus::Error => {
                            if let Some(detail) = response.error_detail {
                                data.insert(EVENT_DATA_ERROR_DETAIL.to_string(), detail);
                            }
                            (call.failure_status, data)
                        }
                    }
                }
                Ok(Err(err)) => (
                    call.failure_status,
                    HashMap::from([(EVENT_DATA_ERROR_DETAIL.to_string(), err.to_string())]),
                ),
                Err(_elapsed) => (
                    PaymentStatus::Failed,
                    HashMap::from([(EVENT_DATA_TIMEOUT.to_string(), "true".to_string())]),
                ),
            };

            if status == PaymentStatus::Approved {
                tracing::info!(
                    instrument = %call.instrument.guid,
                    operation = %call.transaction_type,
                    amount = %call.amount,
                    "gateway call approved"
                );
            } else {
                tracing::warn!(
                    instrument = %call.instrument.guid,
                    operation = %call.transaction_type,
                    status = %status,
                    "gateway call did not approve"
                );
            }

            let timestamp = Utc::now();
            for (portion, guid) in call.portions.iter().zip(guids) {
                events.push(PaymentEvent {
                    guid,
                    parent_guid: portion.parent,
                    reference_id: call.instrument.order_number.clone(),
                    order_payment_instrument: call.instrument.clone(),
                    original_instrument: call.original_instrument,
                    amount: Money::new(portion.amount, currency),
                    transaction_type: portion.transaction_type,
                    status,
                    timestamp,
                    sequence: 0,
                    event_data: event_data.clone(),
                });
            }
        }
        events
    }
}

fn ensure_selected(instruments: &[OrderPaymentInstrument]) -> Result<()> {
    if instruments.is_empty() {
        Err(OrchestrationError::NoInstrumentsSelected)
    } else {
        Ok(())
    }
}

fn ensure_currency(amount: &Money, ledger: &Ledger) -> Result<()> {
    if amount.currency_code() == ledger.currency_code() {
        Ok(())
    } else {
        Err(OrchestrationError::CurrencyMismatch {
            left: amount.currency_code().to_string(),
            right: ledger.currency_code().to_string(),
        })
    }
}

/// First occurrence of each instrument guid, preserving priority order.
fn dedup(instruments: &[OrderPaymentInstrument]) -> Vec<&OrderPaymentInstrument> {
    let mut seen: HashSet<OrderInstrumentId> = HashSet::new();
    instruments
        .iter()
        .filter(|instrument| seen.insert(instrument.guid))
        .collect()
}
