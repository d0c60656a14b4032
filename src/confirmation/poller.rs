use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::collaborators::{CartStore, Navigator, Notifier, OrderStatusSource};
use super::query::confirmation_path;
use super::state::{PollFailure, PollState};
use crate::config::settings::PollingConfig;
use crate::error::AppError;
use crate::models::{OrderStatusResponse, ResolvedStatus};

pub const ORDER_CONFIRMED_MESSAGE: &str = "Payment successful! Your order has been placed.";
pub const CART_CLEAR_WARNING: &str = "Your order was placed, but we couldn't clear your cart.";

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollerConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            poll_interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// What one resolver answer means for the session.
#[derive(Debug)]
enum Step {
    Complete(String),
    Retry,
    Fail(PollFailure),
}

impl Step {
    fn from_response(result: Result<OrderStatusResponse, AppError>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(e) => return Step::Fail(PollFailure::Transport(e.to_string())),
        };

        if !response.success {
            return Step::Fail(PollFailure::Reported(response.error));
        }

        match (response.status, response.order_id) {
            (ResolvedStatus::Completed, Some(order_id)) => Step::Complete(order_id),
            (ResolvedStatus::Completed, None) => Step::Fail(PollFailure::InvalidResponse(
                "completed status without an order id".to_string(),
            )),
            // An order row exists but is not confirmed yet; the customer
            // still gets the success path.
            (ResolvedStatus::Processing, Some(order_id)) => Step::Complete(order_id),
            (ResolvedStatus::Processing, None) | (ResolvedStatus::NotFound, _) => Step::Retry,
            (ResolvedStatus::Failed, _) => Step::Fail(PollFailure::Reported(response.error)),
        }
    }
}

/// Drives the confirmation page: polls the resolver until the payment turns
/// into an order, fails, or the attempt budget runs out.
///
/// One poller is one session. Cancelling its token (the page going away)
/// stops the session at the next suspension point without further effects.
pub struct PaymentConfirmationPoller {
    config: PollerConfig,
    source: Arc<dyn OrderStatusSource>,
    cart: Arc<dyn CartStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    cancellation: CancellationToken,
    state: watch::Sender<PollState>,
}

impl PaymentConfirmationPoller {
    pub fn new(
        config: PollerConfig,
        source: Arc<dyn OrderStatusSource>,
        cart: Arc<dyn CartStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            config,
            source,
            cart,
            notifier,
            navigator,
            cancellation: CancellationToken::new(),
            state,
        }
    }

    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    /// Live view of the session state, e.g. for the attempt counter.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Tears the session down. Pending waits and in-flight calls are dropped.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Runs the session to a terminal state (or until cancelled) and returns
    /// the final state. Only the first call drives the session; later or
    /// concurrent calls return the current state without side effects.
    pub async fn run(&self, payment_intent_id: Option<&str>) -> PollState {
        let Some(payment_intent_id) = payment_intent_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            let failure = PollFailure::MissingPaymentIntent;
            if self.claim(PollState::Failed(failure.clone())) {
                self.report_failure(&failure);
            } else {
                warn!(state = %self.state(), "Confirmation session already started");
            }
            return self.state();
        };

        if self.cancellation.is_cancelled() {
            return self.state();
        }

        if !self.claim(PollState::Processing { attempt: 1 }) {
            warn!(state = %self.state(), "Confirmation session already started");
            return self.state();
        }

        info!(payment_intent_id = payment_intent_id, "Starting payment confirmation");

        let mut attempt: u32 = 1;
        loop {
            debug!(payment_intent_id = payment_intent_id, attempt = attempt, "Checking order status");

            let result = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    debug!(attempt = attempt, "Confirmation cancelled during status call");
                    return self.state();
                }
                result = self.source.resolve_order_status(payment_intent_id) => result,
            };

            if self.cancellation.is_cancelled() {
                return self.state();
            }

            match Step::from_response(result) {
                Step::Complete(order_id) => {
                    self.complete(payment_intent_id, order_id).await;
                    return self.state();
                }
                Step::Fail(failure) => {
                    self.fail(failure);
                    return self.state();
                }
                Step::Retry if attempt >= self.config.max_attempts => {
                    warn!(
                        payment_intent_id = payment_intent_id,
                        attempts = attempt,
                        "Order not confirmed within the attempt budget"
                    );
                    self.fail(PollFailure::TimedOut);
                    return self.state();
                }
                Step::Retry => {
                    tokio::select! {
                        biased;
                        _ = self.cancellation.cancelled() => {
                            debug!(attempt = attempt, "Confirmation cancelled while waiting");
                            return self.state();
                        }
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }

            if self.cancellation.is_cancelled() {
                return self.state();
            }

            attempt += 1;
            if !self.transition(PollState::Processing { attempt }) {
                debug!(attempt = attempt, state = %self.state(), "Session moved on without this loop");
                return self.state();
            }
        }
    }

    /// Moves out of `Idle`. Fails if any other caller already did.
    fn claim(&self, first: PollState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == PollState::Idle && current.can_transition_to(&first) {
                *current = first;
                true
            } else {
                false
            }
        })
    }

    fn transition(&self, next: PollState) -> bool {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    fn fail(&self, failure: PollFailure) {
        if self.transition(PollState::Failed(failure.clone())) {
            self.report_failure(&failure);
        }
    }

    fn report_failure(&self, failure: &PollFailure) {
        warn!(failure = %failure, "Payment confirmation failed");
        self.notifier.error(failure.user_message());
    }

    async fn complete(&self, payment_intent_id: &str, order_id: String) {
        if !self.transition(PollState::Completed { order_id: order_id.clone() }) {
            return;
        }

        info!(
            payment_intent_id = payment_intent_id,
            order_id = %order_id,
            "Order confirmed"
        );

        if let Err(e) = self.cart.clear_cart().await {
            warn!(order_id = %order_id, error = %e, "Failed to clear cart after confirmed order");
            self.notifier.warning(CART_CLEAR_WARNING);
        }

        if self.cancellation.is_cancelled() {
            debug!(order_id = %order_id, "Confirmation torn down before navigation");
            return;
        }

        self.notifier.success(ORDER_CONFIRMED_MESSAGE);
        self.navigator.navigate(&confirmation_path(&order_id));
    }
}
