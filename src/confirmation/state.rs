use std::fmt;

pub const MISSING_PAYMENT_INFO_MESSAGE: &str = "Payment information missing from URL";
pub const TIMED_OUT_MESSAGE: &str =
    "Payment processing is taking longer than expected. Please check your orders shortly.";
pub const STATUS_UNAVAILABLE_MESSAGE: &str =
    "Unable to confirm payment status. Please check your orders.";
pub const PAYMENT_FAILED_FALLBACK_MESSAGE: &str = "Payment processing failed";

/// Attempts after which the confirmation view shows the attempt counter.
pub const ATTEMPT_DIAGNOSTICS_THRESHOLD: u32 = 2;

/// Links offered on the failure screen.
pub const FAILURE_LINKS: [(&str, &str); 2] = [("My orders", "/account/orders"), ("Support", "/support")];

/// Why a confirmation session ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollFailure {
    /// No payment intent id in the incoming parameters.
    MissingPaymentIntent,
    /// The status call itself errored.
    Transport(String),
    /// The resolver reported a failed payment, with its message if any.
    Reported(Option<String>),
    /// Attempts ran out while the order was still processing.
    TimedOut,
    /// The resolver answered with a shape the flow cannot act on.
    InvalidResponse(String),
}

impl PollFailure {
    /// Message shown to the customer. Internal details never leak here.
    pub fn user_message(&self) -> &str {
        match self {
            PollFailure::MissingPaymentIntent => MISSING_PAYMENT_INFO_MESSAGE,
            PollFailure::Transport(_) | PollFailure::InvalidResponse(_) => STATUS_UNAVAILABLE_MESSAGE,
            PollFailure::Reported(Some(message)) if !message.trim().is_empty() => message,
            PollFailure::Reported(_) => PAYMENT_FAILED_FALLBACK_MESSAGE,
            PollFailure::TimedOut => TIMED_OUT_MESSAGE,
        }
    }
}

impl fmt::Display for PollFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollFailure::Transport(detail) => write!(f, "transport error: {}", detail),
            PollFailure::InvalidResponse(detail) => write!(f, "invalid response: {}", detail),
            other => f.write_str(other.user_message()),
        }
    }
}

/// Lifecycle of one confirmation session.
///
/// `Completed` and `Failed` are absorbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Processing { attempt: u32 },
    Completed { order_id: String },
    Failed(PollFailure),
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Completed { .. } | PollState::Failed(_))
    }

    pub fn can_transition_to(&self, next: &PollState) -> bool {
        match (self, next) {
            (PollState::Idle, PollState::Processing { attempt }) => *attempt == 1,
            (PollState::Idle, PollState::Failed(_)) => true,
            (PollState::Processing { attempt }, PollState::Processing { attempt: next_attempt }) => {
                *next_attempt == attempt + 1
            }
            (PollState::Processing { .. }, PollState::Completed { .. }) => true,
            (PollState::Processing { .. }, PollState::Failed(_)) => true,
            _ => false,
        }
    }

    pub fn attempt(&self) -> Option<u32> {
        match self {
            PollState::Processing { attempt } => Some(*attempt),
            _ => None,
        }
    }

    pub fn shows_attempt_diagnostics(&self) -> bool {
        self.attempt()
            .is_some_and(|attempt| attempt > ATTEMPT_DIAGNOSTICS_THRESHOLD)
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            PollState::Failed(failure) => Some(failure.user_message()),
            _ => None,
        }
    }

    pub fn failure_links(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PollState::Failed(_) => &FAILURE_LINKS,
            _ => &[],
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Idle => f.write_str("idle"),
            PollState::Processing { attempt } => write!(f, "processing (attempt {})", attempt),
            PollState::Completed { order_id } => write!(f, "completed (order {})", order_id),
            PollState::Failed(failure) => write!(f, "failed: {}", failure),
        }
    }
}
