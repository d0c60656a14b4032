//! Client-side payment confirmation: turns a checkout redirect into either an
//! order confirmation or a failure screen.

pub mod cart;
pub mod collaborators;
pub mod poller;
pub mod query;
pub mod state;

pub use cart::{CartItem, InMemoryCart};
pub use collaborators::{CartStore, LogNotifier, Navigator, Notifier, OrderStatusSource};
pub use poller::{PaymentConfirmationPoller, PollerConfig};
pub use query::{confirmation_path, payment_intent_from_query, payment_intent_from_url};
pub use state::{PollFailure, PollState};
