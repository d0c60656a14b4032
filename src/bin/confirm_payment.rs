//! Runs the payment confirmation flow against a running order server.
//!
//! Usage: `confirm-payment <return-url | query-string>`

use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;

use storefront_orders::clients::OrderStatusClient;
use storefront_orders::config::ClientSettings;
use storefront_orders::confirmation::{
    payment_intent_from_query, payment_intent_from_url, InMemoryCart, LogNotifier, Navigator,
    PaymentConfirmationPoller, PollState, PollerConfig,
};
use storefront_orders::utils::new_api_client;

/// Prints where the storefront would send the customer.
struct TerminalNavigator {
    base_url: String,
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        println!("Redirecting to {}{}", self.base_url, path);
    }
}

fn payment_intent_from_arg(arg: &str) -> Option<String> {
    if arg.contains("://") {
        payment_intent_from_url(arg)
    } else {
        payment_intent_from_query(arg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = ClientSettings::from_env().context("Failed to load client settings")?;
    let arg = std::env::args().nth(1).unwrap_or_default();
    let payment_intent_id = payment_intent_from_arg(&arg);

    let http_client = new_api_client().context("Failed to build HTTP client")?;
    let client = OrderStatusClient::new(http_client, settings.server_base_url.clone());
    let base_url = client.base_url().to_string();

    let poller = PaymentConfirmationPoller::new(
        PollerConfig::from(&settings.polling),
        Arc::new(client),
        Arc::new(InMemoryCart::new()),
        Arc::new(LogNotifier),
        Arc::new(TerminalNavigator { base_url }),
    );

    let token = poller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, cancelling confirmation");
            token.cancel();
        }
    });

    let mut progress = poller.subscribe();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let state = progress.borrow_and_update().clone();
            if state.shows_attempt_diagnostics() {
                println!("Still confirming your payment... ({})", state);
            }
        }
    });

    let state = poller.run(payment_intent_id.as_deref()).await;
    println!("Final state: {}", state);

    match &state {
        PollState::Failed(_) => {
            if let Some(message) = state.failure_message() {
                eprintln!("{}", message);
            }
            for (label, path) in state.failure_links() {
                eprintln!("  {}: {}{}", label, settings.server_base_url, path);
            }
            std::process::exit(1);
        }
        PollState::Completed { .. } => Ok(()),
        PollState::Idle | PollState::Processing { .. } => {
            anyhow::bail!("Confirmation cancelled before it finished")
        }
    }
}
