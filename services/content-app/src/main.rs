//! Gatehouse Content App
//!
//! Terminal front end for subscription-gated content. Signs the user in
//! against Firebase Authentication, reads plans, subscriptions and content
//! from Firestore, and hands checkout and the billing portal off to Stripe.
//!
//! ## Commands
//!
//! - `signin <email> <password>` - Sign in
//! - `subscribe <price_id>` - Start a checkout for a price tier
//! - `portal` - Open the billing portal
//! - `signout` - Sign out
//! - `show` - Print the current view
//! - `quit` - Exit
//!
//! Every view change is printed to stdout; logs go to stderr.

mod commands;
mod config;
mod navigator;

use std::sync::Arc;

use gatehouse_auth::{AuthConfig, FirebaseAuth};
use gatehouse_billing::{CallableFunctions, StripeCheckout};
use gatehouse_client::{render, ClientError, Dashboard, Services};
use gatehouse_store::FirestoreRestStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP};
use crate::config::Config;
use crate::navigator::TerminalNavigator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("content_app=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Gatehouse content app");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        project_id = %config.firebase.project_id,
        origin = %config.client.origin,
        "Configuration loaded"
    );

    gatehouse_client::metrics::describe_metrics();

    // Session
    let auth = Arc::new(FirebaseAuth::new(AuthConfig::from(&config.firebase)));

    // Database
    let store = Arc::new(
        FirestoreRestStore::new(&config.firebase.project_id)
            .with_token_source(auth.clone())
            .with_poll_interval(config.poll_interval),
    );

    // Payments
    let navigator = Arc::new(TerminalNavigator);
    let checkout = Arc::new(StripeCheckout::new(config.stripe.clone(), navigator.clone())?);
    let functions =
        Arc::new(CallableFunctions::new(config.functions.clone()).with_token_source(auth.clone()));

    let dashboard = Dashboard::spawn(Services::new(
        config.client.clone(),
        store,
        auth.clone(),
        checkout,
        functions,
        navigator,
    ));

    // Print every view change
    let mut view = dashboard.watch();
    let renderer = tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let text = render(&view.borrow_and_update());
            println!("{text}");
        }
    });

    println!("{HELP}");
    tokio::select! {
        result = command_loop(&auth, &dashboard) => result?,
        _ = shutdown_signal() => {}
    }

    renderer.abort();
    drop(dashboard);
    tracing::info!("Content app shutdown complete");
    Ok(())
}

async fn command_loop(auth: &FirebaseAuth, dashboard: &Dashboard) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match command {
            Command::SignIn { email, password } => {
                if let Err(e) = auth.sign_in_with_password(&email, &password).await {
                    tracing::warn!(error = %e, "sign-in failed");
                    eprintln!("Sign-in failed: {e}");
                }
            }
            Command::Subscribe(price) => report(dashboard.subscribe(price).await),
            Command::Portal => report(dashboard.open_portal().await),
            Command::SignOut => report(dashboard.sign_out().await),
            Command::Show => println!("{}", render(&dashboard.snapshot())),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}

/// Print why a command was not accepted
fn report(result: Result<(), ClientError>) {
    if let Err(e) = result {
        eprintln!("{e}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
