//! Blind auction protocol demo.
//!
//! Exercises the full bid lifecycle in-process over the in-memory adapters:
//! connect → FHE session init → encrypted bid submission → registry refresh →
//! verified reveal, including the already-verified race outcome.
//!
//! Run with: `cargo run --bin demo [config.toml]`

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::Context as _;
use serde::Deserialize;

use blind_auction::adapters::mock_gateway::MockFheGateway;
use blind_auction::adapters::mock_ledger::MockLedger;
use blind_auction::adapters::mock_wallet::MockWallet;
use blind_auction::domain::BidAmount;
use blind_auction::lifecycle::{BidLifecycleController, PlaceBid};
use blind_auction::registry::BidRegistry;
use blind_auction::session::FheSession;
use blind_auction::status::StatusReporter;

/// Demo configuration, loaded from TOML when a path is given.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// Auction contract address used as the encryption context.
    context: Address,
    /// Dwell time for success toasts, in seconds.
    success_dwell_secs: u64,
    /// Dwell time for error toasts, in seconds.
    error_dwell_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            context: Address::repeat_byte(0x11),
            success_dwell_secs: 2,
            error_dwell_secs: 3,
        }
    }
}

fn load_config() -> anyhow::Result<DemoConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {path}"))
        }
        None => Ok(DemoConfig::default()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Init tracing without timestamps so the demo output stays clean.
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    println!("=== FHE Blind Auction Lifecycle Demo ===\n");

    // ── Wiring ──
    let bidder = Address::repeat_byte(0x22);
    let ledger = Arc::new(MockLedger::new());
    let gateway = Arc::new(MockFheGateway::new());
    let wallet = Arc::new(MockWallet::connected(bidder));
    let registry = Arc::new(BidRegistry::new(Arc::clone(&ledger)));
    let session = Arc::new(FheSession::new(Arc::clone(&gateway)));
    let status = StatusReporter::with_dwell(
        Duration::from_secs(config.success_dwell_secs),
        Duration::from_secs(config.error_dwell_secs),
    );
    let controller = BidLifecycleController::new(
        Arc::clone(&ledger),
        Arc::clone(&session),
        wallet,
        Arc::clone(&registry),
        status,
        config.context,
    );

    // ── Connect: lazy FHE session init ──
    println!("[Connect] Initializing FHE session...");
    let outcome = controller.handle_connect().await?;
    println!("  outcome: {outcome:?}\n");

    // ── Place encrypted bids ──
    println!("[Bid] Placing blind bids...");
    let vase = controller
        .place_bid(PlaceBid::new("Vase", BidAmount::new(50), "antique vase"))
        .await?;
    println!("  placed {} (amount mirror: {})", vase.id, vase.public_value1);

    let clock = controller
        .place_bid(PlaceBid::parse("Clock", "120.9", "wall clock")?)
        .await?;
    println!(
        "  placed {} (fractional input truncated to {})",
        clock.id, clock.public_value1
    );

    let snap = registry.snapshot().await;
    println!(
        "\n[Stats] total={} active={} volume={} avg={:.1}",
        snap.stats.total_count,
        snap.stats.active_count,
        snap.stats.total_volume,
        snap.stats.average_bid
    );

    // ── Reveal ──
    println!("\n[Reveal] Requesting authenticated decryption for the vase bid...");
    let revealed = controller.reveal_bid(&vase.id).await?;
    println!("  revealed cleartext: {revealed:?}");

    // Second reveal takes the idempotent fast path: no network calls.
    let again = controller.reveal_bid(&vase.id).await?;
    println!("  repeat reveal (fast path): {again:?}");

    let snap = registry.snapshot().await;
    let record = snap
        .record(&vase.id)
        .context("vase record missing from snapshot")?;
    println!(
        "\n[Verify] {}: verified={} decrypted_value={:?}",
        record.id,
        record.is_verified,
        record.revealed_value()
    );
    println!(
        "[History] {} entries (append-only across refreshes)",
        snap.history.len()
    );

    println!("\n=== Demo completed successfully ===");
    Ok(())
}
