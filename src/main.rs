//! CircleBet Core Simulation.
//!
//! Walks the engine through the full platform lifecycle: circle setup,
//! previews, trading, selling, resolution payouts, and standings.

use circlebet_core::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("CircleBet Core Engine Simulation");
    println!("Circles, LMSR Markets, Full Lifecycle\n");

    scenario_1_preview_and_buy();
    scenario_2_two_sided_market();
    scenario_3_selling_back();
    scenario_4_resolution_payouts();
    scenario_5_leaderboard();
    scenario_6_concurrent_traders();

    println!("\nAll simulations completed successfully.");
}

fn day_from_now() -> Timestamp {
    Timestamp::from_millis(Timestamp::now().as_millis() + 86_400_000)
}

/// Preview a trade, then execute it and compare.
fn scenario_1_preview_and_buy() {
    println!("Scenario 1: Preview and Buy\n");

    let engine = Engine::new(EngineConfig::default());
    let alice = UserId(1);
    let circle = engine.create_circle("office pool", alice);
    let market = engine
        .create_market(circle, alice, "Will it rain on Saturday?", "", day_from_now(), None)
        .unwrap();

    let detail = engine.market_detail(market).unwrap();
    println!("  Fresh market: YES {} / NO {}", detail.price_yes, detail.price_no);

    let preview = engine
        .preview_trade(market, Side::Yes, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(50))))
        .unwrap();
    println!(
        "  $50 YES preview: {} shares, impact {:.2}%",
        preview.shares,
        preview.price_impact * dec!(100)
    );

    let receipt = engine
        .execute_trade(market, alice, Side::Yes, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(50))))
        .unwrap();
    println!(
        "  Executed: {} shares @ {} -> YES now {}, balance ${}\n",
        receipt.shares, receipt.price_at_trade, receipt.new_price_yes, receipt.new_balance
    );
}

/// Two traders on opposite sides move the price against each other.
fn scenario_2_two_sided_market() {
    println!("Scenario 2: Two-Sided Market\n");

    let engine = Engine::new(EngineConfig::default());
    let alice = UserId(1);
    let bob = UserId(2);
    let circle = engine.create_circle("office pool", alice);
    engine.join_circle(circle, bob).unwrap();
    let market = engine
        .create_market(circle, alice, "Launch ships this quarter?", "", day_from_now(), None)
        .unwrap();

    engine
        .execute_trade(market, alice, Side::Yes, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(200))))
        .unwrap();
    println!("  Alice buys $200 YES");

    let receipt = engine
        .execute_trade(market, bob, Side::No, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(150))))
        .unwrap();
    println!("  Bob buys $150 NO");
    println!(
        "  Market now YES {} / NO {}",
        receipt.new_price_yes, receipt.new_price_no
    );

    let detail = engine.market_detail(market).unwrap();
    println!(
        "  Volume: ${} YES, ${} NO, {} YES bettors, {} NO bettors\n",
        detail.volume_yes, detail.volume_no, detail.yes_bettors, detail.no_bettors
    );
}

/// Buying then selling the same shares is exactly reversible (no fees).
fn scenario_3_selling_back() {
    println!("Scenario 3: Selling Back\n");

    let engine = Engine::new(EngineConfig::default());
    let alice = UserId(1);
    let circle = engine.create_circle("office pool", alice);
    let market = engine
        .create_market(circle, alice, "Bitcoin above 100k by June?", "", day_from_now(), None)
        .unwrap();

    let bought = engine
        .execute_trade(market, alice, Side::No, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(120))))
        .unwrap();
    println!("  Bought {} NO shares for $120", bought.shares);

    let sold = engine
        .execute_trade(market, alice, Side::No, Direction::Sell, OrderSize::Shares(bought.shares))
        .unwrap();
    println!(
        "  Sold them back for ${}, balance ${}\n",
        sold.amount, sold.new_balance
    );
}

/// Resolution converts winning shares at $1 and zeroes every position.
fn scenario_4_resolution_payouts() {
    println!("Scenario 4: Resolution Payouts\n");

    let engine = Engine::new(EngineConfig::default());
    let alice = UserId(1);
    let bob = UserId(2);
    let carol = UserId(3);
    let circle = engine.create_circle("office pool", alice);
    engine.join_circle(circle, bob).unwrap();
    engine.join_circle(circle, carol).unwrap();
    let market = engine
        .create_market(circle, alice, "Will the demo work?", "", day_from_now(), None)
        .unwrap();

    engine
        .execute_trade(market, bob, Side::Yes, Direction::Buy, OrderSize::Shares(Shares::new(dec!(10))))
        .unwrap();
    engine
        .execute_trade(market, bob, Side::No, Direction::Buy, OrderSize::Shares(Shares::new(dec!(5))))
        .unwrap();
    engine
        .execute_trade(market, carol, Side::No, Direction::Buy, OrderSize::Shares(Shares::new(dec!(25))))
        .unwrap();
    println!("  Bob holds 10 YES + 5 NO, Carol holds 25 NO");

    let report = engine.resolve_market(market, alice, Side::Yes).unwrap();
    println!(
        "  Resolved YES: {} holders paid, ${} total",
        report.holders_paid, report.total_paid
    );
    println!(
        "  Bob ${}, Carol ${}\n",
        engine.ledger().balance(circle, bob).unwrap(),
        engine.ledger().balance(circle, carol).unwrap()
    );
}

/// Standings after a market settles.
fn scenario_5_leaderboard() {
    println!("Scenario 5: Leaderboard\n");

    let engine = Engine::new(EngineConfig::default());
    let alice = UserId(1);
    let circle = engine.create_circle("office pool", alice);
    for user in [UserId(2), UserId(3), UserId(4)] {
        engine.join_circle(circle, user).unwrap();
    }
    let market = engine
        .create_market(circle, alice, "Team wins the finals?", "", day_from_now(), None)
        .unwrap();

    engine
        .execute_trade(market, UserId(2), Side::Yes, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(400))))
        .unwrap();
    engine
        .execute_trade(market, UserId(3), Side::No, Direction::Buy, OrderSize::Spend(Dollars::new(dec!(300))))
        .unwrap();
    engine.resolve_market(market, alice, Side::Yes).unwrap();

    for entry in engine.leaderboard(circle).unwrap() {
        println!("  #{} user {} ${}", entry.rank, entry.user_id.0, entry.balance);
    }
    println!();
}

/// Concurrent orders on one market serialize; none are lost.
fn scenario_6_concurrent_traders() {
    println!("Scenario 6: Concurrent Traders\n");

    let engine = Arc::new(Engine::new(EngineConfig::default()));
    let alice = UserId(1);
    let circle = engine.create_circle("office pool", alice);
    let market = engine
        .create_market(circle, alice, "Crowded market", "", day_from_now(), None)
        .unwrap();

    let traders = 8;
    for i in 2..=traders + 1 {
        engine.join_circle(circle, UserId(i)).unwrap();
    }

    std::thread::scope(|scope| {
        for i in 2..=traders + 1 {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                engine
                    .execute_trade(
                        market,
                        UserId(i),
                        Side::Yes,
                        Direction::Buy,
                        OrderSize::Shares(Shares::new(dec!(1))),
                    )
                    .unwrap();
            });
        }
    });

    let detail = engine.market_detail(market).unwrap();
    println!(
        "  {} concurrent 1-share buys -> q_yes = {} (no lost updates)\n",
        traders, detail.q_yes
    );
}
