//! End-to-end flows: place bets from the board, poll until results are
//! published, check payouts, persistence, and that nothing pays twice.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

use betsim::engine::cycle::Poller;
use betsim::engine::placement::{BetSlip, Selection};
use betsim::engine::settlement::SettlementEngine;
use betsim::feed::snapshot::{SnapshotLocation, SnapshotSource};
use betsim::feed::MatchSource;
use betsim::odds::{synthetic_odds, OddsPolicy};
use betsim::render::TextRenderer;
use betsim::storage::{self, JsonFileStore, KeyValueStore, MemoryStore};
use betsim::types::*;

use crate::mock_source::MockSource;

fn poller(source: &MockSource) -> Poller {
    Poller::new(
        Box::new(source.clone()),
        Box::new(MemoryStore::new()),
        Box::new(TextRenderer::new(std::io::sink(), "R$")),
        OddsPolicy::default(),
        None,
    )
}

async fn place(source: &MockSource, book: &mut Book, match_id: &str, pick: Pick, stake: Decimal) -> Bet {
    let feed = source.fetch().await.unwrap();
    let m = feed.find_upcoming(match_id).unwrap();
    let mut slip = BetSlip::new();
    slip.select(Selection::from_match(m, pick, &OddsPolicy::default()).unwrap());
    slip.place(book, stake, Utc::now()).unwrap()
}

fn temp_path(tag: &str) -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("betsim_it_{tag}_{}.json", uuid::Uuid::new_v4()));
    p
}

#[tokio::test]
async fn test_bet_stays_open_until_result_published() {
    let source = MockSource::new();
    let mut poller = poller(&source);
    let mut book = Book::new(dec!(250));

    place(&source, &mut book, "PL-001", Pick::Home, dec!(50)).await;
    assert_eq!(book.wallet.balance, dec!(200));

    let report = poller.run_cycle(&mut book).await.unwrap();
    assert!(!report.persisted);
    assert_eq!(book.bets[0].status, BetStatus::Open);

    source.publish_result("PL-001", 2, 1);
    let report = poller.run_cycle(&mut book).await.unwrap();
    assert_eq!(report.bets_won, 1);
    assert_eq!(report.credited, dec!(100));
    assert_eq!(book.bets[0].status, BetStatus::Won);
    assert_eq!(book.wallet.balance, dec!(300));

    // Results stay in the feed; later cycles must not pay again.
    let report = poller.run_cycle(&mut book).await.unwrap();
    assert!(!report.persisted);
    assert_eq!(book.wallet.balance, dec!(300));
}

#[tokio::test]
async fn test_draw_loses_home_bet() {
    let source = MockSource::new();
    let mut poller = poller(&source);
    let mut book = Book::new(dec!(250));

    place(&source, &mut book, "PL-001", Pick::Home, dec!(50)).await;
    source.publish_result("PL-001", 1, 1);
    let report = poller.run_cycle(&mut book).await.unwrap();

    assert_eq!(report.bets_lost, 1);
    assert_eq!(book.bets[0].status, BetStatus::Lost);
    assert_eq!(book.wallet.balance, dec!(200));
}

#[tokio::test]
async fn test_opposing_bets_same_match_single_pass() {
    let source = MockSource::new();
    let mut poller = poller(&source);
    let mut book = Book::new(dec!(100));

    let home = place(&source, &mut book, "PL-001", Pick::Home, dec!(20)).await;
    let away = place(&source, &mut book, "PL-001", Pick::Away, dec!(30)).await;
    assert_eq!(book.wallet.balance, dec!(50));

    source.publish_result("PL-001", 3, 1);
    let report = poller.run_cycle(&mut book).await.unwrap();

    assert_eq!(report.bets_won, 1);
    assert_eq!(report.bets_lost, 1);
    let status = |id: uuid::Uuid| book.bets.iter().find(|b| b.id == id).unwrap().status;
    assert_eq!(status(home.id), BetStatus::Won);
    assert_eq!(status(away.id), BetStatus::Lost);
    assert_eq!(book.wallet.balance, dec!(90));
}

#[tokio::test]
async fn test_feed_outage_defers_settlement() {
    let source = MockSource::new();
    let mut poller = poller(&source);
    let mut book = Book::new(dec!(100));

    place(&source, &mut book, "PL-002", Pick::Away, dec!(10)).await;
    source.publish_result("PL-002", 0, 2);
    source.set_error("503 Service Unavailable");

    let report = poller.run_cycle(&mut book).await.unwrap();
    assert!(!report.feed_ok);
    assert_eq!(book.bets[0].status, BetStatus::Open);

    source.clear_error();
    let report = poller.run_cycle(&mut book).await.unwrap();
    assert!(report.feed_ok);
    assert_eq!(book.bets[0].status, BetStatus::Won);
    assert_eq!(book.wallet.balance, dec!(117.50));
    assert_eq!(poller.cycles(), 2);
}

#[tokio::test]
async fn test_synthetic_odds_bet_settles() {
    let source = MockSource::new();
    let mut poller = poller(&source);
    let mut book = Book::new(dec!(100));

    let bet = place(&source, &mut book, "BSA-001", Pick::Draw, dec!(10)).await;
    assert_eq!(bet.odd, synthetic_odds("BSA-001").draw);

    source.publish_result("BSA-001", 0, 0);
    poller.run_cycle(&mut book).await.unwrap();
    assert_eq!(book.wallet.balance, dec!(90) + bet.potential_return);
}

#[tokio::test]
async fn test_settled_state_persisted_by_cycle() {
    let source = MockSource::new();
    let mut poller = poller(&source);
    let mut book = Book::new(dec!(250));

    place(&source, &mut book, "PL-001", Pick::Away, dec!(25)).await;
    source.publish_result("PL-001", 0, 1);
    poller.run_cycle(&mut book).await.unwrap();

    let saved = storage::load_book(poller.store(), dec!(0)).unwrap();
    assert_eq!(saved.wallet.balance, dec!(320));
    assert_eq!(saved.bets[0].status, BetStatus::Won);
    let raw = poller.store().get(storage::BALANCE_KEY).unwrap().unwrap();
    assert_eq!(raw.parse::<Decimal>().unwrap(), dec!(320));
}

#[tokio::test]
async fn test_restart_does_not_double_pay() {
    let path = temp_path("restart");
    let source = MockSource::new();

    {
        let mut store = JsonFileStore::open(&path).unwrap();
        let mut book = storage::load_book(&store, dec!(250)).unwrap();
        place(&source, &mut book, "PL-001", Pick::Home, dec!(50)).await;
        storage::save_book(&mut store, &book).unwrap();
    }

    source.publish_result("PL-001", 2, 0);
    let finished = source.fetch().await.unwrap().finished;

    // First process settles and saves.
    {
        let mut store = JsonFileStore::open(&path).unwrap();
        let book = storage::load_book(&store, dec!(250)).unwrap();
        let s = SettlementEngine::settle(&book.bets, &finished, &book.wallet);
        assert!(s.changed);
        let book = Book { wallet: s.wallet, bets: s.bets };
        storage::save_book(&mut store, &book).unwrap();
    }

    // Second process sees the same results again.
    let store = JsonFileStore::open(&path).unwrap();
    let book = storage::load_book(&store, dec!(250)).unwrap();
    let s = SettlementEngine::settle(&book.bets, &finished, &book.wallet);
    assert!(!s.changed);
    assert_eq!(s.wallet.balance, dec!(300));

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_malformed_snapshot_settles_nothing() {
    let path = temp_path("snapshot");
    std::fs::write(&path, r#"{"upcoming": [], "finished": "not a list"}"#).unwrap();

    let source = SnapshotSource::new(SnapshotLocation::File(path.clone()), Duration::from_secs(5)).unwrap();
    let feed = source.fetch().await.unwrap();
    assert!(feed.is_empty());

    let bets = vec![Bet {
        id: uuid::Uuid::new_v4(),
        match_id: "PL-001".into(),
        pick: Pick::Home,
        selection_label: "Arsenal FC".into(),
        odd: dec!(2),
        stake: dec!(10),
        potential_return: dec!(20),
        status: BetStatus::Open,
        placed_at: Utc::now(),
    }];
    let s = SettlementEngine::settle(&bets, &feed.finished, &Wallet::new(dec!(0)));
    assert!(!s.changed);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_overdraw_rejected_end_to_end() {
    let source = MockSource::new();
    let mut book = Book::new(dec!(20));

    let feed = source.fetch().await.unwrap();
    let m = feed.find_upcoming("PL-002").unwrap();
    let mut slip = BetSlip::new();
    slip.select(Selection::from_match(m, Pick::Draw, &OddsPolicy::default()).unwrap());

    let err = slip.place(&mut book, dec!(25), Utc::now()).unwrap_err();
    assert!(err.to_string().contains("Insufficient"));
    assert_eq!(book.wallet.balance, dec!(20));
    assert!(book.bets.is_empty());
}

#[test]
fn test_memory_store_is_key_value_store() {
    let mut store = MemoryStore::new();
    store.set("k", "v".into()).unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    store.remove("k").unwrap();
    assert!(store.get("k").unwrap().is_none());
}
