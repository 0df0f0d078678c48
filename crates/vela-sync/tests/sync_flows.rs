//! End-to-end stream flows over the session stores.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::sync::mpsc;

use vela_core::{BalanceEntry, TransactionId};
use vela_store::SessionStores;
use vela_sync::{
    BalanceSyncWorker, HistoryLoader, StreamEvent, SyncConfig, WalletSyncWorker, WorkerState,
};
use vela_testkit::{account, tx, MockLedgerGateway, StaticIdentityLoader};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("vela_sync=debug,vela_store=trace")
        .with_test_writer()
        .try_init();
}

async fn next_event(rx: &mut mpsc::Receiver<StreamEvent>) -> StreamEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Account cached at 100 moves to 150: one optimistic emission, one
/// confirmed emission, then silence while nothing changes.
#[tokio::test]
async fn balance_change_escalates_once_then_goes_quiet() {
    init_tracing();
    let mock = Arc::new(MockLedgerGateway::new());
    let x = account("x");
    mock.set_balance(&x, 100);

    let stores = SessionStores::new();
    let (events, mut rx) = mpsc::channel(64);
    let worker = BalanceSyncWorker::new(
        SyncConfig::for_testing(),
        mock.clone(),
        stores.balances.clone(),
        Arc::new(StaticIdentityLoader::session("principal")),
        events,
    );
    worker.start(vec![x.clone()]).await.unwrap();

    // Bootstrap: the empty snapshot makes everything "changed" once.
    assert_matches!(
        next_event(&mut rx).await,
        StreamEvent::Balances { entries } if entries == vec![(x.clone(), BalanceEntry::uncertified(100))]
    );
    assert_matches!(
        next_event(&mut rx).await,
        StreamEvent::Balances { entries } if entries == vec![(x.clone(), BalanceEntry::certified(100))]
    );

    mock.set_balance(&x, 150);
    assert_matches!(
        next_event(&mut rx).await,
        StreamEvent::Balances { entries } if entries == vec![(x.clone(), BalanceEntry::uncertified(150))]
    );
    assert_matches!(
        next_event(&mut rx).await,
        StreamEvent::Balances { entries } if entries == vec![(x.clone(), BalanceEntry::certified(150))]
    );
    assert_eq!(stores.balances.get(&x), Some(BalanceEntry::certified(150)));

    // No further change: several poll intervals pass with no emission and
    // no additional certified round-trips.
    let certified_calls = mock.certified_calls();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(mock.certified_calls(), certified_calls);

    worker.stop().await;
    assert_eq!(worker.state().await, WorkerState::Stopped);
}

/// Tip polling and backward pagination work the same window store from
/// opposite ends without stepping on each other.
#[tokio::test]
async fn wallet_tip_and_history_pagination_converge() {
    init_tracing();
    let mock = Arc::new(MockLedgerGateway::new());
    let a = account("wallet");
    for id in 1..=6 {
        mock.push_transaction(&a, tx(id));
    }

    let stores = SessionStores::new();
    let config = SyncConfig::for_testing();
    let (events, mut rx) = mpsc::channel(64);
    let worker = WalletSyncWorker::new(
        config.clone(),
        mock.clone(),
        Arc::new(StaticIdentityLoader::session("principal")),
        events,
    );
    let loader = HistoryLoader::new(
        mock.clone(),
        stores.transactions.clone(),
        config.history_page_size,
    );
    let identity = StaticIdentityLoader::session("principal")
        .identity()
        .unwrap();

    worker.start(a.clone()).await.unwrap();

    // First tick: the whole tip page (5 newest) is unseen.
    let (new_transactions, most_recent_id, oldest_tx_id) = match next_event(&mut rx).await {
        StreamEvent::Wallet {
            new_transactions,
            most_recent_id,
            oldest_tx_id,
        } => (new_transactions, most_recent_id, oldest_tx_id),
        other => panic!("expected wallet event, got {other:?}"),
    };
    assert_eq!(new_transactions.len(), config.tip_page_size);
    assert_eq!(most_recent_id, TransactionId(6));
    // The host merges tip deltas into the window it owns.
    stores
        .transactions
        .add_transactions(&a, new_transactions, oldest_tx_id, false);

    // Meanwhile the user pages backwards until genesis.
    while loader.load_older(&identity, &a).await.unwrap() == vela_sync::HistoryProgress::HasMore {}

    let window = stores.transactions.window(&a).unwrap();
    assert_eq!(window.len(), 6);
    assert!(window.is_completed());
    assert_eq!(window.oldest_tx_id(), Some(TransactionId(1)));

    // A new transaction lands: the tip stream reports exactly that delta.
    mock.push_transaction(&a, tx(7));
    assert_matches!(
        next_event(&mut rx).await,
        StreamEvent::Wallet { new_transactions, most_recent_id, .. } => {
            assert_eq!(
                new_transactions.iter().map(|t| t.id.get()).collect::<Vec<_>>(),
                vec![7]
            );
            assert_eq!(most_recent_id, TransactionId(7));
        }
    );

    worker.stop().await;
}

/// Logout resets every domain; commits from operations that began before
/// the reset are fenced off by the store generation.
#[tokio::test]
async fn session_reset_fences_in_flight_writes() {
    init_tracing();
    let stores = SessionStores::new();
    let x = account("x");

    let pre_reset_token = stores.balances.acquire();
    stores.reset();
    assert!(!stores
        .balances
        .commit(&x, BalanceEntry::uncertified(42), pre_reset_token));
    assert!(stores.balances.is_empty());
}
