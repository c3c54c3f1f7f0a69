use std::sync::Arc;

use swapcrow_client::index::{EscrowIndex, EscrowStatus};
use swapcrow_client::interface::{LedgerConfig, SwapParams};
use swapcrow_client::scenario::{Balances, Scenario};
use swapcrow_client::{Agent, LocalAgent, SwapcrowClient};
use swapcrow_core::{EscrowError, Keypair};

fn scenario() -> Scenario {
    let params = SwapParams {
        initializer_amount: 500,
        taker_amount: 1000,
        decimals: 0,
    };
    Scenario::bootstrap(params, &LedgerConfig::default()).unwrap()
}

fn escrow_error<T: std::fmt::Debug>(res: swapcrow_client::error::Result<T>) -> EscrowError {
    res.unwrap_err()
        .escrow_error()
        .cloned()
        .expect("ledger error")
}

#[tokio::test]
async fn exchange_through_agents() {
    let scenario = scenario();
    let initializer = SwapcrowClient::new(scenario.initializer_agent());
    let taker = SwapcrowClient::new(scenario.taker_agent());

    let metadata = initializer
        .initialize_escrow(&scenario.initialize_params())
        .await
        .unwrap();
    assert_eq!(metadata.initializer, scenario.initializer.identity());
    assert_eq!(
        scenario.ledger.lock().await.holding(&metadata.vault).unwrap().amount,
        500
    );

    taker
        .exchange(&metadata, &scenario.taker_holdings())
        .await
        .unwrap();
    assert_eq!(
        scenario.balances().await.unwrap(),
        Balances {
            initializer_a: 0,
            initializer_b: 1000,
            taker_a: 500,
            taker_b: 0,
        }
    );
}

#[tokio::test]
async fn cancel_through_agent() {
    let scenario = scenario();
    let initializer = scenario.initializer_agent();
    let metadata = initializer
        .initialize_escrow(&scenario.initialize_params())
        .await
        .unwrap();

    let taker = scenario.taker_agent();
    assert_eq!(
        escrow_error(taker.cancel(&metadata).await),
        EscrowError::Unauthorized
    );

    initializer.cancel(&metadata).await.unwrap();
    assert_eq!(
        scenario.balances().await.unwrap(),
        Balances {
            initializer_a: 500,
            initializer_b: 0,
            taker_a: 0,
            taker_b: 1000,
        }
    );
}

#[tokio::test]
async fn fresh_agents_see_resolved_record() {
    let scenario = scenario();
    let metadata = scenario
        .initializer_agent()
        .initialize_escrow(&scenario.initialize_params())
        .await
        .unwrap();

    scenario.initializer_agent().cancel(&metadata).await.unwrap();
    assert_eq!(
        escrow_error(scenario.initializer_agent().cancel(&metadata).await),
        EscrowError::RecordNotActive
    );
    assert_eq!(
        escrow_error(
            scenario
                .taker_agent()
                .exchange(&metadata, &scenario.taker_holdings())
                .await
        ),
        EscrowError::RecordNotActive
    );
    assert_eq!(scenario.balances().await.unwrap().initializer_a, 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_resolutions_have_one_winner() {
    let scenario = scenario();
    let initializer = Arc::new(scenario.initializer_agent());
    let taker = Arc::new(scenario.taker_agent());
    let metadata = initializer
        .initialize_escrow(&scenario.initialize_params())
        .await
        .unwrap();
    let holdings = scenario.taker_holdings();

    let exchange = {
        let (taker, metadata) = (taker.clone(), metadata.clone());
        tokio::spawn(async move { taker.exchange(&metadata, &holdings).await })
    };
    let cancel = {
        let (initializer, metadata) = (initializer.clone(), metadata.clone());
        tokio::spawn(async move { initializer.cancel(&metadata).await })
    };
    let (exchanged, cancelled) = (exchange.await.unwrap(), cancel.await.unwrap());

    match (exchanged, cancelled) {
        (Ok(()), Err(e)) | (Err(e), Ok(())) => {
            assert_eq!(e.escrow_error(), Some(&EscrowError::RecordNotActive));
        }
        (a, b) => panic!("expected exactly one winner, got {a:?} and {b:?}"),
    }

    let balances = scenario.balances().await.unwrap();
    assert!(
        balances
            == Balances {
                initializer_a: 0,
                initializer_b: 1000,
                taker_a: 500,
                taker_b: 0,
            }
            || balances
                == Balances {
                    initializer_a: 500,
                    initializer_b: 0,
                    taker_a: 0,
                    taker_b: 1000,
                }
    );
}

#[tokio::test]
async fn index_tracks_lifecycle() {
    let scenario = scenario();
    let initializer = scenario.initializer_agent();
    let metadata = initializer
        .initialize_escrow(&scenario.initialize_params())
        .await
        .unwrap();

    let mut index = EscrowIndex::new(scenario.program_id);
    {
        let ledger = scenario.ledger.lock().await;
        assert_eq!(index.scan(&ledger), 1);
        assert_eq!(index.scan(&ledger), 0);
        let active = index.active(&ledger);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, metadata.escrow);
        assert_eq!(active[0].1.initializer_amount(), 500);
    }

    initializer.cancel(&metadata).await.unwrap();
    let ledger = scenario.ledger.lock().await;
    assert_eq!(
        index.status(&ledger, &metadata.escrow),
        Some(EscrowStatus::Resolved)
    );
    assert_eq!(index.status(&ledger, &Keypair::new().identity()), None);
    assert_eq!(index.prune(&ledger), 1);
    assert!(index.is_empty());
}

#[tokio::test]
async fn foreign_program_metadata_is_rejected() {
    let scenario = scenario();
    let initializer = scenario.initializer_agent();
    let mut metadata = initializer
        .initialize_escrow(&scenario.initialize_params())
        .await
        .unwrap();

    let other = LocalAgent::new(
        scenario.ledger.clone(),
        Keypair::new().identity(),
        scenario.initializer.clone(),
    );
    assert!(other.cancel(&metadata).await.is_err());

    metadata.program_id = Keypair::new().identity();
    assert!(initializer.cancel(&metadata).await.is_err());
    assert_eq!(
        scenario.ledger.lock().await.holding(&metadata.vault).unwrap().amount,
        500
    );
}
