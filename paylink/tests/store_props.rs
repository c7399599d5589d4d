// tests/store_props.rs
// Store contract tests, run against the local realization. The same
// behavior is expected of the Postgres backend (see db_smoke.rs).

use std::sync::Arc;

use paylink::model::{CreateLinkInput, Currency};
use paylink::store::{LinkStore, LocalStore};
use tempfile::tempdir;
use uuid::Uuid;

fn eth_input() -> CreateLinkInput {
    CreateLinkInput {
        recipient: "0x1111111111111111111111111111111111111111".into(),
        amount: "1.5".into(),
        currency: Currency::Eth,
        message: None,
    }
}

fn open_store(dir: &tempfile::TempDir) -> Arc<dyn LinkStore> {
    Arc::new(LocalStore::open(dir.path().to_str().unwrap()).unwrap())
}

#[tokio::test]
async fn create_returns_unpaid_record_with_given_fields() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let link = store
        .create(eth_input(), Some("0xCreator".into()))
        .await
        .unwrap();

    assert_eq!(link.recipient, "0x1111111111111111111111111111111111111111");
    assert_eq!(link.amount, "1.5");
    assert_eq!(link.currency, Currency::Eth);
    assert_eq!(link.created_by.as_deref(), Some("0xCreator"));
    assert!(!link.paid);
    assert!(link.paid_at.is_none() && link.paid_by.is_none() && link.tx_hash.is_none());
}

#[tokio::test]
async fn created_link_is_immediately_visible() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let link = store.create(eth_input(), None).await.unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], link);

    let by_id = store.get_by_id(link.id).await.unwrap();
    assert_eq!(by_id, Some(link));
}

#[tokio::test]
async fn ids_are_pairwise_distinct() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let mut ids = Vec::new();
    for _ in 0..20 {
        let link = store.create(eth_input(), None).await.unwrap();
        ids.push(link.id);
    }

    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[tokio::test]
async fn listing_preserves_insertion_order_and_timestamps_do_not_regress() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let mut created = Vec::new();
    for i in 0..5 {
        let mut input = eth_input();
        input.amount = format!("{}.0", i + 1);
        created.push(store.create(input, None).await.unwrap());
    }

    let all = store.get_all().await.unwrap();
    let amounts: Vec<_> = all.iter().map(|l| l.amount.clone()).collect();
    assert_eq!(amounts, vec!["1.0", "2.0", "3.0", "4.0", "5.0"]);

    for pair in all.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[tokio::test]
async fn mark_paid_sets_all_paid_fields_in_one_call() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let link = store.create(eth_input(), None).await.unwrap();
    let paid = store
        .mark_paid(link.id, "0xPayer", "0xdeadbeef")
        .await
        .unwrap()
        .expect("link exists");

    assert!(paid.paid);
    assert!(paid.paid_at.is_some());
    assert_eq!(paid.paid_by.as_deref(), Some("0xPayer"));
    assert_eq!(paid.tx_hash.as_deref(), Some("0xdeadbeef"));

    // the settled state is what subsequent reads observe
    let reread = store.get_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(reread, paid);

    // creation-time fields were untouched
    assert_eq!(reread.recipient, link.recipient);
    assert_eq!(reread.amount, link.amount);
    assert_eq!(reread.created_at, link.created_at);
}

#[tokio::test]
async fn unknown_id_yields_not_found_and_no_mutation() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let link = store.create(eth_input(), None).await.unwrap();
    let never_issued = Uuid::new_v4();

    assert!(store.get_by_id(never_issued).await.unwrap().is_none());
    assert!(store
        .mark_paid(never_issued, "0xPayer", "0xhash")
        .await
        .unwrap()
        .is_none());

    // the collection is exactly as it was
    let all = store.get_all().await.unwrap();
    assert_eq!(all, vec![link]);
}

#[tokio::test]
async fn creator_filter_is_case_insensitive() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let mine = store
        .create(eth_input(), Some("0xAbCd000000000000000000000000000000000001".into()))
        .await
        .unwrap();
    store
        .create(eth_input(), Some("0x9999000000000000000000000000000000000002".into()))
        .await
        .unwrap();
    store.create(eth_input(), None).await.unwrap();

    let lower = store
        .get_by_creator("0xabcd000000000000000000000000000000000001")
        .await
        .unwrap();
    let upper = store
        .get_by_creator("0xABCD000000000000000000000000000000000001")
        .await
        .unwrap();

    assert_eq!(lower, vec![mine]);
    assert_eq!(lower, upper);
}

// Documented reference behavior, not a guarantee: settling an already-paid
// link overwrites the paid fields. A hardened variant would reject the
// second call; if that is ever built this test is the one to change.
#[tokio::test]
async fn mark_paid_twice_overwrites_previous_settlement() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let link = store.create(eth_input(), None).await.unwrap();
    let first = store
        .mark_paid(link.id, "0xPayerOne", "0xaaaa")
        .await
        .unwrap()
        .unwrap();
    let second = store
        .mark_paid(link.id, "0xPayerTwo", "0xbbbb")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(second.paid_by.as_deref(), Some("0xPayerTwo"));
    assert_eq!(second.tx_hash.as_deref(), Some("0xbbbb"));
    assert!(second.paid_at >= first.paid_at);

    let reread = store.get_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(reread.paid_by.as_deref(), Some("0xPayerTwo"));
}

#[tokio::test]
async fn concurrent_creates_with_identical_input_get_distinct_ids() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let (a, b) = tokio::join!(
        store.create(eth_input(), Some("0xCreator".into())),
        store.create(eth_input(), Some("0xCreator".into())),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.id, b.id);
    assert_eq!(a.amount, b.amount);
    assert_eq!(store.get_all().await.unwrap().len(), 2);
}
