// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use fintrack::db::{MemoryStorage, Storage};
use fintrack::models::{NewTransaction, Period, Transaction, TransactionPatch, TransactionType};
use fintrack::store::TransactionStore;
use fintrack::store::transactions::TransactionState;
use fintrack::{AppContext, Error, cli, commands::transactions};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::Cell;
use std::rc::Rc;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn income(amount: Decimal, category: &str, date: &str) -> NewTransaction {
    NewTransaction::new(TransactionType::Income, amount, category, day(date))
}

fn expense(amount: Decimal, category: &str, date: &str) -> NewTransaction {
    NewTransaction::new(TransactionType::Expense, amount, category, day(date))
}

fn setup() -> (Rc<MemoryStorage>, TransactionStore) {
    let storage = Rc::new(MemoryStorage::new());
    let store = TransactionStore::open(storage.clone());
    (storage, store)
}

fn assert_partitioned(store: &TransactionStore) {
    let all = store.transactions();
    let incomes: Vec<_> = all.iter().filter(|t| t.is_income()).cloned().collect();
    let expenses: Vec<_> = all.iter().filter(|t| t.is_expense()).cloned().collect();
    assert_eq!(store.incomes(), incomes.as_slice());
    assert_eq!(store.expenses(), expenses.as_slice());
}

#[test]
fn salary_and_rent_scenario() {
    let (_, mut store) = setup();
    store
        .add_transaction(income(dec!(1000), "salary", "2024-01-01"))
        .unwrap();
    store
        .add_transaction(expense(dec!(400), "rent", "2024-01-02"))
        .unwrap();

    assert_eq!(store.total_income(), dec!(1000));
    assert_eq!(store.total_expense(), dec!(400));
    assert_eq!(store.balance(), dec!(600));
    assert_eq!(store.balance(), store.total_income() - store.total_expense());
}

#[test]
fn added_transaction_lands_in_exactly_one_partition() {
    let (_, mut store) = setup();
    let a = store
        .add_transaction(income(dec!(10), "gift", "2024-02-01"))
        .unwrap();
    let b = store
        .add_transaction(expense(dec!(5), "coffee", "2024-02-01"))
        .unwrap();

    assert_eq!(store.transactions()[0].id, b.id);
    assert_eq!(store.transactions()[1].id, a.id);
    assert!(store.incomes().iter().any(|t| t.id == a.id));
    assert!(!store.expenses().iter().any(|t| t.id == a.id));
    assert!(store.expenses().iter().any(|t| t.id == b.id));
    assert!(!store.incomes().iter().any(|t| t.id == b.id));
    assert_ne!(a.id, b.id);
    assert!(a.updated_at.is_none());
    assert_partitioned(&store);
}

#[test]
fn add_rejects_non_positive_amount_and_blank_category() {
    let (storage, mut store) = setup();
    let err = store
        .add_transaction(expense(Decimal::ZERO, "food", "2024-01-01"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let err = store
        .add_transaction(expense(dec!(-3), "food", "2024-01-01"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let err = store
        .add_transaction(expense(dec!(3), "   ", "2024-01-01"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(store.transactions().is_empty());
    assert!(storage.is_empty());
}

#[test]
fn unknown_type_text_is_invalid_argument() {
    let err = "transfer".parse::<TransactionType>().unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(" Income ".parse::<TransactionType>().unwrap(), TransactionType::Income);

    let raw = r#"{"type":"refund","amount":"1","category":"x","date":"2024-01-01"}"#;
    assert!(serde_json::from_str::<NewTransaction>(raw).is_err());
}

#[test]
fn update_of_unknown_id_changes_nothing() {
    let (storage, mut store) = setup();
    store
        .add_transaction(expense(dec!(20), "food", "2024-03-01"))
        .unwrap();
    let before = store.get_state();
    let stored_before = storage.load("transactions").unwrap();

    let notified = Rc::new(Cell::new(0));
    let counter = notified.clone();
    store.subscribe(Rc::new(move |_: &TransactionState| {
        counter.set(counter.get() + 1)
    }));

    let patch = TransactionPatch {
        amount: Some(dec!(1)),
        ..Default::default()
    };
    let err = store.update_transaction("nonexistent-id", patch).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(store.get_state(), before);
    assert_eq!(storage.load("transactions").unwrap(), stored_before);
    assert_eq!(notified.get(), 0);
}

#[test]
fn update_merges_patch_and_stamps_updated_at() {
    let (_, mut store) = setup();
    let tx = store
        .add_transaction(expense(dec!(20), "food", "2024-03-01").with_description("lunch"))
        .unwrap();

    let patch = TransactionPatch {
        amount: Some(dec!(25.50)),
        description: Some(String::new()),
        ..Default::default()
    };
    let updated = store.update_transaction(&tx.id, patch).unwrap();
    assert_eq!(updated.amount, dec!(25.50));
    assert_eq!(updated.category, "food");
    assert_eq!(updated.description, None);
    assert_eq!(updated.created_at, tx.created_at);
    assert!(updated.updated_at.is_some());
    assert_eq!(store.expenses()[0], updated);
    assert_eq!(store.total_expense(), dec!(25.50));
}

#[test]
fn changing_type_moves_record_between_partitions() {
    let (_, mut store) = setup();
    let tx = store
        .add_transaction(expense(dec!(50), "refund", "2024-03-01"))
        .unwrap();
    let patch = TransactionPatch {
        kind: Some(TransactionType::Income),
        ..Default::default()
    };
    store.update_transaction(&tx.id, patch).unwrap();
    assert!(store.expenses().is_empty());
    assert_eq!(store.incomes().len(), 1);
    assert_eq!(store.balance(), dec!(50));
    assert_partitioned(&store);
}

#[test]
fn invalid_patch_is_rejected_before_mutation() {
    let (_, mut store) = setup();
    let tx = store
        .add_transaction(expense(dec!(50), "fuel", "2024-03-01"))
        .unwrap();
    let patch = TransactionPatch {
        amount: Some(Decimal::ZERO),
        ..Default::default()
    };
    assert!(matches!(
        store.update_transaction(&tx.id, patch),
        Err(Error::Validation(_))
    ));
    assert_eq!(store.get(&tx.id).unwrap().amount, dec!(50));

    let typo = r#"{"ammount": "3"}"#;
    assert!(serde_json::from_str::<TransactionPatch>(typo).is_err());
}

#[test]
fn delete_removes_from_all_collections() {
    let (_, mut store) = setup();
    let keep = store
        .add_transaction(income(dec!(100), "salary", "2024-01-01"))
        .unwrap();
    let gone = store
        .add_transaction(expense(dec!(30), "games", "2024-01-05"))
        .unwrap();
    store.delete_transaction(&gone.id).unwrap();

    assert_eq!(store.transactions().len(), 1);
    assert_eq!(store.transactions()[0].id, keep.id);
    assert!(store.expenses().is_empty());
    assert!(matches!(
        store.delete_transaction(&gone.id),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn date_range_filter_is_inclusive() {
    let (_, mut store) = setup();
    for (amt, date) in [
        (dec!(1), "2024-01-31"),
        (dec!(2), "2024-02-01"),
        (dec!(3), "2024-02-15"),
        (dec!(4), "2024-02-29"),
        (dec!(5), "2024-03-01"),
    ] {
        store.add_transaction(expense(amt, "misc", date)).unwrap();
    }
    let total: Decimal = store
        .filter_by_date_range(day("2024-02-01"), day("2024-02-29"))
        .map(|t| t.amount)
        .sum();
    assert_eq!(total, dec!(9));
    assert_eq!(
        store
            .filter_by_date_range(day("2024-03-02"), day("2024-12-31"))
            .count(),
        0
    );
}

#[test]
fn category_filter_is_exact_match() {
    let (_, mut store) = setup();
    store
        .add_transaction(expense(dec!(10), "Food", "2024-01-01"))
        .unwrap();
    store
        .add_transaction(expense(dec!(20), "food", "2024-01-02"))
        .unwrap();
    store
        .add_transaction(expense(dec!(30), "food & drink", "2024-01-03"))
        .unwrap();
    let hits: Vec<_> = store.filter_by_category("food").collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].amount, dec!(20));
}

#[test]
fn bulk_replace_rederives_partitions_and_persists() {
    let (storage, mut source) = setup();
    source
        .add_transaction(income(dec!(900), "salary", "2024-04-01"))
        .unwrap();
    source
        .add_transaction(expense(dec!(120), "utilities", "2024-04-03"))
        .unwrap();
    source
        .add_transaction(expense(dec!(80), "food", "2024-04-04").recurring(Period::Weekly))
        .unwrap();
    let list = source.transactions().to_vec();

    let mut target = TransactionStore::open(Rc::new(MemoryStorage::new()));
    target.set_transactions(list.clone()).unwrap();
    assert_eq!(target.transactions(), list.as_slice());
    assert_eq!(target.incomes().len(), 1);
    assert_eq!(target.expenses().len(), 2);
    assert_partitioned(&target);

    let reopened = TransactionStore::open(storage);
    assert_eq!(reopened.get_state(), source.get_state());
    assert_eq!(
        reopened.transactions()[0].recurring_period,
        Some(Period::Weekly)
    );
}

#[test]
fn superseded_fetch_is_discarded() {
    let (_, mut store) = setup();
    let template = {
        let mut scratch = TransactionStore::open(Rc::new(MemoryStorage::new()));
        scratch
            .add_transaction(income(dec!(5), "old", "2024-01-01"))
            .unwrap();
        scratch
            .add_transaction(income(dec!(7), "new", "2024-01-02"))
            .unwrap();
        scratch.transactions().to_vec()
    };

    let slow = store.begin_fetch();
    let fast = store.begin_fetch();
    assert!(store.apply_fetched(fast, vec![template[0].clone()]).unwrap());
    assert!(!store.apply_fetched(slow, vec![template[1].clone()]).unwrap());
    assert_eq!(store.transactions().len(), 1);
    assert_eq!(store.transactions()[0].category, "new");
}

#[test]
fn malformed_stored_entries_are_skipped() {
    let storage = Rc::new(MemoryStorage::new());
    storage
        .save(
            "transactions",
            r#"[
                {"id":"a","type":"income","amount":"10","category":"gift","date":"2024-01-01","createdAt":"2024-01-01T00:00:00Z"},
                {"id":"b","type":"bogus","amount":"1","category":"x","date":"2024-01-01","createdAt":"2024-01-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();
    let store = TransactionStore::open(storage.clone());
    assert_eq!(store.transactions().len(), 1);
    assert_eq!(store.total_income(), dec!(10));

    storage.save("transactions", r#"{"not":"a list"}"#).unwrap();
    let store = TransactionStore::open(storage);
    assert!(store.transactions().is_empty());
}

#[test]
fn monthly_summary_is_newest_first() {
    let (_, mut store) = setup();
    store
        .add_transaction(income(dec!(1000), "salary", "2024-01-05"))
        .unwrap();
    store
        .add_transaction(expense(dec!(300), "rent", "2024-01-06"))
        .unwrap();
    store
        .add_transaction(expense(dec!(50), "food", "2024-02-01"))
        .unwrap();
    let months = store.monthly_summary();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, "2024-02");
    assert_eq!(months[0].net, dec!(-50));
    assert_eq!(months[1].income, dec!(1000));
    assert_eq!(months[1].net, dec!(700));
}

#[test]
fn list_limit_respected() {
    let mut ctx = AppContext::in_memory();
    for d in ["2025-01-01", "2025-01-03", "2025-01-02"] {
        ctx.transactions
            .add_transaction(expense(dec!(10), "Cat1", d))
            .unwrap();
    }
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["fintrack", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = transactions::query_rows(&ctx, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, day("2025-01-03"));
            assert_eq!(rows[1].date, day("2025-01-02"));
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_filters_by_range_and_type() {
    let mut ctx = AppContext::in_memory();
    ctx.transactions
        .add_transaction(income(dec!(10), "salary", "2025-01-01"))
        .unwrap();
    ctx.transactions
        .add_transaction(expense(dec!(4), "food", "2025-01-10"))
        .unwrap();
    ctx.transactions
        .add_transaction(expense(dec!(6), "food", "2025-02-10"))
        .unwrap();
    let matches = cli::build_cli().get_matches_from([
        "fintrack", "tx", "list", "--from", "2025-01-01", "--to", "2025-01-31", "--type",
        "expense",
    ]);
    let (_, tx_m) = matches.subcommand().unwrap();
    let (_, list_m) = tx_m.subcommand().unwrap();
    let rows = transactions::query_rows(&ctx, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(4));
}

fn record(id: &str, date: &str, created_at: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        kind: TransactionType::Expense,
        amount: dec!(1),
        category: "misc".to_string(),
        description: None,
        date: day(date),
        is_recurring: false,
        recurring_period: None,
        created_at: created_at.parse::<DateTime<Utc>>().unwrap(),
        updated_at: None,
    }
}

#[test]
fn recent_orders_by_date_then_creation_and_truncates() {
    let (_, mut store) = setup();
    store
        .set_transactions(vec![
            record("a", "2024-05-01", "2024-05-01T09:00:00Z"),
            record("b", "2024-05-02", "2024-05-02T08:00:00Z"),
            record("c", "2024-05-01", "2024-05-01T10:00:00Z"),
            record("d", "2024-04-30", "2024-05-03T00:00:00Z"),
        ])
        .unwrap();

    let ids: Vec<_> = store.recent(3).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["b", "c", "a"]);
    let ids: Vec<_> = store.recent(10).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["b", "c", "a", "d"]);
    assert!(store.recent(0).is_empty());
}

#[test]
fn list_breaks_same_day_ties_by_creation_time() {
    let mut ctx = AppContext::in_memory();
    ctx.transactions
        .set_transactions(vec![
            record("early", "2025-03-01", "2025-03-01T07:00:00Z"),
            record("late", "2025-03-01", "2025-03-01T19:00:00Z"),
        ])
        .unwrap();
    let matches = cli::build_cli().get_matches_from(["fintrack", "tx", "list", "--limit", "1"]);
    let (_, tx_m) = matches.subcommand().unwrap();
    let (_, list_m) = tx_m.subcommand().unwrap();
    let rows = transactions::query_rows(&ctx, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "late");
}

#[test]
fn update_command_can_make_recurring_transaction_one_off() {
    let mut ctx = AppContext::in_memory();
    let tx = ctx
        .transactions
        .add_transaction(expense(dec!(15), "streaming", "2025-01-01").recurring(Period::Monthly))
        .unwrap();
    assert!(tx.is_recurring);

    let matches = cli::build_cli().get_matches_from([
        "fintrack",
        "tx",
        "update",
        tx.id.as_str(),
        "--no-recurring",
    ]);
    let (_, tx_m) = matches.subcommand().unwrap();
    transactions::handle(&mut ctx, tx_m).unwrap();

    let updated = ctx.transactions.get(&tx.id).unwrap();
    assert!(!updated.is_recurring);
    assert_eq!(updated.recurring_period, None);

    let clash = cli::build_cli().try_get_matches_from([
        "fintrack",
        "tx",
        "update",
        tx.id.as_str(),
        "--no-recurring",
        "--recurring",
        "weekly",
    ]);
    assert!(clash.is_err());
}

#[test]
fn stored_timestamp_dates_decode_to_calendar_dates() {
    let raw = r#"{"id":"r1","type":"income","amount":"10","category":"gift",
        "date":"2024-01-02T00:00:00.000Z","createdAt":"2024-01-02T08:00:00Z"}"#;
    let tx: Transaction = serde_json::from_str(raw).unwrap();
    assert_eq!(tx.date, day("2024-01-02"));
    assert_eq!(serde_json::to_value(&tx).unwrap()["date"], "2024-01-02");

    let bad = raw.replace("2024-01-02T00:00:00.000Z", "02/01/2024");
    assert!(serde_json::from_str::<Transaction>(&bad).is_err());
}
