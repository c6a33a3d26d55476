use std::fs;

use food_waste_core::models::{Claim, ClaimStatus, EntityKind, Fields, Provider, Receiver, Record, Value};
use food_waste_core::store::{Database, RecordStore};
use food_waste_core::{StoreConfig, StoreError};
use proptest::prelude::*;
use tempfile::{tempdir, TempDir};

fn open(dir: &TempDir) -> Database {
    let _ = env_logger::builder().is_test(true).try_init();
    Database::open(StoreConfig::testing(dir.path())).unwrap()
}

fn acme() -> Fields {
    Provider::fields("Acme Foods", "Restaurant", "1 Main St", "Springfield", "555-0100")
}

fn sorted_table(store: &RecordStore<'_>) -> Vec<Record> {
    let mut rows = store.list(&Vec::new()).unwrap();
    rows.sort_by_key(|r| r.id);
    rows
}

fn assert_in_sync(store: &RecordStore<'_>) {
    let mut mirrored = store.mirror_rows().unwrap();
    mirrored.sort_by_key(|r| r.id);
    assert_eq!(sorted_table(store), mirrored);
}

#[test]
fn first_provider_gets_id_one_and_one_mirror_row() {
    let dir = tempdir().unwrap();
    let db = open(&dir);
    let providers = db.providers();

    assert_eq!(providers.create(&acme()).unwrap(), 1);

    let text = fs::read_to_string(db.config().mirror_path(EntityKind::Provider)).unwrap();
    assert_eq!(
        text,
        "Provider_ID,Name,Type,Address,City,Contact\n\
         1,Acme Foods,Restaurant,1 Main St,Springfield,555-0100\n"
    );

    let latest = providers.latest().unwrap().unwrap();
    let provider = Provider::try_from(&latest).unwrap();
    assert_eq!(provider.id, 1);
    assert_eq!(provider.name, "Acme Foods");
    assert_eq!(provider.contact, "555-0100");
}

#[test]
fn duplicate_contact_is_rejected_without_writes() {
    let dir = tempdir().unwrap();
    let db = open(&dir);
    let providers = db.providers();
    providers.create(&acme()).unwrap();

    let mut second = Provider::fields("Other Foods", "Supermarket", "9 Side St", "Springfield", "555-0100");
    let err = providers.create(&second).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
    assert_eq!(providers.count().unwrap(), 1);
    assert_eq!(providers.mirror_rows().unwrap().len(), 1);

    second.insert("Contact".to_string(), Value::from("555-0199"));
    assert_eq!(providers.create(&second).unwrap(), 2);
}

#[test]
fn receivers_enforce_contact_uniqueness_independently() {
    let dir = tempdir().unwrap();
    let db = open(&dir);
    db.providers().create(&acme()).unwrap();

    // Same contact in another entity is fine
    let receivers = db.receivers();
    receivers
        .create(&Receiver::fields("Hope Shelter", "Shelter", "Springfield", "555-0100"))
        .unwrap();
    let err = receivers
        .create(&Receiver::fields("Hope Annex", "Charity", "Springfield", "555-0100"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
}

#[test]
fn delete_then_update_is_not_found() {
    let dir = tempdir().unwrap();
    let db = open(&dir);
    let providers = db.providers();
    let id = providers.create(&acme()).unwrap();
    providers.delete(id).unwrap();
    assert_in_sync(&providers);

    let mut fields = Fields::new();
    fields.insert("City".to_string(), Value::from("Shelbyville"));
    assert!(matches!(providers.update(id, &fields), Err(StoreError::NotFound { .. })));
}

#[test]
fn emptied_tables_are_not_reseeded_on_reopen() {
    let dir = tempdir().unwrap();
    {
        let db = open(&dir);
        let providers = db.providers();
        for contact in ["555-0100", "555-0101", "555-0102"] {
            let mut fields = acme();
            fields.insert("Contact".to_string(), Value::from(contact));
            providers.create(&fields).unwrap();
        }
    }

    // The mirror now holds three rows and doubles as the seed file
    {
        let db = open(&dir);
        let providers = db.providers();
        assert_eq!(providers.count().unwrap(), 3);
        for id in 1..=3 {
            providers.delete(id).unwrap();
        }
    }

    let db = open(&dir);
    assert_eq!(db.providers().count().unwrap(), 0);
    assert!(db.providers().mirror_rows().unwrap().is_empty());
    assert_eq!(db.providers().next_id().unwrap(), 4);
}

#[test]
fn seed_files_populate_a_fresh_store() {
    let dir = tempdir().unwrap();
    let seed_dir = dir.path().join("seed");
    fs::create_dir_all(&seed_dir).unwrap();
    fs::write(
        seed_dir.join("providers_data.csv"),
        "Provider_ID,Name,Type,Address,City,Contact\n\
         1,Gonzales Inc,Supermarket,74347 Christopher Extensions,New Carol,+1-600-220-0480\n",
    )
    .unwrap();
    fs::write(
        seed_dir.join("receivers_data.csv"),
        "Receiver_ID,Name,Type,City,Contact\n\
         1,Donald Gomez,Shelter,Port Carlburgh,(955)922-5295\n",
    )
    .unwrap();

    let mut config = StoreConfig::testing(dir.path().join("live"));
    config.seed_dir = Some(seed_dir);
    let db = Database::open(config).unwrap();

    assert_eq!(db.providers().count().unwrap(), 1);
    assert_eq!(db.receivers().count().unwrap(), 1);
    assert_eq!(db.food_listings().records().count().unwrap(), 0);
    assert_in_sync(&db.providers());
    assert_eq!(db.cities().unwrap(), vec!["New Carol", "Port Carlburgh"]);
}

#[test]
fn claim_lifecycle_is_enforced() {
    let dir = tempdir().unwrap();
    let db = open(&dir);
    let provider = db.providers().create(&acme()).unwrap();
    let receiver = db
        .receivers()
        .create(&Receiver::fields("Hope Shelter", "Shelter", "Springfield", "555-0200"))
        .unwrap();
    let food = db
        .food_listings()
        .list_surplus(provider, "Bread", 10, "2025-03-17", "Vegetarian", "Breakfast")
        .unwrap();
    assert_eq!((food, receiver), (1, 1));

    let claims = db.claims();
    let id = claims
        .records()
        .create(&Claim::fields(1, 1, "2025-03-05 05:26:00"))
        .unwrap();
    assert_eq!(claims.claim(id).unwrap().status, ClaimStatus::Pending);

    claims.complete(id).unwrap();
    assert!(matches!(claims.cancel(id), Err(StoreError::InvalidTransition { .. })));
    assert_eq!(claims.claim(id).unwrap().status, ClaimStatus::Completed);
    assert_in_sync(claims.records());

    let report = db.run_query(9, None).unwrap();
    assert_eq!(report.columns, vec!["Name", "Successful_Claims"]);
    assert_eq!(report.rows, vec![vec![Value::from("Acme Foods"), Value::Integer(1)]]);
}

#[derive(Debug, Clone)]
enum Op {
    Create,
    Update(usize, String),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        2 => (any::<usize>(), "[A-Za-z ,\"]{1,12}").prop_map(|(i, city)| Op::Update(i, city)),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn table_and_mirror_agree_after_every_operation(ops in prop::collection::vec(op(), 1..20)) {
        let dir = tempdir().unwrap();
        let db = open(&dir);
        let providers = db.providers();
        let mut live: Vec<i64> = Vec::new();
        let mut created = 0;

        for op in ops {
            match op {
                Op::Create => {
                    created += 1;
                    let mut fields = acme();
                    fields.insert("Contact".to_string(), Value::from(format!("555-{:04}", created)));
                    let id = providers.create(&fields).unwrap();
                    prop_assert_eq!(id, created);
                    live.push(id);
                }
                Op::Update(i, city) if !live.is_empty() && !city.trim().is_empty() => {
                    let id = live[i % live.len()];
                    let mut fields = Fields::new();
                    fields.insert("City".to_string(), Value::from(city));
                    providers.update(id, &fields).unwrap();
                }
                Op::Delete(i) if !live.is_empty() => {
                    let id = live.remove(i % live.len());
                    providers.delete(id).unwrap();
                }
                _ => {}
            }

            let mut mirrored = providers.mirror_rows().unwrap();
            mirrored.sort_by_key(|r| r.id);
            prop_assert_eq!(sorted_table(&providers), mirrored);
        }

        prop_assert_eq!(providers.count().unwrap() as usize, live.len());
    }
}
