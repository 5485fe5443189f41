use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_database::{Database, DatabaseError, Record, TxOptions};

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    label: u8,
}

impl Record for Item {
    const TABLE: &'static str = "items";
}

proptest! {
    /// Whatever mix of committed and abandoned inserts happens, ids stay unique and only
    /// committed rows remain visible.
    #[test]
    fn ids_are_unique_across_commits_and_rollbacks(plan in prop::collection::vec(any::<bool>(), 1..40)) {
        let db = Database::builder().name("prop").table::<Item>().build().unwrap();
        let mut issued = BTreeSet::new();
        let mut committed = BTreeSet::new();

        for (n, commit) in plan.iter().enumerate() {
            let label = u8::try_from(n % 200).unwrap();
            let outcome: Result<i64, DatabaseError> = db.transaction(TxOptions::repeatable_read(), |tx| {
                let id = tx.insert(&Item { label })?;
                if *commit { Ok(id) } else { Err(format!("abandon {id}").into()) }
            });
            match outcome {
                Ok(id) => {
                    prop_assert!(issued.insert(id));
                    committed.insert(id);
                },
                Err(DatabaseError::Internal { message, .. }) => {
                    let id: i64 = message.trim_start_matches("abandon ").parse().unwrap();
                    prop_assert!(issued.insert(id));
                },
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }

        let visible: BTreeSet<i64> = db
            .transaction(TxOptions::read_only(), |tx| tx.fetch_all::<Item>())
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        prop_assert_eq!(visible, committed);
    }
}
