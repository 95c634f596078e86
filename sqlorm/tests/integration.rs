//! Black-box scenarios driving [`sqlorm::Storage`] end to end against an
//! in-memory database. Each test stands on its own `Storage` instance so
//! they can run in parallel without sharing state.

use sqlorm::ast::{BinaryOperator, CompoundOperator, Expr, OrderByExpr};
use sqlorm::core::{Catalog, Column, Table};
use sqlorm::{Storage, StorageOptions};

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i64,
}

fn user_table() -> Table<User> {
    Table::new("User")
        .column(
            Column::new("id", |u: &User| u.id, |u: &mut User, v| u.id = v)
                .primary_key_autoincrement(),
        )
        .column(Column::new(
            "name",
            |u: &User| u.name.clone(),
            |u: &mut User, v| u.name = v,
        ))
        .column(Column::new("age", |u: &User| u.age, |u: &mut User, v| u.age = v))
}

fn open_with_users() -> Storage {
    let mut catalog = Catalog::new();
    catalog.register(user_table());
    let storage = Storage::open(":memory:", catalog, StorageOptions::new()).unwrap();
    storage.sync_schema(true).unwrap();
    storage
}

/// S1: create a table, insert rows, fetch them back by primary key.
#[test]
fn create_insert_and_get() {
    let storage = open_with_users();

    let alice_id = storage
        .insert(&User {
            id: 0,
            name: "Alice".into(),
            age: 30,
        })
        .unwrap();
    let bob_id = storage
        .insert(&User {
            id: 0,
            name: "Bob".into(),
            age: 25,
        })
        .unwrap();
    assert_ne!(alice_id, bob_id);

    let alice: User = storage.get(alice_id).unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.age, 30);

    let missing = storage.get_pointer::<User>(alice_id + bob_id + 1000).unwrap();
    assert!(missing.is_none());
}

/// S2: a typed projection through `select` with a custom row shape.
#[test]
fn typed_select_projects_columns() {
    let storage = open_with_users();
    storage
        .insert(&User {
            id: 0,
            name: "Alice".into(),
            age: 30,
        })
        .unwrap();
    storage
        .insert(&User {
            id: 0,
            name: "Carol".into(),
            age: 41,
        })
        .unwrap();

    let query = storage
        .query::<User>(vec![Expr::col("name"), Expr::col("age")])
        .unwrap()
        .order_by(OrderByExpr::new(Expr::col("name")).asc());
    let rows: Vec<(String, i64)> = storage.select(query, None).unwrap();

    assert_eq!(rows, vec![("Alice".to_owned(), 30), ("Carol".to_owned(), 41)]);
}

/// S3: the aggregate family over a condition.
#[test]
fn aggregates_over_a_condition() {
    let storage = open_with_users();
    for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 41), ("Dave", 19)] {
        storage
            .insert(&User {
                id: 0,
                name: name.into(),
                age,
            })
            .unwrap();
    }

    let adult = Expr::compare(Expr::col("age"), BinaryOperator::GtEq, Expr::literal(21i64));

    assert_eq!(storage.count::<User>(None).unwrap(), 4);
    assert_eq!(storage.count::<User>(Some(adult.clone())).unwrap(), 2);
    assert_eq!(
        storage.sum::<User>(Expr::col("age"), Some(adult.clone())).unwrap(),
        Some(71.0)
    );
    assert_eq!(
        storage.min::<User, i64>(Expr::col("age"), None).unwrap(),
        Some(19)
    );
    assert_eq!(
        storage.max::<User, i64>(Expr::col("age"), None).unwrap(),
        Some(41)
    );
    assert_eq!(storage.avg::<User>(Expr::col("age"), None).unwrap(), Some(28.75));
}

#[derive(Default)]
struct UserNoAge {
    id: i64,
    name: String,
}

fn user_no_age_table() -> Table<UserNoAge> {
    Table::new("User")
        .column(
            Column::new("id", |u: &UserNoAge| u.id, |u: &mut UserNoAge, v| u.id = v)
                .primary_key_autoincrement(),
        )
        .column(Column::new(
            "name",
            |u: &UserNoAge| u.name.clone(),
            |u: &mut UserNoAge, v| u.name = v,
        ))
}

#[derive(Default)]
struct UserWithOptionalAge {
    id: i64,
    name: String,
    age: Option<i64>,
}

fn user_with_optional_age_table() -> Table<UserWithOptionalAge> {
    Table::new("User")
        .column(
            Column::new(
                "id",
                |u: &UserWithOptionalAge| u.id,
                |u: &mut UserWithOptionalAge, v| u.id = v,
            )
            .primary_key_autoincrement(),
        )
        .column(Column::new(
            "name",
            |u: &UserWithOptionalAge| u.name.clone(),
            |u: &mut UserWithOptionalAge, v| u.name = v,
        ))
        .column(Column::new(
            "age",
            |u: &UserWithOptionalAge| u.age,
            |u: &mut UserWithOptionalAge, v| u.age = v,
        ))
}

/// S4: re-synchronizing against a catalog that adds a nullable column
/// leaves existing rows intact and reports `NewColumnsAdded`. Two
/// `Storage` instances open the same file path in turn, since a schema
/// change is naturally a cold redeploy rather than something the same
/// process does to itself mid-run.
#[test]
fn sync_schema_adds_a_column_without_losing_rows() {
    let path = std::env::temp_dir().join(format!("sqlorm-test-{}.sqlite3", std::process::id()));
    let path = path.to_str().unwrap().to_owned();
    let _ = std::fs::remove_file(&path);

    {
        let mut catalog = Catalog::new();
        catalog.register(user_no_age_table());
        let storage = Storage::open(path.clone(), catalog, StorageOptions::new()).unwrap();
        storage.sync_schema(true).unwrap();
        storage
            .insert(&UserNoAge {
                id: 0,
                name: "Alice".into(),
            })
            .unwrap();
    }

    {
        let mut catalog = Catalog::new();
        catalog.register(user_with_optional_age_table());
        let storage = Storage::open(path.clone(), catalog, StorageOptions::new()).unwrap();
        let statuses = storage.sync_schema(true).unwrap();
        assert_eq!(
            statuses["User"],
            sqlorm::core::SyncStatus::NewColumnsAdded
        );

        let alice: UserWithOptionalAge = storage.get(1i64).unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.age, None);
    }

    let _ = std::fs::remove_file(&path);
}

/// S5: a compound `UNION` query, with no extra condition layered on top.
#[test]
fn compound_select_unions_two_bodies() {
    let storage = open_with_users();
    for (name, age) in [("Alice", 30), ("Bob", 17)] {
        storage
            .insert(&User {
                id: 0,
                name: name.into(),
                age,
            })
            .unwrap();
    }

    let adults = storage
        .query::<User>(vec![Expr::col("name")])
        .unwrap()
        .filter(Expr::compare(Expr::col("age"), BinaryOperator::GtEq, Expr::literal(18i64)));
    let minors = storage
        .query::<User>(vec![Expr::col("name")])
        .unwrap()
        .filter(Expr::compare(Expr::col("age"), BinaryOperator::Lt, Expr::literal(18i64)));
    let combined = adults.compound(CompoundOperator::UnionAll, minors);

    let names: Vec<String> = storage.select(combined, None).unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Alice".to_owned()));
    assert!(names.contains(&"Bob".to_owned()));
}

/// S5b: combining a compound select with an extra condition is rejected.
#[test]
fn compound_select_rejects_extra_condition() {
    let storage = open_with_users();
    let a = storage.query::<User>(vec![Expr::col("name")]).unwrap();
    let b = storage.query::<User>(vec![Expr::col("name")]).unwrap();
    let combined = a.compound(CompoundOperator::Union, b);

    let err = storage
        .select::<String>(combined, Some(Expr::compare(Expr::col("age"), BinaryOperator::Gt, Expr::literal(0i64))))
        .unwrap_err();
    assert!(matches!(err, sqlorm::Error::CompoundSelectWithExtraConditions));
}

/// S6: a rolled-back transaction leaves no trace of the writes inside it.
#[test]
fn transaction_rollback_discards_writes() {
    let storage = open_with_users();
    storage
        .insert(&User {
            id: 0,
            name: "Alice".into(),
            age: 30,
        })
        .unwrap();

    storage
        .transaction(|| {
            storage
                .insert(&User {
                    id: 0,
                    name: "Temp".into(),
                    age: 1,
                })
                .unwrap();
            false
        })
        .unwrap();

    assert_eq!(storage.count::<User>(None).unwrap(), 1);

    storage
        .transaction(|| {
            storage
                .insert(&User {
                    id: 0,
                    name: "Kept".into(),
                    age: 2,
                })
                .unwrap();
            true
        })
        .unwrap();

    assert_eq!(storage.count::<User>(None).unwrap(), 2);
}

/// A mid-transaction `begin_transaction` call fails rather than nesting.
#[test]
fn nested_transaction_is_rejected() {
    let storage = open_with_users();
    storage.begin_transaction().unwrap();
    let err = storage.begin_transaction().unwrap_err();
    assert!(matches!(
        err,
        sqlorm::Error::CannotStartTransactionWithinTransaction
    ));
    storage.rollback().unwrap();
}

/// `remove`/`remove_by_id` delete exactly the targeted row.
#[test]
fn remove_by_id_deletes_one_row() {
    let storage = open_with_users();
    let id = storage
        .insert(&User {
            id: 0,
            name: "Alice".into(),
            age: 30,
        })
        .unwrap();
    storage
        .insert(&User {
            id: 0,
            name: "Bob".into(),
            age: 25,
        })
        .unwrap();

    storage.remove_by_id::<User>(id).unwrap();
    assert_eq!(storage.count::<User>(None).unwrap(), 1);
    assert!(storage.get_pointer::<User>(id).unwrap().is_none());
}

/// `iterate` walks every row lazily, matching what `get_all` would return.
#[test]
fn iterate_yields_every_matching_row() {
    let storage = open_with_users();
    for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 41)] {
        storage
            .insert(&User {
                id: 0,
                name: name.into(),
                age,
            })
            .unwrap();
    }

    let mut names = Vec::new();
    let mut cursor = storage.iterate::<User>(None).unwrap();
    while let Some(user) = cursor.next().unwrap() {
        names.push(user.name);
    }
    names.sort();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
}
