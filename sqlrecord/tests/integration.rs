///
/// # Integration Tests for sqlrecord
///
/// End-to-end tests against SQLite: column lists built from record
/// declarations, scanning query results with NULLs and extra columns,
/// binding zero values as NULL, and concurrent field-info lookups.
///

use rusqlite::{params, Connection};
use tempfile::TempDir;

use sqlrecord::{as_nullable, columns, columns_of, from_row, scan, sql_record, MaterializedRow};

sql_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct User {
        pub id: i64,
        pub user_name: String,
        pub score: f64,
        pub active: bool,
        pub avatar: Vec<u8>,
        pub nickname: Option<String>,
        pub cached_rank: u32 => "-",
        session_token: String,
    }
}

#[allow(non_snake_case)]
mod legacy {
    sqlrecord::sql_record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct TestType {
            pub FieldA: String => "field_a",
            pub FieldB: String => "-",
            pub FieldC: String => "field_C",
            pub FieldD: String,
            pub FieldE: bool,
            pub FieldF: i32,
        }
    }
}

use legacy::TestType;

fn users_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            user_name TEXT,
            score REAL,
            active INTEGER,
            avatar BLOB NOT NULL DEFAULT x'',
            nickname TEXT
        );
        INSERT INTO users (id, user_name, score, active, avatar, nickname)
            VALUES (1, 'ada', 9.5, 1, x'0102', 'countess');
        INSERT INTO users (id, user_name, score, active, nickname)
            VALUES (2, NULL, NULL, NULL, NULL);",
    )
    .expect("Failed to create schema");
    conn
}

#[test]
fn test_columns_for_select() {
    insta::assert_snapshot!(
        columns::<User>(),
        @"active, avatar, id, nickname, score, user_name"
    );
    insta::assert_snapshot!(
        columns_of(&TestType::default()),
        @"field_a, field_c, field_d, field_e, field_f"
    );
}

#[test]
fn test_select_all_users() {
    let conn = users_db();
    let sql = format!("SELECT {} FROM users ORDER BY id", columns::<User>());
    let mut stmt = conn.prepare(&sql).expect("Failed to prepare");

    let users: Vec<User> = stmt
        .query_map([], |row| from_row::<User, _>(row))
        .expect("Failed to query")
        .collect::<rusqlite::Result<_>>()
        .expect("Failed to scan");

    assert_eq!(
        users[0],
        User {
            id: 1,
            user_name: "ada".to_string(),
            score: 9.5,
            active: true,
            avatar: vec![1, 2],
            nickname: Some("countess".to_string()),
            ..Default::default()
        }
    );
    assert_eq!(
        users[1],
        User {
            id: 2,
            ..Default::default()
        }
    );
}

#[test]
fn test_null_overwrites_previous_values() {
    let conn = users_db();
    let mut user = User {
        id: 99,
        user_name: "stale".to_string(),
        score: 1.0,
        active: true,
        nickname: Some("old".to_string()),
        cached_rank: 4,
        session_token: "abc".to_string(),
        ..Default::default()
    };

    conn.query_row(
        "SELECT user_name, score, active, nickname FROM users WHERE id = 2",
        [],
        |row| scan(&mut user, row),
    )
    .expect("Failed to scan");

    assert_eq!(user.id, 99);
    assert_eq!(user.user_name, "");
    assert_eq!(user.score, 0.0);
    assert!(!user.active);
    assert_eq!(user.nickname, None);
    assert_eq!(user.cached_rank, 4);
    assert_eq!(user.session_token, "abc");
}

#[test]
fn test_joined_columns_are_ignored() {
    let conn = users_db();
    conn.execute_batch(
        "CREATE TABLE logins (user_id INTEGER, at TEXT);
         INSERT INTO logins VALUES (1, '2024-01-01');",
    )
    .expect("Failed to create logins");

    let user = conn
        .query_row(
            "SELECT u.id, u.USER_NAME, l.at, l.user_id FROM users u JOIN logins l ON l.user_id = u.id",
            [],
            |row| from_row::<User, _>(row),
        )
        .expect("Failed to scan");

    assert_eq!(user.id, 1);
    assert_eq!(user.user_name, "ada");
    assert!(!user.active);
}

#[test]
fn test_null_into_direct_member_errors() {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    let err = conn
        .query_row("SELECT 5 AS id, NULL AS avatar", [], |row| {
            from_row::<User, _>(row)
        })
        .unwrap_err();

    assert!(matches!(err, rusqlite::Error::InvalidColumnType(1, _, _)));
}

#[test]
fn test_zero_values_bind_as_null() {
    let conn = users_db();
    conn.execute(
        "INSERT INTO users (id, user_name, score, active) VALUES (?1, ?2, ?3, ?4)",
        params![3, as_nullable("  "), as_nullable(0.0), as_nullable(false)],
    )
    .expect("Failed to insert");

    let (name_null, score_null, active): (bool, bool, i64) = conn
        .query_row(
            "SELECT user_name IS NULL, score IS NULL, active FROM users WHERE id = 3",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("Failed to read back");

    assert!(name_null);
    assert!(score_null);
    assert_eq!(active, 0);
}

#[test]
fn test_materialized_rows_from_file_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("legacy.db");

    {
        let conn = Connection::open(&path).expect("Failed to create database");
        conn.execute_batch(
            "CREATE TABLE legacy (field_a TEXT, field_b TEXT, field_c TEXT, field_d TEXT, field_e INTEGER);
             INSERT INTO legacy VALUES ('a', 'b', 'c', 'd', 1);",
        )
        .expect("Failed to create legacy table");
    }

    let conn = Connection::open(&path).expect("Failed to reopen database");
    let mut stmt = conn
        .prepare("SELECT field_a, field_b, field_c, field_d, field_e FROM legacy")
        .expect("Failed to prepare");
    let rows: Vec<MaterializedRow> = stmt
        .query_map([], MaterializedRow::from_row)
        .expect("Failed to query")
        .collect::<rusqlite::Result<_>>()
        .expect("Failed to materialize");
    drop(stmt);
    drop(conn);

    let record: TestType = from_row(&rows[0]).expect("Failed to scan");
    assert_eq!(
        record,
        TestType {
            FieldA: "a".to_string(),
            FieldB: String::new(),
            FieldC: "c".to_string(),
            FieldD: "d".to_string(),
            FieldE: true,
            FieldF: 0,
        }
    );
}

#[test]
fn test_concurrent_column_lists() {
    sql_record! {
        #[allow(non_snake_case)]
        #[derive(Debug, Default)]
        struct Fresh {
            pub zeta: i64,
            pub Alpha: String,
            pub middleName: String,
        }
    }

    let expected = "alpha, middle_name, zeta";
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| (0..100).map(|_| columns::<Fresh>()).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            let results = handle.join().expect("thread panicked");
            assert!(results.iter().all(|c| c == expected));
        }
    });
}
