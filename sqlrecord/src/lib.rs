///
/// sqlrecord - map SQL result rows onto structs by column name
///
/// Member names are matched to column names after snake casing
/// (`FieldName` -> `field_name`), or through an explicit override in the
/// record declaration. Matching is case-insensitive.
///
/// - record: the `Record` trait, member handles and the `sql_record!` macro
/// - field_info: per-type name -> member tables, cached for the process
/// - scan: the `Rows` row-source trait and `scan` / `from_row`
/// - sqlite: `Rows` for `rusqlite::Row` and the owned `MaterializedRow`
/// - null: `as_nullable` for binding zero values as NULL
///
/// ```rust,ignore
/// sql_record! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64,
///         pub display_name: String => "name",
///         pub session: String => "-",
///     }
/// }
///
/// let sql = format!("SELECT {} FROM users", columns::<User>());
/// let mut stmt = conn.prepare(&sql)?;
/// let users = stmt
///     .query_map([], |row| from_row::<User, _>(row))?
///     .collect::<rusqlite::Result<Vec<_>>>()?;
/// ```
///

pub mod errors;
pub mod field_info;
pub mod null;
pub mod record;
pub mod scan;
pub mod sqlite;

pub use errors::RowError;
pub use field_info::{columns, columns_of, field_info, snake_cased_name, FieldInfo, FieldSlot};
pub use null::{as_nullable, NullCoerce};
pub use record::{
    DirectTarget, FieldDecl, FloatMut, IntMut, Kind, MemberMut, Record, SqlField, EXCLUDE_TAG,
};
pub use scan::{from_row, scan, Rows, ScanTarget};
pub use sqlite::MaterializedRow;
