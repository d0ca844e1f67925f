///
/// SQLite row sources.
///
/// Two `Rows` implementations backed by rusqlite:
/// - `rusqlite::Row`: the live row handed to `query_map` / `Rows::next`.
///   Conversion failures become the same `rusqlite::Error` variants that
///   `Row::get` produces, so callers see ordinary rusqlite errors.
/// - `MaterializedRow`: an owned copy of one row (column names + values),
///   useful once the statement is gone or for rows built by hand.
///

use rusqlite::types::{FromSqlError, Value as SqlValue, ValueRef};
use rusqlite::{Error as SqliteError, Row};

use crate::errors::RowError;
use crate::scan::{Rows, ScanTarget};

fn conversion_error(row: &Row<'_>, idx: usize, value: ValueRef<'_>, err: FromSqlError) -> SqliteError {
    match err {
        FromSqlError::InvalidType => {
            let name = row
                .as_ref()
                .column_name(idx)
                .map(str::to_owned)
                .unwrap_or_default();
            SqliteError::InvalidColumnType(idx, name, value.data_type())
        }
        FromSqlError::OutOfRange(i) => SqliteError::IntegralValueOutOfRange(idx, i),
        err => SqliteError::FromSqlConversionFailure(idx, value.data_type(), Box::new(err)),
    }
}

impl Rows for Row<'_> {
    type Error = SqliteError;

    fn columns(&self) -> Result<Vec<String>, SqliteError> {
        Ok(self
            .as_ref()
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    fn scan(&self, targets: &mut [ScanTarget<'_>]) -> Result<(), SqliteError> {
        for (idx, target) in targets.iter_mut().enumerate() {
            let value = self.get_ref(idx)?;
            target
                .set(value)
                .map_err(|err| conversion_error(self, idx, value, err))?;
        }
        Ok(())
    }
}

/// One result row, detached from its statement.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRow {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl MaterializedRow {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Result<Self, RowError> {
        if columns.len() != values.len() {
            return Err(RowError::ValueCount {
                columns: columns.len(),
                values: values.len(),
            });
        }
        Ok(Self { columns, values })
    }

    /// Copies the current row out of a live statement.
    pub fn from_row(row: &Row<'_>) -> Result<Self, SqliteError> {
        let stmt = row.as_ref();
        let col_count = stmt.column_count();

        let mut columns = Vec::with_capacity(col_count);
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            columns.push(stmt.column_name(i)?.to_string());
            values.push(SqlValue::from(row.get_ref(i)?));
        }

        Ok(Self { columns, values })
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Value of the first column named `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))?;
        self.values.get(idx)
    }
}

impl Rows for MaterializedRow {
    type Error = RowError;

    fn columns(&self) -> Result<Vec<String>, RowError> {
        Ok(self.columns.clone())
    }

    fn scan(&self, targets: &mut [ScanTarget<'_>]) -> Result<(), RowError> {
        if targets.len() != self.values.len() {
            return Err(RowError::TargetCount {
                expected: self.values.len(),
                found: targets.len(),
            });
        }

        for (index, (target, value)) in targets.iter_mut().zip(&self.values).enumerate() {
            target
                .set(ValueRef::from(value))
                .map_err(|source| RowError::Conversion {
                    index,
                    column: self.columns[index].clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
