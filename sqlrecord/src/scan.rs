///
/// Row Scanning
///
/// `scan` fills a record from the current row of a row source by column
/// name. One scan target is built per result column, in column order:
///
/// - Discard: the column maps to no member; whatever value arrives is dropped
/// - Direct: the member is written through its `FromSql` impl, so NULL
///   handling is whatever that impl does (usually an error)
/// - Nullable: bool, integer, float and string members are filled through an
///   Option holder; after a successful fill Some(v) is stored and None stores
///   the member's zero value (false, 0, 0.0, "")
///
/// - Scratch: an earlier duplicate of a column whose member is owned by a
///   later column; the value is converted as the member's kind and dropped
///
/// The row source is asked to fill all targets in a single call and its
/// errors are returned unchanged. Nullable members are written only after
/// that call succeeds.
///

use std::any::type_name;
use std::collections::HashMap;

use rusqlite::types::{FromSql, FromSqlResult, ValueRef};
use tracing::trace;

use crate::field_info::{field_info, FieldSlot};
use crate::record::{DirectTarget, FloatMut, IntMut, Kind, MemberMut, Record};

/// The current row of a query result.
pub trait Rows {
    type Error;

    /// Column names of the current row, in result order.
    fn columns(&self) -> Result<Vec<String>, Self::Error>;

    /// Fills `targets` positionally from the current row's values, by
    /// calling `ScanTarget::set` once per target.
    fn scan(&self, targets: &mut [ScanTarget<'_>]) -> Result<(), Self::Error>;
}

enum Nullable<'a> {
    Bool(&'a mut bool, Option<bool>),
    Int(IntMut<'a>, Option<i64>),
    Float(FloatMut<'a>, Option<f64>),
    String(&'a mut String, Option<String>),
}

impl Nullable<'_> {
    fn set(&mut self, value: ValueRef<'_>) -> FromSqlResult<()> {
        match self {
            Nullable::Bool(_, v) => *v = FromSql::column_result(value)?,
            Nullable::Int(_, v) => *v = FromSql::column_result(value)?,
            Nullable::Float(_, v) => *v = FromSql::column_result(value)?,
            Nullable::String(_, v) => *v = FromSql::column_result(value)?,
        }
        Ok(())
    }

    fn commit(self) {
        match self {
            Nullable::Bool(member, v) => *member = v.unwrap_or_default(),
            Nullable::Int(member, v) => member.store(v.unwrap_or_default()),
            Nullable::Float(member, v) => member.store(v.unwrap_or_default()),
            Nullable::String(member, v) => *member = v.unwrap_or_default(),
        }
    }
}

/// Conversion-only holder for a duplicate column of a nullable member.
enum Scratch {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    String(Option<String>),
}

impl Scratch {
    fn for_kind(kind: Kind) -> Option<Self> {
        if !kind.is_nullable() {
            return None;
        }
        Some(match kind {
            Kind::Bool => Scratch::Bool(None),
            Kind::Int | Kind::Uint => Scratch::Int(None),
            Kind::Float => Scratch::Float(None),
            _ => Scratch::String(None),
        })
    }

    fn set(&mut self, value: ValueRef<'_>) -> FromSqlResult<()> {
        match self {
            Scratch::Bool(v) => *v = FromSql::column_result(value)?,
            Scratch::Int(v) => *v = FromSql::column_result(value)?,
            Scratch::Float(v) => *v = FromSql::column_result(value)?,
            Scratch::String(v) => *v = FromSql::column_result(value)?,
        }
        Ok(())
    }
}

enum Slot<'a> {
    Discard,
    Scratch(Scratch),
    Direct(&'a mut dyn DirectTarget),
    Nullable(Nullable<'a>),
}

/// Destination for one column of the current row.
pub struct ScanTarget<'a> {
    slot: Slot<'a>,
}

impl<'a> ScanTarget<'a> {
    /// A target that accepts any value and keeps none of it.
    pub fn discard() -> Self {
        Self { slot: Slot::Discard }
    }

    /// Picks the target for a record member: nullable-eligible kinds get a
    /// nullable holder, everything else is written directly.
    pub fn for_member(member: MemberMut<'a>) -> Self {
        let slot = match member {
            MemberMut::Bool(m) => Slot::Nullable(Nullable::Bool(m, None)),
            MemberMut::Int(m) => Slot::Nullable(Nullable::Int(m, None)),
            MemberMut::Float(m) => Slot::Nullable(Nullable::Float(m, None)),
            MemberMut::String(m) => Slot::Nullable(Nullable::String(m, None)),
            MemberMut::Other(m) => Slot::Direct(m),
        };
        Self { slot }
    }

    /// Delivers the column value for this target.
    pub fn set(&mut self, value: ValueRef<'_>) -> FromSqlResult<()> {
        match &mut self.slot {
            Slot::Discard => Ok(()),
            Slot::Scratch(scratch) => scratch.set(value),
            Slot::Direct(target) => target.set_value(value),
            Slot::Nullable(nullable) => nullable.set(value),
        }
    }

    fn commit(self) {
        if let Slot::Nullable(nullable) = self.slot {
            nullable.commit();
        }
    }
}

/// Scans the current row of `rows` into `dest`.
///
/// Columns with no matching member are ignored. Members with no matching
/// column are left unchanged. When several columns map to the same member
/// the last one is kept; earlier ones are still converted, so a bad value
/// there is reported. Earlier duplicates of a direct (`Kind::Other`)
/// member are discarded unconverted, since only the member itself knows
/// its target type.
///
/// # Panics
///
/// Panics if `T::members_mut` does not return one member per entry of
/// `T::fields`, or if a mapped member's kind differs from its declared kind.
pub fn scan<T, R>(dest: &mut T, rows: &R) -> Result<(), R::Error>
where
    T: Record,
    R: Rows + ?Sized,
{
    let info = field_info::<T>();
    let declared = T::fields().len();

    let members = dest.members_mut();
    if members.len() != declared {
        panic!(
            "{}::members_mut returned {} members for {} declared fields",
            type_name::<T>(),
            members.len(),
            declared
        );
    }

    let columns = rows.columns()?;
    let mapped: Vec<Option<FieldSlot>> = columns.iter().map(|c| info.get(c)).collect();

    let mut owner: HashMap<usize, usize> = HashMap::with_capacity(mapped.len());
    for (position, slot) in mapped.iter().enumerate() {
        if let Some(slot) = slot {
            owner.insert(slot.index, position);
        }
    }

    let mut members: Vec<Option<MemberMut<'_>>> = members.into_iter().map(Some).collect();
    let mut targets = Vec::with_capacity(columns.len());

    for (position, slot) in mapped.iter().enumerate() {
        let Some(slot) = slot else {
            trace!(column = %columns[position], "discarding unmapped column");
            targets.push(ScanTarget::discard());
            continue;
        };

        if owner.get(&slot.index) != Some(&position) {
            let target = match Scratch::for_kind(slot.kind) {
                Some(scratch) => ScanTarget {
                    slot: Slot::Scratch(scratch),
                },
                None => ScanTarget::discard(),
            };
            targets.push(target);
            continue;
        }

        let Some(member) = members[slot.index].take() else {
            targets.push(ScanTarget::discard());
            continue;
        };
        if member.kind() != slot.kind {
            panic!(
                "{}: member {} is declared {:?} but members_mut returned {:?}",
                type_name::<T>(),
                slot.index,
                slot.kind,
                member.kind()
            );
        }
        targets.push(ScanTarget::for_member(member));
    }

    trace!(
        record = type_name::<T>(),
        columns = targets.len(),
        "scanning row"
    );
    rows.scan(&mut targets)?;

    for target in targets {
        target.commit();
    }

    Ok(())
}

/// Scans the current row into a fresh `T::default()`.
///
/// Fits `rusqlite::Statement::query_map`:
///
/// ```rust,ignore
/// let users = stmt.query_map([], |row| from_row::<User, _>(row))?;
/// ```
pub fn from_row<T, R>(rows: &R) -> Result<T, R::Error>
where
    T: Record + Default,
    R: Rows + ?Sized,
{
    let mut record = T::default();
    scan(&mut record, rows)?;
    Ok(record)
}
