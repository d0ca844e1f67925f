///
/// Field Info Resolution
///
/// Turns a record's member declarations into the lookup table used by the
/// scanner: lower-cased external name -> (member index, kind).
///
/// Naming rules:
/// - A non-empty tag is used as the external name, lower-cased
/// - Otherwise the member name is snake cased: `FieldName` -> `field_name`
/// - Members tagged "-", private members and embedded members are skipped
/// - On a name collision the later declaration wins
///
/// Resolved tables are cached per record type for the life of the process
/// in FIELD_INFOS, a LazyLock<RwLock<HashMap>> keyed by TypeId. Two threads
/// resolving the same new type may both build the table; the results are
/// identical so whichever insert lands last is kept.
///

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::debug;

use crate::record::{FieldDecl, Kind, Record, EXCLUDE_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub index: usize,
    pub kind: Kind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInfo {
    fields: IndexMap<String, FieldSlot>,
}

impl FieldInfo {
    pub fn from_decls(decls: &[FieldDecl]) -> Self {
        let mut fields = IndexMap::with_capacity(decls.len());

        for (index, decl) in decls.iter().enumerate() {
            if !decl.exported || decl.embedded || decl.tag == Some(EXCLUDE_TAG) {
                continue;
            }

            let name = match decl.tag {
                Some(tag) if !tag.is_empty() => tag.to_lowercase(),
                _ => snake_cased_name(decl.name),
            };

            fields.insert(name, FieldSlot { index, kind: decl.kind });
        }

        Self { fields }
    }

    /// Looks up a result column, ignoring case.
    pub fn get(&self, column: &str) -> Option<FieldSlot> {
        if let Some(slot) = self.fields.get(column) {
            return Some(*slot);
        }
        self.fields.get(&column.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Sorted, comma separated external names.
    pub fn columns(&self) -> String {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        names.join(", ")
    }
}

static FIELD_INFOS: LazyLock<RwLock<HashMap<TypeId, Arc<FieldInfo>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the cached field info for `T`, resolving it on first use.
pub fn field_info<T: Record>() -> Arc<FieldInfo> {
    let type_id = TypeId::of::<T>();

    let cached = FIELD_INFOS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned();
    if let Some(info) = cached {
        return info;
    }

    let info = Arc::new(FieldInfo::from_decls(T::fields()));
    debug!(
        record = type_name::<T>(),
        columns = info.len(),
        "resolved record field info"
    );

    FIELD_INFOS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(type_id, Arc::clone(&info));

    info
}

/// Column list for a SELECT of `T`: sorted external names joined by ", ".
pub fn columns<T: Record>() -> String {
    field_info::<T>().columns()
}

/// Same as `columns`, taking an exemplar value.
pub fn columns_of<T: Record>(_record: &T) -> String {
    columns::<T>()
}

/// Converts a member name to its default column name.
///
/// An underscore goes before every ASCII uppercase letter except at the
/// start, and those letters are lower-cased.
pub fn snake_cased_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}
