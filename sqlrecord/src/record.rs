///
/// Record Declarations
///
/// A record is a struct whose members can be filled from a result row by
/// name. Each record publishes a static list of member declarations, in
/// declaration order, through the `Record` trait:
///
/// - name: the Rust member name, used to derive the external column name
/// - tag: optional override; an explicit column name or the exclusion marker
/// - exported: only `pub` members take part in mapping
/// - embedded: embedded members are never mapped
/// - kind: decides whether the member is scanned through a nullable wrapper
///
/// `members_mut()` hands out one mutable handle per declared member, in the
/// same order, so the scanner can borrow disjoint members at once.
///
/// The `sql_record!` macro writes both halves for a plain struct:
///
/// ```rust,ignore
/// sql_record! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64,
///         pub name: String => "user_name",
///         pub cached: bool => "-",
///     }
/// }
/// ```
///

use rusqlite::types::{FromSql, FromSqlResult, ValueRef};

/// Tag value that removes a member from mapping.
pub const EXCLUDE_TAG: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Other,
}

impl Kind {
    /// Kinds scanned through a nullable wrapper, where NULL becomes the zero value.
    pub fn is_nullable(self) -> bool {
        !matches!(self, Kind::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub tag: Option<&'static str>,
    pub exported: bool,
    pub embedded: bool,
    pub kind: Kind,
}

impl FieldDecl {
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            tag: None,
            exported: true,
            embedded: false,
            kind,
        }
    }

    pub const fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    pub const fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    pub const fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

/// A struct that can be filled from a row by column name.
pub trait Record: 'static {
    /// Member declarations in declaration order.
    fn fields() -> &'static [FieldDecl];

    /// One handle per entry of `fields()`, in the same order.
    fn members_mut(&mut self) -> Vec<MemberMut<'_>>;
}

/// Anything a row source can write a column value into directly.
pub trait DirectTarget {
    fn set_value(&mut self, value: ValueRef<'_>) -> FromSqlResult<()>;
}

impl<T: FromSql> DirectTarget for T {
    fn set_value(&mut self, value: ValueRef<'_>) -> FromSqlResult<()> {
        *self = T::column_result(value)?;
        Ok(())
    }
}

pub enum IntMut<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
}

impl IntMut<'_> {
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            IntMut::U8(_) | IntMut::U16(_) | IntMut::U32(_) | IntMut::U64(_) | IntMut::Usize(_)
        )
    }

    /// Stores `value`, truncating to the member's width.
    pub fn store(self, value: i64) {
        match self {
            IntMut::I8(m) => *m = value as i8,
            IntMut::I16(m) => *m = value as i16,
            IntMut::I32(m) => *m = value as i32,
            IntMut::I64(m) => *m = value,
            IntMut::Isize(m) => *m = value as isize,
            IntMut::U8(m) => *m = value as u8,
            IntMut::U16(m) => *m = value as u16,
            IntMut::U32(m) => *m = value as u32,
            IntMut::U64(m) => *m = value as u64,
            IntMut::Usize(m) => *m = value as usize,
        }
    }
}

pub enum FloatMut<'a> {
    F32(&'a mut f32),
    F64(&'a mut f64),
}

impl FloatMut<'_> {
    pub fn store(self, value: f64) {
        match self {
            FloatMut::F32(m) => *m = value as f32,
            FloatMut::F64(m) => *m = value,
        }
    }
}

/// Mutable handle to one record member, tagged with its kind.
pub enum MemberMut<'a> {
    Bool(&'a mut bool),
    Int(IntMut<'a>),
    Float(FloatMut<'a>),
    String(&'a mut String),
    Other(&'a mut dyn DirectTarget),
}

impl MemberMut<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            MemberMut::Bool(_) => Kind::Bool,
            MemberMut::Int(m) if m.is_unsigned() => Kind::Uint,
            MemberMut::Int(_) => Kind::Int,
            MemberMut::Float(_) => Kind::Float,
            MemberMut::String(_) => Kind::String,
            MemberMut::Other(_) => Kind::Other,
        }
    }
}

/// Member types usable inside `sql_record!`.
///
/// Types outside the built-in scalars opt in with `Kind::Other` and hand
/// themselves out as a direct target:
///
/// ```rust,ignore
/// impl SqlField for Email {
///     const KIND: Kind = Kind::Other;
///     fn member_mut(&mut self) -> MemberMut<'_> {
///         MemberMut::Other(self)
///     }
/// }
/// ```
pub trait SqlField {
    const KIND: Kind;

    fn member_mut(&mut self) -> MemberMut<'_>;
}

impl SqlField for bool {
    const KIND: Kind = Kind::Bool;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::Bool(self)
    }
}

impl SqlField for String {
    const KIND: Kind = Kind::String;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::String(self)
    }
}

macro_rules! int_fields {
    ($($ty:ty => $variant:ident, $kind:ident);* $(;)?) => {
        $(
            impl SqlField for $ty {
                const KIND: Kind = Kind::$kind;

                fn member_mut(&mut self) -> MemberMut<'_> {
                    MemberMut::Int(IntMut::$variant(self))
                }
            }
        )*
    };
}

int_fields! {
    i8 => I8, Int;
    i16 => I16, Int;
    i32 => I32, Int;
    i64 => I64, Int;
    isize => Isize, Int;
    u8 => U8, Uint;
    u16 => U16, Uint;
    u32 => U32, Uint;
    u64 => U64, Uint;
    usize => Usize, Uint;
}

impl SqlField for f32 {
    const KIND: Kind = Kind::Float;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::Float(FloatMut::F32(self))
    }
}

impl SqlField for f64 {
    const KIND: Kind = Kind::Float;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::Float(FloatMut::F64(self))
    }
}

impl SqlField for Vec<u8> {
    const KIND: Kind = Kind::Other;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::Other(self)
    }
}

impl SqlField for rusqlite::types::Value {
    const KIND: Kind = Kind::Other;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::Other(self)
    }
}

impl<T: FromSql> SqlField for Option<T> {
    const KIND: Kind = Kind::Other;

    fn member_mut(&mut self) -> MemberMut<'_> {
        MemberMut::Other(self)
    }
}

#[doc(hidden)]
pub const fn is_public(vis: &str) -> bool {
    let bytes = vis.as_bytes();
    bytes.len() == 3 && bytes[0] == b'p' && bytes[1] == b'u' && bytes[2] == b'b'
}

/// Declares a struct and implements `Record` for it.
///
/// A member may end in `=> "name"` to override its column name, or
/// `=> "-"` to leave it out of mapping. Only `pub` members are mapped.
#[macro_export]
macro_rules! sql_record {
    (@tag) => {
        ::core::option::Option::None
    };
    (@tag $tag:literal) => {
        ::core::option::Option::Some($tag)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> &'static [$crate::FieldDecl] {
                const FIELDS: &[$crate::FieldDecl] = &[
                    $(
                        $crate::FieldDecl {
                            name: ::core::stringify!($field),
                            tag: $crate::sql_record!(@tag $($tag)?),
                            exported: $crate::record::is_public(::core::stringify!($field_vis)),
                            embedded: false,
                            kind: <$ty as $crate::SqlField>::KIND,
                        },
                    )*
                ];
                FIELDS
            }

            fn members_mut(&mut self) -> ::std::vec::Vec<$crate::MemberMut<'_>> {
                ::std::vec![$($crate::SqlField::member_mut(&mut self.$field)),*]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::sql_record! {
        #[derive(Debug, Default)]
        struct Mixed {
            pub flag: bool,
            pub small: i8,
            pub count: u32,
            pub ratio: f32,
            pub label: String => "title",
            pub payload: Vec<u8> => "-",
            hidden: i64,
        }
    }

    #[test]
    fn test_macro_declarations() {
        let fields = Mixed::fields();
        assert_eq!(fields.len(), 7);

        assert_eq!(fields[0], FieldDecl::new("flag", Kind::Bool));
        assert_eq!(fields[2].kind, Kind::Uint);
        assert_eq!(fields[3].kind, Kind::Float);
        assert_eq!(fields[4].tag, Some("title"));
        assert_eq!(fields[5].tag, Some(EXCLUDE_TAG));
        assert_eq!(fields[5].kind, Kind::Other);
        assert!(!fields[6].exported);
        assert!(fields.iter().all(|f| !f.embedded));
    }

    #[test]
    fn test_members_follow_declaration_order() {
        let mut record = Mixed::default();
        let kinds: Vec<Kind> = record.members_mut().iter().map(MemberMut::kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::Bool,
                Kind::Int,
                Kind::Uint,
                Kind::Float,
                Kind::String,
                Kind::Other,
                Kind::Int,
            ]
        );
        assert_eq!(record.hidden, 0);
    }

    #[test]
    fn test_int_store_truncates() {
        let mut small = 0i8;
        IntMut::I8(&mut small).store(300);
        assert_eq!(small, 300i64 as i8);

        let mut wide = 0u64;
        IntMut::U64(&mut wide).store(42);
        assert_eq!(wide, 42);

        let mut single = 0f32;
        FloatMut::F32(&mut single).store(1.5);
        assert_eq!(single, 1.5);
    }

    #[test]
    fn test_direct_target_uses_from_sql() {
        let mut blob: Vec<u8> = Vec::new();
        blob.set_value(ValueRef::Blob(b"abc")).unwrap();
        assert_eq!(blob, b"abc");

        let mut maybe: Option<i64> = Some(3);
        maybe.set_value(ValueRef::Null).unwrap();
        assert_eq!(maybe, None);

        assert!(blob.set_value(ValueRef::Null).is_err());
    }

    #[test]
    fn test_is_public() {
        assert!(is_public("pub"));
        assert!(!is_public(""));
        assert!(!is_public("pub(crate)"));
    }

    #[test]
    fn test_field_decl_builders() {
        let decl = FieldDecl::new("Inner", Kind::Other).embedded().private().tag("x");
        assert!(decl.embedded);
        assert!(!decl.exported);
        assert_eq!(decl.tag, Some("x"));
        assert!(!Kind::Other.is_nullable());
        assert!(Kind::Uint.is_nullable());
    }
}
