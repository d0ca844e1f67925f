///
/// Null coercion for statement parameters.
///
/// `as_nullable` maps zero-valued scalars to `None` so they bind as SQL
/// NULL (rusqlite binds `Option<T>` as NULL when it is `None`):
///
/// ```rust,ignore
/// conn.execute(
///     "INSERT INTO users (name, manager_id) VALUES (?1, ?2)",
///     params![as_nullable(name.as_str()), as_nullable(manager_id)],
/// )?;
/// ```
///
/// Zero means numeric zero, or a string that is empty after trimming.
/// Booleans and blobs are never treated as zero.
///

use rusqlite::types::Value;

pub trait NullCoerce {
    /// Whether this value should be sent as NULL.
    fn is_null_equivalent(&self) -> bool;
}

macro_rules! int_null_coerce {
    ($($ty:ty),*) => {
        $(
            impl NullCoerce for $ty {
                fn is_null_equivalent(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

int_null_coerce!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl NullCoerce for f32 {
    fn is_null_equivalent(&self) -> bool {
        *self == 0.0
    }
}

impl NullCoerce for f64 {
    fn is_null_equivalent(&self) -> bool {
        *self == 0.0
    }
}

impl NullCoerce for str {
    fn is_null_equivalent(&self) -> bool {
        self.trim().is_empty()
    }
}

impl NullCoerce for String {
    fn is_null_equivalent(&self) -> bool {
        self.as_str().is_null_equivalent()
    }
}

impl NullCoerce for bool {
    fn is_null_equivalent(&self) -> bool {
        false
    }
}

impl NullCoerce for [u8] {
    fn is_null_equivalent(&self) -> bool {
        false
    }
}

impl NullCoerce for Vec<u8> {
    fn is_null_equivalent(&self) -> bool {
        false
    }
}

impl NullCoerce for Value {
    fn is_null_equivalent(&self) -> bool {
        match self {
            Value::Integer(i) => i.is_null_equivalent(),
            Value::Real(f) => f.is_null_equivalent(),
            Value::Text(s) => s.is_null_equivalent(),
            Value::Null | Value::Blob(_) => false,
        }
    }
}

impl<T: NullCoerce + ?Sized> NullCoerce for &T {
    fn is_null_equivalent(&self) -> bool {
        (**self).is_null_equivalent()
    }
}

/// Returns `None` for zero-valued scalars, `Some(value)` otherwise.
pub fn as_nullable<T: NullCoerce>(value: T) -> Option<T> {
    if value.is_null_equivalent() {
        None
    } else {
        Some(value)
    }
}
