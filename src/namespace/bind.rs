//! # Explicit environment binding.
//!
//! A configuration record describes its own schema by implementing [`Bind`]:
//! each field is declared with its key, whether it is required, or as a nested
//! record. No runtime type introspection is involved.
//!
//! ## Key resolution
//! ```text
//! key   = uppercase(field key)
//! full  = prefix.is_empty() ? key : prefix + "_" + key
//! nested("db", ..) → children resolve under prefix "DB" (or "<prefix>_DB")
//! ```
//!
//! ## Value kinds
//! [`FromEnvValue`] is implemented for `String`, every integer width, `f32`,
//! `f64`, `bool`, `Duration`, and `Vec<T>` of any of them (comma separated,
//! items trimmed).

use std::time::Duration;

use crate::error::EnvError;
use crate::namespace::env::{Env, parse_bool, parse_duration};

/// A record that can be populated from an [`Env`].
///
/// # Example
/// ```
/// use unitvisor::{Bind, Binder, Env, EnvError};
///
/// #[derive(Default)]
/// struct Db { host: String, pool: u32 }
///
/// #[derive(Default)]
/// struct App { debug: bool, db: Db }
///
/// impl Bind for Db {
///     fn bind(&mut self, b: &mut Binder<'_>) -> Result<(), EnvError> {
///         b.required("host", &mut self.host)?;
///         b.optional("pool", &mut self.pool)
///     }
/// }
///
/// impl Bind for App {
///     fn bind(&mut self, b: &mut Binder<'_>) -> Result<(), EnvError> {
///         b.optional("debug", &mut self.debug)?;
///         b.nested("db", &mut self.db)
///     }
/// }
///
/// let env = Env::from_vars("", [("DEBUG", "true"), ("DB_HOST", "pg"), ("DB_POOL", "8")]);
/// let mut app = App::default();
/// env.assign(&mut app)?;
/// assert!(app.debug);
/// assert_eq!((app.db.host.as_str(), app.db.pool), ("pg", 8));
/// # Ok::<(), EnvError>(())
/// ```
pub trait Bind {
    /// Declares every field of the record on `binder`.
    fn bind(&mut self, binder: &mut Binder<'_>) -> Result<(), EnvError>;
}

/// Walks one level of a [`Bind`] schema.
pub struct Binder<'a> {
    env: &'a Env,
    prefix: String,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(env: &'a Env, prefix: &str) -> Self {
        Self {
            env,
            prefix: prefix.to_uppercase(),
        }
    }

    /// Full uppercased key for a field of this record.
    pub fn key(&self, key: &str) -> String {
        let key = key.to_uppercase();
        if self.prefix.is_empty() {
            key
        } else {
            format!("{}_{key}", self.prefix)
        }
    }

    /// True when the key of a field of this record is set.
    pub fn contains(&self, key: &str) -> bool {
        self.env.get_env(&self.key(key)).is_some()
    }

    /// Sets `field` when the key is present; leaves it untouched otherwise.
    pub fn optional<T: FromEnvValue>(&mut self, key: &str, field: &mut T) -> Result<(), EnvError> {
        self.load(key, field, false)
    }

    /// Sets `field`; fails with [`EnvError::Missing`] naming the key when absent.
    pub fn required<T: FromEnvValue>(&mut self, key: &str, field: &mut T) -> Result<(), EnvError> {
        self.load(key, field, true)
    }

    /// Binds a nested record under `key`.
    pub fn nested<B: Bind + ?Sized>(&mut self, key: &str, record: &mut B) -> Result<(), EnvError> {
        let mut child = Binder {
            env: self.env,
            prefix: self.key(key),
        };
        record.bind(&mut child)
    }

    fn load<T: FromEnvValue>(
        &mut self,
        key: &str,
        field: &mut T,
        required: bool,
    ) -> Result<(), EnvError> {
        let key = self.key(key);
        let Some(raw) = self.env.get_env(&key) else {
            return if required {
                Err(EnvError::Missing { key })
            } else {
                Ok(())
            };
        };
        *field = T::from_env_value(raw).map_err(|reason| EnvError::Parse {
            key,
            value: raw.to_string(),
            reason,
        })?;
        Ok(())
    }
}

/// A value kind that can be parsed from one environment variable.
pub trait FromEnvValue: Sized {
    fn from_env_value(raw: &str) -> Result<Self, String>;
}

impl FromEnvValue for String {
    fn from_env_value(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromEnvValue for bool {
    fn from_env_value(raw: &str) -> Result<Self, String> {
        parse_bool(raw)
    }
}

impl FromEnvValue for Duration {
    fn from_env_value(raw: &str) -> Result<Self, String> {
        parse_duration(raw)
    }
}

macro_rules! from_str_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromEnvValue for $ty {
                fn from_env_value(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_str_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<T: FromEnvValue> FromEnvValue for Vec<T> {
    fn from_env_value(raw: &str) -> Result<Self, String> {
        raw.split(',')
            .map(|item| {
                T::from_env_value(item.trim()).map_err(|e| format!("error setting list element: {e}"))
            })
            .collect()
    }
}
