//! # Scoped environment lookup.
//!
//! [`Env`] is a snapshot of process variables taken when the namespace is
//! created. Keys are stored and looked up uppercased, so lookups are
//! case-insensitive. A scoped snapshot keeps only keys starting with the
//! uppercased scope name:
//!
//! ```text
//! scope ""     → every variable
//! scope "svc"  → SVC_PORT, SVC_HOST, SVCX ... (prefix match on "SVC")
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::error::EnvError;
use crate::namespace::bind::{Bind, Binder};

/// Environment variables visible to one namespace.
#[derive(Clone, Debug, Default)]
pub struct Env {
    scope: String,
    vars: HashMap<String, String>,
}

impl Env {
    /// Every variable of the current process.
    pub fn process() -> Self {
        Self::scoped("")
    }

    /// Variables of the current process whose key starts with `scope` (case-insensitive).
    ///
    /// Variables that are not valid unicode are skipped.
    pub fn scoped(scope: &str) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(scope, vars)
    }

    /// Builds an environment from explicit pairs, applying the same scoping rule.
    ///
    /// ```
    /// use unitvisor::Env;
    ///
    /// let env = Env::from_vars("svc", [("SVC_PORT", "8080"), ("HOME", "/root")]);
    /// assert_eq!(env.get_env("svc_port"), Some("8080"));
    /// assert_eq!(env.get_env("HOME"), None);
    /// ```
    pub fn from_vars<I, K, V>(scope: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let scope = scope.to_uppercase();
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_uppercase(), v.into()))
            .filter(|(k, _)| k.starts_with(&scope))
            .collect();
        Self { scope, vars }
    }

    /// Uppercased scope prefix (`""` for the public namespace).
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Number of visible variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Raw value of `key`.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.vars.get(&key.to_uppercase()).map(String::as_str)
    }

    pub fn get_env_int(&self, key: &str) -> Result<i64, EnvError> {
        self.parse_with(key, |raw| i64::from_str(raw).map_err(|e| e.to_string()))
    }

    pub fn get_env_float(&self, key: &str) -> Result<f64, EnvError> {
        self.parse_with(key, |raw| f64::from_str(raw).map_err(|e| e.to_string()))
    }

    /// Accepts `1 t T TRUE true True 0 f F FALSE false False`.
    pub fn get_env_bool(&self, key: &str) -> Result<bool, EnvError> {
        self.parse_with(key, parse_bool)
    }

    /// Parses a naive date-time with a `chrono` format string (e.g. `"%Y-%m-%d %H:%M:%S"`).
    pub fn get_env_time(&self, key: &str, format: &str) -> Result<NaiveDateTime, EnvError> {
        self.parse_with(key, |raw| {
            NaiveDateTime::parse_from_str(raw, format).map_err(|e| e.to_string())
        })
    }

    /// Parses durations like `"250ms"`, `"1.5s"` or `"1h30m"`.
    pub fn get_env_duration(&self, key: &str) -> Result<Duration, EnvError> {
        self.parse_with(key, parse_duration)
    }

    /// Populates `dest` from this environment; keys are used as written by the schema.
    ///
    /// ```
    /// use unitvisor::{Bind, Binder, Env, EnvError};
    ///
    /// #[derive(Default)]
    /// struct Http { port: u16, hosts: Vec<String> }
    ///
    /// impl Bind for Http {
    ///     fn bind(&mut self, b: &mut Binder<'_>) -> Result<(), EnvError> {
    ///         b.required("svc_port", &mut self.port)?;
    ///         b.optional("svc_hosts", &mut self.hosts)
    ///     }
    /// }
    ///
    /// let env = Env::from_vars("svc", [("SVC_PORT", "8080"), ("SVC_HOSTS", "a, b")]);
    /// let mut http = Http::default();
    /// env.assign(&mut http)?;
    /// assert_eq!(http.port, 8080);
    /// assert_eq!(http.hosts, ["a", "b"]);
    /// # Ok::<(), EnvError>(())
    /// ```
    pub fn assign<B: Bind + ?Sized>(&self, dest: &mut B) -> Result<(), EnvError> {
        dest.bind(&mut Binder::new(self, ""))
    }

    /// Like [`Env::assign`], but every key is prefixed with the scope (`SVC_` + key).
    pub fn assign_scoped<B: Bind + ?Sized>(&self, dest: &mut B) -> Result<(), EnvError> {
        dest.bind(&mut Binder::new(self, &self.scope))
    }

    fn parse_with<T>(
        &self,
        key: &str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, EnvError> {
        let key = key.to_uppercase();
        let raw = self
            .vars
            .get(&key)
            .ok_or_else(|| EnvError::Missing { key: key.clone() })?;
        parse(raw).map_err(|reason| EnvError::Parse {
            key,
            value: raw.clone(),
            reason,
        })
    }
}

/// Parses the boolean spellings accepted by [`Env::get_env_bool`].
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean {raw:?}")),
    }
}

/// Parses a sequence of decimal numbers with unit suffixes.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is accepted.
///
/// ```
/// use std::time::Duration;
/// use unitvisor::parse_duration;
///
/// assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
/// assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let s = raw.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total_ns: f64 = 0.0;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(format!("invalid duration {raw:?}"));
        }
        let number: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid duration {raw:?}"))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {raw:?}")),
            unit => return Err(format!("unknown unit {unit:?} in duration {raw:?}")),
        };
        rest = &rest[unit_len..];
        total_ns += number * scale;
    }

    if !total_ns.is_finite() || total_ns > u64::MAX as f64 {
        return Err(format!("duration {raw:?} out of range"));
    }
    Ok(Duration::from_nanos(total_ns.round() as u64))
}
