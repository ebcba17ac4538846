use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ParamValue – one entry of a flat parameter mapping
// ---------------------------------------------------------------------------

/// A dynamically-typed parameter value, as it arrives from JSON or a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integers, and floats with no fractional part, as a non-negative count.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Integer(i) if *i >= 0 => Some(*i as usize),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Integer(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Flat key → value mapping handed to an estimator constructor.
pub type Params = BTreeMap<String, ParamValue>;

/// Build a [`Params`] mapping from `(key, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ---------------------------------------------------------------------------
// ParamReader – typed lookups with defaults
// ---------------------------------------------------------------------------

/// Typed view over an optional [`Params`] mapping.
///
/// Missing keys yield the supplied default. A present key with the wrong type
/// is logged and also yields the default. Keys nobody asks for are ignored.
pub(crate) struct ParamReader<'a> {
    method: &'static str,
    params: Option<&'a Params>,
}

impl<'a> ParamReader<'a> {
    pub(crate) fn new(method: &'static str, params: Option<&'a Params>) -> Self {
        Self { method, params }
    }

    fn lookup<T>(&self, key: &str, default: T, convert: impl Fn(&ParamValue) -> Option<T>) -> T {
        let Some(value) = self.params.and_then(|p| p.get(key)) else {
            return default;
        };
        match convert(value) {
            Some(v) => v,
            None => {
                log::warn!(
                    "{}: ignoring parameter '{key}' with unexpected value {value}",
                    self.method
                );
                default
            }
        }
    }

    pub(crate) fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.lookup(key, default, ParamValue::as_f64)
    }

    pub(crate) fn usize_or(&self, key: &str, default: usize) -> usize {
        self.lookup(key, default, ParamValue::as_usize)
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> bool {
        self.lookup(key, default, ParamValue::as_bool)
    }

    pub(crate) fn str_or(&self, key: &str, default: &str) -> String {
        self.lookup(key, default.to_string(), |v| v.as_str().map(str::to_string))
    }
}

// ---------------------------------------------------------------------------
// ParamRange – tuning-domain metadata
// ---------------------------------------------------------------------------

/// How a UI or optimizer should step through a parameter's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Integer,
    Linear,
    Log,
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleKind::Integer => write!(f, "integer"),
            ScaleKind::Linear => write!(f, "linear"),
            ScaleKind::Log => write!(f, "log"),
        }
    }
}

/// Recommended `(min, max, scale)` domain of one tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub scale: ScaleKind,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64, scale: ScaleKind) -> Self {
        Self { min, max, scale }
    }

    pub const fn integer(min: f64, max: f64) -> Self {
        Self::new(min, max, ScaleKind::Integer)
    }

    pub const fn linear(min: f64, max: f64) -> Self {
        Self::new(min, max, ScaleKind::Linear)
    }

    pub const fn log(min: f64, max: f64) -> Self {
        Self::new(min, max, ScaleKind::Log)
    }

    /// The range as a `(min, max, kind)` triple.
    pub fn as_tuple(&self) -> (f64, f64, ScaleKind) {
        (self.min, self.max, self.scale)
    }
}

/// Parameter name (suffixed, e.g. `smoothness_`) → range.
pub type ParamRanges = BTreeMap<&'static str, ParamRange>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_deserialize_from_json() {
        let p: Params = serde_json::from_str(
            r#"{"window": 10, "kind": "cubic", "tangent": true, "smoothness_param": 1e6}"#,
        )
        .unwrap();
        assert_eq!(p["window"], ParamValue::Integer(10));
        assert_eq!(p["kind"], ParamValue::Text("cubic".into()));
        assert_eq!(p["tangent"], ParamValue::Bool(true));
        assert_eq!(p["smoothness_param"], ParamValue::Float(1e6));
    }

    #[test]
    fn reader_falls_back_on_missing_and_mistyped_keys() {
        let p = params([("max_iters", ParamValue::from("ten")), ("conv_thresh", 0.5_f64.into())]);
        let r = ParamReader::new("test", Some(&p));
        assert_eq!(r.usize_or("max_iters", 10), 10);
        assert_eq!(r.f64_or("conv_thresh", 1e-3), 0.5);
        assert_eq!(r.f64_or("missing", 2.0), 2.0);
        assert!(!ParamReader::new("test", None).bool_or("verbose", false));
    }

    #[test]
    fn integral_floats_count_as_integers() {
        assert_eq!(ParamValue::Float(30.0).as_usize(), Some(30));
        assert_eq!(ParamValue::Float(30.5).as_usize(), None);
        assert_eq!(ParamValue::Integer(-1).as_usize(), None);
        assert_eq!(ParamValue::Integer(3).as_f64(), Some(3.0));
    }

    #[test]
    fn ranges_serialize_with_lowercase_kind() {
        let json = serde_json::to_string(&ParamRange::log(1.0, 1e4)).unwrap();
        assert_eq!(json, r#"{"min":1.0,"max":10000.0,"scale":"log"}"#);
    }
}
