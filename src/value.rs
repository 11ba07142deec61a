use std::fmt;
use std::rc::Rc;

use crate::array::NdArray;
use crate::runtime::closure::Closure;

/// Represents a value in the protocol language.
///
/// A `Number` and a 0-dimensional `Array` are interchangeable wherever a
/// number is expected, and a `Number` may be used wherever an array is.
///
/// # Examples
///
/// ```rust
/// use protocore::value::Value;
/// let n = Value::Number(3.14);
/// assert_eq!(n.type_name(), "Number");
/// assert!(n.is_array());
/// let s = Value::from("hello");
/// assert_eq!(s.type_name(), "String");
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    Number(f64),
    Array(NdArray),
    String(Rc<str>),
    Tuple(Rc<[Value]>),
    Closure(Rc<Closure>),
    /// Explicit "no value"; what statements without a return yield.
    #[default]
    Null,
    /// Explicit request for a parameter's default.
    Default,
}

impl Value {
    /// Returns the type name of the value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Array(_) => "Array",
            Value::String(_) => "String",
            Value::Tuple(_) => "Tuple",
            Value::Closure(_) => "Function",
            Value::Null => "Null",
            Value::Default => "Default",
        }
    }

    /// True for numbers and 0-dimensional arrays.
    pub fn is_number(&self) -> bool {
        self.as_number().is_some()
    }

    /// True for arrays and numbers.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Number(_) | Value::Array(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Value::Default)
    }

    /// Returns the contained number for a Number or 0-d Array value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protocore::array::NdArray;
    /// use protocore::value::Value;
    /// assert_eq!(Value::Number(2.0).as_number(), Some(2.0));
    /// assert_eq!(Value::Array(NdArray::scalar(4.0)).as_number(), Some(4.0));
    /// assert_eq!(Value::Array(NdArray::new(vec![2])).as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Array(a) if a.num_dimensions() == 0 => Some(a.get(&[])),
            _ => None,
        }
    }

    /// Returns the value as an array; a Number becomes a 0-d array.
    pub fn as_array(&self) -> Option<NdArray> {
        match self {
            Value::Number(n) => Some(NdArray::scalar(*n)),
            Value::Array(a) => Some(a.clone()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Rc<Closure>> {
        match self {
            Value::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// Converts a boolean into the numeric truth values 1 and 0.
    pub fn from_bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(items.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<NdArray> for Value {
    fn from(a: NdArray) -> Self {
        Value::Array(a)
    }
}

/// Structural equality; closures compare by identity and a Number equals a
/// 0-d array holding the same number.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Null, Value::Null) | (Value::Default, Value::Default) => true,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Array(a) => write!(f, "Array({a:?})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            Value::Closure(c) => write!(f, "Closure({c:?})"),
            Value::Null => write!(f, "Null"),
            Value::Default => write!(f, "Default"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Array(a) => write!(f, "{a}"),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Closure(c) => write!(f, "<function of {} parameters>", c.num_params()),
            Value::Null => write!(f, "null"),
            Value::Default => write!(f, "default"),
        }
    }
}
