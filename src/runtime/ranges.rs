//! Decoding of range specification tuples for views and comprehensions.
//!
//! A view range is `(start, stride, end)` applying to dimension `i` by
//! position, or `(dim, start, stride, end)`; a `dim` of Null gives the range
//! used for every dimension not listed. Start and end may be Null ("to the
//! edge") unless the stride is zero. A comprehension range is
//! `(dim, start, stride, end, name)` with no Nulls.

use std::collections::BTreeMap;

use crate::array::Range;
use crate::ast::Location;
use crate::diagnostics::ProtoError;
use crate::{proto_ensure, proto_err};
use crate::value::Value;

/// Decoded range specifications, keyed by dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeSpecs {
    pub by_dim: BTreeMap<usize, Range>,
    /// The range for unlisted dimensions, from a spec whose dimension is Null.
    pub default: Option<Range>,
    /// Index variable names (comprehensions only).
    pub names: BTreeMap<usize, String>,
}

impl RangeSpecs {
    /// Highest dimension with an explicit range.
    pub fn max_dimension(&self) -> Option<usize> {
        self.by_dim.keys().next_back().copied()
    }

    /// Number of specifications supplied, the default range included.
    pub fn count(&self) -> usize {
        self.by_dim.len() + usize::from(self.default.is_some())
    }
}

fn range_element(
    value: &Value,
    null_ok: bool,
    spec: usize,
    location: &Location,
) -> Result<Option<i64>, ProtoError> {
    match value {
        Value::Null if null_ok => Ok(None),
        other => match other.as_number() {
            Some(n) => Ok(Some(n as i64)),
            None => Err(proto_err!(
                KindMismatch,
                location,
                "The start, stride, end, and dimension of the range specification {spec} must be an integer{}.",
                if null_ok { " or Null" } else { "" }
            )),
        },
    }
}

/// Decodes view range tuples (3- or 4-tuples).
pub fn view_specs(tuples: &[Value], location: &Location) -> Result<RangeSpecs, ProtoError> {
    extract(tuples, location, false)
}

/// Decodes comprehension range tuples (5-tuples with an index name).
pub fn comprehension_specs(tuples: &[Value], location: &Location) -> Result<RangeSpecs, ProtoError> {
    extract(tuples, location, true)
}

fn extract(tuples: &[Value], location: &Location, named: bool) -> Result<RangeSpecs, ProtoError> {
    let mut items = Vec::with_capacity(tuples.len());
    for (i, tuple) in tuples.iter().enumerate() {
        let spec = tuple.as_tuple().ok_or_else(|| {
            proto_err!(KindMismatch, location, "Range specification {i} is not a tuple.")
        })?;
        items.push(spec);
    }

    let nulls_ok = !named;
    let mut specs = RangeSpecs::default();
    let mut tuple_len = 0;
    for (i, spec) in items.into_iter().enumerate() {
        let n = spec.len();
        if tuple_len == 0 {
            if named {
                proto_ensure!(n == 5, Shape, location, "Range specification {i} has {n} not 5 items.");
            } else {
                proto_ensure!(
                    n == 3 || n == 4,
                    Shape,
                    location,
                    "Range specifications must be 3-tuples or 4-tuples; specification {i} has {n} items."
                );
            }
            tuple_len = n;
        } else {
            proto_ensure!(
                n == tuple_len,
                Shape,
                location,
                "All range specifications must have the same number of items; specification {i} has {n} not {tuple_len}."
            );
        }

        let dimension = if n == 3 {
            Some(i)
        } else {
            match range_element(&spec[0], nulls_ok, i, location)? {
                None => None,
                Some(d) if d >= 0 => Some(d as usize),
                Some(d) => {
                    return Err(proto_err!(
                        Shape,
                        location,
                        "The dimension {d} in range specification {i} is not a valid dimension."
                    ))
                }
            }
        };
        let duplicate = match dimension {
            Some(d) => specs.by_dim.contains_key(&d),
            None => specs.default.is_some(),
        };
        if duplicate {
            let label = dimension.map_or_else(|| "Null".to_string(), |d| d.to_string());
            return Err(proto_err!(
                Shape,
                location,
                "Multiple range specifications given for dimension {label}."
            ));
        }

        let offset = if n == 3 { 0 } else { 1 };
        let stride = range_element(&spec[1 + offset], false, i, location)?.unwrap_or(0);
        let start = range_element(&spec[offset], nulls_ok && stride != 0, i, location)?;
        let end = range_element(&spec[2 + offset], nulls_ok && stride != 0, i, location)?;
        let range = Range::with_bounds(start, stride, end);

        if named {
            let name = spec[4].as_str().ok_or_else(|| {
                proto_err!(
                    KindMismatch,
                    location,
                    "The fifth item in range specification {i} is not a string"
                )
            })?;
            if let Some(d) = dimension {
                specs.names.insert(d, name.to_string());
            }
        }
        match dimension {
            Some(d) => {
                specs.by_dim.insert(d, range);
            }
            None => specs.default = Some(range),
        }
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(items: Vec<Value>) -> Value {
        Value::tuple(items)
    }

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn positional_and_default_ranges() {
        let loc = Location::default();
        let specs = view_specs(&[t(vec![n(0.0), n(1.0), Value::Null]), t(vec![n(2.0), n(0.0), n(2.0)])], &loc).unwrap();
        assert_eq!(specs.by_dim[&0], Range::with_bounds(Some(0), 1, None));
        assert_eq!(specs.by_dim[&1], Range::single(2));

        let specs = view_specs(&[t(vec![Value::Null, Value::Null, n(1.0), Value::Null])], &loc).unwrap();
        assert_eq!(specs.default, Some(Range::all()));
        assert!(specs.by_dim.is_empty());
    }

    #[test]
    fn mixed_lengths_and_duplicates_fail() {
        let loc = Location::default();
        let err = view_specs(&[t(vec![n(0.0), n(1.0), n(2.0)]), t(vec![n(0.0), n(0.0), n(1.0), n(2.0)])], &loc)
            .unwrap_err();
        assert_eq!(
            err.message(),
            "All range specifications must have the same number of items; specification 1 has 4 not 3."
        );
        let dup = t(vec![n(1.0), n(0.0), n(1.0), n(2.0)]);
        let err = view_specs(&[dup.clone(), dup], &loc).unwrap_err();
        assert_eq!(err.message(), "Multiple range specifications given for dimension 1.");
    }

    #[test]
    fn comprehension_ranges_need_names_and_no_nulls() {
        let loc = Location::default();
        let specs = comprehension_specs(&[t(vec![n(0.0), n(0.0), n(1.0), n(10.0), Value::from("i")])], &loc).unwrap();
        assert_eq!(specs.names[&0], "i");
        let err = comprehension_specs(&[t(vec![n(0.0), Value::Null, n(1.0), n(10.0), Value::from("i")])], &loc)
            .unwrap_err();
        assert!(err.message().ends_with("must be an integer."));
        let err = comprehension_specs(&[t(vec![n(0.0), n(0.0), n(1.0), n(10.0), n(3.0)])], &loc).unwrap_err();
        assert_eq!(err.message(), "The fifth item in range specification 0 is not a string");
        let err = comprehension_specs(&[n(1.0)], &loc).unwrap_err();
        assert_eq!(err.message(), "Range specification 0 is not a tuple.");
    }
}
