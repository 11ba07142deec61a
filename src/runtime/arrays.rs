//! # Array Expressions
//!
//! The array-valued expression kinds, operating on already-evaluated operands:
//! literals, comprehensions, views, `find`, `index`, `fold`, `map` and
//! accessors. Comprehensions evaluate their generator once per index tuple, so
//! they take the environment and evaluation context too.

use crate::array::{increment_indices, NdArray, Range};
use crate::ast::{Attribute, ExprNode, Location};
use crate::diagnostics::{ProtoError, Propagate};
use crate::runtime::closure::Closure;
use crate::runtime::environment::Environment;
use crate::runtime::eval::{self, EvaluationContext};
use crate::runtime::ranges;
use crate::value::Value;
use crate::{proto_ensure, proto_err};

/// Stacks same-shaped numbers or arrays along a new leading dimension.
pub fn create_literal(elements: &[Value], location: &Location) -> Result<Value, ProtoError> {
    proto_ensure!(!elements.is_empty(), Shape, location, "You cannot define an empty array.");
    let mut parts: Vec<NdArray> = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let array = element.as_array().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                location,
                "Elements of an array must be simple values or arrays; element {i} is neither."
            )
        })?;
        if let Some(first) = parts.first() {
            proto_ensure!(
                first.shape() == array.shape(),
                Shape,
                location,
                "All elements of an array must have the same shape; element {i} with shape {:?} does not match element 0 of shape {:?}.",
                array.shape(),
                first.shape()
            );
        }
        parts.push(array);
    }

    let mut shape = vec![parts.len()];
    shape.extend_from_slice(parts[0].shape());
    let data: Vec<f64> = parts.iter().flat_map(|part| part.to_vec()).collect();
    let result = NdArray::from_elements(shape, &data).map_err(|e| ProtoError::from_array(e, location))?;
    Ok(Value::Array(result))
}

/// Builds an array by evaluating `generator` over the cross product of the
/// given index ranges.
///
/// Ranges are taken in ascending dimension order. Dimensions without a range
/// are filled, in order, from the generator's result shape; any remaining
/// generator dimensions go at the end.
pub fn comprehension(
    generator: &ExprNode,
    range_values: &[Value],
    env: &Environment,
    context: &mut EvaluationContext,
    location: &Location,
) -> Result<Value, ProtoError> {
    proto_ensure!(!range_values.is_empty(), Shape, location, "You cannot define an empty array.");
    let specs = ranges::comprehension_specs(range_values, location)?;

    let mut generation_ranges = Vec::new();
    let mut generator_dims = Vec::new();
    let mut generator_extents = Vec::new();
    let mut index_names = Vec::new();
    // `None` marks a gap to fill from the sub-array shape.
    let mut extents: Vec<Option<usize>> = Vec::new();
    let mut view_ranges: Vec<Range> = Vec::new();
    let mut num_gaps = 0;

    for (&dim, range) in &specs.by_dim {
        let (begin, end) = (range.begin.unwrap_or(0), range.end.unwrap_or(0));
        proto_ensure!(
            range.step * (end - begin) > 0,
            Shape,
            location,
            "Stride and begin/end of range of dimension {dim} are inconsistent."
        );
        while extents.len() < dim {
            extents.push(None);
            view_ranges.push(Range::all());
            num_gaps += 1;
        }
        let extent = ((end - begin) as f64 / range.step as f64).ceil() as usize;
        extents.push(Some(extent));
        view_ranges.push(Range::all());
        generator_dims.push(dim);
        generator_extents.push(extent);
        generation_ranges.push((begin, range.step));
        index_names.push(specs.names.get(&dim).cloned().unwrap_or_default());
    }

    let num_sub_arrays: usize = generator_extents.iter().product();
    let mut generator_indices = vec![0usize; generator_extents.len()];
    let mut sub_array_shape: Option<Vec<usize>> = None;
    let mut result: Option<NdArray> = None;

    for i in 0..num_sub_arrays {
        let scope = Environment::child_of(env);
        let values = generator_indices
            .iter()
            .zip(&generation_ranges)
            .map(|(&idx, &(begin, step))| Value::Number((begin + idx as i64 * step) as f64))
            .collect();
        scope.define_names(&index_names, values, location)?;

        let sub_value = eval::evaluate(generator, &scope, context).at(location)?;
        let sub_array = sub_value.as_array().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                location,
                "The generator expression in an array comprehension must yield arrays."
            )
        })?;

        match &sub_array_shape {
            None => {
                let shape = sub_array.shape().to_vec();
                proto_ensure!(
                    shape.len() >= num_gaps,
                    Shape,
                    location,
                    "The sub-arrays in this array comprehension have only {} dimensions; not enough to fill {num_gaps} gaps in the range specifications.",
                    shape.len()
                );
                let mut sub_dims = shape.iter().copied();
                let mut full_shape: Vec<usize> = extents
                    .iter()
                    .map(|extent| extent.or_else(|| sub_dims.next()).unwrap_or(0))
                    .collect();
                for extra in sub_dims {
                    full_shape.push(extra);
                    view_ranges.push(Range::all());
                }
                result = Some(NdArray::new(full_shape));
                sub_array_shape = Some(shape);
            }
            Some(shape) => {
                proto_ensure!(
                    shape.as_slice() == sub_array.shape(),
                    Shape,
                    location,
                    "All sub-arrays in an array comprehension must have the same shape; arrays {i} of shape {:?} and 0 of shape {:?} differ.",
                    sub_array.shape(),
                    shape
                );
            }
        }

        if let Some(array) = &result {
            for (j, &dim) in generator_dims.iter().enumerate() {
                view_ranges[dim] = Range::single(generator_indices[j] as i64);
            }
            let target = array
                .view(&view_ranges)
                .map_err(|e| ProtoError::from_array(e, location))?;
            for (slot, value) in target.iter().zip(sub_array.values()) {
                slot.set(value);
            }
        }
        increment_indices(&mut generator_indices, &generator_extents);
    }

    let array = result.unwrap_or_else(|| {
        let shape: Vec<usize> = extents.iter().map(|e| e.unwrap_or(0)).collect();
        NdArray::new(shape)
    });
    Ok(Value::Array(array))
}

/// Takes a view of `array` according to range specification tuples.
pub fn view(array: &Value, range_values: &[Value], location: &Location) -> Result<Value, ProtoError> {
    let array = array
        .as_array()
        .ok_or_else(|| proto_err!(KindMismatch, location, "First argument to view should be an array."))?;
    let n = array.num_dimensions();
    let specs = ranges::view_specs(range_values, location)?;
    if let Some(max_dim) = specs.max_dimension() {
        proto_ensure!(
            max_dim < n,
            Shape,
            location,
            "Range specifications must be for a dimension that exists; a specification is given for dimension {max_dim} but the array only has {n} dimensions."
        );
    }
    proto_ensure!(
        specs.default.is_some() || specs.count() == n,
        Shape,
        location,
        "To create a view a range must be specified for every dimension in the array; the array has {n} dimensions but {} ranges have been supplied.",
        specs.count()
    );

    let fallback = specs.default.unwrap_or_default();
    let view_ranges: Vec<Range> = (0..n)
        .map(|dim| specs.by_dim.get(&dim).copied().unwrap_or(fallback))
        .collect();
    let result = array.view(&view_ranges).map_err(|e| {
        proto_err!(Shape, location, "Error constructing array view: {e}")
    })?;
    Ok(Value::Array(result))
}

/// Coordinates of the non-zero elements, as a `count × dimensions` array in
/// row-major order.
pub fn find(operand: &Value, location: &Location) -> Result<Value, ProtoError> {
    let operand = operand
        .as_array()
        .ok_or_else(|| proto_err!(KindMismatch, location, "First argument to find should be an array."))?;
    let n = operand.num_dimensions();
    let mut result = NdArray::new(vec![operand.num_elements(), n]);
    let mut found = 0;
    for element in operand.iter() {
        if element.get() != 0.0 {
            for (j, &coordinate) in element.index().iter().enumerate() {
                result.set(&[found, j], coordinate as f64);
            }
            found += 1;
        }
    }
    if found != operand.num_elements() {
        result
            .resize(&[found, n])
            .map_err(|e| ProtoError::from_array(e, location))?;
    }
    Ok(Value::Array(result))
}

/// Operands of an `index` expression after evaluation; `Default` or a missing
/// operand selects the documented default.
pub struct IndexArgs {
    pub operand: Value,
    pub indices: Value,
    pub dim: Value,
    pub shrink: Value,
    pub pad: Value,
    pub pad_value: Value,
}

fn optional_number(value: &Value, default: f64, message: &str, location: &Location) -> Result<f64, ProtoError> {
    if value.is_default() {
        return Ok(default);
    }
    value
        .as_number()
        .ok_or_else(|| proto_err!(KindMismatch, location, "{message}"))
}

/// Gathers the elements at the coordinates listed in `indices` (as produced by
/// `find`), compressing along dimension `dim`.
///
/// Each strip along `dim` collects the elements whose coordinates fall in it.
/// Strips of unequal length fail unless `shrink` (truncate to the shortest) or
/// `pad` (extend to the longest with `pad_value`) is non-zero. A negative
/// `shrink + pad` keeps the last elements of each strip and right-aligns them.
pub fn index(args: IndexArgs, location: &Location) -> Result<Value, ProtoError> {
    let operand = args
        .operand
        .as_array()
        .ok_or_else(|| proto_err!(KindMismatch, location, "First argument to index should be an array."))?;
    let indices = args
        .indices
        .as_array()
        .ok_or_else(|| proto_err!(KindMismatch, location, "Second argument to index should be an array."))?;
    let operand_dims = operand.num_dimensions();
    let dim = optional_number(
        &args.dim,
        operand_dims as f64 - 1.0,
        "Third argument to index, if given, should be an integer.",
        location,
    )?;
    let shrink = optional_number(
        &args.shrink,
        0.0,
        "Fourth argument to index, if given, should be a simple value.",
        location,
    )?;
    let pad = optional_number(
        &args.pad,
        0.0,
        "Fifth argument to index, if given, should be a simple value.",
        location,
    )?;
    let pad_value = optional_number(
        &args.pad_value,
        f64::MAX,
        "Sixth argument to index, if given, should be a simple value.",
        location,
    )?;

    proto_ensure!(
        indices.num_dimensions() == 2,
        Shape,
        location,
        "The indices array passed to index must have dimension 2, not {}",
        indices.num_dimensions()
    );
    proto_ensure!(
        dim >= 0.0 && (dim as usize) < operand_dims,
        Shape,
        location,
        "The operand to index has {operand_dims} dimensions, and so cannot be compressed along dimension {dim}."
    );
    let dimension = dim as usize;
    proto_ensure!(pad == 0.0 || shrink == 0.0, KindMismatch, location, "You cannot both pad and shrink!");
    let num_entries = indices.shape()[0];
    proto_ensure!(
        indices.shape()[1] == operand_dims,
        Shape,
        location,
        "Indices are the wrong size ({}) for this operand of dimension {operand_dims}.",
        indices.shape()[1]
    );

    let coordinates = |i: usize| -> Result<Vec<usize>, ProtoError> {
        (0..operand_dims)
            .map(|j| {
                let raw = indices.get(&[i, j]);
                let extent = operand.shape()[j];
                if !(raw >= 0.0 && raw.fract() == 0.0 && (raw as usize) < extent) {
                    return Err(proto_err!(
                        Shape,
                        location,
                        "Index {raw} in entry {i} is outside dimension {j} of extent {extent}."
                    ));
                }
                Ok(raw as usize)
            })
            .collect()
    };

    // Per-strip element counts, in an array with extent 1 along `dimension`.
    let mut strip_shape = operand.shape().to_vec();
    strip_shape[dimension] = 1;
    let counts = NdArray::new(strip_shape.clone());
    for i in 0..num_entries {
        let mut idx = coordinates(i)?;
        idx[dimension] = 0;
        counts.set(&idx, counts.get(&idx) + 1.0);
    }
    let (min_count, max_count) = counts
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c), hi.max(c)));
    let (min_count, max_count) = if counts.num_elements() == 0 {
        (0.0, 0.0)
    } else {
        (min_count, max_count)
    };
    if (min_count == 0.0 && pad == 0.0) || (min_count != max_count && shrink == 0.0 && pad == 0.0) {
        return Err(proto_err!(
            Shape,
            location,
            "Cannot index if the result is irregular (extent ranges from {min_count} to {max_count})."
        ));
    }
    let extent = (if pad == 0.0 { min_count } else { max_count }) as usize;

    let mut result_shape = operand.shape().to_vec();
    result_shape[dimension] = extent;
    let result = NdArray::new(result_shape);
    if pad != 0.0 {
        result.fill(pad_value);
    }

    let reverse = shrink + pad < 0.0;
    let next_slot = NdArray::new(strip_shape);
    let order: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..num_entries).rev())
    } else {
        Box::new(0..num_entries)
    };
    for i in order {
        let mut idx = coordinates(i)?;
        let value = operand.get(&idx);
        idx[dimension] = 0;
        let next = next_slot.get(&idx) as usize;
        if next < extent {
            next_slot.set(&idx, (next + 1) as f64);
            idx[dimension] = if reverse { extent - next - 1 } else { next };
            result.set(&idx, value);
        }
    }
    Ok(Value::Array(result))
}

/// Reduces dimension `dim` of `array` to extent 1 by left-associative
/// application of a two-argument function.
///
/// With a Null (or default) initial value the first element of each strip
/// seeds the fold, and an empty dimension is an error.
pub fn fold(
    function: &Value,
    array: &Value,
    init: &Value,
    dim: &Value,
    context: &mut EvaluationContext,
    location: &Location,
) -> Result<Value, ProtoError> {
    let function = function
        .as_closure()
        .ok_or_else(|| proto_err!(KindMismatch, location, "First argument to fold should be a function."))?;
    let operand = array
        .as_array()
        .ok_or_else(|| proto_err!(KindMismatch, location, "Second argument to fold should be an array."))?;
    let init = match init {
        Value::Null | Value::Default => None,
        other => Some(other.as_number().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                location,
                "Third argument to fold, if given, should be a simple value or Null."
            )
        })?),
    };
    let num_dims = operand.num_dimensions();
    let dim = optional_number(
        dim,
        num_dims as f64 - 1.0,
        "Fourth argument to fold, if given, should be an integer.",
        location,
    )?;
    proto_ensure!(
        dim >= 0.0 && (dim as usize) < num_dims,
        Shape,
        location,
        "Cannot fold over dimension {dim} as the operand array only has {num_dims} dimensions."
    );
    let dimension = dim as usize;

    let length = operand.shape()[dimension];
    proto_ensure!(
        init.is_some() || length > 0,
        Shape,
        location,
        "Cannot foldr1 over empty dimension {dimension}."
    );
    let mut shape = operand.shape().to_vec();
    shape[dimension] = 1;
    let result = NdArray::new(shape);

    for element in result.iter() {
        let mut idx = element.index().to_vec();
        let (mut acc, start) = match init {
            Some(value) => (value, 0),
            None => (operand.get(&idx), 1),
        };
        for j in start..length {
            idx[dimension] = j;
            let args = vec![Value::Number(acc), Value::Number(operand.get(&idx))];
            let value = call_function(function, args, context, location)?;
            acc = value.as_number().ok_or_else(|| {
                proto_err!(
                    KindMismatch,
                    location,
                    "The function supplied to fold should only return simple values."
                )
            })?;
        }
        element.set(acc);
    }
    Ok(Value::Array(result))
}

/// Applies an n-argument function element-wise across same-shaped arrays.
///
/// With `broadcast`, 0-dimensional operands are repeated across the shape of
/// the other operands.
pub fn map(
    function: &Value,
    arrays: &[Value],
    broadcast: bool,
    context: &mut EvaluationContext,
    location: &Location,
) -> Result<Value, ProtoError> {
    let function = function
        .as_closure()
        .ok_or_else(|| proto_err!(KindMismatch, location, "First argument to map is not a function."))?;
    proto_ensure!(!arrays.is_empty(), Arity, location, "Map requires at least one array argument.");
    let mut operands = Vec::with_capacity(arrays.len());
    for (i, value) in arrays.iter().enumerate() {
        let array = value.as_array().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                location,
                "Except for the first, all arguments to map should be arrays; argument {} is not.",
                i + 1
            )
        })?;
        operands.push(array);
    }

    let is_broadcast = |a: &NdArray| broadcast && a.num_dimensions() == 0;
    let shape: Vec<usize> = operands
        .iter()
        .find(|a| !is_broadcast(*a))
        .unwrap_or(&operands[0])
        .shape()
        .to_vec();
    let reference = operands.iter().position(|a| a.shape() == shape.as_slice()).unwrap_or(0);
    for (i, array) in operands.iter().enumerate() {
        if is_broadcast(array) {
            continue;
        }
        proto_ensure!(
            array.shape() == shape.as_slice(),
            Shape,
            location,
            "The shapes of the arrays passed to map must match; argument {i} of shape {:?} does not match argument {reference} of shape {:?}.",
            array.shape(),
            shape
        );
    }

    let result = NdArray::new(shape);
    for element in result.iter() {
        let args = operands
            .iter()
            .map(|a| {
                if is_broadcast(a) {
                    Value::Number(a.get(&[]))
                } else {
                    Value::Number(a.get(element.index()))
                }
            })
            .collect();
        let value = call_function(function, args, context, location)?;
        let x = value.as_number().ok_or_else(|| {
            proto_err!(
                KindMismatch,
                location,
                "The function passed to map must only return simple values."
            )
        })?;
        element.set(x);
    }
    Ok(Value::Array(result))
}

fn call_function(
    function: &Closure,
    args: Vec<Value>,
    context: &mut EvaluationContext,
    location: &Location,
) -> Result<Value, ProtoError> {
    function.call(args, context).at(location)
}

/// Queries a property of a value.
pub fn accessor(value: &Value, attribute: Attribute, location: &Location) -> Result<Value, ProtoError> {
    let need_array = |message: &str| {
        value
            .as_array()
            .ok_or_else(|| proto_err!(KindMismatch, location, "{message}"))
    };
    let result = match attribute {
        Attribute::IsSimpleValue => Value::from_bool(value.is_number()),
        Attribute::IsArray => Value::from_bool(value.is_array()),
        Attribute::IsString => Value::from_bool(matches!(value, Value::String(_))),
        Attribute::IsFunction => Value::from_bool(matches!(value, Value::Closure(_))),
        Attribute::IsTuple => Value::from_bool(matches!(value, Value::Tuple(_))),
        Attribute::IsNull => Value::from_bool(value.is_null()),
        Attribute::IsDefault => Value::from_bool(value.is_default()),
        Attribute::NumDims => {
            let array = need_array("Cannot get the number of dimensions of a non-array.")?;
            Value::Number(array.num_dimensions() as f64)
        }
        Attribute::NumElements => {
            let array = need_array("Cannot get the number of elements of a non-array.")?;
            Value::Number(array.num_elements() as f64)
        }
        Attribute::Shape => {
            let array = need_array("Cannot get the shape of a non-array.")?;
            let extents: Vec<f64> = array.shape().iter().map(|&e| e as f64).collect();
            Value::Array(NdArray::from(extents))
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(shape: &[usize], data: &[f64]) -> Value {
        Value::Array(NdArray::from_elements(shape.to_vec(), data).unwrap())
    }

    #[test]
    fn literal_stacks_elements() {
        let loc = Location::default();
        let v = create_literal(&[arr(&[2], &[1.0, 2.0]), arr(&[2], &[3.0, 4.0])], &loc).unwrap();
        let a = v.as_array().unwrap();
        assert_eq!(a.shape(), &[2, 2]);
        assert_eq!(a.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);

        let err = create_literal(&[Value::Number(1.0), arr(&[2], &[3.0, 4.0])], &loc).unwrap_err();
        assert!(err.message().starts_with("All elements of an array must have the same shape; element 1"));
        let err = create_literal(&[Value::from("x")], &loc).unwrap_err();
        assert_eq!(
            err.message(),
            "Elements of an array must be simple values or arrays; element 0 is neither."
        );
    }

    #[test]
    fn find_lists_nonzero_coordinates() {
        let loc = Location::default();
        let v = find(&arr(&[2, 3], &[0.0, 1.0, 2.0, 3.0, 0.0, 5.0]), &loc).unwrap();
        let a = v.as_array().unwrap();
        assert_eq!(a.shape(), &[4, 2]);
        assert_eq!(a.to_vec(), vec![0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn accessor_shape_and_predicates() {
        let loc = Location::default();
        let a = arr(&[2, 3], &[0.0; 6]);
        assert_eq!(accessor(&a, Attribute::Shape, &loc).unwrap().to_string(), "{2,3}");
        assert_eq!(accessor(&a, Attribute::NumElements, &loc).unwrap(), Value::Number(6.0));
        assert_eq!(accessor(&Value::Number(1.0), Attribute::IsSimpleValue, &loc).unwrap(), Value::Number(1.0));
        assert_eq!(accessor(&Value::Default, Attribute::IsDefault, &loc).unwrap(), Value::Number(1.0));
        let err = accessor(&Value::Null, Attribute::NumDims, &loc).unwrap_err();
        assert_eq!(err.message(), "Cannot get the number of dimensions of a non-array.");
    }

    #[test]
    fn view_requires_every_dimension() {
        let loc = Location::default();
        let a = arr(&[2, 3], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let spec = Value::tuple(vec![Value::Number(0.0), Value::Number(1.0), Value::Null]);
        let err = view(&a, &[spec], &loc).unwrap_err();
        assert!(err.message().starts_with("To create a view a range must be specified for every dimension"));
    }
}
