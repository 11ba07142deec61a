//! # Array Engine
//!
//! A general n-dimensional array of `f64` with zero-copy strided views.
//!
//! ## Design Principles
//!
//! - **Shared storage**: the element buffer is reference counted; every view of
//!   an array holds its own handle on the same buffer, so a view keeps the
//!   storage alive and writes through one alias are visible through all others.
//! - **Per-view descriptors**: a view is an offset, one stride per dimension and
//!   a shape. Creating one is O(number of dimensions) and copies no data.
//! - **Row-major order**: iteration, `resize` and `copy` visit elements with the
//!   last dimension varying fastest.
//!
//! The engine knows nothing about values, environments or source locations;
//! failures are reported as [`ArrayError`] and given a location by the caller.

mod range;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

pub use range::Range;

/// Failures raised by array construction and view creation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    #[error("Wrong number of ranges supplied; received {received} but the array has {expected} dimensions.")]
    WrongRangeCount { received: usize, expected: usize },
    #[error("Cannot begin a range at a negative index; got {begin} even after subtracting from dimension {dim} size.")]
    NegativeBegin { dim: usize, begin: i64 },
    #[error("Cannot end a range at a negative index; got {end} even after subtracting from dimension {dim} size.")]
    NegativeEnd { dim: usize, end: i64 },
    #[error("Start and end of range for dimension {dim} are equal but the step is not zero.")]
    EmptyRange { dim: usize },
    #[error("Range start {begin} for dimension {dim} is after the end ({extent}) of the dimension.")]
    BeginOutOfRange { dim: usize, begin: i64, extent: usize },
    #[error("Range end {end} for dimension {dim} is after the end ({extent}) of the dimension.")]
    EndOutOfRange { dim: usize, end: i64, extent: usize },
    #[error("Range for dimension {dim} is inconsistent: step is {step} but (end-begin) is {span}.")]
    InconsistentStep { dim: usize, step: i64, span: i64 },
    #[error("Index {index} selected for dimension {dim} is after the end ({extent}) of the dimension.")]
    IndexOutOfRange { dim: usize, index: i64, extent: usize },
    #[error("When the step is zero the start and end of a range must be equal; {end} != {begin} for dimension {dim}.")]
    DegenerateMismatch { dim: usize, begin: i64, end: i64 },
    #[error("Resizing cannot change the number of dimensions; the array has {expected} but {received} extents were given.")]
    ResizeDimensions { received: usize, expected: usize },
    #[error("Supplied {len} elements for shape {shape:?}, which holds {expected}.")]
    DataLength {
        len: usize,
        shape: Vec<usize>,
        expected: usize,
    },
}

/// Advances `indices` to the next position within `shape` in row-major order.
///
/// Returns `false` once the indices wrap back to all zeros, i.e. when the
/// previous position was the last one. Every extent must be non-zero.
pub fn increment_indices(indices: &mut [usize], shape: &[usize]) -> bool {
    for dim in (0..shape.len()).rev() {
        indices[dim] = (indices[dim] + 1) % shape[dim];
        if indices[dim] != 0 {
            return true;
        }
    }
    false
}

fn row_major_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; shape.len()];
    for dim in (0..shape.len().saturating_sub(1)).rev() {
        strides[dim] = strides[dim + 1] * shape[dim + 1] as isize;
    }
    strides
}

fn zeroed(len: usize) -> Rc<[Cell<f64>]> {
    (0..len).map(|_| Cell::new(0.0)).collect::<Vec<_>>().into()
}

/// An n-dimensional array of numbers, possibly a view onto another array.
#[derive(Clone)]
pub struct NdArray {
    data: Rc<[Cell<f64>]>,
    offset: usize,
    strides: Vec<isize>,
    shape: Vec<usize>,
    is_view: bool,
}

impl NdArray {
    /// Allocates a zero-filled array of the given shape.
    pub fn new(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product::<usize>();
        Self {
            data: zeroed(len),
            offset: 0,
            strides: row_major_strides(&shape),
            shape,
            is_view: false,
        }
    }

    /// A 0-dimensional array holding one number.
    pub fn scalar(value: f64) -> Self {
        let array = Self::new(Vec::new());
        array.set(&[], value);
        array
    }

    /// Builds an array from elements listed in row-major order.
    pub fn from_elements(shape: impl Into<Vec<usize>>, elements: &[f64]) -> Result<Self, ArrayError> {
        let shape = shape.into();
        let expected = shape.iter().product::<usize>();
        if elements.len() != expected {
            return Err(ArrayError::DataLength {
                len: elements.len(),
                shape,
                expected,
            });
        }
        let array = Self::new(shape);
        for (cell, value) in array.data.iter().zip(elements) {
            cell.set(*value);
        }
        Ok(array)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn num_dimensions(&self) -> usize {
        self.shape.len()
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether this array aliases storage created for another array.
    pub fn is_view(&self) -> bool {
        self.is_view
    }

    /// Whether both arrays address the same underlying buffer.
    pub fn shares_storage_with(&self, other: &NdArray) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    fn cell(&self, indices: &[usize]) -> &Cell<f64> {
        assert_eq!(
            indices.len(),
            self.shape.len(),
            "index has {} components but the array has {} dimensions",
            indices.len(),
            self.shape.len()
        );
        let mut position = self.offset as isize;
        for (index, stride) in indices.iter().zip(&self.strides) {
            position += *index as isize * stride;
        }
        &self.data[position as usize]
    }

    /// Reads the element at `indices`, one index per dimension.
    ///
    /// # Panics
    ///
    /// If the number of indices differs from the number of dimensions.
    pub fn get(&self, indices: &[usize]) -> f64 {
        self.cell(indices).get()
    }

    /// Writes the element at `indices`; visible through every alias of the buffer.
    pub fn set(&self, indices: &[usize], value: f64) {
        self.cell(indices).set(value);
    }

    /// Creates a view selecting `ranges`, one per dimension, without copying.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protocore::array::{NdArray, Range};
    /// let a = NdArray::from_elements(vec![2, 3], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    /// let column = a.view(&[Range::all(), Range::single(1)]).unwrap();
    /// assert_eq!(column.shape(), &[2]);
    /// assert_eq!(column.to_vec(), vec![1.0, 4.0]);
    /// ```
    pub fn view(&self, ranges: &[Range]) -> Result<NdArray, ArrayError> {
        let num_dims = self.shape.len();
        if ranges.len() != num_dims {
            return Err(ArrayError::WrongRangeCount {
                received: ranges.len(),
                expected: num_dims,
            });
        }
        let mut offset = self.offset as isize;
        let mut strides = Vec::with_capacity(num_dims);
        let mut shape = Vec::with_capacity(num_dims);
        for (dim, range) in ranges.iter().enumerate() {
            let extent = self.shape[dim];
            let signed_extent = extent as i64;
            let step = range.step;
            let begin = match range.begin {
                None if step < 0 => signed_extent - 1,
                None => 0,
                Some(b) if b < 0 => {
                    let begin = signed_extent + b;
                    if begin < 0 {
                        return Err(ArrayError::NegativeBegin { dim, begin });
                    }
                    begin
                }
                Some(b) => b,
            };
            let end = match range.end {
                // half-open, so a reversed range stops before index 0
                None if step < 0 => -1,
                None => signed_extent,
                Some(e) if e < 0 => {
                    let end = signed_extent + e;
                    if end < 0 && !(end == -1 && step < 0) {
                        return Err(ArrayError::NegativeEnd { dim, end });
                    }
                    end
                }
                Some(e) => e,
            };
            if step != 0 {
                if begin == end {
                    return Err(ArrayError::EmptyRange { dim });
                }
                // a reversed range starts at an element, so its begin is inclusive
                if begin > signed_extent || (step < 0 && begin == signed_extent) {
                    return Err(ArrayError::BeginOutOfRange { dim, begin, extent });
                }
                if end > signed_extent {
                    return Err(ArrayError::EndOutOfRange { dim, end, extent });
                }
                if step * (end - begin) <= 0 {
                    return Err(ArrayError::InconsistentStep {
                        dim,
                        step,
                        span: end - begin,
                    });
                }
                let span = (end - begin) as f64;
                shape.push((span / step as f64).ceil() as usize);
                strides.push(self.strides[dim] * step as isize);
            } else {
                if begin >= signed_extent {
                    return Err(ArrayError::IndexOutOfRange {
                        dim,
                        index: begin,
                        extent,
                    });
                }
                if end != begin {
                    return Err(ArrayError::DegenerateMismatch { dim, begin, end });
                }
            }
            offset += begin as isize * self.strides[dim];
        }
        Ok(NdArray {
            data: Rc::clone(&self.data),
            offset: offset as usize,
            strides,
            shape,
            is_view: true,
        })
    }

    /// Reallocates to `new_shape`, keeping the overlapping region and zero-filling the rest.
    ///
    /// The array detaches from any buffer it previously shared.
    pub fn resize(&mut self, new_shape: &[usize]) -> Result<(), ArrayError> {
        if new_shape.len() != self.shape.len() {
            return Err(ArrayError::ResizeDimensions {
                received: new_shape.len(),
                expected: self.shape.len(),
            });
        }
        let overlap: Vec<usize> = new_shape
            .iter()
            .zip(&self.shape)
            .map(|(a, b)| *a.min(b))
            .collect();
        let resized = NdArray::new(new_shape.to_vec());
        if overlap.iter().all(|&n| n > 0) {
            let mut indices = vec![0; overlap.len()];
            loop {
                resized.set(&indices, self.get(&indices));
                if !increment_indices(&mut indices, &overlap) {
                    break;
                }
            }
        }
        *self = resized;
        Ok(())
    }

    /// Deep copy into a freshly owned buffer.
    pub fn copy(&self) -> NdArray {
        let copy = NdArray::new(self.shape.clone());
        for (cell, element) in copy.data.iter().zip(self.iter()) {
            cell.set(element.get());
        }
        copy
    }

    /// Sets every element, through the view if this is one.
    pub fn fill(&self, value: f64) {
        for element in self.iter() {
            element.set(value);
        }
    }

    /// Iterates over elements in row-major order, exposing each multi-index.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            array: self,
            index: vec![0; self.shape.len()],
            remaining: self.num_elements(),
        }
    }

    /// Element values in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().map(|element| element.get())
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values().collect()
    }
}

impl From<Vec<f64>> for NdArray {
    fn from(elements: Vec<f64>) -> Self {
        let array = NdArray::new(vec![elements.len()]);
        for (cell, value) in array.data.iter().zip(elements) {
            cell.set(value);
        }
        array
    }
}

impl PartialEq for NdArray {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.values().eq(other.values())
    }
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("shape", &self.shape)
            .field("elements", &self.to_vec())
            .field("is_view", &self.is_view)
            .finish()
    }
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn nested(
            f: &mut fmt::Formatter<'_>,
            values: &mut dyn Iterator<Item = f64>,
            shape: &[usize],
        ) -> fmt::Result {
            match shape.split_first() {
                None => write!(f, "{}", values.next().unwrap_or(f64::NAN)),
                Some((extent, rest)) => {
                    write!(f, "{{")?;
                    for i in 0..*extent {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        nested(f, values, rest)?;
                    }
                    write!(f, "}}")
                }
            }
        }
        nested(f, &mut self.values(), &self.shape)
    }
}

/// Row-major iterator over the elements of an [`NdArray`].
pub struct Iter<'a> {
    array: &'a NdArray,
    index: Vec<usize>,
    remaining: usize,
}

/// One element yielded by [`Iter`]: its multi-index and a handle for reading or writing it.
pub struct Element<'a> {
    index: Vec<usize>,
    cell: &'a Cell<f64>,
}

impl Element<'_> {
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn get(&self) -> f64 {
        self.cell.get()
    }

    pub fn set(&self, value: f64) {
        self.cell.set(value);
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        if self.remaining == 0 {
            return None;
        }
        let element = Element {
            index: self.index.clone(),
            cell: self.array.cell(&self.index),
        };
        self.remaining -= 1;
        if self.remaining > 0 {
            increment_indices(&mut self.index, &self.array.shape);
        }
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
