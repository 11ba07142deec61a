//! Range descriptions used to take views of an [`NdArray`](super::NdArray).

/// One dimension's slice of a view: `begin`, `step`, `end` with a half-open end.
///
/// A bound of `None` means "to the edge of the dimension", resolved taking the
/// sign of `step` into account. Negative bounds count from the end. A step of
/// zero selects the single index `begin` and removes the dimension from the
/// resulting view.
///
/// # Examples
///
/// ```rust
/// use protocore::array::Range;
/// let all = Range::all();
/// assert_eq!(all.step, 1);
/// assert!(Range::single(3).is_degenerate());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub begin: Option<i64>,
    pub step: i64,
    pub end: Option<i64>,
}

impl Range {
    /// `begin..end` with unit step.
    pub fn new(begin: i64, end: i64) -> Self {
        Self {
            begin: Some(begin),
            step: 1,
            end: Some(end),
        }
    }

    pub fn stepped(begin: i64, step: i64, end: i64) -> Self {
        Self {
            begin: Some(begin),
            step,
            end: Some(end),
        }
    }

    /// Selects one index, dropping the dimension.
    pub fn single(item: i64) -> Self {
        Self {
            begin: Some(item),
            step: 0,
            end: Some(item),
        }
    }

    /// Every element of the dimension in order.
    pub fn all() -> Self {
        Self {
            begin: None,
            step: 1,
            end: None,
        }
    }

    /// Every element of the dimension in reverse order.
    pub fn reversed() -> Self {
        Self {
            begin: None,
            step: -1,
            end: None,
        }
    }

    pub fn with_bounds(begin: Option<i64>, step: i64, end: Option<i64>) -> Self {
        Self { begin, step, end }
    }

    pub fn is_degenerate(&self) -> bool {
        self.step == 0
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::all()
    }
}
