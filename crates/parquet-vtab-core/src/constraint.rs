//! Pushdown predicates handed over by the host engine.
//!
//! A [`ConstraintSet`] is a conjunction of simple comparisons. Each
//! [`Constraint`] is evaluated twice in the scan path: against row-group
//! statistics to decide whether the row group is worth opening, and against
//! decoded values for rows in row groups that survive.

use std::cmp::Ordering;
use std::fmt;

/// Reference to a table column, or the synthetic row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// The sequential row identifier.
    RowId,
    /// A user column by ordinal.
    Column(usize),
}

/// Comparison operator of a constraint, as `column OP value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOp {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl ConstraintOp {
    /// Apply the operator to `column_value.cmp(constraint_value)`.
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            ConstraintOp::Eq => ord == Ordering::Equal,
            ConstraintOp::Lt => ord == Ordering::Less,
            ConstraintOp::Le => ord != Ordering::Greater,
            ConstraintOp::Gt => ord == Ordering::Greater,
            ConstraintOp::Ge => ord != Ordering::Less,
        }
    }

    /// SQL spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintOp::Eq => "=",
            ConstraintOp::Lt => "<",
            ConstraintOp::Le => "<=",
            ConstraintOp::Gt => ">",
            ConstraintOp::Ge => ">=",
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which comparison family a constraint uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Compared against the row identifier, never decodes a column.
    RowId,
    /// Byte-wise comparison against UTF-8 text.
    Text,
    /// Byte-wise comparison against opaque bytes.
    Blob,
    /// Integer comparison.
    Integer,
    /// Floating-point comparison.
    Double,
}

/// Typed comparison value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintValue {
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 text.
    Text(String),
    /// Opaque bytes.
    Blob(Vec<u8>),
}

impl ConstraintValue {
    fn kind(&self) -> FilterKind {
        match self {
            ConstraintValue::Integer(_) => FilterKind::Integer,
            ConstraintValue::Double(_) => FilterKind::Double,
            ConstraintValue::Text(_) => FilterKind::Text,
            ConstraintValue::Blob(_) => FilterKind::Blob,
        }
    }

    /// Byte view of text and blob values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ConstraintValue::Text(s) => Some(s.as_bytes()),
            ConstraintValue::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::Integer(v) => write!(f, "{v}"),
            ConstraintValue::Double(v) => write!(f, "{v}"),
            ConstraintValue::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            ConstraintValue::Blob(v) => {
                f.write_str("x'")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

/// One pushdown comparison.
///
/// The comparison family is derived from the column and value at
/// construction and cannot be set independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub(crate) column: ColumnRef,
    pub(crate) op: ConstraintOp,
    pub(crate) value: ConstraintValue,
    kind: FilterKind,
}

impl Constraint {
    /// Build a constraint, deriving the filter kind from the column and value.
    pub fn new(column: ColumnRef, op: ConstraintOp, value: ConstraintValue) -> Self {
        let kind = match column {
            ColumnRef::RowId => FilterKind::RowId,
            ColumnRef::Column(_) => value.kind(),
        };
        Self {
            column,
            op,
            value,
            kind,
        }
    }

    /// Constraint on a user column.
    pub fn column(index: usize, op: ConstraintOp, value: ConstraintValue) -> Self {
        Self::new(ColumnRef::Column(index), op, value)
    }

    /// Constraint on the row identifier.
    pub fn row_id(op: ConstraintOp, value: i64) -> Self {
        Self::new(ColumnRef::RowId, op, ConstraintValue::Integer(value))
    }

    /// Compared column.
    pub fn column_ref(&self) -> ColumnRef {
        self.column
    }

    /// Operator.
    pub fn op(&self) -> ConstraintOp {
        self.op
    }

    /// Right-hand side.
    pub fn value(&self) -> &ConstraintValue {
        &self.value
    }

    /// Comparison family.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            ColumnRef::RowId => write!(f, "rowid {} {}", self.op, self.value),
            ColumnRef::Column(i) => write!(f, "#{i} {} {}", self.op, self.value),
        }
    }
}

/// Conjunction of constraints for one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    /// Empty set, matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint.
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// True if the set has no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Constraint by position.
    pub fn get(&self, i: usize) -> Option<&Constraint> {
        self.constraints.get(i)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }
}

impl From<Vec<Constraint>> for ConstraintSet {
    fn from(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

/// Result of evaluating a comparison against a whole closed interval
/// `[min, max]` of column values.
///
/// This is universal over the interval, not "does some value match":
/// - `AlwaysFalse`: no value in the interval satisfies it; safe to prune.
/// - `MaybeTrue`: some values may satisfy it; keep and check rows.
/// - `AlwaysTrue`: every value satisfies it; keep, rows need no check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalTruth {
    /// Every value in the interval satisfies the comparison.
    AlwaysTrue,
    /// No value in the interval satisfies the comparison.
    AlwaysFalse,
    /// Undecided from the bounds alone.
    MaybeTrue,
}

impl IntervalTruth {
    /// Conjunction of two interval results.
    pub fn and(self, other: IntervalTruth) -> IntervalTruth {
        use IntervalTruth::*;
        match (self, other) {
            (AlwaysFalse, _) | (_, AlwaysFalse) => AlwaysFalse,
            (AlwaysTrue, AlwaysTrue) => AlwaysTrue,
            _ => MaybeTrue,
        }
    }
}

/// Evaluate `column OP v` for all column values in `[min, max]`.
///
/// Incomparable bounds (NaN) yield `MaybeTrue`.
pub fn eval_cmp_on_interval<T: PartialOrd + ?Sized>(
    op: ConstraintOp,
    v: &T,
    min: &T,
    max: &T,
) -> IntervalTruth {
    use IntervalTruth::*;

    let (Some(min_vs_v), Some(max_vs_v)) = (min.partial_cmp(v), max.partial_cmp(v)) else {
        return MaybeTrue;
    };

    match op {
        ConstraintOp::Lt => {
            if max_vs_v == Ordering::Less {
                AlwaysTrue
            } else if min_vs_v != Ordering::Less {
                AlwaysFalse
            } else {
                MaybeTrue
            }
        }
        ConstraintOp::Le => {
            if max_vs_v != Ordering::Greater {
                AlwaysTrue
            } else if min_vs_v == Ordering::Greater {
                AlwaysFalse
            } else {
                MaybeTrue
            }
        }
        ConstraintOp::Gt => {
            if min_vs_v == Ordering::Greater {
                AlwaysTrue
            } else if max_vs_v != Ordering::Greater {
                AlwaysFalse
            } else {
                MaybeTrue
            }
        }
        ConstraintOp::Ge => {
            if min_vs_v != Ordering::Less {
                AlwaysTrue
            } else if max_vs_v == Ordering::Less {
                AlwaysFalse
            } else {
                MaybeTrue
            }
        }
        ConstraintOp::Eq => {
            if min_vs_v == Ordering::Greater || max_vs_v == Ordering::Less {
                AlwaysFalse
            } else if min_vs_v == Ordering::Equal && max_vs_v == Ordering::Equal {
                AlwaysTrue
            } else {
                MaybeTrue
            }
        }
    }
}
