//! Constraint evaluation against row-group statistics and decoded values.
//!
//! Statistics are only trusted when both bounds are present and flagged
//! exact. Anything else, including comparison families without a
//! statistics rule, yields `MaybeTrue` and the rows are checked one by one.

use parquet::file::metadata::RowGroupMetaData;
use parquet::file::statistics::{Statistics, ValueStatistics};

use crate::constraint::{
    ColumnRef, Constraint, ConstraintSet, ConstraintValue, IntervalTruth, eval_cmp_on_interval,
};
use crate::decode::ValueSlot;

fn exact_bounds<T>(stats: &ValueStatistics<T>) -> Option<(&T, &T)> {
    if !(stats.min_is_exact() && stats.max_is_exact()) {
        return None;
    }
    Some((stats.min_opt()?, stats.max_opt()?))
}

fn int_bounds(stats: &Statistics) -> Option<(i64, i64)> {
    match stats {
        Statistics::Boolean(s) => exact_bounds(s).map(|(a, b)| (i64::from(*a), i64::from(*b))),
        Statistics::Int32(s) => exact_bounds(s).map(|(a, b)| (i64::from(*a), i64::from(*b))),
        Statistics::Int64(s) => exact_bounds(s).map(|(a, b)| (*a, *b)),
        _ => None,
    }
}

fn double_bounds(stats: &Statistics) -> Option<(f64, f64)> {
    match stats {
        Statistics::Double(s) => exact_bounds(s).map(|(a, b)| (*a, *b)),
        // Monotonic widening keeps the bounds valid.
        other => int_bounds(other).map(|(a, b)| (a as f64, b as f64)),
    }
}

/// Truth of a row-identifier constraint over `[start, start + count)`.
pub(crate) fn row_id_truth(constraint: &Constraint, start: i64, count: i64) -> IntervalTruth {
    if count <= 0 {
        return IntervalTruth::AlwaysFalse;
    }
    let last = start + count - 1;
    match &constraint.value {
        ConstraintValue::Integer(v) => eval_cmp_on_interval(constraint.op, v, &start, &last),
        ConstraintValue::Double(v) => {
            eval_cmp_on_interval(constraint.op, v, &(start as f64), &(last as f64))
        }
        _ => IntervalTruth::MaybeTrue,
    }
}

/// Truth of a column constraint over the column's statistics in a row group.
pub(crate) fn column_truth(
    constraint: &Constraint,
    column: usize,
    meta: &RowGroupMetaData,
) -> IntervalTruth {
    let Some(stats) = meta.column(column).statistics() else {
        return IntervalTruth::MaybeTrue;
    };

    let op = constraint.op;
    let truth = match &constraint.value {
        ConstraintValue::Integer(v) => match stats {
            Statistics::Double(_) => double_bounds(stats)
                .map(|(min, max)| eval_cmp_on_interval(op, &(*v as f64), &min, &max)),
            _ => int_bounds(stats).map(|(min, max)| eval_cmp_on_interval(op, v, &min, &max)),
        },
        ConstraintValue::Double(v) => {
            double_bounds(stats).map(|(min, max)| eval_cmp_on_interval(op, v, &min, &max))
        }
        ConstraintValue::Text(_) | ConstraintValue::Blob(_) => match stats {
            Statistics::ByteArray(s) => exact_bounds(s).and_then(|(min, max)| {
                let v = constraint.value.as_bytes()?;
                Some(eval_cmp_on_interval(op, v, min.data(), max.data()))
            }),
            _ => None,
        },
    };

    match truth {
        // Bounds exclude nulls, and NaN for doubles; those rows still fail.
        Some(IntervalTruth::AlwaysTrue)
            if stats.null_count_opt() != Some(0) || matches!(stats, Statistics::Double(_)) =>
        {
            IntervalTruth::MaybeTrue
        }
        Some(truth) => truth,
        None => IntervalTruth::MaybeTrue,
    }
}

/// Decide whether a row group needs scanning.
///
/// Returns `None` if some constraint can never hold in the row group,
/// otherwise the indices of the constraints that still need per-row checks.
pub(crate) fn plan_row_group(
    constraints: &ConstraintSet,
    meta: &RowGroupMetaData,
    start: i64,
    count: i64,
) -> Option<Vec<usize>> {
    let mut row_filters = Vec::new();
    let mut all = IntervalTruth::AlwaysTrue;

    for (i, constraint) in constraints.iter().enumerate() {
        let truth = match constraint.column {
            ColumnRef::RowId => row_id_truth(constraint, start, count),
            ColumnRef::Column(column) => column_truth(constraint, column, meta),
        };

        all = all.and(truth);
        if all == IntervalTruth::AlwaysFalse {
            return None;
        }
        if truth == IntervalTruth::MaybeTrue {
            row_filters.push(i);
        }
    }

    Some(row_filters)
}

/// Row-level check of a row-identifier constraint.
pub(crate) fn row_id_satisfies(constraint: &Constraint, row_id: i64) -> bool {
    let ord = match &constraint.value {
        ConstraintValue::Integer(v) => Some(row_id.cmp(v)),
        ConstraintValue::Double(v) => (row_id as f64).partial_cmp(v),
        _ => return true,
    };
    ord.is_some_and(|o| constraint.op.matches(o))
}

/// Row-level check of a column constraint against a decoded value.
///
/// Null never satisfies a comparison. Pairs this layer cannot compare
/// (text against a number, ...) are left for the host to decide.
pub(crate) fn value_satisfies(constraint: &Constraint, is_null: bool, value: &ValueSlot) -> bool {
    if is_null {
        return false;
    }

    let ord = match (value, &constraint.value) {
        (ValueSlot::Int(x), ConstraintValue::Integer(v)) => Some(x.cmp(v)),
        (ValueSlot::Int(x), ConstraintValue::Double(v)) => (*x as f64).partial_cmp(v),
        (ValueSlot::Double(x), ConstraintValue::Integer(v)) => x.partial_cmp(&(*v as f64)),
        (ValueSlot::Double(x), ConstraintValue::Double(v)) => x.partial_cmp(v),
        (ValueSlot::Bytes(b), ConstraintValue::Text(s)) => Some(b.data().cmp(s.as_bytes())),
        (ValueSlot::Bytes(b), ConstraintValue::Blob(v)) => Some(b.data().cmp(v.as_slice())),
        _ => return true,
    };
    ord.is_some_and(|o| constraint.op.matches(o))
}
