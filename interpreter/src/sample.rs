use std::ops::RangeInclusive;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::EvalError,
    value::{Function, Value},
};

/// Evaluates a one-argument function at `count` evenly spaced points of
/// `range`, in order. Points where the function fails are `None`.
///
/// Calls run in parallel. This is safe because calling a function only
/// reads its own captured environment.
pub fn sample(
    function: &Function,
    range: RangeInclusive<f64>,
    count: usize,
) -> Result<Vec<(f64, Option<f64>)>, EvalError> {
    #[cfg(feature = "tracy")]
    profiling::scope!("sample");
    if function.arity() != 1 {
        return Err(EvalError::Arity {
            name: function.name().to_owned(),
            expected: 1,
            found: function.arity(),
        });
    }
    let (start, end) = range.into_inner();
    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };
    Ok((0..count)
        .into_par_iter()
        .map(|i| {
            let x = start + step * i as f64;
            let y = function
                .call(&[Value::Number(x)])
                .and_then(|y| y.as_number("sample"))
                .ok()
                .filter(|y| y.is_finite());
            (x, y)
        })
        .collect())
}
