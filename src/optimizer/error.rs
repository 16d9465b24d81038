use thiserror::Error;

use crate::domain::IntervalSeries;

/// Failure of a single (day, end-use, tier) optimization
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// Input rejected before any solve was attempted
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The LP failed even though the baseline curve is always feasible.
    /// Never reported as zero savings.
    #[error("Solver non-convergence: {0}")]
    SolverNonConvergence(String),
}

pub type OptimizerResult<T> = Result<T, OptimizerError>;

pub(crate) fn ensure_proportion(proportion: f64) -> OptimizerResult<()> {
    if !(0.0..=1.0).contains(&proportion) {
        return Err(OptimizerError::MalformedInput(format!(
            "proportion must be between 0 and 1, got {proportion}"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_window(window: usize) -> OptimizerResult<()> {
    if window == 0 {
        return Err(OptimizerError::MalformedInput(
            "window length must be a positive number of intervals".to_string(),
        ));
    }
    Ok(())
}

/// All series must be non-empty, finite and of equal length
pub(crate) fn ensure_series(series: &[(&str, &IntervalSeries)]) -> OptimizerResult<usize> {
    let Some((first_name, first)) = series.first() else {
        return Err(OptimizerError::MalformedInput("no series provided".to_string()));
    };
    let len = first.len();
    if len == 0 {
        return Err(OptimizerError::MalformedInput(format!("{first_name} series is empty")));
    }

    for (name, s) in series {
        if s.len() != len {
            return Err(OptimizerError::MalformedInput(format!(
                "time series must all be the same length: {first_name}={len}, {name}={}",
                s.len()
            )));
        }
        if let Some(i) = s.as_slice().iter().position(|v| !v.is_finite()) {
            return Err(OptimizerError::MalformedInput(format!(
                "{name} series has a non-finite value at interval {i}"
            )));
        }
    }
    Ok(len)
}
