//! Closed-form numeric fitting.
//!
//! Each candidate family is fitted by Levenberg-Marquardt least squares from
//! an all-ones starting point. The family with the lowest mean squared error
//! wins; families that fail to converge are excluded. When every family
//! fails the identity function is returned.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, info, warn};

use crate::error::{Result, TabulaxError};
use crate::model::ExampleSet;

/// Inputs this close to the rational pole are treated as undefined.
const POLE_EPSILON: f64 = 1e-10;

/// Relative and absolute MSE margins a later family must beat.
const MSE_REL_TOL: f64 = 1e-9;
const MSE_ABS_TOL: f64 = 1e-12;

/// Convergence tolerances on cost reduction and step size.
const FTOL: f64 = 1.49012e-8;
const XTOL: f64 = 1.49012e-8;

/// Damping bounds; exceeding the upper one ends the search.
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

/// A parametric function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionFamily {
    /// `a·x + b`
    Linear,
    /// `a·x² + b·x + c`
    Quadratic,
    /// `a·e^(b·x)`
    Exponential,
    /// `(a·x + b) / (x + c)`
    Rational,
    /// `x`
    Identity,
}

impl FunctionFamily {
    /// Families tried by the synthesizer, in preference order.
    pub const CANDIDATES: [FunctionFamily; 4] = [
        FunctionFamily::Linear,
        FunctionFamily::Quadratic,
        FunctionFamily::Exponential,
        FunctionFamily::Rational,
    ];

    /// Number of free coefficients.
    pub fn parameter_count(&self) -> usize {
        match self {
            FunctionFamily::Linear | FunctionFamily::Exponential => 2,
            FunctionFamily::Quadratic | FunctionFamily::Rational => 3,
            FunctionFamily::Identity => 0,
        }
    }

    /// Evaluate at `x`. `None` where the function is undefined.
    pub fn eval(&self, p: &[f64], x: f64) -> Option<f64> {
        let y = match self {
            FunctionFamily::Linear => p[0] * x + p[1],
            FunctionFamily::Quadratic => p[0] * x * x + p[1] * x + p[2],
            FunctionFamily::Exponential => p[0] * (p[1] * x).exp(),
            FunctionFamily::Rational => {
                let denom = x + p[2];
                if denom.abs() <= POLE_EPSILON {
                    return None;
                }
                (p[0] * x + p[1]) / denom
            }
            FunctionFamily::Identity => x,
        };
        y.is_finite().then_some(y)
    }

    /// Partial derivatives with respect to each coefficient at `x`.
    fn gradient(&self, p: &[f64], x: f64) -> Option<Vec<f64>> {
        let g = match self {
            FunctionFamily::Linear => vec![x, 1.0],
            FunctionFamily::Quadratic => vec![x * x, x, 1.0],
            FunctionFamily::Exponential => {
                let e = (p[1] * x).exp();
                vec![e, p[0] * x * e]
            }
            FunctionFamily::Rational => {
                let denom = x + p[2];
                if denom.abs() <= POLE_EPSILON {
                    return None;
                }
                vec![x / denom, 1.0 / denom, -(p[0] * x + p[1]) / (denom * denom)]
            }
            FunctionFamily::Identity => Vec::new(),
        };
        g.iter().all(|v| v.is_finite()).then_some(g)
    }
}

impl fmt::Display for FunctionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionFamily::Linear => "linear",
            FunctionFamily::Quadratic => "quadratic",
            FunctionFamily::Exponential => "exponential",
            FunctionFamily::Rational => "rational",
            FunctionFamily::Identity => "identity",
        };
        f.write_str(name)
    }
}

/// A fitted closed-form rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedFormFunction {
    pub family: FunctionFamily,
    pub coefficients: Vec<f64>,
    /// Mean squared error over the examples (None for the identity fallback).
    pub mse: Option<f64>,
}

impl ClosedFormFunction {
    /// The identity rule, used when no family converges.
    pub fn identity() -> Self {
        Self {
            family: FunctionFamily::Identity,
            coefficients: Vec::new(),
            mse: None,
        }
    }

    /// Evaluate at `x`.
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        if self.coefficients.len() != self.family.parameter_count() {
            return None;
        }
        self.family.eval(&self.coefficients, x)
    }

    /// Apply to text; unparseable or undefined inputs come back unchanged.
    pub fn apply(&self, input: &str) -> String {
        input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .and_then(|x| self.evaluate(x))
            .map(format_number)
            .unwrap_or_else(|| input.to_string())
    }

    /// Apply to a cell value; non-numeric cells come back unchanged.
    pub fn apply_value(&self, value: &Value) -> Value {
        match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(|x| self.evaluate(x))
                .map(number_value)
                .unwrap_or_else(|| value.clone()),
            Value::String(s) => Value::String(self.apply(s)),
            other => other.clone(),
        }
    }

    /// Human-readable formula.
    pub fn describe(&self) -> String {
        let c = |i: usize| {
            self.coefficients
                .get(i)
                .map(|v| format_number(*v))
                .unwrap_or_else(|| "?".to_string())
        };
        match self.family {
            FunctionFamily::Linear => format!("y = {}*x + {}", c(0), c(1)),
            FunctionFamily::Quadratic => format!("y = {}*x^2 + {}*x + {}", c(0), c(1), c(2)),
            FunctionFamily::Exponential => format!("y = {}*exp({}*x)", c(0), c(1)),
            FunctionFamily::Rational => format!("y = ({}*x + {}) / (x + {})", c(0), c(1), c(2)),
            FunctionFamily::Identity => "y = x".to_string(),
        }
    }
}

/// Format a result: rounded to nine decimals, no negative zero.
pub fn format_number(v: f64) -> String {
    let rounded = if v.abs() < 1e15 {
        (v * 1e9).round() / 1e9
    } else {
        v
    };
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::Number(Number::from(v as i64))
    } else {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Fits closed-form functions to numeric example pairs.
#[derive(Debug, Clone, Default)]
pub struct NumericalSynthesizer;

impl NumericalSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse the examples as numbers and fit.
    ///
    /// Any non-numeric example fails the whole fit.
    pub fn fit(&self, examples: &ExampleSet) -> Result<ClosedFormFunction> {
        let points = examples
            .pairs()
            .iter()
            .enumerate()
            .map(|(index, pair)| {
                let x = parse_number(index, &pair.source)?;
                let y = parse_number(index, &pair.target)?;
                Ok((x, y))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.fit_points(&points))
    }

    /// Fit every candidate family and keep the best.
    pub fn fit_points(&self, points: &[(f64, f64)]) -> ClosedFormFunction {
        let mut best: Option<ClosedFormFunction> = None;

        for family in FunctionFamily::CANDIDATES {
            let Some(candidate) = self.fit_family(family, points) else {
                debug!(family = %family, "family excluded");
                continue;
            };
            let candidate_mse = candidate.mse.unwrap_or(f64::INFINITY);
            debug!(family = %family, mse = candidate_mse, "family fitted");

            let replace = match &best {
                None => true,
                Some(current) => {
                    let current_mse = current.mse.unwrap_or(f64::INFINITY);
                    candidate_mse < current_mse - (MSE_REL_TOL * current_mse + MSE_ABS_TOL)
                }
            };
            if replace {
                best = Some(candidate);
            }
        }

        match best {
            Some(function) => {
                info!(
                    family = %function.family,
                    mse = function.mse.unwrap_or(f64::NAN),
                    "selected closed form"
                );
                function
            }
            None => {
                warn!(points = points.len(), "no family converged, using identity");
                ClosedFormFunction::identity()
            }
        }
    }

    /// Fit a single family. `None` if it does not converge.
    pub fn fit_family(
        &self,
        family: FunctionFamily,
        points: &[(f64, f64)],
    ) -> Option<ClosedFormFunction> {
        let k = family.parameter_count();
        if k == 0 || points.len() < k {
            return None;
        }

        let coefficients = levenberg_marquardt(family, points)?;
        let cost = sum_squared_residuals(family, &coefficients, points)?;
        Some(ClosedFormFunction {
            family,
            coefficients,
            mse: Some(cost / points.len() as f64),
        })
    }
}

fn parse_number(index: usize, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TabulaxError::NonNumeric {
            index,
            value: text.to_string(),
        })
}

fn sum_squared_residuals(family: FunctionFamily, p: &[f64], points: &[(f64, f64)]) -> Option<f64> {
    let mut cost = 0.0;
    for &(x, y) in points {
        let r = y - family.eval(p, x)?;
        cost += r * r;
    }
    cost.is_finite().then_some(cost)
}

/// Damped Gauss-Newton least squares starting from all-ones coefficients.
fn levenberg_marquardt(family: FunctionFamily, points: &[(f64, f64)]) -> Option<Vec<f64>> {
    let k = family.parameter_count();
    let max_iterations = 200 * (k + 1);
    let scale: f64 = 1.0 + points.iter().map(|(_, y)| y * y).sum::<f64>();

    let mut p = vec![1.0; k];
    let mut cost = sum_squared_residuals(family, &p, points)?;
    let mut lambda = LAMBDA_INIT;

    for _ in 0..max_iterations {
        if cost <= 1e-28 * scale {
            return Some(p);
        }

        // Normal equations JᵀJ·δ = Jᵀr
        let mut jtj = vec![vec![0.0; k]; k];
        let mut jtr = vec![0.0; k];
        for &(x, y) in points {
            let g = family.gradient(&p, x)?;
            let r = y - family.eval(&p, x)?;
            for i in 0..k {
                jtr[i] += g[i] * r;
                for j in 0..k {
                    jtj[i][j] += g[i] * g[j];
                }
            }
        }
        if jtr.iter().chain(jtj.iter().flatten()).any(|v| !v.is_finite()) {
            return None;
        }

        loop {
            let mut a = jtj.clone();
            for i in 0..k {
                a[i][i] += lambda * jtj[i][i].max(1e-12);
            }

            let trial = solve(a, jtr.clone()).and_then(|delta| {
                let candidate: Vec<f64> = p.iter().zip(&delta).map(|(pi, di)| pi + di).collect();
                let new_cost = sum_squared_residuals(family, &candidate, points)?;
                Some((delta, candidate, new_cost))
            });

            match trial {
                Some((delta, candidate, new_cost)) if new_cost < cost => {
                    let step: f64 = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
                    let size: f64 = p.iter().map(|v| v * v).sum::<f64>().sqrt();
                    let reduction = cost - new_cost;

                    p = candidate;
                    cost = new_cost;
                    lambda = (lambda * 0.1).max(1e-15);

                    if reduction <= FTOL * (cost + reduction) || step <= XTOL * (size + XTOL) {
                        return p.iter().all(|v| v.is_finite()).then_some(p);
                    }
                    break;
                }
                _ => {
                    lambda *= 10.0;
                    if lambda > LAMBDA_MAX {
                        // No further progress possible from a finite optimum
                        return p.iter().all(|v| v.is_finite()).then_some(p);
                    }
                }
            }
        }
    }

    None
}

/// Solve `a·x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_linear_selected_for_doubling() {
        let examples = ExampleSet::from_pairs([("1", "2"), ("2", "4"), ("3", "6")]);
        let rule = NumericalSynthesizer::new().fit(&examples).unwrap();

        assert_eq!(rule.family, FunctionFamily::Linear);
        assert!(rule.mse.unwrap() < 1e-12);
        assert!(approx(rule.evaluate(10.0).unwrap(), 20.0, 1e-6));
        assert_eq!(rule.apply("10"), "20");
    }

    #[test]
    fn test_quadratic_selected_for_squares() {
        let points: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, (i * i) as f64 + 1.0)).collect();
        let rule = NumericalSynthesizer::new().fit_points(&points);
        assert_eq!(rule.family, FunctionFamily::Quadratic);
        assert!(approx(rule.evaluate(10.0).unwrap(), 101.0, 1e-4));
    }

    #[test]
    fn test_exponential_family_recovers_parameters() {
        let points: Vec<(f64, f64)> = (0..7)
            .map(|i| {
                let x = i as f64 * 0.5;
                (x, 3.0 * (0.5 * x).exp())
            })
            .collect();
        let rule = NumericalSynthesizer::new()
            .fit_family(FunctionFamily::Exponential, &points)
            .unwrap();
        assert!(approx(rule.coefficients[0], 3.0, 1e-4));
        assert!(approx(rule.coefficients[1], 0.5, 1e-4));
    }

    #[test]
    fn test_too_few_points_excludes_family() {
        let points = [(1.0, 2.0), (2.0, 4.0)];
        let synth = NumericalSynthesizer::new();
        assert!(synth.fit_family(FunctionFamily::Quadratic, &points).is_none());
        assert!(synth.fit_family(FunctionFamily::Rational, &points).is_none());
        assert_eq!(synth.fit_points(&points).family, FunctionFamily::Linear);
    }

    #[test]
    fn test_single_point_falls_back_to_identity() {
        let rule = NumericalSynthesizer::new().fit_points(&[(5.0, 25.0)]);
        assert_eq!(rule.family, FunctionFamily::Identity);
        assert_eq!(rule.apply("7"), "7");
    }

    #[test]
    fn test_non_numeric_is_typed_error() {
        let examples = ExampleSet::from_pairs([("1", "2"), ("two", "4")]);
        match NumericalSynthesizer::new().fit(&examples) {
            Err(TabulaxError::NonNumeric { index, value }) => {
                assert_eq!(index, 1);
                assert_eq!(value, "two");
            }
            other => panic!("Expected NonNumeric, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_passes_through_non_numeric() {
        let rule = ClosedFormFunction {
            family: FunctionFamily::Linear,
            coefficients: vec![2.0, 0.0],
            mse: Some(0.0),
        };
        assert_eq!(rule.apply("abc"), "abc");
        assert_eq!(rule.apply(" 1.5 "), "3");
        assert_eq!(rule.apply_value(&Value::Null), Value::Null);
        assert_eq!(rule.apply_value(&serde_json::json!(4)), serde_json::json!(8));
        assert_eq!(rule.apply_value(&serde_json::json!(0.25)), serde_json::json!(0.5));
    }

    #[test]
    fn test_rational_pole_returns_input() {
        let rule = ClosedFormFunction {
            family: FunctionFamily::Rational,
            coefficients: vec![1.0, 0.0, 2.0],
            mse: Some(0.0),
        };
        assert_eq!(rule.apply("-2"), "-2");
        assert_eq!(rule.apply("2"), "0.5");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.0000000001), "1");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-1e-12), "0");
    }

    #[test]
    fn test_solve() {
        let x = solve(vec![vec![0.0, 2.0], vec![1.0, 1.0]], vec![4.0, 3.0]).unwrap();
        assert!(approx(x[0], 1.0, 1e-12));
        assert!(approx(x[1], 2.0, 1e-12));
        assert!(solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }
}
