//! Linear expressions over decision variables.
//!
//! A [`LinExpr`] is a sum of `coefficient * variable` terms plus a constant.
//! Expressions support natural operator syntax (`x + y`, `2.0 * x - 1.0`)
//! and compare into [`LinConstraint`]s with `leq` / `geq` / `eq`.

use std::ops::{Add, Mul, Neg, Sub};

/// Handle to a decision variable. An index into the owning model;
/// only meaningful for the [`LpModel`](super::LpModel) that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) usize);

/// A linear combination of variables plus a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    /// `(variable, coefficient)` terms. Not normalized: a variable may
    /// appear more than once, and the backend sums duplicates.
    pub(crate) terms: Vec<(VarId, f64)>,
    pub(crate) constant: f64,
}

impl LinExpr {
    /// The zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Appends a `coefficient * variable` term.
    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    /// Evaluates the expression against per-variable values.
    pub(crate) fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.0])
            .sum::<f64>()
            + self.constant
    }

    /// Constraint: `self <= rhs`.
    pub fn leq(self, rhs: impl Into<LinExpr>) -> LinConstraint {
        LinConstraint::new(self - rhs.into(), CmpSense::Leq)
    }

    /// Constraint: `self >= rhs`.
    pub fn geq(self, rhs: impl Into<LinExpr>) -> LinConstraint {
        LinConstraint::new(self - rhs.into(), CmpSense::Geq)
    }

    /// Constraint: `self == rhs`.
    pub fn eq(self, rhs: impl Into<LinExpr>) -> LinConstraint {
        LinConstraint::new(self - rhs.into(), CmpSense::Eq)
    }
}

/// Sums an iterator of variables into one expression.
pub fn lin_sum<I: IntoIterator<Item = VarId>>(vars: I) -> LinExpr {
    let mut expr = LinExpr::new();
    for var in vars {
        expr.add_term(var, 1.0);
    }
    expr
}

/// Comparison direction of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpSense {
    Leq,
    Geq,
    Eq,
}

/// A linear constraint, normalized to `expr (<=|>=|==) 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinConstraint {
    pub(crate) expr: LinExpr,
    pub(crate) sense: CmpSense,
}

impl LinConstraint {
    fn new(expr: LinExpr, sense: CmpSense) -> Self {
        Self { expr, sense }
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<i64> for LinExpr {
    fn from(value: i64) -> Self {
        Self::constant(value as f64)
    }
}

impl Add for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Add<VarId> for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: VarId) -> LinExpr {
        self.add_term(rhs, 1.0);
        self
    }
}

impl Add<f64> for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: f64) -> LinExpr {
        self.constant += rhs;
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: LinExpr) -> LinExpr {
        self.terms
            .extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
        self
    }
}

impl Sub<VarId> for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: VarId) -> LinExpr {
        self.add_term(rhs, -1.0);
        self
    }
}

impl Sub<f64> for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: f64) -> LinExpr {
        self.constant -= rhs;
        self
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;
    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, coeff) in &mut self.terms {
            *coeff *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;
    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs * self
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;
    fn mul(self, rhs: VarId) -> LinExpr {
        LinExpr {
            terms: vec![(rhs, self)],
            constant: 0.0,
        }
    }
}

impl Add<LinExpr> for VarId {
    type Output = LinExpr;
    fn add(self, rhs: LinExpr) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;
    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_arithmetic() {
        let x = VarId(0);
        let y = VarId(1);

        let expr = 2.0 * x + 3.0 * y - 5.0;
        assert_eq!(expr.terms, vec![(x, 2.0), (y, 3.0)]);
        assert_eq!(expr.constant, -5.0);

        let values = [4.0, 1.0];
        assert_eq!(expr.eval(&values), 2.0 * 4.0 + 3.0 * 1.0 - 5.0);
    }

    #[test]
    fn test_lin_sum() {
        let vars = [VarId(0), VarId(1), VarId(2)];
        let expr = lin_sum(vars);
        assert_eq!(expr.terms.len(), 3);
        assert!(expr.terms.iter().all(|(_, c)| *c == 1.0));
        assert_eq!(expr.constant, 0.0);
    }

    #[test]
    fn test_constraint_normalization() {
        let x = VarId(0);
        // x + 1 <= 3  normalizes to  x - 2 <= 0
        let c = (LinExpr::from(x) + 1.0).leq(3.0);
        assert_eq!(c.sense, CmpSense::Leq);
        assert_eq!(c.expr.constant, -2.0);

        let y = VarId(1);
        // x == y  normalizes to  x - y == 0
        let c = LinExpr::from(x).eq(LinExpr::from(y));
        assert_eq!(c.sense, CmpSense::Eq);
        assert_eq!(c.expr.terms, vec![(x, 1.0), (y, -1.0)]);
    }

    #[test]
    fn test_scalar_multiplication() {
        let x = VarId(0);
        let expr = (LinExpr::from(x) + 2.0) * 3.0;
        assert_eq!(expr.terms, vec![(x, 3.0)]);
        assert_eq!(expr.constant, 6.0);

        let negated = -expr;
        assert_eq!(negated.terms, vec![(x, -3.0)]);
        assert_eq!(negated.constant, -6.0);
    }
}
