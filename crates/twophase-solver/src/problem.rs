use std::fmt;

use crate::error::SolveError;
use crate::solution::ConstraintViolation;

/// Represents a linear programming problem over non-negative variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Objective function coefficients, one per variable
    pub objective: Vec<f64>,
    /// Constraint coefficient rows
    pub constraints: Vec<Vec<f64>>,
    /// Relational operator of each constraint row
    pub relations: Vec<Relation>,
    /// Right-hand side of each constraint row
    pub rhs: Vec<f64>,
    /// Whether to maximize or minimize
    pub sense: Sense,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Max,
    Min,
}

impl Relation {
    /// The relation that holds after multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Eq => Relation::Eq,
        }
    }

    fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Relation::Le => lhs <= rhs + tolerance,
            Relation::Ge => lhs >= rhs - tolerance,
            Relation::Eq => (lhs - rhs).abs() <= tolerance,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Le => "<=",
            Relation::Ge => ">=",
            Relation::Eq => "=",
        })
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Max => "max",
            Sense::Min => "min",
        })
    }
}

impl LpProblem {
    pub fn new(sense: Sense, objective: Vec<f64>) -> Self {
        Self {
            objective,
            constraints: Vec::new(),
            relations: Vec::new(),
            rhs: Vec::new(),
            sense,
        }
    }

    pub fn maximize(objective: Vec<f64>) -> Self {
        Self::new(Sense::Max, objective)
    }

    pub fn minimize(objective: Vec<f64>) -> Self {
        Self::new(Sense::Min, objective)
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, relation: Relation, rhs: f64) {
        self.constraints.push(coefficients);
        self.relations.push(relation);
        self.rhs.push(rhs);
    }

    pub fn with_constraint(mut self, coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Self {
        self.add_constraint(coefficients, relation, rhs);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Checks that every vector and row agrees on `n` and `m`.
    pub fn validate(&self) -> Result<(), SolveError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(SolveError::NoVariables);
        }
        let m = self.num_constraints();
        if self.relations.len() != m {
            return Err(SolveError::dimension("relations", m, self.relations.len()));
        }
        if self.rhs.len() != m {
            return Err(SolveError::dimension("rhs", m, self.rhs.len()));
        }
        for (i, row) in self.constraints.iter().enumerate() {
            if row.len() != n {
                return Err(SolveError::dimension(format!("constraint row {}", i), n, row.len()));
            }
        }
        Ok(())
    }

    /// Objective value of the given assignment.
    pub fn objective_at(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, x)| c * x).sum()
    }

    /// Constraints violated by `values` beyond `tolerance`, worst first.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for (row, ((coefficients, &relation), &rhs)) in self
            .constraints
            .iter()
            .zip(&self.relations)
            .zip(&self.rhs)
            .enumerate()
        {
            let lhs: f64 = coefficients.iter().zip(values).map(|(a, x)| a * x).sum();
            // Scale with the magnitude of the row so large right-hand sides are not over-reported
            let tol = tolerance * (1.0 + rhs.abs());
            if !relation.holds(lhs, rhs, tol) {
                violations.push(ConstraintViolation {
                    row,
                    relation,
                    required: rhs,
                    actual: lhs,
                    violation_amount: (lhs - rhs).abs(),
                });
            }
        }

        violations.sort_by(|a, b| {
            b.violation_amount
                .partial_cmp(&a.violation_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        violations
    }
}

fn write_linear(f: &mut fmt::Formatter<'_>, coefficients: &[f64]) -> fmt::Result {
    let mut first = true;
    for (j, &c) in coefficients.iter().enumerate() {
        if c == 0.0 {
            continue;
        }
        if first {
            write!(f, "{} x{}", c, j)?;
        } else if c < 0.0 {
            write!(f, " - {} x{}", -c, j)?;
        } else {
            write!(f, " + {} x{}", c, j)?;
        }
        first = false;
    }
    if first {
        f.write_str("0")?;
    }
    Ok(())
}

impl fmt::Display for LpProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.sense)?;
        write_linear(f, &self.objective)?;
        writeln!(f)?;
        writeln!(f, "subject to")?;
        for ((row, relation), rhs) in self.constraints.iter().zip(&self.relations).zip(&self.rhs) {
            f.write_str("  ")?;
            write_linear(f, row)?;
            writeln!(f, " {} {}", relation, rhs)?;
        }
        Ok(())
    }
}
