use crate::problem::Relation;

/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal objective value, present only when optimal
    pub objective_value: Option<f64>,
    /// Optimal values of the original variables, present only when optimal
    pub variables: Option<Vec<f64>>,
    /// Pivots performed across all phases
    pub iterations: usize,
    /// Phase-1 statistics; `None` when the initial slack basis was already feasible
    pub phase_one: Option<PhaseOneReport>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The objective can be improved without bound
    Unbounded,
    /// No assignment satisfies all constraints
    Infeasible,
    /// Objective, constraint rows, relations and rhs disagree on size
    InvalidDimension,
    /// A zero pivot was met where a nonzero one is required
    NumericDegeneracy,
    /// The pivot loop hit the configured iteration limit
    MaxIterationsExceeded,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseOneReport {
    /// Pivots spent in phase 1, artificial drive-out included
    pub iterations: usize,
    /// Sum of artificial values at the phase-1 optimum
    pub residual: f64,
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint row index
    pub row: usize,
    pub relation: Relation,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
}

impl SolveResult {
    pub fn optimal(
        objective_value: f64,
        variables: Vec<f64>,
        iterations: usize,
        phase_one: Option<PhaseOneReport>,
    ) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value: Some(objective_value),
            variables: Some(variables),
            iterations,
            phase_one,
        }
    }

    /// A result without values, for every status other than optimal.
    pub fn without_solution(
        status: SolutionStatus,
        iterations: usize,
        phase_one: Option<PhaseOneReport>,
    ) -> Self {
        Self {
            status,
            objective_value: None,
            variables: None,
            iterations,
            phase_one,
        }
    }

    pub fn infeasible(iterations: usize, phase_one: Option<PhaseOneReport>) -> Self {
        Self::without_solution(SolutionStatus::Infeasible, iterations, phase_one)
    }

    pub fn unbounded(iterations: usize, phase_one: Option<PhaseOneReport>) -> Self {
        Self::without_solution(SolutionStatus::Unbounded, iterations, phase_one)
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
