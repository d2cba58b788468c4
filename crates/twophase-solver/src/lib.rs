mod dual;
mod engine;
mod error;
mod extract;
mod matrix;
mod phase_one;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use engine::PivotRule;
pub use error::SolveError;
pub use matrix::{dot, Matrix};
pub use problem::{LpProblem, Relation, Sense};
pub use simplex::{MinimizationStrategy, Solver};
pub use solution::{ConstraintViolation, PhaseOneReport, SolutionStatus, SolveResult};
