use std::time::Instant;

use log::{debug, info, warn};

use crate::engine::{EngineRun, IterationBudget, Outcome, PivotRule, RevisedSimplex};
use crate::error::SolveError;
use crate::extract::SolutionExtractor;
use crate::phase_one::{PhaseOne, Verdict};
use crate::problem::{LpProblem, Sense};
use crate::solution::{PhaseOneReport, SolveResult};
use crate::tableau::{Basis, Tableau, TableauBuilder};

/// How minimization problems are turned into maximizations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimizationStrategy {
    /// Solve the dual maximization and recover primal values by complementary slackness
    #[default]
    Dual,
    /// Maximize the negated objective
    Negate,
}

/// Two-phase revised simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per solve before giving up
    max_iterations: usize,
    /// Tolerance for pivot, reduced cost and ratio comparisons
    tolerance: f64,
    /// Tolerance for the phase-1 residual and the final constraint check
    feasibility_tolerance: f64,
    pivot_rule: PivotRule,
    minimization: MinimizationStrategy,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            pivot_rule: PivotRule::default(),
            minimization: MinimizationStrategy::default(),
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.feasibility_tolerance = tol;
        self
    }

    pub fn with_pivot_rule(mut self, rule: PivotRule) -> Self {
        self.pivot_rule = rule;
        self
    }

    pub fn with_minimization(mut self, strategy: MinimizationStrategy) -> Self {
        self.minimization = strategy;
        self
    }

    /// Solve the LP problem. Every failure is reported through the status.
    pub fn solve(&self, problem: &LpProblem) -> SolveResult {
        let started = Instant::now();
        let mut run = SolveRun::new(self);

        let result = match run.solve(problem) {
            Ok(result) => result,
            Err(err) => {
                warn!("solve aborted: {}", err);
                SolveResult::without_solution(err.status(), run.budget.used(), run.phase_one)
            }
        };

        info!(
            "{} problem with {} variables and {} constraints: {:?} after {} iterations in {:.2?}",
            problem.sense,
            problem.num_variables(),
            problem.num_constraints(),
            result.status,
            result.iterations,
            started.elapsed()
        );
        result
    }

    /// Like [`Solver::solve`], but returns dimension, degeneracy and
    /// iteration-limit failures as errors.
    pub fn try_solve(&self, problem: &LpProblem) -> Result<SolveResult, SolveError> {
        SolveRun::new(self).solve(problem)
    }
}

/// Optimal end state of a maximization.
struct Optimum {
    tableau: Tableau,
    basis: Basis,
    run: EngineRun,
}

enum MaxOutcome {
    Optimal(Optimum),
    Unbounded,
    Infeasible,
}

/// State owned by a single solve call.
struct SolveRun<'s> {
    solver: &'s Solver,
    engine: RevisedSimplex,
    budget: IterationBudget,
    phase_one: Option<PhaseOneReport>,
}

impl<'s> SolveRun<'s> {
    fn new(solver: &'s Solver) -> Self {
        Self {
            solver,
            engine: RevisedSimplex::new(solver.pivot_rule, solver.tolerance),
            budget: IterationBudget::new(solver.max_iterations),
            phase_one: None,
        }
    }

    fn solve(&mut self, problem: &LpProblem) -> Result<SolveResult, SolveError> {
        problem.validate()?;

        let result = match (problem.sense, self.solver.minimization) {
            (Sense::Max, _) => self.solve_primal(problem)?,
            (Sense::Min, MinimizationStrategy::Negate) => self.solve_negated(problem)?,
            (Sense::Min, MinimizationStrategy::Dual) => self.solve_via_dual(problem)?,
        };

        if let Some(values) = &result.variables {
            let violations = problem.violations(values, self.solver.feasibility_tolerance);
            if let Some(worst) = violations.first() {
                warn!(
                    "optimal point violates {} constraints, worst is row {} by {:.3e}",
                    violations.len(),
                    worst.row,
                    worst.violation_amount
                );
            }
        }
        Ok(result)
    }

    fn solve_primal(&mut self, problem: &LpProblem) -> Result<SolveResult, SolveError> {
        Ok(match self.maximize(problem)? {
            MaxOutcome::Optimal(opt) => {
                let extractor = SolutionExtractor::new(&opt.tableau, &opt.basis, &opt.run, self.solver.tolerance);
                SolveResult::optimal(
                    extractor.objective_value(),
                    extractor.primal_values(),
                    self.budget.used(),
                    self.phase_one,
                )
            }
            MaxOutcome::Unbounded => SolveResult::unbounded(self.budget.used(), self.phase_one),
            MaxOutcome::Infeasible => SolveResult::infeasible(self.budget.used(), self.phase_one),
        })
    }

    fn solve_negated(&mut self, problem: &LpProblem) -> Result<SolveResult, SolveError> {
        let negated = LpProblem {
            objective: problem.objective.iter().map(|c| -c).collect(),
            sense: Sense::Max,
            ..problem.clone()
        };
        let mut result = self.solve_primal(&negated)?;
        result.objective_value = result.objective_value.map(|z| -z);
        Ok(result)
    }

    fn solve_via_dual(&mut self, problem: &LpProblem) -> Result<SolveResult, SolveError> {
        // Without constraints the dual has no variables to solve for
        if problem.num_constraints() == 0 {
            return self.solve_negated(problem);
        }
        let dual = problem.dual()?;

        match self.maximize(&dual)? {
            MaxOutcome::Optimal(opt) => {
                let extractor = SolutionExtractor::new(&opt.tableau, &opt.basis, &opt.run, self.solver.tolerance);
                Ok(SolveResult::optimal(
                    extractor.objective_value(),
                    extractor.dual_values(problem.num_variables()),
                    self.budget.used(),
                    self.phase_one,
                ))
            }
            MaxOutcome::Unbounded => Ok(SolveResult::infeasible(self.budget.used(), self.phase_one)),
            MaxOutcome::Infeasible => {
                // An infeasible dual leaves the primal either infeasible or unbounded
                let probe = LpProblem {
                    objective: vec![0.0; problem.num_variables()],
                    sense: Sense::Max,
                    ..problem.clone()
                };
                debug!("dual infeasible, probing primal feasibility");
                match self.maximize(&probe)? {
                    MaxOutcome::Optimal(_) => Ok(SolveResult::unbounded(self.budget.used(), self.phase_one)),
                    MaxOutcome::Infeasible => Ok(SolveResult::infeasible(self.budget.used(), self.phase_one)),
                    MaxOutcome::Unbounded => Err(SolveError::degenerate("zero objective reported unbounded")),
                }
            }
        }
    }

    /// Builds the tableau of a maximization problem and runs both phases.
    fn maximize(&mut self, problem: &LpProblem) -> Result<MaxOutcome, SolveError> {
        let mut tableau = TableauBuilder::new(problem)?.build();

        if tableau.needs_phase_one() {
            let phase = PhaseOne::augment(
                &mut tableau,
                self.solver.tolerance,
                self.solver.feasibility_tolerance,
            );
            let mut basis = tableau
                .initial_basis()
                .ok_or_else(|| SolveError::degenerate("row without a starting basic column"))?;
            let started = self.budget.used();
            let run = self.engine.run(&tableau, &mut basis, &mut self.budget)?;

            // The phase-1 objective is bounded by zero; treat anything else as infeasible
            let verdict = match run.outcome {
                Outcome::Optimal => phase.conclude(&mut tableau, &mut basis, &run, &mut self.budget)?,
                Outcome::Unbounded => Verdict::Infeasible { residual: -run.objective },
            };
            let residual = match verdict {
                Verdict::Feasible { residual } | Verdict::Infeasible { residual } => residual,
            };
            self.phase_one.get_or_insert(PhaseOneReport {
                iterations: self.budget.used() - started,
                residual,
            });
            debug!("phase 1 finished: {:?}", verdict);

            if let Verdict::Infeasible { .. } = verdict {
                return Ok(MaxOutcome::Infeasible);
            }
            return self.phase_two(tableau, basis);
        }

        let basis = tableau
            .initial_basis()
            .ok_or_else(|| SolveError::degenerate("row without a starting basic column"))?;
        self.phase_two(tableau, basis)
    }

    fn phase_two(&mut self, tableau: Tableau, mut basis: Basis) -> Result<MaxOutcome, SolveError> {
        let run = self.engine.run(&tableau, &mut basis, &mut self.budget)?;
        debug!(
            "phase 2 finished: {:?} after {} pivots, objective {}",
            run.outcome, run.iterations, run.objective
        );
        Ok(match run.outcome {
            Outcome::Optimal => MaxOutcome::Optimal(Optimum { tableau, basis, run }),
            Outcome::Unbounded => MaxOutcome::Unbounded,
        })
    }
}
