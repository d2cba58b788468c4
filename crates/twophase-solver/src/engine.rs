use log::trace;

use crate::error::SolveError;
use crate::matrix::{dot, Matrix};
use crate::tableau::{Basis, Tableau};

/// Entering/leaving variable selection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotRule {
    /// Largest reduced cost enters, smallest ratio leaves; first found wins ties.
    /// Fast, but may cycle on degenerate problems.
    #[default]
    Dantzig,
    /// Lowest-index improving column enters, lowest-index basic column leaves
    /// on ratio ties. Never cycles.
    Bland,
}

/// Pivot counter shared by every engine run of one solve.
#[derive(Debug, Clone)]
pub(crate) struct IterationBudget {
    used: usize,
    limit: usize,
}

impl IterationBudget {
    pub fn new(limit: usize) -> Self {
        Self { used: 0, limit }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn charge(&mut self) -> Result<(), SolveError> {
        if self.used >= self.limit {
            return Err(SolveError::MaxIterationsExceeded(self.limit));
        }
        self.used += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Optimal,
    Unbounded,
}

/// Final state of one engine run.
#[derive(Debug, Clone)]
pub(crate) struct EngineRun {
    pub outcome: Outcome,
    /// Values of the basic variables, `B_inv * b`
    pub x_b: Vec<f64>,
    /// Simplex multipliers `c_b * B_inv`
    pub multipliers: Vec<f64>,
    pub b_inv: Matrix,
    /// Objective value at `x_b`, offset included
    pub objective: f64,
    /// Pivots performed by this run
    pub iterations: usize,
}

/// Revised simplex maximizing the tableau's cost row.
///
/// The constraint columns are never rewritten; only the basis and its
/// inverse change between iterations.
pub(crate) struct RevisedSimplex {
    rule: PivotRule,
    tolerance: f64,
}

impl RevisedSimplex {
    pub fn new(rule: PivotRule, tolerance: f64) -> Self {
        Self { rule, tolerance }
    }

    pub fn run(
        &self,
        tableau: &Tableau,
        basis: &mut Basis,
        budget: &mut IterationBudget,
    ) -> Result<EngineRun, SolveError> {
        let n_cols = tableau.num_columns();
        let columns: Vec<Vec<f64>> = (0..n_cols).map(|j| tableau.constraint_column(j)).collect();
        let cost = &tableau.cost_row()[..n_cols];
        let b = tableau.rhs();

        let mut b_inv = tableau
            .basis_matrix(basis)
            .inverse(self.tolerance)
            .ok_or_else(|| SolveError::degenerate("initial basis is singular"))?;
        let mut iterations = 0;

        loop {
            let x_b = b_inv.mul_vec(&b);
            let c_b: Vec<f64> = basis.basics().iter().map(|&j| cost[j]).collect();
            let multipliers = b_inv.vec_mul(&c_b);

            // Improvement rate of each nonbasic column: c_j - w * a_j
            let reduced: Vec<f64> = basis
                .nonbasics()
                .iter()
                .map(|&j| cost[j] - dot(&multipliers, &columns[j]))
                .collect();

            let objective = dot(&c_b, &x_b) - tableau.objective_offset();

            let Some(enter) = self.entering(&reduced, basis.nonbasics()) else {
                return Ok(EngineRun {
                    outcome: Outcome::Optimal,
                    x_b,
                    multipliers,
                    b_inv,
                    objective,
                    iterations,
                });
            };

            let entering_col = basis.nonbasics()[enter];
            let direction = b_inv.mul_vec(&columns[entering_col]);

            let Some(leave) = self.leaving(&x_b, &direction, basis.basics()) else {
                trace!("column {} improves without bound", entering_col);
                return Ok(EngineRun {
                    outcome: Outcome::Unbounded,
                    x_b,
                    multipliers,
                    b_inv,
                    objective,
                    iterations,
                });
            };

            budget.charge()?;
            let eta = Matrix::eta(&direction, leave, self.tolerance)
                .ok_or_else(|| SolveError::degenerate("zero pivot in basis update"))?;
            b_inv = eta.matmul(&b_inv);

            let (entered, left) = basis.swap(leave, enter);
            iterations += 1;
            trace!(
                "pivot {}: column {} enters (reduced cost {:.6}), column {} leaves, objective {:.6}",
                iterations,
                entered,
                reduced[enter],
                left,
                objective
            );
        }
    }

    /// Position in `nonbasics` of the entering column, or `None` at optimality.
    fn entering(&self, reduced: &[f64], nonbasics: &[usize]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (k, &d) in reduced.iter().enumerate() {
            if d <= self.tolerance {
                continue;
            }
            best = match (self.rule, best) {
                (_, None) => Some(k),
                (PivotRule::Dantzig, Some(b)) if d > reduced[b] => Some(k),
                (PivotRule::Bland, Some(b)) if nonbasics[k] < nonbasics[b] => Some(k),
                (_, keep) => keep,
            };
        }
        best
    }

    /// Basis position leaving on the minimum ratio test, or `None` when the
    /// entering direction has no positive entry.
    fn leaving(&self, x_b: &[f64], direction: &[f64], basics: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, (&x, &a)) in x_b.iter().zip(direction).enumerate() {
            if a <= self.tolerance {
                continue;
            }
            let ratio = x.max(0.0) / a;
            let replace = match best {
                None => true,
                Some((b, r)) => match self.rule {
                    PivotRule::Dantzig => ratio < r,
                    PivotRule::Bland => {
                        ratio < r - self.tolerance
                            || ((ratio - r).abs() <= self.tolerance && basics[i] < basics[b])
                    }
                },
            };
            if replace {
                best = Some((i, ratio));
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{LpProblem, Relation};
    use crate::tableau::TableauBuilder;

    fn build(problem: LpProblem) -> Tableau {
        TableauBuilder::new(&problem).unwrap().build()
    }

    fn textbook() -> Tableau {
        build(
            LpProblem::maximize(vec![3.0, 5.0])
                .with_constraint(vec![1.0, 0.0], Relation::Le, 4.0)
                .with_constraint(vec![0.0, 2.0], Relation::Le, 12.0)
                .with_constraint(vec![3.0, 2.0], Relation::Le, 18.0),
        )
    }

    #[test]
    fn test_textbook_optimum() {
        let tableau = textbook();
        let mut basis = tableau.initial_basis().unwrap();
        let mut budget = IterationBudget::new(100);
        let run = RevisedSimplex::new(PivotRule::Dantzig, 1e-9)
            .run(&tableau, &mut basis, &mut budget)
            .unwrap();

        assert_eq!(run.outcome, Outcome::Optimal);
        assert!((run.objective - 36.0).abs() < 1e-9, "obj = {}", run.objective);
        assert_eq!(run.iterations, 2);
        assert_eq!(budget.used(), 2);

        let x0 = basis.basics().iter().position(|&c| c == 0).unwrap();
        let x1 = basis.basics().iter().position(|&c| c == 1).unwrap();
        assert!((run.x_b[x0] - 2.0).abs() < 1e-9);
        assert!((run.x_b[x1] - 6.0).abs() < 1e-9);
        // Shadow prices of the three rows
        assert!(run.multipliers[0].abs() < 1e-9);
        assert!((run.multipliers[1] - 1.5).abs() < 1e-9);
        assert!((run.multipliers[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bland_reaches_same_optimum() {
        let tableau = textbook();
        let mut basis = tableau.initial_basis().unwrap();
        let mut budget = IterationBudget::new(100);
        let run = RevisedSimplex::new(PivotRule::Bland, 1e-9)
            .run(&tableau, &mut basis, &mut budget)
            .unwrap();
        assert_eq!(run.outcome, Outcome::Optimal);
        assert!((run.objective - 36.0).abs() < 1e-9, "obj = {}", run.objective);
    }

    #[test]
    fn test_unbounded_direction() {
        // max x0 + x1, x0 - x1 <= 1
        let tableau = build(
            LpProblem::maximize(vec![1.0, 1.0]).with_constraint(vec![1.0, -1.0], Relation::Le, 1.0),
        );
        let mut basis = tableau.initial_basis().unwrap();
        let mut budget = IterationBudget::new(100);
        let run = RevisedSimplex::new(PivotRule::Dantzig, 1e-9)
            .run(&tableau, &mut basis, &mut budget)
            .unwrap();
        assert_eq!(run.outcome, Outcome::Unbounded);
    }

    #[test]
    fn test_iteration_budget() {
        let tableau = textbook();
        let mut basis = tableau.initial_basis().unwrap();
        let mut budget = IterationBudget::new(1);
        let err = RevisedSimplex::new(PivotRule::Dantzig, 1e-9)
            .run(&tableau, &mut basis, &mut budget)
            .unwrap_err();
        assert_eq!(err, SolveError::MaxIterationsExceeded(1));
    }

    #[test]
    fn test_entering_rules() {
        let dantzig = RevisedSimplex::new(PivotRule::Dantzig, 1e-9);
        let bland = RevisedSimplex::new(PivotRule::Bland, 1e-9);
        let reduced = [0.5, 2.0, 2.0, -1.0];
        let nonbasics = [7, 5, 3, 1];
        assert_eq!(dantzig.entering(&reduced, &nonbasics), Some(1));
        assert_eq!(bland.entering(&reduced, &nonbasics), Some(2));
        assert_eq!(dantzig.entering(&[0.0, -1.0], &[0, 1]), None);
    }

    #[test]
    fn test_leaving_rules() {
        let dantzig = RevisedSimplex::new(PivotRule::Dantzig, 1e-9);
        let bland = RevisedSimplex::new(PivotRule::Bland, 1e-9);
        let x_b = [4.0, 2.0, 6.0, 1.0];
        let direction = [2.0, 1.0, 1.0, -1.0];
        let basics = [9, 4, 2, 0];
        // rows 0 and 1 tie at ratio 2
        assert_eq!(dantzig.leaving(&x_b, &direction, &basics), Some(0));
        assert_eq!(bland.leaving(&x_b, &direction, &basics), Some(1));
        assert_eq!(dantzig.leaving(&x_b, &[0.0, -1.0, 0.0, -2.0], &basics), None);
    }
}
