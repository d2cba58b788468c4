use crate::engine::EngineRun;
use crate::matrix::dot;
use crate::tableau::{Basis, Tableau};

/// Reads variable values back out of a finished engine run.
pub(crate) struct SolutionExtractor<'a> {
    tableau: &'a Tableau,
    basis: &'a Basis,
    run: &'a EngineRun,
    tolerance: f64,
}

impl<'a> SolutionExtractor<'a> {
    pub fn new(tableau: &'a Tableau, basis: &'a Basis, run: &'a EngineRun, tolerance: f64) -> Self {
        Self {
            tableau,
            basis,
            run,
            tolerance,
        }
    }

    pub fn objective_value(&self) -> f64 {
        self.run.objective
    }

    /// Values of the structural columns; slack and surplus columns are dropped.
    pub fn primal_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.tableau.num_structural()];
        for (&col, &x) in self.basis.basics().iter().zip(&self.run.x_b) {
            if col < values.len() {
                values[col] = self.clean(x);
            }
        }
        values
    }

    /// Recovers the variables of the problem this tableau is the dual of.
    ///
    /// Constraint row `j` of the dual belongs to original variable `j`. By
    /// complementary slackness that variable equals minus the final reduced
    /// cost of the row's slack (or surplus) column.
    pub fn dual_values(&self, n: usize) -> Vec<f64> {
        let cost = self.tableau.cost_row();
        let mut values = vec![0.0; n];
        for row in self.tableau.row_info() {
            let Some(slack) = row.slack else {
                continue;
            };
            let reduced = cost[slack] - dot(&self.run.multipliers, &self.tableau.constraint_column(slack));
            if let Some(v) = values.get_mut(row.origin) {
                *v = self.clean(-reduced);
            }
        }
        values
    }

    fn clean(&self, v: f64) -> f64 {
        if v.abs() <= self.tolerance { 0.0 } else { v }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{IterationBudget, PivotRule, RevisedSimplex};
    use crate::problem::{LpProblem, Relation};
    use crate::tableau::TableauBuilder;

    fn solve_le(problem: &LpProblem) -> (Tableau, Basis, EngineRun) {
        let tableau = TableauBuilder::new(problem).unwrap().build();
        let mut basis = tableau.initial_basis().unwrap();
        let run = RevisedSimplex::new(PivotRule::Dantzig, 1e-9)
            .run(&tableau, &mut basis, &mut IterationBudget::new(100))
            .unwrap();
        (tableau, basis, run)
    }

    #[test]
    fn test_primal_values() {
        let problem = LpProblem::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Relation::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Relation::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], Relation::Le, 18.0);
        let (tableau, basis, run) = solve_le(&problem);
        let extractor = SolutionExtractor::new(&tableau, &basis, &run, 1e-9);

        let values = extractor.primal_values();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 2.0).abs() < 1e-9, "x0 = {}", values[0]);
        assert!((values[1] - 6.0).abs() < 1e-9, "x1 = {}", values[1]);
        assert!((extractor.objective_value() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_dual_values_are_shadow_prices() {
        // Read through the slack columns, the row values are the shadow prices
        let problem = LpProblem::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Relation::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Relation::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], Relation::Le, 18.0);
        let (tableau, basis, run) = solve_le(&problem);
        let extractor = SolutionExtractor::new(&tableau, &basis, &run, 1e-9);

        let duals = extractor.dual_values(3);
        let expected = [0.0, 1.5, 1.0];
        for (d, e) in duals.iter().zip(expected) {
            assert!((d - e).abs() < 1e-9, "dual {} expected {}", d, e);
        }
    }
}
