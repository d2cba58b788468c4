use log::debug;

use crate::error::SolveError;
use crate::matrix::Matrix;
use crate::problem::{LpProblem, Relation, Sense};

impl LpProblem {
    /// Returns the dual problem, leaving `self` untouched.
    ///
    /// Rows are first put in canonical form for the sense (`>=` when
    /// minimizing, `<=` when maximizing): rows of the other direction are
    /// negated and each `=` row is split into a `>=`/`<=` pair. The dual then
    /// has one variable per canonical row and one constraint per original
    /// variable; the roles of objective and right-hand side swap.
    pub fn dual(&self) -> Result<LpProblem, SolveError> {
        self.validate()?;
        let n = self.num_variables();

        let canonical = match self.sense {
            Sense::Min => Relation::Ge,
            Sense::Max => Relation::Le,
        };

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(self.num_constraints());
        let mut rhs: Vec<f64> = Vec::with_capacity(self.num_constraints());
        for ((row, &relation), &b) in self.constraints.iter().zip(&self.relations).zip(&self.rhs) {
            if relation != canonical.flipped() {
                rows.push(row.clone());
                rhs.push(b);
            }
            if relation != canonical {
                rows.push(row.iter().map(|a| -a).collect());
                rhs.push(-b);
            }
        }

        let transposed = Matrix::from_rows(n, &rows)?.transpose();
        let constraints = (0..transposed.rows()).map(|j| transposed[j].to_vec()).collect();

        let dual = LpProblem {
            objective: rhs,
            constraints,
            relations: vec![canonical.flipped(); n],
            rhs: self.objective.clone(),
            sense: match self.sense {
                Sense::Min => Sense::Max,
                Sense::Max => Sense::Min,
            },
        };

        debug!(
            "dual of {}x{} {} problem is {}x{} {}",
            self.num_constraints(),
            n,
            self.sense,
            dual.num_constraints(),
            dual.num_variables(),
            dual.sense
        );
        Ok(dual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_of_min() {
        let problem = LpProblem::minimize(vec![2.0, 3.0])
            .with_constraint(vec![1.0, 1.0], Relation::Ge, 4.0)
            .with_constraint(vec![1.0, 0.0], Relation::Le, 3.0)
            .with_constraint(vec![0.0, 1.0], Relation::Eq, 1.0);
        let dual = problem.dual().unwrap();

        assert_eq!(dual.sense, Sense::Max);
        // Canonical rows: (1,1)>=4, (-1,0)>=-3, (0,1)>=1, (0,-1)>=-1
        assert_eq!(dual.objective, vec![4.0, -3.0, 1.0, -1.0]);
        assert_eq!(
            dual.constraints,
            vec![vec![1.0, -1.0, 0.0, 0.0], vec![1.0, 0.0, 1.0, -1.0]]
        );
        assert_eq!(dual.relations, vec![Relation::Le, Relation::Le]);
        assert_eq!(dual.rhs, vec![2.0, 3.0]);

        // The primal is not modified
        assert_eq!(problem.relations[1], Relation::Le);
        assert_eq!(problem.rhs, vec![4.0, 3.0, 1.0]);
    }

    #[test]
    fn test_dual_of_max() {
        let problem = LpProblem::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Relation::Le, 4.0)
            .with_constraint(vec![3.0, 2.0], Relation::Ge, 1.0);
        let dual = problem.dual().unwrap();

        assert_eq!(dual.sense, Sense::Min);
        assert_eq!(dual.objective, vec![4.0, -1.0]);
        assert_eq!(dual.constraints, vec![vec![1.0, -3.0], vec![0.0, -2.0]]);
        assert_eq!(dual.relations, vec![Relation::Ge, Relation::Ge]);
        assert_eq!(dual.rhs, vec![3.0, 5.0]);
    }

    #[test]
    fn test_dual_rejects_bad_dimensions() {
        let mut problem = LpProblem::minimize(vec![1.0]).with_constraint(vec![1.0], Relation::Ge, 1.0);
        problem.rhs.push(2.0);
        assert!(matches!(problem.dual(), Err(SolveError::InvalidDimension { .. })));
    }
}
