use log::debug;

use crate::engine::{EngineRun, IterationBudget};
use crate::error::SolveError;
use crate::matrix::{dot, Matrix};
use crate::problem::Relation;
use crate::tableau::{Basis, Tableau};

/// Result of inspecting the phase-1 optimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Verdict {
    /// Artificials could be driven to zero; the tableau is ready for phase 2
    Feasible { residual: f64 },
    /// Some artificial stays positive at the phase-1 optimum
    Infeasible { residual: f64 },
}

/// Two-phase bookkeeping: adds artificial columns, installs the auxiliary
/// objective, and afterwards restores the real one.
#[derive(Debug, Clone)]
pub(crate) struct PhaseOne {
    /// Real cost row (offset cell included), saved while phase 1 runs
    saved_cost: Vec<f64>,
    tolerance: f64,
    feasibility_tolerance: f64,
}

impl PhaseOne {
    /// Adds surplus and artificial columns for every `>=` and `=` row and
    /// replaces row 0 with the phase-1 objective `max -sum(artificials)`.
    pub fn augment(tableau: &mut Tableau, tolerance: f64, feasibility_tolerance: f64) -> Self {
        let m = tableau.num_rows();

        for i in 0..m {
            let relation = tableau.row_info()[i].relation;
            if relation == Relation::Le {
                continue;
            }
            let mut unit = vec![0.0; m + 1];
            if relation == Relation::Ge {
                unit[i + 1] = -1.0;
                let surplus = tableau.append_column(&unit);
                tableau.row_info_mut(i).slack = Some(surplus);
            }
            unit[i + 1] = 1.0;
            let artificial = tableau.append_column(&unit);
            tableau.mark_artificial(artificial);
            tableau.row_info_mut(i).unit = Some(artificial);
        }

        let saved_cost = tableau.cost_row().to_vec();

        // Row 0 holds the negated phase-1 objective: +1 on every artificial
        let mut aux = vec![0.0; saved_cost.len()];
        for &a in tableau.artificials() {
            aux[a] = 1.0;
        }
        tableau.set_cost_row(&aux);

        // Zero the artificial columns of row 0, then flip to maximization form
        let rows: Vec<usize> = tableau
            .row_info()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.unit.is_some_and(|u| tableau.is_artificial(u)))
            .map(|(i, _)| i)
            .collect();
        let matrix = tableau.matrix_mut();
        for i in rows {
            matrix.add_scaled_row(0, i + 1, -1.0);
        }
        matrix.negate_row(0);

        debug!(
            "phase 1: {} artificial columns over {} rows",
            tableau.artificials().len(),
            m
        );

        Self {
            saved_cost,
            tolerance,
            feasibility_tolerance,
        }
    }

    /// Inspects the phase-1 optimum and, when feasible, turns the tableau
    /// into a phase-2 starting point: artificials leave the basis and the
    /// tableau, and the real objective row is reinstalled.
    pub fn conclude(
        self,
        tableau: &mut Tableau,
        basis: &mut Basis,
        run: &EngineRun,
        budget: &mut IterationBudget,
    ) -> Result<Verdict, SolveError> {
        let residual: f64 = basis
            .basics()
            .iter()
            .zip(&run.x_b)
            .filter(|&(&c, _)| tableau.is_artificial(c))
            .map(|(_, &v)| v.max(0.0))
            .sum();

        let scale = 1.0 + tableau.rhs().iter().fold(0.0_f64, |acc, b| acc.max(b.abs()));
        if residual > self.feasibility_tolerance * scale {
            debug!("phase 1 ended with artificial residual {:.3e}", residual);
            return Ok(Verdict::Infeasible { residual });
        }

        self.drive_out_artificials(tableau, basis, run.b_inv.clone(), budget)?;

        let removed = tableau.artificials().to_vec();
        let remap = tableau.remove_columns(&removed);
        basis.remap(&remap);
        let cost = remap.retain(&self.saved_cost);

        self.restore_objective(tableau, basis, cost)?;
        Ok(Verdict::Feasible { residual })
    }

    /// Pivots zero-valued basic artificials out on a non-artificial column.
    /// Rows where no such column exists are redundant and are deleted.
    fn drive_out_artificials(
        &self,
        tableau: &mut Tableau,
        basis: &mut Basis,
        mut b_inv: Matrix,
        budget: &mut IterationBudget,
    ) -> Result<(), SolveError> {
        let mut redundant: Vec<(usize, usize)> = Vec::new();

        for pos in 0..basis.basics().len() {
            let col = basis.basics()[pos];
            if !tableau.is_artificial(col) {
                continue;
            }

            let mut best: Option<(usize, f64)> = None;
            for (k, &j) in basis.nonbasics().iter().enumerate() {
                if tableau.is_artificial(j) {
                    continue;
                }
                let alpha = dot(&b_inv[pos], &tableau.constraint_column(j));
                if alpha.abs() > self.tolerance && best.is_none_or(|(_, a)| alpha.abs() > a) {
                    best = Some((k, alpha.abs()));
                }
            }

            match best {
                Some((enter, _)) => {
                    let entering = basis.nonbasics()[enter];
                    let direction = b_inv.mul_vec(&tableau.constraint_column(entering));
                    let eta = Matrix::eta(&direction, pos, self.tolerance).ok_or_else(|| {
                        SolveError::degenerate("zero pivot while removing artificial")
                    })?;
                    budget.charge()?;
                    b_inv = eta.matmul(&b_inv);
                    basis.swap(pos, enter);
                    debug!("artificial column {} replaced by column {}", col, entering);
                }
                None => {
                    let row = tableau
                        .row_info()
                        .iter()
                        .position(|r| r.unit == Some(col))
                        .ok_or_else(|| SolveError::degenerate("artificial without a home row"))?;
                    redundant.push((pos, row));
                }
            }
        }

        // Highest positions and rows first so earlier indices stay valid
        redundant.sort_by(|a, b| b.0.cmp(&a.0));
        for &(pos, _) in &redundant {
            basis.remove_position(pos);
        }
        let mut rows: Vec<usize> = redundant.iter().map(|&(_, row)| row).collect();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        for row in rows {
            debug!("dropping redundant constraint row {}", tableau.row_info()[row].origin);
            tableau.remove_row(row);
        }
        Ok(())
    }

    /// Installs `cost` as row 0 and eliminates it on every basic column.
    fn restore_objective(
        &self,
        tableau: &mut Tableau,
        basis: &Basis,
        mut cost: Vec<f64>,
    ) -> Result<(), SolveError> {
        let b_inv = tableau
            .basis_matrix(basis)
            .inverse(self.tolerance)
            .ok_or_else(|| SolveError::degenerate("basis singular after removing artificials"))?;
        let canonical = b_inv.matmul(&tableau.constraint_block());

        for (pos, &col) in basis.basics().iter().enumerate() {
            let pivot = canonical[pos][col];
            if pivot.abs() <= self.tolerance {
                return Err(SolveError::degenerate(format!(
                    "zero pivot on basic column {} while restoring objective",
                    col
                )));
            }
            let factor = cost[col] / pivot;
            if factor != 0.0 {
                for (c, &a) in cost.iter_mut().zip(&canonical[pos]) {
                    *c -= factor * a;
                }
            }
        }

        tableau.set_cost_row(&cost);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Outcome, PivotRule, RevisedSimplex};
    use crate::problem::LpProblem;
    use crate::tableau::TableauBuilder;

    fn phase_one(problem: &LpProblem) -> (Tableau, Basis, Verdict) {
        let mut tableau = TableauBuilder::new(problem).unwrap().build();
        let phase = PhaseOne::augment(&mut tableau, 1e-9, 1e-7);
        let mut basis = tableau.initial_basis().unwrap();
        let mut budget = IterationBudget::new(100);
        let run = RevisedSimplex::new(PivotRule::Dantzig, 1e-9)
            .run(&tableau, &mut basis, &mut budget)
            .unwrap();
        assert_eq!(run.outcome, Outcome::Optimal);
        let verdict = phase.conclude(&mut tableau, &mut basis, &run, &mut budget).unwrap();
        (tableau, basis, verdict)
    }

    #[test]
    fn test_augment_layout() {
        let problem = LpProblem::maximize(vec![1.0, 1.0])
            .with_constraint(vec![1.0, 1.0], Relation::Eq, 3.0)
            .with_constraint(vec![2.0, 1.0], Relation::Ge, 2.0)
            .with_constraint(vec![1.0, 0.0], Relation::Le, 5.0);
        let mut tableau = TableauBuilder::new(&problem).unwrap().build();
        let phase = PhaseOne::augment(&mut tableau, 1e-9, 1e-7);

        // x0 x1 s2 | a0 | e1 a1
        assert_eq!(tableau.num_columns(), 6);
        assert_eq!(tableau.artificials(), &[3, 5]);
        assert_eq!(tableau.row_info()[1].slack, Some(4));
        assert_eq!(tableau.constraint_column(4), vec![0.0, -1.0, 0.0]);

        // Phase-1 row: sum of the artificial rows, zero on the artificials
        assert_eq!(tableau.cost_row(), &[3.0, 2.0, 0.0, 0.0, -1.0, 0.0, 5.0]);
        assert_eq!(phase.saved_cost, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let basis = tableau.initial_basis().unwrap();
        assert_eq!(basis.basics(), &[3, 5, 2]);
    }

    #[test]
    fn test_feasible_restores_objective() {
        let problem = LpProblem::maximize(vec![1.0, 1.0])
            .with_constraint(vec![1.0, 1.0], Relation::Eq, 3.0)
            .with_constraint(vec![2.0, 1.0], Relation::Ge, 2.0)
            .with_constraint(vec![1.0, 0.0], Relation::Le, 5.0);
        let (tableau, basis, verdict) = phase_one(&problem);

        assert!(matches!(verdict, Verdict::Feasible { residual } if residual.abs() < 1e-9));
        assert!(tableau.artificials().is_empty());
        assert_eq!(tableau.num_columns(), 4);
        assert!(basis.basics().iter().all(|&c| c < 4));

        // Row 0 is zero on every basic column
        for &c in basis.basics() {
            assert!(tableau.cost_row()[c].abs() < 1e-9, "column {}", c);
        }
    }

    #[test]
    fn test_infeasible_residual() {
        let problem = LpProblem::maximize(vec![1.0])
            .with_constraint(vec![1.0], Relation::Ge, 5.0)
            .with_constraint(vec![1.0], Relation::Le, 2.0);
        let (_, _, verdict) = phase_one(&problem);
        assert!(matches!(verdict, Verdict::Infeasible { residual } if (residual - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_redundant_equality_dropped() {
        // The second row is twice the first
        let problem = LpProblem::maximize(vec![1.0, 2.0])
            .with_constraint(vec![1.0, 1.0], Relation::Eq, 2.0)
            .with_constraint(vec![2.0, 2.0], Relation::Eq, 4.0);
        let (tableau, basis, verdict) = phase_one(&problem);

        assert!(matches!(verdict, Verdict::Feasible { .. }));
        assert_eq!(tableau.num_rows(), 1);
        assert_eq!(basis.basics().len(), 1);
        assert_eq!(tableau.num_columns(), 2);
    }
}
