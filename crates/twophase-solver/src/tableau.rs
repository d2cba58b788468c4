use log::debug;

use crate::error::SolveError;
use crate::matrix::Matrix;
use crate::problem::{LpProblem, Relation, Sense};

/// Bookkeeping for one constraint row of the tableau.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RowInfo {
    /// Index of the constraint in the problem the tableau was built from
    pub origin: usize,
    /// Relation after sign normalization
    pub relation: Relation,
    /// Slack (`<=`) or surplus (`>=`) column of this row
    pub slack: Option<usize>,
    /// Column with a unit entry in this row, used to seed the initial basis
    pub unit: Option<usize>,
}

/// Dense simplex tableau.
///
/// Row 0 is the cost row and rows `1..=m` are the constraints; the last
/// column holds the right-hand sides. The objective value of an assignment
/// is `sum(row0[j] * x[j]) - row0[rhs]`, so subtracting constraint rows
/// from row 0 never changes it.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    matrix: Matrix,
    rows: Vec<RowInfo>,
    artificials: Vec<usize>,
    n_structural: usize,
}

impl Tableau {
    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of variable columns, excluding the right-hand side.
    pub fn num_columns(&self) -> usize {
        self.matrix.cols() - 1
    }

    pub fn num_structural(&self) -> usize {
        self.n_structural
    }

    pub fn row_info(&self) -> &[RowInfo] {
        &self.rows
    }

    pub fn row_info_mut(&mut self, i: usize) -> &mut RowInfo {
        &mut self.rows[i]
    }

    pub fn artificials(&self) -> &[usize] {
        &self.artificials
    }

    pub fn is_artificial(&self, col: usize) -> bool {
        self.artificials.contains(&col)
    }

    /// Row 0 including the offset cell.
    pub fn cost_row(&self) -> &[f64] {
        &self.matrix[0]
    }

    pub fn objective_offset(&self) -> f64 {
        self.matrix[0][self.num_columns()]
    }

    pub fn set_cost_row(&mut self, row: &[f64]) {
        self.matrix[0].copy_from_slice(row);
    }

    pub fn constraint_column(&self, j: usize) -> Vec<f64> {
        self.matrix.column_range(j, 1..self.matrix.rows())
    }

    pub fn rhs(&self) -> Vec<f64> {
        self.constraint_column(self.num_columns())
    }

    /// Constraint rows, all columns including the right-hand side.
    pub fn constraint_block(&self) -> Matrix {
        let cols: Vec<usize> = (0..self.matrix.cols()).collect();
        self.matrix.submatrix(1..self.matrix.rows(), &cols)
    }

    /// The basis matrix `B` formed by the basic columns.
    pub fn basis_matrix(&self, basis: &Basis) -> Matrix {
        self.matrix.submatrix(1..self.matrix.rows(), basis.basics())
    }

    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    /// Appends a column in front of the right-hand side.
    ///
    /// `values` holds one entry per tableau row, row 0 first.
    pub fn append_column(&mut self, values: &[f64]) -> usize {
        let rhs = self.num_columns();
        let left: Vec<usize> = (0..rhs).collect();
        self.matrix = self
            .matrix
            .select_columns(&left)
            .hstack(&Matrix::column_vector(values))
            .hstack(&self.matrix.select_columns(&[rhs]));
        rhs
    }

    pub fn mark_artificial(&mut self, col: usize) {
        self.artificials.push(col);
    }

    /// Deletes constraint row `i`.
    pub fn remove_row(&mut self, i: usize) {
        self.matrix.remove_row(i + 1);
        self.rows.remove(i);
    }

    /// Deletes the given columns and renumbers every column reference the
    /// tableau owns. The returned remap must be applied to any outside
    /// reference (basis, saved rows) as well.
    pub fn remove_columns(&mut self, removed: &[usize]) -> ColumnRemap {
        let remap = ColumnRemap::removing(removed, self.num_columns());
        self.matrix = self.matrix.remove_columns(removed);
        for row in &mut self.rows {
            row.slack = row.slack.and_then(|c| remap.apply(c));
            row.unit = row.unit.and_then(|c| remap.apply(c));
        }
        self.artificials = self.artificials.iter().filter_map(|&c| remap.apply(c)).collect();
        remap
    }

    /// True when some row has no unit column to start the basis from.
    pub fn needs_phase_one(&self) -> bool {
        self.rows.iter().any(|r| r.unit.is_none())
    }

    /// Basis made of each row's unit column, if every row has one.
    pub fn initial_basis(&self) -> Option<Basis> {
        let basics = self.rows.iter().map(|r| r.unit).collect::<Option<Vec<_>>>()?;
        Some(Basis::new(basics, self.num_columns()))
    }
}

/// Builds the initial tableau of a maximization problem.
///
/// The builder owns copies of the problem data, so normalizing never
/// touches the caller's vectors.
#[derive(Debug, Clone)]
pub(crate) struct TableauBuilder {
    objective: Vec<f64>,
    rows: Matrix,
    relations: Vec<Relation>,
    rhs: Vec<f64>,
    flipped: Vec<bool>,
}

impl TableauBuilder {
    pub fn new(problem: &LpProblem) -> Result<Self, SolveError> {
        debug_assert_eq!(problem.sense, Sense::Max);
        let mut builder = Self {
            objective: problem.objective.clone(),
            rows: Matrix::from_rows(problem.num_variables(), &problem.constraints)?,
            relations: problem.relations.clone(),
            rhs: problem.rhs.clone(),
            flipped: vec![false; problem.num_constraints()],
        };
        builder.normalize();
        Ok(builder)
    }

    /// Negates every row with a negative right-hand side and flips its relation.
    fn normalize(&mut self) {
        for i in 0..self.rhs.len() {
            if self.rhs[i] < 0.0 {
                self.rows.negate_row(i);
                self.rhs[i] = -self.rhs[i];
                self.relations[i] = self.relations[i].flipped();
                self.flipped[i] = true;
            }
        }
    }

    pub fn build(self) -> Tableau {
        let m = self.rhs.len();
        let n = self.objective.len();

        let le_rows: Vec<usize> = (0..m).filter(|&i| self.relations[i] == Relation::Le).collect();
        let slacks = Matrix::identity(m).select_columns(&le_rows);

        let body = self
            .rows
            .hstack(&slacks)
            .hstack(&Matrix::column_vector(&self.rhs));

        let mut cost = self.objective.clone();
        cost.resize(body.cols(), 0.0);
        let matrix = Matrix::row_vector(&cost).vstack(&body);

        let mut next_slack = n;
        let rows = (0..m)
            .map(|i| {
                let slack = (self.relations[i] == Relation::Le).then(|| {
                    next_slack += 1;
                    next_slack - 1
                });
                RowInfo {
                    origin: i,
                    relation: self.relations[i],
                    slack,
                    unit: slack,
                }
            })
            .collect();

        debug!(
            "built tableau: {} rows ({} negated), {} structural, {} slack columns",
            m,
            self.flipped.iter().filter(|&&f| f).count(),
            n,
            le_rows.len()
        );

        Tableau {
            matrix,
            rows,
            artificials: Vec::new(),
            n_structural: n,
        }
    }
}

/// Basic and nonbasic column sets.
///
/// `basics[i]` is the variable whose value is `(B_inv * b)[i]`; together the
/// two lists partition the tableau columns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Basis {
    basics: Vec<usize>,
    nonbasics: Vec<usize>,
}

impl Basis {
    pub fn new(basics: Vec<usize>, n_columns: usize) -> Self {
        let nonbasics = (0..n_columns).filter(|c| !basics.contains(c)).collect();
        Self { basics, nonbasics }
    }

    pub fn basics(&self) -> &[usize] {
        &self.basics
    }

    pub fn nonbasics(&self) -> &[usize] {
        &self.nonbasics
    }

    /// Exchanges `basics[leave]` with `nonbasics[enter]`; returns
    /// `(entering, leaving)` columns.
    pub fn swap(&mut self, leave: usize, enter: usize) -> (usize, usize) {
        std::mem::swap(&mut self.basics[leave], &mut self.nonbasics[enter]);
        (self.basics[leave], self.nonbasics[enter])
    }

    /// Drops a basic position together with its row.
    pub fn remove_position(&mut self, pos: usize) -> usize {
        self.basics.remove(pos)
    }

    /// Renumbers both lists, dropping removed columns.
    pub fn remap(&mut self, remap: &ColumnRemap) {
        self.basics = self.basics.iter().filter_map(|&c| remap.apply(c)).collect();
        self.nonbasics = self.nonbasics.iter().filter_map(|&c| remap.apply(c)).collect();
    }
}

/// Old-to-new column numbering after deleting a set of columns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnRemap {
    mapping: Vec<Option<usize>>,
}

impl ColumnRemap {
    pub fn removing(removed: &[usize], n_columns: usize) -> Self {
        let mut next = 0;
        let mapping = (0..n_columns)
            .map(|c| {
                if removed.contains(&c) {
                    None
                } else {
                    next += 1;
                    Some(next - 1)
                }
            })
            .collect();
        Self { mapping }
    }

    /// New index of `col`, or `None` if it was removed. Indices past the
    /// mapped range (the right-hand side) shift by the number of removals.
    pub fn apply(&self, col: usize) -> Option<usize> {
        match self.mapping.get(col) {
            Some(&mapped) => mapped,
            None => Some(col - self.removed_count()),
        }
    }

    /// Keeps the entries of a row whose columns survive.
    pub fn retain(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .filter(|&(j, _)| self.apply(j).is_some())
            .map(|(_, &v)| v)
            .collect()
    }

    fn removed_count(&self) -> usize {
        self.mapping.iter().filter(|m| m.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_problem() -> LpProblem {
        LpProblem::maximize(vec![1.0, 1.0])
            .with_constraint(vec![1.0, 2.0], Relation::Le, -4.0)
            .with_constraint(vec![3.0, 1.0], Relation::Ge, -6.0)
            .with_constraint(vec![1.0, -1.0], Relation::Eq, -1.0)
            .with_constraint(vec![1.0, 0.0], Relation::Le, 5.0)
    }

    #[test]
    fn test_sign_normalization() {
        let problem = mixed_problem();
        let builder = TableauBuilder::new(&problem).unwrap();

        assert!(builder.rhs.iter().all(|&b| b >= 0.0));
        assert_eq!(
            builder.relations,
            vec![Relation::Ge, Relation::Le, Relation::Eq, Relation::Le]
        );
        assert_eq!(builder.flipped, vec![true, true, true, false]);
        assert_eq!(&builder.rows[0], &[-1.0, -2.0]);
        assert_eq!(&builder.rows[2], &[-1.0, 1.0]);
        assert_eq!(&builder.rows[3], &[1.0, 0.0]);

        // The caller's problem is untouched
        assert_eq!(problem.rhs, vec![-4.0, -6.0, -1.0, 5.0]);
        assert_eq!(problem.relations[0], Relation::Le);
    }

    #[test]
    fn test_build_all_le() {
        let problem = LpProblem::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Relation::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Relation::Le, 12.0);
        let tableau = TableauBuilder::new(&problem).unwrap().build();

        assert_eq!(tableau.num_rows(), 2);
        assert_eq!(tableau.num_columns(), 4);
        assert_eq!(tableau.cost_row(), &[3.0, 5.0, 0.0, 0.0, 0.0]);
        assert_eq!(tableau.constraint_column(3), vec![0.0, 1.0]);
        assert_eq!(tableau.rhs(), vec![4.0, 12.0]);
        assert!(!tableau.needs_phase_one());

        let basis = tableau.initial_basis().unwrap();
        assert_eq!(basis.basics(), &[2, 3]);
        assert_eq!(basis.nonbasics(), &[0, 1]);
    }

    #[test]
    fn test_build_mixed_needs_phase_one() {
        let tableau = TableauBuilder::new(&mixed_problem()).unwrap().build();
        // Slacks only for the two rows that are <= after normalization
        assert_eq!(tableau.num_columns(), 4);
        let slacks: Vec<_> = tableau.row_info().iter().map(|r| r.slack).collect();
        assert_eq!(slacks, vec![None, Some(2), None, Some(3)]);
        assert!(tableau.needs_phase_one());
        assert!(tableau.initial_basis().is_none());
    }

    #[test]
    fn test_no_constraints() {
        let tableau = TableauBuilder::new(&LpProblem::maximize(vec![1.0]))
            .unwrap()
            .build();
        assert_eq!(tableau.num_rows(), 0);
        assert_eq!(tableau.num_columns(), 1);
        assert_eq!(tableau.initial_basis().unwrap().basics(), &[] as &[usize]);
    }

    #[test]
    fn test_append_and_remove_columns() {
        let problem = LpProblem::maximize(vec![1.0])
            .with_constraint(vec![1.0], Relation::Le, 2.0)
            .with_constraint(vec![2.0], Relation::Eq, 3.0);
        let mut tableau = TableauBuilder::new(&problem).unwrap().build();
        let art = tableau.append_column(&[0.0, 0.0, 1.0]);
        assert_eq!(art, 2);
        tableau.mark_artificial(art);
        tableau.row_info_mut(1).unit = Some(art);
        assert_eq!(tableau.rhs(), vec![2.0, 3.0]);

        let mut basis = tableau.initial_basis().unwrap();
        assert_eq!(basis.basics(), &[1, 2]);
        basis.swap(1, 0);
        assert_eq!(basis.basics(), &[1, 0]);
        assert_eq!(basis.nonbasics(), &[2]);

        let removed = tableau.artificials().to_vec();
        let remap = tableau.remove_columns(&removed);
        basis.remap(&remap);
        assert_eq!(tableau.num_columns(), 2);
        assert!(tableau.artificials().is_empty());
        assert_eq!(tableau.row_info()[1].unit, None);
        assert_eq!(basis.nonbasics(), &[] as &[usize]);
        assert_eq!(tableau.rhs(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_column_remap() {
        let remap = ColumnRemap::removing(&[1, 3], 5);
        assert_eq!(remap.apply(0), Some(0));
        assert_eq!(remap.apply(1), None);
        assert_eq!(remap.apply(2), Some(1));
        assert_eq!(remap.apply(4), Some(2));
        // right-hand side column
        assert_eq!(remap.apply(5), Some(3));
        assert_eq!(remap.retain(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]), vec![0.0, 2.0, 4.0, 5.0]);
    }
}
