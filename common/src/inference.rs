//! Neighbour-local mine deduction and risk scoring.
//!
//! Every call to [`analyze`] builds a fresh arena of nodes, one per board
//! position and indexed exactly like the board, so nothing survives from one
//! observation cycle to the next. Deduction is deliberately local:
//!
//! 1. A revealed `0` marks all of its unchecked neighbours safe.
//! 2. A single row-major pass looks for revealed hints whose unchecked
//!    neighbour count equals the hint; those neighbours are mines.
//! 3. Each new mine lowers the effective value of the revealed cells around
//!    it. A cell whose effective value drops to zero vouches for its other
//!    unchecked neighbours.
//!
//! The pass is not repeated until a fixed point is reached. Cells proven safe
//! still count as unchecked when hints are matched, so a hint that would only
//! resolve once those cells are open waits for the next observation cycle.

use crate::board::Board;
use crate::cell::Cell;
use std::collections::BTreeSet;

/// Influence an unchecked cell exerts on each unchecked neighbour, and the
/// bonus a cell receives for every neighbour slot lost to the board edge.
pub const BASE_INFLUENCE: f64 = 1.0;

/// Neighbour slots of an interior cell.
const NEIGHBOR_SLOTS: usize = 8;

/// Per-cycle derived state for one board position.
#[derive(Debug, Clone)]
struct Node {
    /// Hint minus adjacent deduced mines; `None` while the cell is unchecked.
    effective_value: Option<i16>,
    is_deduced_mine: bool,
    adjacent_mines: Vec<usize>,
    adjacent_safe: Vec<usize>,
    score: f64,
    neighbors: Vec<usize>,
}

/// Scoring information for a cell that may be clicked as a guess.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub cell: Cell,
    pub score: f64,
}

/// What one observation cycle concluded about a board.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    width: usize,
    /// Cells proven free of mines, row-major, without duplicates.
    pub safe: Vec<Cell>,
    /// Cells concluded to hold a mine, row-major.
    pub mines: Vec<Cell>,
    /// Unchecked cells that are not deduced mines, row-major, with their risk.
    pub candidates: Vec<Candidate>,
    scores: Vec<f64>,
}

/// The single recommendation carried by an [`Analysis`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// At least one square is proven safe.
    Safe(Vec<Cell>),
    /// Nothing is proven safe; this is the least risky square.
    Guess(Cell),
    /// No unchecked square is left that is not a known mine.
    NoMoves,
}

impl Analysis {
    /// Accumulated risk at a grid position; lower is safer.
    pub fn score_at(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// The candidate with the strictly lowest score; the first one in scan
    /// order wins a tie.
    pub fn best_guess(&self) -> Option<Cell> {
        self.best_guess_where(|_| true)
    }

    /// Like [`Analysis::best_guess`], restricted to candidates accepted by `keep`.
    pub fn best_guess_where(&self, mut keep: impl FnMut(&Cell) -> bool) -> Option<Cell> {
        let mut best: Option<&Candidate> = None;
        for candidate in self.candidates.iter().filter(|c| keep(&c.cell)) {
            if best.is_none_or(|b| candidate.score < b.score) {
                best = Some(candidate);
            }
        }
        best.map(|candidate| candidate.cell)
    }

    pub fn verdict(&self) -> Verdict {
        if !self.safe.is_empty() {
            Verdict::Safe(self.safe.clone())
        } else if let Some(cell) = self.best_guess() {
            Verdict::Guess(cell)
        } else {
            Verdict::NoMoves
        }
    }
}

/// Runs one full inference cycle over a board snapshot.
pub fn analyze(board: &Board) -> Analysis {
    let mut field = Field::build(board);
    field.settle_zeros();
    field.resolve_hints();
    field.update_scores();
    let analysis = field.into_analysis();

    tracing::trace!(
        safe = analysis.safe.len(),
        mines = analysis.mines.len(),
        candidates = analysis.candidates.len(),
        "inference cycle complete"
    );
    analysis
}

/// The node arena for one cycle.
struct Field<'a> {
    board: &'a Board,
    nodes: Vec<Node>,
}

impl<'a> Field<'a> {
    fn build(board: &'a Board) -> Self {
        let nodes = board
            .cells()
            .iter()
            .enumerate()
            .map(|(index, cell)| Node {
                effective_value: cell.value().map(i16::from),
                is_deduced_mine: false,
                adjacent_mines: Vec::new(),
                adjacent_safe: Vec::new(),
                score: 0.0,
                neighbors: board.neighbors(index).collect(),
            })
            .collect();
        Field { board, nodes }
    }

    fn is_unchecked(&self, index: usize) -> bool {
        self.board.cells()[index].is_unchecked()
    }

    fn unchecked_neighbors(&self, index: usize) -> Vec<usize> {
        self.nodes[index]
            .neighbors
            .iter()
            .copied()
            .filter(|&n| self.is_unchecked(n))
            .collect()
    }

    /// A revealed zero has no mine around it at all.
    fn settle_zeros(&mut self) {
        for index in 0..self.nodes.len() {
            if self.board.cells()[index].value() == Some(0) {
                self.collect_safe(index);
            }
        }
    }

    /// One row-major pass over every hint that is exactly matched by its
    /// unchecked neighbours.
    fn resolve_hints(&mut self) {
        for index in 0..self.nodes.len() {
            let Some(value) = self.board.cells()[index].value() else {
                continue;
            };
            if value == 0 {
                continue;
            }

            let unchecked = self.unchecked_neighbors(index);
            if unchecked.len() != value as usize {
                continue;
            }
            for mine in unchecked {
                if !self.nodes[mine].is_deduced_mine {
                    self.mark_mine(mine);
                }
            }
        }
    }

    fn mark_mine(&mut self, mine: usize) {
        self.nodes[mine].is_deduced_mine = true;

        let neighbors = self.nodes[mine].neighbors.clone();
        for neighbor in neighbors {
            let node = &mut self.nodes[neighbor];
            node.adjacent_mines.push(mine);

            let Some(effective) = node.effective_value.as_mut() else {
                continue;
            };
            *effective -= 1;
            if *effective == 0 {
                self.collect_safe(neighbor);
            }
        }
    }

    /// Records every unchecked neighbour of `index` that is not a known mine
    /// as safe. Only valid once `index` has no undiscovered mine left.
    fn collect_safe(&mut self, index: usize) {
        let safe: Vec<usize> = self
            .unchecked_neighbors(index)
            .into_iter()
            .filter(|n| !self.nodes[index].adjacent_mines.contains(n))
            .collect();
        self.nodes[index].adjacent_safe.extend(safe);
    }

    fn update_scores(&mut self) {
        for index in 0..self.nodes.len() {
            let unchecked = self.unchecked_neighbors(index);

            let influence = match self.nodes[index].effective_value {
                None => BASE_INFLUENCE,
                Some(effective) if effective > 0 && !unchecked.is_empty() => {
                    f64::from(effective) / unchecked.len() as f64
                }
                Some(_) => 0.0,
            };
            for neighbor in unchecked {
                self.nodes[neighbor].score += influence;
            }

            // Stand-in for the influence of neighbours that are off the board.
            let missing = NEIGHBOR_SLOTS - self.nodes[index].neighbors.len();
            self.nodes[index].score += missing as f64 * BASE_INFLUENCE;
        }
    }

    fn into_analysis(self) -> Analysis {
        let cells = self.board.cells();

        let safe_indices: BTreeSet<usize> = self
            .nodes
            .iter()
            .flat_map(|node| node.adjacent_safe.iter().copied())
            .filter(|&index| !self.nodes[index].is_deduced_mine)
            .collect();

        let mines = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_deduced_mine)
            .map(|(index, _)| cells[index])
            .collect();

        let candidates = self
            .nodes
            .iter()
            .enumerate()
            .filter(|&(index, node)| cells[index].is_unchecked() && !node.is_deduced_mine)
            .map(|(index, node)| Candidate {
                cell: cells[index],
                score: node.score,
            })
            .collect();

        Analysis {
            width: self.board.width(),
            safe: safe_indices.into_iter().map(|index| cells[index]).collect(),
            mines,
            candidates,
            scores: self.nodes.iter().map(|node| node.score).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Point;

    fn board(text: &str) -> Board {
        text.parse().unwrap()
    }

    fn anchors(cells: &[Cell]) -> Vec<Point> {
        cells.iter().map(|cell| cell.anchor).collect()
    }

    fn p(x: usize, y: usize) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_single_unchecked_neighbor_is_mine() {
        // A revealed 1 with exactly one unchecked neighbour pins the mine there
        let analysis = analyze(&board("# 1 1\n1 1 1\n1 1 1"));
        assert_eq!(anchors(&analysis.mines), vec![p(0, 0)]);
        assert!(analysis.safe.is_empty());
        assert_eq!(analysis.verdict(), Verdict::NoMoves);
    }

    #[test]
    fn test_zero_marks_all_neighbors_safe() {
        let analysis = analyze(&board("###\n#0#\n###"));
        assert_eq!(analysis.safe.len(), 8);
        assert!(analysis.mines.is_empty());
        assert!(!anchors(&analysis.safe).contains(&p(1, 1)));
        assert!(matches!(analysis.verdict(), Verdict::Safe(cells) if cells.len() == 8));
    }

    #[test]
    fn test_resolved_hint_marks_exactly_its_neighbors() {
        // The 2 at (1,0) sees exactly two unchecked cells; the far column is
        // not its neighbour and must stay undecided
        let analysis = analyze(&board("# 2 # #\n1 2 1 #"));
        assert_eq!(anchors(&analysis.mines), vec![p(0, 0), p(2, 0)]);

        // The 1 at (2,1) is satisfied by the mine at (2,0), which frees the
        // far column.
        assert_eq!(anchors(&analysis.safe), vec![p(3, 0), p(3, 1)]);
    }

    #[test]
    fn test_effective_zero_frees_remaining_neighbors() {
        // The 1 at (0,1) pins (0,0). The 1s at (1,0) and (1,1) then have
        // effective value zero, so their other unchecked neighbours are safe.
        let analysis = analyze(&board("# 1 #\n1 1 #\n0 0 #"));
        assert_eq!(anchors(&analysis.mines), vec![p(0, 0)]);
        assert_eq!(anchors(&analysis.safe), vec![p(2, 0), p(2, 1), p(2, 2)]);

        // (2,0) only hears from its unchecked neighbour (2,1), plus the
        // corner bonus.
        assert_eq!(analysis.score_at(2, 0), Some(1.0 + 5.0));
    }

    #[test]
    fn test_mine_reduces_neighbors_once() {
        // Every 1 resolves the same centre mine; each is reduced exactly once
        // and none of them vouches for anything else.
        let analysis = analyze(&board("1 1 1\n1 # 1\n1 1 1"));
        assert_eq!(anchors(&analysis.mines), vec![p(1, 1)]);
        assert!(analysis.safe.is_empty());
        assert_eq!(analysis.score_at(1, 1), Some(0.0));
    }

    #[test]
    fn test_safe_set_excludes_deduced_mines() {
        // Contradictory hints: (1,2) is satisfied by (0,1) and vouches for
        // (2,1), which the 1 at (2,2) later pins as a mine.
        let analysis = analyze(&board("# # #\n# 2 #\n1 1 1"));
        assert_eq!(anchors(&analysis.mines), vec![p(0, 1), p(2, 1)]);
        assert_eq!(anchors(&analysis.safe), vec![p(0, 0), p(1, 0), p(2, 0)]);
    }

    #[test]
    fn test_safe_cells_do_not_feed_back_within_a_cycle() {
        // (3,1) sees four unchecked cells, three of which are proven safe in
        // this same cycle. Only the next snapshot pins (3,0).
        let first = analyze(&board("# 1 # #\n1 1 # 1\n0 0 # 0"));
        assert_eq!(anchors(&first.mines), vec![p(0, 0)]);
        assert_eq!(anchors(&first.safe), vec![p(2, 0), p(2, 1), p(2, 2)]);
        assert!(first.candidates.iter().any(|c| c.cell.anchor == p(3, 0)));

        let second = analyze(&board("# 1 1 #\n1 1 1 1\n0 0 0 0"));
        assert_eq!(anchors(&second.mines), vec![p(0, 0), p(3, 0)]);
        assert!(second.safe.is_empty());
        assert_eq!(second.verdict(), Verdict::NoMoves);
    }

    #[test]
    fn test_scores_follow_effective_values() {
        // Centre 1 with all neighbours unchecked spreads 1/8 to each of them.
        let analysis = analyze(&board("###\n#1#\n###"));
        assert!(analysis.mines.is_empty());
        assert!(analysis.safe.is_empty());

        // Corner (0,0): 1/8 from the centre, 1 each from (1,0) and (0,1),
        // plus 5 for the missing slots.
        let corner = analysis.score_at(0, 0).unwrap();
        assert!((corner - (0.125 + 2.0 + 5.0)).abs() < 1e-9);

        // Edge (1,0): 1/8 from the centre, 1 each from (0,0), (2,0), (0,1),
        // (2,1), plus 3 for the missing slots.
        let edge = analysis.score_at(1, 0).unwrap();
        assert!((edge - (0.125 + 4.0 + 3.0)).abs() < 1e-9);

        // The revealed centre has all eight slots on the board and only
        // unchecked cells receive influence, so it stays at zero.
        assert_eq!(analysis.score_at(1, 1), Some(0.0));
        assert_eq!(analysis.candidates.len(), 8);
    }

    #[test]
    fn test_corner_bonus_is_exact() {
        let corner = analyze(&board("# 0 0\n0 0 0\n0 0 0"));
        let center = analyze(&board("0 0 0\n0 # 0\n0 0 0"));

        let corner_score = corner.score_at(0, 0).unwrap();
        let center_score = center.score_at(1, 1).unwrap();
        assert!((corner_score - center_score - 5.0 * BASE_INFLUENCE).abs() < 1e-9);

        let edge = analyze(&board("0 # 0\n0 0 0\n0 0 0"));
        let edge_score = edge.score_at(1, 0).unwrap();
        assert!((edge_score - center_score - 3.0 * BASE_INFLUENCE).abs() < 1e-9);
    }

    #[test]
    fn test_best_guess_ties_and_filters() {
        // Every unchecked cell scores 7.125 here; scan order breaks the tie.
        let analysis = analyze(&board("###\n#1#\n###"));
        let first = analysis.best_guess().unwrap();
        assert_eq!(first.anchor, p(0, 0));

        let second = analysis
            .best_guess_where(|cell| cell.anchor != first.anchor)
            .unwrap();
        assert_eq!(second.anchor, p(1, 0));
        assert_eq!(analysis.best_guess_where(|_| false), None);

        // Mines are never offered as guesses.
        let analysis = analyze(&board("# 1\n1 1"));
        assert_eq!(analysis.best_guess(), None);
        assert_eq!(anchors(&analysis.mines), vec![p(0, 0)]);
    }

    #[test]
    fn test_lowest_score_wins() {
        // Whatever wins, no other candidate may score lower.
        let analysis = analyze(&board("# # 0\n3 # 1\n# # 1"));
        let best = analysis.best_guess().unwrap();
        let best_score = analysis.score_at(best.anchor.x, best.anchor.y).unwrap();
        assert!(
            analysis
                .candidates
                .iter()
                .all(|candidate| candidate.score >= best_score)
        );
        assert_eq!(analysis.verdict(), Verdict::Safe(analysis.safe.clone()));
    }

    #[test]
    fn test_fully_revealed_board_has_no_moves() {
        let analysis = analyze(&board("0 0\n0 0"));
        assert!(analysis.safe.is_empty());
        assert!(analysis.candidates.is_empty());
        assert_eq!(analysis.verdict(), Verdict::NoMoves);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let snapshot = board("# # # #\n1 2 # #\n0 1 # #\n0 1 1 #");
        let first = analyze(&snapshot);
        let second = analyze(&snapshot);
        assert_eq!(first.safe, second.safe);
        assert_eq!(first.best_guess(), second.best_guess());
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_cell_board() {
        let analysis = analyze(&board("#"));
        // Eight missing neighbour slots.
        assert_eq!(analysis.score_at(0, 0), Some(8.0));
        assert_eq!(analysis.best_guess().map(|c| c.anchor), Some(p(0, 0)));
        assert_eq!(analysis.score_at(1, 0), None);
    }
}
