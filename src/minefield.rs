use rand::Rng;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoundState {
    Untouched,
    Uncovered,
    Flagged,
}

#[derive(Debug, Clone)]
struct Mound {
    mined: bool,
    adjacent_mines: u8,
    state: MoundState,
}

/// A rectangular grid of mounds, some of which hide a mine. Coordinates
/// are (x, y) with x running along the width.
pub struct Minefield {
    width: usize,
    height: usize,
    mine_count: usize,
    mounds: Vec<Mound>,
}

impl Minefield {
    /// Places `mine_count` mines uniformly without duplicates. The count
    /// is clamped to the number of mounds.
    pub fn new(width: usize, height: usize, mine_count: usize, rng: &mut impl Rng) -> Self {
        let mut field = Self {
            width,
            height,
            mine_count: mine_count.min(width * height),
            mounds: Vec::new(),
        };
        field.reset(rng);
        field
    }

    /// Re-buries everything and deals a fresh set of mines.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.mounds = vec![
            Mound {
                mined: false,
                adjacent_mines: 0,
                state: MoundState::Untouched,
            };
            self.width * self.height
        ];

        let mut remaining = self.mine_count;
        while remaining > 0 {
            let choice = rng.gen_range(0..self.mounds.len());
            if !self.mounds[choice].mined {
                self.mounds[choice].mined = true;
                remaining -= 1;
            }
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let count = self
                    .neighbours(x, y)
                    .filter(|&(nx, ny)| self.mounds[self.index(nx, ny)].mined)
                    .count();
                let index = self.index(x, y);
                self.mounds[index].adjacent_mines = count as u8;
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn state(&self, x: usize, y: usize) -> MoundState {
        self.mounds[self.index(x, y)].state
    }

    pub fn is_mined(&self, x: usize, y: usize) -> bool {
        self.mounds[self.index(x, y)].mined
    }

    pub fn adjacent_mines(&self, x: usize, y: usize) -> u8 {
        self.mounds[self.index(x, y)].adjacent_mines
    }

    /// Uncovers a mound, flooding outward through the connected region of
    /// zero-adjacency mounds and their bordering numbered mounds. Returns
    /// whether a mine was hit. Flagged and already-uncovered mounds are
    /// left alone.
    pub fn uncover(&mut self, x: usize, y: usize) -> bool {
        let index = self.index(x, y);
        if self.mounds[index].state != MoundState::Untouched {
            return false;
        }

        self.mounds[index].state = MoundState::Uncovered;
        if self.mounds[index].mined {
            return true;
        }

        if self.mounds[index].adjacent_mines == 0 {
            self.flood_uncover(x, y);
        }
        false
    }

    fn flood_uncover(&mut self, x: usize, y: usize) {
        let mut frontier = VecDeque::new();
        frontier.push_back((x, y));

        while let Some((cx, cy)) = frontier.pop_front() {
            let neighbours: Vec<_> = self.neighbours(cx, cy).collect();
            for (nx, ny) in neighbours {
                let index = self.index(nx, ny);
                if self.mounds[index].state != MoundState::Untouched {
                    continue;
                }
                self.mounds[index].state = MoundState::Uncovered;
                if self.mounds[index].adjacent_mines == 0 {
                    frontier.push_back((nx, ny));
                }
            }
        }
    }

    /// Flags an untouched mound or unflags a flagged one. Uncovered
    /// mounds cannot be flagged.
    pub fn toggle_flag(&mut self, x: usize, y: usize) {
        let index = self.index(x, y);
        self.mounds[index].state = match self.mounds[index].state {
            MoundState::Untouched => MoundState::Flagged,
            MoundState::Flagged => MoundState::Untouched,
            MoundState::Uncovered => MoundState::Uncovered,
        };
    }

    /// True once every mound without a mine has been uncovered.
    pub fn is_cleared(&self) -> bool {
        self.mounds
            .iter()
            .all(|mound| mound.mined || mound.state == MoundState::Uncovered)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    fn neighbours(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (width, height) = (self.width as isize, self.height as isize);
        let (x, y) = (x as isize, y as isize);
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    return None;
                }
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    return None;
                }
                Some((nx as usize, ny as usize))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Minefield, MoundState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn mined_positions(field: &Minefield) -> Vec<(usize, usize)> {
        let mut mines = Vec::new();
        for y in 0..field.height() {
            for x in 0..field.width() {
                if field.is_mined(x, y) {
                    mines.push((x, y));
                }
            }
        }
        mines
    }

    #[test]
    fn deals_the_requested_number_of_mines() {
        let field = Minefield::new(8, 8, 10, &mut rng());
        assert_eq!(mined_positions(&field).len(), 10);
    }

    #[test]
    fn mine_count_is_clamped_to_the_grid() {
        let field = Minefield::new(2, 2, 100, &mut rng());
        assert_eq!(mined_positions(&field).len(), 4);
    }

    #[test]
    fn adjacency_counts_the_eight_neighbours() {
        let mut field = Minefield::new(3, 3, 0, &mut rng());
        // Hand-place a mine in the center to make counts deterministic.
        field.mounds[4].mined = true;
        for y in 0..3 {
            for x in 0..3 {
                let count = field
                    .neighbours(x, y)
                    .filter(|&(nx, ny)| field.is_mined(nx, ny))
                    .count();
                if (x, y) == (1, 1) {
                    assert_eq!(count, 0);
                } else {
                    assert_eq!(count, 1);
                }
            }
        }
    }

    #[test]
    fn uncovering_a_mine_reports_the_hit() {
        let mut field = Minefield::new(3, 3, 0, &mut rng());
        field.mounds[0].mined = true;
        assert!(field.uncover(0, 0));
        assert_eq!(field.state(0, 0), MoundState::Uncovered);
    }

    #[test]
    fn zero_region_floods_to_its_numbered_border() {
        let mut field = Minefield::new(5, 1, 0, &mut rng());
        field.mounds[4].mined = true;
        field.mounds[3].adjacent_mines = 1;

        assert!(!field.uncover(0, 0));
        for x in 0..4 {
            assert_eq!(field.state(x, 0), MoundState::Uncovered);
        }
        // The mine itself stays buried.
        assert_eq!(field.state(4, 0), MoundState::Untouched);
    }

    #[test]
    fn flood_does_not_pass_through_flags() {
        let mut field = Minefield::new(5, 1, 0, &mut rng());
        field.toggle_flag(2, 0);
        field.uncover(0, 0);
        assert_eq!(field.state(2, 0), MoundState::Flagged);
    }

    #[test]
    fn flags_toggle_and_block_uncovering() {
        let mut field = Minefield::new(2, 2, 0, &mut rng());
        field.toggle_flag(0, 0);
        assert_eq!(field.state(0, 0), MoundState::Flagged);
        assert!(!field.uncover(0, 0));
        assert_eq!(field.state(0, 0), MoundState::Flagged);
        field.toggle_flag(0, 0);
        assert_eq!(field.state(0, 0), MoundState::Untouched);
    }

    #[test]
    fn cleared_once_every_safe_mound_is_open() {
        let mut field = Minefield::new(2, 1, 0, &mut rng());
        field.mounds[1].mined = true;
        field.mounds[0].adjacent_mines = 1;
        assert!(!field.is_cleared());
        field.uncover(0, 0);
        assert!(field.is_cleared());
    }

    #[test]
    fn reset_buries_everything_again() {
        let mut rng = rng();
        let mut field = Minefield::new(4, 4, 3, &mut rng);
        field.uncover(0, 0);
        field.reset(&mut rng);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(field.state(x, y), MoundState::Untouched);
            }
        }
        assert_eq!(mined_positions(&field).len(), 3);
    }
}
