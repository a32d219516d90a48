//! Incremental document accumulator driven by the stage machine.
//!
//! Headings append a new element to the current round; clues go to the
//! most recently opened element. Wall groups are stored flat in file
//! order and mapped onto walls as group `i` → wall `i / GROUPS_PER_WALL`,
//! slot `i % GROUPS_PER_WALL`; that mapping lives only in
//! [`DocumentBuilder::open_wall_group`] and [`DocumentBuilder::current_group`].

use crate::model::{
    Clue, Document, Puzzle, Round, VowelCategory, VowelEntry, WallGroup, WallPuzzle,
    GROUPS_PER_WALL,
};

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: Document,
    wall_groups: usize,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_life_token(&self) -> bool {
        self.doc.meta.wall_life_token.is_some()
    }

    pub fn set_life_token(&mut self, clue: Clue) {
        self.doc.meta.wall_life_token = Some(clue);
    }

    /// Open a new puzzle, group, or vowel category titled `title`.
    /// Returns `false` for rounds that hold no elements.
    #[must_use]
    pub fn open(&mut self, round: Round, title: String) -> bool {
        match round {
            Round::Connections | Round::Sequences => {
                if let Some(puzzles) = self.puzzles_mut(round) {
                    puzzles.push(Puzzle {
                        solution: title,
                        clues: Vec::new(),
                    });
                }
                true
            }
            Round::Walls => {
                self.open_wall_group(title);
                true
            }
            Round::Vowels => {
                self.doc.vowels.push(VowelCategory {
                    description: title,
                    entries: Vec::new(),
                });
                true
            }
            Round::Start => false,
        }
    }

    fn open_wall_group(&mut self, solution: String) {
        if self.wall_groups % GROUPS_PER_WALL == 0 {
            self.doc.walls.push(WallPuzzle::default());
        }
        self.wall_groups += 1;
        if let Some(wall) = self.current_wall_puzzle() {
            wall.groups.push(WallGroup {
                solution,
                clues: Vec::new(),
            });
        }
    }

    fn puzzles_mut(&mut self, round: Round) -> Option<&mut Vec<Puzzle>> {
        match round {
            Round::Connections => Some(&mut self.doc.connections),
            Round::Sequences => Some(&mut self.doc.sequences),
            _ => None,
        }
    }

    /// The open connections or sequences puzzle.
    pub fn current_puzzle(&mut self, round: Round) -> Option<&mut Puzzle> {
        self.puzzles_mut(round)?.last_mut()
    }

    /// The wall holding the most recently opened group.
    pub fn current_wall_puzzle(&mut self) -> Option<&mut WallPuzzle> {
        let index = self.wall_groups.checked_sub(1)? / GROUPS_PER_WALL;
        self.doc.walls.get_mut(index)
    }

    /// The most recently opened wall group.
    pub fn current_group(&mut self) -> Option<&mut WallGroup> {
        let slot = self.wall_groups.checked_sub(1)? % GROUPS_PER_WALL;
        self.current_wall_puzzle()?.groups.get_mut(slot)
    }

    pub fn current_vowel_category(&mut self) -> Option<&mut VowelCategory> {
        self.doc.vowels.last_mut()
    }

    /// Append a clue to the open element of `round`. Returns `false` if
    /// no element is open.
    #[must_use]
    pub fn push_clue(&mut self, round: Round, clue: Clue) -> bool {
        let target = match round {
            Round::Connections | Round::Sequences => {
                self.current_puzzle(round).map(|p| &mut p.clues)
            }
            Round::Walls => self.current_group().map(|g| &mut g.clues),
            _ => None,
        };
        match target {
            Some(clues) => {
                clues.push(clue);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn push_vowel_entry(&mut self, entry: VowelEntry) -> bool {
        match self.current_vowel_category() {
            Some(cat) => {
                cat.entries.push(entry);
                true
            }
            None => false,
        }
    }

    pub fn finish(self) -> Document {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_groups_split_four_and_four() {
        let mut b = DocumentBuilder::new();
        for i in 0..8 {
            assert!(b.open(Round::Walls, format!("g{}", i)));
            assert!(b.push_clue(Round::Walls, Clue::Text(format!("c{}", i))));
        }
        let doc = b.finish();
        assert_eq!(doc.walls.len(), 2);
        assert_eq!(doc.walls[0].groups.len(), 4);
        assert_eq!(doc.walls[1].groups.len(), 4);
        assert_eq!(doc.walls[1].groups[0].solution, "g4");
        assert_eq!(doc.walls[1].groups[3].clues, vec![Clue::Text("c7".into())]);
    }

    #[test]
    fn clues_go_to_latest_puzzle_of_their_round() {
        let mut b = DocumentBuilder::new();
        assert!(b.open(Round::Connections, "first".into()));
        assert!(b.open(Round::Connections, "second".into()));
        assert!(b.push_clue(Round::Connections, Clue::Text("x".into())));
        let doc = b.finish();
        assert!(doc.connections[0].clues.is_empty());
        assert_eq!(doc.connections[1].clues.len(), 1);
        assert!(doc.sequences.is_empty());
    }

    #[test]
    fn push_without_open_element_is_refused() {
        let mut b = DocumentBuilder::new();
        assert!(!b.push_clue(Round::Walls, Clue::Text("x".into())));
        assert!(!b.push_vowel_entry(VowelEntry::SolutionOnly {
            solution: "X".into()
        }));
        assert!(!b.open(Round::Start, "nope".into()));
    }
}
