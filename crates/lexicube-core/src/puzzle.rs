//! Cube puzzle model and deterministic board generation.
//!
//! A puzzle is a 3x3x3 grid of letter cubes; each cube exposes three
//! playable faces (left, right, top). Board generation is driven by a
//! seeded PCG stream so that a given seed always yields the same board,
//! which keeps reconciliation reproducible under test and keeps retried
//! save-turn payloads identical.

use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Side length of the cube grid.
pub const PUZZLE_SIZE: usize = 3;

/// Letters drawn during generation, weighted by English letter frequency.
/// `Qu` is a single face, as is traditional for cube word games.
const LETTER_WEIGHTS: [(&str, u32); 26] = [
    ("A", 78), ("B", 20), ("C", 40), ("D", 38), ("E", 110), ("F", 14),
    ("G", 30), ("H", 23), ("I", 86), ("J", 2), ("K", 10), ("L", 53),
    ("M", 27), ("N", 72), ("O", 61), ("P", 28), ("Qu", 2), ("R", 73),
    ("S", 87), ("T", 67), ("U", 33), ("V", 10), ("W", 9), ("X", 3),
    ("Y", 16), ("Z", 4),
];

/// One playable face of a cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    /// The letter on the face (`"A"`..`"Z"` or `"Qu"`).
    pub letter: String,

    /// Whether the face has already been used in a played word.
    #[serde(default)]
    pub used: bool,
}

impl Face {
    /// Creates an unused face with the given letter.
    #[must_use]
    pub fn new(letter: impl Into<String>) -> Self {
        Self {
            letter: letter.into(),
            used: false,
        }
    }
}

/// A single cube with its three playable faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cube {
    /// The left-facing face.
    pub left: Face,
    /// The right-facing face.
    pub right: Face,
    /// The top face.
    pub top: Face,
}

/// A full 3x3x3 board of cubes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Puzzle {
    /// Cubes indexed as `[x][y][z]`.
    pub cubes: Vec<Vec<Vec<Cube>>>,
}

impl Puzzle {
    /// Returns the cube at the given coordinates, or `None` if out of range.
    #[must_use]
    pub fn cube(&self, x: usize, y: usize, z: usize) -> Option<&Cube> {
        self.cubes.get(x)?.get(y)?.get(z)
    }

    /// Returns `true` if the board has the expected 3x3x3 shape.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.cubes.len() == PUZZLE_SIZE
            && self
                .cubes
                .iter()
                .all(|plane| plane.len() == PUZZLE_SIZE && plane.iter().all(|row| row.len() == PUZZLE_SIZE))
    }
}

/// Source of fresh puzzle boards.
///
/// Injected into reconciliation so tests can substitute a fixed board;
/// production code uses [`SeededPuzzleGenerator`].
pub trait PuzzleGenerator {
    /// Produces the next board.
    fn generate(&mut self) -> Puzzle;
}

/// Deterministic weighted-letter board generator.
///
/// Backed by a `Pcg64Mcg` stream: a given seed always produces the same
/// sequence of boards.
#[derive(Debug)]
pub struct SeededPuzzleGenerator {
    rng: Pcg64Mcg,
    weights: WeightedIndex<u32>,
}

impl SeededPuzzleGenerator {
    /// Creates a generator from a 64-bit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
            weights: WeightedIndex::new(LETTER_WEIGHTS.iter().map(|(_, w)| *w))
                .expect("letter weight table is non-empty and positive"),
        }
    }

    fn draw_face(&mut self) -> Face {
        let index = self.weights.sample(&mut self.rng);
        Face::new(LETTER_WEIGHTS[index].0)
    }
}

impl PuzzleGenerator for SeededPuzzleGenerator {
    fn generate(&mut self) -> Puzzle {
        let cubes = (0..PUZZLE_SIZE)
            .map(|_| {
                (0..PUZZLE_SIZE)
                    .map(|_| {
                        (0..PUZZLE_SIZE)
                            .map(|_| Cube {
                                left: self.draw_face(),
                                right: self.draw_face(),
                                top: self.draw_face(),
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        Puzzle { cubes }
    }
}

/// Generator that always returns the same board.
///
/// Used as the test substitute for [`SeededPuzzleGenerator`] wherever
/// reconciliation must be reproduced exactly.
#[derive(Debug, Clone)]
pub struct FixedPuzzleGenerator {
    board: Puzzle,
}

impl FixedPuzzleGenerator {
    /// Creates a generator pinned to the given board.
    #[must_use]
    pub const fn new(board: Puzzle) -> Self {
        Self { board }
    }
}

impl PuzzleGenerator for FixedPuzzleGenerator {
    fn generate(&mut self) -> Puzzle {
        self.board.clone()
    }
}
