//! Scramble generation.
//!
//! The 3x3 generator is the only puzzle-accurate one. Every other puzzle
//! gets a stand-in sequence tagged [`Fidelity::Approximate`] so callers can
//! tell the two apart.
//!
//! Generators take the random source as an argument; tests pass a seeded
//! [`rand::rngs::StdRng`].

use std::fmt;
use std::str::FromStr;

use cubetime_types::PuzzleType;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Moves in a default 3x3 scramble.
pub const DEFAULT_SCRAMBLE_LENGTH: usize = 20;

/// Errors from parsing scramble notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrambleError {
    /// A token is not a face letter with an optional `'` or `2`.
    #[error("invalid move: {0:?}")]
    InvalidMove(String),
}

/// Rotation axis shared by two opposite faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// R / L
    X,
    /// U / D
    Y,
    /// F / B
    Z,
}

/// One of the six outer faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Right
    R,
    /// Left
    L,
    /// Up
    U,
    /// Down
    D,
    /// Front
    F,
    /// Back
    B,
}

impl Face {
    /// All faces.
    pub const ALL: [Face; 6] = [Face::R, Face::L, Face::U, Face::D, Face::F, Face::B];

    /// Axis this face turns about.
    pub fn axis(self) -> Axis {
        match self {
            Face::R | Face::L => Axis::X,
            Face::U | Face::D => Axis::Y,
            Face::F | Face::B => Axis::Z,
        }
    }

    /// Notation letter.
    pub fn letter(self) -> char {
        match self {
            Face::R => 'R',
            Face::L => 'L',
            Face::U => 'U',
            Face::D => 'D',
            Face::F => 'F',
            Face::B => 'B',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        Face::ALL.into_iter().find(|f| f.letter() == c)
    }
}

/// Turn amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Quarter turn clockwise
    None,
    /// Quarter turn counter-clockwise (`'`)
    Prime,
    /// Half turn (`2`)
    Double,
}

impl Modifier {
    /// All modifiers.
    pub const ALL: [Modifier; 3] = [Modifier::None, Modifier::Prime, Modifier::Double];

    /// Notation suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Prime => "'",
            Modifier::Double => "2",
        }
    }
}

/// A face turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Face turned
    pub face: Face,
    /// Turn amount
    pub modifier: Modifier,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face.letter(), self.modifier.suffix())
    }
}

impl FromStr for Move {
    type Err = ScrambleError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || ScrambleError::InvalidMove(token.to_string());
        let mut chars = token.chars();
        let face = chars.next().and_then(Face::from_letter).ok_or_else(invalid)?;
        let modifier = match chars.as_str() {
            "" => Modifier::None,
            "'" => Modifier::Prime,
            "2" => Modifier::Double,
            _ => return Err(invalid()),
        };
        Ok(Move { face, modifier })
    }
}

/// A sequence of face turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scramble {
    moves: Vec<Move>,
}

impl Scramble {
    /// Wrap a move list.
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves }
    }

    /// Parse whitespace-separated 3x3 notation. Empty input is an empty
    /// scramble.
    pub fn parse(text: &str) -> Result<Self, ScrambleError> {
        let moves = text
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<Move>, _>>()?;
        Ok(Self { moves })
    }

    /// The moves in order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether there are no moves.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl fmt::Display for Scramble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", mv)?;
        }
        Ok(())
    }
}

impl FromStr for Scramble {
    type Err = ScrambleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether a scramble is a real puzzle scramble or a stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Follows the puzzle's scrambling rules.
    Accurate,
    /// Structurally plausible placeholder; not a valid puzzle scramble.
    Approximate,
}

/// A scramble generated for a specific puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleScramble {
    /// Puzzle it was generated for
    pub puzzle: PuzzleType,
    /// Notation text
    pub text: String,
    /// Accurate or placeholder
    pub fidelity: Fidelity,
}

/// Generate a 3x3 scramble of `length` moves.
///
/// At each position the face is drawn uniformly from the faces that are
/// still allowed: never the previous face, and never the axis shared by the
/// previous two moves.
pub fn generate_3x3<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Scramble {
    let mut moves: Vec<Move> = Vec::with_capacity(length);

    for _ in 0..length {
        let previous = moves.last().map(|m| m.face);
        let blocked_axis = match moves.as_slice() {
            [.., a, b] if a.face.axis() == b.face.axis() => Some(b.face.axis()),
            _ => None,
        };

        let candidates: Vec<Face> = Face::ALL
            .into_iter()
            .filter(|f| Some(*f) != previous)
            .filter(|f| Some(f.axis()) != blocked_axis)
            .collect();

        // At most one axis is blocked, so four faces always remain.
        let Some(&face) = candidates.choose(rng) else {
            break;
        };
        moves.push(Move {
            face,
            modifier: random_modifier(rng),
        });
    }

    Scramble::new(moves)
}

/// Generate a scramble for any supported puzzle.
pub fn generate_for<R: Rng + ?Sized>(puzzle: PuzzleType, rng: &mut R) -> PuzzleScramble {
    let (scramble, fidelity) = if puzzle.scrambles_as_3x3() {
        (
            generate_3x3(rng, DEFAULT_SCRAMBLE_LENGTH),
            Fidelity::Accurate,
        )
    } else if puzzle == PuzzleType::TwoByTwo {
        (
            generate_no_repeat(rng, 9, &[Face::R, Face::U, Face::F]),
            Fidelity::Approximate,
        )
    } else {
        (
            generate_unconstrained(rng, placeholder_length(puzzle)),
            Fidelity::Approximate,
        )
    };

    PuzzleScramble {
        puzzle,
        text: scramble.to_string(),
        fidelity,
    }
}

fn placeholder_length(puzzle: PuzzleType) -> usize {
    match puzzle {
        PuzzleType::FourByFour => 40,
        PuzzleType::FiveByFive => 50,
        PuzzleType::SixBySix => 60,
        PuzzleType::SevenBySeven => 70,
        PuzzleType::Pyraminx => 15,
        PuzzleType::Megaminx => 70,
        PuzzleType::Skewb => 10,
        PuzzleType::Clock => 12,
        PuzzleType::Square1 => 15,
        PuzzleType::TwoByTwo => 9,
        PuzzleType::ThreeByThree | PuzzleType::OneHanded | PuzzleType::Blindfolded => {
            DEFAULT_SCRAMBLE_LENGTH
        }
    }
}

fn random_modifier<R: Rng + ?Sized>(rng: &mut R) -> Modifier {
    Modifier::ALL[rng.gen_range(0..Modifier::ALL.len())]
}

fn generate_no_repeat<R: Rng + ?Sized>(rng: &mut R, length: usize, faces: &[Face]) -> Scramble {
    let mut moves: Vec<Move> = Vec::with_capacity(length);
    for _ in 0..length {
        let previous = moves.last().map(|m| m.face);
        let candidates: Vec<Face> = faces
            .iter()
            .copied()
            .filter(|f| Some(*f) != previous)
            .collect();
        let Some(&face) = candidates.choose(rng) else {
            break;
        };
        moves.push(Move {
            face,
            modifier: random_modifier(rng),
        });
    }
    Scramble::new(moves)
}

fn generate_unconstrained<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Scramble {
    let moves = (0..length)
        .map(|_| Move {
            face: Face::ALL[rng.gen_range(0..Face::ALL.len())],
            modifier: random_modifier(rng),
        })
        .collect();
    Scramble::new(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn default_length_is_twenty() {
        let scramble = generate_3x3(&mut rng(1), DEFAULT_SCRAMBLE_LENGTH);
        assert_eq!(scramble.len(), 20);
        assert_eq!(scramble.to_string().split(' ').count(), 20);
    }

    #[test]
    fn zero_length_is_empty() {
        assert!(generate_3x3(&mut rng(1), 0).is_empty());
    }

    #[test]
    fn no_consecutive_faces_and_no_triple_axis() {
        for seed in 0..500 {
            let scramble = generate_3x3(&mut rng(seed), 25);
            let moves = scramble.moves();
            for pair in moves.windows(2) {
                assert_ne!(pair[0].face, pair[1].face, "seed {}: {}", seed, scramble);
            }
            for triple in moves.windows(3) {
                let same_axis = triple[0].face.axis() == triple[1].face.axis()
                    && triple[1].face.axis() == triple[2].face.axis();
                assert!(!same_axis, "seed {}: {}", seed, scramble);
            }
        }
    }

    #[test]
    fn same_seed_same_scramble() {
        let a = generate_3x3(&mut rng(42), 20);
        let b = generate_3x3(&mut rng(42), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn every_face_and_modifier_appears() {
        let mut r = rng(7);
        let mut faces = std::collections::HashSet::new();
        let mut modifiers = std::collections::HashSet::new();
        for _ in 0..50 {
            for mv in generate_3x3(&mut r, 20).moves() {
                faces.insert(mv.face);
                modifiers.insert(mv.modifier);
            }
        }
        assert_eq!(faces.len(), 6);
        assert_eq!(modifiers.len(), 3);
    }

    #[test]
    fn parse_reads_generated_text() {
        let scramble = generate_3x3(&mut rng(3), 20);
        let parsed = Scramble::parse(&scramble.to_string()).unwrap();
        assert_eq!(parsed, scramble);
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert_eq!(
            Scramble::parse("R U Rw"),
            Err(ScrambleError::InvalidMove("Rw".into()))
        );
        assert!(Scramble::parse("R3").is_err());
        assert!(Scramble::parse("x").is_err());
    }

    #[test]
    fn parse_tolerates_extra_whitespace() {
        let parsed = Scramble::parse("  R  U'   F2 ").unwrap();
        assert_eq!(parsed.to_string(), "R U' F2");
    }

    #[test]
    fn three_by_three_variants_are_accurate() {
        for puzzle in [
            PuzzleType::ThreeByThree,
            PuzzleType::OneHanded,
            PuzzleType::Blindfolded,
        ] {
            let generated = generate_for(puzzle, &mut rng(9));
            assert_eq!(generated.fidelity, Fidelity::Accurate);
            assert_eq!(generated.puzzle, puzzle);
            assert_eq!(Scramble::parse(&generated.text).unwrap().len(), 20);
        }
    }

    #[test]
    fn two_by_two_uses_r_u_f_without_repeats() {
        for seed in 0..100 {
            let generated = generate_for(PuzzleType::TwoByTwo, &mut rng(seed));
            assert_eq!(generated.fidelity, Fidelity::Approximate);
            let scramble = Scramble::parse(&generated.text).unwrap();
            assert_eq!(scramble.len(), 9);
            assert!(scramble
                .moves()
                .iter()
                .all(|m| matches!(m.face, Face::R | Face::U | Face::F)));
            for pair in scramble.moves().windows(2) {
                assert_ne!(pair[0].face, pair[1].face);
            }
        }
    }

    #[test]
    fn placeholders_have_fixed_lengths() {
        let expected = [
            (PuzzleType::FourByFour, 40),
            (PuzzleType::FiveByFive, 50),
            (PuzzleType::SixBySix, 60),
            (PuzzleType::SevenBySeven, 70),
            (PuzzleType::Pyraminx, 15),
            (PuzzleType::Megaminx, 70),
            (PuzzleType::Skewb, 10),
            (PuzzleType::Clock, 12),
            (PuzzleType::Square1, 15),
        ];
        for (puzzle, length) in expected {
            let generated = generate_for(puzzle, &mut rng(11));
            assert_eq!(generated.fidelity, Fidelity::Approximate, "{}", puzzle);
            assert_eq!(Scramble::parse(&generated.text).unwrap().len(), length);
        }
    }
}
