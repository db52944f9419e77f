// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

//! tile-nudge: the rules engine of a single-tile sliding merge puzzle.
//!
//! The game is played on a 4x4 board of power-of-two tiles. Unlike the familiar whole-line
//! 2048 slide, a move here nudges _one_ tile a single cell in a direction: into the neighbouring
//! cell if it is empty, or onto it if the neighbour holds an equal tile, in which case the two
//! merge into one tile of double the value and the doubled value is added to the score. After any
//! move that changes the board, a new tile (2, or sometimes 4) appears in a random empty cell.
//! A board with no empty cell and no pair of equal neighbours is a dead end.
//!
//! The library implements the board, the transition rules, tile spawning, dead-end detection and
//! a single-slot undo history, plus a [`Game`] controller tying them together. Rendering and input
//! handling are left to the user; [`Direction::from_drag`] is provided to help map pointer gestures
//! onto moves.

#![no_std]

use alloc::string::String;
use core::error::Error;
use core::fmt::{Debug, Display, Formatter};
use core::str::FromStr;
use num_traits::{PrimInt, Unsigned};
use rand::Rng;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

extern crate alloc;

/// The number of rows (and columns) of the board.
pub const SIDE: usize = 4;

/// The number of cells on the board.
pub const CELLS: usize = SIDE * SIDE;

/// A direction for a move.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Upward movement.
    Up,
    /// Downward movement.
    Down,
    /// Leftward movement.
    Left,
    /// Rightward movement.
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Resolve a drag gesture, given as the pointer delta between press and release, to a
    /// direction. The dominant axis wins; ties go to the vertical axis. A drag which didn't move
    /// at all resolves to nothing.
    pub fn from_drag(dx: i32, dy: i32) -> Option<Self> {
        if dx == 0 && dy == 0 {
            None
        } else if dx.unsigned_abs() > dy.unsigned_abs() {
            Some(if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else {
            Some(if dy > 0 {
                Direction::Down
            } else {
                Direction::Up
            })
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        })
    }
}

/// An error produced when a direction token isn't one of `up`, `down`, `left` or `right`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseDirectionError(String);

impl ParseDirectionError {
    /// The token which failed to parse.
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl Display for ParseDirectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("unrecognised direction {:?}", self.0))
    }
}

impl Error for ParseDirectionError {}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.into())),
        }
    }
}

/// Marker trait: specifies that a value may be used for tiles and scores.
pub trait TileValue:
    PrimInt + Unsigned + Debug + Display + DeserializeOwned + Serialize + 'static
{
}

impl<V> TileValue for V where
    V: PrimInt + Unsigned + Debug + Display + DeserializeOwned + Serialize + 'static
{
}

/// A tile, generic over the numeric type which backs it. A tile's value is always a power of two
/// no smaller than two.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct Tile<V>(V);

impl<V> Tile<V>
where
    V: TileValue,
{
    /// Create a tile with the provided value, or `None` if the value is not a power of two greater
    /// than one.
    pub fn new(value: V) -> Option<Self> {
        if value > V::one() && value.count_ones() == 1 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The tile with value 2.
    pub fn two() -> Self {
        Self(V::one() + V::one())
    }

    /// The tile with value 4.
    pub fn four() -> Self {
        let two = V::one() + V::one();
        Self(two + two)
    }

    /// The value of this tile.
    pub fn value(&self) -> V {
        self.0
    }

    /// The base-two logarithm of this tile's value.
    pub fn exponent(&self) -> u32 {
        self.0.trailing_zeros()
    }

    /// The tile produced by merging this tile with an equal one, or `None` if its value would not
    /// fit in `V`.
    pub fn doubled(&self) -> Option<Self> {
        self.0.checked_add(&self.0).map(Self)
    }
}

impl<V> Display for Tile<V>
where
    V: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'de, V> Deserialize<'de> for Tile<V>
where
    V: TileValue,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = V::deserialize(deserializer)?;
        Tile::new(value).ok_or_else(|| {
            D::Error::custom(format_args!(
                "tile value {value} is not a power of two greater than one"
            ))
        })
    }
}

/// A position in the board (eff., a coordinate pair).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct Position {
    row: usize,
    column: usize,
}

impl Position {
    /// Create a position, or `None` if it lies outside the board.
    pub fn new(row: usize, column: usize) -> Option<Self> {
        (row < SIDE && column < SIDE).then_some(Self { row, column })
    }

    /// The position of the cell with the provided row-major index, or `None` if there is no such
    /// cell.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < CELLS).then_some(Self {
            row: index / SIDE,
            column: index % SIDE,
        })
    }

    /// The row of the position.
    pub fn row(&self) -> usize {
        self.row
    }

    /// The column of the position.
    pub fn column(&self) -> usize {
        self.column
    }

    /// The position encoded as a row-major index into the board.
    pub fn as_index(&self) -> usize {
        self.row * SIDE + self.column
    }

    /// Get the position one cell away from this position in the provided direction `dir`, or
    /// `None` if the position would be off the board.
    pub fn shift(&self, dir: Direction) -> Option<Self> {
        match dir {
            Direction::Up => Self::new(self.row.checked_sub(1)?, self.column),
            Direction::Down => Self::new(self.row + 1, self.column),
            Direction::Left => Self::new(self.row, self.column.checked_sub(1)?),
            Direction::Right => Self::new(self.row, self.column + 1),
        }
    }
}

impl TryFrom<(usize, usize)> for Position {
    type Error = (usize, usize);

    fn try_from((row, column): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(row, column).ok_or((row, column))
    }
}

/// An error which denotes that a raw cell value can't be placed on a board.
#[derive(Debug)]
pub struct InvalidBoardError<V> {
    index: usize,
    value: V,
}

impl<V> InvalidBoardError<V> {
    /// The index of the offending cell.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The offending value.
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<V> Display for InvalidBoardError<V>
where
    V: TileValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!(
            "cell {} holds {}, which is neither empty nor a power of two greater than one",
            self.index, self.value
        ))
    }
}

impl<V> Error for InvalidBoardError<V> where V: TileValue {}

/// The 4x4 board, stored row-major. A cell is either empty or holds a [`Tile`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: TileValue"))]
pub struct Board<V = u32> {
    cells: [Option<Tile<V>>; CELLS],
}

impl<V> Default for Board<V>
where
    V: TileValue,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> Board<V>
where
    V: TileValue,
{
    /// Produce an empty board.
    pub fn empty() -> Self {
        Self {
            cells: [None; CELLS],
        }
    }

    /// Build a board from raw row-major values, where zero denotes an empty cell.
    pub fn from_values(values: [V; CELLS]) -> Result<Self, InvalidBoardError<V>> {
        let mut board = Self::empty();
        for (index, value) in values.into_iter().enumerate() {
            if value.is_zero() {
                continue;
            }
            board.cells[index] = Some(Tile::new(value).ok_or(InvalidBoardError { index, value })?);
        }
        Ok(board)
    }

    /// The board as raw row-major values, with zero for empty cells.
    pub fn to_values(&self) -> [V; CELLS] {
        self.cells.map(|cell| cell.map_or_else(V::zero, |tile| tile.value()))
    }

    /// All cells of the board, row-major.
    pub fn cells(&self) -> &[Option<Tile<V>>; CELLS] {
        &self.cells
    }

    /// Fetches the cell with the provided index. [`None`] if the index doesn't exist in the board,
    /// [`Some`]`(`[`None`]`)` if the cell exists, but is empty, and [`Some`]`(`[`Some`]`(t))` with
    /// `t` as the tile that occupies it.
    pub fn get(&self, index: usize) -> Option<Option<Tile<V>>> {
        self.cells.get(index).copied()
    }

    /// Fetches the cell at the provided position.
    pub fn at(&self, position: Position) -> Option<Tile<V>> {
        self.cells[position.as_index()]
    }

    /// Fetches a whole row, left to right, or `None` if the row doesn't exist.
    pub fn row(&self, row: usize) -> Option<[Option<Tile<V>>; SIDE]> {
        (row < SIDE).then(|| core::array::from_fn(|column| self.cells[row * SIDE + column]))
    }

    /// Fetches a whole column, top to bottom, or `None` if the column doesn't exist.
    pub fn column(&self, column: usize) -> Option<[Option<Tile<V>>; SIDE]> {
        (column < SIDE).then(|| core::array::from_fn(|row| self.cells[row * SIDE + column]))
    }

    /// The indices of the empty cells, in ascending order.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.is_none().then_some(index))
    }

    /// The number of empty cells.
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    /// Whether every cell holds a tile.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The largest tile on the board, if any.
    pub fn highest_tile(&self) -> Option<Tile<V>> {
        self.cells.iter().flatten().max().copied()
    }

    /// Whether any two horizontally or vertically adjacent cells hold equal tiles.
    pub fn has_adjacent_pair(&self) -> bool {
        (0..CELLS).any(|index| {
            let Some(tile) = self.cells[index] else {
                return false;
            };
            let (row, column) = (index / SIDE, index % SIDE);
            (column + 1 < SIDE && self.cells[index + 1] == Some(tile))
                || (row + 1 < SIDE && self.cells[index + SIDE] == Some(tile))
        })
    }

    /// Whether the board is a dead end: there are no empty cells and no equal neighbours, so no
    /// move can ever change it again.
    pub fn is_dead_end(&self) -> bool {
        self.is_full() && !self.has_adjacent_pair()
    }

    /// Whether nudging the tile at `origin` in `direction` would change the board.
    pub fn can_move(&self, origin: usize, direction: Direction) -> bool {
        self.apply_move(origin, direction)
            .is_ok_and(|transition| transition.changed())
    }

    /// Compute the effect of nudging the cell at `origin` one step in `direction`. The board itself
    /// is left untouched; the result carries the new board.
    ///
    /// There are exactly three outcomes: the neighbour is empty and the cell slides into it, the
    /// neighbour holds an equal tile and the two merge, or the move is blocked by the edge of the
    /// board or an unequal tile.
    pub fn apply_move(
        &self,
        origin: usize,
        direction: Direction,
    ) -> Result<Transition<V>, MoveError> {
        let from = Position::from_index(origin).ok_or(MoveError {
            origin,
            direction,
            variant: MoveErrorType::InvalidOrigin,
        })?;
        let Some(to) = from.shift(direction) else {
            return Ok(Transition::blocked(*self, BlockReason::Edge));
        };
        let (from, to) = (from.as_index(), to.as_index());

        let mut board = *self;
        let transition = match (self.cells[from], self.cells[to]) {
            (moving, None) => {
                board.cells[to] = moving;
                board.cells[from] = None;
                Transition {
                    board,
                    score_delta: V::zero(),
                    outcome: Outcome::Slid { from, to },
                }
            }
            (Some(moving), Some(resting)) if moving == resting => {
                let tile = moving.doubled().ok_or(MoveError {
                    origin,
                    direction,
                    variant: MoveErrorType::Overflow,
                })?;
                board.cells[to] = Some(tile);
                board.cells[from] = None;
                Transition {
                    board,
                    score_delta: tile.value(),
                    outcome: Outcome::Merged { from, to, tile },
                }
            }
            _ => Transition::blocked(*self, BlockReason::Occupied),
        };
        Ok(transition)
    }

    /// Place a new tile into an empty cell chosen uniformly at random. The tile is a 4 with the
    /// probability given by `rules`, and a 2 otherwise.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        rules: &Rules,
        rng: &mut R,
    ) -> Result<Spawned<V>, SpawnError> {
        let empty = self.count_empty();
        if empty == 0 {
            return Err(SpawnError::BoardFull);
        }
        let pick = rng.gen_range(0..empty);
        let index = self.empty_cells().nth(pick).ok_or(SpawnError::BoardFull)?;
        let tile = if rng.gen_bool(rules.four_probability()) {
            Tile::four()
        } else {
            Tile::two()
        };
        self.cells[index] = Some(tile);
        log::debug!("spawned {tile} at cell {index}");
        Ok(Spawned { index, tile })
    }
}

impl<V> Display for Board<V>
where
    V: TileValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let width = self
            .highest_tile()
            .map_or(1, |tile| tile.value().to_u128().map_or(1, |v| v.ilog10() + 1))
            as usize;
        let rule = width * SIDE + 3 * (SIDE - 1);
        for row in 0..SIDE {
            if row > 0 {
                writeln!(f, "{:->1$}", "", rule)?;
            }
            for column in 0..SIDE {
                if column > 0 {
                    write!(f, " | ")?;
                }
                match self.cells[row * SIDE + column] {
                    Some(tile) => write!(f, "{:>width$}", tile.value())?,
                    None => write!(f, "{:>width$}", ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Why a move left the board unchanged.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum BlockReason {
    /// The cell sits on the edge of the board in the direction of the move.
    Edge,
    /// The neighbouring cell holds a different tile.
    Occupied,
}

/// The outcome of a single move.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: TileValue"))]
pub enum Outcome<V> {
    /// The cell at `from` slid into the empty cell at `to`.
    Slid {
        /// The origin cell index.
        from: usize,
        /// The destination cell index.
        to: usize,
    },
    /// The tile at `from` merged with its equal at `to`, producing `tile`.
    Merged {
        /// The origin cell index.
        from: usize,
        /// The destination cell index.
        to: usize,
        /// The merged tile.
        tile: Tile<V>,
    },
    /// Nothing happened.
    Blocked(BlockReason),
}

impl<V> Outcome<V> {
    /// Whether the board changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Outcome::Blocked(_))
    }
}

/// The result of [`Board::apply_move`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition<V> {
    board: Board<V>,
    score_delta: V,
    outcome: Outcome<V>,
}

impl<V> Transition<V>
where
    V: TileValue,
{
    fn blocked(board: Board<V>, reason: BlockReason) -> Self {
        Self {
            board,
            score_delta: V::zero(),
            outcome: Outcome::Blocked(reason),
        }
    }

    /// The board after the move.
    pub fn board(&self) -> &Board<V> {
        &self.board
    }

    /// The points earned by the move.
    pub fn score_delta(&self) -> V {
        self.score_delta
    }

    /// What the move did.
    pub fn outcome(&self) -> &Outcome<V> {
        &self.outcome
    }

    /// Whether the board changed.
    pub fn changed(&self) -> bool {
        self.outcome.changed()
    }
}

/// The type of failed move that was observed in a [`MoveError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MoveErrorType {
    /// The origin is not a cell of the board.
    InvalidOrigin,
    /// The merged tile or the resulting score would not fit in the tile value type.
    Overflow,
}

/// An error which describes a move that could not be evaluated. Blocked moves are not errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MoveError {
    origin: usize,
    direction: Direction,
    variant: MoveErrorType,
}

impl MoveError {
    /// The origin cell of the failed move.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The direction of the failed move.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// What went wrong.
    pub fn variant(&self) -> MoveErrorType {
        self.variant
    }
}

impl Display for MoveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.variant {
            MoveErrorType::InvalidOrigin => f.write_fmt(format_args!(
                "cannot move cell {} {} because it doesn't exist",
                self.origin, self.direction
            )),
            MoveErrorType::Overflow => f.write_fmt(format_args!(
                "cannot move cell {} {} because the result would overflow",
                self.origin, self.direction
            )),
        }
    }
}

impl Error for MoveError {}

/// A tile placed by [`Board::spawn`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: TileValue"))]
pub struct Spawned<V> {
    /// The index of the cell the tile was placed in.
    pub index: usize,
    /// The placed tile.
    pub tile: Tile<V>,
}

/// An error raised when a tile cannot be spawned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpawnError {
    /// There is no empty cell left.
    BoardFull,
}

impl Display for SpawnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            SpawnError::BoardFull => f.write_str("cannot spawn a tile on a full board"),
        }
    }
}

impl Error for SpawnError {}

/// An error raised when [`Rules`] are out of range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RulesError {
    /// The chance of spawning a 4 is not a probability.
    FourProbability(f64),
    /// A new game can't start with this many tiles.
    InitialTiles(usize),
}

impl Display for RulesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            RulesError::FourProbability(p) => f.write_fmt(format_args!(
                "the chance of spawning a 4 must lie within [0, 1], got {p}"
            )),
            RulesError::InitialTiles(n) => f.write_fmt(format_args!(
                "a new game must start with 1 to {CELLS} tiles, got {n}"
            )),
        }
    }
}

impl Error for RulesError {}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
struct RulesConfig {
    four_probability: f64,
    initial_tiles: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            four_probability: 0.1,
            initial_tiles: 2,
        }
    }
}

/// Tunable rules of the game. Rules are always valid once constructed, including when
/// deserialized; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "RulesConfig", into = "RulesConfig")]
pub struct Rules {
    four_probability: f64,
    initial_tiles: usize,
}

impl Rules {
    /// Create a set of rules, checking that each is in range.
    pub fn new(four_probability: f64, initial_tiles: usize) -> Result<Self, RulesError> {
        if !(0.0..=1.0).contains(&four_probability) {
            return Err(RulesError::FourProbability(four_probability));
        }
        if !(1..=CELLS).contains(&initial_tiles) {
            return Err(RulesError::InitialTiles(initial_tiles));
        }
        Ok(Self {
            four_probability,
            initial_tiles,
        })
    }

    /// The chance that a spawned tile is a 4 rather than a 2.
    pub fn four_probability(&self) -> f64 {
        self.four_probability
    }

    /// The number of tiles placed on the board when a game starts.
    pub fn initial_tiles(&self) -> usize {
        self.initial_tiles
    }
}

impl Default for Rules {
    fn default() -> Self {
        let RulesConfig {
            four_probability,
            initial_tiles,
        } = RulesConfig::default();
        Self {
            four_probability,
            initial_tiles,
        }
    }
}

impl TryFrom<RulesConfig> for Rules {
    type Error = RulesError;

    fn try_from(config: RulesConfig) -> Result<Self, Self::Error> {
        Self::new(config.four_probability, config.initial_tiles)
    }
}

impl From<Rules> for RulesConfig {
    fn from(rules: Rules) -> Self {
        Self {
            four_probability: rules.four_probability,
            initial_tiles: rules.initial_tiles,
        }
    }
}

/// A copy of the board and score taken just before a move.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: TileValue"))]
pub struct Snapshot<V = u32> {
    /// The saved board.
    pub board: Board<V>,
    /// The saved score.
    pub score: V,
}

/// Single-slot undo history: saving a snapshot replaces the previous one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: TileValue"))]
pub struct History<V = u32> {
    slot: Option<Snapshot<V>>,
}

impl<V> Default for History<V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<V> History<V>
where
    V: TileValue,
{
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a snapshot, overwriting any previously saved one.
    pub fn save(&mut self, board: Board<V>, score: V) {
        self.slot = Some(Snapshot { board, score });
    }

    /// The saved snapshot, if any. The snapshot is kept, so it may be restored again.
    pub fn restore(&self) -> Option<&Snapshot<V>> {
        self.slot.as_ref()
    }
}

/// A move requested by the input layer: nudge the tile at `origin` in `direction`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct MoveRequest {
    origin: usize,
    direction: Direction,
}

impl MoveRequest {
    /// Create a request, or `None` if `origin` is not a cell of the board.
    pub fn new(origin: usize, direction: Direction) -> Option<Self> {
        (origin < CELLS).then_some(Self { origin, direction })
    }

    /// The cell to move.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The direction to move in.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// An error raised when a raw move request can't be understood.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequestError {
    /// The origin index is not a cell of the board.
    InvalidOrigin(usize),
    /// The direction token isn't recognised.
    InvalidDirection(ParseDirectionError),
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            RequestError::InvalidOrigin(origin) => f.write_fmt(format_args!(
                "cell {origin} is not on the board (expected 0 to {})",
                CELLS - 1
            )),
            RequestError::InvalidDirection(e) => Display::fmt(e, f),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RequestError::InvalidOrigin(_) => None,
            RequestError::InvalidDirection(e) => Some(e),
        }
    }
}

impl From<ParseDirectionError> for RequestError {
    fn from(e: ParseDirectionError) -> Self {
        RequestError::InvalidDirection(e)
    }
}

impl TryFrom<(usize, &str)> for MoveRequest {
    type Error = RequestError;

    fn try_from((origin, token): (usize, &str)) -> Result<Self, Self::Error> {
        let direction = token.parse::<Direction>()?;
        Self::new(origin, direction).ok_or(RequestError::InvalidOrigin(origin))
    }
}

/// What a call to [`Game::request_move`] did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MoveReport<V> {
    /// What the move did to the board.
    pub outcome: Outcome<V>,
    /// The points earned by the move.
    pub score_delta: V,
    /// The tile spawned after the move, if the board changed.
    pub spawned: Option<Spawned<V>>,
    /// Set when the move left the board in a dead end. Further requests are still accepted; they
    /// will simply be blocked.
    pub dead_end: bool,
}

impl<V> MoveReport<V> {
    /// Whether the board changed.
    pub fn changed(&self) -> bool {
        self.outcome.changed()
    }
}

/// A game in progress: the board, the score, the undo history, the rules and the source of
/// randomness used for spawning tiles.
#[derive(Clone, Debug)]
pub struct Game<R, V = u32> {
    board: Board<V>,
    score: V,
    history: History<V>,
    rules: Rules,
    rng: R,
}

impl<R, V> Game<R, V>
where
    R: Rng,
    V: TileValue,
{
    /// Start a new game with the provided rules, drawing randomness from `rng`.
    pub fn new(rules: Rules, rng: R) -> Self {
        let mut game = Self::from_parts(Board::empty(), V::zero(), rules, rng);
        game.start_new_game();
        game
    }

    /// Resume a game from an existing board and score, with an empty history.
    pub fn from_parts(board: Board<V>, score: V, rules: Rules, rng: R) -> Self {
        Self {
            board,
            score,
            history: History::new(),
            rules,
            rng,
        }
    }

    /// The current board.
    pub fn board(&self) -> &Board<V> {
        &self.board
    }

    /// The current score.
    pub fn score(&self) -> V {
        self.score
    }

    /// The undo history.
    pub fn history(&self) -> &History<V> {
        &self.history
    }

    /// The rules of this game.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Whether the board is currently a dead end.
    pub fn is_dead_end(&self) -> bool {
        self.board.is_dead_end()
    }

    /// Clear the board and score and place the initial tiles. The undo history is kept.
    pub fn start_new_game(&mut self) {
        self.board = Board::empty();
        self.score = V::zero();
        for _ in 0..self.rules.initial_tiles() {
            if self.board.spawn(&self.rules, &mut self.rng).is_err() {
                break;
            }
        }
        log::info!("new game started");
    }

    /// Nudge the tile at `origin` one step in `direction`.
    ///
    /// The current state is saved to the history before every attempt, including attempts which
    /// turn out to be blocked. If the board changed, a tile is spawned and the board is checked for
    /// a dead end. Errors leave the board, score and history untouched.
    pub fn request_move(
        &mut self,
        origin: usize,
        direction: Direction,
    ) -> Result<MoveReport<V>, MoveError> {
        let transition = self.board.apply_move(origin, direction).inspect_err(|e| {
            log::warn!("rejected move: {e}");
        })?;
        let score = self
            .score
            .checked_add(&transition.score_delta())
            .ok_or_else(|| {
                let e = MoveError {
                    origin,
                    direction,
                    variant: MoveErrorType::Overflow,
                };
                log::warn!("rejected move: {e}");
                e
            })?;

        self.history.save(self.board, self.score);
        log::debug!("cell {origin} {direction}: {:?}", transition.outcome());

        let mut report = MoveReport {
            outcome: *transition.outcome(),
            score_delta: transition.score_delta(),
            spawned: None,
            dead_end: false,
        };
        if !transition.changed() {
            return Ok(report);
        }

        self.board = *transition.board();
        self.score = score;
        // the origin cell was vacated by the move, so there is always room
        report.spawned = match self.board.spawn(&self.rules, &mut self.rng) {
            Ok(spawned) => Some(spawned),
            Err(e) => {
                log::warn!("no tile spawned after cell {origin} {direction}: {e}");
                None
            }
        };
        report.dead_end = self.board.is_dead_end();
        if report.dead_end {
            log::info!("no moves remain, final score {}", self.score);
        }
        Ok(report)
    }

    /// Carry out a pre-validated [`MoveRequest`].
    pub fn submit(&mut self, request: MoveRequest) -> Result<MoveReport<V>, MoveError> {
        self.request_move(request.origin, request.direction)
    }

    /// Restore the board and score saved before the last move attempt. Returns `false`, changing
    /// nothing, if no move has been attempted yet.
    pub fn request_undo(&mut self) -> bool {
        match self.history.restore().copied() {
            Some(Snapshot { board, score }) => {
                self.board = board;
                self.score = score;
                log::info!("undid last move, score back to {score}");
                true
            }
            None => false,
        }
    }
}
