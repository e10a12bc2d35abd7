use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::{Board, BoardParseError};

/// 内置棋形。每个棋形都是黑方有利的局面；`O` 黑、`X` 白、`.` 空。
const BUILTIN_SOURCES: &[&str] = &[
    "\
. . . . .
. O O O .
. O X O .
. O X X O
. . O O .",
    "\
. . . . . . .
. . O O O . .
. O X X X O .
. O X . X O .
. O O X O . .
. . . O . . .",
    "\
. . . . . . . . .
. . . . . . . . .
. . O O O O . . .
. O X X X X O . .
. O X . . X O . .
. . O X X X O . .
. . . O O O . . .
. . . . . . . . .
. . . . . . . . .",
    "\
. O X . .
. O X . .
O X X . .
O O X . .
. O X X X
. O O O O",
    "\
. . . . . .
. . X X . .
. X O O X .
. X O . O .
. . X O . .
. . . . . .",
    "\
. . . . . . .
. . O O . . .
. O X X O O .
. O X . X X O
. . O X . X O
. . O X X O .
. . . O O . .",
    "\
O O O O O O
X X X X X O
. . . . X O
. X . . X O",
    "\
. . . . . . . .
. . . O O O . .
. . O X X X O .
. O X . X . X O
. . O O O O O .",
];

static BUILTIN: Lazy<Result<BoardCatalog, CatalogError>> =
    Lazy::new(|| BoardCatalog::from_sources(BUILTIN_SOURCES.iter().copied()));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CatalogError {
    Empty,
    InvalidBoard { index: usize, error: BoardParseError },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "board catalog must not be empty"),
            CatalogError::InvalidBoard { index, error } => {
                write!(f, "board #{index} is malformed: {error}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// 原始棋形：棋盘及其文本来源。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CanonicalBoard {
    pub board: Board,
    pub source: String,
}

impl CanonicalBoard {
    pub fn parse(source: &str) -> Result<Self, BoardParseError> {
        Ok(Self {
            board: Board::parse(source)?,
            source: source.to_string(),
        })
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }
}

/// 不可变的棋形集合，保证非空。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BoardCatalog {
    boards: Vec<CanonicalBoard>,
}

impl BoardCatalog {
    pub fn new(boards: Vec<CanonicalBoard>) -> Result<Self, CatalogError> {
        if boards.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { boards })
    }

    pub fn from_sources<'a, I>(sources: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let boards = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| {
                CanonicalBoard::parse(source)
                    .map_err(|error| CatalogError::InvalidBoard { index, error })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(boards)
    }

    /// 解析整份棋形列表，棋形之间以空行分隔。
    pub fn from_text(text: &str) -> Result<Self, CatalogError> {
        let mut boards = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        for line in text.lines().chain(std::iter::once("")) {
            if !line.trim().is_empty() {
                block.push(line);
                continue;
            }
            if block.is_empty() {
                continue;
            }
            let source = block.join("\n");
            let board = CanonicalBoard::parse(&source).map_err(|error| {
                CatalogError::InvalidBoard {
                    index: boards.len(),
                    error,
                }
            })?;
            boards.push(board);
            block.clear();
        }
        Self::new(boards)
    }

    /// 游戏内置的棋形集合。
    pub fn builtin() -> Result<Self, CatalogError> {
        (*BUILTIN).clone()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn boards(&self) -> &[CanonicalBoard] {
        &self.boards
    }

    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> &CanonicalBoard {
        let index = rng.gen_range(0..self.boards.len());
        &self.boards[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Stone;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = BoardCatalog::builtin().expect("builtin boards should be valid");

        assert_eq!(catalog.len(), BUILTIN_SOURCES.len());
        assert!(catalog
            .boards()
            .iter()
            .all(|entry| entry.width() > 0 && entry.height() > 0));
        assert!(
            catalog.boards().iter().any(|entry| !entry.board.is_square()),
            "catalog should exercise the non-square transpose guard"
        );
    }

    #[test]
    fn builtin_boards_keep_their_source_text() {
        let catalog = BoardCatalog::builtin().expect("builtin boards should be valid");

        for entry in catalog.boards() {
            assert_eq!(entry.board.to_text(), entry.source.trim());
        }
    }

    #[test]
    fn pick_random_reaches_every_board() {
        let catalog = BoardCatalog::from_sources(["O", "X", "."]).expect("tiny boards parse");
        let mut rng = SmallRng::seed_from_u64(7);
        let mut seen = [false; 3];

        for _ in 0..200 {
            let picked = catalog.pick_random(&mut rng);
            let index = match picked.board.get(0, 0) {
                Some(Stone::Black) => 0,
                Some(Stone::White) => 1,
                _ => 2,
            };
            seen[index] = true;
        }

        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(BoardCatalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);
        assert_eq!(
            BoardCatalog::from_sources(std::iter::empty::<&str>()).unwrap_err(),
            CatalogError::Empty
        );
    }

    #[test]
    fn from_text_splits_on_blank_lines() {
        let catalog = BoardCatalog::from_text("O .\n. X\n\n\nX X X\n. . .\n")
            .expect("two boards should parse");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.boards()[1].width(), 3);
    }

    #[test]
    fn from_text_reports_the_bad_board_index() {
        let err = BoardCatalog::from_text("O .\n\nO ?").unwrap_err();

        assert!(matches!(err, CatalogError::InvalidBoard { index: 1, .. }));
    }
}
