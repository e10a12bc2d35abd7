use serde::{Deserialize, Serialize};
use std::fmt;

const BLACK_TOKEN: &str = "O";
const WHITE_TOKEN: &str = "X";
const EMPTY_TOKEN: &str = ".";

/// 交叉点上的棋子状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    Black,
    White,
    Empty,
}

impl Default for Stone {
    fn default() -> Self {
        Stone::Empty
    }
}

impl Stone {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            BLACK_TOKEN => Some(Stone::Black),
            WHITE_TOKEN => Some(Stone::White),
            EMPTY_TOKEN => Some(Stone::Empty),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Stone::Black => BLACK_TOKEN,
            Stone::White => WHITE_TOKEN,
            Stone::Empty => EMPTY_TOKEN,
        }
    }

    /// 颜色反转：黑白互换，空点不变。
    pub fn inverted(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            Stone::Empty => Stone::Empty,
        }
    }

    /// 渲染层使用的数值：黑 = 1，白 = -1，空 = 0。
    pub fn sign(self) -> i8 {
        match self {
            Stone::Black => 1,
            Stone::White => -1,
            Stone::Empty => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardParseError {
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    UnknownToken {
        row: usize,
        column: usize,
        token: String,
    },
}

impl fmt::Display for BoardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardParseError::Empty => write!(f, "board source has no rows"),
            BoardParseError::RaggedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {row} has {actual} columns, expected {expected}"
            ),
            BoardParseError::UnknownToken { row, column, token } => {
                write!(f, "unknown token {token:?} at row {row}, column {column}")
            }
        }
    }
}

impl std::error::Error for BoardParseError {}

/// 固定尺寸的棋盘，按行存储，构造后不可修改。
/// 只能经由 `parse`、`from_rows` 或 `from_fn` 构造。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Stone>,
}

impl Board {
    /// 用格子函数构造棋盘，每个 `(x, y)` 只调用一次。
    pub fn from_fn<F>(width: usize, height: usize, mut cell: F) -> Self
    where
        F: FnMut(usize, usize) -> Stone,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(cell(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn from_rows(rows: &[&[Stone]]) -> Result<Self, BoardParseError> {
        let width = rows.first().map(|row| row.len()).ok_or(BoardParseError::Empty)?;
        if width == 0 {
            return Err(BoardParseError::Empty);
        }
        let mut cells = Vec::with_capacity(width * rows.len());
        for (row, stones) in rows.iter().enumerate() {
            if stones.len() != width {
                return Err(BoardParseError::RaggedRow {
                    row,
                    expected: width,
                    actual: stones.len(),
                });
            }
            cells.extend_from_slice(stones);
        }
        Ok(Self {
            width,
            height: rows.len(),
            cells,
        })
    }

    /// 解析文本棋盘：`O` 黑、`X` 白、`.` 空；行用换行分隔，列用空格分隔。
    pub fn parse(source: &str) -> Result<Self, BoardParseError> {
        let lines: Vec<&str> = source
            .trim_matches(|c: char| c == '\n' || c == '\r')
            .lines()
            .map(|line| line.trim())
            .collect();
        if lines.iter().all(|line| line.is_empty()) {
            return Err(BoardParseError::Empty);
        }

        let mut width = None;
        let mut cells = Vec::new();
        for (row, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
            let expected = *width.get_or_insert(tokens.len());
            if tokens.len() != expected || expected == 0 {
                return Err(BoardParseError::RaggedRow {
                    row,
                    expected,
                    actual: tokens.len(),
                });
            }
            for (column, token) in tokens.into_iter().enumerate() {
                let stone =
                    Stone::from_token(token).ok_or_else(|| BoardParseError::UnknownToken {
                        row,
                        column,
                        token: token.to_string(),
                    })?;
                cells.push(stone);
            }
        }

        Ok(Self {
            width: width.unwrap_or_default(),
            height: lines.len(),
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// `x` 为列，`y` 为行。
    pub fn get(&self, x: usize, y: usize) -> Option<Stone> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    pub fn cells(&self) -> &[Stone] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Stone]> {
        self.cells.chunks(self.width.max(1))
    }

    pub fn count(&self, stone: Stone) -> usize {
        self.cells.iter().filter(|cell| **cell == stone).count()
    }

    pub fn to_text(&self) -> String {
        self.rows()
            .map(|row| {
                row.iter()
                    .map(|stone| stone.token())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
