use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::board::{Board, Stone};
use super::catalog::CanonicalBoard;

/// 玩家的判断：黑方有利或白方有利。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Black,
    White,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Black => "black",
            Answer::White => "white",
        }
    }
}

/// 忽略大小写与首尾空白；接受 `black`/`white` 及缩写 `b`/`w`。
impl FromStr for Answer {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" | "b" => Ok(Answer::Black),
            "white" | "w" => Ok(Answer::White),
            _ => Err(()),
        }
    }
}

/// 一次对称变换：水平翻转、垂直翻转、转置（仅限方形棋盘）与颜色反转。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformSpec {
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub flip_vertical: bool,
    #[serde(default)]
    pub transpose: bool,
    #[serde(default)]
    pub invert_color: bool,
}

impl TransformSpec {
    pub fn identity() -> Self {
        Self::default()
    }

    /// 依次抛四枚硬币：水平翻转、垂直翻转、转置（仅方形棋盘）、颜色反转。
    pub fn random<R: Rng + ?Sized>(rng: &mut R, square: bool) -> Self {
        let flip_horizontal = rng.gen_bool(0.5);
        let flip_vertical = rng.gen_bool(0.5);
        let transpose = square && rng.gen_bool(0.5);
        let invert_color = rng.gen_bool(0.5);
        Self {
            flip_horizontal,
            flip_vertical,
            transpose,
            invert_color,
        }
    }

    pub fn answer(&self) -> Answer {
        if self.invert_color {
            Answer::White
        } else {
            Answer::Black
        }
    }

    /// 将展示坐标映射回原始棋形坐标。
    pub fn source_of(&self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        let a = if self.flip_horizontal { width - 1 - x } else { x };
        let b = if self.flip_vertical { height - 1 - y } else { y };
        if self.transpose {
            (b, a)
        } else {
            (a, b)
        }
    }

    /// 非方形棋盘不允许转置。
    fn normalized_for(self, board: &Board) -> Self {
        Self {
            transpose: self.transpose && board.is_square(),
            ..self
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TransformEngine;

impl TransformEngine {
    pub fn new() -> Self {
        Self
    }

    /// 对原始棋盘应用 `spec`；每个原始格子恰好读取一次。
    pub fn apply(&self, canonical: &Board, spec: TransformSpec) -> Board {
        let spec = spec.normalized_for(canonical);
        let (width, height) = (canonical.width(), canonical.height());
        Board::from_fn(width, height, |x, y| {
            let (a, b) = spec.source_of(x, y, width, height);
            let stone = canonical.get(a, b).unwrap_or(Stone::Empty);
            if spec.invert_color {
                stone.inverted()
            } else {
                stone
            }
        })
    }

    pub fn transform<R: Rng + ?Sized>(
        &self,
        canonical: &CanonicalBoard,
        rng: &mut R,
    ) -> (Board, Answer) {
        let spec = TransformSpec::random(rng, canonical.board.is_square());
        (self.apply(&canonical.board, spec), spec.answer())
    }
}
