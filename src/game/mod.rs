//! 游戏核心逻辑模块（棋形、对称变换、回合状态机与判定计分）。

pub mod board;
pub mod catalog;
pub mod input;
pub mod rules;
pub mod state;
pub mod transform;

pub use board::{Board, BoardParseError, Stone};
pub use catalog::{BoardCatalog, CanonicalBoard, CatalogError};
pub use input::InputCommand;
pub use rules::{
    Session, SessionConfig, SessionView, DEFAULT_BUDGET_FLOOR, DEFAULT_BUDGET_STEP,
};
pub use state::{GameEvent, RoundState, RoundStatus, SessionState, SessionSummary, TimeBudget};
pub use transform::{Answer, TransformEngine, TransformSpec};
