use serde::{Deserialize, Serialize};

use super::transform::Answer;

/// 已解析的输入语义。点击区域的命中检测由前端完成。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "guess")]
pub enum InputCommand {
    Guess(Answer),
    Restart,
}

impl InputCommand {
    /// 将 `KeyboardEvent.key` 的值映射为命令。
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => Some(InputCommand::Guess(Answer::Black)),
            "ArrowRight" | "Right" => Some(InputCommand::Guess(Answer::White)),
            "Enter" => Some(InputCommand::Restart),
            _ => None,
        }
    }
}
