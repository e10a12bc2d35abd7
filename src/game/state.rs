use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::board::Board;
use super::transform::Answer;

/// 限时预算的下限，保证每局至少可以计时。
pub const MIN_BUDGET_FLOOR: Duration = Duration::from_millis(1);

/// 每局计时：无限或有限时长。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBudget {
    Unbounded,
    Limited(Duration),
}

impl Default for TimeBudget {
    fn default() -> Self {
        TimeBudget::Unbounded
    }
}

impl TimeBudget {
    pub fn from_seconds(seconds: Option<u32>) -> Self {
        match seconds {
            Some(secs) if secs > 0 => TimeBudget::Limited(Duration::from_secs(u64::from(secs))),
            _ => TimeBudget::Unbounded,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, TimeBudget::Unbounded)
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            TimeBudget::Unbounded => None,
            TimeBudget::Limited(duration) => Some(*duration),
        }
    }

    pub fn as_millis(&self) -> Option<u64> {
        self.as_duration()
            .map(|duration| duration.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    /// 限时预算减少 `step`，但不低于 `floor`（`floor` 至少 1 毫秒）。
    /// 低于 `floor` 的预算会被抬升到 `floor`。
    pub fn reduced(self, step: Duration, floor: Duration) -> Self {
        match self {
            TimeBudget::Unbounded => TimeBudget::Unbounded,
            TimeBudget::Limited(current) => {
                TimeBudget::Limited(current.saturating_sub(step).max(floor.max(MIN_BUDGET_FLOOR)))
            }
        }
    }

    /// 限时预算不低于 `floor`；不限时保持不变。
    pub fn at_least(self, floor: Duration) -> Self {
        match self {
            TimeBudget::Unbounded => TimeBudget::Unbounded,
            TimeBudget::Limited(current) => {
                TimeBudget::Limited(current.max(floor.max(MIN_BUDGET_FLOOR)))
            }
        }
    }
}

/// 单局状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// 倒计时进行中，接受猜测。
    Active,
    /// 猜错后本局冻结。
    Failed,
    /// 倒计时结束。
    TimedOut,
}

impl RoundStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, RoundStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    presented: Board,
    correct: Answer,
    time_remaining: TimeBudget,
    time_budget: TimeBudget,
    status: RoundStatus,
}

impl RoundState {
    pub fn new(presented: Board, correct: Answer, time_budget: TimeBudget) -> Self {
        Self {
            presented,
            correct,
            time_remaining: time_budget,
            time_budget,
            status: RoundStatus::Active,
        }
    }

    pub fn presented(&self) -> &Board {
        &self.presented
    }

    /// 仅供判定使用，判定前不向渲染层暴露。
    pub(crate) fn correct_answer(&self) -> Answer {
        self.correct
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == RoundStatus::Active
    }

    pub fn time_remaining(&self) -> TimeBudget {
        self.time_remaining
    }

    pub fn time_budget(&self) -> TimeBudget {
        self.time_budget
    }

    /// 剩余时间占比，范围 `[0, 1]`；不限时返回 `None`。
    pub fn timer_fraction(&self) -> Option<f64> {
        let total = self.time_budget.as_duration()?;
        let remaining = self.time_remaining.as_duration()?;
        if total.is_zero() {
            return Some(0.0);
        }
        Some((remaining.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0))
    }

    /// 倒计时推进。返回本次是否触发超时。
    pub fn elapse(&mut self, elapsed: Duration) -> bool {
        if self.status != RoundStatus::Active {
            return false;
        }
        match self.time_remaining {
            TimeBudget::Unbounded => false,
            TimeBudget::Limited(remaining) => {
                let left = remaining.saturating_sub(elapsed);
                self.time_remaining = TimeBudget::Limited(left);
                if left.is_zero() {
                    self.status = RoundStatus::TimedOut;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// 猜错时冻结本局。本局已结束则返回 `false`。
    pub fn fail(&mut self) -> bool {
        if self.status != RoundStatus::Active {
            return false;
        }
        self.status = RoundStatus::Failed;
        true
    }
}

/// 整场游戏的累计状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub score: u32,
    pub time_budget: TimeBudget,
    pub has_started: bool,
    pub rounds_played: u32,
}

impl SessionState {
    pub fn new(time_budget: TimeBudget) -> Self {
        Self {
            score: 0,
            time_budget,
            has_started: false,
            rounds_played: 0,
        }
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
        width: usize,
        height: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        time_budget_ms: Option<u64>,
    },
    GuessAccepted {
        guess: Answer,
        score: u32,
    },
    TimeBudgetReduced {
        budget_ms: u64,
    },
    GuessRejected {
        guess: Answer,
        correct: Answer,
    },
    GuessIgnored {
        guess: Answer,
        status: RoundStatus,
    },
    TimedOut {
        score: u32,
    },
    SessionRestarted,
}

/// 本局结束后显示的结算信息。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_per_round: Option<u32>,
}

impl SessionSummary {
    pub fn message(&self) -> String {
        let noun = if self.score == 1 { "board" } else { "boards" };
        match self.seconds_per_round {
            Some(seconds) => format!(
                "Game over!\nYou solved {} {noun} in {seconds}s per board.",
                self.score
            ),
            None => format!("Game over!\nYou solved {} {noun}.", self.score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(budget: TimeBudget) -> RoundState {
        let board = Board::parse("O .\n. X").expect("board should parse");
        RoundState::new(board, Answer::Black, budget)
    }

    #[test]
    fn limited_round_times_out_at_zero() {
        let mut state = round(TimeBudget::Limited(Duration::from_millis(100)));

        assert!(!state.elapse(Duration::from_millis(60)));
        assert_eq!(state.time_remaining().as_millis(), Some(40));
        assert!(state.elapse(Duration::from_millis(60)));
        assert_eq!(state.status(), RoundStatus::TimedOut);
        assert_eq!(state.timer_fraction(), Some(0.0));
        assert!(!state.elapse(Duration::from_millis(60)), "timeout fires once");
    }

    #[test]
    fn unbounded_round_never_times_out() {
        let mut state = round(TimeBudget::Unbounded);

        for _ in 0..1000 {
            assert!(!state.elapse(Duration::from_secs(3600)));
        }
        assert!(state.is_active());
        assert_eq!(state.timer_fraction(), None);
    }

    #[test]
    fn failed_round_freezes_the_clock() {
        let mut state = round(TimeBudget::Limited(Duration::from_secs(2)));

        assert!(state.fail());
        assert!(!state.fail());
        assert!(!state.elapse(Duration::from_secs(5)));
        assert_eq!(state.status(), RoundStatus::Failed);
        assert_eq!(state.time_remaining().as_millis(), Some(2000));
    }

    #[test]
    fn reduced_budget_respects_floor() {
        let floor = Duration::from_secs(1);
        let step = Duration::from_secs(1);
        let mut budget = TimeBudget::from_seconds(Some(3));

        budget = budget.reduced(step, floor);
        assert_eq!(budget.as_millis(), Some(2000));
        budget = budget.reduced(step, floor);
        assert_eq!(budget.as_millis(), Some(1000));
        budget = budget.reduced(step, floor);
        assert_eq!(budget.as_millis(), Some(1000));

        assert_eq!(
            TimeBudget::Unbounded.reduced(step, floor),
            TimeBudget::Unbounded
        );
    }

    #[test]
    fn zero_floor_never_reaches_zero() {
        let step = Duration::from_secs(1);
        let mut budget = TimeBudget::from_seconds(Some(2));

        for _ in 0..4 {
            budget = budget.reduced(step, Duration::ZERO);
        }

        assert_eq!(budget.as_duration(), Some(MIN_BUDGET_FLOOR));
    }

    #[test]
    fn floor_above_budget_raises_it() {
        let floor = Duration::from_secs(5);
        let budget = TimeBudget::from_seconds(Some(2));

        assert_eq!(
            budget.reduced(Duration::from_secs(1), floor).as_millis(),
            Some(5000)
        );
        assert_eq!(budget.at_least(floor).as_millis(), Some(5000));
        assert_eq!(
            TimeBudget::from_seconds(Some(9)).at_least(floor).as_millis(),
            Some(9000)
        );
        assert!(TimeBudget::Unbounded.at_least(floor).is_unbounded());
    }

    #[test]
    fn zero_seconds_means_no_timer() {
        assert!(TimeBudget::from_seconds(Some(0)).is_unbounded());
        assert!(TimeBudget::from_seconds(None).is_unbounded());
    }

    #[test]
    fn summary_pluralizes_and_mentions_timer() {
        let one = SessionSummary {
            score: 1,
            seconds_per_round: None,
        };
        let many = SessionSummary {
            score: 4,
            seconds_per_round: Some(10),
        };

        assert_eq!(one.message(), "Game over!\nYou solved 1 board.");
        assert_eq!(
            many.message(),
            "Game over!\nYou solved 4 boards in 10s per board."
        );
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = GameEvent::GuessRejected {
            guess: Answer::Black,
            correct: Answer::White,
        };

        let json = serde_json::to_string(&event).expect("event should serialize");

        assert_eq!(
            json,
            r#"{"type":"GuessRejected","guess":"black","correct":"white"}"#
        );
    }
}
