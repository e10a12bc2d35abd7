use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;

use super::{
    board::Board,
    catalog::BoardCatalog,
    input::InputCommand,
    state::{
        GameEvent, RoundState, RoundStatus, SessionState, SessionSummary, TimeBudget,
        MIN_BUDGET_FLOOR,
    },
    transform::{Answer, TransformEngine},
};

/// 每次猜对后，后续回合减少的时长。
pub const DEFAULT_BUDGET_STEP: Duration = Duration::from_millis(1000);
/// 限时会话每局可缩短到的最短时长。
pub const DEFAULT_BUDGET_FLOOR: Duration = Duration::from_millis(1000);

/// 会话配置：每局秒数与计时递减规则。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub seconds_per_round: Option<u32>,
    pub budget_step: Duration,
    pub budget_floor: Duration,
}

impl SessionConfig {
    pub fn from_seconds(seconds_per_round: Option<u32>) -> Self {
        Self {
            seconds_per_round: seconds_per_round.filter(|secs| *secs > 0),
            budget_step: DEFAULT_BUDGET_STEP,
            budget_floor: DEFAULT_BUDGET_FLOOR,
        }
    }

    pub fn unbounded() -> Self {
        Self::from_seconds(None)
    }

    pub fn with_budget_step(mut self, step: Duration) -> Self {
        self.budget_step = step;
        self
    }

    /// 设置计时下限；下限至少为 1 毫秒。
    pub fn with_budget_floor(mut self, floor: Duration) -> Self {
        self.budget_floor = floor.max(MIN_BUDGET_FLOOR);
        self
    }

    pub fn initial_budget(&self) -> TimeBudget {
        TimeBudget::from_seconds(self.seconds_per_round).at_least(self.budget_floor)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::unbounded()
    }
}

/// 渲染层每帧读取的快照，不包含正确答案。
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub board: Board,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<i8>,
    pub status: RoundStatus,
    pub score: u32,
    pub round: u32,
    pub has_started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn millis_f64(budget: TimeBudget) -> Option<f64> {
    budget
        .as_duration()
        .map(|duration| duration.as_secs_f64() * 1000.0)
}

fn draw_round<R: Rng + ?Sized>(
    catalog: &BoardCatalog,
    engine: &TransformEngine,
    rng: &mut R,
    time_budget: TimeBudget,
) -> RoundState {
    let canonical = catalog.pick_random(rng);
    let (presented, correct) = engine.transform(canonical, rng);
    RoundState::new(presented, correct, time_budget)
}

/// 一名玩家的连续回合：判定猜测、累计得分并推进倒计时。
/// 每个操作同步完成，并以事件列表报告结果。
pub struct Session<R = SmallRng> {
    config: SessionConfig,
    catalog: BoardCatalog,
    engine: TransformEngine,
    rng: R,
    state: SessionState,
    round: RoundState,
}

impl Session<SmallRng> {
    pub fn new(config: SessionConfig, catalog: BoardCatalog) -> Self {
        Self::with_rng(config, catalog, SmallRng::from_entropy())
    }

    pub fn with_seed(config: SessionConfig, catalog: BoardCatalog, seed: u64) -> Self {
        Self::with_rng(config, catalog, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Session<R> {
    /// 创建会话并发出第一局。
    pub fn with_rng(config: SessionConfig, catalog: BoardCatalog, mut rng: R) -> Self {
        let engine = TransformEngine::new();
        let mut state = SessionState::new(config.initial_budget());
        let round = draw_round(&catalog, &engine, &mut rng, state.time_budget);
        state.rounds_played = 1;
        Self {
            config,
            catalog,
            engine,
            rng,
            state,
            round,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn status(&self) -> RoundStatus {
        self.round.status()
    }

    pub fn is_over(&self) -> bool {
        self.round.status().is_over()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        if !self.is_over() {
            return None;
        }
        Some(SessionSummary {
            score: self.state.score,
            seconds_per_round: self.config.seconds_per_round,
        })
    }

    /// 抽取新棋形并重置倒计时。
    pub fn start_round(&mut self) -> GameEvent {
        self.round = draw_round(
            &self.catalog,
            &self.engine,
            &mut self.rng,
            self.state.time_budget,
        );
        self.state.rounds_played = self.state.rounds_played.saturating_add(1);
        GameEvent::RoundStarted {
            round: self.state.rounds_played,
            width: self.round.presented().width(),
            height: self.round.presented().height(),
            time_budget_ms: self.state.time_budget.as_millis(),
        }
    }

    /// 推进倒计时。会话第一次猜测之前不计时。
    pub fn tick(&mut self, elapsed: Duration) -> Vec<GameEvent> {
        if !self.state.has_started {
            return Vec::new();
        }
        if self.round.elapse(elapsed) {
            return vec![GameEvent::TimedOut {
                score: self.state.score,
            }];
        }
        Vec::new()
    }

    pub fn submit_guess(&mut self, guess: Answer) -> Vec<GameEvent> {
        if !self.round.is_active() {
            return vec![GameEvent::GuessIgnored {
                guess,
                status: self.round.status(),
            }];
        }
        self.state.has_started = true;

        let correct = self.round.correct_answer();
        if guess != correct {
            self.round.fail();
            return vec![GameEvent::GuessRejected { guess, correct }];
        }

        self.state.score = self.state.score.saturating_add(1);
        let mut events = vec![GameEvent::GuessAccepted {
            guess,
            score: self.state.score,
        }];

        let reduced = self
            .state
            .time_budget
            .reduced(self.config.budget_step, self.config.budget_floor);
        if reduced != self.state.time_budget {
            self.state.time_budget = reduced;
            if let Some(budget_ms) = reduced.as_millis() {
                events.push(GameEvent::TimeBudgetReduced { budget_ms });
            }
        }

        events.push(self.start_round());
        events
    }

    /// 丢弃当前进度，按配置的时长重新开始。
    pub fn restart(&mut self) -> Vec<GameEvent> {
        self.state = SessionState::new(self.config.initial_budget());
        vec![GameEvent::SessionRestarted, self.start_round()]
    }

    /// 分发已解析的输入。只有本局进行中才判定猜测；重开随时有效。
    pub fn handle(&mut self, command: InputCommand) -> Vec<GameEvent> {
        match command {
            InputCommand::Guess(guess) if self.round.is_active() => self.submit_guess(guess),
            InputCommand::Guess(_) => Vec::new(),
            InputCommand::Restart => self.restart(),
        }
    }

    pub fn view(&self) -> SessionView {
        let board = self.round.presented().clone();
        let summary = self.summary();
        SessionView {
            width: board.width(),
            height: board.height(),
            cells: board.cells().iter().map(|stone| stone.sign()).collect(),
            board,
            status: self.round.status(),
            score: self.state.score,
            round: self.state.rounds_played,
            has_started: self.state.has_started,
            time_remaining_ms: millis_f64(self.round.time_remaining()),
            time_budget_ms: millis_f64(self.round.time_budget()),
            timer_fraction: self.round.timer_fraction(),
            message: summary.map(|summary| summary.message()),
            summary,
        }
    }
}
