pub mod game;
pub mod settings;
pub mod utils;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::time::Duration;
use wasm_bindgen::prelude::*;

pub use game::{
    Answer, Board, BoardCatalog, BoardParseError, CanonicalBoard, CatalogError, GameEvent,
    InputCommand, RoundState, RoundStatus, Session, SessionConfig, SessionState, SessionSummary,
    SessionView, Stone, TimeBudget, TransformEngine, TransformSpec,
};
pub use settings::{load_and_persist, MemoryStore, SecondsPerRound, SettingsError, SettingsStore};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[cfg(target_arch = "wasm32")]
const SECONDS_PROMPT: &str = "Seconds per board: (leave empty for no timer)";

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_events_json(events: &[GameEvent]) -> Result<String, JsValue> {
    serde_json::to_string(events).map_err(serde_to_js_error)
}

fn parse_guess(guess: &str) -> Result<Answer, JsValue> {
    guess
        .parse::<Answer>()
        .map_err(|_| JsValue::from_str(&format!("unknown guess {guess:?}, expected black or white")))
}

fn elapsed_from_millis(elapsed_ms: f64) -> Duration {
    if elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(elapsed_ms / 1000.0).unwrap_or(Duration::MAX)
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::TimedOut { score } => {
                utils::log(&format!("time is up, {score} boards solved"));
            }
            GameEvent::GuessRejected { guess, correct } => utils::log(&format!(
                "wrong guess: {} (was {})",
                guess.as_str(),
                correct.as_str()
            )),
            GameEvent::SessionRestarted => utils::log("session restarted"),
            _ => {}
        }
    }
}

/// 浏览器端的游戏会话。渲染层每帧调用 `tick` 并读取 `view`。
#[wasm_bindgen]
pub struct GameSession {
    session: Session,
}

impl GameSession {
    fn from_seconds(seconds: SecondsPerRound, seed: Option<u64>) -> Result<GameSession, JsValue> {
        let catalog = BoardCatalog::builtin().map_err(to_js_error)?;
        let config = SessionConfig::from_seconds(seconds.get());
        let session = match seed {
            Some(seed) => Session::with_seed(config, catalog, seed),
            None => Session::new(config, catalog),
        };
        Ok(GameSession { session })
    }

    fn respond(&self, events: Vec<GameEvent>) -> Result<String, JsValue> {
        log_events(&events);
        make_events_json(&events)
    }
}

#[wasm_bindgen]
impl GameSession {
    /// `seconds` 为原始设置输入；非正数或非数字表示不计时。
    #[wasm_bindgen(constructor)]
    pub fn new(seconds: Option<String>) -> Result<GameSession, JsValue> {
        let seconds = seconds
            .as_deref()
            .map(SecondsPerRound::parse)
            .unwrap_or_default();
        GameSession::from_seconds(seconds, None)
    }

    #[wasm_bindgen(js_name = "withSeed")]
    pub fn with_seed(seconds: Option<String>, seed: u64) -> Result<GameSession, JsValue> {
        let seconds = seconds
            .as_deref()
            .map(SecondsPerRound::parse)
            .unwrap_or_default();
        GameSession::from_seconds(seconds, Some(seed))
    }

    pub fn tick(&mut self, elapsed_ms: f64) -> Result<String, JsValue> {
        let events = self.session.tick(elapsed_from_millis(elapsed_ms));
        self.respond(events)
    }

    pub fn submit_guess(&mut self, guess: &str) -> Result<String, JsValue> {
        let guess = parse_guess(guess)?;
        let events = self.session.submit_guess(guess);
        self.respond(events)
    }

    pub fn restart(&mut self) -> Result<String, JsValue> {
        let events = self.session.restart();
        self.respond(events)
    }

    /// 未知按键返回空事件列表。
    pub fn handle_key(&mut self, key: &str) -> Result<String, JsValue> {
        let events = match InputCommand::from_key(key) {
            Some(command) => self.session.handle(command),
            None => Vec::new(),
        };
        self.respond(events)
    }

    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.view()).map_err(JsValue::from)
    }

    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.view()).map_err(serde_to_js_error)
    }

    pub fn score(&self) -> u32 {
        self.session.score()
    }

    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }

    pub fn summary_text(&self) -> Option<String> {
        self.session.summary().map(|summary| summary.message())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl GameSession {
    /// 以上次保存的值为默认值询问每局秒数，写回 `localStorage` 后发出第一局。
    #[wasm_bindgen(js_name = "fromBrowserSettings")]
    pub fn from_browser_settings() -> Result<GameSession, JsValue> {
        use settings::{LocalStorageStore, SECONDS_KEY};

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let mut store = LocalStorageStore::open();
        let stored = match &store {
            Ok(store) => store.load(SECONDS_KEY).ok().flatten().unwrap_or_default(),
            Err(_) => String::new(),
        };
        let answer = window
            .prompt_with_message_and_default(SECONDS_PROMPT, &stored)?
            .unwrap_or_default();

        let seconds = match store.as_mut() {
            Ok(store) => load_and_persist(store, Some(&answer)),
            Err(error) => {
                utils::warn(&error.to_string());
                SecondsPerRound::parse(&answer)
            }
        };
        utils::log(&format!("seconds per board: {seconds}"));
        GameSession::from_seconds(seconds, None)
    }
}

#[derive(Serialize)]
struct TransformResponse {
    board: Board,
    answer: Answer,
}

/// 解析文本棋盘，便于前端调试。
#[wasm_bindgen(js_name = "parseBoard")]
pub fn parse_board(source: &str) -> Result<JsValue, JsValue> {
    let board = Board::parse(source).map_err(to_js_error)?;
    to_value(&board).map_err(JsValue::from)
}

/// 对文本棋盘应用指定的对称变换，返回变换后的棋盘与正确答案。
#[wasm_bindgen(js_name = "applyTransform")]
pub fn apply_transform(source: &str, spec: JsValue) -> Result<JsValue, JsValue> {
    let board = Board::parse(source).map_err(to_js_error)?;
    let spec: TransformSpec = from_value(spec).map_err(JsValue::from)?;
    let response = TransformResponse {
        board: TransformEngine::new().apply(&board, spec),
        answer: spec.answer(),
    };
    to_value(&response).map_err(JsValue::from)
}

/// 将原始秒数输入规范化为存储形式（不计时为 `""`）。
#[wasm_bindgen(js_name = "normalizeSeconds")]
pub fn normalize_seconds(input: &str) -> String {
    SecondsPerRound::parse(input).to_stored()
}

#[wasm_bindgen(js_name = "catalogSize")]
pub fn catalog_size() -> Result<usize, JsValue> {
    BoardCatalog::builtin()
        .map(|catalog| catalog.len())
        .map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_conversion_handles_odd_frames() {
        assert_eq!(elapsed_from_millis(16.0), Duration::from_millis(16));
        assert_eq!(elapsed_from_millis(-3.0), Duration::ZERO);
        assert_eq!(elapsed_from_millis(f64::NAN), Duration::ZERO);
        assert_eq!(elapsed_from_millis(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn events_encode_as_json_array() {
        let json = make_events_json(&[GameEvent::SessionRestarted]).expect("events serialize");

        assert_eq!(json, r#"[{"type":"SessionRestarted"}]"#);
    }

    #[test]
    fn normalize_seconds_matches_stored_form() {
        assert_eq!(normalize_seconds("15"), "15");
        assert_eq!(normalize_seconds("0"), "");
    }
}
