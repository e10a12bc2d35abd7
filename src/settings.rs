use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::utils;

/// 唯一持久化设置项的存储键。
pub const SECONDS_KEY: &str = "seconds";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SettingsError {
    StorageUnavailable,
    ReadFailed { message: String },
    WriteFailed { message: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::StorageUnavailable => write!(f, "local storage is unavailable"),
            SettingsError::ReadFailed { message } => write!(f, "settings read failed: {message}"),
            SettingsError::WriteFailed { message } => {
                write!(f, "settings write failed: {message}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// 每局秒数；`None` 表示不计时。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecondsPerRound(Option<u32>);

impl SecondsPerRound {
    pub fn unbounded() -> Self {
        Self(None)
    }

    pub fn limited(seconds: u32) -> Self {
        Self(Some(seconds).filter(|secs| *secs > 0))
    }

    /// 按浏览器 `parseInt` 的方式读取开头的整数：可选正负号，`0x`/`0X`
    /// 前缀按十六进制，其余按十进制，后续字符忽略。结果不是正数则不计时。
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (radix, rest) = match rest.get(..2) {
            Some("0x") | Some("0X") => (16, &rest[2..]),
            _ => (10, rest),
        };
        let digits: &str = {
            let end = rest
                .find(|c: char| !c.is_digit(radix))
                .unwrap_or(rest.len());
            &rest[..end]
        };
        if negative || digits.is_empty() {
            return Self::unbounded();
        }
        let value = digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0u64, |acc, digit| {
                acc.saturating_mul(u64::from(radix))
                    .saturating_add(u64::from(digit))
            })
            .min(u64::from(u32::MAX)) as u32;
        Self::limited(value)
    }

    pub fn get(&self) -> Option<u32> {
        self.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.is_none()
    }

    /// 存储形式：秒数，不计时则为空字符串。
    pub fn to_stored(&self) -> String {
        self.0.map(|secs| secs.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for SecondsPerRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stored())
    }
}

pub trait SettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage` 持久化。
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn open() -> Result<Self, SettingsError> {
        let window = web_sys::window().ok_or(SettingsError::StorageUnavailable)?;
        let storage = window
            .local_storage()
            .map_err(|_| SettingsError::StorageUnavailable)?
            .ok_or(SettingsError::StorageUnavailable)?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
fn js_message(value: wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(target_arch = "wasm32")]
impl SettingsStore for LocalStorageStore {
    fn load(&self, key: &str) -> Result<Option<String>, SettingsError> {
        self.storage
            .get_item(key)
            .map_err(|err| SettingsError::ReadFailed {
                message: js_message(err),
            })
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| SettingsError::WriteFailed {
                message: js_message(err),
            })
    }
}

/// 读取上次的设置，用本次输入（若有）覆盖，规范化后立即写回。
/// 存储出错只记录警告，不影响结果。
pub fn load_and_persist<S>(store: &mut S, answer: Option<&str>) -> SecondsPerRound
where
    S: SettingsStore + ?Sized,
{
    let stored = store.load(SECONDS_KEY).unwrap_or_else(|error| {
        utils::warn(&error.to_string());
        None
    });
    let raw = answer.map(str::to_string).or(stored).unwrap_or_default();
    let seconds = SecondsPerRound::parse(&raw);
    if let Err(error) = store.save(SECONDS_KEY, &seconds.to_stored()) {
        utils::warn(&error.to_string());
    }
    seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>, SettingsError> {
            Err(SettingsError::StorageUnavailable)
        }

        fn save(&mut self, _key: &str, value: &str) -> Result<(), SettingsError> {
            Err(SettingsError::WriteFailed {
                message: value.to_string(),
            })
        }
    }

    #[test]
    fn parse_accepts_leading_integers() {
        assert_eq!(SecondsPerRound::parse("10").get(), Some(10));
        assert_eq!(SecondsPerRound::parse("  7s").get(), Some(7));
        assert_eq!(SecondsPerRound::parse("3.9").get(), Some(3));
        assert_eq!(SecondsPerRound::parse("+4").get(), Some(4));
    }

    #[test]
    fn parse_reads_hex_prefix_like_parse_int() {
        assert_eq!(SecondsPerRound::parse("0x10").get(), Some(16));
        assert_eq!(SecondsPerRound::parse("0XfZ").get(), Some(15));
        assert_eq!(SecondsPerRound::parse("010").get(), Some(10));
        assert!(SecondsPerRound::parse("0x").is_unbounded());
        assert!(SecondsPerRound::parse("-0x5").is_unbounded());
    }

    #[test]
    fn parse_normalizes_bad_input_to_no_timer() {
        for input in ["", "abc", "0", "-5", "   ", "-"] {
            assert!(
                SecondsPerRound::parse(input).is_unbounded(),
                "{input:?} should mean no timer"
            );
        }
    }

    #[test]
    fn parse_saturates_huge_numbers() {
        assert_eq!(
            SecondsPerRound::parse("99999999999999999999").get(),
            Some(u32::MAX)
        );
    }

    #[test]
    fn answer_overrides_stored_value_and_is_written_back() {
        let mut store = MemoryStore::new();
        store.save(SECONDS_KEY, "8").expect("memory store never fails");

        let seconds = load_and_persist(&mut store, Some("12"));

        assert_eq!(seconds.get(), Some(12));
        assert_eq!(store.load(SECONDS_KEY), Ok(Some("12".to_string())));
    }

    #[test]
    fn stored_value_is_the_default() {
        let mut store = MemoryStore::new();
        store.save(SECONDS_KEY, "6").expect("memory store never fails");

        assert_eq!(load_and_persist(&mut store, None).get(), Some(6));
    }

    #[test]
    fn unbounded_is_stored_as_empty_string() {
        let mut store = MemoryStore::new();

        let seconds = load_and_persist(&mut store, Some("nope"));

        assert!(seconds.is_unbounded());
        assert_eq!(store.load(SECONDS_KEY), Ok(Some(String::new())));
    }

    #[test]
    fn broken_storage_is_not_fatal() {
        let mut store = BrokenStore;

        assert_eq!(load_and_persist(&mut store, Some("9")).get(), Some(9));
        assert!(load_and_persist(&mut store, None).is_unbounded());
    }
}
