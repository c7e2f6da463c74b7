//! 历史得分的持久化：单一键名下的 JSON 整数数组。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;
use web_sys::Storage;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum StorageError {
    #[error("score storage unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("stored scores are not a JSON integer array: {reason}")]
    Corrupt { reason: String },
    #[error("failed to write scores: {reason}")]
    Write { reason: String },
}

/// 历史得分存储。读取时缺少键等同于空列表；写入总是整体覆盖。
pub trait ScoreStore {
    fn load(&self) -> Result<Vec<i32>, StorageError>;
    fn save(&mut self, scores: &[i32]) -> Result<(), StorageError>;
}

pub fn encode_history(scores: &[i32]) -> Result<String, StorageError> {
    serde_json::to_string(scores).map_err(|err| StorageError::Write {
        reason: err.to_string(),
    })
}

pub fn decode_history(raw: Option<&str>) -> Result<Vec<i32>, StorageError> {
    match raw {
        None => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).map_err(|err| StorageError::Corrupt {
            reason: err.to_string(),
        }),
    }
}

/// 进程内存储，克隆后共享同一份数据。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Rc<RefCell<Option<String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        let store = Self::default();
        *store.raw.borrow_mut() = Some(raw.into());
        store
    }

    /// 当前保存的原始 JSON 文本。
    pub fn raw(&self) -> Option<String> {
        self.raw.borrow().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<Vec<i32>, StorageError> {
        decode_history(self.raw.borrow().as_deref())
    }

    fn save(&mut self, scores: &[i32]) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::Write {
                reason: "writes disabled".into(),
            });
        }
        let json = encode_history(scores)?;
        *self.raw.borrow_mut() = Some(json);
        Ok(())
    }
}

/// 浏览器 `localStorage` 存储。
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

fn js_reason(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Result<Storage, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable {
            reason: "no window".into(),
        })?;
        window
            .local_storage()
            .map_err(|err| StorageError::Unavailable {
                reason: js_reason(err),
            })?
            .ok_or_else(|| StorageError::Unavailable {
                reason: "localStorage disabled".into(),
            })
    }
}

impl ScoreStore for LocalStorageStore {
    fn load(&self) -> Result<Vec<i32>, StorageError> {
        let raw = self
            .storage()?
            .get_item(&self.key)
            .map_err(|err| StorageError::Unavailable {
                reason: js_reason(err),
            })?;
        decode_history(raw.as_deref())
    }

    fn save(&mut self, scores: &[i32]) -> Result<(), StorageError> {
        let json = encode_history(scores)?;
        self.storage()?
            .set_item(&self.key, &json)
            .map_err(|err| StorageError::Write {
                reason: js_reason(err),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_uses_plain_json_array() {
        let json = encode_history(&[3, 7, -1, 5]).expect("encodes");
        assert_eq!(json, "[3,7,-1,5]");
        assert_eq!(
            decode_history(Some("[3, 7, -1, 5]")).expect("decodes"),
            vec![3, 7, -1, 5]
        );
    }

    #[test]
    fn missing_key_is_empty_history() {
        assert_eq!(decode_history(None), Ok(Vec::new()));
        assert_eq!(MemoryStore::new().load(), Ok(Vec::new()));
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let store = MemoryStore::with_raw("{\"not\": \"scores\"}");
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn memory_store_clones_share_data() {
        let observer = MemoryStore::new();
        let mut writer = observer.clone();
        writer.save(&[1, 2]).expect("save succeeds");
        assert_eq!(observer.raw().as_deref(), Some("[1,2]"));
        assert_eq!(observer.load(), Ok(vec![1, 2]));

        observer.set_fail_writes(true);
        assert!(matches!(
            writer.save(&[1, 2, 3]),
            Err(StorageError::Write { .. })
        ));
        assert_eq!(observer.load(), Ok(vec![1, 2]));
    }
}
