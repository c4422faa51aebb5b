//! 快照与偏好设置 - 业务能力层
//!
//! 存储是一个简单的键值接口，值为无版本号的 JSON。
//! 读取时尽量多恢复：元信息坏了用默认值，单道题坏了只丢这一道。

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::models::paper::PaperMetadata;
use crate::models::question::QuestionEntity;
use crate::models::snapshot::{PaperSnapshot, Preferences};

pub const SNAPSHOT_KEY: &str = "exam_composer.snapshot";
pub const PREFERENCES_KEY: &str = "exam_composer.preferences";

/// 键值存储
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// 每个键一个 `<dir>/<key>.json` 文件
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_of(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::ReadFailed {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let write_err = |source| PersistenceError::WriteFailed {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        fs::write(self.path_of(key), value).map_err(write_err)
    }
}

/// 内存存储（测试用）
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.lock().ok().and_then(|v| v.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// 读取快照的结果
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot: PaperSnapshot,
    /// 没有保存过快照
    pub fresh: bool,
    /// 快照有损坏，部分或全部回退到默认值
    pub fell_back: bool,
    /// 无法解析而被丢弃的题目数
    pub dropped_questions: usize,
}

impl LoadedSnapshot {
    fn empty(fresh: bool) -> Self {
        Self {
            snapshot: PaperSnapshot::new(PaperMetadata::default(), Vec::new()),
            fresh,
            fell_back: !fresh,
            dropped_questions: 0,
        }
    }
}

pub struct SnapshotService<S> {
    store: S,
}

impl<S: KeyValueStore> SnapshotService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 读取快照，任何损坏都不会报错
    pub fn load_snapshot(&self) -> LoadedSnapshot {
        let raw = match self.store.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("没有已保存的快照");
                return LoadedSnapshot::empty(true);
            }
            Err(e) => {
                warn!("⚠️ 读取快照失败，使用默认值: {}", e);
                return LoadedSnapshot::empty(false);
            }
        };

        let value: JsonValue = match serde_json::from_str(&raw) {
            Ok(JsonValue::Object(map)) => JsonValue::Object(map),
            Ok(_) | Err(_) => {
                warn!("⚠️ 快照不是合法的 JSON 对象，使用默认值");
                return LoadedSnapshot::empty(false);
            }
        };

        let mut fell_back = false;
        let metadata = match value.get("metadata").cloned().map(serde_json::from_value::<PaperMetadata>) {
            Some(Ok(metadata)) => metadata,
            _ => {
                warn!("⚠️ 快照中的试卷信息无法解析，使用默认值");
                fell_back = true;
                PaperMetadata::default()
            }
        };

        let items = match value.get("finalQuestionList") {
            Some(JsonValue::Array(items)) => items.clone(),
            None => Vec::new(),
            Some(_) => {
                fell_back = true;
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(items.len());
        let mut dropped = 0;
        for item in items {
            match serde_json::from_value::<QuestionEntity>(item) {
                Ok(mut question) if seen.insert(question.id.clone()) => {
                    question.normalize_marks();
                    questions.push(question);
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!("⚠️ 快照中有 {} 道题无法恢复，已丢弃", dropped);
            fell_back = true;
        }

        let timestamp = value
            .get("timestamp")
            .cloned()
            .and_then(|t| serde_json::from_value(t).ok())
            .unwrap_or_else(chrono::Utc::now);

        info!("📂 已恢复快照: {} 道题", questions.len());
        LoadedSnapshot {
            snapshot: PaperSnapshot {
                metadata,
                final_question_list: questions,
                timestamp,
            },
            fresh: false,
            fell_back,
            dropped_questions: dropped,
        }
    }

    /// 保存快照（仅在显式保存时调用）
    pub fn save_snapshot(&self, metadata: &PaperMetadata, questions: &[QuestionEntity]) -> Result<(), PersistenceError> {
        let snapshot = PaperSnapshot::new(metadata.clone(), questions.to_vec());
        let json = serde_json::to_string_pretty(&snapshot)?;
        self.store.set(SNAPSHOT_KEY, &json)?;
        info!("💾 快照已保存: {} 道题", questions.len());
        Ok(())
    }

    pub fn load_preferences(&self) -> Preferences {
        match self.store.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("⚠️ 偏好设置无法解析，使用默认值: {}", e);
                Preferences::default()
            }),
            Ok(None) => Preferences::default(),
            Err(e) => {
                warn!("⚠️ 读取偏好设置失败: {}", e);
                Preferences::default()
            }
        }
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(preferences)?;
        self.store.set(PREFERENCES_KEY, &json)
    }
}
