//! ルームのゲーム設定
//!
//! 既知のキー（プレイリスト・再生時間など）は型付きのフィールドで持ち、
//! 未知のキーは `extra` にそのまま保持します（クライアント側の拡張用）。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ゲーム設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// 出題に使うプレイリスト
    pub playlist: String,
    /// 1 曲あたりの再生時間（秒）
    pub clip_duration: u32,
    /// 曲のどの部分を再生するか（"refrain" など）
    pub clip_moment: String,
    /// 誤答後にブザーを無効化する時間（秒）
    pub buzzer_off_duration: u32,
    /// バズ時に音楽を止めるか
    pub cut_music_after_buzz: bool,
    /// 未知のキー
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            playlist: "Pop".to_string(),
            clip_duration: 15,
            clip_moment: "refrain".to_string(),
            buzzer_off_duration: 3,
            cut_music_after_buzz: true,
            extra: Map::new(),
        }
    }
}

impl GameConfig {
    /// パッチを浅くマージする
    ///
    /// 既知のキーは型に変換できた場合のみ上書きします（数値は `15` と `"15"` の両方を受け付ける）。
    /// 変換できない値は無視し、そのキーの名前を返します。未知のキーは `extra` に上書き保存します。
    pub fn merge(&mut self, patch: Map<String, Value>) -> Vec<String> {
        let mut rejected = Vec::new();
        for (key, value) in patch {
            let applied = match key.as_str() {
                "playlist" => as_string(&value).map(|v| self.playlist = v).is_some(),
                "clipDuration" => as_u32(&value).map(|v| self.clip_duration = v).is_some(),
                "clipMoment" => as_string(&value).map(|v| self.clip_moment = v).is_some(),
                "buzzerOffDuration" => as_u32(&value)
                    .map(|v| self.buzzer_off_duration = v)
                    .is_some(),
                "cutMusicAfterBuzz" => as_bool(&value)
                    .map(|v| self.cut_music_after_buzz = v)
                    .is_some(),
                _ => {
                    self.extra.insert(key.clone(), value);
                    true
                }
            };
            if !applied {
                rejected.push(key);
            }
        }
        rejected
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
