//! 音声管理モジュール
//!
//! `HtmlAudioElement` をIDで管理する音声トラックの再生管理器です。
//! トラックごとの音量はマスター音量と掛け合わされ、マスター音量の
//! 変更は全トラックへ即時反映されます。

use std::collections::HashMap;

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

/// 音声トラックの読み込みオプション
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioTrackOptions {
    /// トラック音量（0.0〜1.0）
    pub volume: f64,
    /// ループ再生するかどうか
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for AudioTrackOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: false,
        }
    }
}

/// トラック音量とマスター音量から実際の音量を計算
pub fn effective_volume(track_volume: f64, master_volume: f64) -> f64 {
    (track_volume * master_volume).clamp(0.0, 1.0)
}

struct AudioTrack {
    element: HtmlAudioElement,
    volume: f64,
}

/// 音声管理器
#[wasm_bindgen]
pub struct AudioManager {
    tracks: HashMap<String, AudioTrack>,
    master_volume: f64,
}

#[wasm_bindgen]
impl AudioManager {
    /// 新しい音声管理器を作成
    #[wasm_bindgen(constructor)]
    pub fn new() -> AudioManager {
        AudioManager {
            tracks: HashMap::new(),
            master_volume: 1.0,
        }
    }

    /// トラックを読み込む
    ///
    /// 同じIDのトラックが既にある場合は置き換えます。オプションは
    /// camelCaseのJSON文字列で渡します。
    pub fn load_track(
        &mut self,
        id: &str,
        src: &str,
        options_json: Option<String>,
    ) -> Result<(), JsValue> {
        let options: AudioTrackOptions = match options_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| JsValue::from_str(&format!("invalid audio options: {}", err)))?,
            None => AudioTrackOptions::default(),
        };

        let element = HtmlAudioElement::new_with_src(src)?;
        element.set_loop(options.looping);
        element.set_volume(effective_volume(options.volume, self.master_volume));
        element.set_preload("auto");

        log::debug!("音声トラックを読み込み: {} ({})", id, src);
        self.tracks.insert(
            id.to_string(),
            AudioTrack {
                element,
                volume: options.volume,
            },
        );
        Ok(())
    }

    /// トラックを再生
    pub fn play(&self, id: &str) -> bool {
        let Some(track) = self.tracks.get(id) else {
            log::warn!("音声トラックが見つかりません: {}", id);
            return false;
        };
        match track.element.play() {
            Ok(_promise) => true,
            Err(err) => {
                log::warn!("音声の再生に失敗: {} ({:?})", id, err);
                false
            }
        }
    }

    /// トラックを一時停止
    pub fn pause(&self, id: &str) -> bool {
        let Some(track) = self.tracks.get(id) else {
            return false;
        };
        track.element.pause().is_ok()
    }

    /// トラックを停止（先頭へ巻き戻す）
    pub fn stop(&self, id: &str) -> bool {
        let Some(track) = self.tracks.get(id) else {
            return false;
        };
        let paused = track.element.pause().is_ok();
        track.element.set_current_time(0.0);
        paused
    }

    /// 再生位置を変更（秒単位）
    pub fn seek(&self, id: &str, seconds: f64) -> bool {
        let Some(track) = self.tracks.get(id) else {
            return false;
        };
        track.element.set_current_time(seconds.max(0.0));
        true
    }

    /// トラック音量を設定
    pub fn set_volume(&mut self, id: &str, volume: f64) -> bool {
        let master_volume = self.master_volume;
        let Some(track) = self.tracks.get_mut(id) else {
            return false;
        };
        track.volume = volume;
        track
            .element
            .set_volume(effective_volume(volume, master_volume));
        true
    }

    /// マスター音量を設定（全トラックへ即時反映）
    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
        for track in self.tracks.values() {
            track
                .element
                .set_volume(effective_volume(track.volume, self.master_volume));
        }
    }

    /// マスター音量を取得
    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    /// 再生中かどうかを確認
    pub fn is_playing(&self, id: &str) -> bool {
        self.tracks
            .get(id)
            .map(|track| !track.element.paused() && !track.element.ended())
            .unwrap_or(false)
    }

    /// トラックの長さ（秒）を取得
    pub fn duration(&self, id: &str) -> Option<f64> {
        self.tracks.get(id).map(|track| track.element.duration())
    }

    /// トラックを除去
    pub fn remove_track(&mut self, id: &str) -> bool {
        if let Some(track) = self.tracks.remove(id) {
            let _ = track.element.pause();
            true
        } else {
            false
        }
    }

    /// 登録済みトラックのID一覧を取得
    pub fn track_ids(&self) -> js_sys::Array {
        self.tracks
            .keys()
            .map(|id| JsValue::from_str(id))
            .collect()
    }

    /// 登録済みトラック数を取得
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_loop_keyword() {
        let options: AudioTrackOptions =
            serde_json::from_str(r#"{"volume":0.5,"loop":true}"#).unwrap();
        assert_eq!(options.volume, 0.5);
        assert!(options.looping);

        let defaults: AudioTrackOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.volume, 1.0);
        assert!(!defaults.looping);
    }

    #[test]
    fn effective_volume_is_clamped_product() {
        assert_eq!(effective_volume(0.5, 0.5), 0.25);
        assert_eq!(effective_volume(2.0, 1.0), 1.0);
        assert_eq!(effective_volume(-1.0, 1.0), 0.0);
    }
}
