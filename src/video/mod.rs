//! 動画再生モジュール
//!
//! `HtmlVideoElement` をIDで管理し、現在のフレームを描画サーフェスへ
//! 描き込む動画プレイヤーです。描画先の矩形とフィットモード
//! （contain / cover / fill）は読み込み時に指定します。

use std::collections::HashMap;

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlVideoElement;

use crate::canvas::coords;
use crate::CanvasApp;

/// 動画の描画フィットモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFit {
    /// アスペクト比を保ち、矩形に収まる最大サイズで中央寄せ
    Contain,
    /// アスペクト比を保ち、矩形を覆う最小サイズで中央寄せ
    Cover,
    /// 矩形いっぱいに引き伸ばす
    Fill,
}

impl VideoFit {
    /// 名前からフィットモードを解決（未知の値はcontain）
    pub fn from_name(name: &str) -> VideoFit {
        match name {
            "cover" => VideoFit::Cover,
            "fill" => VideoFit::Fill,
            _ => VideoFit::Contain,
        }
    }
}

/// フィットモードに従って描画矩形を計算
///
/// # 引数
///
/// * `video_size` - 動画の自然サイズ (width, height)
/// * `target` - 描画先矩形 (x, y, width, height)（サーフェス座標）
pub fn fit_rect(
    fit: VideoFit,
    video_size: (f64, f64),
    target: (f64, f64, f64, f64),
) -> (f64, f64, f64, f64) {
    let (video_width, video_height) = video_size;
    if video_width <= 0.0 || video_height <= 0.0 {
        return target;
    }

    let (target_x, target_y, target_width, target_height) = target;
    match fit {
        VideoFit::Fill => target,
        VideoFit::Contain | VideoFit::Cover => {
            let scale_x = target_width / video_width;
            let scale_y = target_height / video_height;
            let scale = if fit == VideoFit::Contain {
                scale_x.min(scale_y)
            } else {
                scale_x.max(scale_y)
            };
            let width = video_width * scale;
            let height = video_height * scale;
            (
                target_x + (target_width - width) / 2.0,
                target_y + (target_height - height) / 2.0,
                width,
                height,
            )
        }
    }
}

/// 動画の読み込みオプション
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoOptions {
    /// 描画先矩形の左下X座標（ワールド座標）
    pub x: f64,
    /// 描画先矩形の左下Y座標（ワールド座標）
    pub y: f64,
    /// 描画先矩形の幅（省略時はサーフェス全体）
    pub width: Option<f64>,
    /// 描画先矩形の高さ（省略時はサーフェス全体）
    pub height: Option<f64>,
    /// ループ再生するかどうか
    #[serde(rename = "loop")]
    pub looping: bool,
    /// 音量（0.0〜1.0）
    pub volume: f64,
    /// 再生速度
    pub playback_rate: f64,
    /// ミュートするかどうか
    pub muted: bool,
    /// フィットモード名（contain / cover / fill）
    pub fit: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            looping: false,
            volume: 1.0,
            playback_rate: 1.0,
            muted: false,
            fit: "contain".to_string(),
        }
    }
}

struct VideoEntry {
    element: HtmlVideoElement,
    x: f64,
    y: f64,
    width: Option<f64>,
    height: Option<f64>,
    fit: VideoFit,
}

/// 動画管理器
#[wasm_bindgen]
pub struct VideoManager {
    videos: HashMap<String, VideoEntry>,
}

#[wasm_bindgen]
impl VideoManager {
    /// 新しい動画管理器を作成
    #[wasm_bindgen(constructor)]
    pub fn new() -> VideoManager {
        VideoManager {
            videos: HashMap::new(),
        }
    }

    /// 動画を読み込む
    ///
    /// 同じIDの動画が既にある場合は置き換えます。
    pub fn load_video(
        &mut self,
        id: &str,
        src: &str,
        options_json: Option<String>,
    ) -> Result<(), JsValue> {
        let options: VideoOptions = match options_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| JsValue::from_str(&format!("invalid video options: {}", err)))?,
            None => VideoOptions::default(),
        };

        let document = web_sys::window()
            .ok_or_else(|| JsValue::from_str("window not available"))?
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        let element = document
            .create_element("video")?
            .dyn_into::<HtmlVideoElement>()?;

        element.set_src(src);
        element.set_loop(options.looping);
        element.set_volume(options.volume.clamp(0.0, 1.0));
        element.set_playback_rate(options.playback_rate);
        element.set_muted(options.muted);
        element.set_preload("auto");

        if self.videos.contains_key(id) {
            self.unload_video(id);
        }

        log::debug!("動画を読み込み: {} ({})", id, src);
        self.videos.insert(
            id.to_string(),
            VideoEntry {
                element,
                x: options.x,
                y: options.y,
                width: options.width,
                height: options.height,
                fit: VideoFit::from_name(&options.fit),
            },
        );
        Ok(())
    }

    /// 動画を再生
    pub fn play(&self, id: &str) -> bool {
        let Some(entry) = self.videos.get(id) else {
            log::warn!("動画が見つかりません: {}", id);
            return false;
        };
        match entry.element.play() {
            Ok(_promise) => true,
            Err(err) => {
                log::warn!("動画の再生に失敗: {} ({:?})", id, err);
                false
            }
        }
    }

    /// 動画を一時停止
    pub fn pause(&self, id: &str) -> bool {
        let Some(entry) = self.videos.get(id) else {
            return false;
        };
        entry.element.pause().is_ok()
    }

    /// 再生位置を変更（秒単位）
    pub fn seek(&self, id: &str, seconds: f64) -> bool {
        let Some(entry) = self.videos.get(id) else {
            return false;
        };
        entry.element.set_current_time(seconds.max(0.0));
        true
    }

    /// 音量を設定
    pub fn set_volume(&self, id: &str, volume: f64) -> bool {
        let Some(entry) = self.videos.get(id) else {
            return false;
        };
        entry.element.set_volume(volume.clamp(0.0, 1.0));
        true
    }

    /// 再生中かどうかを確認
    pub fn is_playing(&self, id: &str) -> bool {
        self.videos
            .get(id)
            .map(|entry| !entry.element.paused() && !entry.element.ended())
            .unwrap_or(false)
    }

    /// 動画を破棄
    pub fn unload_video(&mut self, id: &str) -> bool {
        if let Some(entry) = self.videos.remove(id) {
            let _ = entry.element.pause();
            entry.element.set_src("");
            true
        } else {
            false
        }
    }

    /// 現在のフレームをサーフェスへ描画
    ///
    /// 描画先矩形は読み込み時のオプションで決まり、省略時は
    /// サーフェス全体です。
    pub fn draw_frame(&self, app: &CanvasApp, id: &str) -> bool {
        let Some(entry) = self.videos.get(id) else {
            log::error!("動画が未ロードまたは存在しません: {}", id);
            return false;
        };

        app.with_surface(|surface| {
            let target_width = entry.width.unwrap_or_else(|| surface.width());
            let target_height = entry.height.unwrap_or_else(|| surface.height());
            let surface_y = coords::world_to_surface_y(surface.height(), entry.y, target_height);

            let video_size = (
                f64::from(entry.element.video_width()),
                f64::from(entry.element.video_height()),
            );
            let (dx, dy, dw, dh) = fit_rect(
                entry.fit,
                video_size,
                (entry.x, surface_y, target_width, target_height),
            );

            if let Err(err) = surface
                .context()
                .draw_image_with_html_video_element_and_dw_and_dh(&entry.element, dx, dy, dw, dh)
            {
                log::warn!("動画フレームの描画に失敗: {} ({:?})", id, err);
                return false;
            }
            true
        })
    }

    /// 登録済み動画のID一覧を取得
    pub fn video_ids(&self) -> js_sys::Array {
        self.videos
            .keys()
            .map(|id| JsValue::from_str(id))
            .collect()
    }
}

impl Default for VideoManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_letterboxes_and_centers() {
        // 16:9の動画を正方形へcontain
        let rect = fit_rect(VideoFit::Contain, (1600.0, 900.0), (0.0, 0.0, 400.0, 400.0));
        assert_eq!(rect, (0.0, 87.5, 400.0, 225.0));
    }

    #[test]
    fn cover_fills_and_crops() {
        let rect = fit_rect(VideoFit::Cover, (1600.0, 900.0), (0.0, 0.0, 400.0, 400.0));
        let (x, y, width, height) = rect;
        assert_eq!(height, 400.0);
        assert!((width - 711.11).abs() < 0.01);
        assert!(x < 0.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn fill_stretches_to_target() {
        let target = (10.0, 20.0, 300.0, 200.0);
        assert_eq!(fit_rect(VideoFit::Fill, (640.0, 480.0), target), target);
    }

    #[test]
    fn degenerate_video_size_falls_back_to_target() {
        let target = (0.0, 0.0, 100.0, 100.0);
        assert_eq!(fit_rect(VideoFit::Contain, (0.0, 0.0), target), target);
    }

    #[test]
    fn fit_mode_parses_from_name() {
        assert_eq!(VideoFit::from_name("cover"), VideoFit::Cover);
        assert_eq!(VideoFit::from_name("fill"), VideoFit::Fill);
        assert_eq!(VideoFit::from_name("contain"), VideoFit::Contain);
        assert_eq!(VideoFit::from_name("unknown"), VideoFit::Contain);
    }

    #[test]
    fn video_options_parse_from_camel_case_json() {
        let options: VideoOptions = serde_json::from_str(
            r#"{"x":10.0,"y":20.0,"width":320.0,"loop":true,"playbackRate":1.5,"fit":"cover"}"#,
        )
        .unwrap();
        assert_eq!(options.x, 10.0);
        assert_eq!(options.width, Some(320.0));
        assert!(options.looping);
        assert_eq!(options.playback_rate, 1.5);
        assert_eq!(options.fit, "cover");
    }
}
