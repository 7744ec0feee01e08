//! 画像キャッシュモジュール
//!
//! パスから読み込んだ画像をIDで管理し、描画サーフェスへの描画を
//! 提供します。読み込みは`HtmlImageElement`のデコード完了を待つ
//! 非同期処理です。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::canvas::coords;

/// 画像描画オプション
///
/// JavaScript側からはcamelCaseのJSONとして渡されます。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageDrawOptions {
    /// 描画幅（省略時は画像の自然サイズ）
    pub width: Option<f64>,
    /// 描画高さ（省略時は画像の自然サイズ）
    pub height: Option<f64>,
    /// 回転角（ラジアン、描画中心まわり）
    pub rotation: f64,
    /// 不透明度（0.0〜1.0）
    pub alpha: f64,
    /// X方向反転
    pub flip_x: bool,
    /// Y方向反転
    pub flip_y: bool,
    /// 回転中心のX座標（サーフェス座標、省略時は描画矩形の中心）
    pub center_x: Option<f64>,
    /// 回転中心のY座標（サーフェス座標、省略時は描画矩形の中心）
    pub center_y: Option<f64>,
}

impl Default for ImageDrawOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            rotation: 0.0,
            alpha: 1.0,
            flip_x: false,
            flip_y: false,
            center_x: None,
            center_y: None,
        }
    }
}

/// 読み込み済み画像の情報
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// 画像ID
    pub id: String,
    /// 読み込み元パス
    pub path: String,
    /// 自然幅（ピクセル）
    pub width: f64,
    /// 自然高さ（ピクセル）
    pub height: f64,
}

/// キャッシュ上の1エントリ
pub struct ImageEntry {
    id: String,
    path: String,
    element: HtmlImageElement,
    width: f64,
    height: f64,
}

impl ImageEntry {
    /// パスから画像を読み込む（デコード完了まで待つ）
    pub async fn load(path: &str, id: &str) -> Result<ImageEntry, JsValue> {
        let element = HtmlImageElement::new()?;
        element.set_cross_origin(Some("anonymous"));
        element.set_src(path);

        JsFuture::from(element.decode())
            .await
            .map_err(|err| {
                log::error!("画像の読み込みに失敗: {}", path);
                err
            })?;

        Ok(ImageEntry {
            id: id.to_string(),
            path: path.to_string(),
            width: element.natural_width() as f64,
            height: element.natural_height() as f64,
            element,
        })
    }

    /// 画像IDを取得
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 画像情報を取得
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            id: self.id.clone(),
            path: self.path.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

/// 画像キャッシュ
pub struct ImageCache {
    images: HashMap<String, ImageEntry>,
}

impl ImageCache {
    /// 新しい画像キャッシュを作成
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
        }
    }

    /// 読み込み済みエントリを登録
    pub fn insert(&mut self, entry: ImageEntry) {
        log::debug!(
            "画像をキャッシュ: {} ({}x{})",
            entry.id,
            entry.width,
            entry.height
        );
        self.images.insert(entry.id.clone(), entry);
    }

    /// IDの画像がキャッシュ済みかどうか
    pub fn contains(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }

    /// 画像情報を取得
    pub fn info(&self, id: &str) -> Option<ImageInfo> {
        self.images.get(id).map(ImageEntry::info)
    }

    /// 画像をキャッシュから除去
    pub fn remove(&mut self, id: &str) -> bool {
        self.images.remove(id).is_some()
    }

    /// キャッシュを空にする
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// 読み込み済みの画像ID一覧を取得
    pub fn ids(&self) -> Vec<String> {
        self.images.keys().cloned().collect()
    }

    /// 画像を描画
    ///
    /// `(x, y)` は左下原点のワールド座標で、内部でサーフェス座標へ
    /// 変換されます。未ロードのIDを指定した場合は診断を出して
    /// falseを返します。
    pub fn draw(
        &self,
        context: &CanvasRenderingContext2d,
        surface_height: f64,
        id: &str,
        x: f64,
        y: f64,
        options: &ImageDrawOptions,
    ) -> bool {
        let Some(entry) = self.images.get(id) else {
            log::error!("画像が未ロードまたは存在しません: {}", id);
            return false;
        };

        let width = options.width.unwrap_or(entry.width);
        let height = options.height.unwrap_or(entry.height);
        let surface_y = coords::world_to_surface_y(surface_height, y, height);

        let center_x = options.center_x.unwrap_or(x + width / 2.0);
        let center_y = options.center_y.unwrap_or(surface_y + height / 2.0);

        context.save();
        context.set_global_alpha(options.alpha);

        let _ = context.translate(center_x, center_y);
        if options.rotation != 0.0 {
            let _ = context.rotate(options.rotation);
        }
        if options.flip_x || options.flip_y {
            let _ = context.scale(
                if options.flip_x { -1.0 } else { 1.0 },
                if options.flip_y { -1.0 } else { 1.0 },
            );
        }

        if let Err(err) = context.draw_image_with_html_image_element_and_dw_and_dh(
            &entry.element,
            -width / 2.0,
            -height / 2.0,
            width,
            height,
        ) {
            log::warn!("画像の描画に失敗: {} ({:?})", id, err);
        }

        context.restore();
        true
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_options_parse_from_camel_case_json() {
        let options: ImageDrawOptions = serde_json::from_str(
            r#"{"width":64.0,"height":32.0,"rotation":1.5,"alpha":0.5,"flipX":true}"#,
        )
        .unwrap();
        assert_eq!(options.width, Some(64.0));
        assert_eq!(options.height, Some(32.0));
        assert_eq!(options.rotation, 1.5);
        assert_eq!(options.alpha, 0.5);
        assert!(options.flip_x);
        assert!(!options.flip_y);
    }

    #[test]
    fn default_options_draw_at_natural_size() {
        let options = ImageDrawOptions::default();
        assert!(options.width.is_none());
        assert_eq!(options.alpha, 1.0);
        assert_eq!(options.rotation, 0.0);
    }
}
