//! 描画サーフェスモジュール
//!
//! このモジュールは、HTMLのcanvas要素とその2Dコンテキストを包む
//! 描画サーフェスを提供します。canvasの生成・既存要素への接続・
//! 破棄、矩形・円・テキストの描画プリミティブ、画像キャッシュの
//! 所有を担当します。
//!
//! 描画の失敗は致命的ではありません: 診断ログを出して呼び出しは
//! 何もしない操作になり、フレームループは動き続けます。

pub mod coords;
pub mod image;

pub use image::{ImageCache, ImageDrawOptions, ImageInfo};

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

/// 図形描画スタイル
#[derive(Debug, Clone)]
pub struct ShapeStyle {
    /// 塗りつぶし色（Noneなら塗りつぶしなし）
    pub fill_color: Option<String>,
    /// 線の色（Noneなら輪郭線なし）
    pub stroke_color: Option<String>,
    /// 線の太さ
    pub line_width: f64,
    /// 破線パターン（空なら実線）
    pub line_dash: Vec<f64>,
    /// 不透明度（0.0〜1.0）
    pub alpha: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: Some("#000000".to_string()),
            stroke_color: None,
            line_width: 1.0,
            line_dash: Vec::new(),
            alpha: 1.0,
        }
    }
}

/// テキスト描画スタイル
#[derive(Debug, Clone)]
pub struct TextStyle {
    /// フォント指定（CSSのfont値）
    pub font: String,
    /// 塗りつぶし色
    pub fill_color: Option<String>,
    /// 縁取り色
    pub stroke_color: Option<String>,
    /// 縁取りの太さ
    pub line_width: f64,
    /// 水平方向の揃え
    pub text_align: String,
    /// 垂直方向の基準線
    pub text_baseline: String,
    /// 不透明度（0.0〜1.0）
    pub alpha: f64,
    /// 回転角（ラジアン）
    pub rotation: f64,
    /// 最大描画幅
    pub max_width: Option<f64>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: "16px Arial".to_string(),
            fill_color: Some("#000000".to_string()),
            stroke_color: None,
            line_width: 1.0,
            text_align: "left".to_string(),
            text_baseline: "top".to_string(),
            alpha: 1.0,
            rotation: 0.0,
            max_width: None,
        }
    }
}

/// サーフェス生成設定
///
/// JavaScript側からはcamelCaseのJSONとして渡されます。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceConfig {
    /// 内部解像度の幅
    pub width: u32,
    /// 内部解像度の高さ
    pub height: u32,
    /// canvas要素のID
    pub id: String,
    /// 背景色
    pub background_color: String,
    /// 枠線のCSS指定
    pub border: String,
    /// マージンのCSS指定
    pub margin: String,
    /// 追加先コンテナ要素のID（省略時はbody）
    pub container: Option<String>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            id: "canvas-kit-surface".to_string(),
            background_color: "#ffffff".to_string(),
            border: "1px solid #ccc".to_string(),
            margin: "20px auto".to_string(),
            container: None,
        }
    }
}

/// フォント指定からピクセルサイズを推定
///
/// `"16px Arial"` のような先頭の数値を読み取ります。読み取れない
/// 場合は16を返します（テキスト高さの簡易推定用）。
pub fn font_px_size(font: &str) -> f64 {
    font.split_whitespace()
        .next()
        .and_then(|token| token.trim_end_matches("px").parse::<f64>().ok())
        .unwrap_or(16.0)
}

/// 描画サーフェス
///
/// canvas要素と2Dコンテキスト、画像キャッシュを所有します。
pub struct Surface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    images: ImageCache,
}

impl Surface {
    /// 既定の設定でcanvasを生成してサーフェスを作成
    pub fn create() -> Result<Surface, JsValue> {
        Self::create_with(SurfaceConfig::default())
    }

    /// 設定を指定してcanvasを生成
    ///
    /// 同じIDのcanvasが既にある場合は置き換えます。
    pub fn create_with(config: SurfaceConfig) -> Result<Surface, JsValue> {
        let document = Self::document()?;

        if let Some(existing) = document.get_element_by_id(&config.id) {
            log::warn!("canvas {} は既に存在するため置き換えます", config.id);
            existing.remove();
        }

        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        canvas.set_id(&config.id);
        canvas.set_width(config.width);
        canvas.set_height(config.height);

        let style = canvas.style();
        style.set_property("border", &config.border)?;
        style.set_property("display", "block")?;
        style.set_property("margin", &config.margin)?;
        style.set_property("background-color", &config.background_color)?;

        let parent = match config.container.as_deref() {
            Some(container_id) => match document.get_element_by_id(container_id) {
                Some(element) => element,
                None => {
                    log::error!("コンテナ要素が見つかりません: {}", container_id);
                    document
                        .body()
                        .ok_or_else(|| JsValue::from_str("body not available"))?
                        .into()
                }
            },
            None => document
                .body()
                .ok_or_else(|| JsValue::from_str("body not available"))?
                .into(),
        };
        parent.append_child(&canvas)?;

        let context = Self::context_of(&canvas)?;
        log::info!(
            "描画サーフェスを作成: {} ({}x{})",
            config.id,
            config.width,
            config.height
        );

        Ok(Surface {
            canvas,
            context,
            images: ImageCache::new(),
        })
    }

    /// 既存のcanvas要素に接続
    pub fn attach(canvas_id: &str) -> Result<Surface, JsValue> {
        let document = Self::document()?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas not found"))?
            .dyn_into::<HtmlCanvasElement>()?;
        let context = Self::context_of(&canvas)?;

        Ok(Surface {
            canvas,
            context,
            images: ImageCache::new(),
        })
    }

    fn document() -> Result<Document, JsValue> {
        web_sys::window()
            .ok_or_else(|| JsValue::from_str("window not available"))?
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))
    }

    fn context_of(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
        canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("unexpected 2d context type"))
    }

    /// canvasの内部幅を取得
    pub fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    /// canvasの内部高さを取得
    pub fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    /// canvas要素への参照を取得
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// 2Dコンテキストへの参照を取得
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.context
    }

    /// 画像キャッシュへの参照を取得
    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// 画像キャッシュへの可変参照を取得
    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// サーフェス全体をクリア
    pub fn clear(&self) {
        self.context
            .clear_rect(0.0, 0.0, self.width(), self.height());
    }

    /// 矩形を描画（サーフェス座標、左上原点）
    pub fn draw_rect(&self, x: f64, y: f64, width: f64, height: f64, style: &ShapeStyle) {
        self.context.save();
        self.context.set_global_alpha(style.alpha);
        self.apply_line_dash(&style.line_dash);

        if let Some(color) = &style.fill_color {
            self.context.set_fill_style_str(color);
            self.context.fill_rect(x, y, width, height);
        }
        if let Some(color) = &style.stroke_color {
            self.context.set_stroke_style_str(color);
            self.context.set_line_width(style.line_width);
            self.context.stroke_rect(x, y, width, height);
        }

        self.context.restore();
    }

    /// 円を描画（サーフェス座標、左上原点）
    pub fn draw_circle(&self, center_x: f64, center_y: f64, radius: f64, style: &ShapeStyle) {
        self.context.save();
        self.context.set_global_alpha(style.alpha);
        self.apply_line_dash(&style.line_dash);

        self.context.begin_path();
        if let Err(err) = self
            .context
            .arc(center_x, center_y, radius, 0.0, std::f64::consts::TAU)
        {
            log::warn!("円の描画に失敗: {:?}", err);
            self.context.restore();
            return;
        }

        if let Some(color) = &style.fill_color {
            self.context.set_fill_style_str(color);
            self.context.fill();
        }
        if let Some(color) = &style.stroke_color {
            self.context.set_stroke_style_str(color);
            self.context.set_line_width(style.line_width);
            self.context.stroke();
        }

        self.context.restore();
    }

    /// テキストを描画
    ///
    /// `(x, y)` は左下原点のワールド座標で受け取り、内部で変換します。
    pub fn draw_text(&self, text: &str, x: f64, y: f64, style: &TextStyle) {
        let (mut draw_x, mut draw_y) = coords::world_to_surface_point(self.height(), x, y);

        self.context.save();
        self.context.set_global_alpha(style.alpha);
        self.context.set_font(&style.font);
        self.context.set_text_align(&style.text_align);
        self.context.set_text_baseline(&style.text_baseline);

        if style.rotation != 0.0 {
            let _ = self.context.translate(draw_x, draw_y);
            let _ = self.context.rotate(style.rotation);
            draw_x = 0.0;
            draw_y = 0.0;
        }

        if let Some(color) = &style.fill_color {
            self.context.set_fill_style_str(color);
            let result = match style.max_width {
                Some(max_width) => self
                    .context
                    .fill_text_with_max_width(text, draw_x, draw_y, max_width),
                None => self.context.fill_text(text, draw_x, draw_y),
            };
            if let Err(err) = result {
                log::warn!("テキストの描画に失敗: {:?}", err);
            }
        }
        if let Some(color) = &style.stroke_color {
            self.context.set_stroke_style_str(color);
            self.context.set_line_width(style.line_width);
            let result = match style.max_width {
                Some(max_width) => self
                    .context
                    .stroke_text_with_max_width(text, draw_x, draw_y, max_width),
                None => self.context.stroke_text(text, draw_x, draw_y),
            };
            if let Err(err) = result {
                log::warn!("テキストの縁取りに失敗: {:?}", err);
            }
        }

        self.context.restore();
    }

    /// テキストの寸法を測定
    ///
    /// 幅は実測値、高さはフォント指定からの簡易推定です。
    pub fn measure_text(&self, text: &str, font: &str) -> (f64, f64) {
        self.context.save();
        self.context.set_font(font);
        let width = match self.context.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(err) => {
                log::warn!("テキストの測定に失敗: {:?}", err);
                0.0
            }
        };
        self.context.restore();

        (width, font_px_size(font))
    }

    /// キャッシュ済み画像を描画
    ///
    /// `(x, y)` は左下原点のワールド座標です。未ロードのIDでは
    /// falseを返します。
    pub fn draw_image(&self, id: &str, x: f64, y: f64, options: &ImageDrawOptions) -> bool {
        self.images
            .draw(&self.context, self.height(), id, x, y, options)
    }

    /// canvas要素をDOMから取り除く
    pub fn remove(&self) {
        self.canvas.remove();
        log::info!("描画サーフェスを削除しました");
    }

    fn apply_line_dash(&self, dash: &[f64]) {
        if dash.is_empty() {
            return;
        }
        let segments = js_sys::Array::new();
        for value in dash {
            segments.push(&JsValue::from_f64(*value));
        }
        if let Err(err) = self.context.set_line_dash(&segments) {
            log::warn!("破線パターンの設定に失敗: {:?}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_px_size_reads_leading_number() {
        assert_eq!(font_px_size("16px Arial"), 16.0);
        assert_eq!(font_px_size("24px monospace"), 24.0);
        assert_eq!(font_px_size("bold small-caps"), 16.0);
    }

    #[test]
    fn surface_config_parses_from_camel_case_json() {
        let config: SurfaceConfig = serde_json::from_str(
            r##"{"width":1024,"height":768,"backgroundColor":"#222222","container":"stage"}"##,
        )
        .unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 768);
        assert_eq!(config.background_color, "#222222");
        assert_eq!(config.container.as_deref(), Some("stage"));
        // 省略項目は既定値のまま
        assert_eq!(config.id, "canvas-kit-surface");
    }

    #[test]
    fn default_shape_style_fills_black() {
        let style = ShapeStyle::default();
        assert_eq!(style.fill_color.as_deref(), Some("#000000"));
        assert!(style.stroke_color.is_none());
        assert!(style.line_dash.is_empty());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn surface_attaches_to_existing_canvas() {
        let document = web_sys::window().unwrap().document().unwrap();
        let canvas = document.create_element("canvas").unwrap();
        canvas.set_id("test-surface");
        document.body().unwrap().append_child(&canvas).unwrap();

        let surface = Surface::attach("test-surface");
        assert!(surface.is_ok());

        let surface = surface.unwrap();
        surface.draw_rect(0.0, 0.0, 10.0, 10.0, &ShapeStyle::default());
        surface.clear();

        canvas.remove();
    }
}
