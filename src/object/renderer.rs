//! 形状レンダラーモジュール
//!
//! エンティティの見た目を描画するコンポーネントです。見た目は構築時に
//! 選ぶタグ付きバリアント（矩形・円・画像）で表現します。配置は左下
//! 原点のワールド座標をサーフェス座標へ変換して行い、この変換は
//! エンティティが描画される全ての経路で同一です。

use std::any::Any;

use crate::canvas::image::ImageDrawOptions;
use crate::canvas::{coords, ShapeStyle, Surface};
use crate::object::component::{Component, ComponentRole};
use crate::object::entity::EntityId;
use crate::object::transform::Transform;

/// 描画する見た目の種類
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// 塗りつぶし矩形
    Rect {
        /// 塗りつぶし色（CSSカラー文字列）
        color: String,
    },
    /// 塗りつぶし円（矩形領域に内接する）
    Circle {
        /// 塗りつぶし色（CSSカラー文字列）
        color: String,
    },
    /// 画像キャッシュ上の画像
    Image {
        /// 画像ID
        image_id: String,
    },
}

/// 形状レンダラーコンポーネント
pub struct ShapeRenderer {
    /// 描画する見た目
    pub visual: Visual,
    /// 基準幅（Transformのスケールで拡大縮小される）
    pub width: f64,
    /// 基準高さ（Transformのスケールで拡大縮小される）
    pub height: f64,
    /// 不透明度（0.0〜1.0）
    pub alpha: f64,
    /// X方向反転（画像のみ）
    pub flip_x: bool,
    /// Y方向反転（画像のみ）
    pub flip_y: bool,
    enabled: bool,
    owner: Option<EntityId>,
}

impl ShapeRenderer {
    /// 新しい形状レンダラーを作成
    pub fn new(visual: Visual, width: f64, height: f64) -> Self {
        Self {
            visual,
            width,
            height,
            alpha: 1.0,
            flip_x: false,
            flip_y: false,
            enabled: true,
            owner: None,
        }
    }

    /// 矩形レンダラーを作成
    pub fn rect(color: &str, width: f64, height: f64) -> Self {
        Self::new(
            Visual::Rect {
                color: color.to_string(),
            },
            width,
            height,
        )
    }

    /// 円レンダラーを作成
    pub fn circle(color: &str, width: f64, height: f64) -> Self {
        Self::new(
            Visual::Circle {
                color: color.to_string(),
            },
            width,
            height,
        )
    }

    /// 画像レンダラーを作成
    pub fn image(image_id: &str, width: f64, height: f64) -> Self {
        Self::new(
            Visual::Image {
                image_id: image_id.to_string(),
            },
            width,
            height,
        )
    }

    /// 見た目を差し替える
    pub fn set_visual(&mut self, visual: Visual) {
        self.visual = visual;
    }

    /// 基準サイズを設定
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// スケール適用後の描画サイズを計算
    pub fn scaled_size(&self, transform: &Transform) -> (f64, f64) {
        (
            self.width * transform.scale_x,
            self.height * transform.scale_y,
        )
    }
}

impl Component for ShapeRenderer {
    fn kind_name() -> &'static str {
        "ShapeRenderer"
    }

    fn kind(&self) -> &'static str {
        "ShapeRenderer"
    }

    fn role(&self) -> ComponentRole {
        ComponentRole::Passive
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn on_attach(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    fn on_detach(&mut self) {
        self.owner = None;
    }

    fn render(&self, transform: &Transform, surface: &Surface) {
        let (width, height) = self.scaled_size(transform);
        let surface_y = coords::world_to_surface_y(surface.height(), transform.y, height);

        match &self.visual {
            Visual::Rect { color } => {
                let style = ShapeStyle {
                    fill_color: Some(color.clone()),
                    alpha: self.alpha,
                    ..ShapeStyle::default()
                };
                surface.draw_rect(transform.x, surface_y, width, height, &style);
            }
            Visual::Circle { color } => {
                // 中心は矩形と同じ変換から導出する
                let center_x = transform.x + width / 2.0;
                let center_y = surface_y + height / 2.0;
                let radius = width.min(height) / 2.0;
                let style = ShapeStyle {
                    fill_color: Some(color.clone()),
                    alpha: self.alpha,
                    ..ShapeStyle::default()
                };
                surface.draw_circle(center_x, center_y, radius, &style);
            }
            Visual::Image { image_id } => {
                let options = ImageDrawOptions {
                    width: Some(width),
                    height: Some(height),
                    rotation: transform.rotation,
                    alpha: self.alpha,
                    flip_x: self.flip_x,
                    flip_y: self.flip_y,
                    ..ImageDrawOptions::default()
                };
                if !surface.draw_image(image_id, transform.x, transform.y, &options) {
                    log::warn!("未ロードの画像を描画しようとしました: {}", image_id);
                }
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
