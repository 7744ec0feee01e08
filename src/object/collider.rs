//! ボックスコライダーモジュール
//!
//! 軸並行境界ボックス（AABB）による衝突判定コンポーネントです。
//! 境界はTransformの位置＋オフセットから計算され、判定は分離条件の
//! 否定による標準的なAABB重なりテストです。辺を共有するだけの
//! 境界接触も重なりとして報告されます。

use std::any::Any;

use crate::canvas::{coords, ShapeStyle, Surface};
use crate::object::component::{Component, ComponentRole};
use crate::object::entity::{EntityId, GameObject};
use crate::object::transform::Transform;

/// 衝突・トリガーイベントのハンドラ
///
/// 引数は相手側のゲームオブジェクトです。両側のハンドラは独立に
/// 呼び出され、相互の実行順序に依存してはいけません。
pub type CollisionHandler = Box<dyn FnMut(&mut GameObject)>;

/// AABBの境界（左下原点座標系、Yは上向きに増加）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// 左端
    pub left: f64,
    /// 右端
    pub right: f64,
    /// 下端
    pub bottom: f64,
    /// 上端
    pub top: f64,
}

impl Bounds {
    /// 別の境界と重なっているかどうかを判定
    ///
    /// 分離条件（右端が相手の左端より左、など）がひとつも成り立たない
    /// 場合に重なりと判定します。比較は排他的なので、辺をちょうど
    /// 共有する場合も重なりです。
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.top < other.bottom
            || self.bottom > other.top)
    }
}

/// ボックスコライダーコンポーネント
pub struct BoxCollider {
    /// 幅
    pub width: f64,
    /// 高さ
    pub height: f64,
    /// Transform原点からのXオフセット
    pub offset_x: f64,
    /// Transform原点からのYオフセット
    pub offset_y: f64,
    /// トリガーかどうか（物理的な実体を持たない重なり検出）
    pub is_trigger: bool,
    /// 衝突開始時のハンドラ
    pub on_collision_enter: Option<CollisionHandler>,
    /// 衝突終了時のハンドラ
    pub on_collision_exit: Option<CollisionHandler>,
    /// トリガー開始時のハンドラ
    pub on_trigger_enter: Option<CollisionHandler>,
    /// トリガー終了時のハンドラ
    pub on_trigger_exit: Option<CollisionHandler>,
    enabled: bool,
    owner: Option<EntityId>,
}

impl BoxCollider {
    /// 新しいボックスコライダーを作成
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_offset(width, height, 0.0, 0.0)
    }

    /// オフセット付きのボックスコライダーを作成
    pub fn with_offset(width: f64, height: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            width,
            height,
            offset_x,
            offset_y,
            is_trigger: false,
            on_collision_enter: None,
            on_collision_exit: None,
            on_trigger_enter: None,
            on_trigger_exit: None,
            enabled: true,
            owner: None,
        }
    }

    /// 現在の境界を取得
    pub fn bounds(&self, transform: &Transform) -> Bounds {
        let left = transform.x + self.offset_x;
        let bottom = transform.y + self.offset_y;
        Bounds {
            left,
            right: left + self.width,
            bottom,
            top: bottom + self.height,
        }
    }

    /// 別のコライダーとの衝突を判定
    ///
    /// 現在の境界のみから決まる純粋な判定で、重なり状態は保持しません。
    pub fn check_collision(
        &self,
        transform: &Transform,
        other: &BoxCollider,
        other_transform: &Transform,
    ) -> bool {
        self.bounds(transform)
            .overlaps(&other.bounds(other_transform))
    }

    /// コライダーの輪郭を描画（デバッグ用）
    ///
    /// トリガーは緑、通常のコライダーは赤の破線で描画します。
    pub fn render_outline(&self, transform: &Transform, surface: &Surface) {
        let bounds = self.bounds(transform);
        let surface_y = coords::world_to_surface_point(surface.height(), bounds.left, bounds.top).1;

        let color = if self.is_trigger { "#00ff00" } else { "#ff0000" };
        let style = ShapeStyle {
            fill_color: None,
            stroke_color: Some(color.to_string()),
            line_width: 2.0,
            line_dash: vec![5.0, 5.0],
            ..ShapeStyle::default()
        };
        surface.draw_rect(bounds.left, surface_y, self.width, self.height, &style);
    }
}

impl Component for BoxCollider {
    fn kind_name() -> &'static str {
        "BoxCollider"
    }

    fn kind(&self) -> &'static str {
        "BoxCollider"
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(left: f64, bottom: f64, right: f64, top: f64) -> Bounds {
        Bounds {
            left,
            right,
            bottom,
            top,
        }
    }

    #[test]
    fn bounds_follow_transform_and_offset() {
        let collider = BoxCollider::with_offset(10.0, 20.0, 1.0, 2.0);
        let transform = Transform::new(100.0, 200.0);

        let b = collider.bounds(&transform);
        assert_eq!(b, bounds(101.0, 202.0, 111.0, 222.0));
    }

    #[test]
    fn overlapping_boxes_report_overlap() {
        // (0,0,10,10) と (5,5,15,15) は重なる
        let a = bounds(0.0, 0.0, 10.0, 10.0);
        let b = bounds(5.0, 5.0, 15.0, 15.0);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn separated_boxes_report_no_overlap() {
        // (0,0,10,10) と (20,20,30,30) は重ならない
        let a = bounds(0.0, 0.0, 10.0, 10.0);
        let c = bounds(20.0, 20.0, 30.0, 30.0);
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn overlap_test_is_symmetric() {
        let cases = [
            (bounds(0.0, 0.0, 10.0, 10.0), bounds(5.0, 5.0, 15.0, 15.0)),
            (bounds(0.0, 0.0, 10.0, 10.0), bounds(20.0, 20.0, 30.0, 30.0)),
            (bounds(0.0, 0.0, 10.0, 10.0), bounds(10.0, 0.0, 20.0, 10.0)),
            (bounds(-5.0, -5.0, 5.0, 5.0), bounds(-1.0, -1.0, 1.0, 1.0)),
        ];
        for (a, b) in cases {
            assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }

    #[test]
    fn shared_edge_counts_as_overlap() {
        // 辺をちょうど共有するペアは重なりとして報告される
        let a = bounds(0.0, 0.0, 10.0, 10.0);
        let b = bounds(10.0, 0.0, 20.0, 10.0);
        assert!(a.overlaps(&b));

        let c = bounds(0.0, 10.0, 10.0, 20.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn contained_box_overlaps() {
        let outer = bounds(0.0, 0.0, 100.0, 100.0);
        let inner = bounds(40.0, 40.0, 60.0, 60.0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn check_collision_uses_both_transforms() {
        let a = BoxCollider::new(10.0, 10.0);
        let b = BoxCollider::new(10.0, 10.0);
        let ta = Transform::new(0.0, 0.0);
        let tb = Transform::new(5.0, 5.0);
        let tc = Transform::new(20.0, 20.0);

        assert!(a.check_collision(&ta, &b, &tb));
        assert!(!a.check_collision(&ta, &b, &tc));
    }
}
