//! コンポーネント契約モジュール
//!
//! ゲームオブジェクトに取り付けられる全ての振る舞い単位が実装する
//! 共通の契約を定義します。各コンポーネントは種別名（エンティティ内で
//! 一意のキー）、有効フラグ、取り付け/取り外しフック、そして
//! ロールに応じたステップ処理を持ちます。

use std::any::Any;

use crate::canvas::Surface;
use crate::object::entity::EntityId;
use crate::object::transform::Transform;

/// コンポーネントの実行ロール
///
/// 1ステップ内の実行順序はロールで決まります:
/// 力の寄与（Force）→ 積分（Integrate）→ その他（Passive）。
/// これにより、重力などの力がどの挿入順でも必ず同一フレームの
/// 積分に反映されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRole {
    /// 力の寄与者（積分前に実行される）
    Force,
    /// 積分器（力の適用後に実行される）
    Integrate,
    /// 上記以外（最後に実行される）
    Passive,
}

/// コンポーネントの共通契約
///
/// 種別名はエンティティ内のキーとして使われるため、
/// 同じ種別のコンポーネントはエンティティごとに最大1つです。
pub trait Component: Any {
    /// コンポーネント種別名を取得（型レベル）
    fn kind_name() -> &'static str
    where
        Self: Sized;

    /// コンポーネント種別名を取得（インスタンスレベル）
    fn kind(&self) -> &'static str;

    /// 実行ロールを取得
    fn role(&self) -> ComponentRole {
        ComponentRole::Passive
    }

    /// 有効かどうかを確認
    fn is_enabled(&self) -> bool;

    /// 有効/無効を設定
    fn set_enabled(&mut self, enabled: bool);

    /// ゲームオブジェクトに取り付けられたときに呼ばれる
    fn on_attach(&mut self, _owner: EntityId) {}

    /// ゲームオブジェクトから取り外されたときに呼ばれる
    fn on_detach(&mut self) {}

    /// 力の寄与を返す（Forceロールのみ意味を持つ）
    ///
    /// 戻り値は加速度への寄与 (x, y) です。同一ステップ内の複数の
    /// 寄与は線形に合算されてから積分されます。
    fn contribute_force(&mut self, _dt: f64) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// 毎ステップの更新（dtは秒単位）
    fn update(&mut self, _dt: f64) {}

    /// 描画（所有エンティティのTransformと描画サーフェスを受け取る）
    fn render(&self, _transform: &Transform, _surface: &Surface) {}

    /// Any型として取得（ダウンキャスト用）
    fn as_any(&self) -> &dyn Any;

    /// 可変Any型として取得（ダウンキャスト用）
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker {
        enabled: bool,
    }

    impl Component for Marker {
        fn kind_name() -> &'static str {
            "Marker"
        }

        fn kind(&self) -> &'static str {
            "Marker"
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn default_role_is_passive() {
        let marker = Marker { enabled: true };
        assert_eq!(marker.role(), ComponentRole::Passive);
    }

    #[test]
    fn default_force_contribution_is_zero() {
        let mut marker = Marker { enabled: true };
        assert_eq!(marker.contribute_force(1.0), (0.0, 0.0));
    }
}
