//! 重力コンポーネントモジュール
//!
//! 所有エンティティのTransformに対して、毎ステップ一定の下向き加速度を
//! 寄与するコンポーネントです。Forceロールとして力フェーズで実行される
//! ため、同一フレームの積分に必ず反映されます。

use std::any::Any;

use crate::object::component::{Component, ComponentRole};
use crate::object::entity::EntityId;

/// デフォルトの重力加速度（ピクセル/秒²）
pub const DEFAULT_GRAVITY_FORCE: f64 = 980.0;

/// 重力コンポーネント
pub struct Gravity {
    /// 重力加速度の大きさ（正の値、下向きに適用される）
    gravity_force: f64,
    /// 重力の影響を受けるかどうか
    affected_by_gravity: bool,
    enabled: bool,
    owner: Option<EntityId>,
}

impl Gravity {
    /// 新しい重力コンポーネントを作成
    pub fn new(gravity_force: f64) -> Self {
        Self {
            gravity_force,
            affected_by_gravity: true,
            enabled: true,
            owner: None,
        }
    }

    /// 重力加速度の大きさを取得
    pub fn gravity_force(&self) -> f64 {
        self.gravity_force
    }

    /// 重力加速度の大きさを設定
    pub fn set_gravity_force(&mut self, force: f64) {
        self.gravity_force = force;
    }

    /// 重力の影響を受けるかどうかを取得
    pub fn is_affected_by_gravity(&self) -> bool {
        self.affected_by_gravity
    }

    /// 重力の影響を受けるかどうかを設定
    pub fn set_affected_by_gravity(&mut self, affected: bool) {
        self.affected_by_gravity = affected;
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY_FORCE)
    }
}

impl Component for Gravity {
    fn kind_name() -> &'static str {
        "Gravity"
    }

    fn kind(&self) -> &'static str {
        "Gravity"
    }

    fn role(&self) -> ComponentRole {
        ComponentRole::Force
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

    /// 左下原点座標系では下向きの重力は負のY方向になる
    fn contribute_force(&mut self, _dt: f64) -> (f64, f64) {
        if !self.affected_by_gravity {
            return (0.0, 0.0);
        }
        (0.0, -self.gravity_force)
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

    #[test]
    fn contributes_downward_acceleration() {
        let mut gravity = Gravity::new(980.0);
        assert_eq!(gravity.contribute_force(1.0), (0.0, -980.0));
    }

    #[test]
    fn contribution_is_independent_of_dt() {
        // 寄与は加速度なので、dtの大小で変わらない
        let mut gravity = Gravity::new(100.0);
        assert_eq!(gravity.contribute_force(0.016), (0.0, -100.0));
        assert_eq!(gravity.contribute_force(1.0), (0.0, -100.0));
    }

    #[test]
    fn unaffected_gravity_contributes_nothing() {
        let mut gravity = Gravity::default();
        gravity.set_affected_by_gravity(false);
        assert_eq!(gravity.contribute_force(1.0), (0.0, 0.0));
    }

    #[test]
    fn default_magnitude_is_980() {
        let gravity = Gravity::default();
        assert_eq!(gravity.gravity_force(), DEFAULT_GRAVITY_FORCE);
    }
}
