//! 変換コンポーネントモジュール
//!
//! 位置・速度・加速度を保持し、セミインプリシット・オイラー法で
//! 積分する運動学コンポーネントです。加速度はステップごとの
//! 力アキュムレータとして扱われ、積分後に必ずゼロに戻ります。

use std::any::Any;

use crate::object::component::{Component, ComponentRole};
use crate::object::entity::EntityId;

/// 変換コンポーネント
///
/// 座標系は左下原点（Yは上向きに増加）です。
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    /// X座標
    pub x: f64,
    /// Y座標
    pub y: f64,
    /// 回転角（ラジアン）
    pub rotation: f64,
    /// X方向スケール
    pub scale_x: f64,
    /// Y方向スケール
    pub scale_y: f64,
    /// 速度 (vx, vy)
    pub velocity: (f64, f64),
    /// 加速度アキュムレータ (ax, ay)
    pub acceleration: (f64, f64),
    enabled: bool,
    owner: Option<EntityId>,
}

impl Transform {
    /// 新しい変換コンポーネントを作成
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            velocity: (0.0, 0.0),
            acceleration: (0.0, 0.0),
            enabled: true,
            owner: None,
        }
    }

    /// 回転とスケールを指定して作成
    pub fn with_pose(x: f64, y: f64, rotation: f64, scale_x: f64, scale_y: f64) -> Self {
        Self {
            rotation,
            scale_x,
            scale_y,
            ..Self::new(x, y)
        }
    }

    /// 位置を設定（絶対値）
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// 速度を設定（絶対値）
    pub fn set_velocity(&mut self, x: f64, y: f64) {
        self.velocity = (x, y);
    }

    /// 加速度を設定（絶対値）
    pub fn set_acceleration(&mut self, x: f64, y: f64) {
        self.acceleration = (x, y);
    }

    /// 力を加える（加速度アキュムレータへの加算）
    ///
    /// ここでの「力」は質量スケールされない加速度寄与です。
    /// 同一ステップ内の複数回の呼び出しは線形に合算されます。
    pub fn add_force(&mut self, x: f64, y: f64) {
        self.acceleration.0 += x;
        self.acceleration.1 += y;
    }

    /// ワールド座標を取得
    pub fn world_position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Component for Transform {
    fn kind_name() -> &'static str {
        "Transform"
    }

    fn kind(&self) -> &'static str {
        "Transform"
    }

    fn role(&self) -> ComponentRole {
        ComponentRole::Integrate
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

    /// セミインプリシット・オイラー積分
    ///
    /// 速度を先に更新してから位置を更新し、加速度アキュムレータを
    /// ゼロに戻します。速度・位置のクランプは行いません。
    fn update(&mut self, dt: f64) {
        self.velocity.0 += self.acceleration.0 * dt;
        self.velocity.1 += self.acceleration.1 * dt;

        self.x += self.velocity.0 * dt;
        self.y += self.velocity.1 * dt;

        // 加速度はステップごとに再計算される
        self.acceleration = (0.0, 0.0);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
