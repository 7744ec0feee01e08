//! エンティティ/コンポーネントのシミュレーション中核モジュール
//!
//! このモジュールは、ゲームオブジェクトとそのコンポーネント
//! （Transform・Gravity・BoxCollider・ShapeRenderer）、および
//! フレームパイプラインを駆動する物体管理器を実装します。
//!
//! ## 主要な構成要素:
//!
//! - `GameObject`: コンポーネントを所有する一意なエンティティ
//! - `Component`: 取り付け可能な振る舞い単位の共通契約
//! - `ObjectManager`: 更新→衝突判定→描画のパイプライン
//!
//! 座標系は左下原点（Yは上向きに増加）で、時間はマネージャ境界で
//! ミリ秒から秒へ一度だけ変換されます。

pub mod collider;
pub mod component;
pub mod entity;
pub mod gravity;
pub mod manager;
pub mod renderer;
pub mod transform;

pub use collider::{Bounds, BoxCollider, CollisionHandler};
pub use component::{Component, ComponentRole};
pub use entity::{EntityId, GameObject};
pub use gravity::{Gravity, DEFAULT_GRAVITY_FORCE};
pub use manager::{CollisionEvent, ObjectManager, PhysicsObjectOptions};
pub use renderer::{ShapeRenderer, Visual};
pub use transform::Transform;
