//! ゲームオブジェクトモジュール
//!
//! シミュレーション上の1オブジェクトを表すエンティティです。一意なID、
//! 表示名、タグ、アクティブフラグと、種別名をキーとするコンポーネント
//! 群（挿入順を保持）を持ちます。コンポーネントはエンティティが排他的に
//! 所有し、エンティティの破棄で全て破棄されます。

use std::fmt;

use crate::canvas::Surface;
use crate::object::component::{Component, ComponentRole};
use crate::object::transform::Transform;

/// エンティティの一意な識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// 新しいエンティティIDを生成
    pub fn new() -> Self {
        Self(rand::random())
    }

    /// 文字列表現からIDを復元
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix("obj-")?;
        u64::from_str_radix(hex, 16).ok().map(Self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{:016x}", self.0)
    }
}

/// ゲームオブジェクト
///
/// 構築時に必ずTransformがひとつ取り付けられます。Transformの除去は
/// 可能ですが、その場合は運動学が機能しなくなります（呼び出し側の
/// 責任であり、クラッシュはしません）。
pub struct GameObject {
    id: EntityId,
    name: String,
    pub(crate) tag: String,
    active: bool,
    /// 挿入順を保持したコンポーネント群（種別名がキー）
    components: Vec<Box<dyn Component>>,
}

impl GameObject {
    /// 新しいゲームオブジェクトを作成
    pub fn new(name: &str) -> Self {
        let mut object = Self {
            id: EntityId::new(),
            name: name.to_string(),
            tag: String::new(),
            active: true,
            components: Vec::new(),
        };
        object.add_component(Transform::default());
        object
    }

    /// エンティティIDを取得
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// 表示名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// タグを取得
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// アクティブかどうかを確認
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// アクティブ状態を設定
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// コンポーネントを追加
    ///
    /// 同じ種別のコンポーネントが既にある場合は、その位置のまま
    /// 置き換えます。取り付けフックは同期的に呼ばれます。
    pub fn add_component<C: Component>(&mut self, component: C) {
        let mut boxed: Box<dyn Component> = Box::new(component);
        boxed.on_attach(self.id);

        let kind = boxed.kind();
        if let Some(slot) = self.components.iter_mut().find(|c| c.kind() == kind) {
            let mut old = std::mem::replace(slot, boxed);
            old.on_detach();
            log::debug!("コンポーネントを置き換え: {} ({})", kind, self.name);
        } else {
            self.components.push(boxed);
            log::debug!("コンポーネントを追加: {} ({})", kind, self.name);
        }
    }

    /// 型を指定してコンポーネントを取得
    pub fn get_component<C: Component>(&self) -> Option<&C> {
        self.components
            .iter()
            .find(|c| c.kind() == C::kind_name())
            .and_then(|c| c.as_any().downcast_ref::<C>())
    }

    /// 型を指定してコンポーネントを可変で取得
    pub fn get_component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components
            .iter_mut()
            .find(|c| c.kind() == C::kind_name())
            .and_then(|c| c.as_any_mut().downcast_mut::<C>())
    }

    /// 型を指定してコンポーネントの有無を確認
    pub fn has_component<C: Component>(&self) -> bool {
        self.has_component_kind(C::kind_name())
    }

    /// 種別名でコンポーネントの有無を確認
    pub fn has_component_kind(&self, kind: &str) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    /// 型を指定してコンポーネントを除去
    ///
    /// 存在した場合は取り外しフックを呼んで破棄し、trueを返します。
    pub fn remove_component<C: Component>(&mut self) -> bool {
        self.remove_component_by_kind(C::kind_name())
    }

    /// 種別名でコンポーネントを除去
    pub fn remove_component_by_kind(&mut self, kind: &str) -> bool {
        if let Some(index) = self.components.iter().position(|c| c.kind() == kind) {
            let mut removed = self.components.remove(index);
            removed.on_detach();
            log::debug!("コンポーネントを除去: {} ({})", kind, self.name);
            true
        } else {
            false
        }
    }

    /// Transformコンポーネントを取得（簡便メソッド）
    pub fn transform(&self) -> Option<&Transform> {
        self.get_component::<Transform>()
    }

    /// Transformコンポーネントを可変で取得（簡便メソッド）
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.get_component_mut::<Transform>()
    }

    /// 全コンポーネントを1ステップ更新（dtは秒単位）
    ///
    /// ロール順の2フェーズで実行します: まず有効な力寄与コンポーネント
    /// の寄与を合算してTransformのアキュムレータへ適用し、次に積分器、
    /// 最後にその他のコンポーネントを更新します。
    pub fn update(&mut self, dt: f64) {
        if !self.active {
            return;
        }

        // フェーズ1: 力の寄与を合算
        let mut force = (0.0, 0.0);
        for component in self
            .components
            .iter_mut()
            .filter(|c| c.is_enabled() && c.role() == ComponentRole::Force)
        {
            let (fx, fy) = component.contribute_force(dt);
            force.0 += fx;
            force.1 += fy;
        }
        if force != (0.0, 0.0) {
            if let Some(transform) = self.transform_mut() {
                transform.add_force(force.0, force.1);
            }
        }

        // フェーズ2: 積分
        for component in self
            .components
            .iter_mut()
            .filter(|c| c.is_enabled() && c.role() == ComponentRole::Integrate)
        {
            component.update(dt);
        }

        // フェーズ3: その他の更新
        for component in self
            .components
            .iter_mut()
            .filter(|c| c.is_enabled() && c.role() == ComponentRole::Passive)
        {
            component.update(dt);
        }
    }

    /// 全コンポーネントを描画
    ///
    /// Transformが無い場合は何も描画しません。
    pub fn render(&self, surface: &Surface) {
        if !self.active {
            return;
        }
        let Some(transform) = self.transform().copied() else {
            return;
        };

        for component in self.components.iter().filter(|c| c.is_enabled()) {
            component.render(&transform, surface);
        }
    }

    /// 全コンポーネントを取り外して破棄
    pub fn destroy(&mut self) {
        for component in &mut self.components {
            component.on_detach();
        }
        self.components.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::collider::BoxCollider;
    use crate::object::gravity::Gravity;

    #[test]
    fn entity_ids_are_unique_and_parseable() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);

        let round_tripped = EntityId::parse(&a.to_string());
        assert_eq!(round_tripped, Some(a));
        assert_eq!(EntityId::parse("not-an-id"), None);
    }

    #[test]
    fn new_object_has_a_transform() {
        let object = GameObject::new("player");
        assert!(object.has_component::<Transform>());
        assert_eq!(object.name(), "player");
        assert!(object.is_active());
    }

    #[test]
    fn same_kind_component_is_replaced_in_place() {
        let mut object = GameObject::new("enemy");
        object.add_component(Gravity::new(100.0));
        object.add_component(Gravity::new(300.0));

        let gravity = object.get_component::<Gravity>().unwrap();
        assert_eq!(gravity.gravity_force(), 300.0);

        // Transform + Gravity のみ
        assert!(object.has_component::<Transform>());
        assert!(object.remove_component::<Gravity>());
        assert!(!object.has_component::<Gravity>());
    }

    #[test]
    fn removing_missing_component_returns_false_and_keeps_set() {
        let mut object = GameObject::new("rock");
        assert!(!object.remove_component::<Gravity>());
        assert!(object.has_component::<Transform>());
    }

    #[test]
    fn gravity_affects_same_frame_regardless_of_insertion_order() {
        // Transformは構築時に挿入済みなので、Gravityは必ず後から入る。
        // それでも力フェーズが先に走るため、同一フレームの積分に反映される。
        let mut object = GameObject::new("ball");
        object.add_component(Gravity::new(980.0));

        object.update(1.0);

        let transform = object.transform().unwrap();
        assert_eq!(transform.velocity.1, -980.0);
        assert_eq!(transform.acceleration, (0.0, 0.0));
    }

    #[test]
    fn multiple_force_contributors_sum_linearly() {
        let mut object = GameObject::new("ball");
        object.add_component(Gravity::new(100.0));
        if let Some(transform) = object.transform_mut() {
            transform.add_force(30.0, 40.0);
        }

        object.update(1.0);

        let transform = object.transform().unwrap();
        assert_eq!(transform.velocity, (30.0, -60.0));
    }

    #[test]
    fn inactive_object_skips_update() {
        let mut object = GameObject::new("ghost");
        object.add_component(Gravity::default());
        object.set_active(false);

        object.update(1.0);

        let transform = object.transform().unwrap();
        assert_eq!(transform.velocity, (0.0, 0.0));
    }

    #[test]
    fn disabled_component_is_skipped() {
        let mut object = GameObject::new("ball");
        object.add_component(Gravity::new(980.0));
        object.get_component_mut::<Gravity>().unwrap().set_enabled(false);

        object.update(1.0);

        assert_eq!(object.transform().unwrap().velocity, (0.0, 0.0));
    }

    #[test]
    fn removing_transform_is_legal_but_stops_kinematics() {
        let mut object = GameObject::new("odd");
        object.add_component(Gravity::default());
        assert!(object.remove_component::<Transform>());

        // Transformが無くてもクラッシュしない
        object.update(1.0);
        assert!(object.transform().is_none());
    }

    #[test]
    fn destroy_detaches_all_components() {
        let mut object = GameObject::new("temp");
        object.add_component(BoxCollider::new(10.0, 10.0));
        object.destroy();

        assert!(!object.has_component::<Transform>());
        assert!(!object.has_component::<BoxCollider>());
    }
}
