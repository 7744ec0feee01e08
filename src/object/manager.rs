//! 物体管理モジュール
//!
//! 全ゲームオブジェクトを所有し、フレームごとの更新→衝突判定→描画の
//! パイプラインを駆動する管理器です。衝突判定は有効な全コライダーの
//! 総当たりで行い、前フレームの重なり集合との差分から開始/終了イベント
//! を合成します（各遷移につき1回だけ発火します）。

use std::collections::HashMap;

use serde::Deserialize;

use crate::canvas::Surface;
use crate::object::collider::{Bounds, BoxCollider};
use crate::object::component::Component;
use crate::object::entity::{EntityId, GameObject};
use crate::object::gravity::{Gravity, DEFAULT_GRAVITY_FORCE};
use crate::object::renderer::ShapeRenderer;

/// 1フレームの衝突イベント
///
/// `entered` がtrueなら重なりの開始、falseなら終了を表します。
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    /// 片側のエンティティID
    pub a: EntityId,
    /// 片側のエンティティ名
    pub a_name: String,
    /// もう片側のエンティティID
    pub b: EntityId,
    /// もう片側のエンティティ名
    pub b_name: String,
    /// トリガーイベントかどうか（どちらかのコライダーがトリガー）
    pub trigger: bool,
    /// 重なりの開始か終了か
    pub entered: bool,
}

/// 物理オブジェクト生成オプション
///
/// JavaScript側からはcamelCaseのJSONとして渡されます。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsObjectOptions {
    /// 塗りつぶし色（省略時は赤）
    pub color: Option<String>,
    /// 分類用タグ
    pub tag: Option<String>,
    /// 重力加速度の上書き
    pub gravity_force: Option<f64>,
    /// 画像ID（指定時は矩形の代わりに画像を描画）
    pub image_id: Option<String>,
}

/// IDペアを順序無視のキーに正規化
fn ordered_pair(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// 物体管理器
///
/// エンティティはIDマップと挿入順リストの両方で管理されます。
/// 更新の反復順序は挿入順です（削除をまたいだ安定性は保証しません）。
pub struct ObjectManager {
    entities: HashMap<EntityId, GameObject>,
    order: Vec<EntityId>,
    by_tag: HashMap<String, Vec<EntityId>>,
    /// 前フレームの重なり集合（値はトリガーペアかどうか）
    overlaps: HashMap<(EntityId, EntityId), bool>,
    /// グローバル重力ベクトル（情報提供のみ。各Gravityコンポーネントは
    /// 自身の値を参照する）
    gravity: (f64, f64),
    show_colliders: bool,
}

impl ObjectManager {
    /// 新しい物体管理器を作成
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
            by_tag: HashMap::new(),
            overlaps: HashMap::new(),
            gravity: (0.0, -DEFAULT_GRAVITY_FORCE),
            show_colliders: false,
        }
    }

    /// 新しいゲームオブジェクトを作成して登録
    pub fn create_game_object(&mut self, name: &str) -> EntityId {
        self.add_game_object(GameObject::new(name))
    }

    /// 構築済みのゲームオブジェクトを登録
    pub fn add_game_object(&mut self, object: GameObject) -> EntityId {
        let id = object.id();
        if !object.tag().is_empty() {
            self.by_tag
                .entry(object.tag().to_string())
                .or_default()
                .push(id);
        }
        log::debug!("ゲームオブジェクトを登録: {} ({})", object.name(), id);
        self.order.push(id);
        self.entities.insert(id, object);
        id
    }

    /// ゲームオブジェクトを除去して破棄
    pub fn remove_game_object(&mut self, id: EntityId) -> bool {
        let Some(mut object) = self.entities.remove(&id) else {
            return false;
        };
        self.order.retain(|entry| *entry != id);
        if !object.tag().is_empty() {
            if let Some(tagged) = self.by_tag.get_mut(object.tag()) {
                tagged.retain(|entry| *entry != id);
            }
        }
        self.overlaps.retain(|(a, b), _| *a != id && *b != id);
        log::debug!("ゲームオブジェクトを除去: {} ({})", object.name(), id);
        object.destroy();
        true
    }

    /// IDでゲームオブジェクトを取得
    pub fn get(&self, id: EntityId) -> Option<&GameObject> {
        self.entities.get(&id)
    }

    /// IDでゲームオブジェクトを可変で取得
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut GameObject> {
        self.entities.get_mut(&id)
    }

    /// 名前でゲームオブジェクトを検索（挿入順で最初の一致）
    pub fn find_game_object_by_name(&self, name: &str) -> Option<&GameObject> {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .find(|object| object.name() == name)
    }

    /// タグでゲームオブジェクトを検索
    pub fn find_game_objects_by_tag(&self, tag: &str) -> Vec<&GameObject> {
        self.by_tag
            .get(tag)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.entities.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 全ゲームオブジェクトを挿入順で取得
    pub fn all_game_objects(&self) -> Vec<&GameObject> {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .collect()
    }

    /// 登録されているエンティティ数を取得
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// タグを設定し、タグ索引を更新
    pub fn set_tag(&mut self, id: EntityId, tag: &str) -> bool {
        let Some(object) = self.entities.get_mut(&id) else {
            return false;
        };
        let old = std::mem::replace(&mut object.tag, tag.to_string());
        if !old.is_empty() {
            if let Some(tagged) = self.by_tag.get_mut(&old) {
                tagged.retain(|entry| *entry != id);
            }
        }
        if !tag.is_empty() {
            self.by_tag.entry(tag.to_string()).or_default().push(id);
        }
        true
    }

    /// グローバル重力ベクトルを設定
    pub fn set_global_gravity(&mut self, x: f64, y: f64) {
        self.gravity = (x, y);
    }

    /// グローバル重力ベクトルを取得
    pub fn global_gravity(&self) -> (f64, f64) {
        self.gravity
    }

    /// コライダー輪郭の描画を切り替え
    pub fn set_show_colliders(&mut self, show: bool) {
        self.show_colliders = show;
    }

    /// 全ゲームオブジェクトを破棄
    ///
    /// 連続して呼び出しても安全です。
    pub fn clear(&mut self) {
        for (_, mut object) in self.entities.drain() {
            object.destroy();
        }
        self.order.clear();
        self.by_tag.clear();
        self.overlaps.clear();
        log::debug!("全ゲームオブジェクトを破棄しました");
    }

    /// 1フレーム分の更新を実行
    ///
    /// `delta_ms` はミリ秒単位のフレーム間隔で、ここで一度だけ秒へ
    /// 変換されます。全エンティティの更新後に衝突判定を行い、この
    /// フレームで発生した開始/終了イベントを返します。
    pub fn update(&mut self, delta_ms: f64) -> Vec<CollisionEvent> {
        let dt = delta_ms / 1000.0;

        let ids = self.order.clone();
        for id in &ids {
            if let Some(object) = self.entities.get_mut(id) {
                object.update(dt);
            }
        }

        self.process_collisions()
    }

    /// 全ゲームオブジェクトを描画
    ///
    /// サーフェスをクリアしてから挿入順に描画し、デバッグフラグが
    /// 有効な場合はコライダー輪郭を2パス目として描画します。
    pub fn render(&self, surface: &Surface) {
        surface.clear();

        for id in &self.order {
            if let Some(object) = self.entities.get(id) {
                object.render(surface);
            }
        }

        if self.show_colliders {
            for id in &self.order {
                let Some(object) = self.entities.get(id) else {
                    continue;
                };
                if !object.is_active() {
                    continue;
                }
                let Some(collider) = object.get_component::<BoxCollider>() else {
                    continue;
                };
                if !collider.is_enabled() {
                    continue;
                }
                if let Some(transform) = object.transform() {
                    collider.render_outline(transform, surface);
                }
            }
        }
    }

    /// 重力付きの物理オブジェクトを生成
    ///
    /// Transform・レンダラー・コライダー・重力を配線済みの
    /// ゲームオブジェクトを登録して返します。
    pub fn create_physics_object(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        options: PhysicsObjectOptions,
    ) -> EntityId {
        let mut object = GameObject::new(name);
        if let Some(transform) = object.transform_mut() {
            transform.set_position(x, y);
        }

        let renderer = match &options.image_id {
            Some(image_id) => ShapeRenderer::image(image_id, width, height),
            None => {
                ShapeRenderer::rect(options.color.as_deref().unwrap_or("#ff0000"), width, height)
            }
        };
        object.add_component(renderer);
        object.add_component(BoxCollider::new(width, height));
        object.add_component(Gravity::new(
            options.gravity_force.unwrap_or(DEFAULT_GRAVITY_FORCE),
        ));

        let id = self.add_game_object(object);
        if let Some(tag) = options.tag.as_deref() {
            self.set_tag(id, tag);
        }
        id
    }

    /// 衝突判定パス
    ///
    /// 有効な全コライダーを集めて総当たりで判定し、前フレームとの
    /// 差分から開始/終了イベントを合成して発火します。
    fn process_collisions(&mut self) -> Vec<CollisionEvent> {
        let mut colliders: Vec<(EntityId, Bounds, bool)> = Vec::new();
        for id in &self.order {
            let Some(object) = self.entities.get(id) else {
                continue;
            };
            if !object.is_active() {
                continue;
            }
            let Some(collider) = object.get_component::<BoxCollider>() else {
                continue;
            };
            if !collider.is_enabled() {
                continue;
            }
            let Some(transform) = object.transform() else {
                continue;
            };
            colliders.push((*id, collider.bounds(transform), collider.is_trigger));
        }

        // 総当たり判定（小規模シーン向け）
        let mut current: HashMap<(EntityId, EntityId), bool> = HashMap::new();
        for i in 0..colliders.len() {
            for j in (i + 1)..colliders.len() {
                if colliders[i].1.overlaps(&colliders[j].1) {
                    let pair = ordered_pair(colliders[i].0, colliders[j].0);
                    current.insert(pair, colliders[i].2 || colliders[j].2);
                }
            }
        }

        // 前フレームとの差分から開始/終了の遷移を取り出す
        let mut entered: Vec<((EntityId, EntityId), bool)> = current
            .iter()
            .filter(|(pair, _)| !self.overlaps.contains_key(*pair))
            .map(|(pair, trigger)| (*pair, *trigger))
            .collect();
        let mut exited: Vec<((EntityId, EntityId), bool)> = self
            .overlaps
            .iter()
            .filter(|(pair, _)| !current.contains_key(*pair))
            .map(|(pair, trigger)| (*pair, *trigger))
            .collect();
        entered.sort_by_key(|(pair, _)| *pair);
        exited.sort_by_key(|(pair, _)| *pair);

        let mut events = Vec::new();
        for (pair, trigger) in entered {
            self.dispatch_pair(pair, trigger, true, &mut events);
        }
        for (pair, trigger) in exited {
            self.dispatch_pair(pair, trigger, false, &mut events);
        }

        self.overlaps = current;
        events
    }

    /// ペアの両側へイベントを通知
    ///
    /// 両エンティティを一時的にマップから取り出してからハンドラを
    /// 呼ぶため、ハンドラは相手側を自由に変更できます。どちらかが
    /// 既に存在しない場合は通知しません。
    fn dispatch_pair(
        &mut self,
        (a_id, b_id): (EntityId, EntityId),
        trigger: bool,
        entered: bool,
        events: &mut Vec<CollisionEvent>,
    ) {
        let Some(mut a) = self.entities.remove(&a_id) else {
            return;
        };
        let Some(mut b) = self.entities.remove(&b_id) else {
            self.entities.insert(a_id, a);
            return;
        };

        events.push(CollisionEvent {
            a: a_id,
            a_name: a.name().to_string(),
            b: b_id,
            b_name: b.name().to_string(),
            trigger,
            entered,
        });

        Self::fire_handler(&mut a, &mut b, trigger, entered);
        Self::fire_handler(&mut b, &mut a, trigger, entered);

        self.entities.insert(a_id, a);
        self.entities.insert(b_id, b);
    }

    fn fire_handler(source: &mut GameObject, other: &mut GameObject, trigger: bool, entered: bool) {
        let Some(collider) = source.get_component_mut::<BoxCollider>() else {
            return;
        };
        let handler = match (trigger, entered) {
            (true, true) => collider.on_trigger_enter.as_mut(),
            (true, false) => collider.on_trigger_exit.as_mut(),
            (false, true) => collider.on_collision_enter.as_mut(),
            (false, false) => collider.on_collision_exit.as_mut(),
        };
        if let Some(handler) = handler {
            handler(other);
        }
    }
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::transform::Transform;
    use std::cell::Cell;
    use std::rc::Rc;

    fn no_options() -> PhysicsObjectOptions {
        PhysicsObjectOptions::default()
    }

    /// 重力なしのオブジェクトを指定位置に作る
    fn static_box(manager: &mut ObjectManager, name: &str, x: f64, y: f64, size: f64) -> EntityId {
        let id = manager.create_physics_object(name, x, y, size, size, no_options());
        manager
            .get_mut(id)
            .unwrap()
            .remove_component::<Gravity>();
        id
    }

    #[test]
    fn physics_object_is_registered_and_unmoved_by_zero_step() {
        let mut manager = ObjectManager::new();
        let id = manager.create_physics_object("crate", 100.0, 200.0, 40.0, 40.0, no_options());

        manager.update(0.0);

        let object = manager.find_game_object_by_name("crate").unwrap();
        assert_eq!(object.id(), id);
        assert_eq!(object.transform().unwrap().world_position(), (100.0, 200.0));
        assert_eq!(manager.entity_count(), 1);
    }

    #[test]
    fn physics_object_has_expected_components() {
        let mut manager = ObjectManager::new();
        let id = manager.create_physics_object("crate", 0.0, 0.0, 10.0, 10.0, no_options());

        let object = manager.get(id).unwrap();
        assert!(object.has_component::<Transform>());
        assert!(object.has_component::<BoxCollider>());
        assert!(object.has_component::<Gravity>());
        assert!(object.has_component::<ShapeRenderer>());
    }

    #[test]
    fn tagged_object_is_retrievable_immediately() {
        let mut manager = ObjectManager::new();
        let options = PhysicsObjectOptions {
            tag: Some("ball".to_string()),
            ..Default::default()
        };
        let id = manager.create_physics_object("ball_0", 0.0, 0.0, 10.0, 10.0, options);

        let tagged = manager.find_game_objects_by_tag("ball");
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id(), id);
        assert!(manager.find_game_objects_by_tag("missing").is_empty());
    }

    #[test]
    fn set_tag_reindexes() {
        let mut manager = ObjectManager::new();
        let id = manager.create_game_object("chameleon");

        assert!(manager.set_tag(id, "red"));
        assert_eq!(manager.find_game_objects_by_tag("red").len(), 1);

        assert!(manager.set_tag(id, "blue"));
        assert!(manager.find_game_objects_by_tag("red").is_empty());
        assert_eq!(manager.find_game_objects_by_tag("blue").len(), 1);

        assert!(!manager.set_tag(EntityId::new(), "nobody"));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut manager = ObjectManager::new();
        manager.create_physics_object("a", 0.0, 0.0, 10.0, 10.0, no_options());
        manager.create_physics_object("b", 50.0, 0.0, 10.0, 10.0, no_options());

        manager.clear();
        assert_eq!(manager.entity_count(), 0);

        manager.clear();
        assert_eq!(manager.entity_count(), 0);
        assert!(manager.all_game_objects().is_empty());
    }

    #[test]
    fn remove_game_object_detaches_everything() {
        let mut manager = ObjectManager::new();
        let options = PhysicsObjectOptions {
            tag: Some("box".to_string()),
            ..Default::default()
        };
        let id = manager.create_physics_object("doomed", 0.0, 0.0, 10.0, 10.0, options);

        assert!(manager.remove_game_object(id));
        assert_eq!(manager.entity_count(), 0);
        assert!(manager.find_game_objects_by_tag("box").is_empty());
        assert!(!manager.remove_game_object(id));
    }

    #[test]
    fn gravity_accelerates_objects_downward() {
        let mut manager = ObjectManager::new();
        let id = manager.create_physics_object("faller", 0.0, 500.0, 10.0, 10.0, no_options());

        // 1秒分（1000ミリ秒）更新
        manager.update(1000.0);

        let transform = manager.get(id).unwrap().transform().unwrap();
        assert_eq!(transform.velocity.1, -DEFAULT_GRAVITY_FORCE);
        assert!(transform.y < 500.0);
    }

    #[test]
    fn enter_fires_once_while_overlap_persists() {
        let mut manager = ObjectManager::new();
        let a = static_box(&mut manager, "a", 0.0, 0.0, 10.0);
        let _b = static_box(&mut manager, "b", 5.0, 5.0, 10.0);

        let enters = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&enters);
        manager
            .get_mut(a)
            .unwrap()
            .get_component_mut::<BoxCollider>()
            .unwrap()
            .on_collision_enter = Some(Box::new(move |_other| {
            counter.set(counter.get() + 1);
        }));

        let events = manager.update(0.0);
        assert_eq!(events.len(), 1);
        assert!(events[0].entered);
        assert!(!events[0].trigger);

        // 重なり続けても再発火しない
        let events = manager.update(0.0);
        assert!(events.is_empty());
        assert_eq!(enters.get(), 1);
    }

    #[test]
    fn exit_fires_once_on_separation() {
        let mut manager = ObjectManager::new();
        let a = static_box(&mut manager, "a", 0.0, 0.0, 10.0);
        let b = static_box(&mut manager, "b", 5.0, 5.0, 10.0);

        let exits = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&exits);
        manager
            .get_mut(a)
            .unwrap()
            .get_component_mut::<BoxCollider>()
            .unwrap()
            .on_collision_exit = Some(Box::new(move |_other| {
            counter.set(counter.get() + 1);
        }));

        manager.update(0.0);

        // 離れた位置に移動させる
        manager
            .get_mut(b)
            .unwrap()
            .transform_mut()
            .unwrap()
            .set_position(100.0, 100.0);

        let events = manager.update(0.0);
        assert_eq!(events.len(), 1);
        assert!(!events[0].entered);
        assert_eq!(exits.get(), 1);

        // 離れたままでは再発火しない
        let events = manager.update(0.0);
        assert!(events.is_empty());
        assert_eq!(exits.get(), 1);
    }

    #[test]
    fn both_sides_are_notified_independently() {
        let mut manager = ObjectManager::new();
        let a = static_box(&mut manager, "a", 0.0, 0.0, 10.0);
        let b = static_box(&mut manager, "b", 5.0, 0.0, 10.0);

        let a_hits = Rc::new(Cell::new(0u32));
        let b_hits = Rc::new(Cell::new(0u32));
        for (id, counter) in [(a, Rc::clone(&a_hits)), (b, Rc::clone(&b_hits))] {
            manager
                .get_mut(id)
                .unwrap()
                .get_component_mut::<BoxCollider>()
                .unwrap()
                .on_collision_enter = Some(Box::new(move |_other| {
                counter.set(counter.get() + 1);
            }));
        }

        manager.update(0.0);
        assert_eq!(a_hits.get(), 1);
        assert_eq!(b_hits.get(), 1);
    }

    #[test]
    fn trigger_pair_routes_to_trigger_handlers() {
        let mut manager = ObjectManager::new();
        let a = static_box(&mut manager, "sensor", 0.0, 0.0, 10.0);
        let _b = static_box(&mut manager, "walker", 5.0, 0.0, 10.0);

        let triggers = Rc::new(Cell::new(0u32));
        let collisions = Rc::new(Cell::new(0u32));
        {
            let object = manager.get_mut(a).unwrap();
            let collider = object.get_component_mut::<BoxCollider>().unwrap();
            collider.is_trigger = true;
            let counter = Rc::clone(&triggers);
            collider.on_trigger_enter = Some(Box::new(move |_other| {
                counter.set(counter.get() + 1);
            }));
            let counter = Rc::clone(&collisions);
            collider.on_collision_enter = Some(Box::new(move |_other| {
                counter.set(counter.get() + 1);
            }));
        }

        let events = manager.update(0.0);
        assert_eq!(events.len(), 1);
        assert!(events[0].trigger);
        assert_eq!(triggers.get(), 1);
        assert_eq!(collisions.get(), 0);
    }

    #[test]
    fn handler_may_mutate_the_other_entity() {
        // 地面コールバックによる反発: 相手の垂直速度を反転・減衰させる
        let mut manager = ObjectManager::new();
        let ground = static_box(&mut manager, "ground", 0.0, 0.0, 50.0);
        let ball = manager.create_physics_object("ball", 10.0, 40.0, 10.0, 10.0, no_options());

        manager
            .get_mut(ground)
            .unwrap()
            .get_component_mut::<BoxCollider>()
            .unwrap()
            .on_collision_enter = Some(Box::new(|other| {
            if let Some(transform) = other.transform_mut() {
                if transform.velocity.1 < 0.0 {
                    let damped = -transform.velocity.1 * 0.6;
                    transform.set_velocity(transform.velocity.0, damped);
                }
            }
        }));

        manager
            .get_mut(ball)
            .unwrap()
            .transform_mut()
            .unwrap()
            .set_velocity(0.0, -100.0);

        manager.update(0.0);

        let velocity = manager.get(ball).unwrap().transform().unwrap().velocity;
        assert_eq!(velocity.1, 60.0);
    }

    #[test]
    fn disabled_collider_is_skipped() {
        let mut manager = ObjectManager::new();
        let a = static_box(&mut manager, "a", 0.0, 0.0, 10.0);
        let _b = static_box(&mut manager, "b", 5.0, 0.0, 10.0);

        manager
            .get_mut(a)
            .unwrap()
            .get_component_mut::<BoxCollider>()
            .unwrap()
            .set_enabled(false);

        let events = manager.update(0.0);
        assert!(events.is_empty());
    }

    #[test]
    fn removed_entity_produces_no_exit_event() {
        let mut manager = ObjectManager::new();
        let a = static_box(&mut manager, "a", 0.0, 0.0, 10.0);
        let _b = static_box(&mut manager, "b", 5.0, 0.0, 10.0);

        manager.update(0.0);
        manager.remove_game_object(a);

        let events = manager.update(0.0);
        assert!(events.is_empty());
    }

    #[test]
    fn global_gravity_is_informational() {
        let mut manager = ObjectManager::new();
        manager.set_global_gravity(5.0, -10.0);
        assert_eq!(manager.global_gravity(), (5.0, -10.0));

        // 各オブジェクトは自身のGravity値に従う
        let id = manager.create_physics_object("faller", 0.0, 0.0, 10.0, 10.0, no_options());
        manager.update(1000.0);
        let transform = manager.get(id).unwrap().transform().unwrap();
        assert_eq!(transform.velocity.1, -DEFAULT_GRAVITY_FORCE);
    }

    #[test]
    fn options_parse_from_camel_case_json() {
        let options: PhysicsObjectOptions =
            serde_json::from_str(r##"{"color":"#00ff00","tag":"ball","gravityForce":490.0,"imageId":"logo"}"##)
                .unwrap();
        assert_eq!(options.color.as_deref(), Some("#00ff00"));
        assert_eq!(options.tag.as_deref(), Some("ball"));
        assert_eq!(options.gravity_force, Some(490.0));
        assert_eq!(options.image_id.as_deref(), Some("logo"));

        let empty: PhysicsObjectOptions = serde_json::from_str("{}").unwrap();
        assert!(empty.color.is_none());
    }
}
