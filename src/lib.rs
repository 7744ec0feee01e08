//! canvas_kit: ブラウザ向けcanvasデモツールキット
//!
//! HTMLのcanvas要素の上に、小さなエンティティ/コンポーネントの
//! シミュレーション中核（Transform積分・重力・AABB衝突・描画）と、
//! アニメーション駆動・入力・画像・音声・動画・アセット読み込みの
//! ブラウザグルーを載せたライブラリです。
//!
//! JavaScriptからは `CanvasApp` を生成して利用します。アプリケーション
//! の状態（サーフェス・物体管理器・入力ルーター・アニメーション
//! ループ）は全てこのコンテキストが所有し、モジュールレベルの
//! グローバル状態はありません。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod animation;
pub mod assets;
pub mod audio;
pub mod canvas;
pub mod input;
pub mod object;
pub mod video;

use animation::AnimationLoop;
use canvas::image::ImageEntry;
use canvas::{coords, ImageDrawOptions, ShapeStyle, Surface, SurfaceConfig, TextStyle};
use input::{ClickableElement, InputRouter};
use object::{BoxCollider, CollisionEvent, EntityId, ObjectManager, PhysicsObjectOptions, Transform};

// 初期化用のエントリーポイント
#[wasm_bindgen(start)]
pub fn start() {
    // パニックをコンソールに表示する
    console_error_panic_hook::set_once();

    // ロガーの初期化
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("canvas_kit module initialized!");
}

/// JavaScript側の衝突フックの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HookKind {
    CollisionEnter,
    CollisionExit,
    TriggerEnter,
    TriggerExit,
}

/// アプリケーション全体の状態
///
/// `CanvasApp` が単一の所有者であり、DOMイベントのクロージャには
/// `Rc` 経由で共有されます。
struct AppContext {
    surface: Surface,
    objects: ObjectManager,
    input: InputRouter,
    animation: AnimationLoop,
    /// JavaScript側の衝突フック（エンティティ×種類ごとに1つ）
    js_collision_hooks: HashMap<(EntityId, HookKind), js_sys::Function>,
    /// 登録済みDOMリスナーのクロージャ（生存期間の維持用）
    dom_listeners: Vec<JsValue>,
}

/// クライアント座標をワールド座標（左下原点）へ変換
fn click_point(surface: &Surface, client_x: f64, client_y: f64) -> (f64, f64) {
    let rect = surface.canvas().get_bounding_client_rect();
    let surface_point = coords::client_to_surface(
        (rect.left(), rect.top(), rect.width(), rect.height()),
        (surface.width(), surface.height()),
        (client_x, client_y),
    );
    coords::surface_to_world_point(surface.height(), surface_point.0, surface_point.1)
}

/// 発火すべきJavaScript衝突フックを収集
fn collect_hook_calls(
    hooks: &HashMap<(EntityId, HookKind), js_sys::Function>,
    events: &[CollisionEvent],
) -> Vec<(js_sys::Function, JsValue, JsValue)> {
    let mut calls = Vec::new();
    for event in events {
        let kind = match (event.trigger, event.entered) {
            (true, true) => HookKind::TriggerEnter,
            (true, false) => HookKind::TriggerExit,
            (false, true) => HookKind::CollisionEnter,
            (false, false) => HookKind::CollisionExit,
        };
        // 両側へ相手のIDと名前を渡す
        let sides = [
            (event.a, event.b, event.b_name.as_str()),
            (event.b, event.a, event.a_name.as_str()),
        ];
        for (me, other_id, other_name) in sides {
            if let Some(handler) = hooks.get(&(me, kind)) {
                calls.push((
                    handler.clone(),
                    JsValue::from_str(&other_id.to_string()),
                    JsValue::from_str(other_name),
                ));
            }
        }
    }
    calls
}

/// JavaScriptからアクセス可能なアプリケーションコンテキスト
#[wasm_bindgen]
pub struct CanvasApp {
    inner: Rc<RefCell<AppContext>>,
}

impl CanvasApp {
    fn from_surface(surface: Surface) -> Result<CanvasApp, JsValue> {
        let inner = Rc::new(RefCell::new(AppContext {
            surface,
            objects: ObjectManager::new(),
            input: InputRouter::new(),
            animation: AnimationLoop::new(),
            js_collision_hooks: HashMap::new(),
            dom_listeners: Vec::new(),
        }));
        let app = CanvasApp { inner };
        app.register_dom_listeners()?;
        Ok(app)
    }

    /// canvasとdocumentへ入力リスナーを登録
    ///
    /// ハンドラの呼び出しは収集と実行を分離し、コンテキストの借用を
    /// 解放してからJavaScriptへ制御を渡します。こうすることで
    /// コールバックが `CanvasApp` のメソッドを再入的に呼べます。
    fn register_dom_listeners(&self) -> Result<(), JsValue> {
        let canvas = self.inner.borrow().surface.canvas().clone();

        let inner = Rc::clone(&self.inner);
        let on_click =
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |event: web_sys::MouseEvent| {
                let calls = {
                    let ctx = inner.borrow();
                    let (x, y) = click_point(
                        &ctx.surface,
                        f64::from(event.client_x()),
                        f64::from(event.client_y()),
                    );
                    ctx.input.collect_click_dispatch(x, y)
                };
                for (handler, payload) in calls {
                    if let Err(err) = handler.call1(&JsValue::NULL, &payload) {
                        log::warn!("クリックハンドラでエラー: {:?}", err);
                    }
                }
            });
        canvas.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;

        let inner = Rc::clone(&self.inner);
        let on_touch =
            Closure::<dyn FnMut(web_sys::TouchEvent)>::new(move |event: web_sys::TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let calls = {
                    let ctx = inner.borrow();
                    let (x, y) = click_point(
                        &ctx.surface,
                        f64::from(touch.client_x()),
                        f64::from(touch.client_y()),
                    );
                    ctx.input.collect_click_dispatch(x, y)
                };
                for (handler, payload) in calls {
                    if let Err(err) = handler.call1(&JsValue::NULL, &payload) {
                        log::warn!("タッチハンドラでエラー: {:?}", err);
                    }
                }
            });
        canvas.add_event_listener_with_callback("touchend", on_touch.as_ref().unchecked_ref())?;

        let inner = Rc::clone(&self.inner);
        let on_key = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(
            move |event: web_sys::KeyboardEvent| {
                let handlers = {
                    let ctx = inner.borrow();
                    ctx.input.collect_key_dispatch(&event.key())
                };
                if handlers.is_empty() {
                    return;
                }
                event.prevent_default();
                let key = JsValue::from_str(&event.key());
                for handler in handlers {
                    if let Err(err) = handler.call1(&JsValue::NULL, &key) {
                        log::warn!("キーハンドラでエラー: {:?}", err);
                    }
                }
            },
        );
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        document.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;

        let mut ctx = self.inner.borrow_mut();
        ctx.dom_listeners.push(on_click.into_js_value());
        ctx.dom_listeners.push(on_touch.into_js_value());
        ctx.dom_listeners.push(on_key.into_js_value());
        Ok(())
    }

    fn parse_id(id: &str) -> Option<EntityId> {
        let parsed = EntityId::parse(id);
        if parsed.is_none() {
            log::warn!("不正なエンティティID: {}", id);
        }
        parsed
    }

    fn set_hook(&self, id: &str, kind: HookKind, handler: js_sys::Function) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        let mut ctx = self.inner.borrow_mut();
        if ctx.objects.get(entity_id).is_none() {
            log::warn!("存在しないエンティティへのフック登録: {}", id);
            return false;
        }
        ctx.js_collision_hooks.insert((entity_id, kind), handler);
        true
    }

    /// サーフェスを貸し出す（クレート内部用）
    pub(crate) fn with_surface<R>(&self, f: impl FnOnce(&Surface) -> R) -> R {
        let ctx = self.inner.borrow();
        f(&ctx.surface)
    }
}

#[wasm_bindgen]
impl CanvasApp {
    /// 既定の設定（800x600、bodyへ追加）でアプリケーションを作成
    pub fn create() -> Result<CanvasApp, JsValue> {
        Self::from_surface(Surface::create()?)
    }

    /// JSONで設定を指定してアプリケーションを作成
    pub fn create_custom(options_json: &str) -> Result<CanvasApp, JsValue> {
        let config: SurfaceConfig = serde_json::from_str(options_json)
            .map_err(|err| JsValue::from_str(&format!("invalid surface options: {}", err)))?;
        Self::from_surface(Surface::create_with(config)?)
    }

    /// 既存のcanvas要素に接続してアプリケーションを作成
    pub fn attach(canvas_id: &str) -> Result<CanvasApp, JsValue> {
        Self::from_surface(Surface::attach(canvas_id)?)
    }

    /// サーフェスの内部幅を取得
    pub fn width(&self) -> f64 {
        self.inner.borrow().surface.width()
    }

    /// サーフェスの内部高さを取得
    pub fn height(&self) -> f64 {
        self.inner.borrow().surface.height()
    }

    // ========== フレームフェーズ ==========

    /// 物理シミュレーションを1フレーム進める
    ///
    /// `delta_ms` はミリ秒単位のフレーム間隔です。衝突フックは
    /// 内部状態の借用を解放した後に呼び出されるため、フック内から
    /// このアプリケーションのメソッドを呼んでも安全です。
    pub fn update_physics(&self, delta_ms: f64) {
        let calls = {
            let mut ctx = self.inner.borrow_mut();
            let events = ctx.objects.update(delta_ms);
            collect_hook_calls(&ctx.js_collision_hooks, &events)
        };
        for (handler, other_id, other_name) in calls {
            if let Err(err) = handler.call2(&JsValue::NULL, &other_id, &other_name) {
                log::warn!("衝突ハンドラでエラー: {:?}", err);
            }
        }
    }

    /// 全ゲームオブジェクトを描画する
    pub fn render_physics(&self) {
        let ctx = self.inner.borrow();
        ctx.objects.render(&ctx.surface);
    }

    // ========== ゲームオブジェクト ==========

    /// ゲームオブジェクトを作成して登録
    pub fn create_game_object(&self, name: &str) -> String {
        self.inner
            .borrow_mut()
            .objects
            .create_game_object(name)
            .to_string()
    }

    /// 物理オブジェクト（Transform＋レンダラー＋コライダー＋重力）を作成
    ///
    /// オプションはcamelCaseのJSON文字列で、color / tag /
    /// gravityForce / imageId を指定できます。
    pub fn create_physics_object(
        &self,
        name: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        options_json: Option<String>,
    ) -> Result<String, JsValue> {
        let options: PhysicsObjectOptions = match options_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| JsValue::from_str(&format!("invalid physics options: {}", err)))?,
            None => PhysicsObjectOptions::default(),
        };
        let id = self
            .inner
            .borrow_mut()
            .objects
            .create_physics_object(name, x, y, width, height, options);
        Ok(id.to_string())
    }

    /// ゲームオブジェクトを除去
    pub fn remove_game_object(&self, id: &str) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        let mut ctx = self.inner.borrow_mut();
        ctx.js_collision_hooks.retain(|(hook_id, _), _| *hook_id != entity_id);
        ctx.objects.remove_game_object(entity_id)
    }

    /// コンポーネントを種別名で除去
    pub fn remove_component(&self, id: &str, kind: &str) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        self.inner
            .borrow_mut()
            .objects
            .get_mut(entity_id)
            .map(|object| object.remove_component_by_kind(kind))
            .unwrap_or(false)
    }

    /// 登録されているオブジェクト数を取得
    pub fn object_count(&self) -> usize {
        self.inner.borrow().objects.entity_count()
    }

    /// 全ゲームオブジェクトのIDを挿入順で取得
    pub fn all_game_objects(&self) -> js_sys::Array {
        self.inner
            .borrow()
            .objects
            .all_game_objects()
            .iter()
            .map(|object| JsValue::from_str(&object.id().to_string()))
            .collect()
    }

    /// 名前でオブジェクトを検索（最初の一致のIDを返す）
    pub fn find_game_object_by_name(&self, name: &str) -> JsValue {
        self.inner
            .borrow()
            .objects
            .find_game_object_by_name(name)
            .map(|object| JsValue::from_str(&object.id().to_string()))
            .unwrap_or(JsValue::NULL)
    }

    /// タグでオブジェクトを検索（ID配列を返す）
    pub fn find_game_objects_by_tag(&self, tag: &str) -> js_sys::Array {
        self.inner
            .borrow()
            .objects
            .find_game_objects_by_tag(tag)
            .iter()
            .map(|object| JsValue::from_str(&object.id().to_string()))
            .collect()
    }

    /// タグを設定（タグ索引も更新される）
    pub fn set_tag(&self, id: &str, tag: &str) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        self.inner.borrow_mut().objects.set_tag(entity_id, tag)
    }

    /// 位置を設定
    pub fn set_position(&self, id: &str, x: f64, y: f64) -> bool {
        self.with_transform(id, |transform| transform.set_position(x, y))
    }

    /// 速度を設定
    pub fn set_velocity(&self, id: &str, x: f64, y: f64) -> bool {
        self.with_transform(id, |transform| transform.set_velocity(x, y))
    }

    /// 力を加える（加速度アキュムレータへの加算）
    pub fn add_force(&self, id: &str, x: f64, y: f64) -> bool {
        self.with_transform(id, |transform| transform.add_force(x, y))
    }

    /// 位置を取得（[x, y] または null）
    pub fn position(&self, id: &str) -> JsValue {
        let Some(entity_id) = Self::parse_id(id) else {
            return JsValue::NULL;
        };
        self.inner
            .borrow()
            .objects
            .get(entity_id)
            .and_then(|object| object.transform())
            .map(|transform| {
                js_sys::Array::of2(
                    &JsValue::from_f64(transform.x),
                    &JsValue::from_f64(transform.y),
                )
                .into()
            })
            .unwrap_or(JsValue::NULL)
    }

    /// アクティブ状態を設定
    pub fn set_active(&self, id: &str, active: bool) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        self.inner
            .borrow_mut()
            .objects
            .get_mut(entity_id)
            .map(|object| object.set_active(active))
            .is_some()
    }

    /// グローバル重力ベクトルを設定
    pub fn set_global_gravity(&self, x: f64, y: f64) {
        self.inner.borrow_mut().objects.set_global_gravity(x, y);
    }

    /// コライダー輪郭の描画を切り替え
    pub fn set_show_colliders(&self, show: bool) {
        self.inner.borrow_mut().objects.set_show_colliders(show);
    }

    /// 全ゲームオブジェクトを破棄
    pub fn clear_objects(&self) {
        let mut ctx = self.inner.borrow_mut();
        ctx.objects.clear();
        ctx.js_collision_hooks.clear();
    }

    // ========== 衝突フック ==========

    /// 衝突開始フックを登録
    pub fn on_collision_enter(&self, id: &str, handler: js_sys::Function) -> bool {
        self.set_hook(id, HookKind::CollisionEnter, handler)
    }

    /// 衝突終了フックを登録
    pub fn on_collision_exit(&self, id: &str, handler: js_sys::Function) -> bool {
        self.set_hook(id, HookKind::CollisionExit, handler)
    }

    /// トリガー開始フックを登録
    pub fn on_trigger_enter(&self, id: &str, handler: js_sys::Function) -> bool {
        self.set_hook(id, HookKind::TriggerEnter, handler)
    }

    /// トリガー終了フックを登録
    pub fn on_trigger_exit(&self, id: &str, handler: js_sys::Function) -> bool {
        self.set_hook(id, HookKind::TriggerExit, handler)
    }

    /// 見た目を矩形または円へ切り替え
    ///
    /// `shape` は "rect" または "circle" です。
    pub fn set_visual_shape(&self, id: &str, shape: &str, color: &str) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        let visual = match shape {
            "circle" => object::Visual::Circle {
                color: color.to_string(),
            },
            "rect" => object::Visual::Rect {
                color: color.to_string(),
            },
            other => {
                log::warn!("未知の形状指定: {}", other);
                return false;
            }
        };
        self.inner
            .borrow_mut()
            .objects
            .get_mut(entity_id)
            .and_then(|object| object.get_component_mut::<object::ShapeRenderer>())
            .map(|renderer| renderer.set_visual(visual))
            .is_some()
    }

    /// トリガーフラグを設定
    pub fn set_trigger(&self, id: &str, is_trigger: bool) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        self.inner
            .borrow_mut()
            .objects
            .get_mut(entity_id)
            .and_then(|object| object.get_component_mut::<BoxCollider>())
            .map(|collider| collider.is_trigger = is_trigger)
            .is_some()
    }

    // ========== アニメーション ==========

    /// アニメーションループを開始
    ///
    /// コールバックはフレームごとに `(経過ミリ秒, フレーム番号)` を
    /// 受け取ります。
    pub fn start_animation(
        &self,
        callback: js_sys::Function,
        target_fps: Option<f64>,
    ) -> Result<(), JsValue> {
        let animation = self.inner.borrow().animation.clone();
        let on_frame = move |delta: f64, frame: u64| {
            if let Err(err) = callback.call2(
                &JsValue::NULL,
                &JsValue::from_f64(delta),
                &JsValue::from_f64(frame as f64),
            ) {
                log::warn!("フレームコールバックでエラー: {:?}", err);
            }
        };
        animation.start(on_frame, target_fps.unwrap_or(60.0))
    }

    /// アニメーションループを停止
    pub fn stop_animation(&self) {
        self.inner.borrow().animation.stop();
    }

    /// 直近のFPSを取得
    pub fn fps(&self) -> u32 {
        self.inner.borrow().animation.current_fps()
    }

    /// アニメーション情報を取得
    pub fn animation_info(&self) -> JsValue {
        let animation = self.inner.borrow().animation.clone();
        let info = js_sys::Object::new();
        let entries: [(&str, JsValue); 4] = [
            ("isRunning", JsValue::from_bool(animation.is_running())),
            (
                "frameCount",
                JsValue::from_f64(animation.frame_count() as f64),
            ),
            (
                "currentFps",
                JsValue::from_f64(f64::from(animation.current_fps())),
            ),
            (
                "averageFps",
                JsValue::from_f64(f64::from(animation.average_fps())),
            ),
        ];
        for (key, value) in entries {
            let _ = js_sys::Reflect::set(&info, &JsValue::from_str(key), &value);
        }
        info.into()
    }

    // ========== 入力 ==========

    /// クリック可能領域を追加（座標は左下原点）
    pub fn add_clickable(&self, id: &str, x: f64, y: f64, width: f64, height: f64) {
        self.inner
            .borrow_mut()
            .input
            .add_clickable(ClickableElement::new(id, x, y, width, height));
    }

    /// クリック可能領域のハンドラを設定
    pub fn set_clickable_handler(&self, id: &str, handler: js_sys::Function) -> bool {
        self.inner
            .borrow_mut()
            .input
            .get_clickable_mut(id)
            .map(|element| element.set_handler(handler))
            .is_some()
    }

    /// クリック可能領域を移動（サイズの変更は省略可能）
    pub fn move_clickable(
        &self,
        id: &str,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> bool {
        self.inner
            .borrow_mut()
            .input
            .get_clickable_mut(id)
            .map(|element| element.update_position(x, y, width, height))
            .is_some()
    }

    /// クリック可能領域の可視状態を設定（不可視はヒットしない）
    pub fn set_clickable_visible(&self, id: &str, visible: bool) -> bool {
        self.inner
            .borrow_mut()
            .input
            .get_clickable_mut(id)
            .map(|element| element.visible = visible)
            .is_some()
    }

    /// クリック可能領域の有効状態を設定（無効はヒットしない）
    pub fn set_clickable_enabled(&self, id: &str, enabled: bool) -> bool {
        self.inner
            .borrow_mut()
            .input
            .get_clickable_mut(id)
            .map(|element| element.enabled = enabled)
            .is_some()
    }

    /// クリック可能領域を除去
    pub fn remove_clickable(&self, id: &str) -> bool {
        self.inner.borrow_mut().input.remove_clickable(id)
    }

    /// 全てのクリック可能領域を除去
    pub fn clear_clickables(&self) {
        self.inner.borrow_mut().input.clear_clickables();
    }

    /// グローバルクリックリスナーを追加
    ///
    /// リスナーは全てのクリックについて `{x, y}`（左下原点）を
    /// 受け取ります。
    pub fn add_global_click_listener(&self, listener: js_sys::Function) {
        self.inner.borrow_mut().input.add_global_listener(listener);
    }

    /// キーリスナーを追加
    pub fn listen_key(&self, key: &str, listener: js_sys::Function) {
        self.inner.borrow_mut().input.listen_key(key, listener);
    }

    // ========== 描画プリミティブ ==========

    /// サーフェス全体をクリア
    pub fn clear_canvas(&self) {
        self.inner.borrow().surface.clear();
    }

    /// 塗りつぶし矩形を描画（サーフェス座標、左上原点）
    pub fn draw_rect(&self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        let style = ShapeStyle {
            fill_color: Some(color.to_string()),
            ..ShapeStyle::default()
        };
        self.inner.borrow().surface.draw_rect(x, y, width, height, &style);
    }

    /// 塗りつぶし円を描画（サーフェス座標、左上原点）
    pub fn draw_circle(&self, center_x: f64, center_y: f64, radius: f64, color: &str) {
        let style = ShapeStyle {
            fill_color: Some(color.to_string()),
            ..ShapeStyle::default()
        };
        self.inner
            .borrow()
            .surface
            .draw_circle(center_x, center_y, radius, &style);
    }

    /// テキストを描画（座標は左下原点）
    pub fn draw_text(&self, text: &str, x: f64, y: f64, font: &str, color: &str) {
        let style = TextStyle {
            font: font.to_string(),
            fill_color: Some(color.to_string()),
            ..TextStyle::default()
        };
        self.inner.borrow().surface.draw_text(text, x, y, &style);
    }

    /// テキストの寸法を測定（[width, height] を返す）
    pub fn measure_text(&self, text: &str, font: &str) -> js_sys::Array {
        let (width, height) = self.inner.borrow().surface.measure_text(text, font);
        js_sys::Array::of2(&JsValue::from_f64(width), &JsValue::from_f64(height))
    }

    // ========== 画像 ==========

    /// 画像を読み込んでキャッシュへ登録
    ///
    /// 解決値は画像ID（省略時はパス）です。
    pub fn load_image(&self, path: String, id: Option<String>) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            let image_id = id.unwrap_or_else(|| path.clone());
            let entry = ImageEntry::load(&path, &image_id).await?;
            inner.borrow_mut().surface.images_mut().insert(entry);
            Ok(JsValue::from_str(&image_id))
        })
    }

    /// キャッシュ済み画像を描画（座標は左下原点）
    pub fn draw_image(&self, id: &str, x: f64, y: f64, options_json: Option<String>) -> bool {
        let options = match options_json {
            Some(json) => match serde_json::from_str::<ImageDrawOptions>(&json) {
                Ok(options) => options,
                Err(err) => {
                    log::error!("画像描画オプションが不正です: {}", err);
                    return false;
                }
            },
            None => ImageDrawOptions::default(),
        };
        self.inner.borrow().surface.draw_image(id, x, y, &options)
    }

    /// 画像情報を取得（未ロードならnull）
    pub fn image_info(&self, id: &str) -> JsValue {
        let info = self.inner.borrow().surface.images().info(id);
        match info {
            Some(info) => serde_json::to_string(&info)
                .ok()
                .and_then(|json| js_sys::JSON::parse(&json).ok())
                .unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// 画像をキャッシュから除去
    pub fn remove_image(&self, id: &str) -> bool {
        self.inner.borrow_mut().surface.images_mut().remove(id)
    }

    /// 読み込み済みの画像ID一覧を取得
    pub fn loaded_images(&self) -> js_sys::Array {
        self.inner
            .borrow()
            .surface
            .images()
            .ids()
            .iter()
            .map(|id| JsValue::from_str(id))
            .collect()
    }

    // ========== ライフサイクル ==========

    /// アニメーションを止め、canvasをDOMから取り除く
    pub fn dispose(&self) {
        let mut ctx = self.inner.borrow_mut();
        ctx.animation.stop();
        ctx.objects.clear();
        ctx.js_collision_hooks.clear();
        ctx.surface.images_mut().clear();
        ctx.surface.remove();
    }
}

impl CanvasApp {
    fn with_transform(&self, id: &str, f: impl FnOnce(&mut Transform)) -> bool {
        let Some(entity_id) = Self::parse_id(id) else {
            return false;
        };
        self.inner
            .borrow_mut()
            .objects
            .get_mut(entity_id)
            .and_then(|object| object.transform_mut())
            .map(f)
            .is_some()
    }
}

// ========== アセット読み込みのエクスポート ==========

/// URLからテキストを取得
#[wasm_bindgen]
pub async fn fetch_text(url: String) -> Result<JsValue, JsValue> {
    assets::load_text(&url)
        .await
        .map(|text| JsValue::from_str(&text))
}

/// URLからJSONを取得（パース済みの値を返す）
#[wasm_bindgen]
pub async fn fetch_json(url: String) -> Result<JsValue, JsValue> {
    assets::load_json(&url).await
}

/// URLからバイナリを取得（Uint8Arrayを返す）
#[wasm_bindgen]
pub async fn fetch_binary(url: String) -> Result<JsValue, JsValue> {
    let bytes = assets::load_binary(&url).await?;
    Ok(js_sys::Uint8Array::from(bytes.as_slice()).into())
}

/// ファイル選択ダイアログを開いてテキストファイルを読み込む
///
/// 解決値は `{name, size, mimeType, content}` のオブジェクトです。
#[wasm_bindgen]
pub async fn open_text_file(accept: Option<String>) -> Result<JsValue, JsValue> {
    let picked = assets::open_text_file(accept.as_deref()).await?;
    let json =
        serde_json::to_string(&picked).map_err(|err| JsValue::from_str(&err.to_string()))?;
    js_sys::JSON::parse(&json)
}
