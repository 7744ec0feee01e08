//! 入力ルーティングモジュール
//!
//! クリック/タップと押下キーをシミュレーション座標系へ橋渡しします。
//! クリックはまず全てのグローバルリスナーへ配信され、その後
//! クリック可能領域を新しい順にヒットテストして最初の一致だけが
//! 発火します。ハンドラ呼び出しは収集と実行が分離されており、
//! 収集中に保持した借用を解放してから実行できます。

use std::collections::HashMap;

use wasm_bindgen::prelude::*;

/// クリック可能な矩形領域
///
/// 座標は左下原点のワールド座標です。
pub struct ClickableElement {
    id: String,
    /// 左下X座標
    pub x: f64,
    /// 左下Y座標
    pub y: f64,
    /// 幅
    pub width: f64,
    /// 高さ
    pub height: f64,
    /// 中心X座標（位置更新時に再計算される）
    pub center_x: f64,
    /// 中心Y座標（位置更新時に再計算される）
    pub center_y: f64,
    /// 可視かどうか（不可視はヒットしない）
    pub visible: bool,
    /// 有効かどうか（無効はヒットしない）
    pub enabled: bool,
    handler: Option<js_sys::Function>,
}

impl ClickableElement {
    /// 新しいクリック可能領域を作成
    pub fn new(id: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            center_x: x + width / 2.0,
            center_y: y + height / 2.0,
            visible: true,
            enabled: true,
            handler: None,
        }
    }

    /// 領域IDを取得
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 点が領域内にあるかどうかを判定
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.visible || !self.enabled {
            return false;
        }
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// 位置とサイズを更新（中心も再計算）
    pub fn update_position(&mut self, x: f64, y: f64, width: Option<f64>, height: Option<f64>) {
        self.x = x;
        self.y = y;
        if let Some(width) = width {
            self.width = width;
        }
        if let Some(height) = height {
            self.height = height;
        }
        self.center_x = self.x + self.width / 2.0;
        self.center_y = self.y + self.height / 2.0;
    }

    /// クリックハンドラを設定
    pub fn set_handler(&mut self, handler: js_sys::Function) {
        self.handler = Some(handler);
    }

    fn payload(&self, click_x: f64, click_y: f64) -> JsValue {
        let object = js_sys::Object::new();
        let entries: [(&str, JsValue); 5] = [
            ("elementId", JsValue::from_str(&self.id)),
            ("centerX", JsValue::from_f64(self.center_x)),
            ("centerY", JsValue::from_f64(self.center_y)),
            ("clickX", JsValue::from_f64(click_x)),
            ("clickY", JsValue::from_f64(click_y)),
        ];
        for (key, value) in entries {
            let _ = js_sys::Reflect::set(&object, &JsValue::from_str(key), &value);
        }
        object.into()
    }
}

/// クリック可能領域の中から最初にヒットする要素を探す
///
/// 後から追加された要素を優先するため、末尾から探索します。
pub fn hit_index(elements: &[ClickableElement], x: f64, y: f64) -> Option<usize> {
    elements
        .iter()
        .enumerate()
        .rev()
        .find(|(_, element)| element.contains(x, y))
        .map(|(index, _)| index)
}

/// 入力ルーター
pub struct InputRouter {
    clickables: Vec<ClickableElement>,
    global_listeners: Vec<js_sys::Function>,
    key_listeners: HashMap<String, Vec<js_sys::Function>>,
}

impl InputRouter {
    /// 新しい入力ルーターを作成
    pub fn new() -> Self {
        Self {
            clickables: Vec::new(),
            global_listeners: Vec::new(),
            key_listeners: HashMap::new(),
        }
    }

    /// クリック可能領域を追加
    pub fn add_clickable(&mut self, element: ClickableElement) {
        log::debug!(
            "クリック可能領域を追加: {} at ({}, {})",
            element.id,
            element.x,
            element.y
        );
        self.clickables.push(element);
    }

    /// クリック可能領域を取得
    pub fn get_clickable(&self, id: &str) -> Option<&ClickableElement> {
        self.clickables.iter().find(|element| element.id == id)
    }

    /// クリック可能領域を可変で取得
    pub fn get_clickable_mut(&mut self, id: &str) -> Option<&mut ClickableElement> {
        self.clickables.iter_mut().find(|element| element.id == id)
    }

    /// クリック可能領域を除去
    pub fn remove_clickable(&mut self, id: &str) -> bool {
        let before = self.clickables.len();
        self.clickables.retain(|element| element.id != id);
        before != self.clickables.len()
    }

    /// 全てのクリック可能領域を除去
    pub fn clear_clickables(&mut self) {
        self.clickables.clear();
    }

    /// グローバルクリックリスナーを追加
    pub fn add_global_listener(&mut self, listener: js_sys::Function) {
        self.global_listeners.push(listener);
    }

    /// グローバルクリックリスナーを全て除去
    pub fn clear_global_listeners(&mut self) {
        self.global_listeners.clear();
    }

    /// キーリスナーを追加（キー名は小文字へ正規化）
    pub fn listen_key(&mut self, key: &str, listener: js_sys::Function) {
        self.key_listeners
            .entry(key.to_lowercase())
            .or_default()
            .push(listener);
    }

    /// クリックに対して呼び出すべきハンドラを収集
    ///
    /// `(x, y)` は左下原点のワールド座標です。戻り値のハンドラは
    /// 借用を解放した後に呼び出してください。
    pub fn collect_click_dispatch(&self, x: f64, y: f64) -> Vec<(js_sys::Function, JsValue)> {
        let mut calls = Vec::new();

        for listener in &self.global_listeners {
            let payload = js_sys::Object::new();
            let _ = js_sys::Reflect::set(&payload, &JsValue::from_str("x"), &JsValue::from_f64(x));
            let _ = js_sys::Reflect::set(&payload, &JsValue::from_str("y"), &JsValue::from_f64(y));
            calls.push((listener.clone(), payload.into()));
        }

        if let Some(index) = hit_index(&self.clickables, x, y) {
            let element = &self.clickables[index];
            if let Some(handler) = &element.handler {
                calls.push((handler.clone(), element.payload(x, y)));
            }
        }

        calls
    }

    /// 押下キーに対して呼び出すべきハンドラを収集
    pub fn collect_key_dispatch(&self, key: &str) -> Vec<js_sys::Function> {
        self.key_listeners
            .get(&key.to_lowercase())
            .map(|listeners| listeners.to_vec())
            .unwrap_or_default()
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_of_edges() {
        let element = ClickableElement::new("button", 10.0, 20.0, 100.0, 50.0);
        assert!(element.contains(10.0, 20.0));
        assert!(element.contains(110.0, 70.0));
        assert!(element.contains(60.0, 45.0));
        assert!(!element.contains(9.9, 45.0));
        assert!(!element.contains(60.0, 70.1));
    }

    #[test]
    fn invisible_or_disabled_elements_do_not_hit() {
        let mut element = ClickableElement::new("button", 0.0, 0.0, 10.0, 10.0);
        element.visible = false;
        assert!(!element.contains(5.0, 5.0));

        element.visible = true;
        element.enabled = false;
        assert!(!element.contains(5.0, 5.0));
    }

    #[test]
    fn newest_element_wins_hit_test() {
        let older = ClickableElement::new("older", 0.0, 0.0, 10.0, 10.0);
        let newer = ClickableElement::new("newer", 5.0, 5.0, 10.0, 10.0);
        let elements = vec![older, newer];

        // 重なった領域では後から追加された方が優先される
        assert_eq!(hit_index(&elements, 7.0, 7.0), Some(1));
        // 重ならない位置では古い方にヒットする
        assert_eq!(hit_index(&elements, 2.0, 2.0), Some(0));
        assert_eq!(hit_index(&elements, 50.0, 50.0), None);
    }

    #[test]
    fn update_position_recomputes_center() {
        let mut element = ClickableElement::new("button", 0.0, 0.0, 10.0, 10.0);
        assert_eq!((element.center_x, element.center_y), (5.0, 5.0));

        element.update_position(100.0, 200.0, Some(40.0), None);
        assert_eq!((element.center_x, element.center_y), (120.0, 205.0));
    }

    #[test]
    fn router_tracks_clickables_by_id() {
        let mut router = InputRouter::new();
        router.add_clickable(ClickableElement::new("a", 0.0, 0.0, 10.0, 10.0));
        router.add_clickable(ClickableElement::new("b", 20.0, 0.0, 10.0, 10.0));

        assert!(router.get_clickable("a").is_some());
        assert!(router.remove_clickable("a"));
        assert!(router.get_clickable("a").is_none());
        assert!(!router.remove_clickable("a"));

        router.clear_clickables();
        assert!(router.get_clickable("b").is_none());
    }
}
