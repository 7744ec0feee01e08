//! アニメーション駆動モジュール
//!
//! `requestAnimationFrame` によるフレームループを提供します。
//! 目標フレームレートに応じたフレームゲート、FPS計測、そして
//! コールバックへ `(経過ミリ秒, フレーム番号)` を渡す駆動部から
//! 構成されます。ゲートとFPS計測は純粋なロジックです。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// FPS履歴の最大サンプル数
pub const FPS_HISTORY_LIMIT: usize = 60;

/// フレームゲート
///
/// 目標レートに達するまでフレームを通さず、通す際は余り時間を
/// 持ち越してリズムのずれを防ぎます。
#[derive(Debug, Clone)]
pub struct FrameGate {
    frame_interval: f64,
    last_time: Option<f64>,
}

impl FrameGate {
    /// 目標FPSからフレームゲートを作成
    pub fn new(target_fps: f64) -> Self {
        let fps = if target_fps > 0.0 { target_fps } else { 60.0 };
        Self {
            frame_interval: 1000.0 / fps,
            last_time: None,
        }
    }

    /// フレーム間隔（ミリ秒）を取得
    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    /// タイムスタンプを与えてフレームを通すか判定
    ///
    /// 通す場合は前回通過からの経過ミリ秒を返します。初回の呼び出しは
    /// 基準時刻の記録のみを行い、フレームは通しません。
    pub fn tick(&mut self, now: f64) -> Option<f64> {
        let Some(last) = self.last_time else {
            self.last_time = Some(now);
            return None;
        };

        let delta = now - last;
        if delta >= self.frame_interval {
            self.last_time = Some(now - (delta % self.frame_interval));
            Some(delta)
        } else {
            None
        }
    }
}

/// FPS計測器
///
/// 1秒の窓ごとにフレーム数を集計し、直近値と履歴を保持します。
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames_in_window: u32,
    window_start: Option<f64>,
    current: u32,
    history: Vec<u32>,
}

impl FpsCounter {
    /// 新しいFPS計測器を作成
    pub fn new() -> Self {
        Self {
            frames_in_window: 0,
            window_start: None,
            current: 0,
            history: Vec::new(),
        }
    }

    /// 通過したフレームを記録
    pub fn record(&mut self, now: f64) {
        let start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;

        let elapsed = now - start;
        if elapsed >= 1000.0 {
            self.current = (self.frames_in_window as f64 * 1000.0 / elapsed).round() as u32;
            self.history.push(self.current);
            if self.history.len() > FPS_HISTORY_LIMIT {
                self.history.remove(0);
            }
            self.frames_in_window = 0;
            self.window_start = Some(now);
        }
    }

    /// 直近のFPSを取得
    pub fn current(&self) -> u32 {
        self.current
    }

    /// 履歴の平均FPSを取得
    pub fn average(&self) -> u32 {
        if self.history.is_empty() {
            return 0;
        }
        let sum: u64 = self.history.iter().map(|fps| u64::from(*fps)).sum();
        (sum as f64 / self.history.len() as f64).round() as u32
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// アニメーションループ
///
/// `requestAnimationFrame` で自身を再スケジュールするクロージャを
/// 管理します。状態は共有セルで持つため、ハンドルは複製できます。
#[derive(Clone)]
pub struct AnimationLoop {
    running: Rc<Cell<bool>>,
    raf_id: Rc<Cell<Option<i32>>>,
    frame_count: Rc<Cell<u64>>,
    current_fps: Rc<Cell<u32>>,
    average_fps: Rc<Cell<u32>>,
}

impl AnimationLoop {
    /// 新しいアニメーションループを作成
    pub fn new() -> Self {
        Self {
            running: Rc::new(Cell::new(false)),
            raf_id: Rc::new(Cell::new(None)),
            frame_count: Rc::new(Cell::new(0)),
            current_fps: Rc::new(Cell::new(0)),
            average_fps: Rc::new(Cell::new(0)),
        }
    }

    /// 実行中かどうかを確認
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// 累積フレーム数を取得
    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }

    /// 直近のFPSを取得
    pub fn current_fps(&self) -> u32 {
        self.current_fps.get()
    }

    /// 平均FPSを取得
    pub fn average_fps(&self) -> u32 {
        self.average_fps.get()
    }

    /// ループを開始
    ///
    /// コールバックは目標レートを満たしたフレームごとに
    /// `(経過ミリ秒, フレーム番号)` を受け取ります。既に実行中の
    /// 場合は警告を出して何もしません。
    pub fn start<F>(&self, mut on_frame: F, target_fps: f64) -> Result<(), JsValue>
    where
        F: FnMut(f64, u64) + 'static,
    {
        if self.running.get() {
            log::warn!("アニメーションループは既に実行中です");
            return Ok(());
        }
        self.running.set(true);
        self.frame_count.set(0);

        let mut gate = FrameGate::new(target_fps);
        let mut fps = FpsCounter::new();

        let running = Rc::clone(&self.running);
        let raf_id = Rc::clone(&self.raf_id);
        let frame_count = Rc::clone(&self.frame_count);
        let current_fps = Rc::clone(&self.current_fps);
        let average_fps = Rc::clone(&self.average_fps);

        let handle: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let next = Rc::clone(&handle);

        *handle.borrow_mut() = Some(Closure::new(move |now: f64| {
            if !running.get() {
                return;
            }

            if let Some(delta) = gate.tick(now) {
                let frame = frame_count.get() + 1;
                frame_count.set(frame);
                fps.record(now);
                current_fps.set(fps.current());
                average_fps.set(fps.average());
                on_frame(delta, frame);
            }

            if let Some(window) = web_sys::window() {
                if let Some(closure) = next.borrow().as_ref() {
                    match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                        Ok(id) => raf_id.set(Some(id)),
                        Err(err) => log::error!("requestAnimationFrameに失敗: {:?}", err),
                    }
                }
            }
        }));

        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("window not available"))?;
        let borrowed = handle.borrow();
        let closure = borrowed
            .as_ref()
            .ok_or_else(|| JsValue::from_str("animation closure missing"))?;
        let id = window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        self.raf_id.set(Some(id));

        log::info!("アニメーションループを開始 (目標FPS: {})", target_fps);
        Ok(())
    }

    /// ループを停止
    pub fn stop(&self) {
        if let Some(id) = self.raf_id.take() {
            if let Some(window) = web_sys::window() {
                if let Err(err) = window.cancel_animation_frame(id) {
                    log::warn!("cancelAnimationFrameに失敗: {:?}", err);
                }
            }
        }
        if self.running.replace(false) {
            log::info!("アニメーションループを停止しました");
        }
    }
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_passes_frames_at_target_rate() {
        let mut gate = FrameGate::new(10.0); // 100ms間隔

        assert_eq!(gate.tick(0.0), None); // 基準時刻の記録のみ
        assert_eq!(gate.tick(50.0), None);
        assert_eq!(gate.tick(100.0), Some(100.0));
        assert_eq!(gate.tick(150.0), None);
    }

    #[test]
    fn gate_carries_remainder_to_keep_cadence() {
        let mut gate = FrameGate::new(10.0);
        gate.tick(0.0);

        assert_eq!(gate.tick(210.0), Some(210.0));
        // 余りの10msが持ち越されるため、300msで次のフレームが通る
        assert_eq!(gate.tick(300.0), Some(100.0));
    }

    #[test]
    fn zero_target_falls_back_to_60fps() {
        let gate = FrameGate::new(0.0);
        assert!((gate.frame_interval() - 1000.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn fps_counter_samples_once_per_second() {
        let mut fps = FpsCounter::new();
        for i in 0..=10 {
            fps.record(f64::from(i) * 100.0);
        }
        assert_eq!(fps.current(), 11);
    }

    #[test]
    fn fps_history_is_bounded() {
        let mut fps = FpsCounter::new();
        let mut now = 0.0;
        for _ in 0..70 {
            now += 1000.0;
            fps.record(now);
        }
        assert!(fps.average() > 0);
        assert!(fps.history.len() <= FPS_HISTORY_LIMIT);
    }

    #[test]
    fn average_is_zero_before_first_sample() {
        let fps = FpsCounter::new();
        assert_eq!(fps.average(), 0);
        assert_eq!(fps.current(), 0);
    }
}
