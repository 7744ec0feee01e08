//! 座標変換モジュール
//!
//! シミュレーションは左下原点（Yは上向き）、canvasは左上原点
//! （Yは下向き）を使うため、描画と入力の両方でこの変換を通します。
//! 変換は全ての描画経路で同一でなければなりません。

/// ワールドY座標を描画サーフェスのY座標へ変換
///
/// 高さを持つ矩形状の描画物の左上Y座標を返します:
/// `surfaceY = surfaceHeight - y - height`
pub fn world_to_surface_y(surface_height: f64, y: f64, height: f64) -> f64 {
    surface_height - y - height
}

/// ワールド座標の点をサーフェス座標へ変換
pub fn world_to_surface_point(surface_height: f64, x: f64, y: f64) -> (f64, f64) {
    (x, surface_height - y)
}

/// サーフェス座標の点をワールド座標へ変換
pub fn surface_to_world_point(surface_height: f64, surface_x: f64, surface_y: f64) -> (f64, f64) {
    (surface_x, surface_height - surface_y)
}

/// クライアント座標（マウス/タッチイベント）をサーフェス座標へ変換
///
/// canvasの表示矩形と内部解像度の比率でスケーリングします。
///
/// # 引数
///
/// * `rect` - canvasの表示矩形 (left, top, width, height)
/// * `surface_size` - canvasの内部解像度 (width, height)
/// * `client` - クライアント座標 (x, y)
pub fn client_to_surface(
    rect: (f64, f64, f64, f64),
    surface_size: (f64, f64),
    client: (f64, f64),
) -> (f64, f64) {
    let (left, top, rect_width, rect_height) = rect;
    let (surface_width, surface_height) = surface_size;

    let scale_x = if rect_width > 0.0 {
        surface_width / rect_width
    } else {
        1.0
    };
    let scale_y = if rect_height > 0.0 {
        surface_height / rect_height
    } else {
        1.0
    };

    ((client.0 - left) * scale_x, (client.1 - top) * scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_placement_flips_y_axis() {
        // 高さ600のサーフェスで、y=100に高さ50の矩形を置くと
        // サーフェス上では y=450 になる
        assert_eq!(world_to_surface_y(600.0, 100.0, 50.0), 450.0);
        // 原点に置いた矩形は下端に張り付く
        assert_eq!(world_to_surface_y(600.0, 0.0, 50.0), 550.0);
    }

    #[test]
    fn point_conversion_round_trips() {
        let (x, y) = world_to_surface_point(600.0, 120.0, 80.0);
        assert_eq!((x, y), (120.0, 520.0));

        let (wx, wy) = surface_to_world_point(600.0, x, y);
        assert_eq!((wx, wy), (120.0, 80.0));
    }

    #[test]
    fn client_coordinates_are_scaled_by_display_size() {
        // 内部解像度800x600のcanvasが400x300で表示されている場合
        let rect = (10.0, 20.0, 400.0, 300.0);
        let surface = (800.0, 600.0);

        let (x, y) = client_to_surface(rect, surface, (10.0, 20.0));
        assert_eq!((x, y), (0.0, 0.0));

        let (x, y) = client_to_surface(rect, surface, (210.0, 170.0));
        assert_eq!((x, y), (400.0, 300.0));
    }

    #[test]
    fn degenerate_display_rect_falls_back_to_identity_scale() {
        let rect = (0.0, 0.0, 0.0, 0.0);
        let (x, y) = client_to_surface(rect, (800.0, 600.0), (5.0, 7.0));
        assert_eq!((x, y), (5.0, 7.0));
    }

    #[test]
    fn click_conversion_composes_with_world_flip() {
        // クリック位置をサーフェス座標へ、さらにワールド座標へ
        let rect = (0.0, 0.0, 800.0, 600.0);
        let (sx, sy) = client_to_surface(rect, (800.0, 600.0), (100.0, 550.0));
        let (wx, wy) = surface_to_world_point(600.0, sx, sy);
        assert_eq!((wx, wy), (100.0, 50.0));
    }
}
