//! アセット読み込みモジュール
//!
//! fetchによるテキスト/JSON/バイナリの取得と、ファイル選択
//! ダイアログによるローカルファイルの読み込みを提供します。
//! すべて非同期で、完了はFutureの解決として通知されます。

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlInputElement, Response};

/// 選択されたファイルの内容と情報
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedFile {
    /// ファイル名
    pub name: String,
    /// バイトサイズ
    pub size: f64,
    /// MIMEタイプ
    pub mime_type: String,
    /// テキストとして読み込んだ内容
    pub content: String,
}

async fn fetch_response(url: &str) -> Result<Response, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window not available"))?;
    let response_value = JsFuture::from(window.fetch_with_str(url)).await?;
    let response: Response = response_value.dyn_into()?;

    if !response.ok() {
        log::error!("リソースの取得に失敗: {} (status {})", url, response.status());
        return Err(JsValue::from_str(&format!(
            "HTTP error: {}",
            response.status()
        )));
    }
    Ok(response)
}

/// URLからテキストを読み込む
pub async fn load_text(url: &str) -> Result<String, JsValue> {
    let response = fetch_response(url).await?;
    let text = JsFuture::from(response.text()?).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}

/// URLからJSONを読み込む（パース済みの値を返す）
pub async fn load_json(url: &str) -> Result<JsValue, JsValue> {
    let response = fetch_response(url).await?;
    JsFuture::from(response.json()?).await
}

/// URLからバイナリを読み込む
pub async fn load_binary(url: &str) -> Result<Vec<u8>, JsValue> {
    let response = fetch_response(url).await?;
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// ファイル選択ダイアログを開き、選ばれたファイルをテキストとして読む
///
/// `accept` はinput要素のaccept属性に渡されます。ユーザーが
/// ファイルを選ばずにダイアログを閉じた場合、changeイベントは
/// 発生しないためFutureは解決されません。
pub async fn open_text_file(accept: Option<&str>) -> Result<PickedFile, JsValue> {
    let document = web_sys::window()
        .ok_or_else(|| JsValue::from_str("window not available"))?
        .document()
        .ok_or_else(|| JsValue::from_str("document not available"))?;

    let input = document
        .create_element("input")?
        .dyn_into::<HtmlInputElement>()?;
    input.set_type("file");
    if let Some(accept) = accept {
        input.set_accept(accept);
    }
    input.style().set_property("display", "none")?;

    document
        .body()
        .ok_or_else(|| JsValue::from_str("body not available"))?
        .append_child(&input)?;

    // changeイベントが来るまで待つ
    let target = input.clone();
    let selected = js_sys::Promise::new(&mut |resolve, _reject| {
        let on_change = Closure::once_into_js(move |_event: web_sys::Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        target.set_onchange(Some(on_change.unchecked_ref()));
    });
    input.click();
    JsFuture::from(selected).await?;

    let result = read_selected_file(&input).await;
    input.remove();
    result
}

async fn read_selected_file(input: &HtmlInputElement) -> Result<PickedFile, JsValue> {
    let file = input
        .files()
        .and_then(|files| files.get(0))
        .ok_or_else(|| {
            log::warn!("ファイルが選択されませんでした");
            JsValue::from_str("no file selected")
        })?;

    let content = JsFuture::from(file.text()).await?;
    log::info!("ファイルを読み込みました: {}", file.name());

    Ok(PickedFile {
        name: file.name(),
        size: file.size(),
        mime_type: file.type_(),
        content: content.as_string().unwrap_or_default(),
    })
}
