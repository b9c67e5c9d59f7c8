//! Browser entry point

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::ObjViewerApp;

/// Id of the canvas element the viewer attaches to
const CANVAS_ID: &str = "objview_canvas";

#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .ok_or_else(|| JsValue::from_str("missing viewer canvas"))?
        .dyn_into::<web_sys::HtmlCanvasElement>()?;

    eframe::WebRunner::new()
        .start(
            canvas,
            eframe::WebOptions::default(),
            Box::new(|cc| Ok(Box::new(ObjViewerApp::new(cc)))),
        )
        .await
}
