//! WASM bindings for patchwire.
//!
//! Exposes an `App` class that renders a JavaScript rendering core into the
//! page. The core is any object with three methods:
//!
//! ```text
//! produceInitial(): Uint8Array
//! producePatch(): Uint8Array | undefined
//! handleEvent(record: Uint8Array): void
//! ```
//!
//! Every public `#[wasm_bindgen]` method does one unit of work; scheduling
//! (when to call `render`) is left to the page.

use patchwire::{Config, RenderError, Renderer};
use patchwire_protocol::Core;
use serde::Serialize as _;
use wasm_bindgen::prelude::*;

mod document;

pub use document::WebDocument;

#[wasm_bindgen]
extern "C" {
    /// A rendering core implemented in JavaScript.
    pub type JsCore;

    #[wasm_bindgen(method, js_name = "produceInitial")]
    fn js_produce_initial(this: &JsCore) -> Vec<u8>;

    #[wasm_bindgen(method, js_name = "producePatch")]
    fn js_produce_patch(this: &JsCore) -> Option<Vec<u8>>;

    #[wasm_bindgen(method, js_name = "handleEvent")]
    fn js_handle_event(this: &JsCore, record: &[u8]);
}

impl Core for JsCore {
    fn produce_initial(&mut self) -> Vec<u8> {
        self.js_produce_initial()
    }

    fn produce_patch(&mut self) -> Option<Vec<u8>> {
        self.js_produce_patch()
    }

    fn handle_event(&mut self, record: &[u8]) {
        self.js_handle_event(record)
    }
}

fn to_js(err: &RenderError) -> JsValue {
    JsValue::from_str(&format!("{:?} error: {err}", err.class()))
}

/// A page region kept in sync with a JavaScript core.
#[wasm_bindgen]
pub struct App {
    renderer: Renderer<WebDocument, JsCore>,
}

#[wasm_bindgen]
impl App {
    /// Binds `core` to the element named by the config's `mountPoint`.
    ///
    /// `config` is optional JSON; omitted fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(core: JsCore, config: Option<String>) -> Result<App, JsValue> {
        let config = match config {
            Some(json) => {
                Config::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => Config::default(),
        };
        let document = WebDocument::from_window(&config.mount_point)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(App {
            renderer: Renderer::with_config(document, core, config),
        })
    }

    /// Asks the core for its full tree and mounts it.
    pub fn mount(&mut self) -> Result<(), JsValue> {
        self.renderer.mount().map_err(|e| to_js(&e))
    }

    /// Pulls and applies one patch. Returns `false` if the core had none.
    pub fn render(&mut self) -> Result<bool, JsValue> {
        self.renderer.update().map_err(|e| to_js(&e))
    }

    /// Applies an encoded patch that did not come from `producePatch`.
    #[wasm_bindgen(js_name = "applyPatch")]
    pub fn apply_patch(&mut self, patch: &[u8]) -> Result<(), JsValue> {
        self.renderer.apply(patch).map_err(|e| to_js(&e))
    }

    /// The live tree read back from the DOM, as a plain JS object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let tree = self.renderer.snapshot().map_err(|e| to_js(&e))?;
        let ser = serde_wasm_bindgen::Serializer::json_compatible();
        tree.serialize(&ser).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = "listenerCount")]
    pub fn listener_count(&self) -> usize {
        self.renderer.listener_count()
    }
}
