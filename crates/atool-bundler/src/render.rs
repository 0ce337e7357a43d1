//! Chunk rendering.
//!
//! Modules are registered as factories on a shared `__atool__` object; the
//! first initial chunk carries the runtime that defines it.

use serde_json::Value;

use crate::module::Module;

const RUNTIME: &str = r#"var __atool__ = (function (g) {
  var rt = g.__atool__ = g.__atool__ || { modules: {}, cache: {} };
  rt.require = function (id) {
    var cached = rt.cache[id];
    if (cached) return cached.exports;
    var module = rt.cache[id] = { exports: {} };
    rt.modules[id].call(module.exports, module, module.exports, rt.require);
    return module.exports;
  };
  rt.style = function (css) {
    if (typeof document === "undefined") return;
    var el = document.createElement("style");
    el.appendChild(document.createTextNode(css));
    document.head.appendChild(el);
  };
  return rt;
})(typeof self !== "undefined" ? self : this);
"#;

/// How a module's body is produced.
pub enum Body<'a> {
    /// Script source after defines were applied.
    Script(&'a str),
    /// Style injected at runtime (not extracted).
    InlineStyle(&'a str),
    /// Parsed JSON document.
    Json(&'a Value),
    /// Public URL of an emitted file.
    Url(&'a str),
}

pub struct ChunkWriter {
    out: String,
}

impl ChunkWriter {
    pub fn new(name: &str, with_runtime: bool) -> Self {
        let mut out = format!("/* atool chunk: {name} */\n");
        if with_runtime {
            out.push_str(RUNTIME);
        }
        Self { out }
    }

    pub fn module(&mut self, module: &Module, body: Body<'_>) {
        let body = match body {
            Body::Script(source) => source.to_string(),
            Body::InlineStyle(css) => format!("__atool__.style({});", quote(css)),
            Body::Json(value) => format!("module.exports = {};", value),
            Body::Url(url) => format!("module.exports = {};", quote(url)),
        };
        self.out.push_str(&format!(
            "__atool__.modules[{id}] = function (module, exports, require) {{\n/* {name} */\n{body}\n}};\n",
            id = module.id,
            name = module.name,
        ));
    }

    /// Starts `ids` once the chunk is loaded.
    pub fn bootstrap(&mut self, ids: &[usize]) {
        for id in ids {
            self.out.push_str(&format!("__atool__.require({id});\n"));
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}
