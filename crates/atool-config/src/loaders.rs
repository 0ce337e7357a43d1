//! Default loader rule table and resolve settings.
//!
//! Pure configuration data: which loader chain handles which file pattern.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One entry of `module.loaders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderRule {
    /// Regular expression matched against the module path.
    pub test: String,

    /// Paths matching this expression are skipped by the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Loader chain, applied right to left.
    pub loaders: Vec<String>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub query: Value,
}

impl LoaderRule {
    fn new(test: &str, loaders: &[&str]) -> Self {
        Self {
            test: test.to_string(),
            exclude: None,
            loaders: loaders.iter().map(|l| l.to_string()).collect(),
            query: Value::Null,
        }
    }

    fn exclude(mut self, pattern: &str) -> Self {
        self.exclude = Some(pattern.to_string());
        self
    }

    fn query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }
}

/// Node built-ins replaced by empty modules unless `package.json#browser` maps them.
pub const EMPTY_BUILTINS: &[&str] = &[
    "child_process",
    "cluster",
    "dgram",
    "dns",
    "fs",
    "module",
    "net",
    "readline",
    "repl",
    "tls",
];

pub const RESOLVE_EXTENSIONS: &[&str] = &[
    "", ".web.tsx", ".web.ts", ".web.jsx", ".web.js", ".ts", ".tsx", ".js", ".jsx", ".json",
];

const CSS_MODULE_IDENT: &str = "[local]___[hash:base64:5]";

/// Rules in match order; the first matching rule wins.
pub fn default_rules() -> Vec<LoaderRule> {
    vec![
        LoaderRule::new(r"\.js$", &["babel"]).exclude("node_modules"),
        LoaderRule::new(r"\.jsx$", &["babel"]),
        LoaderRule::new(r"\.tsx?$", &["babel", "ts"]),
        LoaderRule::new(r"\.module\.css$", &["css", "postcss"]).query(json!({
            "modules": true,
            "localIdentName": CSS_MODULE_IDENT,
        })),
        LoaderRule::new(r"\.css$", &["css", "postcss"]),
        LoaderRule::new(r"\.module\.less$", &["css", "postcss", "less"]).query(json!({
            "modules": true,
            "localIdentName": CSS_MODULE_IDENT,
        })),
        LoaderRule::new(r"\.less$", &["css", "postcss", "less"]),
        url_rule(r"\.woff(\?v=\d+\.\d+\.\d+)?$", Some("application/font-woff")),
        url_rule(r"\.woff2(\?v=\d+\.\d+\.\d+)?$", Some("application/font-woff")),
        url_rule(r"\.ttf(\?v=\d+\.\d+\.\d+)?$", Some("application/octet-stream")),
        url_rule(r"\.eot(\?v=\d+\.\d+\.\d+)?$", Some("application/vnd.ms-fontobject")),
        url_rule(r"\.svg(\?v=\d+\.\d+\.\d+)?$", Some("image/svg+xml")),
        url_rule(r"(?i)\.(png|jpg|jpeg|gif)(\?v=\d+\.\d+\.\d+)?$", None),
        LoaderRule::new(r"\.json$", &["json"]),
        LoaderRule::new(r"\.html?$", &["file"]).query(json!({ "name": "[name].[ext]" })),
    ]
}

fn url_rule(test: &str, mimetype: Option<&str>) -> LoaderRule {
    let mut query = json!({ "limit": 10000 });
    if let Some(mimetype) = mimetype {
        query["mimetype"] = json!(mimetype);
    }
    LoaderRule::new(test, &["url"]).query(query)
}
