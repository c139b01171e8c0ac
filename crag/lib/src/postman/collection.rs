//! Serde model for Postman Collection v2.0 / v2.1 files.
//!
//! Postman is lenient about shapes (descriptions may be strings or objects,
//! URLs may be strings or structured, headers may be a raw block), so most
//! fields are optional and several are untagged enums.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub info: CollectionInfo,
    #[serde(default)]
    pub item: Vec<Item>,
    #[serde(default)]
    pub variable: Vec<KeyValue>,
    #[serde(default)]
    pub auth: Option<Auth>,
}

impl Collection {
    /// Value of a collection-level variable, if defined and non-empty.
    pub fn variable(&self, key: &str) -> Option<String> {
        self.variable
            .iter()
            .find(|v| v.key.as_deref() == Some(key))
            .and_then(KeyValue::value_text)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<Description>,
}

/// Either a plain string or `{ "content": "...", "type": "text/markdown" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Rich {
        #[serde(default)]
        content: Option<String>,
    },
}

impl Description {
    pub fn text(&self) -> Option<String> {
        let text = match self {
            Description::Text(text) => Some(text.as_str()),
            Description::Rich { content } => content.as_deref(),
        };
        text.map(str::trim).filter(|t| !t.is_empty()).map(String::from)
    }
}

/// A folder (has `item`) or a request (has `request`).
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Description>,
    #[serde(default)]
    pub item: Option<Vec<Item>>,
    #[serde(default)]
    pub request: Option<RequestDef>,
    #[serde(default)]
    pub response: Vec<SavedResponse>,
}

/// v2 allows a request to be just its URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequestDef {
    Url(String),
    Full(Request),
}

impl RequestDef {
    pub fn into_request(self) -> Request {
        match self {
            RequestDef::Url(raw) => Request {
                url: Some(Url::Raw(raw)),
                ..Request::default()
            },
            RequestDef::Full(request) => request,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub header: Option<Headers>,
    #[serde(default)]
    pub url: Option<Url>,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub description: Option<Description>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Headers {
    List(Vec<KeyValue>),
    /// `Key: Value` lines.
    Raw(String),
}

impl Headers {
    pub fn entries(&self) -> Vec<KeyValue> {
        match self {
            Headers::List(list) => list.clone(),
            Headers::Raw(raw) => raw
                .lines()
                .filter_map(|line| line.split_once(':'))
                .map(|(key, value)| KeyValue::new(key.trim(), value.trim()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Url {
    Raw(String),
    Structured(UrlParts),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlParts {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub host: Option<StringOrList>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub path: Option<PathSpec>,
    #[serde(default)]
    pub query: Vec<KeyValue>,
    #[serde(default)]
    pub variable: Vec<KeyValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn joined(&self, sep: &str) -> String {
        match self {
            StringOrList::One(s) => s.clone(),
            StringOrList::Many(parts) => parts.join(sep),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    One(String),
    Many(Vec<PathSegment>),
}

impl PathSpec {
    pub fn segments(&self) -> Vec<String> {
        match self {
            PathSpec::One(path) => path.split('/').map(String::from).collect(),
            PathSpec::Many(segments) => segments.iter().map(PathSegment::text).collect(),
        }
    }
}

/// v2.0 allows `{ "type": "string", "value": "users" }` segments.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Text(String),
    Object {
        #[serde(default)]
        value: Option<String>,
    },
}

impl PathSegment {
    fn text(&self) -> String {
        match self {
            PathSegment::Text(text) => text.clone(),
            PathSegment::Object { value } => value.clone().unwrap_or_default(),
        }
    }
}

/// The generic `{ key, value, disabled, description }` shape Postman uses for
/// headers, query entries, variables and form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyValue {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub description: Option<Description>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl KeyValue {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            value: Some(Value::String(value.to_string())),
            ..Self::default()
        }
    }

    /// The value rendered as text; non-string JSON values are stringified.
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn description_text(&self) -> Option<String> {
        self.description.as_ref().and_then(Description::text)
    }

    /// Enabled entries with a non-empty key.
    pub fn is_usable(&self) -> bool {
        !self.disabled && self.key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub urlencoded: Vec<KeyValue>,
    #[serde(default)]
    pub formdata: Vec<KeyValue>,
    #[serde(default)]
    pub options: Option<BodyOptions>,
}

impl Body {
    /// Language hint for raw bodies, e.g. `json` or `xml`.
    pub fn raw_language(&self) -> Option<&str> {
        self.options
            .as_ref()?
            .raw
            .as_ref()?
            .language
            .as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyOptions {
    #[serde(default)]
    pub raw: Option<RawOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOptions {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub apikey: Vec<KeyValue>,
}

impl Auth {
    /// Looks up a setting of the `apikey` auth block.
    pub fn apikey_setting(&self, key: &str) -> Option<String> {
        self.apikey
            .iter()
            .find(|kv| kv.key.as_deref() == Some(key))
            .and_then(KeyValue::value_text)
    }
}
