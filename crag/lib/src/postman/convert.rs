//! Collection -> OpenAPI conversion.

use std::collections::BTreeMap;

use serde_json::Value;

use super::collection::{
    Auth, Body, Collection, Description, Item, KeyValue, Request, SavedResponse, Url, UrlParts,
};
use crate::error::PostmanError;
use crate::openapi::{
    Components, Info, MediaType, OpenApiDocument, Operation, Parameter, ParameterLocation,
    RequestBody, Response, Schema, SecurityScheme, Server, Tag, scalar_from_text,
};

/// Headers that OpenAPI expresses through other means.
const IGNORED_HEADERS: [&str; 3] = ["content-type", "accept", "authorization"];

const DEFAULT_VERSION: &str = "1.0.0";

/// Options controlling the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Tag for requests that do not live inside a folder.
    pub default_tag: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            default_tag: "General".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn with_default_tag(default_tag: impl Into<String>) -> Self {
        Self {
            default_tag: default_tag.into(),
        }
    }
}

/// Converts a parsed collection into an OpenAPI 3.0 document.
///
/// ## Errors
///
/// Returns [`PostmanError::Empty`] if the collection holds no requests.
pub fn convert(
    collection: &Collection,
    options: &ConvertOptions,
) -> Result<OpenApiDocument, PostmanError> {
    let mut converter = Converter::new(collection, options);
    converter.walk(&collection.item, None);

    let document = converter.doc;
    if document.operation_count() == 0 {
        return Err(PostmanError::Empty(collection.info.name.clone()));
    }
    Ok(document)
}

struct Converter<'a> {
    collection: &'a Collection,
    options: &'a ConvertOptions,
    doc: OpenApiDocument,
}

/// A URL split into the parts the converter cares about.
#[derive(Debug, Default)]
struct UrlPieces {
    protocol: Option<String>,
    host: String,
    segments: Vec<String>,
    query: Vec<KeyValue>,
    variables: Vec<KeyValue>,
}

impl<'a> Converter<'a> {
    fn new(collection: &'a Collection, options: &'a ConvertOptions) -> Self {
        let info = Info {
            title: collection.info.name.clone(),
            description: collection.info.description.as_ref().and_then(Description::text),
            version: collection
                .variable("version")
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        };

        let mut doc = OpenApiDocument::new(info);
        if let Some(auth) = &collection.auth {
            apply_auth(&mut doc, auth);
        }

        Self {
            collection,
            options,
            doc,
        }
    }

    fn walk(&mut self, items: &'a [Item], folder: Option<&'a Item>) {
        for item in items {
            if let Some(children) = &item.item {
                // nested folders share the tag of their top-level folder
                self.walk(children, folder.or(Some(item)));
            } else if let Some(request) = &item.request {
                self.add_operation(item, request.clone().into_request(), folder);
            }
        }
    }

    fn tag_for(&self, folder: Option<&Item>) -> Tag {
        folder
            .and_then(|f| {
                let name = f.name.as_deref()?.trim();
                (!name.is_empty()).then(|| Tag {
                    name: name.to_string(),
                    description: f.description.as_ref().and_then(Description::text),
                })
            })
            .unwrap_or_else(|| Tag {
                name: self.options.default_tag.clone(),
                description: None,
            })
    }

    fn add_operation(&mut self, item: &Item, request: Request, folder: Option<&Item>) {
        let name = item.name.clone().unwrap_or_default();
        let Some(url) = &request.url else {
            tracing::warn!(request = %name, "skipping request without a URL");
            return;
        };

        let method = request
            .method
            .as_deref()
            .unwrap_or("GET")
            .trim()
            .to_ascii_lowercase();
        let pieces = self.resolve_url(url);
        let (path, mut parameters) = path_template(&pieces);

        if self.doc.operation(&method, &path).is_some() {
            tracing::warn!(
                request = %name,
                %method,
                %path,
                "duplicate operation, keeping the first one"
            );
            return;
        }

        if let Some(origin) = origin(&pieces) {
            if !self.doc.servers.iter().any(|s| s.url == origin) {
                self.doc.servers.push(Server { url: origin });
            }
        }

        parameters.extend(pieces.query.iter().filter(|kv| kv.is_usable()).map(query_param));
        if let Some(headers) = &request.header {
            parameters.extend(
                headers
                    .entries()
                    .iter()
                    .filter(|kv| kv.is_usable() && !is_ignored_header(kv))
                    .map(header_param),
            );
        }

        let tag = self.tag_for(folder);
        let operation = Operation {
            tags: vec![tag.name.clone()],
            summary: item.name.clone().filter(|n| !n.trim().is_empty()),
            description: item
                .description
                .as_ref()
                .or(request.description.as_ref())
                .and_then(Description::text),
            parameters,
            request_body: request.body.as_ref().and_then(request_body),
            responses: responses(&item.response),
        };

        self.doc
            .paths
            .entry(path)
            .or_default()
            .insert(method, operation);

        if !self.doc.tags.iter().any(|t| t.name == tag.name) {
            self.doc.tags.push(tag);
        }
    }

    fn resolve_url(&self, url: &Url) -> UrlPieces {
        let mut pieces = match url {
            Url::Raw(raw) => parse_raw_url(raw),
            Url::Structured(parts) if parts.host.is_none() && parts.path.is_none() => {
                let mut pieces = parts.raw.as_deref().map(parse_raw_url).unwrap_or_default();
                if !parts.query.is_empty() {
                    pieces.query = parts.query.clone();
                }
                pieces.variables = parts.variable.clone();
                pieces
            }
            Url::Structured(parts) => UrlPieces {
                protocol: parts.protocol.clone(),
                host: structured_host(parts),
                segments: parts.path.as_ref().map(|p| p.segments()).unwrap_or_default(),
                query: parts.query.clone(),
                variables: parts.variable.clone(),
            },
        };

        self.resolve_host(&mut pieces);
        pieces
    }

    /// Expands collection variables in the host, e.g. `{{baseUrl}}`.
    ///
    /// A variable may expand to a full base URL with its own protocol and path
    /// prefix; both are folded back into the pieces.
    fn resolve_host(&self, pieces: &mut UrlPieces) {
        let expanded = self.substitute(&pieces.host);
        if expanded == pieces.host {
            return;
        }

        let nested = parse_raw_url(&expanded);
        pieces.protocol = nested.protocol.or(pieces.protocol.take());
        pieces.host = nested.host;

        let mut segments = nested.segments;
        segments.append(&mut pieces.segments);
        pieces.segments = segments;
    }

    fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let name = rest[start + 2..start + 2 + len].trim();
            out.push_str(&rest[..start]);
            match self.collection.variable(name) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + 4 + len]),
            }
            rest = &rest[start + 4 + len..];
        }

        out.push_str(rest);
        out
    }
}

/// Splits a raw Postman URL into pieces.
///
/// Concrete URLs are parsed with [`url::Url`]. Raws that still hold
/// `{{variables}}` are not valid URLs and get split by hand.
fn parse_raw_url(raw: &str) -> UrlPieces {
    let raw = raw.trim();
    if !raw.contains("{{") {
        if let Ok(parsed) = url::Url::parse(raw) {
            if parsed.has_host() {
                return pieces_from_url(&parsed);
            }
        }
    }
    split_template_url(raw)
}

fn pieces_from_url(parsed: &url::Url) -> UrlPieces {
    let host = parsed.host_str().unwrap_or_default();
    UrlPieces {
        protocol: Some(parsed.scheme().to_string()),
        host: match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        },
        segments: parsed
            .path_segments()
            .map(|segments| segments.map(String::from).collect())
            .unwrap_or_default(),
        query: parsed.query().map(parse_query).unwrap_or_default(),
        variables: Vec::new(),
    }
}

fn split_template_url(raw: &str) -> UrlPieces {
    let without_fragment = raw.split_once('#').map_or(raw, |(before, _)| before);
    let (location, query) = match without_fragment.split_once('?') {
        Some((location, query)) => (location, parse_query(query)),
        None => (without_fragment, Vec::new()),
    };
    let (protocol, rest) = match location.split_once("://") {
        Some((protocol, rest)) => (Some(protocol.to_string()), rest),
        None => (None, location),
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));

    UrlPieces {
        protocol,
        host: host.to_string(),
        segments: path.split('/').map(String::from).collect(),
        query,
        variables: Vec::new(),
    }
}

fn parse_query(query: &str) -> Vec<KeyValue> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| KeyValue::new(&key, &value))
        .collect()
}

/// Host of a structured URL, with the separately stored port appended.
fn structured_host(parts: &UrlParts) -> String {
    let host = parts.host.as_ref().map(|h| h.joined(".")).unwrap_or_default();
    match parts.port.as_deref().map(str::trim) {
        Some(port) if !port.is_empty() && !host.is_empty() => format!("{host}:{port}"),
        _ => host,
    }
}

fn origin(pieces: &UrlPieces) -> Option<String> {
    let host = pieces.host.trim();
    if host.is_empty() {
        return None;
    }
    // an unresolved `{{host}}` is not a usable server URL
    if host.contains("{{") {
        tracing::debug!(host, "host variable is not defined, no server recorded");
        return None;
    }
    Some(match &pieces.protocol {
        Some(protocol) => format!("{protocol}://{host}"),
        None => host.to_string(),
    })
}

/// `:id` and `{{id}}` segments are path variables.
fn path_variable(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix(':') {
        return (!name.is_empty()).then_some(name);
    }
    segment
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn path_template(pieces: &UrlPieces) -> (String, Vec<Parameter>) {
    let mut params: Vec<Parameter> = Vec::new();
    let mut rendered = Vec::new();

    for segment in pieces.segments.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        match path_variable(segment) {
            Some(name) => {
                rendered.push(format!("{{{name}}}"));
                if !params.iter().any(|p| p.name == name) {
                    let variable = pieces
                        .variables
                        .iter()
                        .find(|v| v.key.as_deref() == Some(name));
                    let example = variable.and_then(KeyValue::value_text);
                    params.push(Parameter {
                        name: name.to_string(),
                        location: ParameterLocation::Path,
                        required: true,
                        description: variable.and_then(KeyValue::description_text),
                        schema: example
                            .as_deref()
                            .map_or_else(|| Schema::of_type("string"), Schema::infer_from_text),
                        example: example.as_deref().and_then(scalar_from_text),
                    });
                }
            }
            None => rendered.push(segment.to_string()),
        }
    }

    (format!("/{}", rendered.join("/")), params)
}

fn query_param(kv: &KeyValue) -> Parameter {
    let value = kv.value_text();
    Parameter {
        name: kv.key.clone().unwrap_or_default(),
        location: ParameterLocation::Query,
        required: false,
        description: kv.description_text(),
        schema: value
            .as_deref()
            .map_or_else(|| Schema::of_type("string"), Schema::infer_from_text),
        example: value.as_deref().and_then(scalar_from_text),
    }
}

fn is_ignored_header(kv: &KeyValue) -> bool {
    kv.key
        .as_deref()
        .is_some_and(|k| IGNORED_HEADERS.contains(&k.trim().to_ascii_lowercase().as_str()))
}

fn header_param(kv: &KeyValue) -> Parameter {
    Parameter {
        name: kv.key.clone().unwrap_or_default(),
        location: ParameterLocation::Header,
        required: false,
        description: kv.description_text(),
        schema: Schema::of_type("string"),
        example: kv.value_text().filter(|v| !v.is_empty()).map(Value::String),
    }
}

fn request_body(body: &Body) -> Option<RequestBody> {
    let (media_type, media) = match body.mode.as_deref() {
        Some("raw") | None => raw_body(body)?,
        Some("urlencoded") => (
            "application/x-www-form-urlencoded",
            form_body(&body.urlencoded, false)?,
        ),
        Some("formdata") => ("multipart/form-data", form_body(&body.formdata, true)?),
        Some("file") => (
            "application/octet-stream",
            MediaType {
                schema: Some(binary_schema()),
                example: None,
            },
        ),
        Some(other) => {
            tracing::debug!(mode = other, "body mode has no OpenAPI mapping, skipping");
            return None;
        }
    };

    Some(RequestBody {
        content: BTreeMap::from([(media_type.to_string(), media)]),
    })
}

fn raw_body(body: &Body) -> Option<(&'static str, MediaType)> {
    let raw = body.raw.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }

    let language = body.raw_language().map(str::to_ascii_lowercase);
    let declared_json = language.as_deref() == Some("json");
    let looks_json = raw.starts_with('{') || raw.starts_with('[');

    if declared_json || (language.is_none() && looks_json) {
        return Some(match serde_json::from_str::<Value>(raw) {
            Ok(value) => (
                "application/json",
                MediaType {
                    schema: Some(Schema::infer(&value)),
                    example: Some(value),
                },
            ),
            Err(err) => {
                // usually `{{variable}}` placeholders inside the JSON
                tracing::debug!(error = %err, "raw JSON body is not parseable, omitting example");
                (
                    "application/json",
                    MediaType {
                        schema: Some(Schema::of_type(if raw.starts_with('[') {
                            "array"
                        } else {
                            "object"
                        })),
                        example: None,
                    },
                )
            }
        });
    }

    let media_type = match language.as_deref() {
        Some("xml") => "application/xml",
        Some("html") => "text/html",
        _ => "text/plain",
    };
    Some((
        media_type,
        MediaType {
            schema: Some(Schema::of_type("string")),
            example: Some(Value::String(raw.to_string())),
        },
    ))
}

fn binary_schema() -> Schema {
    Schema {
        format: Some("binary".to_string()),
        ..Schema::of_type("string")
    }
}

fn form_body(fields: &[KeyValue], multipart: bool) -> Option<MediaType> {
    let properties: BTreeMap<String, Schema> = fields
        .iter()
        .filter(|kv| kv.is_usable())
        .map(|kv| {
            let name = kv.key.clone().unwrap_or_default();
            let is_file = multipart && kv.kind.as_deref() == Some("file");
            let schema = if is_file {
                Schema {
                    description: kv.description_text(),
                    ..binary_schema()
                }
            } else {
                let value = kv.value_text();
                Schema {
                    description: kv.description_text(),
                    example: value.as_deref().and_then(scalar_from_text),
                    ..value
                        .as_deref()
                        .map_or_else(|| Schema::of_type("string"), Schema::infer_from_text)
                }
            };
            (name, schema)
        })
        .collect();

    if properties.is_empty() {
        return None;
    }

    Some(MediaType {
        schema: Some(Schema {
            properties,
            ..Schema::of_type("object")
        }),
        example: None,
    })
}

fn responses(saved: &[SavedResponse]) -> BTreeMap<String, Response> {
    let mut responses = BTreeMap::new();

    for response in saved {
        let code = response.code.unwrap_or(200).to_string();
        if responses.contains_key(&code) {
            continue;
        }

        let description = [&response.name, &response.status]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("Response")
            .to_string();

        let content = response
            .body
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(|body| match serde_json::from_str::<Value>(body) {
                Ok(value) => (
                    "application/json".to_string(),
                    MediaType {
                        schema: Some(Schema::infer(&value)),
                        example: Some(value),
                    },
                ),
                Err(_) => (
                    "text/plain".to_string(),
                    MediaType {
                        schema: Some(Schema::of_type("string")),
                        example: Some(Value::String(body.to_string())),
                    },
                ),
            })
            .into_iter()
            .collect();

        responses.insert(code, Response { description, content });
    }

    if responses.is_empty() {
        responses.insert(
            "200".to_string(),
            Response {
                description: "Successful response".to_string(),
                content: BTreeMap::from([("application/json".to_string(), MediaType::default())]),
            },
        );
    }

    responses
}

fn apply_auth(doc: &mut OpenApiDocument, auth: &Auth) {
    let http = |scheme: &str| SecurityScheme {
        kind: "http".to_string(),
        scheme: Some(scheme.to_string()),
        name: None,
        location: None,
    };

    let (name, scheme) = match auth.kind.as_str() {
        "bearer" => ("bearerAuth", http("bearer")),
        "basic" => ("basicAuth", http("basic")),
        "apikey" => (
            "apiKeyAuth",
            SecurityScheme {
                kind: "apiKey".to_string(),
                scheme: None,
                name: Some(
                    auth.apikey_setting("key")
                        .unwrap_or_else(|| "X-API-Key".to_string()),
                ),
                location: Some(match auth.apikey_setting("in").as_deref() {
                    Some("query") => "query".to_string(),
                    _ => "header".to_string(),
                }),
            },
        ),
        other => {
            tracing::debug!(auth = other, "auth type has no security scheme mapping");
            return;
        }
    };

    doc.components
        .get_or_insert_with(Components::default)
        .security_schemes
        .insert(name.to_string(), scheme);
    doc.security
        .push(BTreeMap::from([(name.to_string(), Vec::new())]));
}
