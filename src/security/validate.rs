//! Schema-driven validation gate.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → sanitize query values, reject flagged ones
//!     → read + parse JSON body
//!     → sanitize recursively (sanitize.rs)
//!     → structural validation against the schema
//!     → category refinements (patterns.rs)
//!     → sanitized payload replaces the body, or 400 with every violation
//! ```
//!
//! # Design Decisions
//! - All-or-nothing: one violated field aborts the request before any
//!   handler logic runs
//! - Violations are collected, not first-fail, so the caller sees the
//!   full list in one round trip
//! - Idempotent: re-validating an accepted payload changes nothing

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::{FieldViolation, GateError};
use crate::observability::metrics;
use crate::security::patterns::{
    is_prompt_injection_like, is_sql_injection_like, is_xss_like, PatternCategory,
};
use crate::security::sanitize::{sanitize_text, sanitize_value};

/// Expected shape of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; refined against SQL/XSS patterns.
    Text,
    /// AI prompt text; additionally refined against prompt injection.
    Prompt,
    Email,
    Number,
    Boolean,
}

/// Constraints attached to one schema field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    max_len: Option<usize>,
}

impl FieldRule {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            max_len: None,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    pub fn prompt() -> Self {
        Self::new(FieldKind::Prompt)
    }

    pub fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_len(mut self, limit: usize) -> Self {
        self.max_len = Some(limit);
        self
    }
}

/// Field name → rule. Unknown fields pass through sanitized but unchecked.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    fields: BTreeMap<String, FieldRule>,
}

/// Result of one validation attempt. Lives for the duration of a single
/// request only.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Payload accepted; holds the sanitized tree that replaces the original.
    Accepted(Value),
    Rejected(Vec<FieldViolation>),
}

impl ValidationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    /// Sanitize and validate a payload.
    pub fn apply(&self, mut payload: Value) -> ValidationOutcome {
        sanitize_value(&mut payload);

        let object = match payload.as_object() {
            Some(map) => map,
            None => {
                return ValidationOutcome::Rejected(vec![FieldViolation::new(
                    "body",
                    "payload must be a JSON object",
                )])
            }
        };

        let mut violations = Vec::new();
        for (name, rule) in &self.fields {
            match object.get(name) {
                None | Some(Value::Null) => {
                    if rule.required {
                        violations.push(FieldViolation::new(name, "field is required"));
                    }
                }
                Some(value) => self.check_field(name, rule, value, &mut violations),
            }
        }

        if violations.is_empty() {
            ValidationOutcome::Accepted(payload)
        } else {
            ValidationOutcome::Rejected(violations)
        }
    }

    fn check_field(
        &self,
        name: &str,
        rule: &FieldRule,
        value: &Value,
        violations: &mut Vec<FieldViolation>,
    ) {
        match rule.kind {
            FieldKind::Number => {
                if !value.is_number() {
                    violations.push(FieldViolation::new(name, "must be a number"));
                }
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    violations.push(FieldViolation::new(name, "must be a boolean"));
                }
            }
            FieldKind::Text | FieldKind::Prompt | FieldKind::Email => {
                let text = match value.as_str() {
                    Some(text) => text,
                    None => {
                        violations.push(FieldViolation::new(name, "must be a string"));
                        return;
                    }
                };
                if let Some(limit) = rule.max_len {
                    if text.chars().count() > limit {
                        violations.push(FieldViolation::new(
                            name,
                            format!("must be at most {limit} characters"),
                        ));
                    }
                }
                if let Some(category) = flagged_category(rule.kind, text) {
                    metrics::record_security_pattern(&category.to_string());
                    violations.push(FieldViolation::new(
                        name,
                        format!("content matched a blocked {category} pattern"),
                    ));
                }
                if rule.kind == FieldKind::Email && !looks_like_email(text) {
                    violations.push(FieldViolation::new(name, "must be a valid email address"));
                }
            }
        }
    }
}

/// Category refinement per field kind: Prompt fields are checked against
/// all three pattern sets, Text and Email against SQL/XSS only.
fn flagged_category(kind: FieldKind, text: &str) -> Option<PatternCategory> {
    if is_sql_injection_like(text) {
        return Some(PatternCategory::Sql);
    }
    if is_xss_like(text) {
        return Some(PatternCategory::Xss);
    }
    if kind == FieldKind::Prompt && is_prompt_injection_like(text) {
        return Some(PatternCategory::PromptInjection);
    }
    None
}

fn looks_like_email(text: &str) -> bool {
    if text.len() > 254 || text.contains(char::is_whitespace) {
        return false;
    }
    match text.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// Middleware state: the schema guarding one route group.
#[derive(Clone)]
pub struct ValidationGate {
    schema: Arc<ValidationSchema>,
}

impl ValidationGate {
    pub fn new(schema: ValidationSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }
}

/// Middleware function: sanitize + validate, then hand the sanitized request
/// to the inner service, or terminate with 400.
pub async fn validate_request(
    State(gate): State<ValidationGate>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    // Query values are sanitized and pattern-checked unconditionally.
    if let Some(query) = parts.uri.query() {
        match sanitize_query(query) {
            Ok(Some(clean)) => {
                if let Some(uri) = rebuild_uri(&parts.uri, &clean) {
                    parts.uri = uri;
                }
            }
            Ok(None) => {}
            Err(err) => {
                metrics::record_validation_rejected();
                return err.into_response();
            }
        }
    }

    // The outer body-limit layer has already bounded the size; this read
    // cannot grow past it.
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return GateError::Internal(format!("failed to read request body: {err}"))
                .into_response()
        }
    };

    if bytes.is_empty() {
        // No body to sanitize; required-field rules still apply.
        if let ValidationOutcome::Rejected(violations) =
            gate.schema.apply(Value::Object(Default::default()))
        {
            metrics::record_validation_rejected();
            return GateError::Validation(violations).into_response();
        }
        return next.run(Request::from_parts(parts, Body::empty())).await;
    }

    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(_) => {
            metrics::record_validation_rejected();
            return GateError::InvalidInput(vec![FieldViolation::new(
                "body",
                "malformed JSON body",
            )])
            .into_response();
        }
    };

    match gate.schema.apply(payload) {
        ValidationOutcome::Accepted(sanitized) => {
            let bytes = match serde_json::to_vec(&sanitized) {
                Ok(bytes) => bytes,
                Err(err) => {
                    return GateError::Internal(format!("failed to re-encode body: {err}"))
                        .into_response()
                }
            };
            // Sanitization may have shrunk the payload.
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        ValidationOutcome::Rejected(violations) => {
            metrics::record_validation_rejected();
            tracing::warn!(
                violations = violations.len(),
                path = %parts.uri.path(),
                "Request rejected by validation gate"
            );
            GateError::Validation(violations).into_response()
        }
    }
}

/// Sanitize query values; `Ok(Some(..))` carries a rewritten query string
/// when anything changed. Values that still match an attack pattern after
/// sanitization reject the request outright.
fn sanitize_query(query: &str) -> Result<Option<String>, GateError> {
    let mut changed = false;
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let clean = sanitize_text(&value);
        if is_sql_injection_like(&clean) || is_xss_like(&clean) {
            return Err(GateError::SecurityPattern {
                field: key.into_owned(),
                category: if is_sql_injection_like(&clean) {
                    PatternCategory::Sql
                } else {
                    PatternCategory::Xss
                },
            });
        }
        if clean != value {
            changed = true;
        }
        serializer.append_pair(&key, &clean);
    }

    Ok(changed.then(|| serializer.finish()))
}

fn rebuild_uri(uri: &Uri, query: &str) -> Option<Uri> {
    let mut parts = uri.clone().into_parts();
    let path = uri.path();
    let path_and_query = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };
    parts.path_and_query = path_and_query.parse().ok();
    Uri::from_parts(parts).ok()
}
