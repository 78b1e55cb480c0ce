//! Compiled route endpoints: template parsing, matching, and extraction.

use std::sync::Arc;

use courier_core::codec::{PayloadDeserializer, PayloadSerializer};
use courier_core::error::RoutingError;
use courier_core::handler::EventHandler;
use courier_core::schema::PayloadSchema;

/// One position of a compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly (case-sensitive).
    Literal(String),
    /// Matches any request segment; the value is extracted under this name.
    Param(String),
}

/// Trims the template and guarantees a leading `/`.
#[must_use]
pub fn normalize_source(source: &str) -> String {
    let trimmed = source.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Compiles a normalized template into its segment sequence.
///
/// A segment wrapped in `{...}` is a parameter; any other use of a brace
/// inside a segment is malformed.
///
/// # Errors
///
/// Returns [`RoutingError`] naming the offending segment.
pub fn compile(source: &str) -> Result<Vec<Segment>, RoutingError> {
    split_segments(source)
        .into_iter()
        .map(|raw| {
            if raw.starts_with('{') && raw.ends_with('}') && raw.len() >= 2 {
                Ok(Segment::Param(raw[1..raw.len() - 1].to_string()))
            } else if raw.contains('{') || raw.contains('}') {
                Err(RoutingError {
                    template: source.to_string(),
                    segment: raw.to_string(),
                })
            } else {
                Ok(Segment::Literal(raw.to_string()))
            }
        })
        .collect()
}

/// Derives the pattern registered with the transport.
///
/// The transport can only bind static or prefix patterns, so a template
/// with parameters is exposed as its literal prefix up to the first
/// parameter followed by a wildcard marker; the route table disambiguates
/// the rest per request.
#[must_use]
pub fn listening_pattern(source: &str) -> String {
    match source.find('{') {
        None => source.to_string(),
        Some(brace) => format!("{}*", &source[..brace]),
    }
}

/// Splits a path into segments, dropping the leading slash and any
/// trailing empty segments (so `/orders` and `/orders/` compare equal).
pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut segments: Vec<&str> = path.split('/').collect();
    while segments.len() > 1 && segments.last() == Some(&"") {
        segments.pop();
    }
    segments
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// A registered route: compiled template, codecs, model, and handler.
pub struct Endpoint {
    segments: Vec<Segment>,
    schema: PayloadSchema,
    serializer: &'static dyn PayloadSerializer,
    deserializer: &'static dyn PayloadDeserializer,
    handler: Arc<dyn EventHandler>,
}

impl Endpoint {
    /// Builds an endpoint from already-compiled parts.
    #[must_use]
    pub fn new(
        segments: Vec<Segment>,
        schema: PayloadSchema,
        serializer: &'static dyn PayloadSerializer,
        deserializer: &'static dyn PayloadDeserializer,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            segments,
            schema,
            serializer,
            deserializer,
            handler,
        }
    }

    /// The compiled segment sequence.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Model the request body is validated against.
    #[must_use]
    pub fn schema(&self) -> &PayloadSchema {
        &self.schema
    }

    /// Response serializer.
    #[must_use]
    pub fn serializer(&self) -> &'static dyn PayloadSerializer {
        self.serializer
    }

    /// Request deserializer.
    #[must_use]
    pub fn deserializer(&self) -> &'static dyn PayloadDeserializer {
        self.deserializer
    }

    /// Handler invoked for matched requests.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn EventHandler> {
        &self.handler
    }

    /// Whether a concrete request path belongs to this endpoint.
    ///
    /// Segment counts must be equal; a parameter position matches any
    /// value, a literal position must match exactly.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let request = split_segments(path);
        if request.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&request)
            .all(|(segment, value)| match segment {
                Segment::Param(_) => true,
                Segment::Literal(literal) => literal == value,
            })
    }

    /// Whether another compiled template describes the same route.
    ///
    /// Two templates are the same route when, position by position, both
    /// are parameters or both are equal literals. Parameter names do not
    /// participate. Used only to suppress duplicate registration.
    #[must_use]
    pub fn same_shape(&self, other: &[Segment]) -> bool {
        if other.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other)
            .all(|(a, b)| match (a, b) {
                (Segment::Param(_), Segment::Param(_)) => true,
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                _ => false,
            })
    }

    /// Extracts `(name, value)` pairs for every parameter position of a
    /// matching path, in template order.
    #[must_use]
    pub fn path_params<'p>(&self, path: &'p str) -> Vec<(&str, &'p str)> {
        let request = split_segments(path);
        self.segments
            .iter()
            .zip(request)
            .filter_map(|(segment, value)| match segment {
                Segment::Param(name) => Some((name.as_str(), value)),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("segments", &self.segments)
            .field("schema", &self.schema.name)
            .field("serializer", &self.serializer.media_type())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::codec;
    use courier_core::handler::handler_fn;
    use courier_core::subscription::media_type;

    fn endpoint(template: &str) -> Endpoint {
        Endpoint::new(
            compile(&normalize_source(template)).unwrap(),
            PayloadSchema::any("Any"),
            codec::serializer_for(media_type::APPLICATION_JSON).unwrap(),
            codec::deserializer_for(media_type::APPLICATION_JSON).unwrap(),
            Arc::new(handler_fn(Ok)),
        )
    }

    #[test]
    fn compile_tags_literals_and_params() {
        let segments = compile("/orders/{id}/items").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("orders".to_string()),
                Segment::Param("id".to_string()),
                Segment::Literal("items".to_string()),
            ]
        );
    }

    #[test]
    fn compile_rejects_mixed_brace_segments() {
        for bad in ["/orders/{id", "/orders/id}", "/orders/x{id}y"] {
            let err = compile(bad).unwrap_err();
            assert_eq!(err.template, bad);
        }
    }

    #[test]
    fn normalize_adds_leading_slash_and_trims() {
        assert_eq!(normalize_source("  orders/{id} "), "/orders/{id}");
        assert_eq!(normalize_source("/orders"), "/orders");
    }

    #[test]
    fn listening_pattern_cuts_at_first_param() {
        assert_eq!(listening_pattern("/orders/{id}"), "/orders/*");
        assert_eq!(listening_pattern("/orders/{id}/items"), "/orders/*");
        assert_eq!(listening_pattern("/health"), "/health");
        assert_eq!(listening_pattern("/{id}"), "/*");
    }

    #[test]
    fn param_matches_any_value_literal_is_exact() {
        let ep = endpoint("/orders/{id}");
        assert!(ep.matches("/orders/42"));
        assert!(ep.matches("/orders/abc"));
        assert!(!ep.matches("/orders"));
        assert!(!ep.matches("/orders/42/items"));
        assert!(!ep.matches("/Orders/42"));
    }

    #[test]
    fn trailing_slash_does_not_change_the_match() {
        let ep = endpoint("/orders/{id}");
        assert!(ep.matches("/orders/42/"));
    }

    #[test]
    fn same_shape_ignores_param_names() {
        let a = endpoint("/orders/{id}");
        let b = compile("/orders/{orderId}").unwrap();
        assert!(a.same_shape(&b));
    }

    #[test]
    fn same_shape_distinguishes_literal_positions() {
        let a = endpoint("/orders/{id}");
        assert!(!a.same_shape(&compile("/invoices/{id}").unwrap()));
        assert!(!a.same_shape(&compile("/orders/fixed").unwrap()));
        assert!(!a.same_shape(&compile("/orders/{id}/items").unwrap()));
    }

    #[test]
    fn params_extracted_in_template_order() {
        let ep = endpoint("/orders/{id}/lines/{line}");
        let params = ep.path_params("/orders/42/lines/7");
        assert_eq!(params, vec![("id", "42"), ("line", "7")]);
    }

    proptest::proptest! {
        /// Compiling a valid template and matching the literal instantiation
        /// of itself always matches and extracts every substituted value.
        #[test]
        fn instantiated_template_always_matches(
            literals in proptest::collection::vec("[a-z]{1,8}", 1..4),
            values in proptest::collection::vec("[a-z0-9]{1,8}", 1..4),
        ) {
            let mut template = String::new();
            let mut path = String::new();
            let mut expected = Vec::new();
            for (i, lit) in literals.iter().enumerate() {
                template.push('/');
                template.push_str(lit);
                path.push('/');
                path.push_str(lit);
                if let Some(value) = values.get(i) {
                    template.push_str(&format!("/{{p{i}}}"));
                    path.push('/');
                    path.push_str(value);
                    expected.push((format!("p{i}"), value.clone()));
                }
            }

            let ep = Endpoint::new(
                compile(&template).unwrap(),
                PayloadSchema::any("Any"),
                codec::serializer_for(media_type::APPLICATION_JSON).unwrap(),
                codec::deserializer_for(media_type::APPLICATION_JSON).unwrap(),
                Arc::new(handler_fn(Ok)),
            );
            proptest::prop_assert!(ep.matches(&path));
            let got: Vec<(String, String)> = ep
                .path_params(&path)
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            proptest::prop_assert_eq!(got, expected);
        }
    }
}
