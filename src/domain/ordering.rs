//! Ordering request decoding.
//!
//! Two payload shapes are accepted:
//!
//! - JSON list of `{"id": 3, "children": [...]}` entries (`children` optional,
//!   ids as numbers or numeric strings).
//! - The nested form encoding produced by the sortable-list widget:
//!   `{"ul": {"0": {"0": {"id": "page_3", "children": {"0": {...}}}}}}`.
//!   Keys are list/position indices; element ids carry a resource prefix.
//!
//! Every decoding failure is a [`DomainError::MalformedRequest`].

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde_json::{Map, Value};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{NodeId, OrderingEntry, OrderingRequest};

/// Wire format of an ordering payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    #[default]
    Json,
    Form,
}

impl FromStr for PayloadFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(PayloadFormat::Json),
            "form" => Ok(PayloadFormat::Form),
            other => Err(DomainError::MalformedRequest(format!(
                "unknown payload format: {other}"
            ))),
        }
    }
}

/// Decode `payload` in the given format.
pub fn decode(payload: &str, format: PayloadFormat, id_prefix: &str) -> DomainResult<OrderingRequest> {
    match format {
        PayloadFormat::Json => parse_json(payload),
        PayloadFormat::Form => parse_form(payload, id_prefix),
    }
}

/// Parse the `[{id, children}]` schema.
pub fn parse_json(payload: &str) -> DomainResult<OrderingRequest> {
    serde_json::from_str(payload).map_err(|e| DomainError::MalformedRequest(e.to_string()))
}

/// Parse the nested form encoding, stripping `id_prefix` from element ids.
pub fn parse_form(payload: &str, id_prefix: &str) -> DomainResult<OrderingRequest> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| DomainError::MalformedRequest(e.to_string()))?;
    let root = as_object(&value, "payload")?;
    let lists = root
        .get("ul")
        .ok_or_else(|| malformed("missing 'ul' key"))
        .and_then(|ul| as_object(ul, "ul"))?;
    let ids = IdParser::new(id_prefix)?;

    let mut entries = Vec::new();
    for (_, list) in sorted_by_index(lists)? {
        entries.extend(parse_list(list, &ids)?);
    }
    Ok(OrderingRequest::new(entries))
}

fn parse_list(list: &Value, ids: &IdParser) -> DomainResult<Vec<OrderingEntry>> {
    let items = as_object(list, "list")?;
    sorted_by_index(items)?
        .into_iter()
        .map(|(_, item)| parse_item(item, ids))
        .collect()
}

fn parse_item(item: &Value, ids: &IdParser) -> DomainResult<OrderingEntry> {
    let fields = as_object(item, "item")?;
    let raw_id = match fields.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(malformed("item 'id' is not a string")),
        None => return Err(malformed("item without 'id'")),
    };
    let id = ids.parse(&raw_id)?;

    // Children arrive wrapped in one more list level keyed "0"
    let children = match fields.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(wrapper) => {
            let wrapper = as_object(wrapper, "children")?;
            let mut children = Vec::new();
            for (_, list) in sorted_by_index(wrapper)? {
                children.extend(parse_list(list, ids)?);
            }
            children
        }
    };

    Ok(OrderingEntry { id, children })
}

/// Strips the resource prefix from element ids such as `page_3`.
struct IdParser {
    prefix: Option<Regex>,
}

impl IdParser {
    fn new(prefix: &str) -> DomainResult<Self> {
        if prefix.is_empty() {
            return Ok(Self { prefix: None });
        }
        let pattern = format!("{}_?", regex::escape(prefix));
        let regex = Regex::new(&pattern).map_err(|e| malformed(&e.to_string()))?;
        Ok(Self {
            prefix: Some(regex),
        })
    }

    fn parse(&self, raw: &str) -> DomainResult<NodeId> {
        let candidate = match &self.prefix {
            Some(regex) => regex.split(raw).find(|part| !part.is_empty()).unwrap_or(""),
            None => raw,
        };
        candidate
            .parse::<NodeId>()
            .map_err(|_| malformed(&format!("cannot read node id from '{raw}'")))
    }
}

fn sorted_by_index<'a>(map: &'a Map<String, Value>) -> DomainResult<Vec<(u64, &'a Value)>> {
    let mut items = map
        .iter()
        .map(|(key, value)| {
            key.parse::<u64>()
                .map(|index| (index, value))
                .map_err(|_| malformed(&format!("non-numeric index '{key}'")))
        })
        .collect::<DomainResult<Vec<_>>>()?;
    items.sort_by_key(|(index, _)| *index);
    Ok(items)
}

fn as_object<'a>(value: &'a Value, what: &str) -> DomainResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| malformed(&format!("{what} is not an object")))
}

fn malformed(message: &str) -> DomainError {
    DomainError::MalformedRequest(message.to_string())
}

/// Accepts node ids as JSON numbers or numeric strings.
pub(crate) fn deserialize_node_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    struct NodeIdVisitor;

    impl<'de> Visitor<'de> for NodeIdVisitor {
        type Value = NodeId;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or a numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
            Ok(NodeId(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
            u64::try_from(v)
                .map(NodeId)
                .map_err(|_| E::custom(format!("negative node id: {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
            v.parse()
                .map_err(|_| E::custom(format!("invalid node id: '{v}'")))
        }
    }

    deserializer.deserialize_any(NodeIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_json_with_children_when_parsing_then_builds_nesting() {
        let request = parse_json(r#"[{"id": 1, "children": [{"id": "2"}]}, {"id": 3}]"#).unwrap();

        assert_eq!(
            request,
            OrderingRequest::new(vec![
                OrderingEntry::with_children(1, vec![OrderingEntry::leaf(2)]),
                OrderingEntry::leaf(3),
            ])
        );
    }

    #[test]
    fn given_json_with_bad_id_when_parsing_then_malformed() {
        let err = parse_json(r#"[{"id": "abc"}]"#).unwrap_err();
        assert!(matches!(err, DomainError::MalformedRequest(_)));
        assert!(err.requires_rebuild());
    }

    #[test]
    fn given_form_payload_when_parsing_then_orders_by_numeric_index() {
        let payload = r#"{"ul": {"0": {
            "10": {"id": "crud_dummy_9"},
            "2": {"id": "crud_dummy_3"},
            "0": {"id": "crud_dummy_1"}
        }}}"#;

        let request = parse_form(payload, "crud_dummy").unwrap();

        assert_eq!(request, OrderingRequest::flat([1u64, 3, 9]));
    }

    #[test]
    fn given_form_children_when_parsing_then_nests_under_parent() {
        let payload = r#"{"ul": {"0": {
            "0": {"id": "page_1", "children": {"0": {
                "0": {"id": "page_2"},
                "1": {"id": "page_4", "children": {"0": {"0": {"id": "page_5"}}}}
            }}},
            "1": {"id": "page_3"}
        }}}"#;

        let request = parse_form(payload, "page").unwrap();

        assert_eq!(
            request,
            OrderingRequest::new(vec![
                OrderingEntry::with_children(
                    1,
                    vec![
                        OrderingEntry::leaf(2),
                        OrderingEntry::with_children(4, vec![OrderingEntry::leaf(5)]),
                    ]
                ),
                OrderingEntry::leaf(3),
            ])
        );
    }

    #[test]
    fn given_form_without_separator_when_parsing_then_strips_prefix() {
        let request = parse_form(r#"{"ul": {"0": {"0": {"id": "page7"}}}}"#, "page").unwrap();
        assert_eq!(request, OrderingRequest::flat([7u64]));
    }

    #[rstest::rstest]
    #[case(r#"{"list": {}}"#)]
    #[case(r#"{"ul": {"first": {}}}"#)]
    #[case(r#"{"ul": {"0": {"0": {"name": "x"}}}}"#)]
    #[case(r#"{"ul": {"0": {"0": {"id": "page_x"}}}}"#)]
    #[case(r#"{"ul": ["0"]}"#)]
    #[case("not json")]
    fn given_broken_form_when_parsing_then_malformed(#[case] payload: &str) {
        let err = parse_form(payload, "page").unwrap_err();
        assert!(matches!(err, DomainError::MalformedRequest(_)), "{err}");
    }

    #[test]
    fn given_format_names_when_parsing_then_case_insensitive() {
        assert_eq!("JSON".parse::<PayloadFormat>().unwrap(), PayloadFormat::Json);
        assert_eq!("form".parse::<PayloadFormat>().unwrap(), PayloadFormat::Form);
        assert!("xml".parse::<PayloadFormat>().is_err());
    }
}
