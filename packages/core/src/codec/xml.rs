//! XML codec.
//!
//! Payloads are written under a fixed `<payload>` root: map entries become
//! child elements, array items become repeated `<item>` elements, scalars
//! become text content. Decoding is the inverse; attributes are ignored and
//! a repeated sibling element keeps the last value.

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::{Reader, Writer};

use crate::body::Body;
use crate::error::{DeserializationError, SerializationError};
use crate::subscription::media_type;

use super::{PayloadDeserializer, PayloadSerializer};

const ROOT: &str = "payload";
const ITEM: &str = "item";

/// XML serializer/deserializer backed by `quick-xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlCodec;

impl PayloadSerializer for XmlCodec {
    fn media_type(&self) -> &'static str {
        media_type::APPLICATION_XML
    }

    fn serialize(&self, payload: &Body) -> Result<Vec<u8>, SerializationError> {
        if payload.is_null() {
            return Ok(Vec::new());
        }
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, ROOT, payload)?;
        Ok(writer.into_inner())
    }
}

impl PayloadDeserializer for XmlCodec {
    fn media_type(&self) -> &'static str {
        media_type::APPLICATION_XML
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Body, DeserializationError> {
        let text = std::str::from_utf8(bytes).map_err(|e| DeserializationError {
            reason: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Err(DeserializationError {
                reason: "empty XML document".to_string(),
            });
        }

        let mut reader = Reader::from_str(text);
        let config = reader.config_mut();
        config.trim_text_start = true;
        config.trim_text_end = true;

        // Skip prolog/comments until the root element opens.
        loop {
            match reader.read_event().map_err(de_err)? {
                XmlEvent::Start(_) => return read_element(&mut reader),
                XmlEvent::Empty(_) => return Ok(Body::Null),
                XmlEvent::Eof => {
                    return Err(DeserializationError {
                        reason: "no root element".to_string(),
                    })
                }
                _ => {}
            }
        }
    }
}

fn de_err<E: std::fmt::Display>(e: E) -> DeserializationError {
    DeserializationError {
        reason: e.to_string(),
    }
}

fn ser_err<E: std::fmt::Display>(e: E) -> SerializationError {
    SerializationError {
        reason: e.to_string(),
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Body,
) -> Result<(), SerializationError> {
    writer
        .write_event(XmlEvent::Start(BytesStart::new(name)))
        .map_err(ser_err)?;
    match value {
        Body::Null => {}
        Body::Bool(b) => write_text(writer, &b.to_string())?,
        Body::Int(i) => write_text(writer, &i.to_string())?,
        Body::Float(f) => write_text(writer, &f.to_string())?,
        Body::Text(s) => write_text(writer, s)?,
        Body::Array(items) => {
            for item in items {
                write_element(writer, ITEM, item)?;
            }
        }
        Body::Map(map) => {
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
        }
    }
    writer
        .write_event(XmlEvent::End(BytesEnd::new(name)))
        .map_err(ser_err)?;
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), SerializationError> {
    writer
        .write_event(XmlEvent::Text(BytesText::new(text)))
        .map_err(ser_err)
}

/// Reads the content of the element whose `Start` event was just consumed,
/// up to and including its matching `End` event.
fn read_element(reader: &mut Reader<&[u8]>) -> Result<Body, DeserializationError> {
    let mut children: BTreeMap<String, Body> = BTreeMap::new();
    let mut text: Option<String> = None;

    loop {
        match reader.read_event().map_err(de_err)? {
            XmlEvent::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let child = read_element(reader)?;
                children.insert(name, child);
            }
            XmlEvent::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                children.insert(name, Body::Null);
            }
            XmlEvent::Text(t) => {
                let value = t.unescape().map_err(de_err)?.into_owned();
                text = Some(value);
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => {
                return Err(DeserializationError {
                    reason: "unexpected end of document".to_string(),
                })
            }
            _ => {}
        }
    }

    if !children.is_empty() {
        Ok(Body::Map(children))
    } else if let Some(value) = text {
        Ok(Body::Text(value))
    } else {
        Ok(Body::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_serializes_to_child_elements() {
        let codec = XmlCodec;
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), Body::Text("42".to_string()));
        let bytes = codec.serialize(&Body::Map(map)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "<payload><id>42</id></payload>");
    }

    #[test]
    fn deserialize_reads_nested_elements() {
        let codec = XmlCodec;
        let body = codec
            .deserialize(b"<order><id>42</id><customer><name>alice</name></customer></order>")
            .unwrap();
        assert_eq!(body.get("id").and_then(Body::as_text), Some("42"));
        assert_eq!(
            body.get("customer").and_then(|c| c.get("name")).and_then(Body::as_text),
            Some("alice")
        );
    }

    #[test]
    fn text_content_is_escaped_on_write() {
        let codec = XmlCodec;
        let mut map = BTreeMap::new();
        map.insert("note".to_string(), Body::Text("a < b".to_string()));
        let bytes = codec.serialize(&Body::Map(map)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("a &lt; b"));
    }

    #[test]
    fn empty_document_is_an_error() {
        let codec = XmlCodec;
        assert!(codec.deserialize(b"").is_err());
        assert!(codec.deserialize(b"   ").is_err());
    }

    #[test]
    fn null_payload_serializes_to_empty_bytes() {
        let codec = XmlCodec;
        assert!(codec.serialize(&Body::Null).unwrap().is_empty());
    }
}
