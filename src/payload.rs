//! Decoding raw reply bodies into [`Params`]

use crate::types::Params;
use crate::{GatewayError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

/// Wire format an adapter expects its replies in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadFormat {
    /// A JSON object
    Json,
    /// An XML document; leaf elements flatten to `name -> text`
    Xml,
    /// `key=value&key=value`
    UrlEncoded,
    /// Positional values split on `separator`, named by `fields`
    Delimited { separator: char, fields: Vec<String> },
}

impl PayloadFormat {
    /// Delimited format with the given field names
    pub fn delimited<I, S>(separator: char, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Delimited {
            separator,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::UrlEncoded => "urlencoded",
            Self::Delimited { .. } => "delimited",
        }
    }

    /// Decode `body`
    pub fn parse(&self, body: &str) -> Result<Params> {
        match self {
            Self::Json => parse_json(body),
            Self::Xml => parse_xml(body),
            Self::UrlEncoded => parse_urlencoded(body),
            Self::Delimited { separator, fields } => parse_delimited(body, *separator, fields),
        }
    }
}

fn parse_json(body: &str) -> Result<Params> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(GatewayError::malformed_payload(
            "json",
            format!("expected an object, got {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_xml(body: &str) -> Result<Params> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut params = Params::new();
    // Open elements with the text collected directly inside each
    let mut path: Vec<(String, String)> = Vec::new();
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| GatewayError::malformed_payload("xml", e.to_string()))?;

        match event {
            Event::Start(start) => {
                saw_root = true;
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                collect_attributes(&start, &name, &mut params)?;
                path.push((name, String::new()));
            }
            Event::Empty(start) => {
                saw_root = true;
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                collect_attributes(&start, &name, &mut params)?;
                params.entry(name).or_insert(Value::Null);
            }
            Event::Text(content) => {
                let unescaped = content
                    .unescape()
                    .map_err(|e| GatewayError::malformed_payload("xml", e.to_string()))?;
                if let Some((_, text)) = path.last_mut() {
                    text.push_str(&unescaped);
                }
            }
            Event::CData(content) => {
                if let Some((_, text)) = path.last_mut() {
                    text.push_str(&String::from_utf8_lossy(&content));
                }
            }
            Event::End(_) => {
                if let Some((name, text)) = path.pop() {
                    if !text.is_empty() {
                        params.insert(name, Value::String(text));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(GatewayError::malformed_payload("xml", "no root element"));
    }
    if !path.is_empty() {
        return Err(GatewayError::malformed_payload(
            "xml",
            format!(
                "unclosed element <{}>",
                path.iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join("><")
            ),
        ));
    }
    Ok(params)
}

fn collect_attributes(
    start: &quick_xml::events::BytesStart<'_>,
    element: &str,
    params: &mut Params,
) -> Result<()> {
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| GatewayError::malformed_payload("xml", e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| GatewayError::malformed_payload("xml", e.to_string()))?;
        params.insert(format!("{element}_{key}"), Value::String(value.into_owned()));
    }
    Ok(())
}

fn parse_urlencoded(body: &str) -> Result<Params> {
    let body = body.trim();
    if !body.contains('=') {
        return Err(GatewayError::malformed_payload(
            "urlencoded",
            "no key=value pairs",
        ));
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body)
        .map_err(|e| GatewayError::malformed_payload("urlencoded", e.to_string()))?;
    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

fn parse_delimited(body: &str, separator: char, fields: &[String]) -> Result<Params> {
    let body = body.trim_end_matches(['\r', '\n']);
    if body.is_empty() {
        return Err(GatewayError::malformed_payload("delimited", "empty body"));
    }

    Ok(body
        .split(separator)
        .enumerate()
        .map(|(index, value)| {
            let key = fields
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("field_{}", index + 1));
            (key, Value::String(value.to_string()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_object() {
        let params = PayloadFormat::Json
            .parse(r#"{"status":"approved","id":"ch_1"}"#)
            .unwrap();
        assert_eq!(params["status"], "approved");
    }

    #[test]
    fn test_json_rejects_non_objects() {
        let err = PayloadFormat::Json.parse("[1,2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(PayloadFormat::Json.parse("<html>").is_err());
    }

    #[test]
    fn test_xml_flattens_leaves() {
        let body = r#"<?xml version="1.0"?>
            <response version="2">
              <result><code>05</code><message>Do not honor &amp; retain</message></result>
              <avs code="Y"/>
            </response>"#;

        let params = PayloadFormat::Xml.parse(body).unwrap();
        assert_eq!(params["code"], "05");
        assert_eq!(params["message"], "Do not honor & retain");
        assert_eq!(params["response_version"], "2");
        assert_eq!(params["avs_code"], "Y");
    }

    #[test]
    fn test_xml_mixed_content_keeps_parent_text() {
        let params = PayloadFormat::Xml
            .parse("<reply>Declined<reason>insufficient funds</reason></reply>")
            .unwrap();
        assert_eq!(params["reply"], "Declined");
        assert_eq!(params["reason"], "insufficient funds");
    }

    #[test]
    fn test_xml_rejects_garbage() {
        assert!(PayloadFormat::Xml.parse("Internal Server Error").is_err());
        assert!(PayloadFormat::Xml.parse("<a><b>1</b>").is_err());
    }

    #[test]
    fn test_urlencoded() {
        let params = PayloadFormat::UrlEncoded
            .parse("RESULT=0&RESPMSG=Approved&PNREF=V19A2E")
            .unwrap();
        assert_eq!(params["RESPMSG"], "Approved");
        assert_eq!(params.len(), 3);
        assert!(PayloadFormat::UrlEncoded.parse("Bad Gateway").is_err());
    }

    #[test]
    fn test_delimited_names_and_overflow() {
        let format = PayloadFormat::delimited('|', ["response_code", "reason"]);
        let params = format.parse("1|This transaction has been approved.|XYZ\n").unwrap();

        assert_eq!(params["response_code"], "1");
        assert_eq!(params["reason"], "This transaction has been approved.");
        assert_eq!(params["field_3"], "XYZ");
        assert!(format.parse("").is_err());
    }
}
