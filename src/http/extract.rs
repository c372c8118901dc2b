//! 请求体与路径参数解析
//!
//! 请求体先按原始字节检查（空 / 非 JSON），再逐字段收集校验错误，
//! 所有字段错误用 ", " 连接后作为一个 400 返回。

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

use crate::error::{Result, ServerError};

/// 可以从 JSON 对象解析并校验的请求体
pub trait RequestBody: Sized {
    /// 允许空请求体（按 `{}` 处理）
    const ALLOW_EMPTY: bool = false;

    /// 解析字段；校验失败时把错误记入 `fields` 并返回 None
    fn from_fields(fields: &mut BodyFields<'_>) -> Option<Self>;
}

/// 已校验的 JSON 请求体
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: RequestBody,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;
        parse_body(&bytes).map(JsonBody)
    }
}

/// 解析原始请求体
pub fn parse_body<T: RequestBody>(bytes: &[u8]) -> Result<T> {
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        if !T::ALLOW_EMPTY {
            return Err(ServerError::BadRequest("Request body is empty".to_string()));
        }
        Value::Object(Map::new())
    } else {
        serde_json::from_slice::<Value>(bytes)
            .map_err(|_| ServerError::BadRequest("Invalid JSON format".to_string()))?
    };

    let empty = Map::new();
    let object = match &value {
        Value::Object(map) => map,
        // null 与空请求体同等对待
        Value::Null if T::ALLOW_EMPTY => &empty,
        _ => {
            return Err(ServerError::Validation(
                "request body must be a JSON object".to_string(),
            ))
        }
    };

    let mut fields = BodyFields::new(object);
    let parsed = T::from_fields(&mut fields);
    fields.finish()?;
    parsed.ok_or_else(|| ServerError::Validation("invalid request body".to_string()))
}

/// 字段读取器，累积校验错误
pub struct BodyFields<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<String>,
}

impl<'a> BodyFields<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            errors: Vec::new(),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.object.get(name).filter(|v| !v.is_null())
    }

    /// 必填字符串
    pub fn required_str(&mut self, name: &str) -> Option<String> {
        if self.get(name).is_none() {
            self.error(format!("{} is required", name));
            return None;
        }
        self.optional_str(name)
    }

    /// 可选字符串（缺失或 null 返回 None）
    pub fn optional_str(&mut self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.error(format!("{} must be a string", name));
                None
            }
        }
    }

    /// 必填整数（不接受小数和字符串形式的数字）
    pub fn required_int(&mut self, name: &str) -> Option<i64> {
        match self.get(name) {
            None => {
                self.error(format!("{} is required", name));
                None
            }
            Some(v) => match v.as_i64() {
                Some(n) => Some(n),
                None => {
                    self.error(format!("{} must be an integer", name));
                    None
                }
            },
        }
    }

    /// 条件不满足时记录错误，返回条件本身
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> bool {
        if !ok {
            self.error(message);
        }
        ok
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServerError::Validation(self.errors.join(", ")))
        }
    }
}

/// 解析路径中的正整数 ID
pub fn parse_id(raw: &str, name: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServerError::Validation(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Sample {
        id: i64,
        label: Option<String>,
    }

    impl RequestBody for Sample {
        fn from_fields(fields: &mut BodyFields<'_>) -> Option<Self> {
            let id = fields.required_int("id");
            let label = fields.optional_str("label");
            if let Some(id) = id {
                fields.check(id > 0, "id must be positive");
            }
            if fields.has_errors() {
                return None;
            }
            Some(Sample { id: id?, label })
        }
    }

    #[derive(Debug)]
    struct Patch;

    impl RequestBody for Patch {
        const ALLOW_EMPTY: bool = true;

        fn from_fields(_fields: &mut BodyFields<'_>) -> Option<Self> {
            Some(Patch)
        }
    }

    #[test]
    fn test_empty_body() {
        let err = parse_body::<Sample>(b"").unwrap_err();
        assert_eq!(err, ServerError::BadRequest("Request body is empty".into()));

        let err = parse_body::<Sample>(b"  \n").unwrap_err();
        assert_eq!(err, ServerError::BadRequest("Request body is empty".into()));

        assert!(parse_body::<Patch>(b"").is_ok());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_body::<Sample>(b"{\"id\": ").unwrap_err();
        assert_eq!(err, ServerError::BadRequest("Invalid JSON format".into()));
    }

    #[test]
    fn test_field_errors_are_joined() {
        let err = parse_body::<Sample>(br#"{"label": 3}"#).unwrap_err();
        assert_eq!(
            err,
            ServerError::Validation("id is required, label must be a string".into())
        );

        let err = parse_body::<Sample>(br#"{"id": "7"}"#).unwrap_err();
        assert_eq!(err, ServerError::Validation("id must be an integer".into()));

        let err = parse_body::<Sample>(br#"{"id": -1}"#).unwrap_err();
        assert_eq!(err.public_message(), "Bad request: id must be positive");
    }

    #[test]
    fn test_valid_body() {
        let sample = parse_body::<Sample>(br#"{"id": 4, "label": null}"#).unwrap();
        assert_eq!(sample.id, 4);
        assert!(sample.label.is_none());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12", "id").unwrap(), 12);
        assert!(parse_id("0", "id").is_err());
        assert!(parse_id("-3", "id").is_err());
        assert!(parse_id("abc", "id").is_err());
    }
}
