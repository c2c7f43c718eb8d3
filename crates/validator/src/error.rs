use indexmap::IndexMap;
use serde::{ser::SerializeMap, Serialize};
use std::borrow::Cow;

/// Accumulates plain messages for a single field.
pub struct MessageBuilder(Vec<Cow<'static, str>>);

impl MessageBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, message: impl Into<Cow<'static, str>>) {
        self.0.push(message.into());
    }

    #[must_use]
    pub fn build(self) -> ValidateError {
        ValidateError::Messages(self.0)
    }
}

/// Accumulates per-element errors for a sequence field. Elements
/// without errors are kept as `None` so positions line up with the
/// original input.
pub struct SliceBuilder(Vec<Option<ValidateError>>);

impl SliceBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert_empty(&mut self) {
        self.0.push(None);
    }

    pub fn insert(&mut self, value: ValidateError) {
        self.0
            .push(if value.is_empty() { None } else { Some(value) });
    }

    #[must_use]
    pub fn build(self) -> ValidateError {
        ValidateError::Slice(self.0)
    }
}

/// Accumulates named field errors. Empty sub-errors are discarded
/// so a clean field never shows up in the output.
pub struct FieldBuilder(IndexMap<Cow<'static, str>, ValidateError>);

#[allow(clippy::new_without_default)]
impl FieldBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::default())
    }

    pub fn insert(&mut self, key: impl Into<Cow<'static, str>>, value: ValidateError) {
        if !value.is_empty() {
            self.0.insert(key.into(), value);
        }
    }

    #[must_use]
    pub fn build(self) -> ValidateError {
        ValidateError::Fields(self.0)
    }
}

// ---------------------------------------------------- //

/// Structured validation failure. Field maps keep insertion order
/// so error output is stable across runs.
#[derive(PartialEq, Eq)]
pub enum ValidateError {
    Fields(IndexMap<Cow<'static, str>, ValidateError>),
    Messages(Vec<Cow<'static, str>>),
    Slice(Vec<Option<ValidateError>>),
}

impl std::fmt::Display for ValidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Invalid data occurred")
    }
}

impl std::error::Error for ValidateError {}

impl std::fmt::Debug for ValidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidateError::Fields(n) => n.fmt(f),
            ValidateError::Messages(n) => f.debug_map().entry(&"_errors", &n).finish(),
            ValidateError::Slice(n) => n.fmt(f),
        }
    }
}

impl ValidateError {
    #[must_use]
    pub fn field_builder() -> FieldBuilder {
        FieldBuilder::new()
    }

    #[must_use]
    pub fn msg_builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    #[must_use]
    pub fn slice_builder() -> SliceBuilder {
        SliceBuilder::new()
    }
}

impl ValidateError {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            ValidateError::Fields(n) => n.is_empty(),
            ValidateError::Messages(n) => n.is_empty(),
            ValidateError::Slice(n) => n.iter().all(Option::is_none),
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn serialize_index_map<K: Serialize, V: Serialize, S: serde::Serializer>(
    map: &IndexMap<K, V>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map_ser = serializer.serialize_map(Some(map.len()))?;
    for (key, value) in map {
        map_ser.serialize_entry(key, value)?;
    }
    map_ser.end()
}

impl Serialize for ValidateError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ValidateError::Fields(n) => serialize_index_map(n, serializer),
            ValidateError::Messages(n) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("_errors", &n)?;
                map.end()
            }
            ValidateError::Slice(n) => n.serialize(serializer),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ValidateError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = ValidateError;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("ValidateError type")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut fields = IndexMap::new();
                let mut messages = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "_errors" => {
                            if messages.is_some() {
                                return Err(serde::de::Error::duplicate_field("_errors"));
                            }
                            messages = Some(map.next_value::<Vec<Cow<'static, str>>>()?);
                        }
                        _ => {
                            fields.insert(Cow::Owned(key), map.next_value()?);
                        }
                    }
                }

                if let Some(data) = messages {
                    Ok(ValidateError::Messages(data))
                } else if !fields.is_empty() {
                    Ok(ValidateError::Fields(fields))
                } else {
                    Err(serde::de::Error::custom("error fields must not be empty"))
                }
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut list = Vec::new();
                while let Some(element) = seq.next_element()? {
                    list.push(element);
                }
                Ok(ValidateError::Slice(list))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Validate;
    use serde_test::Token;

    #[derive(Debug)]
    struct MemberBatch {
        emails: Vec<&'static str>,
        limit: u32,
    }

    impl Validate for MemberBatch {
        fn validate(&self) -> Result<(), ValidateError> {
            let mut fields = ValidateError::field_builder();
            {
                let mut slice = ValidateError::slice_builder();
                for email in &self.emails {
                    let mut msg = ValidateError::msg_builder();
                    if !email.contains('@') {
                        msg.insert("Invalid e-mail address");
                    }
                    slice.insert(msg.build());
                }
                fields.insert("emails", slice.build());
            }
            {
                let mut msg = ValidateError::msg_builder();
                if self.limit == 0 {
                    msg.insert("Limit must not be zero");
                }
                fields.insert("limit", msg.build());
            }
            fields.build().into_result()
        }
    }

    #[test]
    fn test_debug_fmt() {
        const EXPECTED: &str = r#"{"emails": [None, Some({"_errors": ["Invalid e-mail address"]})], "limit": {"_errors": ["Limit must not be zero"]}}"#;

        let error = MemberBatch {
            emails: vec!["alex@company.com", "not-an-email"],
            limit: 0,
        }
        .validate()
        .unwrap_err();
        assert_eq!(EXPECTED, format!("{error:?}"));
    }

    #[test]
    fn test_serde_impl() {
        let error = MemberBatch {
            emails: vec!["alex@company.com", "not-an-email"],
            limit: 0,
        }
        .validate()
        .unwrap_err();

        serde_test::assert_tokens(
            &error,
            &[
                Token::Map { len: Some(2) },
                Token::Str("emails"),
                Token::Seq { len: Some(2) },
                Token::None,
                Token::Some,
                Token::Map { len: Some(1) },
                Token::Str("_errors"),
                Token::Seq { len: Some(1) },
                Token::Str("Invalid e-mail address"),
                Token::SeqEnd,
                Token::MapEnd,
                Token::SeqEnd,
                Token::Str("limit"),
                Token::Map { len: Some(1) },
                Token::Str("_errors"),
                Token::Seq { len: Some(1) },
                Token::Str("Limit must not be zero"),
                Token::SeqEnd,
                Token::MapEnd,
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn validate_error_is_empty() {
        assert!(MessageBuilder::new().build().is_empty());
        assert!(FieldBuilder::new().build().is_empty());

        let mut msg = MessageBuilder::new();
        msg.insert("Hello world!");
        assert!(!msg.build().is_empty());

        {
            let mut msg = MessageBuilder::new();
            msg.insert("Hello world!");

            let mut err = FieldBuilder::new();
            err.insert("channel", msg.build());
            assert!(!err.build().is_empty());
        }

        {
            let mut msg = MessageBuilder::new();
            msg.insert("Hello world!");

            let mut err = SliceBuilder::new();
            err.insert(msg.build());
            assert!(!err.build().is_empty());

            let mut err = SliceBuilder::new();
            err.insert_empty();
            assert!(err.build().is_empty());
        }
    }
}
