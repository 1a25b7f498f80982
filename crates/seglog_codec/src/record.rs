//! Log record and its CBOR encoding.
//!
//! A record is encoded as a CBOR map with text keys:
//!
//! ```text
//! { "offset": uint, "value": bytes }
//! ```
//!
//! Missing keys decode to their zero value and unknown keys are ignored, so
//! fields can be added without breaking older logs.

use crate::error::{CodecError, CodecResult};
use crate::{Decode, Encode};
use ciborium::value::{Integer, Value};

const OFFSET_KEY: &str = "offset";
const VALUE_KEY: &str = "value";

/// A single entry in the log.
///
/// The offset is assigned by the log at append time; whatever the caller
/// puts there before appending is overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    /// Opaque payload.
    pub value: Vec<u8>,
    /// Position of this record in the log.
    pub offset: u64,
}

impl Record {
    /// Creates a record holding `value`, with offset 0.
    #[must_use]
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            offset: 0,
        }
    }

    /// Sets the offset.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

impl Encode for Record {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let map = Value::Map(vec![
            (
                Value::Text(OFFSET_KEY.to_string()),
                Value::Integer(Integer::from(self.offset)),
            ),
            (
                Value::Text(VALUE_KEY.to_string()),
                Value::Bytes(self.value.clone()),
            ),
        ]);

        let mut buf = Vec::with_capacity(self.value.len() + 24);
        ciborium::ser::into_writer(&map, &mut buf)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(buf)
    }
}

impl Decode for Record {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|e| CodecError::decoding_failed(e.to_string()))?;

        let Value::Map(entries) = value else {
            return Err(CodecError::decoding_failed("record is not a CBOR map"));
        };

        let mut record = Self::default();
        for (key, value) in entries {
            match key.as_text() {
                Some(OFFSET_KEY) => {
                    let Value::Integer(n) = value else {
                        return Err(CodecError::InvalidField {
                            field: OFFSET_KEY,
                            expected: "unsigned integer",
                        });
                    };
                    record.offset = u64::try_from(n).map_err(|_| CodecError::InvalidField {
                        field: OFFSET_KEY,
                        expected: "unsigned integer",
                    })?;
                }
                Some(VALUE_KEY) => {
                    let Value::Bytes(b) = value else {
                        return Err(CodecError::InvalidField {
                            field: VALUE_KEY,
                            expected: "byte string",
                        });
                    };
                    record.value = b;
                }
                _ => {}
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_value(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf).unwrap();
        buf
    }

    #[test]
    fn encode_decode_hello_world() {
        let record = Record::new(b"hello world".to_vec()).with_offset(0);
        let bytes = record.encode().unwrap();
        assert_eq!(Record::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn empty_record() {
        let bytes = Record::default().encode().unwrap();
        let decoded = Record::decode(&bytes).unwrap();
        assert!(decoded.value.is_empty());
        assert_eq!(decoded.offset, 0);
    }

    #[test]
    fn missing_fields_default() {
        let bytes = encode_value(&Value::Map(vec![(
            Value::Text("value".into()),
            Value::Bytes(vec![1, 2, 3]),
        )]));
        let record = Record::decode(&bytes).unwrap();
        assert_eq!(record.value, vec![1, 2, 3]);
        assert_eq!(record.offset, 0);
    }

    #[test]
    fn unknown_fields_ignored() {
        let bytes = encode_value(&Value::Map(vec![
            (Value::Text("offset".into()), Value::Integer(9.into())),
            (Value::Text("key".into()), Value::Text("ignored".into())),
        ]));
        assert_eq!(Record::decode(&bytes).unwrap().offset, 9);
    }

    #[test]
    fn wrong_field_type_rejected() {
        let bytes = encode_value(&Value::Map(vec![(
            Value::Text("value".into()),
            Value::Text("not bytes".into()),
        )]));
        assert!(matches!(
            Record::decode(&bytes),
            Err(CodecError::InvalidField { field: "value", .. })
        ));

        let bytes = encode_value(&Value::Map(vec![(
            Value::Text("offset".into()),
            Value::Integer((-1).into()),
        )]));
        assert!(matches!(
            Record::decode(&bytes),
            Err(CodecError::InvalidField { field: "offset", .. })
        ));
    }

    #[test]
    fn non_map_rejected() {
        let bytes = encode_value(&Value::Integer(42.into()));
        assert!(matches!(
            Record::decode(&bytes),
            Err(CodecError::DecodingFailed { .. })
        ));
        assert!(Record::decode(&[]).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_any_record(
            value in prop::collection::vec(any::<u8>(), 0..512),
            offset in any::<u64>(),
        ) {
            let record = Record { value, offset };
            let bytes = record.encode().unwrap();
            prop_assert_eq!(Record::decode(&bytes).unwrap(), record);
        }
    }
}
