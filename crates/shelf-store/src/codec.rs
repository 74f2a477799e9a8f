use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Converts JSON documents to and from their on-disk bytes.
pub trait DocumentCodec: Send + Sync {
    fn encode(&self, document: &Value) -> StoreResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> StoreResult<Value>;
}

/// `serde_json` codec. Object members are emitted in sorted key order, so an
/// unchanged document always encodes to the same bytes.
#[derive(Clone, Copy, Debug)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn pretty() -> Self {
        Self::new(true)
    }

    pub fn compact() -> Self {
        Self::new(false)
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::pretty()
    }
}

impl DocumentCodec for JsonCodec {
    fn encode(&self, document: &Value) -> StoreResult<Vec<u8>> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        };
        result.map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> StoreResult<Value> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pretty_and_compact_decode_equal() {
        let doc = json!({"id": "a", "n": 1});
        let pretty = JsonCodec::pretty().encode(&doc).unwrap();
        let compact = JsonCodec::compact().encode(&doc).unwrap();
        assert!(pretty.len() > compact.len());
        assert_eq!(JsonCodec::pretty().decode(&pretty).unwrap(), doc);
        assert_eq!(JsonCodec::compact().decode(&compact).unwrap(), doc);
    }

    #[test]
    fn encoding_is_stable() {
        let codec = JsonCodec::default();
        let doc = json!({"b": 1, "a": [1, 2, 3]});
        let once = codec.encode(&doc).unwrap();
        let twice = codec.encode(&codec.decode(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn invalid_bytes_fail() {
        let err = JsonCodec::default().decode(b"{not json").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
