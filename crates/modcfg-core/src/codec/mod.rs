//! Codecs between raw values and on-disk text encodings.

pub mod json;

pub use json::{
    decode_document, encode_document, json_to_raw, raw_to_json, CodecError, ConfigDocument,
    MOD_VERSION_FIELD,
};
