//! Typed values stored in a container.
//!
//! Any serde type that is also `Clone + Send + 'static` is a [`Value`]. The
//! container keeps resolved values type-erased and hands them back through a
//! checked downcast.
//!
//! Value record payload: `[type_len u16][type name][bincode body]`. The type
//! name is checked before decoding, so a lazy get of the wrong type is a
//! `TypeMismatch` even when the bincode body would decode.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, Any};

use crate::error::HioError;
use crate::rio::codec::{decode_value, encode_value};
use crate::util::{read_str16, write_str16};

pub trait Value: Serialize + DeserializeOwned + Clone + Send + 'static {}

impl<T> Value for T where T: Serialize + DeserializeOwned + Clone + Send + 'static {}

/// Type-erased resolved value: can be downcast on get and re-encoded on close.
pub(crate) trait Payload: Send {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
    fn encode(&self, name: &str) -> Result<Vec<u8>>;
}

impl<T: Value> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn encode(&self, name: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_str16(&mut out, type_name::<T>(), "value type")
            .map_err(|e| HioError::encode(name, format!("{:#}", e)))?;
        out.extend_from_slice(&encode_value(name, self)?);
        Ok(out)
    }
}

/// Decode a stored value record as `T`. A different stored type name is a
/// `TypeMismatch`; nothing is decoded in that case.
pub(crate) fn decode_stored<T: Value>(name: &str, raw: &[u8]) -> Result<T> {
    let (stored, off) = read_str16(raw, 0, "value type")
        .map_err(|e| HioError::decode(name, format!("{:#}", e)))?;
    if stored != type_name::<T>() {
        return Err(HioError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>().to_string(),
            found: stored,
        }
        .into());
    }
    decode_value(name, &raw[off..])
}

pub(crate) fn boxed<T: Value>(v: T) -> Box<dyn Payload> {
    Box::new(v)
}

/// Clone the resolved value out as `T`, or fail with `TypeMismatch`.
pub(crate) fn downcast<T: Value>(name: &str, p: &dyn Payload) -> Result<T> {
    match p.as_any().downcast_ref::<T>() {
        Some(v) => Ok(v.clone()),
        None => Err(HioError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>().to_string(),
            found: p.type_name().to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: f64,
        y: f64,
    }

    #[test]
    fn downcast_same_type() {
        let p = boxed(Point { x: 1.0, y: -2.5 });
        assert_eq!(
            downcast::<Point>("p", &*p).unwrap(),
            Point { x: 1.0, y: -2.5 }
        );
        assert!(p.type_name().ends_with("Point"));
    }

    #[test]
    fn downcast_other_type_is_mismatch() {
        let p = boxed(42i64);
        let err = downcast::<f64>("n", &*p).unwrap_err();
        match err.downcast_ref::<HioError>() {
            Some(HioError::TypeMismatch {
                name,
                expected,
                found,
            }) => {
                assert_eq!(name, "n");
                assert_eq!(expected, "f64");
                assert_eq!(found, "i64");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn payload_carries_its_type_name() {
        let p = boxed(String::from("hi"));
        let buf = p.encode("s").unwrap();
        let (tag, off) = read_str16(&buf, 0, "t").unwrap();
        assert_eq!(tag, type_name::<String>());
        assert_eq!(&buf[off..], encode_value("s", "hi").unwrap().as_slice());
        assert_eq!(decode_stored::<String>("s", &buf).unwrap(), "hi");
    }

    #[test]
    fn same_width_type_is_mismatch_not_garbage() {
        // i64 и f64 оба 8 байт: без имени типа f64 декодировался бы молча
        let buf = boxed(42i64).encode("n").unwrap();
        let err = decode_stored::<f64>("n", &buf).unwrap_err();
        match err.downcast_ref::<HioError>() {
            Some(HioError::TypeMismatch { expected, found, .. }) => {
                assert_eq!(expected, "f64");
                assert_eq!(found, "i64");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(decode_stored::<i64>("n", &buf).unwrap(), 42);
    }

    #[test]
    fn truncated_type_name_is_decode_error() {
        let err = decode_stored::<i64>("n", &[9, 0, b'i']).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HioError>(),
            Some(HioError::Decode { .. })
        ));
    }
}
