//! The ABI-driven JSON ↔ binary codec.
//!
//! A codec borrows a single [`AbiDef`] and converts values of any type that
//! ABI (or the builtin table) can describe. Encoding and decoding are
//! all-or-nothing: the first failure aborts and no partial output is
//! returned. Hex output is uppercase; hex input accepts either case.

use crate::buffer::{SerialReader, SerialWriter};
use crate::def::{AbiDef, StructDef};
use crate::error::SerializationError;
use crate::keys;
use chrono::{DateTime, NaiveDateTime};
use eoskit_core::Name;
use serde_json::{Map, Number, Value};

/// Largest integer JSON consumers can represent exactly (2^53 - 1).
const MAX_SAFE_JSON_INT: u64 = 9_007_199_254_740_991;

/// Milliseconds between the Unix epoch and 2000-01-01T00:00:00.000.
const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000;

/// Milliseconds per block timestamp slot.
const BLOCK_INTERVAL_MS: i64 = 500;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// JSON ↔ binary converter for one ABI.
#[derive(Debug, Clone, Copy)]
pub struct AbiCodec<'a> {
    abi: &'a AbiDef,
}

impl<'a> AbiCodec<'a> {
    pub fn new(abi: &'a AbiDef) -> Self {
        Self { abi }
    }

    pub fn abi(&self) -> &'a AbiDef {
        self.abi
    }

    /// Encode a JSON value as binary.
    pub fn json_to_bin(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, SerializationError> {
        let mut writer = SerialWriter::new();
        self.encode(type_name, value, &mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Decode binary bytes into a JSON value. Trailing bytes are an error.
    pub fn bin_to_json(&self, type_name: &str, bytes: &[u8]) -> Result<Value, SerializationError> {
        let mut reader = SerialReader::new(bytes);
        let value = self.decode(type_name, &mut reader)?;
        if reader.remaining() != 0 {
            return Err(SerializationError::TrailingBytes {
                type_name: type_name.into(),
            });
        }
        Ok(value)
    }

    /// Encode a JSON string as an uppercase hex string.
    pub fn json_to_hex(&self, type_name: &str, json: &str) -> Result<String, SerializationError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(hex::encode_upper(self.json_to_bin(type_name, &value)?))
    }

    /// Decode a hex string (either case) into a JSON string.
    pub fn hex_to_json(&self, type_name: &str, hex_text: &str) -> Result<String, SerializationError> {
        let bytes = hex::decode(hex_text).map_err(|e| SerializationError::InvalidHex {
            reason: e.to_string(),
        })?;
        Ok(self.bin_to_json(type_name, &bytes)?.to_string())
    }

    /// Follow the typedef chain (and strip binary-extension markers) until a
    /// concrete type name remains.
    fn resolve<'b>(&'b self, type_name: &'b str) -> Result<&'b str, SerializationError> {
        let mut ty = type_name;
        let mut hops = 0;
        loop {
            if let Some(inner) = ty.strip_suffix('$') {
                ty = inner;
                continue;
            }
            if let Some(target) = self.abi.find_typedef(ty) {
                hops += 1;
                if hops > self.abi.types.len() {
                    return Err(SerializationError::CyclicType {
                        type_name: type_name.into(),
                    });
                }
                ty = target;
                continue;
            }
            return Ok(ty);
        }
    }

    fn encode(
        &self,
        type_name: &str,
        value: &Value,
        w: &mut SerialWriter,
    ) -> Result<(), SerializationError> {
        let ty = self.resolve(type_name)?;

        if let Some(inner) = ty.strip_suffix("[]") {
            let items = value.as_array().ok_or_else(|| mismatch(ty, "array", value))?;
            w.push_varuint32(items.len() as u32);
            for item in items {
                self.encode(inner, item, w)?;
            }
            return Ok(());
        }

        if let Some(inner) = ty.strip_suffix('?') {
            if value.is_null() {
                w.push_byte(0);
            } else {
                w.push_byte(1);
                self.encode(inner, value, w)?;
            }
            return Ok(());
        }

        if self.encode_builtin(ty, value, w)? {
            return Ok(());
        }

        if let Some(variant) = self.abi.find_variant(ty) {
            let parts = value.as_array().ok_or_else(|| mismatch(ty, "array", value))?;
            let (tag, inner) = match parts.as_slice() {
                [Value::String(tag), inner] => (tag, inner),
                _ => {
                    return Err(SerializationError::InvalidValue {
                        type_name: ty.into(),
                        reason: "variant value must be [\"type\", value]".into(),
                    })
                }
            };
            let index = variant
                .types
                .iter()
                .position(|t| t == tag)
                .ok_or_else(|| SerializationError::UnknownVariantTag {
                    variant: ty.into(),
                    tag: tag.clone(),
                })?;
            w.push_varuint32(index as u32);
            return self.encode(&variant.types[index], inner, w);
        }

        if let Some(strct) = self.abi.find_struct(ty) {
            let object = value.as_object().ok_or_else(|| mismatch(ty, "object", value))?;
            let mut seen_bases = Vec::new();
            return self.encode_struct(strct, object, w, &mut seen_bases);
        }

        Err(SerializationError::TypeNotFound {
            type_name: ty.into(),
        })
    }

    fn encode_struct(
        &self,
        strct: &StructDef,
        object: &Map<String, Value>,
        w: &mut SerialWriter,
        seen_bases: &mut Vec<String>,
    ) -> Result<(), SerializationError> {
        if !strct.base.is_empty() {
            if seen_bases.iter().any(|b| *b == strct.name) {
                return Err(SerializationError::CyclicType {
                    type_name: strct.name.clone(),
                });
            }
            seen_bases.push(strct.name.clone());
            let base = self.abi.find_struct(&strct.base).ok_or_else(|| {
                SerializationError::TypeNotFound {
                    type_name: strct.base.clone(),
                }
            })?;
            self.encode_struct(base, object, w, seen_bases)?;
        }

        let mut extensions_stopped = false;
        for field in &strct.fields {
            let is_extension = field.type_name.ends_with('$');
            match object.get(&field.name) {
                Some(value) => {
                    if extensions_stopped {
                        return Err(SerializationError::InvalidValue {
                            type_name: strct.name.clone(),
                            reason: format!(
                                "extension field '{}' present after an earlier one was omitted",
                                field.name
                            ),
                        });
                    }
                    self.encode(&field.type_name, value, w)?;
                }
                None if is_extension => extensions_stopped = true,
                None => {
                    return Err(SerializationError::MissingField {
                        strct: strct.name.clone(),
                        field: field.name.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    fn decode(
        &self,
        type_name: &str,
        r: &mut SerialReader<'_>,
    ) -> Result<Value, SerializationError> {
        let ty = self.resolve(type_name)?;

        if let Some(inner) = ty.strip_suffix("[]") {
            let len = r.read_varuint32()? as usize;
            let mut items = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                items.push(self.decode(inner, r)?);
            }
            return Ok(Value::Array(items));
        }

        if let Some(inner) = ty.strip_suffix('?') {
            return match r.read_byte()? {
                0 => Ok(Value::Null),
                1 => self.decode(inner, r),
                other => Err(SerializationError::InvalidValue {
                    type_name: ty.into(),
                    reason: format!("invalid optional presence byte {other}"),
                }),
            };
        }

        if let Some(value) = self.decode_builtin(ty, r)? {
            return Ok(value);
        }

        if let Some(variant) = self.abi.find_variant(ty) {
            let index = r.read_varuint32()?;
            let alt = variant.types.get(index as usize).ok_or_else(|| {
                SerializationError::VariantIndexOutOfRange {
                    variant: ty.into(),
                    index,
                    len: variant.types.len(),
                }
            })?;
            let inner = self.decode(alt, r)?;
            return Ok(Value::Array(vec![Value::String(alt.clone()), inner]));
        }

        if let Some(strct) = self.abi.find_struct(ty) {
            let mut object = Map::new();
            let mut seen_bases = Vec::new();
            self.decode_struct(strct, r, &mut object, &mut seen_bases)?;
            return Ok(Value::Object(object));
        }

        Err(SerializationError::TypeNotFound {
            type_name: ty.into(),
        })
    }

    fn decode_struct(
        &self,
        strct: &StructDef,
        r: &mut SerialReader<'_>,
        object: &mut Map<String, Value>,
        seen_bases: &mut Vec<String>,
    ) -> Result<(), SerializationError> {
        if !strct.base.is_empty() {
            if seen_bases.iter().any(|b| *b == strct.name) {
                return Err(SerializationError::CyclicType {
                    type_name: strct.name.clone(),
                });
            }
            seen_bases.push(strct.name.clone());
            let base = self.abi.find_struct(&strct.base).ok_or_else(|| {
                SerializationError::TypeNotFound {
                    type_name: strct.base.clone(),
                }
            })?;
            self.decode_struct(base, r, object, seen_bases)?;
        }

        for field in &strct.fields {
            // A binary-extension field simply stops existing when the input
            // runs out; everything after it must be an extension too.
            if field.type_name.ends_with('$') && r.remaining() == 0 {
                break;
            }
            let value = self.decode(&field.type_name, r)?;
            object.insert(field.name.clone(), value);
        }
        Ok(())
    }

    /// Returns `Ok(true)` if `ty` named a builtin and was encoded.
    fn encode_builtin(
        &self,
        ty: &str,
        value: &Value,
        w: &mut SerialWriter,
    ) -> Result<bool, SerializationError> {
        match ty {
            "bool" => {
                let b = value.as_bool().ok_or_else(|| mismatch(ty, "bool", value))?;
                w.push_byte(b as u8);
            }
            "uint8" => w.push_byte(ranged_u64(ty, value, u8::MAX as u64)? as u8),
            "uint16" => w.push_u16(ranged_u64(ty, value, u16::MAX as u64)? as u16),
            "uint32" => w.push_u32(ranged_u64(ty, value, u32::MAX as u64)? as u32),
            "uint64" => w.push_u64(as_u64(ty, value)?),
            "uint128" => w.push_u128(as_u128(ty, value)?),
            "int8" => w.push_byte(ranged_i64(ty, value, i8::MIN as i64, i8::MAX as i64)? as u8),
            "int16" => {
                w.push_u16(ranged_i64(ty, value, i16::MIN as i64, i16::MAX as i64)? as u16)
            }
            "int32" => {
                w.push_u32(ranged_i64(ty, value, i32::MIN as i64, i32::MAX as i64)? as u32)
            }
            "int64" => w.push_u64(as_i64(ty, value)? as u64),
            "int128" => w.push_u128(as_i128(ty, value)? as u128),
            "varuint32" => w.push_varuint32(ranged_u64(ty, value, u32::MAX as u64)? as u32),
            "varint32" => {
                w.push_varint32(ranged_i64(ty, value, i32::MIN as i64, i32::MAX as i64)? as i32)
            }
            "float32" => w.push_bytes(&(as_f64(ty, value)? as f32).to_le_bytes()),
            "float64" => w.push_bytes(&as_f64(ty, value)?.to_le_bytes()),
            "float128" => w.push_bytes(&fixed_hex::<16>(ty, value)?),
            "string" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                w.push_length_prefixed(s.as_bytes());
            }
            "bytes" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                let bytes = hex::decode(s).map_err(|e| SerializationError::InvalidHex {
                    reason: e.to_string(),
                })?;
                w.push_length_prefixed(&bytes);
            }
            "name" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                let name = Name::new(s).map_err(|e| SerializationError::InvalidValue {
                    type_name: ty.into(),
                    reason: e.to_string(),
                })?;
                w.push_u64(name.as_u64());
            }
            "time_point_sec" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                let secs = parse_utc(ty, s)?.and_utc().timestamp();
                let secs = u32::try_from(secs).map_err(|_| SerializationError::InvalidValue {
                    type_name: ty.into(),
                    reason: format!("'{s}' is outside the representable range"),
                })?;
                w.push_u32(secs);
            }
            "time_point" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                w.push_u64(parse_utc(ty, s)?.and_utc().timestamp_micros() as u64);
            }
            "block_timestamp_type" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                let ms = parse_utc(ty, s)?.and_utc().timestamp_millis();
                let slot = (ms - BLOCK_TIMESTAMP_EPOCH_MS) / BLOCK_INTERVAL_MS;
                let slot = u32::try_from(slot).map_err(|_| SerializationError::InvalidValue {
                    type_name: ty.into(),
                    reason: format!("'{s}' is outside the representable range"),
                })?;
                w.push_u32(slot);
            }
            "checksum160" => w.push_bytes(&fixed_hex::<20>(ty, value)?),
            "checksum256" => w.push_bytes(&fixed_hex::<32>(ty, value)?),
            "checksum512" => w.push_bytes(&fixed_hex::<64>(ty, value)?),
            "public_key" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                w.push_bytes(&keys::public_key_from_string(s)?);
            }
            "signature" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                w.push_bytes(&keys::signature_from_string(s)?);
            }
            "symbol_code" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                w.push_u64(symbol_code_to_u64(ty, s)?);
            }
            "symbol" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                w.push_u64(parse_symbol(ty, s)?);
            }
            "asset" => {
                let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
                let (amount, symbol) = parse_asset(ty, s)?;
                w.push_u64(amount as u64);
                w.push_u64(symbol);
            }
            "extended_asset" => {
                let object = value.as_object().ok_or_else(|| mismatch(ty, "object", value))?;
                let quantity = object.get("quantity").ok_or_else(|| {
                    SerializationError::MissingField {
                        strct: ty.into(),
                        field: "quantity".into(),
                    }
                })?;
                let contract = object.get("contract").ok_or_else(|| {
                    SerializationError::MissingField {
                        strct: ty.into(),
                        field: "contract".into(),
                    }
                })?;
                self.encode("asset", quantity, w)?;
                self.encode("name", contract, w)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Returns `Ok(Some(value))` if `ty` named a builtin.
    fn decode_builtin(
        &self,
        ty: &str,
        r: &mut SerialReader<'_>,
    ) -> Result<Option<Value>, SerializationError> {
        let value = match ty {
            "bool" => match r.read_byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(SerializationError::InvalidValue {
                        type_name: ty.into(),
                        reason: format!("invalid bool byte {other}"),
                    })
                }
            },
            "uint8" => Value::from(r.read_byte()?),
            "uint16" => Value::from(r.read_u16()?),
            "uint32" => Value::from(r.read_u32()?),
            "uint64" => json_u64(r.read_u64()?),
            "uint128" => Value::String(r.read_u128()?.to_string()),
            "int8" => Value::from(r.read_byte()? as i8),
            "int16" => Value::from(r.read_u16()? as i16),
            "int32" => Value::from(r.read_u32()? as i32),
            "int64" => json_i64(r.read_u64()? as i64),
            "int128" => Value::String((r.read_u128()? as i128).to_string()),
            "varuint32" => Value::from(r.read_varuint32()?),
            "varint32" => Value::from(r.read_varint32()?),
            "float32" => {
                let b = r.read_bytes(4)?;
                let f = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                // Route through f32's shortest decimal form so 0.1 comes back
                // as 0.1, not the f64 widening 0.10000000149011612. The debug
                // form keeps the trailing .0 on whole values, so the result
                // stays a JSON float. Non-finite values have no JSON number
                // form and decode as null.
                format!("{f:?}")
                    .parse::<Number>()
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            "float64" => {
                let b = r.read_bytes(8)?;
                let mut arr = [0u8; 8];
                arr.copy_from_slice(b);
                Value::from(f64::from_le_bytes(arr))
            }
            "float128" => Value::String(hex::encode_upper(r.read_bytes(16)?)),
            "string" => {
                let bytes = r.read_length_prefixed()?;
                Value::String(String::from_utf8(bytes.to_vec()).map_err(|_| {
                    SerializationError::InvalidValue {
                        type_name: ty.into(),
                        reason: "string is not valid UTF-8".into(),
                    }
                })?)
            }
            "bytes" => Value::String(hex::encode_upper(r.read_length_prefixed()?)),
            "name" => Value::String(Name::from_u64(r.read_u64()?).as_str().to_string()),
            "time_point_sec" => {
                let secs = r.read_u32()?;
                Value::String(format_utc_secs(ty, secs as i64)?)
            }
            "time_point" => {
                let micros = r.read_u64()? as i64;
                let dt = DateTime::from_timestamp_micros(micros).ok_or_else(|| {
                    SerializationError::InvalidValue {
                        type_name: ty.into(),
                        reason: format!("timestamp {micros}us is out of range"),
                    }
                })?;
                Value::String(dt.naive_utc().format(TIME_FORMAT).to_string())
            }
            "block_timestamp_type" => {
                let slot = r.read_u32()? as i64;
                let ms = BLOCK_TIMESTAMP_EPOCH_MS + slot * BLOCK_INTERVAL_MS;
                let dt = DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                    SerializationError::InvalidValue {
                        type_name: ty.into(),
                        reason: format!("slot {slot} is out of range"),
                    }
                })?;
                Value::String(dt.naive_utc().format(TIME_FORMAT).to_string())
            }
            "checksum160" => Value::String(hex::encode_upper(r.read_bytes(20)?)),
            "checksum256" => Value::String(hex::encode_upper(r.read_bytes(32)?)),
            "checksum512" => Value::String(hex::encode_upper(r.read_bytes(64)?)),
            "public_key" => {
                let bytes = r.read_bytes(keys::PUBLIC_KEY_DATA_LEN + 1)?;
                Value::String(keys::public_key_to_string(bytes)?)
            }
            "signature" => {
                let bytes = r.read_bytes(keys::SIGNATURE_DATA_LEN + 1)?;
                Value::String(keys::signature_to_string(bytes)?)
            }
            "symbol_code" => Value::String(symbol_code_from_u64(ty, r.read_u64()?)?),
            "symbol" => Value::String(format_symbol(ty, r.read_u64()?)?),
            "asset" => {
                let amount = r.read_u64()? as i64;
                let symbol = r.read_u64()?;
                Value::String(format_asset(ty, amount, symbol)?)
            }
            "extended_asset" => {
                let quantity = self.decode("asset", r)?;
                let contract = self.decode("name", r)?;
                let mut object = Map::new();
                object.insert("quantity".into(), quantity);
                object.insert("contract".into(), contract);
                Value::Object(object)
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

fn mismatch(ty: &str, expected: &'static str, got: &Value) -> SerializationError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SerializationError::TypeMismatch {
        type_name: ty.into(),
        expected,
        got: got.into(),
    }
}

fn as_u64(ty: &str, value: &Value) -> Result<u64, SerializationError> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("{n} is not an unsigned integer"),
        }),
        Value::String(s) => s.parse().map_err(|_| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("cannot parse '{s}' as an unsigned integer"),
        }),
        other => Err(mismatch(ty, "number or string", other)),
    }
}

fn as_i64(ty: &str, value: &Value) -> Result<i64, SerializationError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("{n} is not a signed integer"),
        }),
        Value::String(s) => s.parse().map_err(|_| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("cannot parse '{s}' as a signed integer"),
        }),
        other => Err(mismatch(ty, "number or string", other)),
    }
}

fn as_u128(ty: &str, value: &Value) -> Result<u128, SerializationError> {
    match value {
        Value::Number(_) => Ok(as_u64(ty, value)? as u128),
        Value::String(s) => s.parse().map_err(|_| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("cannot parse '{s}' as a 128-bit unsigned integer"),
        }),
        other => Err(mismatch(ty, "number or string", other)),
    }
}

fn as_i128(ty: &str, value: &Value) -> Result<i128, SerializationError> {
    match value {
        Value::Number(_) => Ok(as_i64(ty, value)? as i128),
        Value::String(s) => s.parse().map_err(|_| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("cannot parse '{s}' as a 128-bit signed integer"),
        }),
        other => Err(mismatch(ty, "number or string", other)),
    }
}

fn as_f64(ty: &str, value: &Value) -> Result<f64, SerializationError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("{n} is not representable as a float"),
        }),
        Value::String(s) => s.parse().map_err(|_| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("cannot parse '{s}' as a float"),
        }),
        other => Err(mismatch(ty, "number or string", other)),
    }
}

fn ranged_u64(ty: &str, value: &Value, max: u64) -> Result<u64, SerializationError> {
    let v = as_u64(ty, value)?;
    if v > max {
        return Err(SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("{v} exceeds the maximum of {max}"),
        });
    }
    Ok(v)
}

fn ranged_i64(ty: &str, value: &Value, min: i64, max: i64) -> Result<i64, SerializationError> {
    let v = as_i64(ty, value)?;
    if v < min || v > max {
        return Err(SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("{v} is outside the range {min}..={max}"),
        });
    }
    Ok(v)
}

fn fixed_hex<const N: usize>(ty: &str, value: &Value) -> Result<[u8; N], SerializationError> {
    let s = value.as_str().ok_or_else(|| mismatch(ty, "string", value))?;
    let bytes = hex::decode(s).map_err(|e| SerializationError::InvalidHex {
        reason: e.to_string(),
    })?;
    bytes
        .try_into()
        .map_err(|_| SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("expected exactly {N} bytes of hex"),
        })
}

/// Emit as a JSON number when exactly representable, a decimal string otherwise.
fn json_u64(v: u64) -> Value {
    if v <= MAX_SAFE_JSON_INT {
        Value::from(v)
    } else {
        Value::String(v.to_string())
    }
}

fn json_i64(v: i64) -> Value {
    if v.unsigned_abs() <= MAX_SAFE_JSON_INT {
        Value::from(v)
    } else {
        Value::String(v.to_string())
    }
}

fn parse_utc(ty: &str, text: &str) -> Result<NaiveDateTime, SerializationError> {
    let trimmed = text.strip_suffix('Z').unwrap_or(text);
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map_err(|_| {
        SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("cannot parse '{text}' as a timestamp"),
        }
    })
}

fn format_utc_secs(ty: &str, secs: i64) -> Result<String, SerializationError> {
    let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| SerializationError::InvalidValue {
        type_name: ty.into(),
        reason: format!("timestamp {secs}s is out of range"),
    })?;
    Ok(dt.naive_utc().format(TIME_FORMAT).to_string())
}

fn symbol_code_to_u64(ty: &str, code: &str) -> Result<u64, SerializationError> {
    if code.is_empty() || code.len() > 7 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("'{code}' is not a valid symbol code (1-7 chars A-Z)"),
        });
    }
    let mut v = 0u64;
    for (i, b) in code.bytes().enumerate() {
        v |= (b as u64) << (8 * i);
    }
    Ok(v)
}

fn symbol_code_from_u64(ty: &str, mut v: u64) -> Result<String, SerializationError> {
    let mut code = String::new();
    while v != 0 {
        let b = (v & 0xff) as u8;
        if !b.is_ascii_uppercase() {
            return Err(SerializationError::InvalidValue {
                type_name: ty.into(),
                reason: format!("byte 0x{b:02x} is not a valid symbol code character"),
            });
        }
        code.push(b as char);
        v >>= 8;
    }
    if code.is_empty() {
        return Err(SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: "empty symbol code".into(),
        });
    }
    Ok(code)
}

/// "4,SYS" → packed u64 (precision in the low byte, code above it).
fn parse_symbol(ty: &str, text: &str) -> Result<u64, SerializationError> {
    let (precision, code) = text.split_once(',').ok_or_else(|| {
        SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("'{text}' is not of the form 'precision,CODE'"),
        }
    })?;
    let precision: u8 = precision.parse().map_err(|_| SerializationError::InvalidValue {
        type_name: ty.into(),
        reason: format!("invalid precision in '{text}'"),
    })?;
    if precision > 18 {
        return Err(SerializationError::InvalidValue {
            type_name: ty.into(),
            reason: format!("precision {precision} exceeds 18"),
        });
    }
    Ok(precision as u64 | (symbol_code_to_u64(ty, code)? << 8))
}

fn format_symbol(ty: &str, v: u64) -> Result<String, SerializationError> {
    let precision = (v & 0xff) as u8;
    let code = symbol_code_from_u64(ty, v >> 8)?;
    Ok(format!("{precision},{code}"))
}

/// "42.0000 SYS" → (420000, packed symbol).
fn parse_asset(ty: &str, text: &str) -> Result<(i64, u64), SerializationError> {
    let invalid = |reason: String| SerializationError::InvalidValue {
        type_name: ty.into(),
        reason,
    };
    let (amount_text, code) = text
        .split_once(' ')
        .ok_or_else(|| invalid(format!("'{text}' is not of the form 'AMOUNT CODE'")))?;
    let (negative, digits_text) = match amount_text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, amount_text),
    };
    let (int_part, frac_part) = match digits_text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits_text, ""),
    };
    if int_part.is_empty()
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid(format!("'{text}' has a malformed amount")));
    }
    let precision = frac_part.len() as u8;
    let mut amount: i64 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        amount = amount
            .checked_mul(10)
            .and_then(|a| a.checked_add((b - b'0') as i64))
            .ok_or_else(|| invalid(format!("amount in '{text}' overflows 64 bits")))?;
    }
    if negative {
        amount = -amount;
    }
    let symbol = parse_symbol(ty, &format!("{precision},{code}"))?;
    Ok((amount, symbol))
}

fn format_asset(ty: &str, amount: i64, symbol: u64) -> Result<String, SerializationError> {
    let precision = (symbol & 0xff) as usize;
    let code = symbol_code_from_u64(ty, symbol >> 8)?;
    let magnitude = (amount as i128).unsigned_abs().to_string();
    let digits = if magnitude.len() <= precision {
        format!("{:0>width$}", magnitude, width = precision + 1)
    } else {
        magnitude
    };
    let (int_part, frac_part) = digits.split_at(digits.len() - precision);
    let sign = if amount < 0 { "-" } else { "" };
    if precision == 0 {
        Ok(format!("{sign}{int_part} {code}"))
    } else {
        Ok(format!("{sign}{int_part}.{frac_part} {code}"))
    }
}
