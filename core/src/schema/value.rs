//! Wire types and leaf values.
//!
//! [`FieldType`] is the fixed type-tag table: every tag has one byte width and
//! one big-endian encoding. [`Value`] is a concrete leaf value already
//! narrowed to its tag, so writing never has to re-check ranges.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

/// Wire type of a leaf field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    Bool,
    /// Raw bytes; a leaf of this type holds `len` bytes
    StringByte,
}

impl FieldType {
    /// Every tag, in table order
    pub const ALL: [FieldType; 9] = [
        FieldType::U8,
        FieldType::U16,
        FieldType::U32,
        FieldType::I8,
        FieldType::I16,
        FieldType::I32,
        FieldType::F32,
        FieldType::Bool,
        FieldType::StringByte,
    ];

    /// Look up a schema type tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "uint8" => Some(Self::U8),
            "uint16" => Some(Self::U16),
            "uint32" => Some(Self::U32),
            "int8" => Some(Self::I8),
            "int16" => Some(Self::I16),
            "int32" => Some(Self::I32),
            "float32" | "f32" => Some(Self::F32),
            "bool" => Some(Self::Bool),
            "string-byte" | "string" => Some(Self::StringByte),
            _ => None,
        }
    }

    /// Canonical schema tag
    pub const fn tag(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::F32 => "float32",
            Self::Bool => "bool",
            Self::StringByte => "string-byte",
        }
    }

    /// Encoded width of one value in bytes
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Bool | Self::StringByte => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }

    /// Decode one big-endian value of this type.
    ///
    /// `bytes` must be exactly [`width`](Self::width) long. For
    /// [`StringByte`](Self::StringByte) the byte is repeated `len` times.
    pub fn decode(self, bytes: &[u8], len: usize) -> Result<Value, ValueError> {
        if bytes.len() != self.width() {
            return Err(ValueError::WidthMismatch {
                ty: self,
                expected: self.width(),
                got: bytes.len(),
            });
        }
        Ok(match self {
            Self::U8 => Value::U8(bytes[0]),
            Self::U16 => Value::U16(BigEndian::read_u16(bytes)),
            Self::U32 => Value::U32(BigEndian::read_u32(bytes)),
            Self::I8 => Value::I8(bytes[0] as i8),
            Self::I16 => Value::I16(BigEndian::read_i16(bytes)),
            Self::I32 => Value::I32(BigEndian::read_i32(bytes)),
            Self::F32 => Value::F32(BigEndian::read_f32(bytes)),
            Self::Bool => Value::Bool(bytes[0] != 0),
            Self::StringByte => Value::Bytes(vec![bytes[0]; len]),
        })
    }

    /// Parse a schema literal: `0x`-prefixed big-endian hex, or a decimal /
    /// float literal.
    pub fn parse_literal(self, literal: &str, len: usize) -> Result<Value, ValueError> {
        if let Some(hex_digits) = literal.strip_prefix("0x").filter(|d| !d.is_empty()) {
            let bytes = hex::decode(hex_digits)
                .map_err(|e| ValueError::BadLiteral(format!("{literal}: {e}")))?;
            return self.decode(&bytes, len);
        }

        let bad = || ValueError::BadLiteral(literal.to_string());
        let scalar = match self {
            Self::F32 => Scalar::Float(literal.parse().map_err(|_| bad())?),
            Self::Bool => match literal {
                "true" => Scalar::Bool(true),
                "false" => Scalar::Bool(false),
                other => Scalar::Int(other.parse().map_err(|_| bad())?),
            },
            _ => Scalar::Int(literal.parse().map_err(|_| bad())?),
        };
        Value::from_scalar(self, scalar, len)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Value supplied by the replay model before it is narrowed to a wire type
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::Int(v as i64)
            }
        })*
    };
}

scalar_from_int!(u8, u16, u32, i8, i16, i32, i64);

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v as f64)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// Concrete leaf value, already narrowed to its wire type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    F32(f32),
    Bool(bool),
    /// Exactly `len` bytes of a string-byte leaf
    Bytes(Vec<u8>),
}

/// Value that cannot be represented by a wire type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("{value} does not fit in {ty}")]
    OutOfRange { value: Scalar, ty: FieldType },
    #[error("hex literal for {ty} must be {expected} bytes, got {got}")]
    WidthMismatch {
        ty: FieldType,
        expected: usize,
        got: usize,
    },
    #[error("invalid literal {0:?}")]
    BadLiteral(String),
}

impl Value {
    /// Narrow a scalar to `ty`. `len` is only used by string-byte leaves.
    pub fn from_scalar(ty: FieldType, scalar: Scalar, len: usize) -> Result<Value, ValueError> {
        let out_of_range = |scalar: Scalar| ValueError::OutOfRange { value: scalar, ty };

        let int = match &scalar {
            Scalar::Int(v) => Some(*v),
            Scalar::Bool(v) => Some(*v as i64),
            Scalar::Float(_) | Scalar::Text(_) => None,
        };

        let value = match ty {
            FieldType::F32 => match scalar {
                Scalar::Float(v) => Value::F32(v as f32),
                Scalar::Int(v) => Value::F32(v as f32),
                other => return Err(out_of_range(other)),
            },
            FieldType::Bool => match int {
                Some(v) => Value::Bool(v != 0),
                None => return Err(out_of_range(scalar)),
            },
            FieldType::StringByte => match scalar {
                Scalar::Text(text) => {
                    let mut bytes = text.into_bytes();
                    bytes.resize(len, 0);
                    Value::Bytes(bytes)
                }
                other => match int.and_then(|v| u8::try_from(v).ok()) {
                    Some(byte) => Value::Bytes(vec![byte; len]),
                    None => return Err(out_of_range(other)),
                },
            },
            _ => {
                let Some(v) = int else {
                    return Err(out_of_range(scalar));
                };
                let narrowed = match ty {
                    FieldType::U8 => u8::try_from(v).ok().map(Value::U8),
                    FieldType::U16 => u16::try_from(v).ok().map(Value::U16),
                    FieldType::U32 => u32::try_from(v).ok().map(Value::U32),
                    FieldType::I8 => i8::try_from(v).ok().map(Value::I8),
                    FieldType::I16 => i16::try_from(v).ok().map(Value::I16),
                    FieldType::I32 => i32::try_from(v).ok().map(Value::I32),
                    _ => None,
                };
                narrowed.ok_or_else(|| out_of_range(scalar))?
            }
        };
        Ok(value)
    }

    /// Write `repeat` big-endian copies of this value.
    ///
    /// A byte string is written as exactly `repeat` bytes, zero-padded or
    /// truncated.
    pub fn write<W: Write>(&self, writer: &mut W, repeat: usize) -> io::Result<()> {
        if let Value::Bytes(bytes) = self {
            let kept = bytes.len().min(repeat);
            writer.write_all(&bytes[..kept])?;
            return writer.write_all(&vec![0; repeat - kept]);
        }
        for _ in 0..repeat {
            match *self {
                Value::U8(v) => writer.write_u8(v)?,
                Value::U16(v) => writer.write_u16::<BigEndian>(v)?,
                Value::U32(v) => writer.write_u32::<BigEndian>(v)?,
                Value::I8(v) => writer.write_i8(v)?,
                Value::I16(v) => writer.write_i16::<BigEndian>(v)?,
                Value::I32(v) => writer.write_i32::<BigEndian>(v)?,
                Value::F32(v) => writer.write_f32::<BigEndian>(v)?,
                Value::Bool(v) => writer.write_u8(v as u8)?,
                Value::Bytes(_) => unreachable!("byte strings are written above"),
            }
        }
        Ok(())
    }
}
