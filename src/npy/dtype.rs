// src/npy/dtype.rs
// ============================================================================
// DTYPE - Tipos de elemento soportados
// ============================================================================

use byteorder::{ByteOrder, LittleEndian};
use ndarray_npy::{ReadableElement, WritableElement};
use serde::{Serialize, Serializer};

/// Tipo de elemento de un array .npy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Dtype {
    pub const ALL: [Dtype; 11] = [
        Dtype::Bool,
        Dtype::I8,
        Dtype::I16,
        Dtype::I32,
        Dtype::I64,
        Dtype::U8,
        Dtype::U16,
        Dtype::U32,
        Dtype::U64,
        Dtype::F32,
        Dtype::F64,
    ];

    /// Bytes por elemento
    pub fn itemsize(self) -> usize {
        match self {
            Dtype::Bool | Dtype::I8 | Dtype::U8 => 1,
            Dtype::I16 | Dtype::U16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::U64 | Dtype::F64 => 8,
        }
    }

    /// Código NumPy sin prefijo de endianness ("f4", "i8", ...)
    pub fn kind_code(self) -> &'static str {
        match self {
            Dtype::Bool => "b1",
            Dtype::I8 => "i1",
            Dtype::I16 => "i2",
            Dtype::I32 => "i4",
            Dtype::I64 => "i8",
            Dtype::U8 => "u1",
            Dtype::U16 => "u2",
            Dtype::U32 => "u4",
            Dtype::U64 => "u8",
            Dtype::F32 => "f4",
            Dtype::F64 => "f8",
        }
    }

    /// Nombre NumPy ("int32", "float64", ...)
    pub fn name(self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::I8 => "int8",
            Dtype::I16 => "int16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::U32 => "uint32",
            Dtype::U64 => "uint64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        }
    }

    pub fn from_kind_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.kind_code() == code)
    }

    /// Acepta "f4", "<f4", "float32", "f32"...
    ///
    /// Los códigos NumPy mandan: "i8" es int64, no int8.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches(['<', '>', '|', '=']);
        Self::from_kind_code(s).or_else(|| {
            let lower = s.to_lowercase();
            Self::ALL.into_iter().find(|d| d.name() == lower).or(match lower.as_str() {
                "i16" => Some(Dtype::I16),
                "i32" => Some(Dtype::I32),
                "i64" => Some(Dtype::I64),
                "u16" => Some(Dtype::U16),
                "u32" => Some(Dtype::U32),
                "u64" => Some(Dtype::U64),
                "f32" => Some(Dtype::F32),
                "f64" => Some(Dtype::F64),
                _ => None,
            })
        })
    }

    /// Formatea un elemento (bytes little-endian) como literal C++
    pub fn format_element(self, b: &[u8]) -> String {
        match self {
            Dtype::Bool => (if b[0] != 0 { "true" } else { "false" }).to_string(),
            Dtype::I8 => (b[0] as i8).to_string(),
            Dtype::U8 => b[0].to_string(),
            Dtype::I16 => LittleEndian::read_i16(b).to_string(),
            Dtype::U16 => LittleEndian::read_u16(b).to_string(),
            Dtype::I32 => LittleEndian::read_i32(b).to_string(),
            Dtype::U32 => LittleEndian::read_u32(b).to_string(),
            Dtype::I64 => LittleEndian::read_i64(b).to_string(),
            Dtype::U64 => LittleEndian::read_u64(b).to_string(),
            Dtype::F32 => format_f32(LittleEndian::read_f32(b)),
            Dtype::F64 => format_f64(LittleEndian::read_f64(b)),
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Mismo nombre en el report JSON que en los banners
impl Serialize for Dtype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Puente entre los elementos de ndarray-npy y los bytes LE de `NpyArray`
pub trait Element: ReadableElement + WritableElement + Copy {
    const DTYPE: Dtype;

    fn write_le(self, out: &mut Vec<u8>);

    fn read_le(b: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($t:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $t {
                const DTYPE: Dtype = $dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(b: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(b);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_element! {
    i8 => Dtype::I8,
    i16 => Dtype::I16,
    i32 => Dtype::I32,
    i64 => Dtype::I64,
    u8 => Dtype::U8,
    u16 => Dtype::U16,
    u32 => Dtype::U32,
    u64 => Dtype::U64,
    f32 => Dtype::F32,
    f64 => Dtype::F64,
}

impl Element for bool {
    const DTYPE: Dtype = Dtype::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn read_le(b: &[u8]) -> Self {
        b[0] != 0
    }
}

// Debug da la representación más corta que hace round-trip y conserva ".0"
fn format_f32(v: f32) -> String {
    if v.is_nan() {
        "NAN".to_string()
    } else if v.is_infinite() {
        (if v > 0.0 { "INFINITY" } else { "-INFINITY" }).to_string()
    } else {
        format!("{:?}", v)
    }
}

fn format_f64(v: f64) -> String {
    if v.is_nan() {
        "NAN".to_string()
    } else if v.is_infinite() {
        (if v > 0.0 { "INFINITY" } else { "-INFINITY" }).to_string()
    } else {
        format!("{:?}", v)
    }
}
