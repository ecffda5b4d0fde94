// src/sidecar/mod.rs
// ============================================================================
// SIDECAR .bin - Rank + extents + payload crudo
// ============================================================================
//
// Layout (contrato fijo, lo consume ntt::Tensor::from_bytes):
//   [1]          rank (u8)
//   [rank × 8]   extents (u64 LE)
//   [..]         elementos little-endian, row-major, ancho nativo del dtype
//
// No hay magic ni dtype: el consumidor ya sabe qué tipo espera.
//
// ============================================================================

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::npy::{checked_numel, Dtype, NpyArray};

/// Extensión del sidecar
pub const BIN_EXT: &str = "bin";

/// Bytes por extent
pub const EXTENT_SIZE: usize = 8;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("rank {0} does not fit in the 1-byte rank field")]
    RankTooLarge(usize),

    #[error("sidecar truncated while reading {0}")]
    Truncated(&'static str),

    #[error("extent {0} does not fit in usize")]
    ExtentOverflow(u64),

    #[error("shape {0:?} overflows the element count")]
    ShapeOverflow(Vec<usize>),

    #[error("payload is {found} bytes, expected {expected} ({numel} × {dtype})")]
    PayloadSize {
        expected: usize,
        found: usize,
        numel: usize,
        dtype: Dtype,
    },
}

/// Cabecera del sidecar: sólo el shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarHeader {
    pub shape: Vec<usize>,
}

impl SidecarHeader {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// None si el producto de extents desborda
    pub fn numel(&self) -> Option<usize> {
        checked_numel(&self.shape)
    }

    /// Tamaño en bytes de la cabecera
    pub fn size(&self) -> usize {
        1 + self.rank() * EXTENT_SIZE
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SidecarError> {
        let rank = u8::try_from(self.rank()).map_err(|_| SidecarError::RankTooLarge(self.rank()))?;
        let mut buf = Vec::with_capacity(self.size());
        buf.push(rank);
        for &extent in &self.shape {
            buf.write_u64::<LittleEndian>(extent as u64).unwrap();
        }
        Ok(buf)
    }

    /// Lee rank + extents desde el inicio de `data`
    pub fn read(data: &[u8]) -> Result<Self, SidecarError> {
        let mut cursor = Cursor::new(data);
        let rank = cursor.read_u8().map_err(|_| SidecarError::Truncated("rank"))?;

        let mut shape = Vec::with_capacity(rank as usize);
        for _ in 0..rank {
            let extent = cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| SidecarError::Truncated("extents"))?;
            shape.push(usize::try_from(extent).map_err(|_| SidecarError::ExtentOverflow(extent))?);
        }

        Ok(Self { shape })
    }
}

/// Codec del sidecar
pub struct Sidecar;

impl Sidecar {
    /// Codifica un array completo
    pub fn encode(array: &NpyArray) -> Result<Vec<u8>, SidecarError> {
        let header = SidecarHeader { shape: array.shape().to_vec() };
        let mut buf = header.to_bytes()?;
        buf.extend_from_slice(array.data());
        Ok(buf)
    }

    /// Decodifica con el dtype que el consumidor espera
    pub fn decode(data: &[u8], dtype: Dtype) -> Result<NpyArray, SidecarError> {
        let header = SidecarHeader::read(data)?;
        let payload = &data[header.size()..];

        let overflow = || SidecarError::ShapeOverflow(header.shape.clone());
        let numel = header.numel().ok_or_else(overflow)?;
        let expected = numel.checked_mul(dtype.itemsize()).ok_or_else(overflow)?;
        if payload.len() != expected {
            return Err(SidecarError::PayloadSize {
                expected,
                found: payload.len(),
                numel,
                dtype,
            });
        }

        NpyArray::new(dtype, header.shape, payload.to_vec())
            .map_err(|_| SidecarError::Truncated("payload"))
    }

    /// Escribe `<path>` sobrescribiendo
    pub fn write(path: impl AsRef<Path>, array: &NpyArray) -> Result<u64> {
        let path = path.as_ref();
        let bytes = Self::encode(array)?;

        let file = File::create(path)
            .with_context(|| format!("Cannot create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        writer.flush()?;

        Ok(bytes.len() as u64)
    }

    /// Lee un sidecar completo a memoria
    pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn random_array(rng: &mut StdRng, dtype: Dtype, rank: usize) -> NpyArray {
        let shape: Vec<usize> = (0..rank).map(|_| rng.gen_range(1..5)).collect();
        let numel: usize = shape.iter().product();
        let mut data = vec![0u8; numel * dtype.itemsize()];
        rng.fill(data.as_mut_slice());
        if dtype == Dtype::Bool {
            for b in data.iter_mut() {
                *b &= 1;
            }
        }
        NpyArray::new(dtype, shape, data).unwrap()
    }

    #[test]
    fn test_layout_2x2() {
        let data = [1i32, 2, 3, 4].iter().flat_map(|v| v.to_le_bytes()).collect();
        let array = NpyArray::new(Dtype::I32, vec![2, 2], data).unwrap();
        let bytes = Sidecar::encode(&array).unwrap();

        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..9], &2u64.to_le_bytes());
        assert_eq!(&bytes[9..17], &2u64.to_le_bytes());
        assert_eq!(&bytes[17..21], &1i32.to_le_bytes());
        assert_eq!(bytes.len(), 17 + 16);
    }

    #[test]
    fn test_rank_byte_matches_extents() {
        let mut rng = StdRng::seed_from_u64(7);
        for rank in 0..=4 {
            let array = random_array(&mut rng, Dtype::F32, rank);
            let bytes = Sidecar::encode(&array).unwrap();
            let header = SidecarHeader::read(&bytes).unwrap();
            assert_eq!(bytes[0] as usize, rank);
            assert_eq!(header.rank(), rank);
            assert_eq!(header.shape, array.shape());
        }
    }

    #[test]
    fn test_roundtrip_all_widths() {
        let mut rng = StdRng::seed_from_u64(42);
        for dtype in Dtype::ALL {
            for rank in 1..=4 {
                let array = random_array(&mut rng, dtype, rank);
                let bytes = Sidecar::encode(&array).unwrap();
                let decoded = Sidecar::decode(&bytes, dtype).unwrap();
                assert_eq!(decoded, array, "dtype {} rank {}", dtype, rank);
            }
        }
    }

    #[test]
    fn test_decode_wrong_dtype() {
        let array = NpyArray::new(Dtype::U8, vec![3], vec![1, 2, 3]).unwrap();
        let bytes = Sidecar::encode(&array).unwrap();
        let err = Sidecar::decode(&bytes, Dtype::F32).unwrap_err();
        assert!(matches!(err, SidecarError::PayloadSize { expected: 12, found: 3, .. }));
    }

    #[test]
    fn test_truncated_extents() {
        let err = SidecarHeader::read(&[3, 1, 0, 0]).unwrap_err();
        assert!(matches!(err, SidecarError::Truncated("extents")));
        assert!(matches!(SidecarHeader::read(&[]), Err(SidecarError::Truncated("rank"))));
    }

    #[test]
    fn test_huge_extents_are_error() {
        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&(1u64 << 32).to_le_bytes());
        bytes.extend_from_slice(&(1u64 << 32).to_le_bytes());
        assert!(Sidecar::decode(&bytes, Dtype::U8).is_err());

        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&((usize::MAX / 2 + 1) as u64).to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        let header = SidecarHeader::read(&bytes).unwrap();
        assert_eq!(header.numel(), None);
        assert!(matches!(Sidecar::decode(&bytes, Dtype::U8), Err(SidecarError::ShapeOverflow(_))));

        // numel cabe, numel × itemsize no
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&((usize::MAX / 4) as u64).to_le_bytes());
        assert!(matches!(Sidecar::decode(&bytes, Dtype::F64), Err(SidecarError::ShapeOverflow(_))));
    }

    #[test]
    fn test_rank_too_large() {
        let header = SidecarHeader { shape: vec![1; 256] };
        assert!(matches!(header.to_bytes(), Err(SidecarError::RankTooLarge(256))));
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.bin");
        std::fs::write(&path, vec![0xAA; 1000]).unwrap();

        let array = NpyArray::new(Dtype::I8, vec![2], vec![1, 2]).unwrap();
        let written = Sidecar::write(&path, &array).unwrap();

        let data = Sidecar::read_file(&path).unwrap();
        assert_eq!(written as usize, data.len());
        assert_eq!(data, vec![1, 2, 0, 0, 0, 0, 0, 0, 0, 1, 2]);
    }
}
