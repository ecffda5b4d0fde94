// src/npy/mod.rs
// ============================================================================
// NPY READER/WRITER - Arrays NumPy en memoria
// ============================================================================
//
// El parseo del formato lo hace ndarray-npy. Aquí sólo se descubre el dtype
// (probando cada tipo soportado hasta que el descriptor encaja) y se aplana
// el ArrayD a bytes little-endian en orden lógico (row-major), sea cual sea
// el endianness o el fortran_order del archivo.
//
// ============================================================================

pub mod dtype;
pub mod error;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;
use ndarray::{ArrayD, IxDyn};
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};

pub use dtype::{Dtype, Element};
pub use error::NpyError;

/// Ejecuta `$body` con `$T` = tipo Rust del dtype
macro_rules! with_element {
    ($dtype:expr, $T:ident => $body:expr) => {
        match $dtype {
            Dtype::Bool => { type $T = bool; $body }
            Dtype::I8 => { type $T = i8; $body }
            Dtype::I16 => { type $T = i16; $body }
            Dtype::I32 => { type $T = i32; $body }
            Dtype::I64 => { type $T = i64; $body }
            Dtype::U8 => { type $T = u8; $body }
            Dtype::U16 => { type $T = u16; $body }
            Dtype::U32 => { type $T = u32; $body }
            Dtype::U64 => { type $T = u64; $body }
            Dtype::F32 => { type $T = f32; $body }
            Dtype::F64 => { type $T = f64; $body }
        }
    };
}

/// Número de elementos sin overflow
pub fn checked_numel(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Array N-dimensional cargado desde un .npy
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    dtype: Dtype,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl NpyArray {
    /// Construye desde bytes little-endian en orden C
    pub fn new(dtype: Dtype, shape: Vec<usize>, data: Vec<u8>) -> Result<Self, NpyError> {
        let expected = checked_numel(&shape)
            .and_then(|n| n.checked_mul(dtype.itemsize()))
            .ok_or_else(|| NpyError::ShapeOverflow(shape.clone()))?;
        if data.len() != expected {
            return Err(NpyError::DataSize { expected, found: data.len() });
        }
        Ok(Self { dtype, shape, data })
    }

    /// Abre y decodifica un archivo .npy
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;

        let len = file.metadata()
            .with_context(|| format!("Cannot stat {}", path.display()))?
            .len();
        if len == 0 {
            return Err(NpyError::Empty)
                .with_context(|| format!("Cannot decode {}", path.display()));
        }

        let mmap = unsafe { Mmap::map(&file)? };

        Self::from_bytes(&mmap)
            .with_context(|| format!("Cannot decode {}", path.display()))
    }

    /// Decodifica un .npy completo desde memoria
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NpyError> {
        let mut descr = None;

        for dtype in Dtype::ALL {
            match with_element!(dtype, T => read_as::<T>(bytes)) {
                Ok(array) => {
                    log::debug!("npy: dtype={} shape={:?}", array.dtype, array.shape);
                    return Ok(array);
                }
                // Descriptor de otro tipo: probar el siguiente
                Err(ReadNpyError::WrongDescriptor(value)) => descr = Some(format!("{:?}", value)),
                Err(e) => return Err(e.into()),
            }
        }

        Err(NpyError::UnsupportedDtype(descr.unwrap_or_default()))
    }

    /// Aplana un ArrayD en orden lógico
    pub fn from_ndarray<T: Element>(array: &ArrayD<T>) -> Self {
        let mut data = Vec::with_capacity(array.len() * T::DTYPE.itemsize());
        for &value in array.iter() {
            value.write_le(&mut data);
        }
        Self {
            dtype: T::DTYPE,
            shape: array.shape().to_vec(),
            data,
        }
    }

    /// Reconstruye el ArrayD tipado; el dtype debe coincidir
    pub fn to_ndarray<T: Element>(&self) -> Result<ArrayD<T>, NpyError> {
        if T::DTYPE != self.dtype {
            return Err(NpyError::UnsupportedDtype(format!(
                "{} (array holds {})",
                T::DTYPE,
                self.dtype
            )));
        }
        let values: Vec<T> = self
            .data
            .chunks_exact(self.dtype.itemsize())
            .map(T::read_le)
            .collect();
        Ok(ArrayD::from_shape_vec(IxDyn(&self.shape), values)?)
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Validado en construcción: no desborda
    pub fn numel(&self) -> usize {
        self.data.len() / self.dtype.itemsize()
    }

    /// Bytes crudos (little-endian, row-major)
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes del elemento `index` en orden row-major
    pub fn element(&self, index: usize) -> &[u8] {
        let size = self.dtype.itemsize();
        &self.data[index * size..(index + 1) * size]
    }

    /// Serializa como .npy con el writer de ndarray-npy
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), NpyError> {
        with_element!(self.dtype, T => self.to_ndarray::<T>()?.write_npy(writer)?);
        Ok(())
    }

    pub fn to_npy_bytes(&self) -> Result<Vec<u8>, NpyError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

fn read_as<T: Element>(bytes: &[u8]) -> Result<NpyArray, ReadNpyError> {
    let array = ArrayD::<T>::read_npy(bytes)?;
    Ok(NpyArray::from_ndarray(&array))
}

/// Escribe un array como .npy (little-endian, orden C)
pub fn write_npy(path: impl AsRef<Path>, array: &NpyArray) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    array.write_to(&mut writer)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// .npy v1.0 con dict arbitrario (sin padding)
    fn raw(dict: &str, payload: &[u8]) -> Vec<u8> {
        let mut buf = b"\x93NUMPY\x01\x00".to_vec();
        buf.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        buf.extend_from_slice(dict.as_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    fn i32_bytes(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_from_bytes_c_order() {
        let bytes = raw(
            "{'descr': '<i4', 'fortran_order': False, 'shape': (2, 2), }\n",
            &i32_bytes(&[1, 2, 3, 4]),
        );
        let array = NpyArray::from_bytes(&bytes).unwrap();
        assert_eq!(array.dtype(), Dtype::I32);
        assert_eq!(array.shape(), &[2, 2]);
        assert_eq!(array.data(), i32_bytes(&[1, 2, 3, 4]).as_slice());
    }

    #[test]
    fn test_dtype_discovery() {
        for dtype in Dtype::ALL {
            let array = NpyArray::new(dtype, vec![2], vec![1; 2 * dtype.itemsize()]).unwrap();
            let decoded = NpyArray::from_bytes(&array.to_npy_bytes().unwrap()).unwrap();
            assert_eq!(decoded.dtype(), dtype);
        }
    }

    #[test]
    fn test_big_endian_normalized() {
        let payload: Vec<u8> = [1i32, -2].iter().flat_map(|v| v.to_be_bytes()).collect();
        let bytes = raw("{'descr': '>i4', 'fortran_order': False, 'shape': (2,), }\n", &payload);
        let array = NpyArray::from_bytes(&bytes).unwrap();
        assert_eq!(array.data(), i32_bytes(&[1, -2]).as_slice());
    }

    #[test]
    fn test_fortran_order_reordered() {
        // [[1,2,3],[4,5,6]] en column-major: 1,4,2,5,3,6
        let bytes = raw(
            "{'descr': '<i4', 'fortran_order': True, 'shape': (2, 3), }\n",
            &i32_bytes(&[1, 4, 2, 5, 3, 6]),
        );
        let array = NpyArray::from_bytes(&bytes).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.data(), i32_bytes(&[1, 2, 3, 4, 5, 6]).as_slice());
    }

    #[test]
    fn test_scalar_shape() {
        let bytes = raw("{'descr': '<f8', 'fortran_order': False, 'shape': (), }\n", &2.5f64.to_le_bytes());
        let array = NpyArray::from_bytes(&bytes).unwrap();
        assert_eq!(array.rank(), 0);
        assert_eq!(array.numel(), 1);
    }

    #[test]
    fn test_unsupported_dtype() {
        let bytes = raw("{'descr': '<f2', 'fortran_order': False, 'shape': (1,), }\n", &[0, 0]);
        let err = NpyArray::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, NpyError::UnsupportedDtype(_)), "{err}");
    }

    #[test]
    fn test_bad_magic() {
        let err = NpyArray::from_bytes(b"PK\x03\x04 not an npy").unwrap_err();
        assert!(matches!(err, NpyError::Read(_)));
    }

    #[test]
    fn test_short_data() {
        let bytes = raw(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (3,), }\n",
            &[0u8; 16],
        );
        assert!(matches!(NpyArray::from_bytes(&bytes), Err(NpyError::Read(_))));
    }

    #[test]
    fn test_huge_shape_is_error() {
        let bytes = raw(
            "{'descr': '|u1', 'fortran_order': False, 'shape': (4294967296, 4294967296), }\n",
            &[],
        );
        assert!(NpyArray::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_new_shape_overflow() {
        let shape = vec![usize::MAX / 2 + 1, 2];
        let err = NpyArray::new(Dtype::U8, shape.clone(), vec![]).unwrap_err();
        assert!(matches!(err, NpyError::ShapeOverflow(s) if s == shape));

        // numel cabe pero numel × itemsize no
        let err = NpyArray::new(Dtype::F64, vec![usize::MAX / 4], vec![]).unwrap_err();
        assert!(matches!(err, NpyError::ShapeOverflow(_)));
    }

    #[test]
    fn test_checked_numel() {
        assert_eq!(checked_numel(&[]), Some(1));
        assert_eq!(checked_numel(&[2, 3, 4]), Some(24));
        assert_eq!(checked_numel(&[usize::MAX, 2]), None);
    }

    #[test]
    fn test_ndarray_roundtrip() {
        let array = NpyArray::new(Dtype::U16, vec![3, 1], vec![1, 0, 2, 0, 3, 0]).unwrap();
        let nd = array.to_ndarray::<u16>().unwrap();
        assert_eq!(nd[[2, 0]], 3);
        assert_eq!(NpyArray::from_ndarray(&nd), array);
        assert!(array.to_ndarray::<i16>().is_err());

        let decoded = NpyArray::from_bytes(&array.to_npy_bytes().unwrap()).unwrap();
        assert_eq!(decoded, array);
    }

    #[test]
    fn test_open_missing_file() {
        let err = NpyArray::open("/nonexistent/weights.npy").unwrap_err();
        assert!(err.to_string().contains("Cannot open"));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.npy");
        std::fs::write(&path, b"").unwrap();
        let err = NpyArray::open(&path).unwrap_err();
        assert!(err.to_string().contains("Cannot decode"));
    }
}
