// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Borrowed tensor views over arena memory, plus a small owned tensor used
//! by tests, benches and the CLI to stage data outside an arena.

use bytemuck::{Pod, Zeroable};

use crate::{DType, QuantParams, Shape, TensorError};

/// 16-byte aligned storage unit; keeps every typed cast over an owned
/// buffer valid.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C, align(16))]
struct Block([u8; 16]);

/// Casts a byte slice to `T`, mapping cast failures onto [`TensorError`].
fn cast<T: Pod>(dtype: DType, bytes: &[u8]) -> Result<&[T], TensorError> {
    bytemuck::try_cast_slice(bytes).map_err(|_| TensorError::Misaligned {
        dtype,
        len: bytes.len(),
    })
}

fn cast_mut<T: Pod>(dtype: DType, bytes: &mut [u8]) -> Result<&mut [T], TensorError> {
    let len = bytes.len();
    bytemuck::try_cast_slice_mut(bytes).map_err(|_| TensorError::Misaligned { dtype, len })
}

fn check_len(shape: &Shape, dtype: DType, actual: usize) -> Result<(), TensorError> {
    let expected = shape.size_bytes(dtype);
    if actual != expected {
        return Err(TensorError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

fn expect_dtype(op: &'static str, want: DType, have: DType) -> Result<(), TensorError> {
    if want != have {
        return Err(TensorError::UnsupportedDType { op, dtype: have });
    }
    Ok(())
}

/// A borrowed, read-only tensor: element type, shape, optional quantization
/// parameters and the bytes backing it.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    dtype: DType,
    quant: Option<QuantParams>,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Wraps `data`, checking its length against `shape` and `dtype`.
    pub fn new(shape: &'a Shape, dtype: DType, data: &'a [u8]) -> Result<Self, TensorError> {
        check_len(shape, dtype, data.len())?;
        Ok(Self {
            shape,
            dtype,
            quant: None,
            data,
        })
    }

    /// Attaches quantization parameters.
    pub fn with_quant(mut self, quant: Option<QuantParams>) -> Self {
        self.quant = quant;
        self
    }

    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    pub fn as_f32(&self) -> Result<&'a [f32], TensorError> {
        expect_dtype("as_f32", DType::F32, self.dtype)?;
        cast(self.dtype, self.data)
    }

    pub fn as_i16(&self) -> Result<&'a [i16], TensorError> {
        expect_dtype("as_i16", DType::I16, self.dtype)?;
        cast(self.dtype, self.data)
    }

    pub fn as_i8(&self) -> Result<&'a [i8], TensorError> {
        expect_dtype("as_i8", DType::I8, self.dtype)?;
        cast(self.dtype, self.data)
    }

    pub fn as_u8(&self) -> Result<&'a [u8], TensorError> {
        expect_dtype("as_u8", DType::U8, self.dtype)?;
        Ok(self.data)
    }
}

/// A borrowed, writable tensor.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    shape: &'a Shape,
    dtype: DType,
    quant: Option<QuantParams>,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Wraps `data`, checking its length against `shape` and `dtype`.
    pub fn new(shape: &'a Shape, dtype: DType, data: &'a mut [u8]) -> Result<Self, TensorError> {
        check_len(shape, dtype, data.len())?;
        Ok(Self {
            shape,
            dtype,
            quant: None,
            data,
        })
    }

    pub fn with_quant(mut self, quant: Option<QuantParams>) -> Self {
        self.quant = quant;
        self
    }

    pub fn shape(&self) -> &Shape {
        self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Read-only reborrow.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape,
            dtype: self.dtype,
            quant: self.quant,
            data: &*self.data,
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn as_f32_mut(&mut self) -> Result<&mut [f32], TensorError> {
        expect_dtype("as_f32_mut", DType::F32, self.dtype)?;
        cast_mut(self.dtype, &mut *self.data)
    }

    pub fn as_i16_mut(&mut self) -> Result<&mut [i16], TensorError> {
        expect_dtype("as_i16_mut", DType::I16, self.dtype)?;
        cast_mut(self.dtype, &mut *self.data)
    }

    pub fn as_i8_mut(&mut self) -> Result<&mut [i8], TensorError> {
        expect_dtype("as_i8_mut", DType::I8, self.dtype)?;
        cast_mut(self.dtype, &mut *self.data)
    }

    pub fn as_u8_mut(&mut self) -> Result<&mut [u8], TensorError> {
        expect_dtype("as_u8_mut", DType::U8, self.dtype)?;
        Ok(&mut *self.data)
    }
}

/// An owned tensor with 16-byte aligned storage.
///
/// Inference itself never uses this type: at runtime every tensor lives in
/// the arena and is reached through [`TensorView`] / [`TensorViewMut`].
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    quant: Option<QuantParams>,
    blocks: Vec<Block>,
    len: usize,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{DType, Shape, Tensor};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::I16);
    /// assert_eq!(t.size_bytes(), 12);
    /// ```
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let len = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            quant: None,
            blocks: vec![Block::zeroed(); len.div_ceil(16)],
            len,
        }
    }

    /// Creates a tensor from raw bytes.
    pub fn from_bytes(shape: Shape, dtype: DType, data: &[u8]) -> Result<Self, TensorError> {
        check_len(&shape, dtype, data.len())?;
        let mut t = Self::zeros(shape, dtype);
        t.as_bytes_mut().copy_from_slice(data);
        Ok(t)
    }

    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::F32, bytemuck::cast_slice(values))
    }

    pub fn from_i16(shape: Shape, values: &[i16]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::I16, bytemuck::cast_slice(values))
    }

    pub fn from_i8(shape: Shape, values: &[i8]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::I8, bytemuck::cast_slice(values))
    }

    pub fn from_u8(shape: Shape, values: &[u8]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::U8, values)
    }

    /// Attaches quantization parameters.
    pub fn with_quant(mut self, quant: QuantParams) -> Self {
        self.quant = Some(quant);
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    pub fn size_bytes(&self) -> usize {
        self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len]
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            dtype: self.dtype,
            quant: self.quant,
            data: &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.len],
        }
    }

    /// Returns a writable view over this tensor's data.
    pub fn view_mut(&mut self) -> TensorViewMut<'_> {
        TensorViewMut {
            shape: &self.shape,
            dtype: self.dtype,
            quant: self.quant,
            data: &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len],
        }
    }
}
