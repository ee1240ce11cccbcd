//! Sequential little-endian field reader.

use crate::{DecodeError, DecodeResult};

/// Cursor over a datagram that yields fields in wire order.
///
/// Callers check the layout length up front; the bounds checks here only keep
/// the decoder panic-free.
pub(crate) struct PacketReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PacketReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    fn take<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let short = DecodeError::ShortBuffer {
            got: self.data.len(),
            want: self.offset.saturating_add(N),
        };
        let end = self.offset.checked_add(N).ok_or(short)?;
        let bytes: [u8; N] = self
            .data
            .get(self.offset..end)
            .and_then(|chunk| chunk.try_into().ok())
            .ok_or(short)?;
        self.offset = end;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self) -> DecodeResult<u8> {
        self.take::<1>().map(|[byte]| byte)
    }

    /// Non-zero byte is `true`.
    pub(crate) fn bool(&mut self) -> DecodeResult<bool> {
        self.u8().map(|byte| byte != 0)
    }

    pub(crate) fn u64(&mut self) -> DecodeResult<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    pub(crate) fn f32(&mut self) -> DecodeResult<f32> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    pub(crate) fn f64(&mut self) -> DecodeResult<f64> {
        self.take::<8>().map(f64::from_le_bytes)
    }

    pub(crate) fn f32_array<const N: usize>(&mut self) -> DecodeResult<[f32; N]> {
        let mut out = [0.0f32; N];
        for slot in &mut out {
            *slot = self.f32()?;
        }
        Ok(out)
    }
}
