//! Byte primitives.
//!
//! Fixed width readers are pure functions of `(buffer, offset, width)`, little
//! endian, and expect the caller to have checked that `offset + width` bytes
//! are available. Variable width readers check bounds themselves and return
//! [`None`] when the buffer ends before the value does.
use bytes::{Buf, Bytes};

use super::wide::{I256, U256};
use crate::common::ByteStr;

/// Read unsigned integer of `width` 1, 2 or 4 bytes.
pub fn read_unsigned_int(buf: &[u8], offset: usize, width: usize) -> u32 {
    debug_assert!(matches!(width, 1 | 2 | 4));
    (&buf[offset..]).get_uint_le(width) as u32
}

/// Read two's complement signed integer of `width` 1, 2 or 4 bytes.
pub fn read_signed_int(buf: &[u8], offset: usize, width: usize) -> i32 {
    debug_assert!(matches!(width, 1 | 2 | 4));
    (&buf[offset..]).get_int_le(width) as i32
}

/// Read unsigned integer of `width` 8, 16 or 32 bytes.
pub fn read_unsigned_big_int(buf: &[u8], offset: usize, width: usize) -> U256 {
    debug_assert!(matches!(width, 8 | 16 | 32));
    let mut le = [0u8; 32];
    le[..width].copy_from_slice(&buf[offset..offset + width]);
    U256::from_le_bytes(le)
}

/// Read two's complement signed integer of `width` 8, 16 or 32 bytes.
pub fn read_signed_big_int(buf: &[u8], offset: usize, width: usize) -> I256 {
    debug_assert!(matches!(width, 8 | 16 | 32));
    let value = &buf[offset..offset + width];
    let mut le = match value[width - 1] & 0x80 {
        0 => [0u8; 32],
        _ => [0xffu8; 32],
    };
    le[..width].copy_from_slice(value);
    I256::from_le_bytes(le)
}

pub fn read_float32(buf: &[u8], offset: usize) -> f32 {
    (&buf[offset..]).get_f32_le()
}

pub fn read_float64(buf: &[u8], offset: usize) -> f64 {
    (&buf[offset..]).get_f64_le()
}

/// Read unsigned LEB128 integer.
///
/// Returns the value and the offset right after it, or [`None`] if the last
/// byte in `buf` still has the continuation bit set.
pub fn read_var_uint(buf: &[u8], mut offset: usize) -> Option<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *buf.get(offset)?;
        offset += 1;
        if shift < u64::BITS {
            result |= ((byte & 0x7f) as u64) << shift;
        }
        shift += 7;
        if byte & 0x80 == 0 {
            return Some((result, offset));
        }
    }
}

/// Read signed LEB128 integer.
///
/// The result is sign extended when bit `0x40` of the terminal byte is set
/// and fewer than 64 bits were consumed.
pub fn read_var_int(buf: &[u8], mut offset: usize) -> Option<(i64, usize)> {
    let mut result = 0i64;
    let mut shift = 0u32;
    loop {
        let byte = *buf.get(offset)?;
        offset += 1;
        if shift < i64::BITS {
            result |= ((byte & 0x7f) as i64) << shift;
        }
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < i64::BITS && byte & 0x40 != 0 {
                result |= !0i64 << shift;
            }
            return Some((result, offset));
        }
    }
}

/// Read LEB128 length followed by that many bytes, reinterpreted as utf8.
///
/// Invalid utf8 is replaced lossily. The returned string shares memory with `buf`.
pub fn read_var_string(buf: &Bytes, offset: usize) -> Option<(ByteStr, usize)> {
    let (start, end) = var_bytes_range(buf, offset)?;
    Some((ByteStr::from_utf8_lossy(buf.slice(start..end)), end))
}

/// Returns the `(start, end)` byte range of a length prefixed value.
pub(crate) fn var_bytes_range(buf: &[u8], offset: usize) -> Option<(usize, usize)> {
    let (len, start) = read_var_uint(buf, offset)?;
    let end = start.checked_add(usize::try_from(len).ok()?)?;
    (end <= buf.len()).then_some((start, end))
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;

    use super::*;
    use crate::ext::BufMutExt;

    #[test]
    fn fixed_width_fixtures() {
        let max = [0xff, 0xff, 0xff, 0xff];
        assert_eq!(read_unsigned_int(&max, 0, 4), 4294967295);
        assert_eq!(read_signed_int(&max, 0, 4), -1);

        let sign = [0x00, 0x00, 0x00, 0x80];
        assert_eq!(read_unsigned_int(&sign, 0, 4), 2147483648);
        assert_eq!(read_signed_int(&sign, 0, 4), -2147483648);

        assert_eq!(read_unsigned_int(&[0x01, 0xff, 0x7f], 1, 2), 0x7fff);
        assert_eq!(read_signed_int(&[0x80], 0, 1), -128);
        assert_eq!(read_unsigned_int(&[0x80], 0, 1), 128);
    }

    #[test]
    fn big_int_fixtures() {
        let bytes = [0xff; 16];
        assert_eq!(read_unsigned_big_int(&bytes, 0, 8).to_u128(), Some(u64::MAX as u128));
        assert_eq!(read_signed_big_int(&bytes, 0, 8).to_i128(), Some(-1));
        assert_eq!(read_unsigned_big_int(&bytes, 0, 16).to_u128(), Some(u128::MAX));
        assert_eq!(read_signed_big_int(&bytes, 0, 16).to_i128(), Some(-1));

        let mut bytes = [0u8; 9];
        bytes[1] = 0x2a;
        assert_eq!(read_signed_big_int(&bytes, 1, 8).to_i128(), Some(42));
    }

    #[test]
    fn floats() {
        assert_eq!(read_float32(&1.5f32.to_le_bytes(), 0), 1.5);
        assert_eq!(read_float64(&(-0.25f64).to_le_bytes(), 0), -0.25);
    }

    #[test]
    fn var_uint_incomplete() {
        assert_eq!(read_var_uint(&[], 0), None);
        assert_eq!(read_var_uint(&[0x80], 0), None);
        assert_eq!(read_var_uint(&[0x80, 0x80], 0), None);
        assert_eq!(read_var_uint(&[0xac, 0x02], 0), Some((300, 2)));
        assert_eq!(read_var_uint(&[0x00, 0x40], 1), Some((64, 2)));
    }

    #[test]
    fn var_int_sign_extension() {
        assert_eq!(read_var_int(&[0x7f], 0), Some((-1, 1)));
        assert_eq!(read_var_int(&[0x40], 0), Some((-64, 1)));
        assert_eq!(read_var_int(&[0x3f], 0), Some((63, 1)));
        assert_eq!(read_var_int(&[0xc0, 0x00], 0), Some((64, 2)));
        assert_eq!(read_var_int(&[0xc0], 0), None);
    }

    #[test]
    fn var_string_hello() {
        let mut buf = BytesMut::new();
        buf.put_var_string("Hello, world!");
        assert_eq!(&buf[..], b"\x0dHello, world!");

        let buf = buf.freeze();
        let (s, end) = read_var_string(&buf, 0).unwrap();
        assert_eq!(s, "Hello, world!");
        assert_eq!(end, 14);

        // non minimal, 6 bytes length prefix
        let mut padded = b"\x8d\x80\x80\x80\x80\x00".to_vec();
        padded.extend_from_slice(b"Hello, world!");
        let padded = Bytes::from(padded);
        let (s, end) = read_var_string(&padded, 0).unwrap();
        assert_eq!(s, "Hello, world!");
        assert_eq!(end, padded.len());
    }

    #[test]
    fn var_string_incomplete() {
        let buf = Bytes::from_static(b"\x05abc");
        assert!(read_var_string(&buf, 0).is_none());
        let buf = Bytes::from_static(b"\x85");
        assert!(read_var_string(&buf, 0).is_none());

        let buf = Bytes::from_static(b"\x02\xc3\xa9");
        assert_eq!(read_var_string(&buf, 0).unwrap().0, "é");
    }

    #[test]
    fn var_string_lossy() {
        let buf = Bytes::from_static(b"\x02a\xff");
        assert_eq!(read_var_string(&buf, 0).unwrap().0, "a\u{fffd}");
    }
}
