use bytes::BufMut;

/// LEB128 and length prefixed string operation in [`BufMut`].
///
/// This is the inverse of [`read_var_uint`][1] and [`read_var_string`][2],
/// mostly useful to build row-binary payloads by hand.
///
/// [1]: crate::binary::read::read_var_uint
/// [2]: crate::binary::read::read_var_string
pub trait BufMutExt {
    /// Write unsigned LEB128 integer.
    fn put_var_uint(&mut self, value: u64);

    /// Write LEB128 length followed by the string bytes.
    fn put_var_string(&mut self, string: &str);
}

/// Helper trait to [`Display`][std::fmt::Display] bytes.
pub trait FmtExt {
    /// Lossy [`Display`][std::fmt::Display] bytes.
    fn lossy(&self) -> LossyFmt<'_>;
}

/// Lossy [`Display`][std::fmt::Display] implementation for bytes.
pub struct LossyFmt<'a>(pub &'a [u8]);

impl<B: BufMut> BufMutExt for B {
    fn put_var_uint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.put_u8(byte);
                break;
            }
            self.put_u8(byte | 0x80);
        }
    }

    fn put_var_string(&mut self, string: &str) {
        self.put_var_uint(string.len() as u64);
        self.put(string.as_bytes());
    }
}

impl FmtExt for [u8] {
    fn lossy(&self) -> LossyFmt<'_> {
        LossyFmt(self)
    }
}

impl std::fmt::Display for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{self}\"")
    }
}
