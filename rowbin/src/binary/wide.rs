//! 256 bit integers.
//!
//! Only what decoding requires: construction from little endian bytes,
//! narrowing conversion and decimal formatting.
use std::fmt;

/// Unsigned 256 bit integer, stored as little endian `u64` limbs.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct U256([u64; 4]);

/// Signed 256 bit integer in two's complement.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct I256(U256);

const TEN_POW_19: u64 = 10_000_000_000_000_000_000;

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);

    pub fn from_le_bytes(bytes: [u8; 32]) -> U256 {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(le);
        }
        U256(limbs)
    }

    pub fn to_le_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, limb) in bytes.chunks_exact_mut(8).zip(self.0) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        bytes
    }

    pub const fn from_u128(value: u128) -> U256 {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }

    /// Returns `None` if the value does not fit in `u128`.
    pub const fn to_u128(self) -> Option<u128> {
        match self.0 {
            [lo, hi, 0, 0] => Some((hi as u128) << 64 | lo as u128),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    fn wrapping_neg(self) -> U256 {
        let mut out = [0u64; 4];
        let mut carry = true;
        for (o, limb) in out.iter_mut().zip(self.0) {
            let (sum, overflow) = (!limb).overflowing_add(carry as u64);
            *o = sum;
            carry = overflow;
        }
        U256(out)
    }

    fn div_rem_u64(self, divisor: u64) -> (U256, u64) {
        let mut out = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = rem << 64 | self.0[i] as u128;
            out[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        (U256(out), rem as u64)
    }
}

impl I256 {
    pub fn from_le_bytes(bytes: [u8; 32]) -> I256 {
        I256(U256::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 32] {
        self.0.to_le_bytes()
    }

    pub const fn from_i128(value: i128) -> I256 {
        let ext = if value < 0 { u64::MAX } else { 0 };
        I256(U256([value as u64, (value >> 64) as u64, ext, ext]))
    }

    /// Returns `None` if the value does not fit in `i128`.
    pub fn to_i128(self) -> Option<i128> {
        let [lo, hi, a, b] = (self.0).0;
        let value = ((hi as u128) << 64 | lo as u128) as i128;
        let ext = if value < 0 { u64::MAX } else { 0 };
        (a == ext && b == ext).then_some(value)
    }

    pub fn is_negative(&self) -> bool {
        (self.0).0[3] >> 63 == 1
    }

    pub fn unsigned_abs(self) -> U256 {
        match self.is_negative() {
            true => self.0.wrapping_neg(),
            false => self.0,
        }
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256::from_u128(value)
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        I256::from_i128(value)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(small) = self.to_u128() {
            return fmt::Display::fmt(&small, f);
        }

        // 19 digits groups, least significant first
        let mut groups = Vec::with_capacity(5);
        let mut rest = *self;
        while !rest.is_zero() {
            let (q, r) = rest.div_rem_u64(TEN_POW_19);
            groups.push(r);
            rest = q;
        }

        let mut out = String::with_capacity(groups.len() * 19);
        let mut iter = groups.iter().rev();
        if let Some(lead) = iter.next() {
            out.push_str(itoa::Buffer::new().format(*lead));
        }
        for group in iter {
            out.push_str(&format!("{group:019}"));
        }
        f.pad_integral(true, "", &out)
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.unsigned_abs().to_string();
        f.pad_integral(!self.is_negative(), "", &abs)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_max() {
        let max = U256::from_le_bytes([0xff; 32]);
        assert_eq!(
            max.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert_eq!(
            I256::from_le_bytes([0xff; 32]).to_string(),
            "-1"
        );
    }

    #[test]
    fn display_min() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x80;
        assert_eq!(
            I256::from_le_bytes(bytes).to_string(),
            "-57896044618658097711785492504343953926634992332820282019728792003956564819968"
        );
    }

    #[test]
    fn narrowing() {
        assert_eq!(I256::from_i128(-42).to_i128(), Some(-42));
        assert_eq!(I256::from_i128(i128::MIN).to_i128(), Some(i128::MIN));
        assert_eq!(U256::from_u128(u128::MAX).to_u128(), Some(u128::MAX));

        let mut bytes = [0u8; 32];
        bytes[16] = 1;
        assert_eq!(I256::from_le_bytes(bytes).to_i128(), None);
        assert_eq!(U256::from_le_bytes(bytes).to_string(), "340282366920938463463374607431768211456");
    }
}
