//! Typed access to single cube elements.
//!
//! Every supported Rust element type knows its on-disk encoding and how to
//! read or write itself in either byte order. Reading with a type other than
//! the stored encoding goes through a complex `f64` intermediate, which is a
//! plain numeric cast (complex to real keeps the real part).

use byteorder::{BigEndian, ByteOrder as EndianIo, LittleEndian};
use num_complex::{Complex, Complex64};

use crate::header::{ByteOrder, ElementEncoding};

/// A value type that can live in an ENVI cube.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    /// Encoding this type reads and writes natively.
    const ENCODING: ElementEncoding;

    /// Read one element from `bytes` (exactly `ENCODING.size()` long).
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Write one element into `bytes` (exactly `ENCODING.size()` long).
    fn encode(self, bytes: &mut [u8], order: ByteOrder);

    /// Widen to a complex double.
    fn to_complex(self) -> Complex64;

    /// Narrow from a complex double.
    fn from_complex(value: Complex64) -> Self;
}

impl Element for u8 {
    const ENCODING: ElementEncoding = ElementEncoding::UInt8;

    fn decode(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0]
    }

    fn encode(self, bytes: &mut [u8], _order: ByteOrder) {
        bytes[0] = self;
    }

    fn to_complex(self) -> Complex64 {
        Complex64::new(f64::from(self), 0.0)
    }

    fn from_complex(value: Complex64) -> Self {
        value.re as u8
    }
}

macro_rules! impl_element {
    ($ty:ty, $encoding:ident, $read:ident, $write:ident) => {
        impl Element for $ty {
            const ENCODING: ElementEncoding = ElementEncoding::$encoding;

            fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                match order {
                    ByteOrder::Little => LittleEndian::$read(bytes),
                    ByteOrder::Big => BigEndian::$read(bytes),
                }
            }

            fn encode(self, bytes: &mut [u8], order: ByteOrder) {
                match order {
                    ByteOrder::Little => LittleEndian::$write(bytes, self),
                    ByteOrder::Big => BigEndian::$write(bytes, self),
                }
            }

            #[allow(trivial_numeric_casts)]
            fn to_complex(self) -> Complex64 {
                Complex64::new(self as f64, 0.0)
            }

            #[allow(trivial_numeric_casts)]
            fn from_complex(value: Complex64) -> Self {
                value.re as $ty
            }
        }
    };
}

impl_element!(i16, Int16, read_i16, write_i16);
impl_element!(i32, Int32, read_i32, write_i32);
impl_element!(f32, Float32, read_f32, write_f32);
impl_element!(f64, Float64, read_f64, write_f64);
impl_element!(u16, UInt16, read_u16, write_u16);
impl_element!(u32, UInt32, read_u32, write_u32);
impl_element!(i64, Int64, read_i64, write_i64);
impl_element!(u64, UInt64, read_u64, write_u64);

impl Element for Complex<f32> {
    const ENCODING: ElementEncoding = ElementEncoding::Complex32;

    fn decode(bytes: &[u8], order: ByteOrder) -> Self {
        Complex::new(f32::decode(&bytes[..4], order), f32::decode(&bytes[4..8], order))
    }

    fn encode(self, bytes: &mut [u8], order: ByteOrder) {
        self.re.encode(&mut bytes[..4], order);
        self.im.encode(&mut bytes[4..8], order);
    }

    fn to_complex(self) -> Complex64 {
        Complex64::new(f64::from(self.re), f64::from(self.im))
    }

    fn from_complex(value: Complex64) -> Self {
        Complex::new(value.re as f32, value.im as f32)
    }
}

impl Element for Complex64 {
    const ENCODING: ElementEncoding = ElementEncoding::Complex64;

    fn decode(bytes: &[u8], order: ByteOrder) -> Self {
        Complex::new(f64::decode(&bytes[..8], order), f64::decode(&bytes[8..16], order))
    }

    fn encode(self, bytes: &mut [u8], order: ByteOrder) {
        self.re.encode(&mut bytes[..8], order);
        self.im.encode(&mut bytes[8..16], order);
    }

    fn to_complex(self) -> Complex64 {
        self
    }

    fn from_complex(value: Complex64) -> Self {
        value
    }
}

/// Read the element stored in `bytes` with `encoding` as a complex double.
fn decode_complex(bytes: &[u8], encoding: ElementEncoding, order: ByteOrder) -> Complex64 {
    match encoding {
        ElementEncoding::UInt8 => u8::decode(bytes, order).to_complex(),
        ElementEncoding::Int16 => i16::decode(bytes, order).to_complex(),
        ElementEncoding::Int32 => i32::decode(bytes, order).to_complex(),
        ElementEncoding::Float32 => f32::decode(bytes, order).to_complex(),
        ElementEncoding::Float64 => f64::decode(bytes, order).to_complex(),
        ElementEncoding::Complex32 => Complex::<f32>::decode(bytes, order).to_complex(),
        ElementEncoding::Complex64 => Complex64::decode(bytes, order),
        ElementEncoding::UInt16 => u16::decode(bytes, order).to_complex(),
        ElementEncoding::UInt32 => u32::decode(bytes, order).to_complex(),
        ElementEncoding::Int64 => i64::decode(bytes, order).to_complex(),
        ElementEncoding::UInt64 => u64::decode(bytes, order).to_complex(),
    }
}

/// Write a complex double into `bytes` using `encoding`.
fn encode_complex(value: Complex64, bytes: &mut [u8], encoding: ElementEncoding, order: ByteOrder) {
    match encoding {
        ElementEncoding::UInt8 => u8::from_complex(value).encode(bytes, order),
        ElementEncoding::Int16 => i16::from_complex(value).encode(bytes, order),
        ElementEncoding::Int32 => i32::from_complex(value).encode(bytes, order),
        ElementEncoding::Float32 => f32::from_complex(value).encode(bytes, order),
        ElementEncoding::Float64 => f64::from_complex(value).encode(bytes, order),
        ElementEncoding::Complex32 => Complex::<f32>::from_complex(value).encode(bytes, order),
        ElementEncoding::Complex64 => value.encode(bytes, order),
        ElementEncoding::UInt16 => u16::from_complex(value).encode(bytes, order),
        ElementEncoding::UInt32 => u32::from_complex(value).encode(bytes, order),
        ElementEncoding::Int64 => i64::from_complex(value).encode(bytes, order),
        ElementEncoding::UInt64 => u64::from_complex(value).encode(bytes, order),
    }
}

/// Read an element stored as `encoding` into `T`.
pub(crate) fn read_as<T: Element>(bytes: &[u8], encoding: ElementEncoding, order: ByteOrder) -> T {
    if encoding == T::ENCODING {
        T::decode(bytes, order)
    } else {
        T::from_complex(decode_complex(bytes, encoding, order))
    }
}

/// Write `value` into an element stored as `encoding`.
pub(crate) fn write_as<T: Element>(value: T, bytes: &mut [u8], encoding: ElementEncoding, order: ByteOrder) {
    if encoding == T::ENCODING {
        value.encode(bytes, order);
    } else {
        encode_complex(value.to_complex(), bytes, encoding, order);
    }
}

/// Re-encode a whole buffer, producing host byte order.
pub(crate) fn convert_buffer(
    source: &[u8],
    from: ElementEncoding,
    order: ByteOrder,
    to: ElementEncoding,
) -> Vec<u8> {
    let count = source.len() / from.size();
    let mut out = vec![0u8; count * to.size()];
    let host = ByteOrder::host();
    for (src, dst) in source
        .chunks_exact(from.size())
        .zip(out.chunks_exact_mut(to.size()))
    {
        encode_complex(decode_complex(src, from, order), dst, to, host);
    }
    out
}
