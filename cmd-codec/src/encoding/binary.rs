use fill_array::fill;

use crate::{error, BinArg};

macro_rules! impl_number {
    ($TYPE:ty, $SIZE:expr) => {
        impl BinArg for $TYPE {
            const SIZE: usize = $SIZE;

            fn encode_bin<'a>(
                &self,
                dst: impl IntoIterator<Item = &'a mut u8>,
            ) -> Result<(), error::EndOfInput> {
                let mut dst = dst.into_iter();

                for byte in self.to_le_bytes() {
                    *dst.next().ok_or(error::EndOfInput)? = byte;
                }

                Ok(())
            }

            fn decode_bin<'a>(src: impl IntoIterator<Item = &'a u8>) -> Result<Self, error::Error> {
                let mut src = src.into_iter();

                // all byte patterns are valid numbers
                let bytes = fill![*src.next().ok_or(error::EndOfInput)?; $SIZE];

                Ok(Self::from_le_bytes(bytes))
            }
        }
    };
}

// NOTE: a wrong size here is a compile-time error in `from_le_bytes`
impl_number!(u8, 1);
impl_number!(u16, 2);
impl_number!(u32, 4);
impl_number!(u64, 8);
impl_number!(i8, 1);
impl_number!(i16, 2);
impl_number!(i32, 4);
impl_number!(i64, 8);
impl_number!(f32, 4);
impl_number!(f64, 8);

impl BinArg for bool {
    const SIZE: usize = 1;

    fn encode_bin<'a>(
        &self,
        dst: impl IntoIterator<Item = &'a mut u8>,
    ) -> Result<(), error::EndOfInput> {
        let mut dst = dst.into_iter();

        *dst.next().ok_or(error::EndOfInput)? = u8::from(*self);

        Ok(())
    }

    fn decode_bin<'a>(src: impl IntoIterator<Item = &'a u8>) -> Result<Self, error::Error> {
        let mut src = src.into_iter();

        match *src.next().ok_or(error::EndOfInput)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(error::Invalid)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{error, BinArg};

    macro_rules! iter_test {
        ($TYPE:ty) => {
            let mut buf = [0; 8];

            // introduce some basic value differences
            let test_num = <$TYPE>::MAX / (0xa as $TYPE);

            test_num.encode_bin(buf.iter_mut()).unwrap();
            let read_num = <$TYPE>::decode_bin(buf.iter()).unwrap();

            assert_eq!(test_num, read_num);
        };
    }

    #[test]
    fn numbers() {
        iter_test!(u8);
        iter_test!(u16);
        iter_test!(u32);
        iter_test!(u64);
        iter_test!(i8);
        iter_test!(i16);
        iter_test!(i32);
        iter_test!(i64);
        iter_test!(f32);
        iter_test!(f64);
    }

    #[test]
    fn little_endian() {
        let mut buf = [0; 4];

        0x0a0b0c0di32.encode_bin(buf.iter_mut()).unwrap();

        assert_eq!([0x0d, 0x0c, 0x0b, 0x0a], buf);

        let mut buf = [0; 8];

        1.5f64.encode_bin(buf.iter_mut()).unwrap();

        assert_eq!(1.5f64.to_le_bytes(), buf);
    }

    #[test]
    fn bool() {
        let mut buf = [0; 1];

        for val in [false, true] {
            val.encode_bin(buf.iter_mut()).unwrap();

            assert_eq!(val, bool::decode_bin(buf.iter()).unwrap());
        }

        for num in 2..=u8::MAX {
            num.encode_bin(buf.iter_mut()).unwrap();

            match bool::decode_bin(buf.iter()) {
                Err(error::Error::Invalid) => {}
                _ => panic!(),
            }
        }
    }

    #[test]
    fn short_destination() {
        let mut buf = [0; 3];

        assert_eq!(
            Err(error::EndOfInput),
            0xdeadbeefu32.encode_bin(buf.iter_mut())
        );
    }

    #[test]
    fn field_width() {
        assert_eq!(Ok(-2i16), i16::from_field(&[0xfe, 0xff]));

        assert_eq!(
            Err(error::Error::Length {
                expected: 2,
                found: 3
            }),
            i16::from_field(&[0xfe, 0xff, 0x00])
        );

        assert_eq!(
            Err(error::Error::Length {
                expected: 8,
                found: 4
            }),
            f64::from_field(&[0; 4])
        );
    }
}
