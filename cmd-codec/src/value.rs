use core::fmt;

/// A dynamically typed argument, as seen by a host that only knows the
/// format string of a command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value<'a> {
    Char(char),
    Byte(u8),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(&'a str),
}

impl Value<'_> {
    /// The value as a single character, if it is one.
    pub fn as_char(&self) -> Option<char> {
        match *self {
            Self::Char(c) => Some(c),
            Self::Str(s) => {
                let mut chars = s.chars();
                let c = chars.next()?;
                chars.next().is_none().then_some(c)
            }
            _ => None,
        }
    }

    /// The value as an integer, without any lossy conversion.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Self::Byte(v) => Some(v.into()),
            Self::Int(v) => Some(v.into()),
            Self::UInt(v) => Some(v.into()),
            Self::Bool(v) => Some(v.into()),
            _ => None,
        }
    }

    /// The value as a float. Strings are parsed.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Self::Byte(v) => Some(v.into()),
            Self::Int(v) => Some(v as f64),
            Self::UInt(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            Self::Bool(v) => Some(if v { 1.0 } else { 0.0 }),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Char(_) => None,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from {
    ($VARIANT:ident, $INNER:ty, $($TYPE:ty),+) => {
        $(
            impl From<$TYPE> for Value<'_> {
                fn from(value: $TYPE) -> Self {
                    Self::$VARIANT(<$INNER>::from(value))
                }
            }
        )+
    };
}

impl_from!(Int, i64, i8, i16, i32, i64);
impl_from!(UInt, u64, u16, u32, u64);
impl_from!(Float, f64, f32, f64);
impl_from!(Byte, u8, u8);
impl_from!(Bool, bool, bool);
impl_from!(Char, char, char);

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn conversions() {
        assert_eq!(Value::Int(-3), (-3i16).into());
        assert_eq!(Value::UInt(7), 7u32.into());
        assert_eq!(Value::Float(1.5), 1.5f32.into());
        assert_eq!(Value::Str("hi"), "hi".into());
    }

    #[test]
    fn single_char() {
        assert_eq!(Some('x'), Value::Str("x").as_char());
        assert_eq!(None, Value::Str("xy").as_char());
        assert_eq!(None, Value::Str("").as_char());
        assert_eq!(Some('y'), Value::Char('y').as_char());
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Some(1), Value::Bool(true).as_integer());
        assert_eq!(None, Value::Float(1.0).as_integer());
        assert_eq!(Some(2.5), Value::Str(" 2.5 ").as_float());
        assert_eq!(None, Value::Str("nope").as_float());
    }
}
