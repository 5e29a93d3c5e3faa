//! Enumerations and discriminated unions

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// Declare an NDR enumeration
///
/// Generates a `Copy` enum with the listed variants plus `Unknown(u16)`,
/// and implements [`NdrEnum`](crate::NdrEnum), [`NdrEncode`],
/// [`NdrDecode`] and `Default` (the value `0`) for it.
///
/// ```
/// msrpc_ndr::ndr_enum! {
///     pub enum MediaState {
///         Idle = 0,
///         Loaded = 3,
///     }
/// }
///
/// use msrpc_ndr::NdrEnum;
/// assert_eq!(MediaState::from_ndr(3), MediaState::Loaded);
/// assert_eq!(MediaState::from_ndr(9), MediaState::Unknown(9));
/// ```
#[macro_export]
macro_rules! ndr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Value with no named variant; re-encodes unchanged
            Unknown(u16),
        }

        impl $crate::NdrEnum for $name {
            fn to_ndr(&self) -> u16 {
                match self {
                    $( Self::$variant => $value, )+
                    Self::Unknown(value) => *value,
                }
            }

            fn from_ndr(value: u16) -> Self {
                match value {
                    $( v if v == $value => Self::$variant, )+
                    other => Self::Unknown(other),
                }
            }
        }

        impl $crate::NdrEncode for $name {
            fn marshal_ndr(&self, w: &mut $crate::NdrWriter) -> $crate::Result<()> {
                w.write_enum(*self)
            }
        }

        impl $crate::NdrDecode for $name {
            fn unmarshal_ndr(r: &mut $crate::NdrReader) -> $crate::Result<Self> {
                r.read_enum()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                <Self as $crate::NdrEnum>::from_ndr(0)
            }
        }
    };
}

/// Discriminated union body
///
/// A non-encapsulated union takes its discriminant from a sibling field,
/// so the embedding structure writes the switch itself and calls the arm
/// methods directly. [`Encapsulated`] carries the switch in front of the
/// arm.
pub trait NdrUnion: Sized {
    fn ndr_switch_value(&self) -> u32;

    fn marshal_arm(&self, w: &mut NdrWriter) -> Result<()>;

    fn marshal_arm_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    /// Decode the arm selected by `switch`, or fail with
    /// [`NdrError::UnsupportedSwitch`](crate::NdrError::UnsupportedSwitch)
    fn unmarshal_arm(r: &mut NdrReader, switch: u32) -> Result<Self>;

    fn unmarshal_arm_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }
}

/// Union whose 32-bit discriminant travels immediately before the arm
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encapsulated<U>(pub U);

impl<U: NdrUnion> NdrEncode for Encapsulated<U> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_switch(self.0.ndr_switch_value())?;
        self.0.marshal_arm(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.marshal_arm_deferred(w)
    }
}

impl<U: NdrUnion> NdrDecode for Encapsulated<U> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        let switch = r.read_switch()?;
        U::unmarshal_arm(r, switch).map(Self)
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.unmarshal_arm_deferred(r)
    }
}
