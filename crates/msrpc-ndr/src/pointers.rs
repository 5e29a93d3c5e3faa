//! NDR pointer types
//!
//! - Reference (`[ref]`): never null, no referent ID, pointee written inline
//! - Unique (`[unique]`): nullable, 4-byte referent ID, referent deferred
//! - Full (`[ptr]`): same wire form as unique; aliasing is not tracked, so
//!   every non-null full pointer carries its own referent
//!
//! Deferred referents are written by the `_deferred` pass of whatever
//! embeds the pointer, after all of the embedding value's inline data.

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Common accessors for pointer wrappers
pub trait NdrPtr {
    type Target;

    fn is_null(&self) -> bool;

    fn get(&self) -> Option<&Self::Target>;

    fn get_mut(&mut self) -> Option<&mut Self::Target>;
}

/// Reference pointer: the pointee is always present and written in place
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> NdrPtr for RefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        Some(&mut self.0)
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.marshal_ndr(w)
    }

    fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.marshal_ndr_deferred(w)
    }
}

impl<T: NdrDecode> NdrDecode for RefPtr<T> {
    fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
        T::unmarshal_ndr(r).map(Self)
    }

    fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.unmarshal_ndr_deferred(r)
    }
}

// Unique and full pointers share one wire form; only the IDL attribute
// differs.
macro_rules! referent_pointer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name<T> {
            value: Option<Box<T>>,
            // referent ID was nonzero and the referent is still unread
            pending: bool,
        }

        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self {
                    value: Some(Box::new(value)),
                    pending: false,
                }
            }

            pub fn null() -> Self {
                Self {
                    value: None,
                    pending: false,
                }
            }

            pub fn as_ref(&self) -> Option<&T> {
                self.value.as_deref()
            }

            pub fn into_inner(self) -> Option<T> {
                self.value.map(|boxed| *boxed)
            }

            pub fn set(&mut self, value: Option<T>) {
                self.value = value.map(Box::new);
            }

            pub fn take(&mut self) -> Option<T> {
                self.value.take().map(|boxed| *boxed)
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::null()
            }
        }

        impl<T> From<Option<T>> for $name<T> {
            fn from(value: Option<T>) -> Self {
                Self {
                    value: value.map(Box::new),
                    pending: false,
                }
            }
        }

        impl<T: PartialEq> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.value == other.value
            }
        }

        impl<T: Eq> Eq for $name<T> {}

        impl<T: fmt::Debug> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.value).finish()
            }
        }

        impl<T> NdrPtr for $name<T> {
            type Target = T;

            fn is_null(&self) -> bool {
                self.value.is_none()
            }

            fn get(&self) -> Option<&T> {
                self.value.as_deref()
            }

            fn get_mut(&mut self) -> Option<&mut T> {
                self.value.as_deref_mut()
            }
        }

        impl<T: NdrEncode> NdrEncode for $name<T> {
            fn marshal_ndr(&self, w: &mut NdrWriter) -> Result<()> {
                w.write_pointer(self.value.is_some()).map(|_| ())
            }

            fn marshal_ndr_deferred(&self, w: &mut NdrWriter) -> Result<()> {
                match &self.value {
                    Some(value) => w.write_referent(value.as_ref()),
                    None => Ok(()),
                }
            }
        }

        impl<T: NdrDecode> NdrDecode for $name<T> {
            fn unmarshal_ndr(r: &mut NdrReader) -> Result<Self> {
                let pending = r.read_pointer()?;
                Ok(Self {
                    value: None,
                    pending,
                })
            }

            fn unmarshal_ndr_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
                if self.pending {
                    self.value = Some(Box::new(r.read_referent()?));
                    self.pending = false;
                }
                Ok(())
            }
        }
    };
}

referent_pointer!(
    /// Unique pointer: nullable, never aliased
    UniquePtr
);

referent_pointer!(
    /// Full pointer: nullable; identical referents are still sent twice
    FullPtr
);
