//! Wire tags for every level of the tree and patch grammars.
//!
//! Each tag is a little-endian `u32` on the wire. `from_u32` is the only way
//! to turn a raw tag into one of these enums, so an unknown value can never
//! reach a `match`.

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            pub fn from_u32(v: u32) -> Option<Self> {
                match v {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            #[inline]
            pub fn as_u32(self) -> u32 {
                self as u32
            }
        }
    };
}

wire_enum! {
    /// Top-level node selector.
    pub enum NodeTag {
        Single = 0,
        List = 1,
    }
}

wire_enum! {
    /// Single node selector.
    pub enum SingleTag {
        Text = 0,
        Element = 1,
    }
}

wire_enum! {
    /// Attribute edit inside a common patch.
    pub enum AttributeEditTag {
        Remove = 0,
        Insert = 1,
    }
}

wire_enum! {
    /// Node-level patch selector.
    pub enum PatchNodeTag {
        Replace = 0,
        Single = 1,
        List = 2,
    }
}

wire_enum! {
    /// Single-level patch selector.
    pub enum PatchSingleTag {
        Replace = 0,
        Element = 1,
    }
}

wire_enum! {
    /// List patch mode.
    pub enum PatchListTag {
        All = 0,
        Entries = 1,
        Truncate = 2,
    }
}

wire_enum! {
    /// Per-slot operation of an `All` list patch.
    pub enum ListOpTag {
        Nop = 0,
        Modify = 1,
        From = 2,
        FromModify = 3,
        New = 4,
    }
}

wire_enum! {
    /// Element tag. Both tags live in the XHTML namespace.
    #[derive(serde::Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Tag {
        Div = 0,
        Span = 1,
    }
}

wire_enum! {
    /// Attribute kind, also the canonical sort key of an attribute list.
    #[derive(serde::Serialize)]
    pub enum AttributeKind {
        Id = 0,
        OnClick = 1,
        OnPointerMove = 2,
    }
}

wire_enum! {
    /// Kind of an outbound event record.
    #[derive(serde::Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EventKind {
        Click = 0,
        PointerMove = 1,
    }
}

/// Element-level patch tag for a full replacement. Any other value `n`
/// means "patch in place, expecting element tag `n - 1`".
pub const PATCH_ELEMENT_REPLACE: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u32_roundtrips_known_values() {
        for tag in [ListOpTag::Nop, ListOpTag::Modify, ListOpTag::From, ListOpTag::FromModify, ListOpTag::New] {
            assert_eq!(ListOpTag::from_u32(tag.as_u32()), Some(tag));
        }
        assert_eq!(PatchListTag::from_u32(2), Some(PatchListTag::Truncate));
    }

    #[test]
    fn from_u32_rejects_unknown_values() {
        assert_eq!(NodeTag::from_u32(2), None);
        assert_eq!(SingleTag::from_u32(u32::MAX), None);
        assert_eq!(ListOpTag::from_u32(5), None);
    }
}
