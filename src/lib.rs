pub mod attr;
pub mod protocol;
pub mod switch;

pub use attr::{
    AttrError, NativeAttribute, ValueKind, WireAttribute,
    codec::{decode, encode},
    metadata::{AttrRegistry, MetadataLookup},
};
pub use protocol::{ProtocolTransport, Request, Response, ServerHandle};
pub use switch::{SoftSwitch, SwitchApi};
