use bincode::{Decode, Encode};

use crate::attr::{ObjectId, ObjectType, WireAttribute};

#[derive(Debug, Encode, Decode, PartialEq)]
pub enum Response {
    Created {
        oid: ObjectId,
    },
    Removed,
    Ok,
    Attrs {
        attrs: Vec<WireAttribute>,
    },
    ObjectType {
        object_type: ObjectType,
    },
    ObjectId {
        oid: ObjectId,
    },
    Availability {
        count: u64,
    },
    EnumValues {
        values: Vec<i32>,
    },
    Pong,
    Err {
        code: ResponseError,
        description: String,
    },
    ConnectionClosed,
}

/// Outcome categories surfaced to peers. Codec failures map onto the
/// first three; hardware-API failures onto `Switch`.
#[derive(Debug, Encode, Decode, PartialEq, Eq)]
pub enum ResponseError {
    InvalidParameter,
    NotSupported,
    MalformedValue,
    Switch,
    Read,
}
