use bincode::{Decode, Encode};

use crate::attr::{AttrId, ObjectId, ObjectType, WireAttribute};

/// One method call from a peer. The object-management methods carry
/// attributes in wire form; the server converts them before touching the
/// hardware API.
#[derive(Debug, Encode, Decode, PartialEq)]
pub enum Request {
    Create {
        object_type: ObjectType,
        attrs: Vec<WireAttribute>,
    },
    Remove {
        object_type: ObjectType,
        oid: ObjectId,
    },
    Set {
        object_type: ObjectType,
        oid: ObjectId,
        attr: WireAttribute,
    },
    Get {
        object_type: ObjectType,
        oid: ObjectId,
        attr_ids: Vec<AttrId>,
    },
    ObjectTypeQuery {
        oid: ObjectId,
    },
    SwitchIdQuery {
        oid: ObjectId,
    },
    /// Remaining capacity for a type, narrowed by the given attributes.
    AvailabilityQuery {
        object_type: ObjectType,
        attrs: Vec<WireAttribute>,
    },
    /// Enum values the device accepts for an attribute.
    EnumValuesQuery {
        object_type: ObjectType,
        attr_id: AttrId,
    },
    Ping,
    CloseConnection,
}
