//! Attribute value conversion between wire and native form.
//!
//! [`decode`] turns a wire attribute into the fixed-layout native form the
//! hardware API consumes; [`encode`] is its mirror. Both resolve the value
//! kind through the metadata table before touching the payload, so nothing
//! is allocated for an attribute the table does not know, and a payload
//! whose shape disagrees with the table is rejected outright.
//!
//! List kinds allocate one [`OwnedList`] per list field on decode; encode
//! takes the native attribute by value and consumes those buffers, which
//! is the single release point balancing the allocation.
use log::error;

use super::{
    AttrError, AttrId, CHARDATA_LEN, NativeAclAction, NativeAclCapability, NativeAclField,
    NativeAttribute, NativeValue, ObjectType, ValueKind, WireAclAction, WireAclCapability,
    WireAclField, WireAttribute, WireList, WireValue,
    buffer::OwnedList,
    metadata::MetadataLookup,
    primitive,
};

/// Converts a wire attribute into native form.
///
/// Fails with [`AttrError::UnknownAttribute`] before anything is allocated
/// when the metadata table has no entry for the pair, and with
/// [`AttrError::ValueShapeMismatch`] when the payload variant disagrees
/// with the resolved kind. On any error no native value is produced.
pub fn decode<M: MetadataLookup>(
    metadata: &M,
    object_type: ObjectType,
    wire: &WireAttribute,
) -> Result<NativeAttribute, AttrError> {
    let kind = resolve(metadata, object_type, wire.id)?;

    let value = match (kind, &wire.value) {
        (ValueKind::Bool, WireValue::Bool(v)) => NativeValue::Bool(*v),
        (ValueKind::CharData, WireValue::CharData(s)) => NativeValue::CharData(pack_chardata(s)),
        (ValueKind::U8, WireValue::U8(v)) => NativeValue::U8(*v),
        (ValueKind::S8, WireValue::S8(v)) => NativeValue::S8(*v),
        (ValueKind::U16, WireValue::U16(v)) => NativeValue::U16(*v),
        (ValueKind::S16, WireValue::S16(v)) => NativeValue::S16(*v),
        (ValueKind::U32, WireValue::U32(v)) => NativeValue::U32(*v),
        (ValueKind::S32, WireValue::S32(v)) => NativeValue::S32(*v),
        (ValueKind::U64, WireValue::U64(v)) => NativeValue::U64(*v),
        (ValueKind::S64, WireValue::S64(v)) => NativeValue::S64(*v),
        (ValueKind::Mac, WireValue::Mac(s)) => NativeValue::Mac(primitive::parse_mac(s)?),
        (ValueKind::Ipv4, WireValue::Ipv4(s)) => NativeValue::Ipv4(primitive::parse_ipv4(s)),
        (ValueKind::Ipv6, WireValue::Ipv6(s)) => NativeValue::Ipv6(primitive::parse_ipv6(s)),
        (ValueKind::IpAddress, WireValue::IpAddress(addr)) => {
            NativeValue::IpAddress(primitive::parse_ip_address(addr))
        }
        (ValueKind::IpPrefix, WireValue::IpPrefix(prefix)) => {
            NativeValue::IpPrefix(primitive::parse_ip_prefix(prefix))
        }
        (ValueKind::ObjectId, WireValue::ObjectId(oid)) => NativeValue::ObjectId(*oid),
        (ValueKind::ObjectList, WireValue::ObjectList(list)) => {
            NativeValue::ObjectList(copy_list(wire.id, list)?)
        }
        (ValueKind::U8List, WireValue::U8List(list)) => {
            NativeValue::U8List(copy_list(wire.id, list)?)
        }
        (ValueKind::S8List, WireValue::S8List(list)) => {
            NativeValue::S8List(copy_list(wire.id, list)?)
        }
        (ValueKind::U16List, WireValue::U16List(list)) => {
            NativeValue::U16List(copy_list(wire.id, list)?)
        }
        (ValueKind::S16List, WireValue::S16List(list)) => {
            NativeValue::S16List(copy_list(wire.id, list)?)
        }
        (ValueKind::U32List, WireValue::U32List(list)) => {
            NativeValue::U32List(copy_list(wire.id, list)?)
        }
        (ValueKind::S32List, WireValue::S32List(list)) => {
            NativeValue::S32List(copy_list(wire.id, list)?)
        }
        (ValueKind::U32Range, WireValue::U32Range(range)) => NativeValue::U32Range(*range),
        (ValueKind::S32Range, WireValue::S32Range(range)) => NativeValue::S32Range(*range),
        (ValueKind::U16RangeList, WireValue::U16RangeList(list)) => {
            NativeValue::U16RangeList(copy_list(wire.id, list)?)
        }
        (ValueKind::AclFieldBool, WireValue::AclField(WireAclField::Bool { enable, data })) => {
            NativeValue::AclField(NativeAclField::Bool {
                enable: *enable,
                data: *data,
            })
        }
        (ValueKind::AclFieldU8, WireValue::AclField(WireAclField::U8 { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::U8 {
                enable: *enable,
                data: *data,
                mask: *mask,
            })
        }
        (ValueKind::AclFieldS8, WireValue::AclField(WireAclField::S8 { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::S8 {
                enable: *enable,
                data: *data,
                mask: *mask,
            })
        }
        (ValueKind::AclFieldU16, WireValue::AclField(WireAclField::U16 { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::U16 {
                enable: *enable,
                data: *data,
                mask: *mask,
            })
        }
        (ValueKind::AclFieldS16, WireValue::AclField(WireAclField::S16 { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::S16 {
                enable: *enable,
                data: *data,
                mask: *mask,
            })
        }
        (ValueKind::AclFieldU32, WireValue::AclField(WireAclField::U32 { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::U32 {
                enable: *enable,
                data: *data,
                mask: *mask,
            })
        }
        (ValueKind::AclFieldS32, WireValue::AclField(WireAclField::S32 { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::S32 {
                enable: *enable,
                data: *data,
                mask: *mask,
            })
        }
        (ValueKind::AclFieldMac, WireValue::AclField(WireAclField::Mac { enable, data, mask })) => {
            NativeValue::AclField(NativeAclField::Mac {
                enable: *enable,
                data: primitive::parse_mac(data)?,
                mask: primitive::parse_mac(mask)?,
            })
        }
        (
            ValueKind::AclFieldIpv4,
            WireValue::AclField(WireAclField::Ipv4 { enable, data, mask }),
        ) => NativeValue::AclField(NativeAclField::Ipv4 {
            enable: *enable,
            data: primitive::parse_ipv4(data),
            mask: primitive::parse_ipv4(mask),
        }),
        (
            ValueKind::AclFieldIpv6,
            WireValue::AclField(WireAclField::Ipv6 { enable, data, mask }),
        ) => NativeValue::AclField(NativeAclField::Ipv6 {
            enable: *enable,
            data: primitive::parse_ipv6(data),
            mask: primitive::parse_ipv6(mask),
        }),
        (
            ValueKind::AclFieldObjectId,
            WireValue::AclField(WireAclField::ObjectId { enable, data }),
        ) => NativeValue::AclField(NativeAclField::ObjectId {
            enable: *enable,
            data: *data,
        }),
        (
            ValueKind::AclFieldObjectList,
            WireValue::AclField(WireAclField::ObjectList { enable, data }),
        ) => NativeValue::AclField(NativeAclField::ObjectList {
            enable: *enable,
            data: copy_list(wire.id, data)?,
        }),
        (
            ValueKind::AclFieldU8List,
            WireValue::AclField(WireAclField::U8List { enable, data, mask }),
        ) => NativeValue::AclField(NativeAclField::U8List {
            enable: *enable,
            data: copy_list(wire.id, data)?,
            mask: copy_list(wire.id, mask)?,
        }),
        (
            ValueKind::AclActionBool,
            WireValue::AclAction(WireAclAction::Bool { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::Bool {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionU8,
            WireValue::AclAction(WireAclAction::U8 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::U8 {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionS8,
            WireValue::AclAction(WireAclAction::S8 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::S8 {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionU16,
            WireValue::AclAction(WireAclAction::U16 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::U16 {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionS16,
            WireValue::AclAction(WireAclAction::S16 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::S16 {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionU32,
            WireValue::AclAction(WireAclAction::U32 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::U32 {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionS32,
            WireValue::AclAction(WireAclAction::S32 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::S32 {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionMac,
            WireValue::AclAction(WireAclAction::Mac { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::Mac {
            enable: *enable,
            parameter: primitive::parse_mac(parameter)?,
        }),
        (
            ValueKind::AclActionIpv4,
            WireValue::AclAction(WireAclAction::Ipv4 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::Ipv4 {
            enable: *enable,
            parameter: primitive::parse_ipv4(parameter),
        }),
        (
            ValueKind::AclActionIpv6,
            WireValue::AclAction(WireAclAction::Ipv6 { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::Ipv6 {
            enable: *enable,
            parameter: primitive::parse_ipv6(parameter),
        }),
        (
            ValueKind::AclActionIpAddress,
            WireValue::AclAction(WireAclAction::IpAddress { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::IpAddress {
            enable: *enable,
            parameter: primitive::parse_ip_address(parameter),
        }),
        (
            ValueKind::AclActionObjectId,
            WireValue::AclAction(WireAclAction::ObjectId { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::ObjectId {
            enable: *enable,
            parameter: *parameter,
        }),
        (
            ValueKind::AclActionObjectList,
            WireValue::AclAction(WireAclAction::ObjectList { enable, parameter }),
        ) => NativeValue::AclAction(NativeAclAction::ObjectList {
            enable: *enable,
            parameter: copy_list(wire.id, parameter)?,
        }),
        (ValueKind::AclCapability, WireValue::AclCapability(cap)) => {
            NativeValue::AclCapability(NativeAclCapability {
                is_action_list_mandatory: cap.is_action_list_mandatory,
                action_list: copy_list(wire.id, &cap.action_list)?,
            })
        }
        (ValueKind::AclResourceList, WireValue::AclResourceList(list)) => {
            NativeValue::AclResourceList(copy_list(wire.id, list)?)
        }
        (ValueKind::IpAddressList, WireValue::IpAddressList(list)) => {
            let src = checked(wire.id, list)?;
            let mut out = OwnedList::with_capacity(src.len());
            for addr in src {
                out.push(primitive::parse_ip_address(addr));
            }
            NativeValue::IpAddressList(out)
        }
        (ValueKind::IpPrefixList, WireValue::IpPrefixList(list)) => {
            let src = checked(wire.id, list)?;
            let mut out = OwnedList::with_capacity(src.len());
            for prefix in src {
                out.push(primitive::parse_ip_prefix(prefix));
            }
            NativeValue::IpPrefixList(out)
        }
        (ValueKind::QosMapList, WireValue::QosMapList(list)) => {
            NativeValue::QosMapList(copy_list(wire.id, list)?)
        }
        (expected, _) => {
            error!(
                "attribute {} payload does not match metadata kind {expected:?}",
                wire.id
            );
            return Err(AttrError::ValueShapeMismatch {
                id: wire.id,
                expected,
            });
        }
    };

    Ok(NativeAttribute { id: wire.id, value })
}

/// Converts a native attribute back into wire form, consuming it.
///
/// List buffers allocated by [`decode`] are released here; taking the
/// attribute by value is what makes a double release unrepresentable.
pub fn encode<M: MetadataLookup>(
    metadata: &M,
    object_type: ObjectType,
    native: NativeAttribute,
) -> Result<WireAttribute, AttrError> {
    let kind = resolve(metadata, object_type, native.id)?;
    let id = native.id;

    let value = match (kind, native.value) {
        (ValueKind::Bool, NativeValue::Bool(v)) => WireValue::Bool(v),
        (ValueKind::CharData, NativeValue::CharData(data)) => {
            WireValue::CharData(unpack_chardata(&data))
        }
        (ValueKind::U8, NativeValue::U8(v)) => WireValue::U8(v),
        (ValueKind::S8, NativeValue::S8(v)) => WireValue::S8(v),
        (ValueKind::U16, NativeValue::U16(v)) => WireValue::U16(v),
        (ValueKind::S16, NativeValue::S16(v)) => WireValue::S16(v),
        (ValueKind::U32, NativeValue::U32(v)) => WireValue::U32(v),
        (ValueKind::S32, NativeValue::S32(v)) => WireValue::S32(v),
        (ValueKind::U64, NativeValue::U64(v)) => WireValue::U64(v),
        (ValueKind::S64, NativeValue::S64(v)) => WireValue::S64(v),
        (ValueKind::Mac, NativeValue::Mac(mac)) => WireValue::Mac(primitive::format_mac(&mac)),
        (ValueKind::Ipv4, NativeValue::Ipv4(ip4)) => WireValue::Ipv4(primitive::format_ipv4(ip4)),
        (ValueKind::Ipv6, NativeValue::Ipv6(ip6)) => WireValue::Ipv6(primitive::format_ipv6(&ip6)),
        (ValueKind::IpAddress, NativeValue::IpAddress(addr)) => {
            WireValue::IpAddress(primitive::format_ip_address(&addr))
        }
        (ValueKind::IpPrefix, NativeValue::IpPrefix(prefix)) => {
            WireValue::IpPrefix(primitive::format_ip_prefix(&prefix))
        }
        (ValueKind::ObjectId, NativeValue::ObjectId(oid)) => WireValue::ObjectId(oid),
        (ValueKind::ObjectList, NativeValue::ObjectList(list)) => {
            WireValue::ObjectList(release_list(list))
        }
        (ValueKind::U8List, NativeValue::U8List(list)) => WireValue::U8List(release_list(list)),
        (ValueKind::S8List, NativeValue::S8List(list)) => WireValue::S8List(release_list(list)),
        (ValueKind::U16List, NativeValue::U16List(list)) => WireValue::U16List(release_list(list)),
        (ValueKind::S16List, NativeValue::S16List(list)) => WireValue::S16List(release_list(list)),
        (ValueKind::U32List, NativeValue::U32List(list)) => WireValue::U32List(release_list(list)),
        (ValueKind::S32List, NativeValue::S32List(list)) => WireValue::S32List(release_list(list)),
        (ValueKind::U32Range, NativeValue::U32Range(range)) => WireValue::U32Range(range),
        (ValueKind::S32Range, NativeValue::S32Range(range)) => WireValue::S32Range(range),
        (ValueKind::U16RangeList, NativeValue::U16RangeList(list)) => {
            WireValue::U16RangeList(release_list(list))
        }
        (ValueKind::AclFieldBool, NativeValue::AclField(NativeAclField::Bool { enable, data })) => {
            WireValue::AclField(WireAclField::Bool { enable, data })
        }
        (
            ValueKind::AclFieldU8,
            NativeValue::AclField(NativeAclField::U8 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::U8 { enable, data, mask }),
        (
            ValueKind::AclFieldS8,
            NativeValue::AclField(NativeAclField::S8 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::S8 { enable, data, mask }),
        (
            ValueKind::AclFieldU16,
            NativeValue::AclField(NativeAclField::U16 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::U16 { enable, data, mask }),
        (
            ValueKind::AclFieldS16,
            NativeValue::AclField(NativeAclField::S16 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::S16 { enable, data, mask }),
        (
            ValueKind::AclFieldU32,
            NativeValue::AclField(NativeAclField::U32 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::U32 { enable, data, mask }),
        (
            ValueKind::AclFieldS32,
            NativeValue::AclField(NativeAclField::S32 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::S32 { enable, data, mask }),
        (
            ValueKind::AclFieldMac,
            NativeValue::AclField(NativeAclField::Mac { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::Mac {
            enable,
            data: primitive::format_mac(&data),
            mask: primitive::format_mac(&mask),
        }),
        (
            ValueKind::AclFieldIpv4,
            NativeValue::AclField(NativeAclField::Ipv4 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::Ipv4 {
            enable,
            data: primitive::format_ipv4(data),
            mask: primitive::format_ipv4(mask),
        }),
        (
            ValueKind::AclFieldIpv6,
            NativeValue::AclField(NativeAclField::Ipv6 { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::Ipv6 {
            enable,
            data: primitive::format_ipv6(&data),
            mask: primitive::format_ipv6(&mask),
        }),
        (
            ValueKind::AclFieldObjectId,
            NativeValue::AclField(NativeAclField::ObjectId { enable, data }),
        ) => WireValue::AclField(WireAclField::ObjectId { enable, data }),
        (
            ValueKind::AclFieldObjectList,
            NativeValue::AclField(NativeAclField::ObjectList { enable, data }),
        ) => WireValue::AclField(WireAclField::ObjectList {
            enable,
            data: release_list(data),
        }),
        (
            ValueKind::AclFieldU8List,
            NativeValue::AclField(NativeAclField::U8List { enable, data, mask }),
        ) => WireValue::AclField(WireAclField::U8List {
            enable,
            data: release_list(data),
            mask: release_list(mask),
        }),
        (
            ValueKind::AclActionBool,
            NativeValue::AclAction(NativeAclAction::Bool { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::Bool { enable, parameter }),
        (
            ValueKind::AclActionU8,
            NativeValue::AclAction(NativeAclAction::U8 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::U8 { enable, parameter }),
        (
            ValueKind::AclActionS8,
            NativeValue::AclAction(NativeAclAction::S8 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::S8 { enable, parameter }),
        (
            ValueKind::AclActionU16,
            NativeValue::AclAction(NativeAclAction::U16 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::U16 { enable, parameter }),
        (
            ValueKind::AclActionS16,
            NativeValue::AclAction(NativeAclAction::S16 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::S16 { enable, parameter }),
        (
            ValueKind::AclActionU32,
            NativeValue::AclAction(NativeAclAction::U32 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::U32 { enable, parameter }),
        (
            ValueKind::AclActionS32,
            NativeValue::AclAction(NativeAclAction::S32 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::S32 { enable, parameter }),
        (
            ValueKind::AclActionMac,
            NativeValue::AclAction(NativeAclAction::Mac { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::Mac {
            enable,
            parameter: primitive::format_mac(&parameter),
        }),
        (
            ValueKind::AclActionIpv4,
            NativeValue::AclAction(NativeAclAction::Ipv4 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::Ipv4 {
            enable,
            parameter: primitive::format_ipv4(parameter),
        }),
        (
            ValueKind::AclActionIpv6,
            NativeValue::AclAction(NativeAclAction::Ipv6 { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::Ipv6 {
            enable,
            parameter: primitive::format_ipv6(&parameter),
        }),
        (
            ValueKind::AclActionIpAddress,
            NativeValue::AclAction(NativeAclAction::IpAddress { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::IpAddress {
            enable,
            parameter: primitive::format_ip_address(&parameter),
        }),
        (
            ValueKind::AclActionObjectId,
            NativeValue::AclAction(NativeAclAction::ObjectId { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::ObjectId { enable, parameter }),
        (
            ValueKind::AclActionObjectList,
            NativeValue::AclAction(NativeAclAction::ObjectList { enable, parameter }),
        ) => WireValue::AclAction(WireAclAction::ObjectList {
            enable,
            parameter: release_list(parameter),
        }),
        (ValueKind::AclCapability, NativeValue::AclCapability(cap)) => {
            WireValue::AclCapability(WireAclCapability {
                is_action_list_mandatory: cap.is_action_list_mandatory,
                action_list: release_list(cap.action_list),
            })
        }
        (ValueKind::AclResourceList, NativeValue::AclResourceList(list)) => {
            WireValue::AclResourceList(release_list(list))
        }
        (ValueKind::IpAddressList, NativeValue::IpAddressList(list)) => {
            let mut out = Vec::with_capacity(list.len());
            for addr in list.into_vec() {
                out.push(primitive::format_ip_address(&addr));
            }
            WireValue::IpAddressList(WireList::new(out))
        }
        (ValueKind::IpPrefixList, NativeValue::IpPrefixList(list)) => {
            // Each prefix converts independently.
            let mut out = Vec::with_capacity(list.len());
            for prefix in list.into_vec() {
                out.push(primitive::format_ip_prefix(&prefix));
            }
            WireValue::IpPrefixList(WireList::new(out))
        }
        (ValueKind::QosMapList, NativeValue::QosMapList(list)) => {
            WireValue::QosMapList(release_list(list))
        }
        (expected, value) => {
            error!("attribute {id} native value does not match metadata kind {expected:?}");
            // Dropping `value` releases any buffers it still owns.
            drop(value);
            return Err(AttrError::ValueShapeMismatch { id, expected });
        }
    };

    Ok(WireAttribute { id, value })
}

fn resolve<M: MetadataLookup>(
    metadata: &M,
    object_type: ObjectType,
    id: AttrId,
) -> Result<ValueKind, AttrError> {
    metadata.value_kind(object_type, id).ok_or_else(|| {
        error!("attribute metadata not found for object type {object_type} and attribute {id}");
        AttrError::UnknownAttribute { object_type, id }
    })
}

fn checked<T>(id: AttrId, list: &WireList<T>) -> Result<&[T], AttrError> {
    if list.count as usize != list.list.len() {
        return Err(AttrError::CountMismatch {
            id,
            count: list.count,
            len: list.list.len(),
        });
    }
    Ok(&list.list)
}

fn copy_list<T: Copy>(id: AttrId, list: &WireList<T>) -> Result<OwnedList<T>, AttrError> {
    let src = checked(id, list)?;
    let mut out = OwnedList::with_capacity(src.len());
    for item in src {
        out.push(*item);
    }
    Ok(out)
}

fn release_list<T>(list: OwnedList<T>) -> WireList<T> {
    WireList::new(list.into_vec())
}

fn pack_chardata(s: &str) -> [u8; CHARDATA_LEN] {
    let mut out = [0u8; CHARDATA_LEN];
    let bytes = s.as_bytes();
    let n = bytes.len().min(CHARDATA_LEN);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

fn unpack_chardata(data: &[u8; CHARDATA_LEN]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(CHARDATA_LEN);
    String::from_utf8_lossy(&data[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{
        AclResource, IpFamily, QosMap, QosMapParams, S32Range, U16Range, U32Range, WireIpAddress,
        WireIpPrefix, buffer,
        metadata::AttrRegistry,
    };

    const PORT: ObjectType = 1;

    fn registry() -> AttrRegistry {
        let mut registry = AttrRegistry::new();
        registry
            .register(PORT, 1, ValueKind::Bool)
            .register(PORT, 2, ValueKind::CharData)
            .register(PORT, 3, ValueKind::U32)
            .register(PORT, 4, ValueKind::S64)
            .register(PORT, 5, ValueKind::Mac)
            .register(PORT, 6, ValueKind::Ipv4)
            .register(PORT, 7, ValueKind::Ipv6)
            .register(PORT, 8, ValueKind::IpAddress)
            .register(PORT, 9, ValueKind::IpPrefix)
            .register(PORT, 10, ValueKind::ObjectList)
            .register(PORT, 11, ValueKind::U32List)
            .register(PORT, 12, ValueKind::U32Range)
            .register(PORT, 13, ValueKind::S32Range)
            .register(PORT, 14, ValueKind::U16RangeList)
            .register(PORT, 15, ValueKind::AclFieldIpv4)
            .register(PORT, 16, ValueKind::AclFieldU8List)
            .register(PORT, 17, ValueKind::AclActionObjectList)
            .register(PORT, 18, ValueKind::AclCapability)
            .register(PORT, 19, ValueKind::AclResourceList)
            .register(PORT, 20, ValueKind::IpAddressList)
            .register(PORT, 21, ValueKind::IpPrefixList)
            .register(PORT, 22, ValueKind::QosMapList)
            .register(PORT, 23, ValueKind::AclActionIpAddress);
        registry
    }

    fn round_trip(id: u32, value: WireValue) {
        let registry = registry();
        let wire = WireAttribute { id, value };
        let native = decode(&registry, PORT, &wire).unwrap();
        assert_eq!(native.id, wire.id);
        let back = encode(&registry, PORT, native).unwrap();
        assert_eq!(back, wire);
    }

    #[test]
    fn scalar_round_trips() {
        round_trip(1, WireValue::Bool(true));
        round_trip(3, WireValue::U32(0xDEAD_BEEF));
        round_trip(4, WireValue::S64(-42));
    }

    #[test]
    fn address_round_trips() {
        round_trip(5, WireValue::Mac("aa:bb:cc:dd:ee:ff".to_string()));
        round_trip(6, WireValue::Ipv4("192.168.1.1".to_string()));
        round_trip(7, WireValue::Ipv6("2001:db8::1".to_string()));
        round_trip(
            8,
            WireValue::IpAddress(WireIpAddress {
                family: IpFamily::V4,
                addr: "10.0.0.1".to_string(),
            }),
        );
        round_trip(
            9,
            WireValue::IpPrefix(WireIpPrefix {
                family: IpFamily::V6,
                addr: "2001:db8::".to_string(),
                mask: "ffff:ffff::".to_string(),
            }),
        );
    }

    #[test]
    fn ipv4_decodes_to_network_order() {
        let registry = registry();
        let wire = WireAttribute {
            id: 6,
            value: WireValue::Ipv4("192.168.1.1".to_string()),
        };
        let native = decode(&registry, PORT, &wire).unwrap();
        assert_eq!(native.value, NativeValue::Ipv4(0xC0A80101u32.to_be()));
    }

    #[test]
    fn mac_decodes_to_raw_bytes() {
        let registry = registry();
        let wire = WireAttribute {
            id: 5,
            value: WireValue::Mac("aa:bb:cc:dd:ee:ff".to_string()),
        };
        let native = decode(&registry, PORT, &wire).unwrap();
        assert_eq!(
            native.value,
            NativeValue::Mac([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])
        );
    }

    #[test]
    fn list_round_trips_preserve_order_and_count() {
        round_trip(10, WireValue::ObjectList(vec![9u64, 3, 7, 3].into()));
        round_trip(11, WireValue::U32List(vec![5u32, 4, 3, 2, 1].into()));
        round_trip(
            14,
            WireValue::U16RangeList(
                vec![U16Range { min: 1, max: 10 }, U16Range { min: 20, max: 30 }].into(),
            ),
        );

        let registry = registry();
        let wire = WireAttribute {
            id: 10,
            value: WireValue::ObjectList(vec![1u64, 2, 3].into()),
        };
        let native = decode(&registry, PORT, &wire).unwrap();
        match &native.value {
            NativeValue::ObjectList(list) => {
                assert_eq!(list.count(), 3);
                assert_eq!(list.as_slice(), &[1, 2, 3]);
            }
            other => panic!("unexpected native value {other:?}"),
        }
    }

    #[test]
    fn range_round_trips() {
        round_trip(12, WireValue::U32Range(U32Range { min: 100, max: 4096 }));
        round_trip(13, WireValue::S32Range(S32Range { min: -5, max: 5 }));
    }

    #[test]
    fn acl_round_trips() {
        round_trip(
            15,
            WireValue::AclField(WireAclField::Ipv4 {
                enable: true,
                data: "10.0.0.0".to_string(),
                mask: "255.0.0.0".to_string(),
            }),
        );
        round_trip(
            16,
            WireValue::AclField(WireAclField::U8List {
                enable: true,
                data: vec![1u8, 2, 3].into(),
                mask: vec![0xFFu8, 0xFF, 0xF0].into(),
            }),
        );
        round_trip(
            17,
            WireValue::AclAction(WireAclAction::ObjectList {
                enable: false,
                parameter: vec![11u64, 12].into(),
            }),
        );
        round_trip(
            18,
            WireValue::AclCapability(WireAclCapability {
                is_action_list_mandatory: true,
                action_list: vec![1i32, 2, 3].into(),
            }),
        );
        round_trip(
            19,
            WireValue::AclResourceList(
                vec![AclResource {
                    stage: 0,
                    bind_point: 1,
                    avail_num: 128,
                }]
                .into(),
            ),
        );
        round_trip(
            23,
            WireValue::AclAction(WireAclAction::IpAddress {
                enable: true,
                parameter: WireIpAddress {
                    family: IpFamily::V6,
                    addr: "2001:db8::9".to_string(),
                },
            }),
        );
    }

    #[test]
    fn address_list_round_trips() {
        round_trip(
            20,
            WireValue::IpAddressList(
                vec![
                    WireIpAddress {
                        family: IpFamily::V4,
                        addr: "10.0.0.1".to_string(),
                    },
                    WireIpAddress {
                        family: IpFamily::V6,
                        addr: "2001:db8::1".to_string(),
                    },
                ]
                .into(),
            ),
        );
        // Every prefix element converts on its own; a two-element list must
        // come back with two distinct prefixes.
        round_trip(
            21,
            WireValue::IpPrefixList(
                vec![
                    WireIpPrefix {
                        family: IpFamily::V4,
                        addr: "10.0.0.0".to_string(),
                        mask: "255.0.0.0".to_string(),
                    },
                    WireIpPrefix {
                        family: IpFamily::V4,
                        addr: "192.168.0.0".to_string(),
                        mask: "255.255.0.0".to_string(),
                    },
                ]
                .into(),
            ),
        );
    }

    #[test]
    fn qos_map_round_trips() {
        let entry = QosMap {
            key: QosMapParams {
                tc: 1,
                dscp: 46,
                dot1p: 5,
                prio: 0,
                pg: 2,
                queue_index: 3,
                color: 1,
                mpls_exp: 0,
            },
            value: QosMapParams {
                tc: 4,
                dscp: 0,
                dot1p: 0,
                prio: 7,
                pg: 0,
                queue_index: 6,
                color: 2,
                mpls_exp: 1,
            },
        };
        round_trip(22, WireValue::QosMapList(vec![entry].into()));
    }

    #[test]
    fn chardata_truncates_at_native_width() {
        let registry = registry();
        let long = "x".repeat(CHARDATA_LEN + 8);
        let wire = WireAttribute {
            id: 2,
            value: WireValue::CharData(long),
        };
        let native = decode(&registry, PORT, &wire).unwrap();
        let back = encode(&registry, PORT, native).unwrap();
        assert_eq!(
            back.value,
            WireValue::CharData("x".repeat(CHARDATA_LEN))
        );
    }

    #[test]
    fn unknown_attribute_is_rejected_before_allocation() {
        let registry = registry();
        let before = buffer::live_buffers();
        let wire = WireAttribute {
            id: 999,
            value: WireValue::ObjectList(vec![1u64, 2].into()),
        };
        let err = decode(&registry, PORT, &wire).unwrap_err();
        assert_eq!(
            err,
            AttrError::UnknownAttribute {
                object_type: PORT,
                id: 999
            }
        );
        assert_eq!(buffer::live_buffers(), before);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let registry = registry();
        let wire = WireAttribute {
            id: 1,
            value: WireValue::U32(5),
        };
        let err = decode(&registry, PORT, &wire).unwrap_err();
        assert_eq!(
            err,
            AttrError::ValueShapeMismatch {
                id: 1,
                expected: ValueKind::Bool
            }
        );
    }

    #[test]
    fn malformed_mac_is_rejected() {
        let registry = registry();
        let wire = WireAttribute {
            id: 5,
            value: WireValue::Mac("aa:bb".to_string()),
        };
        assert!(matches!(
            decode(&registry, PORT, &wire),
            Err(AttrError::MalformedAddress { family: "MAC", .. })
        ));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let registry = registry();
        let wire = WireAttribute {
            id: 11,
            value: WireValue::U32List(WireList {
                count: 5,
                list: vec![1, 2, 3],
            }),
        };
        assert_eq!(
            decode(&registry, PORT, &wire).unwrap_err(),
            AttrError::CountMismatch {
                id: 11,
                count: 5,
                len: 3
            }
        );
    }

    #[test]
    fn allocation_balance_across_decode_encode() {
        let registry = registry();
        let before = buffer::live_buffers();

        let attrs = vec![
            WireAttribute {
                id: 10,
                value: WireValue::ObjectList(vec![1u64, 2, 3].into()),
            },
            WireAttribute {
                id: 16,
                value: WireValue::AclField(WireAclField::U8List {
                    enable: true,
                    data: vec![1u8].into(),
                    mask: vec![0xFFu8].into(),
                }),
            },
            WireAttribute {
                id: 20,
                value: WireValue::IpAddressList(
                    vec![WireIpAddress {
                        family: IpFamily::V4,
                        addr: "10.0.0.1".to_string(),
                    }]
                    .into(),
                ),
            },
        ];

        // Encode releases what decode allocated.
        for wire in &attrs {
            let native = decode(&registry, PORT, wire).unwrap();
            assert!(buffer::live_buffers() > before);
            let _ = encode(&registry, PORT, native).unwrap();
            assert_eq!(buffer::live_buffers(), before);
        }

        // Dropping without encoding releases too.
        for wire in &attrs {
            let native = decode(&registry, PORT, wire).unwrap();
            drop(native);
            assert_eq!(buffer::live_buffers(), before);
        }
    }

    #[test]
    fn encode_shape_mismatch_releases_buffers() {
        let registry = registry();
        let before = buffer::live_buffers();
        // Metadata says attribute 3 is a plain U32; hand encode a list.
        let native = NativeAttribute {
            id: 3,
            value: NativeValue::ObjectList(vec![1u64, 2].into()),
        };
        let err = encode(&registry, PORT, native).unwrap_err();
        assert_eq!(
            err,
            AttrError::ValueShapeMismatch {
                id: 3,
                expected: ValueKind::U32
            }
        );
        assert_eq!(buffer::live_buffers(), before);
    }
}
