//! Attribute model and codec.
//!
//! This module defines the two representations an attribute value takes on
//! its way between a remote peer and the switch-abstraction API, and the
//! codec translating between them.
//!
//! # Overview
//!
//! An attribute is a typed key/value pair attached to a switch object. The
//! value's shape (its [`ValueKind`]) is never inferred from the payload;
//! it is resolved through an external metadata table keyed by
//! `(object type, attribute id)` (see [`metadata`]).
//!
//! The *wire* representation ([`WireAttribute`]) is what peers transmit:
//! addresses are human-readable strings, lists are sequences carrying a
//! mirrored element count. The *native* representation
//! ([`NativeAttribute`]) is the fixed-layout form the hardware API
//! consumes: addresses are raw bytes in network order, lists are owned
//! contiguous buffers ([`buffer::OwnedList`]).
//!
//! # Key Components
//!
//! - [`ValueKind`]: closed enumeration of every supported value shape.
//! - [`WireAttribute`] / [`NativeAttribute`]: the two sides of the codec.
//! - [`codec::decode`] / [`codec::encode`]: the conversion entry points.
//! - [`primitive`]: MAC, IPv4, IPv6 and prefix sub-codecs.
//! - [`AttrError`]: everything a conversion can fail with.
//!
//! # Ownership
//!
//! Decoding a list-kind attribute allocates exactly one owned buffer per
//! list field. Encoding consumes the native attribute by value, releasing
//! those buffers; a value cannot be encoded twice. Discarding a decoded
//! attribute without encoding it releases the buffers through `Drop`.
pub mod buffer;
pub mod codec;
pub mod metadata;
pub mod primitive;

use bincode::{Decode, Encode};
use thiserror::Error;

use buffer::OwnedList;

/// Object-type discriminant, assigned by the hardware API's object model.
pub type ObjectType = u32;
/// Attribute identifier, scoped to an object type.
pub type AttrId = u32;
/// Opaque object handle.
pub type ObjectId = u64;

/// Fixed size of the native character-data field.
pub const CHARDATA_LEN: usize = 32;

/// Everything an attribute conversion can fail with.
///
/// A conversion error is local to one attribute: nothing is allocated and
/// no output is produced on the failing path, and sibling attributes in
/// the same request are unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("no attribute metadata for object type {object_type}, attribute {id}")]
    UnknownAttribute { object_type: ObjectType, id: AttrId },

    #[error("attribute {id} carries a payload that does not match its {expected:?} kind")]
    ValueShapeMismatch { id: AttrId, expected: ValueKind },

    #[error("malformed {family} address '{input}'")]
    MalformedAddress { family: &'static str, input: String },

    #[error("attribute {id} list declares {count} elements but carries {len}")]
    CountMismatch { id: AttrId, count: u32, len: usize },
}

/// The closed set of value shapes an attribute can take.
///
/// The kind for a concrete attribute comes from the metadata table, never
/// from the payload. Matching on this enum is exhaustive; adding a kind
/// forces every dispatch site to handle it at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    CharData,
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    Mac,
    Ipv4,
    Ipv6,
    IpAddress,
    IpPrefix,
    ObjectId,
    ObjectList,
    U8List,
    S8List,
    U16List,
    S16List,
    U32List,
    S32List,
    U32Range,
    S32Range,
    U16RangeList,
    AclFieldBool,
    AclFieldU8,
    AclFieldS8,
    AclFieldU16,
    AclFieldS16,
    AclFieldU32,
    AclFieldS32,
    AclFieldMac,
    AclFieldIpv4,
    AclFieldIpv6,
    AclFieldObjectId,
    AclFieldObjectList,
    AclFieldU8List,
    AclActionBool,
    AclActionU8,
    AclActionS8,
    AclActionU16,
    AclActionS16,
    AclActionU32,
    AclActionS32,
    AclActionMac,
    AclActionIpv4,
    AclActionIpv6,
    AclActionIpAddress,
    AclActionObjectId,
    AclActionObjectList,
    AclCapability,
    AclResourceList,
    IpAddressList,
    IpPrefixList,
    QosMapList,
}

/// Address family tag carried by IP address and prefix values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum IpFamily {
    V4,
    V6,
}

/// A wire-side sequence with its mirrored element count.
///
/// Peers transmit both; decode rejects frames where they disagree instead
/// of trusting either one.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WireList<T> {
    pub count: u32,
    pub list: Vec<T>,
}

impl<T> WireList<T> {
    pub fn new(list: Vec<T>) -> Self {
        Self {
            count: list.len() as u32,
            list,
        }
    }
}

impl<T> From<Vec<T>> for WireList<T> {
    fn from(list: Vec<T>) -> Self {
        Self::new(list)
    }
}

/// Wire form of an IP address: family tag plus presentation string.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WireIpAddress {
    pub family: IpFamily,
    pub addr: String,
}

/// Wire form of an IP prefix: family tag plus address and mask strings.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WireIpPrefix {
    pub family: IpFamily,
    pub addr: String,
    pub mask: String,
}

/// Inclusive `{min, max}` pair. Copied verbatim between representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct U32Range {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct S32Range {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct U16Range {
    pub min: u16,
    pub max: u16,
}

/// One ACL resource record. Field-for-field numeric copy on both paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct AclResource {
    pub stage: i32,
    pub bind_point: i32,
    pub avail_num: u32,
}

/// One side of a QoS map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct QosMapParams {
    pub tc: u8,
    pub dscp: u8,
    pub dot1p: u8,
    pub prio: u8,
    pub pg: u8,
    pub queue_index: u8,
    pub color: i32,
    pub mpls_exp: u8,
}

/// A QoS map entry: classification key and the parameters it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct QosMap {
    pub key: QosMapParams,
    pub value: QosMapParams,
}

/// Wire form of an ACL match field: an enable flag plus data and, for
/// maskable kinds, a mask, parameterized over the primitive the field
/// matches on.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum WireAclField {
    Bool { enable: bool, data: bool },
    U8 { enable: bool, data: u8, mask: u8 },
    S8 { enable: bool, data: i8, mask: i8 },
    U16 { enable: bool, data: u16, mask: u16 },
    S16 { enable: bool, data: i16, mask: i16 },
    U32 { enable: bool, data: u32, mask: u32 },
    S32 { enable: bool, data: i32, mask: i32 },
    Mac { enable: bool, data: String, mask: String },
    Ipv4 { enable: bool, data: String, mask: String },
    Ipv6 { enable: bool, data: String, mask: String },
    ObjectId { enable: bool, data: ObjectId },
    ObjectList { enable: bool, data: WireList<ObjectId> },
    U8List { enable: bool, data: WireList<u8>, mask: WireList<u8> },
}

/// Wire form of an ACL action: an enable flag plus one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum WireAclAction {
    Bool { enable: bool, parameter: bool },
    U8 { enable: bool, parameter: u8 },
    S8 { enable: bool, parameter: i8 },
    U16 { enable: bool, parameter: u16 },
    S16 { enable: bool, parameter: i16 },
    U32 { enable: bool, parameter: u32 },
    S32 { enable: bool, parameter: i32 },
    Mac { enable: bool, parameter: String },
    Ipv4 { enable: bool, parameter: String },
    Ipv6 { enable: bool, parameter: String },
    IpAddress { enable: bool, parameter: WireIpAddress },
    ObjectId { enable: bool, parameter: ObjectId },
    ObjectList { enable: bool, parameter: WireList<ObjectId> },
}

/// Wire form of an ACL capability report.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WireAclCapability {
    pub is_action_list_mandatory: bool,
    pub action_list: WireList<i32>,
}

/// The wire-side value union. The variant is self-describing on the wire,
/// but the codec only trusts the variant after it agrees with the kind
/// resolved from metadata.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum WireValue {
    Bool(bool),
    CharData(String),
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    U64(u64),
    S64(i64),
    Mac(String),
    Ipv4(String),
    Ipv6(String),
    IpAddress(WireIpAddress),
    IpPrefix(WireIpPrefix),
    ObjectId(ObjectId),
    ObjectList(WireList<ObjectId>),
    U8List(WireList<u8>),
    S8List(WireList<i8>),
    U16List(WireList<u16>),
    S16List(WireList<i16>),
    U32List(WireList<u32>),
    S32List(WireList<i32>),
    U32Range(U32Range),
    S32Range(S32Range),
    U16RangeList(WireList<U16Range>),
    AclField(WireAclField),
    AclAction(WireAclAction),
    AclCapability(WireAclCapability),
    AclResourceList(WireList<AclResource>),
    IpAddressList(WireList<WireIpAddress>),
    IpPrefixList(WireList<WireIpPrefix>),
    QosMapList(WireList<QosMap>),
}

/// An attribute as transmitted between peers.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WireAttribute {
    pub id: AttrId,
    pub value: WireValue,
}

/// Native form of an IP address: fixed-width bytes in network order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeIpAddress {
    V4(u32),
    V6([u8; 16]),
}

/// Native form of an IP prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeIpPrefix {
    V4 { addr: u32, mask: u32 },
    V6 { addr: [u8; 16], mask: [u8; 16] },
}

/// Native form of an ACL match field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeAclField {
    Bool { enable: bool, data: bool },
    U8 { enable: bool, data: u8, mask: u8 },
    S8 { enable: bool, data: i8, mask: i8 },
    U16 { enable: bool, data: u16, mask: u16 },
    S16 { enable: bool, data: i16, mask: i16 },
    U32 { enable: bool, data: u32, mask: u32 },
    S32 { enable: bool, data: i32, mask: i32 },
    Mac { enable: bool, data: [u8; 6], mask: [u8; 6] },
    Ipv4 { enable: bool, data: u32, mask: u32 },
    Ipv6 { enable: bool, data: [u8; 16], mask: [u8; 16] },
    ObjectId { enable: bool, data: ObjectId },
    ObjectList { enable: bool, data: OwnedList<ObjectId> },
    U8List { enable: bool, data: OwnedList<u8>, mask: OwnedList<u8> },
}

/// Native form of an ACL action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeAclAction {
    Bool { enable: bool, parameter: bool },
    U8 { enable: bool, parameter: u8 },
    S8 { enable: bool, parameter: i8 },
    U16 { enable: bool, parameter: u16 },
    S16 { enable: bool, parameter: i16 },
    U32 { enable: bool, parameter: u32 },
    S32 { enable: bool, parameter: i32 },
    Mac { enable: bool, parameter: [u8; 6] },
    Ipv4 { enable: bool, parameter: u32 },
    Ipv6 { enable: bool, parameter: [u8; 16] },
    IpAddress { enable: bool, parameter: NativeIpAddress },
    ObjectId { enable: bool, parameter: ObjectId },
    ObjectList { enable: bool, parameter: OwnedList<ObjectId> },
}

/// Native form of an ACL capability report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAclCapability {
    pub is_action_list_mandatory: bool,
    pub action_list: OwnedList<i32>,
}

/// The native-side value union: the fixed-layout form handed to the
/// hardware API. List variants own their buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Bool(bool),
    CharData([u8; CHARDATA_LEN]),
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    U64(u64),
    S64(i64),
    Mac([u8; 6]),
    Ipv4(u32),
    Ipv6([u8; 16]),
    IpAddress(NativeIpAddress),
    IpPrefix(NativeIpPrefix),
    ObjectId(ObjectId),
    ObjectList(OwnedList<ObjectId>),
    U8List(OwnedList<u8>),
    S8List(OwnedList<i8>),
    U16List(OwnedList<u16>),
    S16List(OwnedList<i16>),
    U32List(OwnedList<u32>),
    S32List(OwnedList<i32>),
    U32Range(U32Range),
    S32Range(S32Range),
    U16RangeList(OwnedList<U16Range>),
    AclField(NativeAclField),
    AclAction(NativeAclAction),
    AclCapability(NativeAclCapability),
    AclResourceList(OwnedList<AclResource>),
    IpAddressList(OwnedList<NativeIpAddress>),
    IpPrefixList(OwnedList<NativeIpPrefix>),
    QosMapList(OwnedList<QosMap>),
}

/// An attribute in the form the hardware API consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAttribute {
    pub id: AttrId,
    pub value: NativeValue,
}
