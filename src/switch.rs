//! The hardware-abstraction seam.
//!
//! [`SwitchApi`] is the contract the RPC layer programs devices through;
//! attributes cross it in native form only. [`SoftSwitch`] is an in-memory
//! implementation standing in for a real ASIC SDK, used by the bundled
//! daemon and the tests.
use std::collections::HashMap;

use thiserror::Error;

use crate::attr::{AttrId, NativeAttribute, ObjectId, ObjectType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    #[error("no object {oid:#x} of type {object_type}")]
    NoSuchObject { object_type: ObjectType, oid: ObjectId },

    #[error("object {oid:#x} has no attribute {id}")]
    NoSuchAttribute { oid: ObjectId, id: AttrId },

    #[error("object type {object_type} does not fit the handle's type field")]
    ObjectTypeTooWide { object_type: ObjectType },
}

/// Device-programming operations, invoked with attributes already in
/// native form.
pub trait SwitchApi {
    fn create(
        &mut self,
        object_type: ObjectType,
        attrs: Vec<NativeAttribute>,
    ) -> Result<ObjectId, SwitchError>;

    fn remove(&mut self, object_type: ObjectType, oid: ObjectId) -> Result<(), SwitchError>;

    fn set(
        &mut self,
        object_type: ObjectType,
        oid: ObjectId,
        attr: NativeAttribute,
    ) -> Result<(), SwitchError>;

    fn get(
        &mut self,
        object_type: ObjectType,
        oid: ObjectId,
        attr_ids: &[AttrId],
    ) -> Result<Vec<NativeAttribute>, SwitchError>;

    /// Recovers the object type embedded in a handle.
    fn object_type_query(&self, oid: ObjectId) -> Option<ObjectType>;

    /// Resolves the switch handle an object belongs to.
    fn switch_id_query(&self, oid: ObjectId) -> Option<ObjectId>;

    /// How many more objects of a type the device can hold, optionally
    /// narrowed by resource-selecting attributes.
    fn availability(
        &self,
        object_type: ObjectType,
        attrs: &[NativeAttribute],
    ) -> Result<u64, SwitchError>;

    /// The enum values the device accepts for an attribute, or `None` when
    /// the attribute carries no enum.
    fn enum_values_capability(&self, object_type: ObjectType, id: AttrId) -> Option<Vec<i32>>;
}

// Object handles carry their type in the upper bits, the way real ASIC
// SDKs make type/switch queries answerable without a table walk.
const TYPE_SHIFT: u32 = 48;
// Widest type the handle layout can embed without truncation.
const TYPE_MAX: ObjectType = (u64::MAX >> TYPE_SHIFT) as ObjectType;
// Per-type object budget the soft device reports availability against.
const TABLE_CAPACITY: u64 = 1024;

/// An in-memory switch: objects are attribute maps, handles are sequential
/// with the object type packed into the upper bits.
#[derive(Debug)]
pub struct SoftSwitch {
    objects: HashMap<ObjectId, HashMap<AttrId, NativeAttribute>>,
    enum_caps: HashMap<(ObjectType, AttrId), Vec<i32>>,
    next_index: u64,
    switch_id: ObjectId,
}

impl SoftSwitch {
    pub fn new() -> Self {
        let mut switch = Self {
            objects: HashMap::new(),
            enum_caps: HashMap::new(),
            next_index: 1,
            switch_id: 0,
        };
        // The switch object itself is always present.
        switch.switch_id = switch.insert_object(0);
        switch
    }

    pub fn switch_id(&self) -> ObjectId {
        self.switch_id
    }

    /// Declares the enum values the device accepts for an attribute.
    pub fn register_enum_values(
        &mut self,
        object_type: ObjectType,
        id: AttrId,
        values: Vec<i32>,
    ) -> &mut Self {
        self.enum_caps.insert((object_type, id), values);
        self
    }

    fn insert_object(&mut self, object_type: ObjectType) -> ObjectId {
        self.insert_object_with(object_type, HashMap::new())
    }

    fn insert_object_with(
        &mut self,
        object_type: ObjectType,
        attrs: HashMap<AttrId, NativeAttribute>,
    ) -> ObjectId {
        let oid = (u64::from(object_type) << TYPE_SHIFT) | self.next_index;
        self.next_index += 1;
        self.objects.insert(oid, attrs);
        oid
    }

    fn object(
        &mut self,
        object_type: ObjectType,
        oid: ObjectId,
    ) -> Result<&mut HashMap<AttrId, NativeAttribute>, SwitchError> {
        self.objects
            .get_mut(&oid)
            .filter(|_| oid >> TYPE_SHIFT == u64::from(object_type))
            .ok_or(SwitchError::NoSuchObject { object_type, oid })
    }
}

impl SwitchApi for SoftSwitch {
    fn create(
        &mut self,
        object_type: ObjectType,
        attrs: Vec<NativeAttribute>,
    ) -> Result<ObjectId, SwitchError> {
        if object_type > TYPE_MAX {
            return Err(SwitchError::ObjectTypeTooWide { object_type });
        }
        let stored = attrs.into_iter().map(|attr| (attr.id, attr)).collect();
        Ok(self.insert_object_with(object_type, stored))
    }

    fn remove(&mut self, object_type: ObjectType, oid: ObjectId) -> Result<(), SwitchError> {
        self.object(object_type, oid)?;
        self.objects.remove(&oid);
        Ok(())
    }

    fn set(
        &mut self,
        object_type: ObjectType,
        oid: ObjectId,
        attr: NativeAttribute,
    ) -> Result<(), SwitchError> {
        self.object(object_type, oid)?.insert(attr.id, attr);
        Ok(())
    }

    fn get(
        &mut self,
        object_type: ObjectType,
        oid: ObjectId,
        attr_ids: &[AttrId],
    ) -> Result<Vec<NativeAttribute>, SwitchError> {
        let stored = self.object(object_type, oid)?;
        let mut out = Vec::with_capacity(attr_ids.len());
        for id in attr_ids {
            let attr = stored
                .get(id)
                .cloned()
                .ok_or(SwitchError::NoSuchAttribute { oid, id: *id })?;
            out.push(attr);
        }
        Ok(out)
    }

    fn object_type_query(&self, oid: ObjectId) -> Option<ObjectType> {
        self.objects
            .contains_key(&oid)
            .then(|| (oid >> TYPE_SHIFT) as ObjectType)
    }

    fn switch_id_query(&self, oid: ObjectId) -> Option<ObjectId> {
        self.objects.contains_key(&oid).then_some(self.switch_id)
    }

    fn availability(
        &self,
        object_type: ObjectType,
        _attrs: &[NativeAttribute],
    ) -> Result<u64, SwitchError> {
        if object_type > TYPE_MAX {
            return Err(SwitchError::ObjectTypeTooWide { object_type });
        }
        let used = self
            .objects
            .keys()
            .filter(|oid| **oid >> TYPE_SHIFT == u64::from(object_type))
            .count() as u64;
        Ok(TABLE_CAPACITY.saturating_sub(used))
    }

    fn enum_values_capability(&self, object_type: ObjectType, id: AttrId) -> Option<Vec<i32>> {
        self.enum_caps.get(&(object_type, id)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::NativeValue;

    const VLAN: ObjectType = 2;

    #[test]
    fn create_get_set_remove() {
        let mut switch = SoftSwitch::new();
        let oid = switch
            .create(
                VLAN,
                vec![NativeAttribute {
                    id: 1,
                    value: NativeValue::U16(100),
                }],
            )
            .unwrap();

        let attrs = switch.get(VLAN, oid, &[1]).unwrap();
        assert_eq!(attrs[0].value, NativeValue::U16(100));

        switch
            .set(
                VLAN,
                oid,
                NativeAttribute {
                    id: 1,
                    value: NativeValue::U16(200),
                },
            )
            .unwrap();
        assert_eq!(
            switch.get(VLAN, oid, &[1]).unwrap()[0].value,
            NativeValue::U16(200)
        );

        switch.remove(VLAN, oid).unwrap();
        assert!(matches!(
            switch.get(VLAN, oid, &[1]),
            Err(SwitchError::NoSuchObject { .. })
        ));
    }

    #[test]
    fn wrong_type_is_no_such_object() {
        let mut switch = SoftSwitch::new();
        let oid = switch.create(VLAN, vec![]).unwrap();
        assert!(matches!(
            switch.remove(VLAN + 1, oid),
            Err(SwitchError::NoSuchObject { .. })
        ));
    }

    #[test]
    fn missing_attribute_is_reported() {
        let mut switch = SoftSwitch::new();
        let oid = switch.create(VLAN, vec![]).unwrap();
        assert_eq!(
            switch.get(VLAN, oid, &[7]).unwrap_err(),
            SwitchError::NoSuchAttribute { oid, id: 7 }
        );
    }

    #[test]
    fn object_type_wider_than_the_handle_field_is_rejected() {
        let mut switch = SoftSwitch::new();
        // 2^16 no longer fits above TYPE_SHIFT in a 64-bit handle.
        let wide: ObjectType = 0x1_0000;
        assert_eq!(
            switch.create(wide, vec![]).unwrap_err(),
            SwitchError::ObjectTypeTooWide { object_type: wide }
        );
        assert_eq!(
            switch.availability(wide, &[]).unwrap_err(),
            SwitchError::ObjectTypeTooWide { object_type: wide }
        );
    }

    #[test]
    fn availability_shrinks_as_objects_fill_the_type() {
        let mut switch = SoftSwitch::new();
        let empty = switch.availability(VLAN, &[]).unwrap();
        switch.create(VLAN, vec![]).unwrap();
        switch.create(VLAN, vec![]).unwrap();
        assert_eq!(switch.availability(VLAN, &[]).unwrap(), empty - 2);
        // Other types are unaffected.
        assert_eq!(switch.availability(VLAN + 1, &[]).unwrap(), empty);
    }

    #[test]
    fn enum_values_come_from_the_registered_capability() {
        let mut switch = SoftSwitch::new();
        switch.register_enum_values(VLAN, 3, vec![0, 1, 2]);
        assert_eq!(switch.enum_values_capability(VLAN, 3), Some(vec![0, 1, 2]));
        assert_eq!(switch.enum_values_capability(VLAN, 4), None);
    }

    #[test]
    fn handle_queries() {
        let mut switch = SoftSwitch::new();
        let oid = switch.create(VLAN, vec![]).unwrap();
        assert_eq!(switch.object_type_query(oid), Some(VLAN));
        assert_eq!(switch.switch_id_query(oid), Some(switch.switch_id()));
        assert_eq!(switch.object_type_query(0xDEAD), None);
    }
}
