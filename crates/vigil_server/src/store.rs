//! Server-side object store.

use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};
use vigil_protocol::{
    CommandRequest, CreateCommand, ListRequest, ObjectId, ObjectKind, ObjectRecord, Scope,
};

/// Id of the root group every tree hangs off.
pub const ROOT_ID: ObjectId = ObjectId(0);

/// Server-side object store.
///
/// The store maintains:
/// - The object tree (groups, devices, sensors) keyed by global id
/// - Notification triggers, numbered per owning object
/// - Accepted commands that have not been applied yet
pub struct ObjectStore {
    state: RwLock<StoreState>,
    generated_name_prefix: String,
}

struct StoreState {
    objects: BTreeMap<ObjectId, ObjectRecord>,
    triggers: Vec<ObjectRecord>,
    /// `None` once every id has been handed out.
    next_id: Option<u32>,
    pending: VecDeque<PendingCommand>,
}

struct PendingCommand {
    request: CommandRequest,
    remaining_polls: u32,
}

impl ObjectStore {
    /// Creates a store holding only the root group.
    pub fn new(root_name: &str, first_object_id: u32, generated_name_prefix: &str) -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(
            ROOT_ID,
            ObjectRecord::new(ROOT_ID, None, root_name, ObjectKind::Group),
        );

        Self {
            state: RwLock::new(StoreState {
                objects,
                triggers: Vec::new(),
                next_id: Some(first_object_id),
                pending: VecDeque::new(),
            }),
            generated_name_prefix: generated_name_prefix.to_string(),
        }
    }

    /// Returns the number of objects, including the root and triggers.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.objects.len() + state.triggers.len()
    }

    /// Returns true if the store holds nothing but the root group.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Returns the number of accepted but unapplied commands.
    pub fn pending_len(&self) -> usize {
        self.state.read().pending.len()
    }

    /// Looks up an object by id. Triggers are not addressable this way.
    pub fn get(&self, id: ObjectId) -> Option<ObjectRecord> {
        self.state.read().objects.get(&id).cloned()
    }

    /// Creates an object immediately, bypassing the command queue.
    pub fn insert(
        &self,
        kind: ObjectKind,
        parent: ObjectId,
        name: &str,
    ) -> ServerResult<ObjectRecord> {
        let mut state = self.state.write();
        check_parent(&state, kind, parent)?;
        state.create(kind, parent, name)
    }

    /// Validates a command and queues it.
    ///
    /// The command becomes visible after `apply_after_polls` listing
    /// requests; with zero it is applied before this returns.
    pub fn enqueue(&self, request: CommandRequest, apply_after_polls: u32) -> ServerResult<()> {
        let mut state = self.state.write();
        validate(&state, &request)?;

        if apply_after_polls == 0 {
            self.apply(&mut state, &request)?;
        } else {
            state.pending.push_back(PendingCommand {
                request,
                remaining_polls: apply_after_polls,
            });
        }
        Ok(())
    }

    /// Lists objects, first applying any commands whose latency has elapsed.
    pub fn list(&self, request: &ListRequest) -> Vec<ObjectRecord> {
        let mut state = self.state.write();
        self.advance(&mut state);

        match request.kind {
            ObjectKind::NotificationTrigger => list_triggers(&state, request.scope),
            kind => state
                .objects
                .values()
                .filter(|r| r.kind == kind && r.id != ROOT_ID && request.scope.matches(r))
                .cloned()
                .collect(),
        }
    }

    /// Applies every pending command regardless of latency.
    pub fn flush(&self) {
        let mut state = self.state.write();
        while let Some(pending) = state.pending.pop_front() {
            self.apply_or_drop(&mut state, &pending.request);
        }
    }

    fn advance(&self, state: &mut StoreState) {
        let mut waiting = VecDeque::with_capacity(state.pending.len());
        while let Some(mut pending) = state.pending.pop_front() {
            if pending.remaining_polls == 0 {
                self.apply_or_drop(state, &pending.request);
            } else {
                pending.remaining_polls -= 1;
                waiting.push_back(pending);
            }
        }
        state.pending = waiting;
    }

    /// Applies a command accepted earlier. The server has already
    /// acknowledged it, so a failure here can only be logged.
    fn apply_or_drop(&self, state: &mut StoreState, request: &CommandRequest) {
        if let Err(e) = self.apply(state, request) {
            warn!(target = %request.target, error = %e, "dropped accepted command");
        }
    }

    fn apply(&self, state: &mut StoreState, request: &CommandRequest) -> ServerResult<()> {
        let target = request.target;
        match &request.command {
            CreateCommand::AddDevice(p) => {
                state.create(ObjectKind::Device, target, &p.name)?;
            }
            CreateCommand::AddGroup(p) => {
                state.create(ObjectKind::Group, target, &p.name)?;
            }
            CreateCommand::AddSensor(p) if p.targets.is_empty() => {
                state.create(ObjectKind::Sensor, target, &p.name)?;
            }
            CreateCommand::AddSensor(p) => {
                for item in &p.targets {
                    let name = format!("{}{}", self.generated_name_prefix, item);
                    state.create(ObjectKind::Sensor, target, &name)?;
                }
            }
            CreateCommand::AddTrigger(p) => {
                state.create(ObjectKind::NotificationTrigger, target, p.trigger_type.label())?;
            }
        }
        debug!(target = %target, kind = %request.command.kind(), "applied command");
        Ok(())
    }
}

impl StoreState {
    fn create(
        &mut self,
        kind: ObjectKind,
        parent: ObjectId,
        name: &str,
    ) -> ServerResult<ObjectRecord> {
        if kind == ObjectKind::NotificationTrigger {
            let sub_id = self
                .triggers
                .iter()
                .filter(|t| t.parent_id == Some(parent))
                .map(|t| t.id.as_u32())
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or(ServerError::IdsExhausted)?;
            let record = ObjectRecord::new(ObjectId(sub_id), Some(parent), name, kind);
            self.triggers.push(record.clone());
            return Ok(record);
        }

        let id = self.next_id.ok_or(ServerError::IdsExhausted)?;
        self.next_id = id.checked_add(1);
        let record = ObjectRecord::new(ObjectId(id), Some(parent), name, kind);
        self.objects.insert(record.id, record.clone());
        Ok(record)
    }

    /// Returns true if `count` more object ids can be handed out.
    fn has_ids_for(&self, count: usize) -> bool {
        let Some(next) = self.next_id else {
            return count == 0;
        };
        u64::from(next) + count as u64 <= u64::from(u32::MAX) + 1
    }

    /// Ancestors of an object, nearest first, including the object itself.
    fn lineage(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut lineage = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if lineage.contains(&id) {
                break;
            }
            lineage.push(id);
            current = self.objects.get(&id).and_then(|r| r.parent_id);
        }
        lineage
    }
}

fn list_triggers(state: &StoreState, scope: Scope) -> Vec<ObjectRecord> {
    match scope {
        Scope::Global => state.triggers.clone(),
        Scope::Parent(owner) => state
            .triggers
            .iter()
            .filter(|t| t.parent_id == Some(owner))
            .cloned()
            .collect(),
        // Own triggers plus everything inherited from the ancestors.
        Scope::Owner(owner) => {
            let lineage = state.lineage(owner);
            state
                .triggers
                .iter()
                .filter(|t| t.parent_id.is_some_and(|p| lineage.contains(&p)))
                .cloned()
                .collect()
        }
    }
}

fn check_parent(state: &StoreState, kind: ObjectKind, parent: ObjectId) -> ServerResult<()> {
    let parent_kind = state
        .objects
        .get(&parent)
        .map(|r| r.kind)
        .ok_or(ServerError::UnknownObject(parent))?;

    let allowed = match kind {
        ObjectKind::Device | ObjectKind::Group => parent_kind == ObjectKind::Group,
        ObjectKind::Sensor => parent_kind == ObjectKind::Device,
        ObjectKind::NotificationTrigger => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(ServerError::InvalidParent {
            kind,
            parent,
            parent_kind,
        })
    }
}

fn validate(state: &StoreState, request: &CommandRequest) -> ServerResult<()> {
    check_parent(state, request.command.kind(), request.target)?;

    let needed = match &request.command {
        CreateCommand::AddSensor(p) => p.expected_count(),
        CreateCommand::AddTrigger(_) => 0,
        CreateCommand::AddDevice(_) | CreateCommand::AddGroup(_) => 1,
    };
    if !state.has_ids_for(needed) {
        return Err(ServerError::IdsExhausted);
    }

    match &request.command {
        CreateCommand::AddDevice(p) => {
            require("Name", &p.name)?;
            require("Host", &p.host)
        }
        CreateCommand::AddGroup(p) => require("Name", &p.name),
        CreateCommand::AddSensor(p) => {
            require("SensorType", &p.sensor_type)?;
            if p.targets.is_empty() {
                require("Name", &p.name)
            } else {
                Ok(())
            }
        }
        CreateCommand::AddTrigger(_) => Ok(()),
    }
}

fn require(property: &'static str, value: &str) -> ServerResult<()> {
    if value.trim().is_empty() {
        Err(ServerError::MissingProperty(property))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_protocol::{
        NewDeviceParameters, NewGroupParameters, NewSensorParameters, TriggerParameters,
        TriggerType,
    };

    fn store() -> ObjectStore {
        ObjectStore::new("Root", 1001, " ")
    }

    fn add_device(target: u32, name: &str) -> CommandRequest {
        CommandRequest::new(
            ObjectId(target),
            CreateCommand::AddDevice(NewDeviceParameters::new(name, "127.0.0.1")),
        )
    }

    fn devices_of(parent: u32) -> ListRequest {
        ListRequest::new(ObjectKind::Device, Scope::Parent(ObjectId(parent)))
    }

    #[test]
    fn new_store_holds_root() {
        let store = store();
        assert!(store.is_empty());
        assert_eq!(store.get(ROOT_ID).unwrap().name, "Root");
    }

    #[test]
    fn insert_allocates_sequential_ids() {
        let store = store();
        let group = store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        let device = store.insert(ObjectKind::Device, group.id, "dc-1").unwrap();

        assert_eq!(group.id, ObjectId(1001));
        assert_eq!(device.id, ObjectId(1002));
        assert_eq!(device.parent_id, Some(group.id));
    }

    #[test]
    fn immediate_apply() {
        let store = store();
        store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        store.enqueue(add_device(1001, "dc-1"), 0).unwrap();

        assert_eq!(store.pending_len(), 0);
        let devices = store.list(&devices_of(1001));
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "dc-1");
    }

    #[test]
    fn delayed_apply_hides_object_for_n_polls() {
        let store = store();
        store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        store.enqueue(add_device(1001, "dc-1"), 2).unwrap();

        assert!(store.list(&devices_of(1001)).is_empty());
        assert!(store.list(&devices_of(1001)).is_empty());
        assert_eq!(store.list(&devices_of(1001)).len(), 1);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn flush_applies_everything() {
        let store = store();
        store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        store.enqueue(add_device(1001, "a"), 100).unwrap();
        store.enqueue(add_device(1001, "b"), 100).unwrap();
        store.flush();
        assert_eq!(store.list(&devices_of(1001)).len(), 2);
    }

    #[test]
    fn validation_rejects_bad_commands() {
        let store = store();
        let group = store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();

        assert!(matches!(
            store.enqueue(add_device(42, "dc-1"), 0),
            Err(ServerError::UnknownObject(ObjectId(42)))
        ));
        assert!(matches!(
            store.enqueue(add_device(group.id.as_u32(), "  "), 0),
            Err(ServerError::MissingProperty("Name"))
        ));

        let sensor_on_group = CommandRequest::new(
            group.id,
            CreateCommand::AddSensor(NewSensorParameters::new("Ping", "ping")),
        );
        assert!(matches!(
            store.enqueue(sensor_on_group, 0),
            Err(ServerError::InvalidParent { .. })
        ));
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn template_sensors_get_prefixed_names() {
        let store = store();
        let group = store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        let device = store.insert(ObjectKind::Device, group.id, "dc-1").unwrap();

        let params = NewSensorParameters::new("Service", "wmiservice")
            .with_target("Spooler")
            .with_target("W32Time");
        store
            .enqueue(
                CommandRequest::new(device.id, CreateCommand::AddSensor(params)),
                0,
            )
            .unwrap();

        let sensors =
            store.list(&ListRequest::new(ObjectKind::Sensor, Scope::Parent(device.id)));
        let names: Vec<_> = sensors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![" Spooler", " W32Time"]);
    }

    #[test]
    fn triggers_are_numbered_per_owner_and_inherited() {
        let store = store();
        let group = store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        let device = store.insert(ObjectKind::Device, group.id, "dc-1").unwrap();

        let trigger = |owner: ObjectId| {
            CommandRequest::new(
                owner,
                CreateCommand::AddTrigger(TriggerParameters::new(TriggerType::State)),
            )
        };
        store.enqueue(trigger(group.id), 0).unwrap();
        store.enqueue(trigger(device.id), 0).unwrap();

        let listed = store.list(&ListRequest::new(
            ObjectKind::NotificationTrigger,
            Scope::Owner(device.id),
        ));
        assert_eq!(listed.len(), 2);
        // both owners numbered their first trigger 1
        assert!(listed.iter().all(|t| t.id == ObjectId(1)));
        assert!(listed.iter().any(|t| t.parent_id == Some(group.id)));
        assert!(listed.iter().any(|t| t.parent_id == Some(device.id)));

        let direct = store.list(&ListRequest::new(
            ObjectKind::NotificationTrigger,
            Scope::Parent(device.id),
        ));
        assert_eq!(direct.len(), 1);
    }

    #[test]
    fn last_id_is_handed_out_once() {
        let store = ObjectStore::new("Root", u32::MAX, " ");
        let group = store.insert(ObjectKind::Group, ROOT_ID, "Last").unwrap();
        assert_eq!(group.id, ObjectId(u32::MAX));

        assert!(matches!(
            store.insert(ObjectKind::Group, ROOT_ID, "Overflow"),
            Err(ServerError::IdsExhausted)
        ));
        assert!(matches!(
            store.enqueue(add_device(u32::MAX, "dc-1"), 0),
            Err(ServerError::IdsExhausted)
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn template_needing_more_ids_than_left_is_rejected() {
        let store = ObjectStore::new("Root", u32::MAX - 2, " ");
        let group = store.insert(ObjectKind::Group, ROOT_ID, "Servers").unwrap();
        let device = store.insert(ObjectKind::Device, group.id, "dc-1").unwrap();

        let params = NewSensorParameters::new("Disk", "wmivolume")
            .with_target("C:")
            .with_target("D:");
        assert!(matches!(
            store.enqueue(
                CommandRequest::new(device.id, CreateCommand::AddSensor(params)),
                0
            ),
            Err(ServerError::IdsExhausted)
        ));

        let single = NewSensorParameters::new("Ping", "ping");
        store
            .enqueue(
                CommandRequest::new(device.id, CreateCommand::AddSensor(single)),
                0,
            )
            .unwrap();
        assert_eq!(store.get(ObjectId(u32::MAX)).map(|r| r.name), Some("Ping".to_string()));
    }

    #[test]
    fn groups_listing_excludes_root() {
        let store = store();
        store
            .enqueue(
                CommandRequest::new(ROOT_ID, CreateCommand::AddGroup(NewGroupParameters::new("A"))),
                0,
            )
            .unwrap();
        let groups = store.list(&ListRequest::new(ObjectKind::Group, Scope::Global));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "A");
    }
}
