//! Resolution requests, per-kind descriptors and outcomes.

use vigil_protocol::{CreateCommand, ObjectId, ObjectKind, ObjectRecord, Scope};

/// How many objects a creation is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one object; more than one candidate is an error.
    One,
    /// One or more objects, all of which are returned.
    Many,
}

/// How a kind relates to the object a creation command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The new object lives inside the target container.
    Container,
    /// The new object is attached to the target (notification triggers).
    Owner,
}

/// What the engine needs to know about a kind to resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Object kind.
    pub kind: ObjectKind,
    /// Relation to the command target.
    pub scope_kind: ScopeKind,
    /// Expected number of new objects.
    pub cardinality: Cardinality,
}

impl KindDescriptor {
    /// Returns the descriptor for a kind.
    pub fn of(kind: ObjectKind) -> Self {
        let (scope_kind, cardinality) = match kind {
            ObjectKind::Sensor => (ScopeKind::Container, Cardinality::Many),
            ObjectKind::Device | ObjectKind::Group => (ScopeKind::Container, Cardinality::One),
            ObjectKind::NotificationTrigger => (ScopeKind::Owner, Cardinality::One),
        };
        Self {
            kind,
            scope_kind,
            cardinality,
        }
    }

    /// Scope to list for a command aimed at `target`.
    pub fn scope_for(&self, target: ObjectId) -> Scope {
        match self.scope_kind {
            ScopeKind::Container => Scope::Parent(target),
            ScopeKind::Owner => Scope::Owner(target),
        }
    }
}

/// Everything needed to resolve the result of one creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// Kind being created.
    pub kind: ObjectKind,
    /// Scope the new object(s) will appear in.
    pub scope: Scope,
    /// Name the caller asked for. Logged and reported, never matched on.
    pub name_hint: Option<String>,
    /// When false, the command is sent and nothing is resolved.
    pub resolve: bool,
    /// Expected number of new objects.
    pub cardinality: Cardinality,
}

impl ResolutionRequest {
    /// Creates a request from a kind descriptor.
    pub fn new(descriptor: KindDescriptor, target: ObjectId, resolve: bool) -> Self {
        Self {
            kind: descriptor.kind,
            scope: descriptor.scope_for(target),
            name_hint: None,
            resolve,
            cardinality: descriptor.cardinality,
        }
    }

    /// Creates the request matching a creation command.
    pub fn for_command(target: ObjectId, command: &CreateCommand, resolve: bool) -> Self {
        let mut request = Self::new(KindDescriptor::of(command.kind()), target, resolve);
        request.name_hint = command.name_hint().map(str::to_string);
        request
    }

    /// Sets the name hint.
    pub fn with_name_hint(mut self, name: impl Into<String>) -> Self {
        self.name_hint = Some(name.into());
        self
    }

    /// Sets the cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }
}

/// Terminal result of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Exactly one object was created.
    Resolved(ObjectRecord),
    /// The objects created by a plural creation, ordered by id.
    ResolvedMany(Vec<ObjectRecord>),
    /// Several new objects where one was expected, ordered by id.
    Ambiguous(Vec<ObjectRecord>),
    /// Nothing new appeared within the attempt budget.
    TimedOut {
        /// Number of "after" listings taken.
        attempts: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_protocol::{NewDeviceParameters, NewSensorParameters, TriggerParameters, TriggerType};

    #[test]
    fn descriptors() {
        let sensor = KindDescriptor::of(ObjectKind::Sensor);
        assert_eq!(sensor.cardinality, Cardinality::Many);
        assert_eq!(sensor.scope_for(ObjectId(5)), Scope::Parent(ObjectId(5)));

        let trigger = KindDescriptor::of(ObjectKind::NotificationTrigger);
        assert_eq!(trigger.cardinality, Cardinality::One);
        assert_eq!(trigger.scope_for(ObjectId(5)), Scope::Owner(ObjectId(5)));

        for kind in [ObjectKind::Device, ObjectKind::Group] {
            let descriptor = KindDescriptor::of(kind);
            assert_eq!(descriptor.cardinality, Cardinality::One);
            assert_eq!(descriptor.scope_kind, ScopeKind::Container);
        }
    }

    #[test]
    fn request_for_command() {
        let command = CreateCommand::AddDevice(NewDeviceParameters::new("Probe Device2", "10.0.0.2"));
        let request = ResolutionRequest::for_command(ObjectId(1001), &command, true);

        assert_eq!(request.kind, ObjectKind::Device);
        assert_eq!(request.scope, Scope::Parent(ObjectId(1001)));
        assert_eq!(request.name_hint.as_deref(), Some("Probe Device2"));
        assert_eq!(request.cardinality, Cardinality::One);
        assert!(request.resolve);

        let command = CreateCommand::AddTrigger(TriggerParameters::new(TriggerType::State));
        let request = ResolutionRequest::for_command(ObjectId(1001), &command, false);
        assert_eq!(request.scope, Scope::Owner(ObjectId(1001)));
        assert!(request.name_hint.is_none());
        assert!(!request.resolve);

        let command = CreateCommand::AddSensor(NewSensorParameters::new("Ping", "ping"));
        let request = ResolutionRequest::for_command(ObjectId(2001), &command, true);
        assert_eq!(request.cardinality, Cardinality::Many);
    }
}
