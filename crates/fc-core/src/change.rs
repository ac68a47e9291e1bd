//! Typed change records emitted by every graph mutation.
//!
//! View layers subscribe to these instead of polling the model, and update
//! only the entity and field that changed.

use crate::id::{ConnectorId, NodeId};
use crate::model::{Anchor, ArrowKind, Color, LineStyle, NodeStyle, ShapeKind};
use kurbo::{Point, Size};
use std::fmt;

/// The entity a change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Node(NodeId),
    Connector(ConnectorId),
}

/// Which part of the entity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The entity was added (`Absent → Present`) or removed (`Present → Absent`).
    Lifecycle,
    Position,
    Size,
    Text,
    Shape,
    Style,
    Selected,
    Label,
    Anchors,
    LineStyle,
    Arrows,
    Stroke,
}

/// Old or new value of a changed field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Present,
    Point(Point),
    Size(Size),
    Text(String),
    Shape(ShapeKind),
    Style(Box<NodeStyle>),
    Flag(bool),
    Label(Option<String>),
    Anchors(Anchor, Anchor),
    LineStyle(LineStyle),
    Arrows(ArrowKind, ArrowKind),
    Stroke(Color, f64),
}

/// One field of one entity changed from `old` to `new`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub entity: EntityId,
    pub field: Field,
    pub old: FieldValue,
    pub new: FieldValue,
}

impl ChangeRecord {
    pub fn added(entity: EntityId) -> Self {
        Self {
            entity,
            field: Field::Lifecycle,
            old: FieldValue::Absent,
            new: FieldValue::Present,
        }
    }

    pub fn removed(entity: EntityId) -> Self {
        Self {
            entity,
            field: Field::Lifecycle,
            old: FieldValue::Present,
            new: FieldValue::Absent,
        }
    }

    pub fn is_added(&self) -> bool {
        self.field == Field::Lifecycle && self.new == FieldValue::Present
    }

    pub fn is_removed(&self) -> bool {
        self.field == Field::Lifecycle && self.new == FieldValue::Absent
    }
}

/// Callback invoked for every change record.
pub type ChangeListener = Box<dyn FnMut(&ChangeRecord)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out of change records to registered listeners.
///
/// Listeners only ever see a shared reference to the record, so they cannot
/// reach back into the graph while a mutation is in progress.
#[derive(Default)]
pub struct Notifier {
    next_id: u64,
    listeners: Vec<(SubscriptionId, ChangeListener)>,
}

impl Notifier {
    pub fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, record: ChangeRecord) {
        log::trace!("change {:?}.{:?}", record.entity, record.field);
        for (_, listener) in &mut self.listeners {
            listener(&record);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
