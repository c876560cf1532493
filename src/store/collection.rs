use std::collections::BTreeMap;

use chrono::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::utils::clock::Clock;

use super::{
    checkin::{Checkin, CheckinFields, CheckinId},
    error::{StoreError, StoreResult},
    persist::CheckinStorage,
};

/// What happened to a record. Published to query subscribers after every
/// successful mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub id: CheckinId,
    pub kind: ChangeKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// The canonical owner of all check-in records. Mutations serialize on the
/// write lock, persist through [CheckinStorage], and announce themselves on a
/// broadcast channel once the data is durable. Everything handed out of this
/// struct is a clone, never a reference into the map.
pub struct CheckinCollection {
    storage: Box<dyn CheckinStorage>,
    clock: Box<dyn Clock>,
    records: RwLock<BTreeMap<CheckinId, Checkin>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl CheckinCollection {
    pub async fn open(
        storage: Box<dyn CheckinStorage>,
        clock: Box<dyn Clock>,
    ) -> StoreResult<Self> {
        let loaded = storage.load().await?;
        info!("Loaded {} check-ins", loaded.len());

        let mut records = BTreeMap::new();
        for checkin in loaded {
            records.insert(checkin.id.clone(), checkin);
        }
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            storage,
            clock,
            records: RwLock::new(records),
            changes,
        })
    }

    /// Validates `fields`, assigns identity and timestamps, and persists the
    /// new record. The returned id is only handed back once the data is
    /// durable and the change has been announced.
    pub async fn insert(&self, fields: CheckinFields) -> StoreResult<CheckinId> {
        fields.validate()?;

        let mut records = self.records.write().await;
        let now = self.clock.time();
        let id = CheckinId::generate();
        let checkin = Checkin {
            id: id.clone(),
            created: now,
            modified: now,
            duration: fields.duration,
            start_time: fields.start_time,
            record_date: fields.record_date,
            tag: fields.tag,
            activities: fields.activities,
        };
        records.insert(id.clone(), checkin);

        if let Err(e) = self.persist(&records).await {
            records.remove(&id);
            return Err(e);
        }
        drop(records);

        debug!("Inserted check-in {id}");
        self.publish(ChangeEvent {
            id: id.clone(),
            kind: ChangeKind::Inserted,
        });
        Ok(id)
    }

    /// Applies `patch` to a draft of the record's user-mutable fields,
    /// re-validates, and persists. `modified` always moves strictly forward,
    /// even against a clock that hasn't ticked.
    pub async fn update<F>(&self, id: &CheckinId, patch: F) -> StoreResult<()>
    where
        F: FnOnce(&mut CheckinFields),
    {
        let mut records = self.records.write().await;
        let previous = records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut draft = previous.fields();
        patch(&mut draft);
        draft.validate()?;

        let now = self.clock.time();
        let modified = if now > previous.modified {
            now
        } else {
            previous.modified + Duration::milliseconds(1)
        };
        let updated = Checkin {
            id: previous.id.clone(),
            created: previous.created,
            modified,
            duration: draft.duration,
            start_time: draft.start_time,
            record_date: draft.record_date,
            tag: draft.tag,
            activities: draft.activities,
        };
        records.insert(id.clone(), updated);

        if let Err(e) = self.persist(&records).await {
            // keep memory in step with disk
            records.insert(id.clone(), previous);
            return Err(e);
        }
        drop(records);

        debug!("Updated check-in {id}");
        self.publish(ChangeEvent {
            id: id.clone(),
            kind: ChangeKind::Updated,
        });
        Ok(())
    }

    /// Removes the record. Hard deletion: no tombstones, and deleting an
    /// already-gone id fails with [StoreError::NotFound].
    pub async fn delete(&self, id: &CheckinId) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let removed = records
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if let Err(e) = self.persist(&records).await {
            records.insert(id.clone(), removed);
            return Err(e);
        }
        drop(records);

        debug!("Deleted check-in {id}");
        self.publish(ChangeEvent {
            id: id.clone(),
            kind: ChangeKind::Deleted,
        });
        Ok(())
    }

    pub async fn get(&self, id: &CheckinId) -> Option<Checkin> {
        self.records.read().await.get(id).cloned()
    }

    /// A consistent copy of the whole record set. Queries evaluate against
    /// snapshots, never against the live map.
    pub async fn snapshot(&self) -> Vec<Checkin> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Subscribes to change notifications. Every successful mutation is
    /// delivered to every receiver subscribed at the time of the mutation.
    pub fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    async fn persist(&self, records: &BTreeMap<CheckinId, Checkin>) -> StoreResult<()> {
        let all: Vec<Checkin> = records.values().cloned().collect();
        self.storage.save(&all).await?;
        Ok(())
    }

    fn publish(&self, event: ChangeEvent) {
        // Err just means nobody is listening right now
        let _ = self.changes.send(event);
    }
}
