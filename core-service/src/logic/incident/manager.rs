use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::types::{
    Incident, IncidentFilter, IncidentStats, IncidentStatus, ListOrder, NewIncident, Priority,
};
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::threat::ThreatAnalysis;

/// Store entry. `seq` breaks ties between incidents created in the same instant.
struct Slot {
    seq: u64,
    incident: Mutex<Incident>,
}

/// In-memory incident store.
///
/// Map is behind an `RwLock`, each incident behind its own `Mutex`:
/// mutations of one incident are serialized, different incidents never contend.
pub struct IncidentStore {
    incidents: RwLock<HashMap<Uuid, Arc<Slot>>>,
    next_seq: AtomicU64,
    default_priority: Priority,
}

impl IncidentStore {
    pub fn new(default_priority: Priority) -> Self {
        Self {
            incidents: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            default_priority,
        }
    }

    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    fn slot(&self, id: Uuid) -> EngineResult<Arc<Slot>> {
        self.incidents
            .read()
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound(id))
    }

    /// Run `f` while holding the incident's lock, return a snapshot
    pub(crate) fn update<F>(&self, id: Uuid, f: F) -> EngineResult<Incident>
    where
        F: FnOnce(&mut Incident) -> EngineResult<()>,
    {
        let slot = self.slot(id)?;
        let mut incident = slot.incident.lock();
        f(&mut incident)?;
        Ok(incident.clone())
    }

    pub fn create(&self, req: NewIncident) -> EngineResult<Incident> {
        let incident = Incident::new(req, self.default_priority)?;
        let snapshot = incident.clone();
        let slot = Arc::new(Slot {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            incident: Mutex::new(incident),
        });
        self.incidents.write().insert(snapshot.id, slot);

        log::info!(
            "Incident created: {} [{} / {}] '{}'",
            snapshot.id, snapshot.category, snapshot.priority, snapshot.title
        );
        Ok(snapshot)
    }

    pub fn get(&self, id: Uuid) -> EngineResult<Incident> {
        let slot = self.slot(id)?;
        let incident = slot.incident.lock().clone();
        Ok(incident)
    }

    /// Replace the analysis wholesale. Status is left alone.
    pub fn attach_analysis(&self, id: Uuid, analysis: ThreatAnalysis) -> EngineResult<Incident> {
        let incident = self.update(id, |inc| {
            inc.set_analysis(analysis);
            Ok(())
        })?;
        log::info!("Analysis attached to incident {}", id);
        Ok(incident)
    }

    pub fn transition(&self, id: Uuid, new_status: IncidentStatus) -> EngineResult<Incident> {
        self.transition_as(id, new_status, "analyst")
    }

    pub fn transition_as(
        &self,
        id: Uuid,
        new_status: IncidentStatus,
        actor: &str,
    ) -> EngineResult<Incident> {
        let result = self.update(id, |inc| inc.transition(new_status, actor));
        match &result {
            Ok(inc) => log::info!("Incident {} -> {}", id, inc.status),
            Err(e) => log::warn!("Incident {} transition rejected: {}", id, e),
        }
        result
    }

    pub fn append_evidence(
        &self,
        id: Uuid,
        refs: Vec<String>,
        actor: &str,
    ) -> EngineResult<Incident> {
        self.update(id, |inc| {
            inc.append_evidence(refs, actor);
            Ok(())
        })
    }

    pub fn assign(&self, id: Uuid, analyst: &str) -> EngineResult<Incident> {
        let analyst = analyst.trim();
        if analyst.is_empty() {
            return Err(EngineError::invalid_config("assignee must not be empty"));
        }
        self.update(id, |inc| {
            inc.assignee = Some(analyst.to_string());
            inc.record(format!("Incident assigned to {}", analyst), "system");
            Ok(())
        })
    }

    /// Filtered snapshot, newest first unless the filter asks otherwise
    pub fn list(&self, filter: &IncidentFilter) -> Vec<Incident> {
        let slots: Vec<Arc<Slot>> = self.incidents.read().values().cloned().collect();

        let mut list: Vec<(u64, Incident)> = slots
            .iter()
            .map(|slot| (slot.seq, slot.incident.lock().clone()))
            .filter(|(_, inc)| filter.matches(inc))
            .collect();

        list.sort_by(|(sa, a), (sb, b)| a.created_at.cmp(&b.created_at).then(sa.cmp(sb)));
        if filter.order == ListOrder::NewestFirst {
            list.reverse();
        }
        list.into_iter().map(|(_, inc)| inc).collect()
    }

    pub fn stats(&self) -> IncidentStats {
        let slots: Vec<Arc<Slot>> = self.incidents.read().values().cloned().collect();
        let mut stats = IncidentStats::default();
        for slot in slots {
            stats.add(&slot.incident.lock());
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.incidents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IncidentStore {
    fn default() -> Self {
        Self::new(Priority::Medium)
    }
}
