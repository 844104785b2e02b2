use super::constants::CONTROLLER_SLOTS;
use super::error::CapacityError;
use super::types::{Controller, ControllerDescriptor, ControllerId};

/// One connection's local party: a fixed row of optional controller slots.
#[derive(Debug, Clone, Default)]
pub struct ControllerSet {
    slots: [Option<Controller>; CONTROLLER_SLOTS],
}

impl ControllerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a join roster. Entries past the slot capacity are
    /// dropped with a warning.
    pub fn from_roster(roster: Vec<Option<ControllerDescriptor>>) -> Self {
        let mut set = Self::new();
        for descriptor in roster.into_iter().flatten() {
            if let Err(error) = set.add_controller(Controller::from_descriptor(descriptor)) {
                tracing::warn!(%error, "join roster exceeds controller slots");
                break;
            }
        }
        set
    }

    /// Places the controller in the first empty slot and returns its slot index.
    pub fn add_controller(&mut self, controller: Controller) -> Result<usize, CapacityError> {
        let Some(index) = self.slots.iter().position(Option::is_none) else {
            return Err(CapacityError {
                capacity: CONTROLLER_SLOTS,
            });
        };
        self.slots[index] = Some(controller);
        Ok(index)
    }

    pub fn remove_controller(&mut self, id: ControllerId) -> Option<Controller> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|controller| controller.id == id))?;
        slot.take()
    }

    pub fn contains(&self, id: ControllerId) -> bool {
        self.iter().any(|controller| controller.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Controller> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
