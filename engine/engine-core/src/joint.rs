//! Joint state of every vehicle at one instant.

use crate::kinematics::State;
use crate::vehicle::VehicleId;
use serde::{Deserialize, Serialize};

/// Ordered states of all vehicles plus the simulation time.
///
/// Index `i` holds the state of vehicle `i`. `parked[i]` is set once vehicle
/// `i` has reached its goal; parked vehicles keep their state from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub states: Vec<State>,
    pub time: f64,
    pub parked: Vec<bool>,
}

impl JointState {
    pub fn new(states: Vec<State>, time: f64) -> Self {
        let parked = vec![false; states.len()];
        Self {
            states,
            time,
            parked,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn state(&self, id: VehicleId) -> &State {
        &self.states[id]
    }

    #[inline]
    pub fn is_parked(&self, id: VehicleId) -> bool {
        self.parked.get(id).copied().unwrap_or(false)
    }

    /// True when every vehicle has reached its goal.
    pub fn all_parked(&self) -> bool {
        self.parked.iter().all(|&p| p)
    }
}
