//! World model: map, fleet, lane routes and action table bundled for queries.
//!
//! `World` is immutable after construction and cheap to clone; every planner
//! thread holds its own handle.

use crate::geometry::{collides, Point, Rect};
use crate::joint::JointState;
use crate::kinematics::{apply, Action, ActionTable, State};
use crate::map::RoadMap;
use crate::route::{Route, HEADING_LOOKAHEAD};
use crate::vehicle::{VehicleId, VehicleParams};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct World {
    map: Arc<dyn RoadMap>,
    vehicles: Arc<[VehicleParams]>,
    /// Reference path of every vehicle, from its initial pose to its goal
    routes: Arc<[Route]>,
    actions: ActionTable,
}

impl World {
    /// Create a world from a map, the fleet and the action table.
    ///
    /// Vehicle ids are reassigned to their position in `vehicles`.
    pub fn new(map: Arc<dyn RoadMap>, vehicles: Vec<VehicleParams>, actions: ActionTable) -> Self {
        let vehicles: Vec<VehicleParams> = vehicles
            .into_iter()
            .enumerate()
            .map(|(id, mut v)| {
                v.id = id;
                v
            })
            .collect();
        let routes: Vec<Route> = vehicles
            .iter()
            .map(|v| map.route(&v.init_state, &v.target.position()))
            .collect();
        Self {
            map,
            vehicles: vehicles.into(),
            routes: routes.into(),
            actions,
        }
    }

    pub fn map(&self) -> &dyn RoadMap {
        self.map.as_ref()
    }

    pub fn vehicles(&self) -> &[VehicleParams] {
        &self.vehicles
    }

    #[inline]
    pub fn vehicle(&self, id: VehicleId) -> &VehicleParams {
        &self.vehicles[id]
    }

    #[inline]
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    #[inline]
    pub fn route(&self, id: VehicleId) -> &Route {
        &self.routes[id]
    }

    /// Distance left along the vehicle's route.
    #[inline]
    pub fn distance_to_goal(&self, id: VehicleId, state: &State) -> f64 {
        self.routes[id].remaining(&state.position())
    }

    /// Heading the vehicle should have at `state` to follow its route.
    #[inline]
    pub fn heading_reference(&self, id: VehicleId, state: &State) -> f64 {
        self.routes[id].heading_reference(&state.position(), HEADING_LOOKAHEAD)
    }

    /// Joint state at the start of a round. Vehicles that start inside their
    /// goal region are parked immediately.
    pub fn initial_joint_state(&self) -> JointState {
        let states: Vec<State> = self.vehicles.iter().map(|v| v.init_state).collect();
        let parked = states
            .iter()
            .enumerate()
            .map(|(id, state)| self.is_in_goal_region(id, state))
            .collect();
        JointState {
            states,
            time: 0.0,
            parked,
        }
    }

    #[inline]
    pub fn is_inside_drivable(&self, point: &Point) -> bool {
        self.map.is_drivable(point)
    }

    #[inline]
    pub fn is_in_goal_region(&self, id: VehicleId, state: &State) -> bool {
        self.vehicles[id].target.contains(state)
    }

    /// Goal test over one step: the end state or the travelled segment lies
    /// within the acceptance radius.
    pub fn passed_through_goal(&self, id: VehicleId, from: &State, to: &State) -> bool {
        let target = &self.vehicles[id].target;
        target.contains(to) || target.swept_by(from, to)
    }

    /// Footprint against forbidden blocks and the map boundary.
    #[inline]
    pub fn static_collision(&self, footprint: &Rect) -> bool {
        self.map.static_collision(footprint)
    }

    /// Apply `action` to a single vehicle for `dt` seconds.
    #[inline]
    pub fn advance(&self, id: VehicleId, state: &State, action: Action, dt: f64) -> State {
        let params = &self.vehicles[id];
        apply(state, self.actions.delta(action), dt, params.max_speed)
    }

    /// Advance every vehicle by one step.
    ///
    /// `actions[i]` is applied to vehicle `i`; parked vehicles keep their
    /// state. A vehicle whose step ends in or sweeps through its goal region
    /// becomes parked.
    pub fn step_joint(&self, joint: &JointState, actions: &[Action], dt: f64) -> JointState {
        debug_assert_eq!(actions.len(), joint.len());
        let mut next = joint.clone();
        for (id, &action) in actions.iter().enumerate() {
            if joint.parked[id] {
                continue;
            }
            let from = &joint.states[id];
            let to = self.advance(id, from, action, dt);
            next.parked[id] = self.passed_through_goal(id, from, &to);
            next.states[id] = to;
        }
        next.time = joint.time + dt;
        next
    }

    #[inline]
    pub fn footprint(&self, id: VehicleId, state: &State) -> Rect {
        self.vehicles[id].footprint(state)
    }

    /// Whether vehicle `id` overlaps any other vehicle.
    pub fn collides_with_others(&self, joint: &JointState, id: VehicleId) -> bool {
        if !joint.states[id].is_finite() {
            return false;
        }
        let own = self.footprint(id, &joint.states[id]);
        joint
            .states
            .iter()
            .enumerate()
            .filter(|&(other, s)| other != id && s.is_finite())
            .any(|(other, s)| collides(&own, &self.footprint(other, s)))
    }

    /// Numeric failure, static collision or contact with another vehicle.
    pub fn is_fatal(&self, joint: &JointState, id: VehicleId) -> bool {
        let state = &joint.states[id];
        !state.is_finite()
            || self.static_collision(&self.footprint(id, state))
            || self.collides_with_others(joint, id)
    }

    /// Every colliding pair `(i, j)` with `i < j`.
    pub fn pairwise_collisions(&self, joint: &JointState) -> Vec<(VehicleId, VehicleId)> {
        let footprints: Vec<Option<Rect>> = joint
            .states
            .iter()
            .enumerate()
            .map(|(id, s)| s.is_finite().then(|| self.footprint(id, s)))
            .collect();

        let mut pairs = Vec::new();
        for i in 0..footprints.len() {
            for j in (i + 1)..footprints.len() {
                if let (Some(a), Some(b)) = (&footprints[i], &footprints[j]) {
                    if collides(a, b) {
                        pairs.push((i, j));
                    }
                }
            }
        }
        pairs
    }

    /// Number of other vehicles whose body enters the safety rectangle of
    /// vehicle `id` without touching its body.
    pub fn near_misses(&self, joint: &JointState, id: VehicleId) -> usize {
        let state = &joint.states[id];
        if !state.is_finite() {
            return 0;
        }
        let params = &self.vehicles[id];
        let body = params.footprint(state);
        let safety = params.safety_footprint(state);
        joint
            .states
            .iter()
            .enumerate()
            .filter(|&(other, s)| other != id && s.is_finite())
            .filter(|&(other, s)| {
                let theirs = self.footprint(other, s);
                safety.overlaps(&theirs) && !body.overlaps(&theirs)
            })
            .count()
    }
}
