//! Circle projector - Three-ring drawing model for the renderer
//!
//! The outer ring holds problems, the middle ring the solution of the problem
//! in the same slot, and the center shows how many offers exist. Rings always
//! have at least `max_problems` slots; empty ones are placeholders so a
//! half-built circle can be drawn mid-workflow.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::aggregates::JourneyCircleAggregate;
use crate::domain::value_objects::{OfferId, ProblemId, SolutionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum RingSlot<T> {
    Filled(T),
    Placeholder { position: usize },
}

impl<T> RingSlot<T> {
    pub fn filled(&self) -> Option<&T> {
        match self {
            RingSlot::Filled(item) => Some(item),
            RingSlot::Placeholder { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingProblem {
    pub id: ProblemId,
    pub title: String,
    pub position: usize,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingSolution {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub title: String,
    pub offer_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircleProjection {
    pub outer_ring: Vec<RingSlot<RingProblem>>,
    pub middle_ring: Vec<RingSlot<RingSolution>>,
    pub center_count: usize,
}

pub fn project(circle: &JourneyCircleAggregate) -> CircleProjection {
    let problems = circle.problems();
    let ring_size = circle.max_problems().max(problems.len());

    let mut outer_ring = Vec::with_capacity(ring_size);
    let mut middle_ring = Vec::with_capacity(ring_size);

    for slot in 0..ring_size {
        match problems.get(slot) {
            Some(problem) => {
                outer_ring.push(RingSlot::Filled(RingProblem {
                    id: problem.id,
                    title: problem.title.clone(),
                    position: slot,
                    is_primary: problem.is_primary,
                }));
                match circle.solution_for(problem.id) {
                    Some(solution) => middle_ring.push(RingSlot::Filled(RingSolution {
                        id: solution.id,
                        problem_id: problem.id,
                        title: solution.title.clone(),
                        offer_count: circle.offers_for(solution.id).len(),
                    })),
                    None => middle_ring.push(RingSlot::Placeholder { position: slot }),
                }
            }
            None => {
                outer_ring.push(RingSlot::Placeholder { position: slot });
                middle_ring.push(RingSlot::Placeholder { position: slot });
            }
        }
    }

    let center_count = circle
        .solutions()
        .flat_map(|s| circle.offers_for(s.id))
        .map(|o| o.id)
        .collect::<HashSet<OfferId>>()
        .len();

    CircleProjection {
        outer_ring,
        middle_ring,
        center_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::journey_circle_aggregate::tests::{
        add_offer, add_problem, add_solution, aggregate,
    };

    #[test]
    fn test_empty_circle_projects_placeholders() {
        let projection = project(&aggregate());
        assert_eq!(projection.outer_ring.len(), 5);
        assert_eq!(projection.middle_ring.len(), 5);
        assert!(projection.outer_ring.iter().all(|s| s.filled().is_none()));
        assert_eq!(projection.center_count, 0);
    }

    #[test]
    fn test_rings_follow_problem_positions() {
        let mut circle = aggregate();
        let a = add_problem(&mut circle, "A");
        let b = add_problem(&mut circle, "B");
        let sb = add_solution(&mut circle, b, "SB");
        add_offer(&mut circle, sb, "O1");
        add_offer(&mut circle, sb, "O2");
        circle.move_problem(b, 0).unwrap();

        let projection = project(&circle);
        assert_eq!(projection.outer_ring[0].filled().unwrap().id, b);
        assert_eq!(projection.outer_ring[1].filled().unwrap().id, a);
        assert_eq!(projection.middle_ring[0].filled().unwrap().id, sb);
        assert_eq!(projection.middle_ring[0].filled().unwrap().offer_count, 2);
        assert_eq!(
            projection.middle_ring[1],
            RingSlot::Placeholder { position: 1 }
        );
        assert_eq!(
            projection.outer_ring[2],
            RingSlot::Placeholder { position: 2 }
        );
        assert_eq!(projection.center_count, 2);
    }

    #[test]
    fn test_projection_serializes_slot_tags() {
        let mut circle = aggregate();
        add_problem(&mut circle, "Only");
        let json = serde_json::to_value(project(&circle)).unwrap();
        assert_eq!(json["outer_ring"][0]["slot"], "filled");
        assert_eq!(json["outer_ring"][0]["title"], "Only");
        assert_eq!(json["outer_ring"][1]["slot"], "placeholder");
        assert_eq!(json["outer_ring"][1]["position"], 1);
    }
}
