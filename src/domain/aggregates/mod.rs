//! Aggregates - Cluster of domain objects treated as a single unit

pub mod journey_circle_aggregate;

pub use journey_circle_aggregate::{
    ChildRecord, ChildRef, JourneyCircleAggregate, StepField, StepValue, WorkflowCheckpoint,
};
