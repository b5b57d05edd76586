//! proptest strategies for analysis states

use cfa_model::{
    AnalysisState, ConstraintId, Domain, FieldValue, Goal, GoalId, GoalRole, SearchConstraint,
    TypeRef,
};
use proptest::prelude::*;

fn primitive_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<bool>().prop_map(FieldValue::Boolean),
        (-1.0e6..1.0e6f64).prop_map(FieldValue::Number),
        "[a-z]{0,6}".prop_map(FieldValue::Text),
    ]
}

fn role() -> impl Strategy<Value = GoalRole> {
    prop_oneof![
        Just(GoalRole::Original),
        Just(GoalRole::Fixed),
        Just(GoalRole::Floating),
        Just(GoalRole::Unsupported),
    ]
}

/// Goals over primitive values, with an edited or untouched working value
pub fn goal_strategy() -> impl Strategy<Value = Goal> {
    (
        "[a-z]{1,8}",
        primitive_value(),
        proptest::option::of(primitive_value()),
        role(),
    )
        .prop_map(|(name, original, edited, role)| {
            let mut goal = Goal::new(format!("goal-{name}"), name, original).with_role(role);
            if let Some(value) = edited.filter(|v| v.kind() == goal.type_ref) {
                goal.value = value;
            }
            goal
        })
}

fn domain_for(type_ref: TypeRef) -> BoxedStrategy<Option<Domain>> {
    match type_ref {
        TypeRef::Number => proptest::option::of(
            (-1000.0..1000.0f64, 1.0..500.0f64).prop_map(|(lo, width)| Domain::range(lo, lo + width)),
        )
        .boxed(),
        TypeRef::String => proptest::option::of(
            proptest::collection::vec("[a-z]{0,4}", 1..4).prop_map(Domain::categorical),
        )
        .boxed(),
        TypeRef::Boolean | TypeRef::Structured => Just(None).boxed(),
    }
}

/// Constraints of every kind, fixed or varying, with or without a domain
pub fn constraint_strategy() -> impl Strategy<Value = SearchConstraint> {
    let value = prop_oneof![
        4 => primitive_value(),
        1 => Just(FieldValue::Structured(serde_json::json!({"nested": true}))),
    ];

    ("[A-Z][a-z]{0,6}", value, any::<bool>())
        .prop_flat_map(|(name, value, fixed)| {
            let type_ref = value.kind();
            (Just(name), Just(value), Just(fixed), domain_for(type_ref))
        })
        .prop_map(|(name, value, fixed, domain)| {
            let mut constraint = SearchConstraint::new(name, value);
            constraint.id = ConstraintId::new();
            if !fixed && !constraint.is_unsupported {
                constraint.is_fixed = false;
            }
            constraint.domain = domain;
            constraint
        })
}

/// Whole analysis states with unique goal ids
pub fn state_strategy() -> impl Strategy<Value = AnalysisState> {
    (
        proptest::collection::vec(goal_strategy(), 0..4),
        proptest::collection::vec(constraint_strategy(), 0..6),
    )
        .prop_map(|(goals, constraints)| {
            let goals = goals
                .into_iter()
                .enumerate()
                .map(|(i, mut goal)| {
                    goal.id = GoalId::new(format!("g{i}"));
                    goal
                })
                .collect();
            AnalysisState::new(goals, constraints)
        })
}
