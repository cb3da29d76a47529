use payments_service::domain::payment::{
    plan_transition, ExternalStatus, PaymentStatus, TransitionPlan,
};

#[test]
fn maps_external_statuses_to_target_states() {
    assert_eq!(
        ExternalStatus::parse("succeeded").target().0,
        PaymentStatus::Success
    );
    assert_eq!(
        ExternalStatus::parse("processing").target().0,
        PaymentStatus::Processing
    );
    assert_eq!(
        ExternalStatus::parse("requires_action").target().0,
        PaymentStatus::Pending
    );
    assert_eq!(
        ExternalStatus::parse("requires_payment_method").target().0,
        PaymentStatus::Pending
    );
}

#[test]
fn recognized_statuses_carry_no_failure_reason() {
    for raw in ["succeeded", "processing", "requires_action", "requires_payment_method"] {
        assert!(ExternalStatus::parse(raw).target().1.is_none(), "{raw}");
    }
}

#[test]
fn unrecognized_status_maps_to_failed_with_literal_reason() {
    let (target, reason) = ExternalStatus::parse("canceled").target();
    assert_eq!(target, PaymentStatus::Failed);
    assert!(reason.unwrap().contains("canceled"));

    let (target, reason) = ExternalStatus::parse("failed").target();
    assert_eq!(target, PaymentStatus::Failed);
    assert!(reason.unwrap().contains("failed"));
}

#[test]
fn forward_transitions_apply() {
    let cases = [
        (PaymentStatus::Initiated, PaymentStatus::Processing),
        (PaymentStatus::Initiated, PaymentStatus::Pending),
        (PaymentStatus::Initiated, PaymentStatus::Success),
        (PaymentStatus::Initiated, PaymentStatus::Failed),
        (PaymentStatus::Processing, PaymentStatus::Success),
        (PaymentStatus::Processing, PaymentStatus::Failed),
        (PaymentStatus::Processing, PaymentStatus::Pending),
        (PaymentStatus::Pending, PaymentStatus::Success),
        (PaymentStatus::Pending, PaymentStatus::Failed),
        (PaymentStatus::Pending, PaymentStatus::Processing),
    ];

    for (current, target) in cases {
        assert_eq!(
            plan_transition(current, target),
            TransitionPlan::Apply(target),
            "{current:?} -> {target:?}"
        );
    }
}

#[test]
fn repeated_status_is_a_duplicate() {
    assert_eq!(
        plan_transition(PaymentStatus::Success, PaymentStatus::Success),
        TransitionPlan::Duplicate
    );
    assert_eq!(
        plan_transition(PaymentStatus::Failed, PaymentStatus::Failed),
        TransitionPlan::Duplicate
    );
    assert_eq!(
        plan_transition(PaymentStatus::Processing, PaymentStatus::Processing),
        TransitionPlan::Duplicate
    );
}

#[test]
fn terminal_states_reject_contradictions() {
    assert_eq!(
        plan_transition(PaymentStatus::Success, PaymentStatus::Failed),
        TransitionPlan::Conflict
    );
    assert_eq!(
        plan_transition(PaymentStatus::Failed, PaymentStatus::Success),
        TransitionPlan::Conflict
    );
    assert_eq!(
        plan_transition(PaymentStatus::Cancelled, PaymentStatus::Success),
        TransitionPlan::Conflict
    );
    assert_eq!(
        plan_transition(PaymentStatus::Success, PaymentStatus::Processing),
        TransitionPlan::Conflict
    );
}
