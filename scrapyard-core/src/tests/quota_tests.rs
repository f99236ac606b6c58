use super::*;

#[test]
fn test_budget_from_raw() {
    assert_eq!(Budget::from_raw(-1), Budget::Unlimited);
    assert_eq!(Budget::from_raw(0), Budget::Remaining(0));
    assert_eq!(Budget::from_raw(250), Budget::Remaining(250));
    assert_eq!(Budget::from_raw(-7), Budget::Remaining(0));
}

#[test]
fn test_budget_raw_round_trip_for_unlimited() {
    assert_eq!(Budget::Unlimited.as_raw(), -1);
    assert_eq!(Budget::Remaining(3).as_raw(), 3);
}

#[test]
fn test_consume_saturates_at_zero() {
    let mut budget = Budget::Remaining(2);
    budget.consume(1);
    assert_eq!(budget, Budget::Remaining(1));
    budget.consume(5);
    assert!(budget.is_exhausted());
}

#[test]
fn test_unlimited_never_exhausts() {
    let mut budget = Budget::Unlimited;
    budget.consume(u32::MAX);
    assert!(!budget.is_exhausted());
}

#[test]
fn test_quota_exhausted_by_either_counter() {
    let mut quota = QuotaState::unlimited();
    assert!(!quota.is_exhausted());

    quota.errors = Budget::Remaining(0);
    assert!(quota.is_exhausted());

    let quota = QuotaState::exhausted();
    assert!(quota.is_exhausted());
}
