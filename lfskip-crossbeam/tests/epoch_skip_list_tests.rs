use lfskip_core::common_tests::skip_list_core_tests::*;
use lfskip_core::common_tests::skip_list_stress_tests::*;
use lfskip_crossbeam::EpochGuard;
use rstest::rstest;
use serial_test::serial;

#[rstest]
#[case::flat(1)]
#[case::default_height(16)]
fn test_basic(#[case] max_level: usize) {
    test_basic_operations::<EpochGuard>(max_level);
}

#[test]
fn test_scenario() {
    test_documented_scenario::<EpochGuard>();
}

#[test]
fn test_sequential() {
    test_sequential_operations::<EpochGuard>();
}

#[test]
fn test_delete_missing() {
    test_delete_absent::<EpochGuard>();
}

#[test]
fn test_empty() {
    test_is_empty::<EpochGuard>();
}

#[test]
fn test_guarded_reads() {
    test_get_ref_and_apply::<EpochGuard>();
}

#[test]
#[serial]
fn test_concurrent() {
    test_concurrent_inserts::<EpochGuard>();
}

#[test]
#[serial]
fn test_concurrent_mixed() {
    test_concurrent_mixed_operations::<EpochGuard>();
}

#[test]
#[serial]
fn test_same_key_set() {
    test_concurrent_same_key_set::<EpochGuard>();
}

#[test]
#[serial]
fn test_same_key_delete() {
    test_concurrent_same_key_delete::<EpochGuard>();
}

#[test]
#[serial]
fn test_deletes_unlink_all_levels() {
    test_concurrent_deletes_unlink_all_levels::<EpochGuard>();
}

#[rstest]
#[serial(stress_tests)]
#[case::shallow(4)]
#[case::default_height(16)]
fn stress_find_during_modifications(#[case] max_level: usize) {
    test_find_during_modifications::<EpochGuard>(max_level);
}

#[test]
#[serial(stress_tests)]
fn stress_memory_ordering() {
    test_memory_ordering::<EpochGuard>();
}

#[test]
#[serial(stress_tests)]
fn stress_concurrent_delete_same_key() {
    test_concurrent_delete_same_key::<EpochGuard>();
}

#[rstest]
#[serial(stress_tests)]
#[case::flat(1)]
#[case::default_height(16)]
fn stress_linearizability(#[case] max_level: usize) {
    test_linearizability::<EpochGuard>(max_level);
}

#[test]
#[serial(stress_tests)]
fn stress_progress_guarantee() {
    test_progress_guarantee::<EpochGuard>();
}

#[test]
#[serial(stress_tests)]
fn stress_extreme_contention_single_key() {
    test_extreme_contention_single_key::<EpochGuard>();
}

#[test]
#[serial(stress_tests)]
fn stress_bounded_set() {
    test_bounded_set_under_contention::<EpochGuard>();
}

#[test]
#[serial(stress_tests)]
fn stress_bounded_set_gives_up() {
    test_bounded_set_gives_up::<EpochGuard>();
}
