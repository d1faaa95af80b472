//! Meter invariant checks.

/// The meter never exceeds the current allowance. It has no lower bound: the
/// first admitted slash may drive it far negative.
pub fn check_meter_bound(meter: i64, allowance: i64) -> bool {
    meter <= allowance
}

/// Panic if the meter exceeds the allowance. A violation means consensus
/// state is corrupt; aborting the block is the only safe response.
pub fn assert_meter_bound(meter: i64, allowance: i64) {
    if !check_meter_bound(meter, allowance) {
        panic!("slash meter invariant violated: meter {meter} exceeds allowance {allowance}");
    }
}
