use crate::models::{Alert, TriggerType};

/// Decides whether an alert fires against a newly observed price. Pure:
/// no I/O, no mutation.
///
/// `PercentageChange` compares against the alert's previously stored
/// price, i.e. the last poll, so the baseline re-bases every cycle
/// (change-since-last-check, not change-since-creation). A zero or
/// non-finite baseline never fires.
///
/// `VolumeSpike` is an unimplemented placeholder and never fires; the
/// oracle carries no volume data yet. Unknown or malformed inputs degrade
/// to "never fires" rather than failing the cycle.
pub fn should_trigger(alert: &Alert, new_price: f64) -> bool {
    if !new_price.is_finite() {
        return false;
    }

    match alert.trigger_type {
        TriggerType::PriceAbove => new_price > alert.trigger_value,
        TriggerType::PriceBelow => new_price < alert.trigger_value,
        TriggerType::PercentageChange => {
            let baseline = alert.current_price;
            if baseline == 0.0 || !baseline.is_finite() {
                return false;
            }
            let change_percent = (new_price - baseline) / baseline * 100.0;
            change_percent.abs() >= alert.trigger_value
        }
        TriggerType::VolumeSpike => false,
    }
}
