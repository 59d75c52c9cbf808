#![allow(dead_code)]

/// Rolls a constraint mask one slot to the left: the slot that just elapsed
/// falls off, a fresh unblocked slot is appended at the tail.
pub fn roll_left(mask: &mut Vec<bool>) {
    if mask.is_empty() {
        return;
    }
    mask.remove(0);
    mask.push(false);
}

/// Resamples a price series given at `src_resolution_s` into `slot_count`
/// slots of `dst_resolution_s`, by length-weighted averaging across slot
/// boundaries.
pub fn resample_price(src: &[f64], src_resolution_s: u32, slot_count: usize, dst_resolution_s: u32) -> Vec<f64> {
    if src.is_empty() || src_resolution_s == 0 || dst_resolution_s == 0 {
        return vec![0.0; slot_count];
    }
    let src_res = src_resolution_s as f64;
    let dst_res = dst_resolution_s as f64;
    let src_total = src.len() as f64 * src_res;

    let mut out = Vec::with_capacity(slot_count);
    for slot in 0..slot_count {
        let dst_start = slot as f64 * dst_res;
        let dst_end = dst_start + dst_res;
        if dst_start >= src_total {
            out.push(*src.last().unwrap());
            continue;
        }
        let mut weighted_sum = 0.0;
        let mut covered = 0.0;
        let mut cursor = dst_start;
        while cursor < dst_end && cursor < src_total {
            let src_idx = (cursor / src_res) as usize;
            let src_idx = src_idx.min(src.len() - 1);
            let src_slot_end = ((src_idx + 1) as f64) * src_res;
            let segment_end = dst_end.min(src_slot_end).min(src_total);
            let weight = segment_end - cursor;
            weighted_sum += src[src_idx] * weight;
            covered += weight;
            cursor = segment_end;
        }
        out.push(if covered > 0.0 {
            weighted_sum / covered
        } else {
            *src.last().unwrap()
        });
    }
    out
}

/// Tiles `demand_events` (seconds-since-midnight) across the horizon
/// starting at `current_time` (absolute seconds) and buckets each
/// occurrence into its slot.
///
/// Only the next `max_events` occurrences (chronologically, from now) are
/// counted — there is no point demanding more battery-exchange events than
/// there are batteries in the system to ever satisfy them, and an unbounded
/// count would make the schedule permanently infeasible whenever the fleet
/// is smaller than the forecast's event rate.
pub fn build_demand_per_slot(
    demand_events_sec: &[i64],
    current_time: i64,
    slot_count: usize,
    resolution_s: u32,
    max_events: usize,
) -> Vec<i64> {
    let mut per_slot = vec![0i64; slot_count];
    if demand_events_sec.is_empty() || resolution_s == 0 || max_events == 0 {
        return per_slot;
    }
    const DAY_SECS: i64 = 86_400;
    let res = resolution_s as i64;
    let horizon_end = current_time + slot_count as i64 * res;

    let start_day = current_time.div_euclid(DAY_SECS);
    let end_day = horizon_end.div_euclid(DAY_SECS) + 1;

    let mut occurrences: Vec<i64> = Vec::new();
    for day in start_day..=end_day {
        for &event in demand_events_sec {
            let t = day * DAY_SECS + event;
            if t >= current_time && t < horizon_end {
                occurrences.push(t);
            }
        }
    }
    occurrences.sort_unstable();
    occurrences.truncate(max_events);

    for t in occurrences {
        let slot = ((t - current_time) / res) as usize;
        if slot < slot_count {
            per_slot[slot] += 1;
        }
    }
    per_slot
}

/// Converts per-slot demand counts into the running net-demand target,
/// offset by batteries already available (finished + reserved in requests).
pub fn cumulative_demand(per_slot: &[i64], already_available: i64) -> Vec<i64> {
    let mut acc = -already_available;
    per_slot
        .iter()
        .map(|&count| {
            acc += count;
            acc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_left_shifts_and_appends_false() {
        let mut mask = vec![true, true, false];
        roll_left(&mut mask);
        assert_eq!(mask, vec![true, false, false]);
    }

    #[test]
    fn resample_constant_profile_round_trips() {
        let src = vec![10.0; 24];
        let out = resample_price(&src, 3600, 24 * 60, 60);
        assert!(out.iter().all(|&p| (p - 10.0).abs() < 1e-9));
    }

    #[test]
    fn resample_averages_across_boundary() {
        // one coarse slot of 2h split into two 1h destination slots, values differ
        let src = vec![0.0, 20.0];
        let out = resample_price(&src, 7200, 2, 7200);
        assert_eq!(out, vec![0.0, 20.0]);
    }

    #[test]
    fn cumulative_demand_nets_available_supply() {
        let per_slot = vec![1, 0, 1];
        let cum = cumulative_demand(&per_slot, 1);
        assert_eq!(cum, vec![0, 0, 1]);
    }

    #[test]
    fn demand_per_slot_bins_events_relative_to_now() {
        let events = vec![0, 3600, 7200];
        let per_slot = build_demand_per_slot(&events, 1800, 10, 3600, 10);
        // slot 0 covers [1800, 5400): only the 3600 occurrence falls inside.
        assert_eq!(per_slot[0], 1);
    }

    #[test]
    fn demand_per_slot_caps_at_max_events() {
        let events = vec![0, 3600, 7200, 10800];
        let per_slot = build_demand_per_slot(&events, 0, 4, 3600, 2);
        assert_eq!(per_slot.iter().sum::<i64>(), 2);
    }
}
