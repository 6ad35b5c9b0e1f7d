use std::collections::BTreeMap;

use chrono::prelude::*;
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::Labels;
use crate::speedlog::SpeedLog;
use crate::stats::Spread;

/// The runs that fall in one weekday/hour slot (local time)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    /// 0 = Monday
    pub weekday: u32,
    pub hour: u32,
    pub label: String,
    pub download: Spread,
    pub upload: Spread,
    pub count: usize,
    #[serde(skip)]
    pub download_runs: Vec<f64>,
    #[serde(skip)]
    pub upload_runs: Vec<f64>,
}

/// Groups the log by weekday and hour in the given time zone.
/// Slots are ordered Monday to Sunday, then by hour; empty slots are left out.
pub fn weekday_hour_profile(speedlog: &SpeedLog, tz: Tz, labels: &Labels) -> Vec<Slot> {
    let mut groups: BTreeMap<(u32, u32), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ((t, d), u) in speedlog
        .time()
        .iter()
        .zip(speedlog.download().iter())
        .zip(speedlog.upload().iter())
    {
        let local = t.with_timezone(&tz);
        let key = (local.weekday().num_days_from_monday(), local.hour());
        let entry = groups.entry(key).or_default();
        entry.0.push(*d);
        entry.1.push(*u);
    }

    groups
        .into_iter()
        .filter_map(|((weekday, hour), (down, up))| {
            Some(Slot {
                weekday,
                hour,
                label: format!("{}-{}", labels.weekdays[weekday as usize], hour),
                download: Spread::of(&down)?,
                upload: Spread::of(&up)?,
                count: down.len(),
                download_runs: down,
                upload_runs: up,
            })
        })
        .collect()
}
