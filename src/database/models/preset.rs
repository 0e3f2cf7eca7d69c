use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Named or custom working hours used to pre-fill `working_hours` entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHoursPreset {
    pub id: String,
    pub label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_default: bool,
}

pub const CUSTOM_PRESET_ID: &str = "custom";

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl WorkingHoursPreset {
    pub fn custom(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: CUSTOM_PRESET_ID.to_string(),
            label: "Custom".to_string(),
            start_time,
            end_time,
            is_default: false,
        }
    }

    pub fn builtin() -> Vec<WorkingHoursPreset> {
        vec![
            WorkingHoursPreset {
                id: "standard".to_string(),
                label: "Standard (09:00 - 18:00)".to_string(),
                start_time: hm(9, 0),
                end_time: hm(18, 0),
                is_default: true,
            },
            WorkingHoursPreset {
                id: "early".to_string(),
                label: "Early (08:00 - 17:00)".to_string(),
                start_time: hm(8, 0),
                end_time: hm(17, 0),
                is_default: false,
            },
            WorkingHoursPreset {
                id: "late".to_string(),
                label: "Late (10:00 - 19:00)".to_string(),
                start_time: hm(10, 0),
                end_time: hm(19, 0),
                is_default: false,
            },
        ]
    }

    /// Looks up `id` among `presets`, falling back to the default preset when
    /// no id is given.
    pub fn resolve<'a>(
        presets: &'a [WorkingHoursPreset],
        id: Option<&str>,
    ) -> Option<&'a WorkingHoursPreset> {
        match id {
            Some(id) => presets.iter().find(|preset| preset.id == id),
            None => presets
                .iter()
                .find(|preset| preset.is_default)
                .or_else(|| presets.first()),
        }
    }
}
