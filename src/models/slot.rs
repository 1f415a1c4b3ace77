use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// The eight fixed 45-minute windows of a working day. This is the single
/// definition shared by the calendar store, the lifecycle engine, and the
/// request parsing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeLabel {
    #[serde(rename = "9:00-9:45 AM")]
    Slot0900,
    #[serde(rename = "9:45-10:30 AM")]
    Slot0945,
    #[serde(rename = "10:30-11:15 AM")]
    Slot1030,
    #[serde(rename = "11:15-12:00 PM")]
    Slot1115,
    #[serde(rename = "12:00-12:45 PM")]
    Slot1200,
    #[serde(rename = "12:45-1:30 PM")]
    Slot1245,
    #[serde(rename = "1:30-2:15 PM")]
    Slot1330,
    #[serde(rename = "2:15-3:00 PM")]
    Slot1415,
}

impl TimeLabel {
    pub const ALL: [TimeLabel; 8] = [
        TimeLabel::Slot0900,
        TimeLabel::Slot0945,
        TimeLabel::Slot1030,
        TimeLabel::Slot1115,
        TimeLabel::Slot1200,
        TimeLabel::Slot1245,
        TimeLabel::Slot1330,
        TimeLabel::Slot1415,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeLabel::Slot0900 => "9:00-9:45 AM",
            TimeLabel::Slot0945 => "9:45-10:30 AM",
            TimeLabel::Slot1030 => "10:30-11:15 AM",
            TimeLabel::Slot1115 => "11:15-12:00 PM",
            TimeLabel::Slot1200 => "12:00-12:45 PM",
            TimeLabel::Slot1245 => "12:45-1:30 PM",
            TimeLabel::Slot1330 => "1:30-2:15 PM",
            TimeLabel::Slot1415 => "2:15-3:00 PM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == s)
    }

    pub fn start(&self) -> NaiveTime {
        let (h, m) = match self {
            TimeLabel::Slot0900 => (9, 0),
            TimeLabel::Slot0945 => (9, 45),
            TimeLabel::Slot1030 => (10, 30),
            TimeLabel::Slot1115 => (11, 15),
            TimeLabel::Slot1200 => (12, 0),
            TimeLabel::Slot1245 => (12, 45),
            TimeLabel::Slot1330 => (13, 30),
            TimeLabel::Slot1415 => (14, 15),
        };
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub fn end(&self) -> NaiveTime {
        self.start() + chrono::Duration::minutes(45)
    }
}

/// One entry of the per-day availability listing. Labels with no stored row
/// are synthesized as `Available`.
#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub time: TimeLabel,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for label in TimeLabel::ALL {
            assert_eq!(TimeLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(TimeLabel::parse("3:00-3:45 PM"), None);
        assert_eq!(TimeLabel::parse(""), None);
    }

    #[test]
    fn test_labels_are_ordered_and_contiguous() {
        for pair in TimeLabel::ALL.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
        assert_eq!(
            TimeLabel::Slot0900.start(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            TimeLabel::Slot1415.end(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&TimeLabel::Slot0900).unwrap();
        assert_eq!(json, "\"9:00-9:45 AM\"");
        let back: TimeLabel = serde_json::from_str("\"12:45-1:30 PM\"").unwrap();
        assert_eq!(back, TimeLabel::Slot1245);
    }
}
