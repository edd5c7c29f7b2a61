use crate::sofa_parse::StatisticsPayload;

pub const ALL_PERIOD: &str = "ALL";
pub const NOT_AVAILABLE: &str = "N/A";

/// Every (group, metric) pair written per live event when statistics load.
pub const TRACKED_METRICS: &[(&str, &[&str])] = &[
    (
        "Service",
        &[
            "Aces",
            "Double faults",
            "First serve",
            "Second serve",
            "First serve points",
            "Second serve points",
            "Service games played",
            "Break points saved",
        ],
    ),
    (
        "Points",
        &[
            "Total",
            "Service points won",
            "Receiver points won",
            "Max points in a row",
        ],
    ),
    (
        "Games",
        &["Total", "Service games won", "Max games in a row"],
    ),
    (
        "Return",
        &[
            "First serve return points",
            "Second serve return points",
            "Return games played",
            "Break points converted",
        ],
    ),
];

pub fn tracked_pairs() -> impl Iterator<Item = (&'static str, &'static str)> {
    TRACKED_METRICS
        .iter()
        .flat_map(|(group, names)| names.iter().map(move |name| (*group, *name)))
}

/// Looks up `(home, away)` for `group`/`name` in the whole-match period.
/// Returns `("N/A", "N/A")` when any level of the lookup misses.
pub fn extract_statistic(payload: &StatisticsPayload, group: &str, name: &str) -> (String, String) {
    for period in payload.statistics.iter().filter(|p| p.period == ALL_PERIOD) {
        for g in period.groups.iter().filter(|g| g.group_name == group) {
            if let Some(item) = g.items.iter().find(|item| item.name == name) {
                return (item.home.clone(), item.away.clone());
            }
        }
    }
    (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sofa_parse::parse_statistics_json;

    const PAYLOAD: &str = r#"{"statistics":[
        {"period":"1ST","groups":[{"groupName":"Service","statisticsItems":[
            {"name":"Aces","home":"1","away":"0"},
            {"name":"Double faults","home":"4","away":"4"}
        ]}]},
        {"period":"ALL","groups":[
            {"groupName":"Service","statisticsItems":[{"name":"Aces","home":"7","away":"3"}]},
            {"groupName":"Points","statisticsItems":[{"name":"Total","home":"60","away":"48"}]},
            {"groupName":"Games","statisticsItems":[{"name":"Total","home":"12","away":"6"}]}
        ]}
    ]}"#;

    fn payload() -> StatisticsPayload {
        parse_statistics_json(PAYLOAD)
            .expect("valid json")
            .expect("payload present")
    }

    #[test]
    fn metric_set_has_nineteen_pairs() {
        assert_eq!(tracked_pairs().count(), 19);
    }

    #[test]
    fn finds_value_in_all_period() {
        let payload = payload();
        assert_eq!(
            extract_statistic(&payload, "Service", "Aces"),
            ("7".to_string(), "3".to_string())
        );
    }

    #[test]
    fn same_metric_name_is_scoped_by_group() {
        let payload = payload();
        assert_eq!(extract_statistic(&payload, "Points", "Total").0, "60");
        assert_eq!(extract_statistic(&payload, "Games", "Total").0, "12");
    }

    #[test]
    fn other_periods_are_ignored() {
        let payload = payload();
        assert_eq!(
            extract_statistic(&payload, "Service", "Double faults"),
            ("N/A".to_string(), "N/A".to_string())
        );
    }

    #[test]
    fn missing_group_or_payload_is_not_available() {
        let payload = payload();
        assert_eq!(extract_statistic(&payload, "Return", "Aces").0, "N/A");
        let empty = StatisticsPayload::default();
        assert_eq!(extract_statistic(&empty, "Service", "Aces").1, "N/A");
    }
}
