//! Aggregated usage statistics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::UsageRecord;

/// Aggregate over a bag of usage records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_requests: u64,
    /// Percentage of `[200, 300)` responses, 0.0 to 100.0
    pub success_rate: f64,
    /// Mean response time in milliseconds
    pub average_response_time: f64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
    /// Keyed by `YYYY-MM-DD`
    pub requests_by_day: BTreeMap<String, u64>,
}

impl UsageStats {
    /// Aggregate records; `None` when there are none
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a UsageRecord>,
    {
        let mut stats = Self::default();
        let mut successful: u64 = 0;
        let mut total_time: u64 = 0;

        for record in records {
            stats.total_requests += 1;
            total_time += record.response_time_ms;

            if record.is_success() {
                successful += 1;
            }

            *stats
                .requests_by_endpoint
                .entry(record.endpoint.clone())
                .or_insert(0) += 1;
            *stats.requests_by_day.entry(record.day()).or_insert(0) += 1;
        }

        if stats.total_requests == 0 {
            return None;
        }

        let total = stats.total_requests as f64;
        stats.success_rate = successful as f64 / total * 100.0;
        stats.average_response_time = total_time as f64 / total;

        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::ApiKeyId;
    use chrono::{TimeZone, Utc};

    fn record(endpoint: &str, status: u16, time_ms: u64) -> UsageRecord {
        UsageRecord::new(ApiKeyId::generate(), endpoint, "GET", status)
            .with_response_time_ms(time_ms)
    }

    #[test]
    fn test_empty_is_none() {
        assert!(UsageStats::from_records(&[]).is_none());
    }

    #[test]
    fn test_aggregate() {
        let records = vec![
            record("/a", 200, 10),
            record("/a", 201, 20),
            record("/b", 500, 30),
            record("/b", 401, 40),
        ];

        let stats = UsageStats::from_records(&records).unwrap();

        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.average_response_time, 25.0);
        assert_eq!(stats.requests_by_endpoint.get("/a"), Some(&2));
        assert_eq!(stats.requests_by_endpoint.get("/b"), Some(&2));
        assert_eq!(stats.requests_by_day.values().sum::<u64>(), 4);
    }

    #[test]
    fn test_day_buckets() {
        let day1 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let records = vec![
            record("/a", 200, 1).with_timestamp(day1),
            record("/a", 200, 1).with_timestamp(day1),
            record("/a", 200, 1).with_timestamp(day2),
        ];

        let stats = UsageStats::from_records(&records).unwrap();

        assert_eq!(stats.requests_by_day.get("2024-01-01"), Some(&2));
        assert_eq!(stats.requests_by_day.get("2024-01-02"), Some(&1));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let stats = UsageStats::from_records(&[record("/a", 200, 5)]).unwrap();
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["totalRequests"], 1);
        assert_eq!(json["successRate"], 100.0);
        assert_eq!(json["averageResponseTime"], 5.0);
        assert_eq!(json["requestsByEndpoint"]["/a"], 1);
    }
}
