use std::collections::HashMap;

const SENSOR_FILE_PREFIX: &str = "voltaje_sensor_";

/// `voltaje_sensor_<ID>` becomes `S-<ID>`; any other stem is its own key.
pub fn sensor_key(stem: &str) -> String {
    match stem.strip_prefix(SENSOR_FILE_PREFIX) {
        Some(id) if !id.is_empty() => format!("S-{id}"),
        _ => stem.to_string(),
    }
}

/// Temperatures grouped by sensor key, in first-seen key order.
#[derive(Debug, Default, Clone)]
pub struct SensorSeries {
    order: Vec<String>,
    readings: HashMap<String, Vec<f64>>,
}

impl SensorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, key: &str, values: &[f64]) {
        if values.is_empty() {
            return;
        }
        if !self.readings.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.readings
            .entry(key.to_string())
            .or_default()
            .extend_from_slice(values);
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.readings.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.readings.get(key).map(|v| (key.as_str(), v.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_sensor_keys_from_stems() {
        assert_eq!(sensor_key("voltaje_sensor_1007"), "S-1007");
        assert_eq!(sensor_key("voltaje_sensor_10A"), "S-10A");
        assert_eq!(sensor_key("other"), "other");
        assert_eq!(sensor_key("voltaje_sensor_"), "voltaje_sensor_");
        assert_eq!(sensor_key("old_voltaje_sensor_3"), "old_voltaje_sensor_3");
    }

    #[test]
    fn accumulates_in_first_seen_order() {
        let mut series = SensorSeries::new();
        series.extend("S-2", &[1.0, 2.0]);
        series.extend("S-1", &[5.0]);
        series.extend("S-2", &[3.0]);
        series.extend("S-3", &[]);

        let collected: Vec<(&str, Vec<f64>)> =
            series.iter().map(|(k, v)| (k, v.to_vec())).collect();
        assert_eq!(
            collected,
            vec![("S-2", vec![1.0, 2.0, 3.0]), ("S-1", vec![5.0])]
        );
        assert_eq!(series.len(), 2);
        assert!(series.get("S-3").is_none());
    }
}
