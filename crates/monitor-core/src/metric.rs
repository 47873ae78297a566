//! Normalized metric model shared by every provider.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-device readings keyed by device (GPU or core) index.
pub type Readings = BTreeMap<u32, f64>;

/// The dimension being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Percent,
    Memory,
    Power,
    Temp,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Percent,
        MetricKind::Memory,
        MetricKind::Power,
        MetricKind::Temp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Percent => "percent",
            MetricKind::Memory => "memory",
            MetricKind::Power => "power",
            MetricKind::Temp => "temp",
        }
    }

    /// Position in [`MetricKind::ALL`], used to index fixed-size tables.
    pub(crate) fn index(self) -> usize {
        match self {
            MetricKind::Percent => 0,
            MetricKind::Memory => 1,
            MetricKind::Power => 2,
            MetricKind::Temp => 3,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown metric kind '{s}'"))
    }
}

/// Readings for exactly one metric kind.
///
/// Built fresh on every sample tick and consumed by the formatter; a record
/// never carries more than the one kind it was constructed for.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    kind: MetricKind,
    readings: Readings,
}

impl MetricRecord {
    pub fn new(kind: MetricKind, readings: Readings) -> Self {
        Self { kind, readings }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Returns the reading set for `kind`, or `None` if this record holds another kind.
    pub fn get(&self, kind: MetricKind) -> Option<&Readings> {
        (self.kind == kind).then_some(&self.readings)
    }

    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    pub fn into_readings(self) -> Readings {
        self.readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.as_str().parse::<MetricKind>(), Ok(kind));
        }
        assert!("voltage".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_kind_index_matches_all_order() {
        for (i, kind) in MetricKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_record_only_exposes_its_kind() {
        let record = MetricRecord::new(MetricKind::Power, Readings::from([(0, 120.5), (1, 98.0)]));
        assert_eq!(record.kind(), MetricKind::Power);
        assert_eq!(record.get(MetricKind::Power).map(|r| r.len()), Some(2));
        assert!(record.get(MetricKind::Temp).is_none());
        assert_eq!(record.into_readings().get(&1), Some(&98.0));
    }
}
