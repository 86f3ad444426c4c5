use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::registry::{ReportKind, SeriesId, ValueKind, SCHEMA_VERSION};
use crate::series::Series;

/// Fixed-shape bundle of every series declared for one report kind.
///
/// A report starts with each declared series empty and can only have those
/// slots replaced, so the serialized object always carries exactly the
/// registry's keys, in registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    kind: ReportKind,
    series: Vec<(SeriesId, Series)>,
}

impl Report {
    pub fn empty(kind: ReportKind) -> Self {
        let series = kind
            .series()
            .iter()
            .map(|id| (*id, empty_series(id.value_kind())))
            .collect();
        Self { kind, series }
    }

    /// Replace a declared series. Ids outside this report's registry entry
    /// are ignored.
    pub fn set(&mut self, id: SeriesId, series: Series) {
        if let Some(slot) = self.series.iter_mut().find(|(slot_id, _)| *slot_id == id) {
            slot.1 = series;
        }
    }

    pub fn get(&self, id: SeriesId) -> Option<&Series> {
        self.series
            .iter()
            .find(|(slot_id, _)| *slot_id == id)
            .map(|(_, series)| series)
    }

    pub fn kind(&self) -> &ReportKind {
        &self.kind
    }

    pub fn schema_version(&self) -> u16 {
        SCHEMA_VERSION
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeriesId, &Series)> {
        self.series.iter().map(|(id, series)| (*id, series))
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|(_, series)| series.is_empty())
    }
}

fn empty_series(kind: ValueKind) -> Series {
    match kind {
        ValueKind::Count => Series::Counts(Vec::new()),
        ValueKind::Percent => Series::Percentages(Vec::new()),
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for (id, series) in &self.series {
            map.serialize_entry(id.key(), series)?;
        }
        map.end()
    }
}
