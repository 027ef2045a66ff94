use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Feature name -> importance weight, in the order the service sent them.
///
/// Decoded from a JSON object without re-sorting the keys: the wire order
/// is the tie-break order for ranking. A key repeated on the wire keeps its
/// first position and takes the later weight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureImportance {
    entries: Vec<(String, f64)>,
}

impl FeatureImportance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, feature: impl Into<String>, weight: f64) {
        let feature = feature.into();
        match self.entries.iter_mut().find(|(k, _)| *k == feature) {
            Some(slot) => slot.1 = weight,
            None => self.entries.push((feature, weight)),
        }
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == feature)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureImportance {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, w) in iter {
            out.insert(k, w);
        }
        out
    }
}

impl Serialize for FeatureImportance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, w) in &self.entries {
            map.serialize_entry(k, w)?;
        }
        map.end()
    }
}

struct ImportanceVisitor;

impl<'de> Visitor<'de> for ImportanceVisitor {
    type Value = FeatureImportance;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping feature names to importance weights")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = FeatureImportance::new();
        while let Some((k, w)) = access.next_entry::<String, f64>()? {
            out.insert(k, w);
        }
        Ok(out)
    }
}

impl<'de> Deserialize<'de> for FeatureImportance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ImportanceVisitor)
    }
}
