use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Entities of a record, grouped by entity type. The types keep their insertion order, which is
/// the order of the label set when the record was extracted. A type is present only if it has at
/// least one span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Labels(Vec<(String, Vec<String>)>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends spans to the entry of `entity_type`, creating it at the end if needed. Nothing is
    /// inserted when `spans` is empty.
    pub fn extend<I>(&mut self, entity_type: &str, spans: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut spans = spans.into_iter().peekable();
        if spans.peek().is_none() {
            return;
        }
        match self.0.iter_mut().find(|(t, _)| t == entity_type) {
            Some((_, existing)) => existing.extend(spans),
            None => self.0.push((String::from(entity_type), spans.collect())),
        }
    }

    pub fn push(&mut self, entity_type: &str, span: String) {
        self.extend(entity_type, std::iter::once(span))
    }

    /// Spans of the given type, or an empty slice.
    pub fn get(&self, entity_type: &str) -> &[String] {
        self.0
            .iter()
            .find(|(t, _)| t == entity_type)
            .map(|(_, spans)| spans.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(t, s)| (t.as_str(), s.as_slice()))
    }

    /// Total number of spans, all types included.
    pub fn span_count(&self) -> usize {
        self.0.iter().map(|(_, s)| s.len()).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for Labels {
    fn from_iter<T: IntoIterator<Item = (S, Vec<String>)>>(iter: T) -> Self {
        let mut labels = Labels::new();
        for (entity_type, spans) in iter {
            let entity_type: String = entity_type.into();
            labels.extend(&entity_type, spans);
        }
        labels
    }
}

impl Serialize for Labels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (entity_type, spans) in self.0.iter() {
            map.serialize_entry(entity_type, spans)?;
        }
        map.end()
    }
}

struct LabelsVisitor;

impl<'de> Visitor<'de> for LabelsVisitor {
    type Value = Labels;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of entity types to lists of entity strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut labels = Labels::new();
        while let Some((entity_type, spans)) = access.next_entry::<String, Vec<String>>()? {
            labels.extend(&entity_type, spans);
        }
        Ok(labels)
    }
}

impl<'de> Deserialize<'de> for Labels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LabelsVisitor)
    }
}

/// One sentence (or example) with its entities. This is the unit written to and read from the
/// JSON-lines files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    #[serde(default)]
    pub label: Labels,
    /// Free-text rationale attached to the record, if rationales were aligned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cot: Option<String>,
}

impl Record {
    pub fn new(text: String, label: Labels) -> Self {
        Self {
            text,
            label,
            cot: None,
        }
    }

    pub fn with_cot(mut self, cot: String) -> Self {
        self.cot = Some(cot);
        self
    }
}
