use std::fmt::Display;

/// `PartitionId` represents the opaque identifier of a single partition within
/// a stream. Ordering among partitions is the insertion order returned by
/// discovery; no numeric semantics are assumed even when the id happens to be
/// a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionId(String);

impl PartitionId {
    pub fn new(id: impl Into<String>) -> Self {
        PartitionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionId {
    fn from(id: &str) -> Self {
        PartitionId(id.to_string())
    }
}

impl From<String> for PartitionId {
    fn from(id: String) -> Self {
        PartitionId(id)
    }
}
