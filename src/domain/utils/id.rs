use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// String-backed identifier tagged with the kind of thing it names.
///
/// Ordering is the ordering of the inner string, which keeps every map keyed
/// by an `Id` iterating deterministically.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Id<T> {
    pub id: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Datapath ids are often written as bare numbers in configs.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Id::new(text),
            Raw::Number(number) => Id::new(number.to_string()),
        })
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct NodeTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct EndpointTag;

/// Switch (datapath) identifier.
pub type NodeId = Id<NodeTag>;

/// Publisher, subscriber or broker identity, usually an IP address.
pub type EndpointId = Id<EndpointTag>;

/// Egress port number on a switch.
pub type PortNo = u32;

/// Group table entry identifier used for multicast forwarding.
pub type GroupId = u32;

/// Identifier assigned to a flow when it is admitted.
pub type FlowId = uuid::Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_deserializes_from_number_and_string() {
        let ids: Vec<NodeId> = serde_json::from_str(r#"[1, "2", "s3"]"#).unwrap();

        assert_eq!(ids, vec![NodeId::new("1"), NodeId::new("2"), NodeId::new("s3")]);
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), "\"1\"");
    }

    #[test]
    fn test_debug_uses_tag_name() {
        let id = EndpointId::new("10.0.0.1");
        assert_eq!(format!("{:?}", id), "EndpointId: \"10.0.0.1\"");
    }
}
