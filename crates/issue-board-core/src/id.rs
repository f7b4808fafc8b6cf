use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            /// Generate a fresh identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an issue.
    IssueId
);
uuid_id!(
    /// Identifier of a project.
    ProjectId
);
uuid_id!(
    /// Identifier of a workflow state.
    StateId
);
uuid_id!(
    /// Identifier of a label.
    LabelId
);
uuid_id!(
    /// Identifier of a workspace member.
    MemberId
);
uuid_id!(
    /// Identifier of a cycle.
    CycleId
);
uuid_id!(
    /// Identifier of a module.
    ModuleId
);
uuid_id!(
    /// Identifier of a saved project view.
    ViewId
);
uuid_id!(
    /// Identifier of the join record attaching an issue to a cycle or module.
    BridgeId
);

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn issue_id_uses_uuid_v7() {
        let id = IssueId::new();
        assert_eq!(id.0.get_version_num(), 7);
    }

    #[test]
    fn label_id_roundtrip() {
        let uuid = Uuid::now_v7();
        let parsed: LabelId = uuid.to_string().parse().expect("must parse label id");
        assert_eq!(parsed.0, uuid);
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let uuid = Uuid::now_v7();
        let parsed: StateId = format!("  {uuid}\n").parse().expect("must parse padded id");
        assert_eq!(parsed.0, uuid);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = IssueId::new();
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, format!("\"{id}\""));
        let back: IssueId = serde_json::from_str(&json).expect("deserialize id");
        assert_eq!(back, id);
    }
}
