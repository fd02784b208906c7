//! Typed ID and name definitions.
//!
//! Orchestrator IDs are ULID-based for sortability and uniqueness. Provider
//! names are opaque strings handed to us by the cloud provider.

use crate::{define_id, define_name};

// =============================================================================
// Orchestrator IDs
// =============================================================================

define_id!(InstanceId, "inst");
define_id!(LaunchId, "lch");
define_id!(RequestId, "req");

// =============================================================================
// Provider Names
// =============================================================================

define_name!(Region, "region");
define_name!(ZoneName, "availability zone");
define_name!(VolumeId, "volume id");

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdError;

    #[test]
    fn test_instance_id_roundtrip() {
        let id = InstanceId::new();
        let s = id.to_string();
        let parsed: InstanceId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_instance_id_prefix() {
        let id = InstanceId::new();
        assert!(id.to_string().starts_with("inst_"));
    }

    #[test]
    fn test_launch_id_invalid_prefix() {
        let result: Result<LaunchId, _> = "inst_01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(matches!(result, Err(IdError::InvalidPrefix { .. })));
    }

    #[test]
    fn test_request_id_missing_separator() {
        let result: Result<RequestId, _> = "req01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(matches!(result, Err(IdError::MissingSeparator)));
    }

    #[test]
    fn test_instance_id_empty() {
        let result: Result<InstanceId, _> = "".parse();
        assert!(matches!(result, Err(IdError::Empty)));
    }

    #[test]
    fn test_instance_id_invalid_ulid() {
        let result: Result<InstanceId, _> = "inst_invalid".parse();
        assert!(matches!(result, Err(IdError::InvalidUlid(_))));
    }

    #[test]
    fn test_instance_id_json_roundtrip() {
        let id = InstanceId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: InstanceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_instance_id_sortable() {
        let id1 = InstanceId::new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = InstanceId::new();
        assert!(id1 < id2);
    }

    #[test]
    fn test_all_id_prefixes_unique() {
        let prefixes = [InstanceId::PREFIX, LaunchId::PREFIX, RequestId::PREFIX];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(prefixes.len(), unique.len(), "Duplicate ID prefixes found!");
    }

    #[test]
    fn test_zone_name_new_accepts_anything() {
        // Provider data is carried verbatim, even when it would not parse.
        let zone = ZoneName::new("");
        assert_eq!(zone.as_str(), "");
        assert_eq!(ZoneName::new("us-east1-b"), "us-east1-b");
    }

    #[test]
    fn test_zone_name_parse_rejects_empty_and_whitespace() {
        assert!(ZoneName::parse("").unwrap_err().is_empty());
        assert!(matches!(
            ZoneName::parse("us east"),
            Err(IdError::InvalidName { kind: "availability zone", .. })
        ));
    }

    #[test]
    fn test_name_json_is_verbatim() {
        let zone: ZoneName = serde_json::from_str("\"b zone\"").unwrap();
        assert_eq!(zone.as_str(), "b zone");

        let id: VolumeId = serde_json::from_str("\"home-zone--c930380d\"").unwrap();
        assert_eq!(id.as_str(), "home-zone--c930380d");
    }

    #[test]
    fn test_name_deserialize_parsed_rejects_empty() {
        let mut de = serde_json::Deserializer::from_str("\"\"");
        assert!(VolumeId::deserialize_parsed(&mut de).is_err());

        let mut de = serde_json::Deserializer::from_str("\"us east\"");
        assert!(ZoneName::deserialize_parsed(&mut de).is_err());

        let mut de = serde_json::Deserializer::from_str("\"home-zone--c930380d\"");
        let id = VolumeId::deserialize_parsed(&mut de).unwrap();
        assert_eq!(id, "home-zone--c930380d");
    }

    #[test]
    fn test_region_display() {
        let region: Region = "us-east1".parse().unwrap();
        assert_eq!(region.to_string(), "us-east1");
    }

    proptest::proptest! {
        #[test]
        fn prop_zone_name_parse_display_roundtrip(s in "[a-z0-9][a-z0-9-]{0,30}") {
            let zone: ZoneName = s.parse().unwrap();
            proptest::prop_assert_eq!(zone.to_string(), s);
        }
    }
}
