mod common;

use common::{offline_validator, temp_store};
use kiln_license::{device_id, generate_device_id, DeviceAttributes, LicenseStore, DEVICE_ID_PREFIX};

#[test]
fn device_id_is_idempotent() {
    let (_dir, store) = temp_store();
    let first = device_id(&store);
    let second = device_id(&store);
    assert_eq!(first, second);
}

#[test]
fn device_id_survives_store_reopen() {
    let (dir, store) = temp_store();
    let first = device_id(&store);

    let reopened = LicenseStore::open_at(dir.path()).unwrap();
    assert_eq!(device_id(&reopened), first);
}

#[test]
fn device_id_has_prefix_hash_and_timestamp() {
    let (_dir, store) = temp_store();
    let id = device_id(&store);

    let parts: Vec<&str> = id.splitn(3, '-').collect();
    assert_eq!(parts[0], DEVICE_ID_PREFIX);
    assert_eq!(parts[1].len(), 16);
    assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
    assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn attribute_hash_is_deterministic() {
    let attrs = DeviceAttributes::collect();
    let a = generate_device_id(&attrs);
    let b = generate_device_id(&attrs);
    // The trailing component is a generation timestamp; the hash of the
    // same attributes must agree.
    assert_eq!(a.split('-').nth(1), b.split('-').nth(1));
}

#[tokio::test]
async fn validator_binds_to_the_persisted_device_id() {
    let (_dir, store) = temp_store();
    let persisted = device_id(&store);

    let validator = offline_validator(store);
    assert_eq!(validator.device_id(), persisted);
}
