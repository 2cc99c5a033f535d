use super::*;
use crate::device::MockDevice;
use crate::error::Error;
use std::collections::HashSet;

/// Device object that counts hook invocations
#[derive(Debug, Default)]
struct CountingObject {
    allocations: u32,
    releases: u32,
    fail_allocation: bool,
}

impl DeviceObject for CountingObject {
    fn allocate(&mut self, _device: &mut dyn Device) -> Result<()> {
        self.allocations += 1;
        if self.fail_allocation {
            return Err(Error::AllocationFailed("counting object".to_string()));
        }
        Ok(())
    }

    fn release(&mut self, _device: &mut dyn Device) {
        self.releases += 1;
    }

    fn desc(&self) -> &str {
        "CountingObject"
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_new_resource_is_inert() {
    let resource = Resource::new(CountingObject::default());
    assert_eq!(resource.resource_id(), 0);
    assert_eq!(resource.ref_count(), 0);
    assert_eq!(resource.allocations, 0);
}

#[test]
fn test_first_reference_allocates_once() {
    let mut device = MockDevice::new();
    let mut resource = Resource::new(CountingObject::default());

    let id = resource.add_reference(&mut device).unwrap();
    let again = resource.add_reference(&mut device).unwrap();

    assert_ne!(id, 0);
    assert_eq!(id, again);
    assert_eq!(resource.ref_count(), 2);
    assert_eq!(resource.allocations, 1);
}

#[test]
fn test_last_reference_releases_and_resets_id() {
    let mut device = MockDevice::new();
    let mut resource = Resource::new(CountingObject::default());
    resource.add_reference(&mut device).unwrap();
    resource.add_reference(&mut device).unwrap();

    resource.remove_reference(&mut device);
    assert_eq!(resource.releases, 0);
    assert_ne!(resource.resource_id(), 0);

    resource.remove_reference(&mut device);
    assert_eq!(resource.releases, 1);
    assert_eq!(resource.resource_id(), 0);
}

#[test]
fn test_extra_remove_reference_is_noop() {
    let mut device = MockDevice::new();
    let mut resource = Resource::new(CountingObject::default());
    resource.add_reference(&mut device).unwrap();

    for _ in 0..5 {
        resource.remove_reference(&mut device);
    }

    assert_eq!(resource.releases, 1);
    assert_eq!(resource.ref_count(), 0);
    assert_eq!(resource.resource_id(), 0);
}

#[test]
fn test_reuse_after_release_gets_fresh_id() {
    let mut device = MockDevice::new();
    let mut resource = Resource::new(CountingObject::default());

    let first = resource.add_reference(&mut device).unwrap();
    resource.remove_reference(&mut device);
    let second = resource.add_reference(&mut device).unwrap();

    assert!(second > first);
    assert_eq!(resource.allocations, 2);
}

// ============================================================================
// Allocation failure
// ============================================================================

#[test]
fn test_failed_allocation_keeps_count_and_zero_id() {
    let mut device = MockDevice::new();
    let mut resource = Resource::new(CountingObject { fail_allocation: true, ..Default::default() });

    let result = resource.add_reference(&mut device);

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert_eq!(resource.ref_count(), 1);
    assert_eq!(resource.resource_id(), 0);
}

#[test]
fn test_reference_after_failed_allocation_does_not_retry() {
    let mut device = MockDevice::new();
    let mut resource = Resource::new(CountingObject { fail_allocation: true, ..Default::default() });
    let _ = resource.add_reference(&mut device);

    resource.fail_allocation = false;
    let result = resource.add_reference(&mut device);

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert_eq!(resource.allocations, 1);
    assert_eq!(resource.ref_count(), 2);

    // Dropping every reference cleans up and allows a new attempt
    resource.remove_reference(&mut device);
    resource.remove_reference(&mut device);
    assert_eq!(resource.releases, 1);
    assert!(resource.add_reference(&mut device).is_ok());
}

// ============================================================================
// Identifier uniqueness
// ============================================================================

#[test]
fn test_ids_are_unique_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                let mut device = MockDevice::new();
                (0..50)
                    .map(|_| {
                        let mut resource = Resource::new(CountingObject::default());
                        let id = resource.add_reference(&mut device).unwrap();
                        resource.remove_reference(&mut device);
                        id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate resource id {}", id);
        }
    }
    assert_eq!(seen.len(), 400);
}
