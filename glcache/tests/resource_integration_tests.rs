//! Integration tests for device resources
//!
//! These tests drive buffers, textures and shader programs against the
//! recording mock device. No GPU required.
//!
//! Run with: cargo test --test resource_integration_tests

use glcache::glam::UVec2;
use glcache::glc::device::{BufferTarget, BufferUsage, Handle, MockDevice, TextureFormat, UniformValue};
use glcache::glc::resource::{
    Buffer, BufferUpdate, ImageUpdate, Resource, ShaderProgram, SourceData, Texture2D,
};
use glcache::glc::state::StateCache;
use glcache::glc::Error;
use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

// ============================================================================
// BUFFERS
// ============================================================================

#[test]
fn test_integration_buffer_lifecycle() {
    let mut device = MockDevice::new();
    let mut buffer = Resource::new(Buffer::new(BufferTarget::Array, BufferUsage::Static).with_desc("quad"));

    let id = buffer.add_reference(&mut device).unwrap();
    assert_ne!(id, 0);
    assert!(!buffer.handle().is_null());

    let vertices: Vec<u8> = (0..64).collect();
    buffer.enqueue(BufferUpdate::reupload(SourceData::Owned(vertices.clone())));
    buffer.bind(&mut device).unwrap();
    buffer.synchronize(&mut device);

    assert_eq!(buffer.size_bytes(), 64);
    assert_eq!(device.buffer_contents(buffer.handle()), Some(vertices.as_slice()));
    assert!(buffer.pending_updates().is_empty());

    buffer.remove_reference(&mut device);
    assert_eq!(buffer.resource_id(), 0);
    assert!(buffer.handle().is_null());
    assert_eq!(device.live_buffer_count(), 0);
    assert_eq!(device.call_count("delete_buffer"), 1);
}

#[test]
fn test_integration_unallocated_bind_rejected() {
    let mut device = MockDevice::new();
    let mut state = StateCache::with_table_sizes(8, 16);
    let buffer = Buffer::new(BufferTarget::ElementArray, BufferUsage::Dynamic);
    let texture = Resource::new(Texture2D::new(TextureFormat::RGBA8));

    assert!(matches!(buffer.bind(&mut device), Err(Error::InvalidResource(_))));
    assert!(matches!(texture.bind(&mut device, &mut state, 0), Err(Error::InvalidResource(_))));
    assert!(device.issued_commands().is_empty());
}

#[test]
fn test_integration_updates_produced_on_other_thread() {
    let (sender, receiver) = mpsc::channel::<BufferUpdate>();
    let shared: Arc<[u8]> = Arc::from(vec![5u8, 6, 7, 8, 9]);

    let producer = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            sender.send(BufferUpdate::allocate(100)).unwrap();
            sender.send(BufferUpdate::partial(10, SourceData::Shared(shared))).unwrap();
        })
    };
    producer.join().unwrap();

    let mut device = MockDevice::new();
    let mut buffer = Resource::new(Buffer::new(BufferTarget::Array, BufferUsage::Stream));
    buffer.add_reference(&mut device).unwrap();
    for update in receiver.try_iter() {
        buffer.enqueue(update);
    }

    buffer.bind(&mut device).unwrap();
    device.clear_calls();
    buffer.synchronize(&mut device);

    assert_eq!(device.issued_commands(), vec!["buffer_data", "buffer_sub_data"]);
    let contents = device.buffer_contents(buffer.handle()).unwrap();
    assert_eq!(contents.len(), 100);
    assert_eq!(&contents[10..15], &shared[..]);
    assert_eq!(Arc::strong_count(&shared), 1);
}

// ============================================================================
// RESOURCE IDS
// ============================================================================

#[test]
fn test_integration_resource_ids_unique_across_threads() {
    let workers: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let mut device = MockDevice::new();
                let mut ids = Vec::new();
                for _ in 0..25 {
                    let mut texture = Resource::new(Texture2D::new(TextureFormat::RGBA8));
                    ids.push(texture.add_reference(&mut device).unwrap());
                    texture.remove_reference(&mut device);
                }
                ids
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for worker in workers {
        for id in worker.join().unwrap() {
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), 100);
}

// ============================================================================
// DRAW SETUP
// ============================================================================

#[test]
fn test_integration_draw_setup() {
    let mut device = MockDevice::new();
    let mut state = StateCache::with_table_sizes(8, 16);
    state.capture_state(&mut device);

    let mut program = Resource::new(ShaderProgram::new(
        "attribute vec2 a_position;\nuniform mat4 u_mvp;\nvoid main() {}\n",
        "uniform sampler2D u_texture;\nvoid main() {}\n",
    ));
    program.add_reference(&mut device).unwrap();

    let mut texture = Resource::new(Texture2D::new(TextureFormat::RGBA8));
    texture.add_reference(&mut device).unwrap();
    texture.enqueue(ImageUpdate::reupload(UVec2::new(2, 2), SourceData::Kept(vec![128u8; 16])));

    let mut buffer = Resource::new(Buffer::new(BufferTarget::Array, BufferUsage::Static));
    buffer.add_reference(&mut device).unwrap();
    let mut vertices = Vec::new();
    for corner in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        Buffer::push_element(&mut vertices, corner);
    }
    buffer.enqueue(BufferUpdate::reupload(SourceData::Owned(vertices)));

    // First frame: everything is issued
    program.enable(&mut device, &mut state).unwrap();
    program.set_uniform(&mut device, "u_texture", UniformValue::Int(0)).unwrap();
    texture.bind(&mut device, &mut state, 0).unwrap();
    texture.synchronize(&mut device, &mut state);
    buffer.bind(&mut device).unwrap();
    buffer.synchronize(&mut device);

    assert_eq!(device.bound_texture(0), texture.handle());
    assert_eq!(texture.extent(), Some(UVec2::new(2, 2)));
    assert!(device.attrib_array_enabled(0));
    let uploaded = device.buffer_contents(buffer.handle()).unwrap();
    assert_eq!(Buffer::element::<[f32; 2]>(uploaded, 2), Some([0.0, 1.0]));

    // Second frame: nothing changed, so enabling and binding issue nothing
    device.clear_calls();
    program.enable(&mut device, &mut state).unwrap();
    texture.bind(&mut device, &mut state, 0).unwrap();
    texture.synchronize(&mut device, &mut state);
    assert!(device.issued_commands().is_empty());

    program.remove_reference(&mut device);
    texture.remove_reference(&mut device);
    buffer.remove_reference(&mut device);
    assert_eq!(device.program_count(), 0);
    assert_eq!(device.live_texture_count(), 0);
    assert_eq!(device.live_buffer_count(), 0);
    assert!(program.handle() == Handle::NULL);
}
