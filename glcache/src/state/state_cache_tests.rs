use super::*;
use crate::device::{BlendEquation, Limit, MockDevice};
use crate::error::Error;

fn cache_for(device: &mut MockDevice) -> StateCache {
    let implementation = Implementation::from_device(device);
    device.clear_calls();
    StateCache::new(&implementation)
}

fn captured(device: &mut MockDevice) -> StateCache {
    let mut cache = cache_for(device);
    cache.capture_state(device);
    device.clear_calls();
    cache
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_cache_is_invalid_and_sized_from_limits() {
    let mut device = MockDevice::new();
    device.set_limit(Limit::MaxTextureImageUnits, 4);
    device.set_limit(Limit::MaxVertexAttribs, 6);
    let cache = cache_for(&mut device);

    assert_eq!(cache.texture_unit_count(), 4);
    assert_eq!(cache.vertex_attrib_count(), 6);
    assert_eq!(cache.capability(Capability::Blend), None);
    assert_eq!(cache.unpack_alignment(), None);
    assert_eq!(cache.program(), None);
    assert_eq!(cache.bound_texture(0), None);
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn test_same_value_issues_no_call() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    cache.set_depth_func(&mut device, CompareFunc::LessOrEqual);
    assert_eq!(device.issued_commands(), vec!["depth_func"]);

    device.clear_calls();
    cache.set_depth_func(&mut device, CompareFunc::LessOrEqual);
    assert!(device.issued_commands().is_empty());
}

#[test]
fn test_different_value_issues_exactly_one_call() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    cache.set_cull_face(&mut device, Face::Back);
    device.clear_calls();

    cache.set_cull_face(&mut device, Face::Front);

    assert_eq!(device.issued_commands(), vec!["cull_face"]);
    assert_eq!(device.integer(StateParam::CullFaceMode), Face::Front.raw() as i32);
}

#[test]
fn test_capability_toggles() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    cache.set_capability(&mut device, Capability::Blend, true);
    cache.set_capability(&mut device, Capability::Blend, true);
    cache.set_capability(&mut device, Capability::Blend, false);

    assert_eq!(device.issued_commands(), vec!["enable", "disable"]);
    assert_eq!(cache.capability(Capability::Blend), Some(false));
    assert!(!device.capability_enabled(Capability::Blend));
}

#[test]
fn test_composite_blend_func_compared_as_group() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let alpha_blend = BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

    cache.set_blend_func(&mut device, alpha_blend);
    cache.set_blend_func(&mut device, alpha_blend);

    let premultiplied = BlendFunc { src_rgb: BlendFactor::One, ..alpha_blend };
    cache.set_blend_func(&mut device, premultiplied);

    assert_eq!(device.call_count("blend_func_separate"), 2);
    assert_eq!(cache.blend_func(), Some(premultiplied));
    assert_eq!(device.integer(StateParam::BlendSrcRgb), BlendFactor::One.raw() as i32);
    assert_eq!(device.integer(StateParam::BlendDstAlpha), BlendFactor::OneMinusSrcAlpha.raw() as i32);
}

#[test]
fn test_clear_values_and_ranges() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    cache.set_clear_color(&mut device, Vec4::new(0.1, 0.2, 0.3, 1.0));
    cache.set_clear_color(&mut device, Vec4::new(0.1, 0.2, 0.3, 1.0));
    cache.set_clear_depth(&mut device, 0.5);
    cache.set_clear_stencil(&mut device, 1);
    cache.set_depth_range(&mut device, 0.0, 0.5);
    cache.set_depth_range(&mut device, 0.0, 0.5);
    cache.set_polygon_offset(&mut device, 1.0, 2.0);
    cache.set_polygon_offset(&mut device, 1.0, 2.0);

    assert_eq!(
        device.issued_commands(),
        vec!["clear_color", "clear_depth", "clear_stencil", "depth_range", "polygon_offset"]
    );
    assert_eq!(device.floats(StateParam::ColorClearValue), &[0.1, 0.2, 0.3, 1.0]);
    assert_eq!(cache.clear_color(), Some(Vec4::new(0.1, 0.2, 0.3, 1.0)));
}

#[test]
fn test_pixel_alignments_are_independent() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    cache.set_pixel_alignment(&mut device, PixelStore::UnpackAlignment, 1);
    cache.set_pixel_alignment(&mut device, PixelStore::PackAlignment, 1);
    cache.set_pixel_alignment(&mut device, PixelStore::UnpackAlignment, 1);

    assert_eq!(device.call_count("pixel_store"), 2);
    assert_eq!(cache.unpack_alignment(), Some(1));
    assert_eq!(cache.pack_alignment(), Some(1));
}

#[test]
fn test_framebuffer_and_program() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    cache.set_framebuffer(&mut device, Handle::NULL);
    cache.set_framebuffer(&mut device, Handle::NULL);
    cache.set_program(&mut device, Handle::NULL);
    cache.set_program(&mut device, Handle::NULL);

    assert_eq!(device.issued_commands(), vec!["bind_framebuffer", "use_program"]);
    assert_eq!(cache.framebuffer(), Some(Handle::NULL));
    assert_eq!(cache.program(), Some(Handle::NULL));
}

// ============================================================================
// Stencil faces
// ============================================================================

#[test]
fn test_stencil_func_narrowest_face() {
    let mut device = MockDevice::new();
    let mut cache = captured(&mut device);
    let func = StencilFunc { func: CompareFunc::Equal, reference: 1, mask: 0xFF };

    // Both faces differ from the captured defaults: a single call
    cache.set_stencil_func(&mut device, Face::FrontAndBack, func);
    assert_eq!(device.issued_commands(), vec!["stencil_func_separate"]);

    // Back changes alone
    device.clear_calls();
    let back_func = StencilFunc { reference: 2, ..func };
    cache.set_stencil_func(&mut device, Face::Back, back_func);
    assert_eq!(device.issued_commands(), vec!["stencil_func_separate"]);

    // Both faces requested, only front differs: device sees a front-only call
    device.clear_calls();
    cache.set_stencil_func(&mut device, Face::FrontAndBack, back_func);
    assert_eq!(device.issued_commands(), vec!["stencil_func_separate"]);
    assert_eq!(device.integer(StateParam::StencilRef), 2);
    assert_eq!(device.integer(StateParam::StencilBackRef), 2);
    assert_eq!(cache.stencil_func(Face::Front), Some(back_func));

    // Nothing differs anymore
    device.clear_calls();
    cache.set_stencil_func(&mut device, Face::FrontAndBack, back_func);
    assert!(device.issued_commands().is_empty());
}

#[test]
fn test_stencil_mask_and_ops_per_face() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let ops = StencilOps {
        fail: StencilOp::Keep,
        depth_fail: StencilOp::Keep,
        depth_pass: StencilOp::Replace,
    };

    cache.set_stencil_write_mask(&mut device, Face::Front, 0x0F);
    cache.set_stencil_write_mask(&mut device, Face::Front, 0x0F);
    cache.set_stencil_ops(&mut device, Face::Back, ops);
    cache.set_stencil_ops(&mut device, Face::Back, ops);

    assert_eq!(device.issued_commands(), vec!["stencil_mask_separate", "stencil_op_separate"]);
    assert_eq!(device.integer(StateParam::StencilWritemask), 0x0F);
    assert_eq!(device.integer(StateParam::StencilBackWritemask), -1);
    assert_eq!(device.integer(StateParam::StencilBackPassDepthPass), StencilOp::Replace.raw() as i32);
    assert_eq!(device.integer(StateParam::StencilPassDepthPass), StencilOp::Keep.raw() as i32);
}

// ============================================================================
// Texture units
// ============================================================================

#[test]
fn test_bind_texture_skips_satisfied_steps() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let texture = device.create_texture();
    device.clear_calls();

    cache.bind_texture(&mut device, 1, TextureTarget::Texture2D, texture, 10).unwrap();
    assert_eq!(device.issued_commands(), vec!["active_texture", "bind_texture"]);

    device.clear_calls();
    cache.bind_texture(&mut device, 1, TextureTarget::Texture2D, texture, 10).unwrap();
    assert!(device.issued_commands().is_empty());

    // Same unit, different resource: no unit switch
    let other = device.create_texture();
    device.clear_calls();
    cache.bind_texture(&mut device, 1, TextureTarget::Texture2D, other, 11).unwrap();
    assert_eq!(device.issued_commands(), vec!["bind_texture"]);
    assert_eq!(device.bound_texture(1), other);
    assert_eq!(cache.bound_texture(1), Some(11));
    assert_eq!(cache.active_texture_unit(), Some(1));
}

#[test]
fn test_bind_texture_tracks_resource_id_not_handle() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    let first = device.create_texture();
    cache.bind_texture(&mut device, 0, TextureTarget::Texture2D, first, 1).unwrap();
    device.delete_texture(first);

    // Device hands out the same handle for a new texture
    let second = device.create_texture();
    assert_eq!(first, second);
    device.clear_calls();

    cache.bind_texture(&mut device, 0, TextureTarget::Texture2D, second, 2).unwrap();
    assert_eq!(device.issued_commands(), vec!["bind_texture"]);
    assert_eq!(device.bound_texture(0), second);
}

#[test]
fn test_unbind_texture_clears_unit_once() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let texture = device.create_texture();
    cache.bind_texture(&mut device, 2, TextureTarget::Texture2D, texture, 5).unwrap();
    device.clear_calls();

    cache.unbind_texture(&mut device, 2, TextureTarget::Texture2D).unwrap();
    assert_eq!(device.issued_commands(), vec!["bind_texture"]);
    assert_eq!(device.bound_texture(2), Handle::NULL);
    assert_eq!(cache.bound_texture(2), Some(0));

    device.clear_calls();
    cache.unbind_texture(&mut device, 2, TextureTarget::Texture2D).unwrap();
    assert!(device.issued_commands().is_empty());

    // Rebinding the same resource after an unbind reaches the device again
    cache.bind_texture(&mut device, 2, TextureTarget::Texture2D, texture, 5).unwrap();
    assert_eq!(device.issued_commands(), vec!["bind_texture"]);
    assert_eq!(device.bound_texture(2), texture);
}

#[test]
fn test_unbind_out_of_range_unit_rejected() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let unit = cache.texture_unit_count();

    let result = cache.unbind_texture(&mut device, unit, TextureTarget::Texture2D);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(device.calls().is_empty());
}

#[test]
fn test_out_of_range_unit_rejected_without_device_call() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let unit = cache.texture_unit_count();

    let result = cache.bind_texture(&mut device, unit, TextureTarget::Texture2D, Handle(1), 1);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(device.calls().is_empty());
}

// ============================================================================
// Vertex attribute arrays
// ============================================================================

#[test]
fn test_vertex_attrib_array_toggles() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);

    cache.set_vertex_attrib_array(&mut device, 2, true).unwrap();
    cache.set_vertex_attrib_array(&mut device, 2, true).unwrap();
    cache.set_vertex_attrib_array(&mut device, 2, false).unwrap();

    assert_eq!(
        device.issued_commands(),
        vec!["enable_vertex_attrib_array", "disable_vertex_attrib_array"]
    );
    assert_eq!(cache.vertex_attrib_array(2), Some(false));
}

#[test]
fn test_vertex_attrib_out_of_range_rejected() {
    let mut device = MockDevice::new();
    let mut cache = cache_for(&mut device);
    let location = cache.vertex_attrib_count();

    let result = cache.set_vertex_attrib_array(&mut device, location, true);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(device.calls().is_empty());
}

// ============================================================================
// Capture / invalidate
// ============================================================================

#[test]
fn test_capture_seeds_cache_from_device() {
    let mut device = MockDevice::new();
    device.enable(Capability::DepthTest);
    device.enable_vertex_attrib_array(0);
    let cache = captured(&mut device);

    assert_eq!(cache.capability(Capability::DepthTest), Some(true));
    assert_eq!(cache.capability(Capability::Blend), Some(false));
    assert_eq!(cache.blend_func(), Some(BlendFunc::new(BlendFactor::One, BlendFactor::Zero)));
    assert_eq!(cache.depth_func(), Some(CompareFunc::Less));
    assert_eq!(cache.unpack_alignment(), Some(4));
    assert_eq!(cache.active_texture_unit(), Some(0));
    assert_eq!(cache.program(), Some(Handle::NULL));
    assert_eq!(cache.vertex_attrib_array(0), Some(true));
    assert_eq!(cache.vertex_attrib_array(1), Some(false));
    assert_eq!(cache.clear_color(), Some(Vec4::ZERO));
    // Texture unit bindings cannot be read back as resource ids
    assert_eq!(cache.bound_texture(0), None);
}

#[test]
fn test_captured_defaults_elide_redundant_calls() {
    let mut device = MockDevice::new();
    let mut cache = captured(&mut device);

    cache.set_depth_func(&mut device, CompareFunc::Less);
    cache.set_depth_write(&mut device, true);
    cache.set_cull_face(&mut device, Face::Back);
    cache.set_blend_equation(
        &mut device,
        BlendEquations { rgb: BlendEquation::Add, alpha: BlendEquation::Add },
    );
    cache.set_pixel_alignment(&mut device, PixelStore::UnpackAlignment, 4);
    cache.set_clear_depth(&mut device, 1.0);
    cache.set_depth_range(&mut device, 0.0, 1.0);

    assert!(device.issued_commands().is_empty());
}

#[test]
fn test_undecodable_capture_stays_invalid() {
    let mut device = MockDevice::new();
    device.set_integer(StateParam::DepthFunc, 0x7777);
    device.set_integer(StateParam::BlendDstAlpha, 0x7777);
    let mut cache = captured(&mut device);

    assert_eq!(cache.depth_func(), None);
    assert_eq!(cache.blend_func(), None);

    cache.set_depth_func(&mut device, CompareFunc::Less);
    assert_eq!(device.issued_commands(), vec!["depth_func"]);
}

#[test]
fn test_set_state_invalid_forces_next_call() {
    let mut device = MockDevice::new();
    let mut cache = captured(&mut device);
    cache.set_depth_write(&mut device, false);

    cache.set_state_invalid();
    device.clear_calls();

    // Same value as before invalidation still reaches the device
    cache.set_depth_write(&mut device, false);
    cache.set_vertex_attrib_array(&mut device, 0, false).unwrap();

    assert_eq!(device.issued_commands(), vec!["depth_mask", "disable_vertex_attrib_array"]);
    assert_eq!(cache.texture_unit_count(), 8);
    assert_eq!(cache.vertex_attrib_count(), 16);
}

#[test]
fn test_backdoor_call_desyncs_until_recapture() {
    let mut device = MockDevice::new();
    let mut cache = captured(&mut device);

    // Around the cache
    device.depth_func(CompareFunc::Greater);
    device.clear_calls();

    cache.set_depth_func(&mut device, CompareFunc::Less);
    assert!(device.issued_commands().is_empty());
    assert_eq!(device.integer(StateParam::DepthFunc), CompareFunc::Greater.raw() as i32);

    cache.capture_state(&mut device);
    device.clear_calls();
    cache.set_depth_func(&mut device, CompareFunc::Less);
    assert_eq!(device.issued_commands(), vec!["depth_func"]);
}
