//! End-to-end frames: a hecs scene culled on the CPU, lit, shadowed and
//! recorded into a `CommandBuffer`.
//!
//! Conventions used here:
//! - Culling hands out GL projections (depth in [-1, 1]).
//! - The recorder reports wgpu conventions, so atlas rows start at the top.
use glam::{Vec3, Vec4};
use hecs::World;
use shadow_atlas::renderer::commands::{ClipConventions, CommandBuffer, ShadowCommand};
use shadow_atlas::renderer::culling::{Bounds, LightBakingOutput, LightShadowParams, LightShadows};
use shadow_atlas::renderer::shadows::{
    AtlasAllocation, ShadowData, CASCADE_COUNT, CASCADE_DATA, DIR_SHADOW_ATLAS,
};
use shadow_atlas::renderer::CullingResults;
use shadow_atlas::scene::{
    Camera, CastShadows, DirectionalLight, PointLight, Pose, SceneCulling, ShadowCaster,
};
use shadow_atlas::{Lighting, ShadowSettings};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn camera() -> Camera {
    Camera {
        eye: Vec3::new(0.0, 6.0, 12.0),
        target: Vec3::ZERO,
        up: Vec3::Y,
        fov_y_radians: 60f32.to_radians(),
        near: 0.1,
        far: 300.0,
    }
}

fn spawn_sun(world: &mut World, direction: Vec3) {
    world.spawn((
        DirectionalLight {
            color: Vec3::new(1.0, 0.95, 0.9),
            intensity: 1.5,
        },
        Pose::looking_along(Vec3::ZERO, direction),
        CastShadows(LightShadowParams {
            shadows: LightShadows::Soft,
            ..LightShadowParams::default()
        }),
    ));
}

fn spawn_ground_and_box(world: &mut World) {
    world.spawn((ShadowCaster(Bounds::from_min_max(
        Vec3::new(-10.0, -0.1, -10.0),
        Vec3::new(10.0, 0.0, 10.0),
    )),));
    world.spawn((ShadowCaster(Bounds::from_min_max(
        Vec3::new(-1.0, 0.0, -1.0),
        Vec3::new(1.0, 2.0, 1.0),
    )),));
}

fn run_frame(
    world: &World,
    settings: &ShadowSettings,
) -> (Lighting, SceneCulling, CommandBuffer) {
    let mut culling = SceneCulling::from_world(world, camera(), 16.0 / 9.0, settings.max_distance);
    let mut buffer = CommandBuffer::new(ClipConventions::WGPU);
    let mut lighting = Lighting::new();
    lighting.setup(&mut culling, &mut buffer, settings, true);
    (lighting, culling, buffer)
}

#[test]
fn single_light_single_cascade_fills_the_atlas() {
    init();
    let mut world = World::new();
    spawn_sun(&mut world, Vec3::new(0.3, -1.0, 0.2));
    spawn_ground_and_box(&mut world);
    let mut settings = ShadowSettings::default();
    settings.directional.cascade_count = 1;

    let (mut lighting, _culling, mut buffer) = run_frame(&world, &settings);

    let Some(AtlasAllocation::Atlas { size, layout }) = lighting.shadows().allocation() else {
        panic!("expected a full atlas");
    };
    assert_eq!(size, 1024);
    assert_eq!(layout.split, 1);
    assert_eq!(layout.tile_size, 1024);
    assert_eq!(buffer.draw_count(), 1);
    assert_eq!(buffer.global_int(CASCADE_COUNT), Some(1));

    // The top of the box lands inside the atlas with a valid depth.
    let matrix = lighting.shadows().tables().matrix(0, 0).unwrap();
    let projected = matrix.project_point3(Vec3::new(0.0, 2.0, 0.0));
    assert!((0.0..=1.0).contains(&projected.x), "{projected:?}");
    assert!((0.0..=1.0).contains(&projected.y), "{projected:?}");
    assert!((0.0..=1.0).contains(&projected.z), "{projected:?}");

    lighting.cleanup(&mut buffer);
    assert_eq!(buffer.releases().collect::<Vec<_>>(), vec![DIR_SHADOW_ATLAS]);
}

#[test]
fn frame_without_shadowed_lights_binds_placeholder() {
    init();
    let mut world = World::new();
    spawn_ground_and_box(&mut world);

    let (mut lighting, _culling, mut buffer) = run_frame(&world, &ShadowSettings::default());

    assert_eq!(lighting.shadows().allocation(), Some(AtlasAllocation::Placeholder));
    let sizes: Vec<_> = buffer.allocations().map(|target| target.width).collect();
    assert_eq!(sizes, vec![1]);
    assert_eq!(buffer.draw_count(), 0);
    assert_eq!(buffer.global_int(CASCADE_COUNT), None);
    assert_eq!(buffer.keyword_enabled("_DIRECTIONAL_PCF3"), Some(false));

    lighting.cleanup(&mut buffer);
    assert_eq!(buffer.releases().count(), 1);
}

#[test]
fn two_lights_four_cascades_use_a_four_by_four_grid() {
    init();
    let mut world = World::new();
    spawn_sun(&mut world, Vec3::new(0.3, -1.0, 0.2));
    spawn_sun(&mut world, Vec3::new(-0.5, -0.7, 0.1));
    spawn_ground_and_box(&mut world);

    let (lighting, _culling, buffer) = run_frame(&world, &ShadowSettings::default());

    let Some(AtlasAllocation::Atlas { layout, .. }) = lighting.shadows().allocation() else {
        panic!("expected a full atlas");
    };
    assert_eq!(layout.tiles, 8);
    assert_eq!(layout.split, 4);
    assert_eq!(layout.tile_size, 256);
    assert_eq!(buffer.draw_count(), 8);

    let viewports: Vec<_> = buffer.viewports().collect();
    assert_eq!(viewports.len(), 8);
    for (index, viewport) in viewports.iter().enumerate() {
        assert_eq!(viewport.width, 256.0);
        assert_eq!(viewport.x, (index % 4) as f32 * 256.0);
        assert_eq!(viewport.y, (index / 4) as f32 * 256.0);
    }

    let second = lighting.tables().directional_shadow_data[1];
    assert_eq!(second.y, 4.0);

    // Cascade data comes from the first light and grows outwards.
    let data = buffer.global_vector_array(CASCADE_DATA).unwrap();
    assert!(data.iter().all(|entry| entry.x > 0.0));
    assert!(data.windows(2).all(|pair| pair[0].y < pair[1].y), "{data:?}");

    let uniform = lighting.shadows().uniform();
    assert_eq!(uniform.cascade_count[0], 4);
    assert_eq!(uniform.cascade_data[3], data[3].to_array());
    assert_eq!(
        uniform.matrices[4],
        lighting.shadows().tables().matrix(1, 0).unwrap().to_cols_array_2d()
    );
}

#[test]
fn fifth_shadowed_sun_loses_its_shadow() {
    init();
    let mut world = World::new();
    for index in 0..5 {
        spawn_sun(&mut world, Vec3::new(0.1 * index as f32, -1.0, 0.2));
    }
    spawn_ground_and_box(&mut world);
    let mut settings = ShadowSettings::default();
    settings.directional.cascade_count = 1;

    let (lighting, culling, buffer) = run_frame(&world, &settings);

    assert_eq!(culling.visible_lights().len(), 5);
    assert_eq!(lighting.tables().directional_count, 4);
    assert_eq!(lighting.shadows().shadowed_light_count(), 4);
    assert_eq!(buffer.draw_count(), 4);
    assert!(lighting.tables().directional_shadow_data[..4]
        .iter()
        .all(|data| data.x > 0.0));
}

#[test]
fn point_lights_only_forward_baked_masks() {
    init();
    let mut world = World::new();
    spawn_ground_and_box(&mut world);
    world.spawn((
        PointLight {
            color: Vec3::ONE,
            intensity: 3.0,
            range: 5.0,
        },
        Pose {
            translation: Vec3::new(0.0, 3.0, 0.0),
            ..Pose::default()
        },
        CastShadows(LightShadowParams {
            shadows: LightShadows::Hard,
            strength: 0.8,
            baking: LightBakingOutput::shadow_mask(1),
            ..LightShadowParams::default()
        }),
    ));

    let (lighting, culling, buffer) = run_frame(&world, &ShadowSettings::default());

    assert_eq!(lighting.tables().other_count, 1);
    assert_eq!(
        lighting.tables().other_shadow_data[0],
        ShadowData {
            strength: 0.8,
            tile_offset: 0.0,
            normal_bias: 0.0,
            mask_channel: 1.0,
        }
        .to_vec4()
    );
    assert_eq!(lighting.shadows().allocation(), Some(AtlasAllocation::Placeholder));
    assert_eq!(buffer.keyword_enabled("_SHADOW_MASK_DISTANCE"), Some(true));
    assert_eq!(culling.light_index_map(), &[0]);
}

#[test]
fn depth_bias_wraps_every_shadow_draw() {
    init();
    let mut world = World::new();
    spawn_sun(&mut world, Vec3::new(0.0, -1.0, 0.3));
    spawn_ground_and_box(&mut world);
    let mut settings = ShadowSettings::default();
    settings.directional.cascade_count = 2;

    let (_lighting, _culling, buffer) = run_frame(&world, &settings);

    let sequence: Vec<&str> = buffer
        .commands()
        .iter()
        .filter_map(|command| match command {
            ShadowCommand::SetDepthBias(_) => Some("bias"),
            ShadowCommand::DrawShadows(_) => Some("draw"),
            _ => None,
        })
        .collect();
    assert_eq!(sequence, vec!["bias", "draw", "bias", "bias", "draw", "bias"]);
}

#[test]
fn distance_fade_is_published_with_the_atlas() {
    init();
    let mut world = World::new();
    spawn_sun(&mut world, Vec3::new(0.3, -1.0, 0.2));
    spawn_ground_and_box(&mut world);
    let settings = ShadowSettings::default();

    let (_lighting, _culling, buffer) = run_frame(&world, &settings);

    let fade = buffer
        .global_vector(shadow_atlas::renderer::shadows::SHADOW_DISTANCE_FADE)
        .unwrap();
    let f = 1.0 - settings.directional.cascade_fade;
    assert!((fade - Vec4::new(0.01, 10.0, 1.0 / (1.0 - f * f), 0.0)).abs().max_element() < 1e-3);
}

#[test]
fn consecutive_frames_start_from_clean_tables() {
    init();
    let mut world = World::new();
    spawn_sun(&mut world, Vec3::new(0.3, -1.0, 0.2));
    spawn_ground_and_box(&mut world);
    let settings = ShadowSettings::default();
    let mut buffer = CommandBuffer::new(ClipConventions::WGPU);
    let mut lighting = Lighting::new();

    let mut culling = SceneCulling::from_world(&world, camera(), 16.0 / 9.0, settings.max_distance);
    lighting.setup(&mut culling, &mut buffer, &settings, true);
    lighting.cleanup(&mut buffer);
    assert_eq!(buffer.draw_count(), 4);
    assert_ne!(lighting.shadows().tables().culling_spheres()[0], Vec4::ZERO);

    // Second frame: the sun no longer casts shadows.
    buffer.clear();
    let mut world = World::new();
    spawn_ground_and_box(&mut world);
    let mut culling = SceneCulling::from_world(&world, camera(), 16.0 / 9.0, settings.max_distance);
    lighting.setup(&mut culling, &mut buffer, &settings, true);

    assert_eq!(buffer.draw_count(), 0);
    assert_eq!(lighting.shadows().allocation(), Some(AtlasAllocation::Placeholder));
    assert!(lighting
        .shadows()
        .tables()
        .culling_spheres()
        .iter()
        .all(|sphere| *sphere == Vec4::ZERO));
    assert_eq!(lighting.shadows().uniform().cascade_data, [[0.0; 4]; 4]);

    lighting.cleanup(&mut buffer);
    assert_eq!(buffer.releases().count(), 1);
}
