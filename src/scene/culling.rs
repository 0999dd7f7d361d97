use glam::{Mat4, Vec3, Vec4};
use hecs::World;

use super::camera::Camera;
use super::components::{
    final_color, CastShadows, DirectionalLight, PointLight, Pose, ShadowCaster, SpotLight,
};
use crate::renderer::culling::{
    Bounds, CullingResults, DirectionalShadowSplit, LightShadowParams, LightType,
    ShadowSplitData, VisibleLight,
};

/// CPU culling pass over a hecs world seen through one camera.
///
/// Produces the visible light list, caster bounds and cascade split
/// geometry the lighting code consumes.
#[derive(Debug, Clone)]
pub struct SceneCulling {
    camera: Camera,
    aspect: f32,
    max_shadow_distance: f32,
    lights: Vec<VisibleLight>,
    casters: Vec<Bounds>,
    light_index_map: Vec<i32>,
}

impl SceneCulling {
    pub fn new(camera: Camera, aspect: f32, max_shadow_distance: f32) -> Self {
        Self {
            camera,
            aspect,
            max_shadow_distance,
            lights: Vec::new(),
            casters: Vec::new(),
            light_index_map: Vec::new(),
        }
    }

    pub fn from_world(
        world: &World,
        camera: Camera,
        aspect: f32,
        max_shadow_distance: f32,
    ) -> Self {
        let mut culling = Self::new(camera, aspect, max_shadow_distance);
        culling.collect_lights(world);
        for (_entity, caster) in world.query::<&ShadowCaster>().iter() {
            culling.add_caster(caster.0);
        }
        log::debug!(
            "Culled scene: {} visible lights, {} shadow casters",
            culling.lights.len(),
            culling.casters.len()
        );
        culling
    }

    /// Adds a light if the camera can see its area of influence.
    pub fn add_light(&mut self, light: VisibleLight) -> bool {
        let visible = match light.light_type {
            LightType::Directional => true,
            LightType::Point | LightType::Spot | LightType::Area => {
                self.camera
                    .sees_sphere(self.aspect, light.position(), light.range.max(0.0))
            }
        };
        if visible {
            self.lights.push(light);
        }
        visible
    }

    pub fn add_caster(&mut self, bounds: Bounds) {
        self.casters.push(bounds);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Last map handed over by the lighting pass.
    pub fn light_index_map(&self) -> &[i32] {
        &self.light_index_map
    }

    /// Distance covered by realtime shadows.
    pub fn shadow_distance(&self) -> f32 {
        self.max_shadow_distance.min(self.camera.far)
    }

    /// View-depth range `(near, far)` covered by a cascade.
    pub fn cascade_range(&self, cascade_index: usize, cascade_count: usize, ratios: Vec3) -> (f32, f32) {
        let distance = self.shadow_distance();
        let ratios = ratios.to_array();
        let split_far = |index: usize| {
            if index + 1 >= cascade_count {
                distance
            } else {
                ratios.get(index).copied().unwrap_or(1.0) * distance
            }
        };
        let near = if cascade_index == 0 {
            self.camera.near
        } else {
            split_far(cascade_index - 1).max(self.camera.near)
        };
        let far = split_far(cascade_index).max(near + 1e-3);
        (near, far)
    }

    fn collect_lights(&mut self, world: &World) {
        for (_entity, (light, pose, shadows)) in world
            .query::<(&DirectionalLight, Option<&Pose>, Option<&CastShadows>)>()
            .iter()
        {
            self.add_light(VisibleLight {
                light_type: LightType::Directional,
                final_color: final_color(light.color, light.intensity),
                local_to_world: pose.copied().unwrap_or_default().matrix(),
                range: 0.0,
                spot_angle: 0.0,
                inner_spot_angle: 0.0,
                shadow: shadow_params(shadows),
            });
        }

        for (_entity, (light, pose, shadows)) in world
            .query::<(&PointLight, Option<&Pose>, Option<&CastShadows>)>()
            .iter()
        {
            self.add_light(VisibleLight {
                light_type: LightType::Point,
                final_color: final_color(light.color, light.intensity),
                local_to_world: pose.copied().unwrap_or_default().matrix(),
                range: light.range,
                spot_angle: 0.0,
                inner_spot_angle: 0.0,
                shadow: shadow_params(shadows),
            });
        }

        for (_entity, (light, pose, shadows)) in world
            .query::<(&SpotLight, Option<&Pose>, Option<&CastShadows>)>()
            .iter()
        {
            let (inner, outer) = if light.inner_angle > light.outer_angle {
                (light.outer_angle, light.inner_angle)
            } else {
                (light.inner_angle, light.outer_angle)
            };
            self.add_light(VisibleLight {
                light_type: LightType::Spot,
                final_color: final_color(light.color, light.intensity),
                local_to_world: pose.copied().unwrap_or_default().matrix(),
                range: light.range,
                spot_angle: outer,
                inner_spot_angle: inner,
                shadow: shadow_params(shadows),
            });
        }
    }
}

fn shadow_params(shadows: Option<&CastShadows>) -> LightShadowParams {
    shadows.map(|shadows| shadows.0).unwrap_or_default()
}

fn shadow_up(direction: Vec3) -> Vec3 {
    if direction.abs().dot(Vec3::Y) > 0.95 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Bounding sphere `(center, radius)` of a set of points, radius rounded up
/// to 1/16 so it changes less often as the camera rotates.
fn bounding_sphere(corners: &[Vec3; 8]) -> (Vec3, f32) {
    let center = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
    let radius = corners
        .iter()
        .map(|corner| corner.distance(center))
        .fold(0.0f32, f32::max);
    (center, (radius * 16.0).ceil() / 16.0)
}

impl CullingResults for SceneCulling {
    fn visible_lights(&self) -> &[VisibleLight] {
        &self.lights
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds> {
        let light = self.lights.get(visible_light_index)?;
        let (center, radius) = match light.light_type {
            LightType::Directional => (self.camera.eye, self.shadow_distance()),
            _ => (light.position(), light.range),
        };

        self.casters
            .iter()
            .filter(|caster| caster.intersects_sphere(center, radius))
            .fold(None, |acc: Option<Bounds>, caster| {
                Some(match acc {
                    Some(mut bounds) => {
                        bounds.encapsulate(caster);
                        bounds
                    }
                    None => *caster,
                })
            })
    }

    fn compute_directional_shadow_matrices_and_culling_primitives(
        &self,
        visible_light_index: usize,
        cascade_index: usize,
        cascade_count: usize,
        cascade_ratios: Vec3,
        tile_size: u32,
        near_plane_offset: f32,
    ) -> Option<DirectionalShadowSplit> {
        let light = self.lights.get(visible_light_index)?;
        if light.light_type != LightType::Directional
            || cascade_index >= cascade_count
            || tile_size == 0
        {
            return None;
        }
        let direction = light.direction().truncate().try_normalize()?;

        let (near, far) = self.cascade_range(cascade_index, cascade_count, cascade_ratios);
        let corners = self.camera.slice_corners(self.aspect, near, far);
        let (center, radius) = bounding_sphere(&corners);

        // Snap the light-space origin to whole texels so the map does not
        // shimmer as the camera moves.
        let rotation = Mat4::look_to_rh(Vec3::ZERO, direction, shadow_up(direction));
        let texel = 2.0 * radius / tile_size as f32;
        let light_space = rotation.transform_point3(center);
        let snapped = Vec3::new(
            (light_space.x / texel).floor() * texel,
            (light_space.y / texel).floor() * texel,
            light_space.z,
        );
        let view = Mat4::from_translation(-snapped) * rotation;
        let projection = Mat4::orthographic_rh_gl(
            -radius,
            radius,
            -radius,
            radius,
            -(radius + near_plane_offset.max(0.0)),
            radius,
        );

        Some(DirectionalShadowSplit {
            view,
            projection,
            split_data: ShadowSplitData {
                culling_sphere: Vec4::new(center.x, center.y, center.z, radius),
            },
        })
    }

    fn set_light_index_map(&mut self, map: &[i32]) {
        self.light_index_map.clear();
        self.light_index_map.extend_from_slice(map);
    }
}
