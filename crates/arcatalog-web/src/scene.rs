//! 3D scene: marker anchor, bound model and camera compositing

use arcatalog_core::entry::resolve_asset;
use arcatalog_core::{Mode, ModelBinding, ModelRenderer, ModelTransform, RenderError};
use bevy::asset::LoadState;
use bevy::gltf::{Gltf, GltfAssetLabel};
use bevy::prelude::*;

use crate::app::ArRuntime;

/// Background shown behind the catalog view
const CATALOG_BACKGROUND: Color = Color::srgb(0.1, 0.1, 0.15);

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene)
            .add_systems(Update, (
                poll_tracking_errors,
                apply_scene_commands,
                check_model_load,
                follow_marker,
                spin_models,
                update_clear_color,
            ).chain());
    }
}

/// Marker component for the AR camera
#[derive(Component)]
pub struct ArCamera;

/// Entity whose transform follows the tracked marker
#[derive(Component)]
pub struct MarkerAnchor;

/// The model currently bound to the marker
#[derive(Component)]
pub struct BoundModel {
    pub model: String,
    pub source: Handle<Gltf>,
    pub reported: bool,
}

/// Continuous rotation around a local axis
#[derive(Component)]
pub struct Spinning {
    pub axis: Dir3,
    pub radians_per_second: f32,
}

/// Scene change requested by the viewport
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Bind(ModelBinding),
    Unbind,
}

/// Renderer half of the viewport
///
/// The viewport calls into this outside of the ECS, so binds are queued and
/// applied by [`apply_scene_commands`] on the next frame.
#[derive(Debug, Default)]
pub struct SceneBinder {
    asset_base: String,
    queue: Vec<SceneCommand>,
}

impl SceneBinder {
    pub fn new(asset_base: impl Into<String>) -> Self {
        Self {
            asset_base: asset_base.into(),
            queue: Vec::new(),
        }
    }

    /// Take all queued commands in order
    pub fn drain(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.queue)
    }
}

impl ModelRenderer for SceneBinder {
    fn bind(&mut self, binding: &ModelBinding) -> Result<(), RenderError> {
        let model = binding.model.trim();
        if model.is_empty() {
            return Err(RenderError::AssetLoad {
                model: binding.model.clone(),
                reason: "empty model reference".to_string(),
            });
        }

        let mut resolved = binding.clone();
        resolved.model = resolve_asset(&self.asset_base, model);
        tracing::debug!("Queueing model bind: {}", resolved.model);
        self.queue.push(SceneCommand::Bind(resolved));
        Ok(())
    }

    fn unbind(&mut self) {
        self.queue.push(SceneCommand::Unbind);
    }
}

/// Local transform of a model relative to the marker
///
/// Rotation is given in degrees and applied in Y, X, Z order.
pub fn model_transform(transform: &ModelTransform) -> Transform {
    let [rx, ry, rz] = transform.rotation.0;
    Transform {
        translation: Vec3::from_array(transform.position.0),
        rotation: Quat::from_euler(
            EulerRot::YXZ,
            ry.to_radians(),
            rx.to_radians(),
            rz.to_radians(),
        ),
        scale: Vec3::from_array(transform.scale.0),
    }
}

fn setup_scene(mut commands: Commands) {
    // The tracker reports marker poses in camera space, so the camera stays at the origin
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.01,
            far: 1000.0,
            ..default()
        }),
        Transform::IDENTITY,
        ArCamera,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.95, 1.0),
        brightness: 400.0,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 5000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(1.0, 2.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        MarkerAnchor,
        Transform::IDENTITY,
        Visibility::Hidden,
    ));
}

/// Forward camera failures that arrive after the tracker started
fn poll_tracking_errors(runtime: NonSend<ArRuntime>) {
    let mut session = runtime.session_mut();
    let viewport = session.hooks_mut();
    if let Some(error) = viewport.tracker_mut().take_error() {
        viewport.report_tracking_failure(error);
    }
}

/// Apply queued binds/unbinds to the anchor's children
fn apply_scene_commands(
    mut commands: Commands,
    runtime: NonSend<ArRuntime>,
    asset_server: Res<AssetServer>,
    anchors: Query<Entity, With<MarkerAnchor>>,
    bound: Query<Entity, With<BoundModel>>,
) {
    // Only the final command matters; every command replaces the current model
    let pending = runtime.session_mut().hooks_mut().renderer_mut().drain();
    let Some(last) = pending.into_iter().last() else {
        return;
    };

    for entity in &bound {
        commands.entity(entity).despawn();
    }

    let SceneCommand::Bind(binding) = last else {
        tracing::debug!("Model unbound");
        return;
    };

    let Ok(anchor) = anchors.single() else {
        tracing::error!("Marker anchor missing, cannot bind {}", binding.model);
        return;
    };

    tracing::info!("Loading model: {}", binding.model);
    let source: Handle<Gltf> = asset_server.load(binding.model.clone());
    let scene = asset_server.load(GltfAssetLabel::Scene(0).from_asset(binding.model.clone()));

    let mut model = commands.spawn((
        SceneRoot(scene),
        model_transform(&binding.transform),
        BoundModel {
            model: binding.model.clone(),
            source,
            reported: false,
        },
    ));

    if let Some(spin) = binding.spin {
        model.insert(Spinning {
            axis: Dir3::new(Vec3::from_array(spin.axis.0)).unwrap_or(Dir3::Y),
            radians_per_second: spin.degrees_per_second.to_radians(),
        });
    }

    let model = model.id();
    commands.entity(anchor).add_child(model);
}

/// Report models that failed to load
fn check_model_load(
    runtime: NonSend<ArRuntime>,
    asset_server: Res<AssetServer>,
    mut models: Query<&mut BoundModel>,
) {
    for mut bound in &mut models {
        if bound.reported {
            continue;
        }

        match asset_server.get_load_state(bound.source.id()) {
            Some(LoadState::Loaded) => {
                tracing::info!("Model loaded: {}", bound.model);
                bound.reported = true;
            }
            Some(LoadState::Failed(e)) => {
                tracing::error!("Failed to load model {}: {}", bound.model, e);
                runtime.session_mut().hooks_mut().report_asset_failure(RenderError::AssetLoad {
                    model: bound.model.clone(),
                    reason: e.to_string(),
                });
                bound.reported = true;
            }
            _ => {
                // Still loading
            }
        }
    }
}

/// Move the anchor to the latest marker pose, hiding it while the marker is lost
fn follow_marker(
    runtime: NonSend<ArRuntime>,
    mut anchors: Query<(&mut Transform, &mut Visibility), With<MarkerAnchor>>,
) {
    let session = runtime.session();
    let viewport = session.hooks();
    let pose = if viewport.is_active() {
        viewport.tracker().marker_pose()
    } else {
        None
    };

    for (mut transform, mut visibility) in &mut anchors {
        match pose {
            Some(matrix) => {
                *transform = Transform::from_matrix(Mat4::from_cols_array(&matrix));
                *visibility = Visibility::Visible;
            }
            None => {
                if *visibility != Visibility::Hidden {
                    *visibility = Visibility::Hidden;
                }
            }
        }
    }
}

fn spin_models(time: Res<Time>, mut models: Query<(&mut Transform, &Spinning)>) {
    let dt = time.delta_secs();
    for (mut transform, spin) in &mut models {
        transform.rotate_local_axis(spin.axis, spin.radians_per_second * dt);
    }
}

/// Let the camera feed show through the canvas while immersive
fn update_clear_color(runtime: NonSend<ArRuntime>, mut clear: ResMut<ClearColor>) {
    let wanted = match runtime.session().mode() {
        Mode::Immersive => Color::NONE,
        Mode::Catalog => CATALOG_BACKGROUND,
    };

    if clear.0 != wanted {
        clear.0 = wanted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcatalog_core::{CatalogEntry, MarkerPreset, Spin};

    fn pizza() -> CatalogEntry {
        CatalogEntry::new(1u64, "Pizza", "models/pizza.glb")
    }

    #[test]
    fn test_bind_resolves_against_asset_base() {
        let mut binder = SceneBinder::new("https://cdn.example.com/menu/");
        let binding = ModelBinding::for_entry(&pizza(), MarkerPreset::Hiro);

        binder.bind(&binding).unwrap();
        binder.unbind();

        let commands = binder.drain();
        assert_eq!(commands.len(), 2);
        match &commands[0] {
            SceneCommand::Bind(b) => {
                assert_eq!(b.model, "https://cdn.example.com/menu/models/pizza.glb");
            }
            other => panic!("expected bind, got {:?}", other),
        }
        assert_eq!(commands[1], SceneCommand::Unbind);
        assert!(binder.drain().is_empty());
    }

    #[test]
    fn test_bind_rejects_empty_model() {
        let mut binder = SceneBinder::default();
        let binding = ModelBinding::for_entry(
            &CatalogEntry::new(2u64, "Water", "  "),
            MarkerPreset::Hiro,
        );

        assert!(matches!(
            binder.bind(&binding),
            Err(RenderError::AssetLoad { .. })
        ));
        assert!(binder.drain().is_empty());
    }

    #[test]
    fn test_model_transform_degrees() {
        let entry = pizza().with_transform(ModelTransform {
            scale: arcatalog_core::Vec3::splat(5.0),
            position: arcatalog_core::Vec3::new(0.0, 0.5, 0.0),
            rotation: arcatalog_core::Vec3::new(0.0, 180.0, 0.0),
        });

        let transform = model_transform(&entry.transform);
        assert_eq!(transform.scale, Vec3::splat(5.0));
        assert_eq!(transform.translation, Vec3::new(0.0, 0.5, 0.0));

        // 180 degrees around Y flips forward
        let forward = transform.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_identity_transform() {
        let transform = model_transform(&ModelTransform::default());
        assert_eq!(transform, Transform::IDENTITY);
    }

    #[test]
    fn test_spin_carried_into_binding() {
        let mut entry = pizza();
        entry.spin = Some(Spin {
            axis: arcatalog_core::Vec3::new(0.0, 1.0, 0.0),
            degrees_per_second: 90.0,
        });

        let mut binder = SceneBinder::default();
        binder
            .bind(&ModelBinding::for_entry(&entry, MarkerPreset::Kanji))
            .unwrap();

        match binder.drain().pop() {
            Some(SceneCommand::Bind(b)) => {
                assert_eq!(b.model, "models/pizza.glb");
                assert_eq!(b.spin.map(|s| s.degrees_per_second), Some(90.0));
            }
            other => panic!("expected bind, got {:?}", other),
        }
    }
}
