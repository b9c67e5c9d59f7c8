//! Editor context
//!
//! [`Editor`] owns the scene, camera, controls, element registry and the
//! render surface. It is constructed explicitly and passed to whoever
//! drives it; there is no global instance.

mod selection;

pub use selection::resolve_selection;

use glam::Vec2;
use objview_core::scene::helpers::{grid_helper, key_light, reference_line};
use objview_core::{
    DroppedFile, Element, ElementId, ElementManager, ElementStyle, IntakeError, LoadError,
    ObjElement, ObjSource, Scene, accept,
};
use objview_renderer::{
    Camera, CameraMode, CameraSettings, OrbitControls, RenderSurface, UnknownCameraMode,
    intersect_scene,
};

use crate::config::{AppConfig, GridConfig};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    UnknownCameraMode(#[from] UnknownCameraMode),
    #[error("failed to load OBJ: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Rejected(#[from] IntakeError),
    #[error("element {0} could not be registered")]
    NotRegistered(ElementId),
}

/// Startup parameters for an [`Editor`]
#[derive(Debug, Clone, Copy)]
pub struct EditorOptions {
    pub width: u32,
    pub height: u32,
    pub camera: CameraSettings,
    pub style: ElementStyle,
    pub grid: GridConfig,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            camera: CameraSettings::default(),
            style: ElementStyle::default(),
            grid: GridConfig::default(),
        }
    }
}

impl EditorOptions {
    pub fn from_config(config: &AppConfig, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            camera: config.camera,
            style: config.viewer.style(),
            grid: config.grid,
        }
    }
}

pub struct Editor {
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    elements: ElementManager,
    surface: Box<dyn RenderSurface>,
    settings: CameraSettings,
    style: ElementStyle,
    frames: u64,
}

impl Editor {
    /// Builds the helper scene, sets up an orthographic camera and renders once.
    pub fn new(surface: Box<dyn RenderSurface>, options: EditorOptions) -> Self {
        let mut scene = Scene::new();
        scene.add_helper(reference_line());
        scene.add_helper(grid_helper(
            options.grid.size,
            options.grid.divisions,
            options.grid.center_color,
            options.grid.line_color,
        ));
        scene.add_helper(key_light());

        let camera = Camera::new(
            CameraMode::Orthographic,
            options.width as f32,
            options.height as f32,
            &options.camera,
        );
        let controls = OrbitControls::new(&camera, options.camera.home_target);

        let mut editor = Self {
            scene,
            camera,
            controls,
            elements: ElementManager::new(),
            surface,
            settings: options.camera,
            style: options.style,
            frames: 0,
        };
        editor.render();
        editor
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera.mode()
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn elements(&self) -> &ElementManager {
        &self.elements
    }

    /// Colors given to newly created elements
    pub fn element_style(&self) -> ElementStyle {
        self.style
    }

    /// Number of frames handed to the surface so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Draws the current scene through the surface.
    pub fn render(&mut self) {
        self.surface.render(&self.scene, &self.camera);
        self.frames += 1;
    }

    /// Handles pending redraw requests, then renders.
    pub fn update(&mut self) {
        self.flush_redraws();
        self.render();
    }

    /// Renders once for every queued element redraw request.
    fn flush_redraws(&mut self) {
        for request in self.elements.drain_redraws() {
            tracing::debug!("Redraw requested: {:?}", request);
            self.render();
        }
    }

    /// Loads an OBJ file and registers the resulting element.
    ///
    /// Nothing is registered when parsing fails.
    pub async fn load_obj_file(&mut self, source: ObjSource) -> Result<ElementId, EditorError> {
        let name = source.name.clone();
        let mut element = ObjElement::with_style(source, self.style);

        if let Err(e) = element.load().await {
            tracing::error!("Failed to load '{}': {}", name, e);
            return Err(e.into());
        }

        self.add_loaded(Box::new(element))
    }

    /// Registers an element whose load already completed elsewhere.
    pub fn add_loaded(&mut self, element: Box<dyn Element>) -> Result<ElementId, EditorError> {
        let id = element.id();
        let added = self.elements.add_mesh(element, &mut self.scene);
        self.flush_redraws();

        if added {
            Ok(id)
        } else {
            Err(EditorError::NotRegistered(id))
        }
    }

    /// Filters dropped files to OBJ sources without touching the scene.
    pub fn accept_drop(files: Vec<DroppedFile>) -> Vec<Result<ObjSource, IntakeError>> {
        files
            .into_iter()
            .map(|file| {
                accept(file).inspect_err(|e| {
                    tracing::warn!("Ignoring dropped file: {}", e);
                })
            })
            .collect()
    }

    /// Loads every OBJ among the dropped files, returning one outcome per file.
    pub async fn handle_drop(&mut self, files: Vec<DroppedFile>) -> Vec<Result<ElementId, EditorError>> {
        let mut outcomes = Vec::new();
        for accepted in Self::accept_drop(files) {
            let outcome = match accepted {
                Ok(source) => self.load_obj_file(source).await,
                Err(e) => Err(e.into()),
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Replaces the camera with one of the given mode.
    ///
    /// The new camera keeps the previous position and orientation and the
    /// controls keep their target.
    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        let viewport = self.camera.viewport();
        let mut camera = Camera::new(mode, viewport.x, viewport.y, &self.settings);
        camera.position = self.camera.position;
        camera.orientation = self.camera.orientation;

        let target = self.controls.target;
        self.camera = camera;
        self.controls = OrbitControls::new(&self.camera, target);

        tracing::info!("Camera mode: {}", mode);
        self.render();
    }

    pub fn set_camera_mode_named(&mut self, name: &str) -> Result<(), EditorError> {
        let mode = match name.parse::<CameraMode>() {
            Ok(mode) => mode,
            Err(e) => {
                tracing::error!("{}", e);
                return Err(e.into());
            }
        };
        self.set_camera_mode(mode);
        Ok(())
    }

    /// Picks at a point in normalized device coordinates.
    ///
    /// Hit elements become the selection and are highlighted; all others
    /// revert to their default color. An empty pick clears the selection.
    /// The scene is rendered even when nothing changed.
    pub fn select_pointer(&mut self, ndc: Vec2) -> Vec<ElementId> {
        let ray = self.camera.ray_from_ndc(ndc);
        let hits = intersect_scene(&ray, &self.scene);
        let selected = resolve_selection(&hits, &self.elements);

        tracing::debug!("Pick at {:?}: {} hits, {} selected", ndc, hits.len(), selected.len());

        self.elements.set_selected(selected.iter().copied());
        self.flush_redraws();
        self.render();
        selected
    }

    /// Moves the camera back to the home pose.
    pub fn home_camera(&mut self) {
        self.camera.position = self.settings.home_position;
        self.camera.look_at(self.settings.home_target);
        self.camera.set_zoom(self.settings.ortho_zoom);

        self.controls.sync(&self.camera, self.settings.home_target);
        self.render();
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.controls.rotate(&mut self.camera, dx, dy);
        self.render();
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.controls.pan(&mut self.camera, dx, dy);
        self.render();
    }

    /// Zooms by a multiplicative factor; above 1 moves closer.
    pub fn zoom(&mut self, factor: f32) {
        self.controls.zoom(&mut self.camera, factor);
        self.render();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width as f32, height as f32);
        self.surface.resize(width, height);
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use approx::assert_relative_eq;
    use glam::Vec3;
    use objview_core::{Color, NodeKind, Object3D};

    const CENTER_TRIANGLE: &str = "v -1 0 -1\nv 1 0 -1\nv 0 0 1\nf 1 2 3\n";
    const SIDE_TRIANGLE: &str = "v 4 0 -1\nv 6 0 -1\nv 5 0 1\nf 1 2 3\n";

    #[derive(Clone, Default)]
    struct CountingSurface {
        renders: Arc<AtomicUsize>,
    }

    impl RenderSurface for CountingSurface {
        fn render(&mut self, _scene: &Scene, _camera: &Camera) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn editor() -> (Editor, Arc<AtomicUsize>) {
        let surface = CountingSurface::default();
        let renders = surface.renders.clone();
        (Editor::new(Box::new(surface), EditorOptions::default()), renders)
    }

    fn load(editor: &mut Editor, name: &str, text: &str) -> ElementId {
        pollster::block_on(editor.load_obj_file(ObjSource::new(name, text))).unwrap()
    }

    fn mesh_colors(editor: &Editor, id: ElementId) -> Vec<Color> {
        let handle = editor
            .elements()
            .find_by_element_id(id)
            .and_then(|e| e.renderable())
            .unwrap();
        let root = handle.read();
        let mut colors = Vec::new();
        root.traverse(&mut |node: &Object3D| {
            if let NodeKind::Mesh(part) = &node.kind {
                colors.push(part.material.color);
            }
        });
        colors
    }

    #[test]
    fn test_new_renders_once_with_helpers() {
        let (editor, renders) = editor();
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(editor.scene().helpers().len(), 3);
        assert!(editor.scene().is_empty());
        assert_eq!(editor.camera_mode(), CameraMode::Orthographic);
        assert_eq!(editor.camera().zoom(), Some(50.0));
    }

    #[test]
    fn test_load_registers_and_attaches() {
        let (mut editor, renders) = editor();
        let before = renders.load(Ordering::SeqCst);

        let id = load(&mut editor, "tri.obj", CENTER_TRIANGLE);

        assert_eq!(editor.elements().len(), 1);
        assert_eq!(editor.scene().len(), 1);
        assert!(editor.elements().contains(id));
        assert_eq!(mesh_colors(&editor, id), vec![ElementStyle::default().default_color]);
        assert!(renders.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn test_failed_load_leaves_registry_untouched() {
        let (mut editor, _) = editor();
        let revision = editor.scene().revision();

        let result = pollster::block_on(editor.load_obj_file(ObjSource::new("bad.obj", "not an obj")));

        assert!(matches!(result, Err(EditorError::Load(_))));
        assert!(editor.elements().is_empty());
        assert_eq!(editor.scene().revision(), revision);
    }

    #[test]
    fn test_non_obj_drop_causes_no_mutation() {
        let (mut editor, renders) = editor();
        let revision = editor.scene().revision();
        let frames = renders.load(Ordering::SeqCst);

        let files = vec![DroppedFile::new("photo.png", "image/png", vec![1, 2, 3])];
        let outcomes = pollster::block_on(editor.handle_drop(files));

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], Err(EditorError::Rejected(_))));
        assert!(editor.elements().is_empty());
        assert_eq!(editor.scene().revision(), revision);
        assert_eq!(renders.load(Ordering::SeqCst), frames);
    }

    #[test]
    fn test_mixed_drop_loads_only_obj() {
        let (mut editor, _) = editor();
        let files = vec![
            DroppedFile::new("notes.txt", "text/plain", "hello"),
            DroppedFile::new("tri.obj", "", CENTER_TRIANGLE),
        ];
        let outcomes = pollster::block_on(editor.handle_drop(files));

        assert!(outcomes[0].is_err());
        assert!(outcomes[1].is_ok());
        assert_eq!(editor.elements().len(), 1);
    }

    #[test]
    fn test_unloaded_element_is_not_registered() {
        let (mut editor, _) = editor();
        let element = ObjElement::new(ObjSource::new("tri.obj", CENTER_TRIANGLE));
        let id = element.id();

        let result = editor.add_loaded(Box::new(element));

        assert!(matches!(result, Err(EditorError::NotRegistered(rejected)) if rejected == id));
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_camera_switch_preserves_pose() {
        let (mut editor, renders) = editor();
        editor.orbit(120.0, -40.0);
        let position = editor.camera().position;
        let orientation = editor.camera().orientation;
        let target = editor.controls().target;
        let frames = renders.load(Ordering::SeqCst);

        editor.set_camera_mode(CameraMode::Perspective);

        assert_eq!(editor.camera_mode(), CameraMode::Perspective);
        assert_eq!(editor.camera().position, position);
        assert_eq!(editor.camera().orientation, orientation);
        assert_eq!(editor.controls().target, target);
        assert_eq!(editor.camera().viewport(), Vec2::new(800.0, 600.0));
        assert_eq!(renders.load(Ordering::SeqCst), frames + 1);

        editor.set_camera_mode(CameraMode::Orthographic);
        assert_eq!(editor.camera().position, position);
        assert_eq!(editor.camera().zoom(), Some(50.0));
    }

    #[test]
    fn test_unknown_camera_mode_is_rejected() {
        let (mut editor, _) = editor();
        let result = editor.set_camera_mode_named("fisheye");
        assert!(matches!(result, Err(EditorError::UnknownCameraMode(_))));
        assert_eq!(editor.camera_mode(), CameraMode::Orthographic);

        editor.set_camera_mode_named("Perspective").unwrap();
        assert_eq!(editor.camera_mode(), CameraMode::Perspective);
    }

    #[test]
    fn test_pick_highlights_only_hit_element() {
        let (mut editor, _) = editor();
        let center = load(&mut editor, "center.obj", CENTER_TRIANGLE);
        let side = load(&mut editor, "side.obj", SIDE_TRIANGLE);
        let style = ElementStyle::default();

        let selected = editor.select_pointer(Vec2::ZERO);

        assert_eq!(selected, vec![center]);
        assert_eq!(mesh_colors(&editor, center), vec![style.highlight_color]);
        assert_eq!(mesh_colors(&editor, side), vec![style.default_color]);
    }

    #[test]
    fn test_empty_pick_clears_highlight_and_is_idempotent() {
        let (mut editor, renders) = editor();
        let id = load(&mut editor, "center.obj", CENTER_TRIANGLE);
        let style = ElementStyle::default();

        editor.select_pointer(Vec2::ZERO);
        assert_eq!(mesh_colors(&editor, id), vec![style.highlight_color]);

        let corner = Vec2::new(0.99, 0.99);
        assert!(editor.select_pointer(corner).is_empty());
        assert_eq!(mesh_colors(&editor, id), vec![style.default_color]);

        let frames = renders.load(Ordering::SeqCst);
        assert!(editor.select_pointer(corner).is_empty());
        assert_eq!(mesh_colors(&editor, id), vec![style.default_color]);
        assert!(renders.load(Ordering::SeqCst) > frames);
    }

    #[test]
    fn test_pick_on_empty_scene_still_renders() {
        let (mut editor, renders) = editor();
        let frames = renders.load(Ordering::SeqCst);
        assert!(editor.select_pointer(Vec2::ZERO).is_empty());
        assert_eq!(renders.load(Ordering::SeqCst), frames + 1);
    }

    #[test]
    fn test_home_restores_default_pose() {
        let (mut editor, _) = editor();
        editor.orbit(200.0, 50.0);
        editor.pan(30.0, 10.0);
        editor.zoom(2.0);

        editor.home_camera();

        let camera = editor.camera();
        assert_relative_eq!(camera.position.x, 30.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.y, 75.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, 100.0, epsilon = 1e-4);
        assert_eq!(camera.zoom(), Some(50.0));
        assert_eq!(editor.controls().target, Vec3::ZERO);

        let expected = (Vec3::ZERO - Vec3::new(30.0, 75.0, 100.0)).normalize();
        assert_relative_eq!(camera.forward().dot(expected), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_resize_updates_camera_viewport() {
        let (mut editor, _) = editor();
        editor.resize(1024, 512);
        assert_eq!(editor.camera().viewport(), Vec2::new(1024.0, 512.0));
        assert_relative_eq!(editor.camera().aspect(), 2.0);
    }
}
