//! Main application

use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;

use objview_core::{DroppedFile, ObjSource};
use objview_renderer::{CameraMode, NullSurface, RenderSurface};

use crate::config::{SharedConfig, create_shared_config};
use crate::editor::{Editor, EditorOptions};
use crate::viewport_state::{SharedViewportState, ViewportState, ViewportSurface};

/// Exponent applied per scrolled point when zooming
const ZOOM_PER_POINT: f32 = 0.002;

/// Work produced outside `update` (file dialogs, async loads)
enum AppAction {
    OpenSource(ObjSource),
    #[cfg(target_arch = "wasm32")]
    Loaded(Result<objview_core::ObjElement, (String, objview_core::LoadError)>),
}

type ActionQueue = Arc<Mutex<Vec<AppAction>>>;

/// Converts a pointer position inside `rect` to normalized device coordinates.
fn pointer_to_ndc(pos: egui::Pos2, rect: egui::Rect) -> Vec2 {
    let u = (pos.x - rect.min.x) / rect.width().max(1.0);
    let v = (pos.y - rect.min.y) / rect.height().max(1.0);
    Vec2::new(u * 2.0 - 1.0, -v * 2.0 + 1.0)
}

/// Reads an egui drop into an intake file; native drops carry a path instead of bytes.
fn read_dropped_file(file: &egui::DroppedFile) -> Option<DroppedFile> {
    let bytes = match (&file.bytes, &file.path) {
        (Some(bytes), _) => bytes.to_vec(),
        #[cfg(not(target_arch = "wasm32"))]
        (None, Some(path)) => match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to read dropped file {:?}: {}", path, e);
                return None;
            }
        },
        _ => return None,
    };

    let name = if file.name.is_empty() {
        file.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        file.name.clone()
    };

    Some(DroppedFile::new(name, &file.mime, bytes))
}

/// Reads a file chosen in the native dialog into a load source.
#[cfg(not(target_arch = "wasm32"))]
fn read_picked_file(path: &std::path::Path) -> std::io::Result<ObjSource> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ObjSource::new(name, bytes))
}

fn take_actions(queue: &ActionQueue) -> Vec<AppAction> {
    std::mem::take(&mut *queue.lock())
}

pub struct ObjViewerApp {
    editor: Editor,
    viewport: Option<SharedViewportState>,
    /// Written back on exit when it changed or did not exist yet
    config: SharedConfig,
    actions: ActionQueue,
    /// Last error shown to the user
    status: Option<String>,
}

impl ObjViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = create_shared_config();
        let options = EditorOptions::from_config(config.read().config(), 800, 600);

        let (viewport, surface): (Option<SharedViewportState>, Box<dyn RenderSurface>) =
            match cc.wgpu_render_state.as_ref() {
                Some(render_state) => {
                    let state = Arc::new(Mutex::new(ViewportState::new(
                        render_state.device.clone(),
                        render_state.queue.clone(),
                        render_state.target_format,
                        options.width,
                        options.height,
                    )));
                    let surface = ViewportSurface::new(state.clone(), cc.egui_ctx.clone());
                    (Some(state), Box::new(surface))
                }
                None => {
                    tracing::warn!("No wgpu render state; the viewport will stay empty");
                    (None, Box::new(NullSurface))
                }
            };

        Self {
            editor: Editor::new(surface, options),
            viewport,
            config,
            actions: Arc::new(Mutex::new(Vec::new())),
            status: None,
        }
    }

    fn queue_action(&self, action: AppAction) {
        self.actions.lock().push(action);
    }

    fn process_actions(&mut self, ctx: &egui::Context) {
        for action in take_actions(&self.actions) {
            match action {
                AppAction::OpenSource(source) => self.open_source(source, ctx),
                #[cfg(target_arch = "wasm32")]
                AppAction::Loaded(Ok(element)) => {
                    if let Err(e) = self.editor.add_loaded(Box::new(element)) {
                        self.status = Some(e.to_string());
                    }
                }
                #[cfg(target_arch = "wasm32")]
                AppAction::Loaded(Err((name, e))) => {
                    tracing::error!("Failed to load '{}': {}", name, e);
                    self.status = Some(format!("{}: {}", name, e));
                }
            }
        }
    }

    /// Loads a source synchronously.
    #[cfg(not(target_arch = "wasm32"))]
    fn open_source(&mut self, source: ObjSource, _ctx: &egui::Context) {
        let name = source.name.clone();
        match pollster::block_on(self.editor.load_obj_file(source)) {
            Ok(_) => self.status = None,
            Err(e) => self.status = Some(format!("{}: {}", name, e)),
        }
    }

    /// Loads a source on the browser event loop; the element comes back as an action.
    #[cfg(target_arch = "wasm32")]
    fn open_source(&mut self, source: ObjSource, ctx: &egui::Context) {
        let actions = self.actions.clone();
        let style = self.editor.element_style();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let name = source.name.clone();
            let mut element = objview_core::ObjElement::with_style(source, style);
            let result = element.load().await.map(|()| element).map_err(|e| (name, e));
            actions.lock().push(AppAction::Loaded(result));
            ctx.request_repaint();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Wavefront OBJ", &["obj", "OBJ"])
            .pick_file()
        else {
            return;
        };

        match read_picked_file(&path) {
            Ok(source) => {
                self.queue_action(AppAction::OpenSource(source));
                ctx.request_repaint();
            }
            Err(e) => {
                tracing::error!("Failed to read {:?}: {}", path, e);
                self.status = Some(format!("{}: {}", path.display(), e));
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        let actions = self.actions.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(file) = rfd::AsyncFileDialog::new()
                .add_filter("Wavefront OBJ", &["obj", "OBJ"])
                .pick_file()
                .await
            {
                let name = file.file_name();
                let data = file.read().await;
                actions.lock().push(AppAction::OpenSource(ObjSource::new(name, data)));
                ctx.request_repaint();
            }
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let files: Vec<DroppedFile> = dropped.iter().filter_map(read_dropped_file).collect();
        for accepted in Editor::accept_drop(files) {
            match accepted {
                Ok(source) => self.open_source(source, ctx),
                Err(e) => self.status = Some(e.to_string()),
            }
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{} elements, {} camera",
                    self.editor.elements().len(),
                    self.editor.camera_mode()
                ));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(ui.visuals().error_fg_color, status);
                }
            });
        });
    }

    fn show_camera_buttons(&mut self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("camera_buttons"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let mode = self.editor.camera_mode();
                        if ui
                            .selectable_label(mode == CameraMode::Orthographic, "Orthographic")
                            .clicked()
                        {
                            self.editor.set_camera_mode(CameraMode::Orthographic);
                        }
                        if ui
                            .selectable_label(mode == CameraMode::Perspective, "Perspective")
                            .clicked()
                        {
                            self.editor.set_camera_mode(CameraMode::Perspective);
                        }
                        if ui.button("Home").clicked() {
                            self.editor.home_camera();
                        }
                        ui.separator();
                        if ui.button("Open OBJ...").clicked() {
                            self.open_file_dialog(ctx);
                        }
                    });
                });
            });
    }

    fn show_viewport(&mut self, ui: &mut egui::Ui, frame: &eframe::Frame) {
        let ppp = ui.ctx().pixels_per_point();
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let width = (rect.width() * ppp).round().max(1.0) as u32;
        let height = (rect.height() * ppp).round().max(1.0) as u32;

        match (&self.viewport, frame.wgpu_render_state()) {
            (Some(viewport), Some(render_state)) => {
                let (texture_id, recreated) = {
                    let mut egui_renderer = render_state.renderer.write();
                    viewport.lock().ensure_texture(width, height, &mut egui_renderer)
                };
                if recreated {
                    self.editor.resize(width, height);
                }
                ui.painter().image(
                    texture_id,
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            _ => {
                ui.painter().rect_filled(rect, 0.0, egui::Color32::WHITE);
            }
        }

        if ui.ctx().input(|i| !i.raw.hovered_files.is_empty()) {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Drop OBJ files to load",
                egui::FontId::proportional(20.0),
                egui::Color32::DARK_GRAY,
            );
        }

        if response.clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            self.editor.select_pointer(pointer_to_ndc(pos, rect));
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta() * ppp;
            self.editor.orbit(delta.x, delta.y);
        } else if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let delta = response.drag_delta() * ppp;
            self.editor.pan(delta.x, delta.y);
        }

        if response.hovered() {
            let scroll = ui.ctx().input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.editor.zoom((scroll * ZOOM_PER_POINT).exp());
            }
        }
    }
}

impl eframe::App for ObjViewerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.process_actions(ctx);
        self.handle_dropped_files(ctx);

        self.show_status_bar(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.show_viewport(ui, frame));
        self.show_camera_buttons(ctx);
    }

    fn on_exit(&mut self) {
        if let Err(e) = self.config.write().save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn test_pointer_to_ndc_corners() {
        let rect = viewport_rect();
        assert_eq!(pointer_to_ndc(rect.min, rect), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(rect.max, rect), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(rect.center(), rect), Vec2::ZERO);
    }

    #[test]
    fn test_dropped_bytes_keep_declared_type() {
        let file = egui::DroppedFile {
            name: "model.obj".into(),
            mime: "text/plain".into(),
            bytes: Some(Arc::from(&b"v 0 0 0"[..])),
            ..Default::default()
        };
        let dropped = read_dropped_file(&file).unwrap();
        assert_eq!(dropped.name, "model.obj");
        assert_eq!(dropped.media_type, "text/plain");
    }

    #[test]
    fn test_drop_without_contents_is_skipped() {
        let file = egui::DroppedFile {
            name: "model.obj".into(),
            ..Default::default()
        };
        assert!(read_dropped_file(&file).is_none());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_picked_file_is_queued_as_open_source() {
        let dir = std::env::temp_dir().join(format!("objview-pick-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let queue: ActionQueue = Arc::new(Mutex::new(Vec::new()));
        queue
            .lock()
            .push(AppAction::OpenSource(read_picked_file(&path).unwrap()));

        let actions = take_actions(&queue);
        assert_eq!(actions.len(), 1);
        let AppAction::OpenSource(source) = &actions[0];
        assert_eq!(source.name, "tri.obj");
        assert!(source.bytes.starts_with(b"v 0 0 0"));
        assert!(take_actions(&queue).is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_unreadable_pick_is_an_error() {
        let missing = std::env::temp_dir().join("objview-no-such-dir").join("gone.obj");
        assert!(read_picked_file(&missing).is_err());
    }
}
