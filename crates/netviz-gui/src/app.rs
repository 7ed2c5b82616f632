use crate::components::canvas_view;
use crate::components::info_panel::InfoPanel;
use crate::components::toolbar::{Toolbar, ToolbarAction};
use crate::settings::AppSettings;
use eframe::egui;
use netviz_graph::GraphCanvas;
use std::path::{Path, PathBuf};

pub struct NetvizApp {
    settings: AppSettings,
    canvas: GraphCanvas,
    toolbar: Toolbar,
    info_panel: InfoPanel,
    title: String,
}

impl NetvizApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_graph: Option<PathBuf>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let settings = AppSettings::load();
        let canvas = GraphCanvas::new(settings.canvas.clone());
        let toolbar = Toolbar::new(&settings.canvas);

        let mut app = Self {
            settings,
            canvas,
            toolbar,
            info_panel: InfoPanel::new(),
            title: String::new(),
        };

        let startup = initial_graph.or_else(|| {
            app.settings
                .last_graph
                .clone()
                .filter(|path| app.settings.reopen_last_graph && path.exists())
        });
        if let Some(path) = startup {
            app.open_graph(&path);
        }
        app
    }

    fn open_graph(&mut self, path: &Path) {
        tracing::info!("Opening graph {:?}", path);
        if self.canvas.set_graph(path).is_ok() {
            self.settings.remember_graph(path);
            self.settings.save();
        }
    }

    fn apply(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Open(path) => self.open_graph(&path),
            ToolbarAction::SetMode(mode) => self.canvas.set_mode(mode),
            ToolbarAction::Arm(pending) => self.canvas.arm_pending_action(pending),
            ToolbarAction::SetLayout { name, weights } => {
                if let Err(e) = self.canvas.set_layout(&name, weights.as_deref()) {
                    tracing::debug!("Layout {} not applied: {}", name, e);
                }
            }
            ToolbarAction::SetClustering { name, weights } => {
                if let Ok(count) = self.canvas.set_clustering(&name, weights.as_deref()) {
                    tracing::info!("{} produced {} clusters", name, count);
                }
            }
            ToolbarAction::SetFilter {
                attribute,
                low,
                high,
            } => self.canvas.set_filter(&attribute, low, high),
            ToolbarAction::ClearFilter => self.canvas.clear_filter(),
            ToolbarAction::ZoomIn => self.canvas.zoom_in(),
            ToolbarAction::ZoomOut => self.canvas.zoom_out(),
            ToolbarAction::ZoomReset => self.canvas.zoom_reset(),
        }
    }

    fn window_title(&self) -> String {
        match self.canvas.source().and_then(|p| p.file_name()) {
            Some(name) => format!("netviz - {}", name.to_string_lossy()),
            None => "netviz".to_string(),
        }
    }
}

impl eframe::App for NetvizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let layouts = self.canvas.layout_names();
        let clusterings = self.canvas.clustering_names();

        let actions = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                ui.add_space(2.0);
                let actions = self.toolbar.ui(
                    ui,
                    self.canvas.mode(),
                    self.canvas.pending_action(),
                    &layouts,
                    &clusterings,
                    self.canvas.filter().is_some(),
                );
                ui.add_space(2.0);
                actions
            })
            .inner;
        for action in actions {
            self.apply(action);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let model = self.canvas.model();
                ui.label(format!(
                    "{} vertices, {} edges",
                    model.vertex_count(),
                    model.edge_count()
                ));
                ui.separator();
                ui.label(format!("Mode: {}", self.canvas.mode()));
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.canvas.viewport().zoom() * 100.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.checkbox(&mut self.settings.show_info_panel, "Info");
                });
            });
        });

        self.canvas.events().dispatch_to(&mut self.info_panel);

        if self.settings.show_info_panel {
            egui::SidePanel::right("info_panel")
                .resizable(true)
                .default_width(260.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        self.info_panel.ui(ui);
                    });
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                canvas_view::show(ui, &mut self.canvas);
            });

        // Canvas input may have produced events this frame.
        self.canvas.events().dispatch_to(&mut self.info_panel);

        let title = self.window_title();
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }
}
