use eframe::egui;
use netviz_graph::{CanvasConfig, CanvasMode, PendingAction};
use std::path::PathBuf;

/// Requests raised by the toolbar; the app applies them to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    Open(PathBuf),
    SetMode(CanvasMode),
    Arm(PendingAction),
    SetLayout {
        name: String,
        weights: Option<String>,
    },
    SetClustering {
        name: String,
        weights: Option<String>,
    },
    SetFilter {
        attribute: String,
        low: f64,
        high: f64,
    },
    ClearFilter,
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

pub struct Toolbar {
    pub layout: String,
    pub clustering: String,
    /// Edge attribute used as weights; empty means unweighted.
    pub weights: String,
    pub filter_attribute: String,
    pub filter_low: String,
    pub filter_high: String,
    pub filter_error: Option<String>,
}

impl Toolbar {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            layout: config.default_layout.clone(),
            clustering: config.default_clustering.clone(),
            weights: String::new(),
            filter_attribute: config.default_filter.attribute.clone(),
            filter_low: config.default_filter.low.to_string(),
            filter_high: config.default_filter.high.to_string(),
            filter_error: None,
        }
    }

    fn weights(&self) -> Option<String> {
        let trimmed = self.weights.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Parse the filter fields into an action, or record why they are invalid.
    pub fn filter_action(&mut self) -> Option<ToolbarAction> {
        let attribute = self.filter_attribute.trim();
        let bounds = (
            self.filter_low.trim().parse::<f64>(),
            self.filter_high.trim().parse::<f64>(),
        );
        match bounds {
            _ if attribute.is_empty() => {
                self.filter_error = Some("Filter attribute is empty".to_string());
                None
            }
            (Ok(low), Ok(high)) => {
                self.filter_error = None;
                Some(ToolbarAction::SetFilter {
                    attribute: attribute.to_string(),
                    low,
                    high,
                })
            }
            _ => {
                self.filter_error = Some("Filter bounds must be numbers".to_string());
                None
            }
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        mode: CanvasMode,
        pending: Option<PendingAction>,
        layouts: &[String],
        clusterings: &[String],
        filter_active: bool,
    ) -> Vec<ToolbarAction> {
        let mut actions = Vec::new();

        ui.horizontal_wrapped(|ui| {
            if ui.button("Open…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Open Graph")
                    .add_filter("GraphML", &["graphml", "xml"])
                    .pick_file()
                {
                    actions.push(ToolbarAction::Open(path));
                }
            }
            ui.separator();

            for candidate in CanvasMode::ALL {
                if ui
                    .selectable_label(mode == candidate, candidate.to_string())
                    .clicked()
                    && mode != candidate
                {
                    actions.push(ToolbarAction::SetMode(candidate));
                }
            }
            ui.separator();

            ui.add_enabled_ui(mode == CanvasMode::Edit, |ui| {
                for (action, label) in [
                    (PendingAction::AddNode, "Add node"),
                    (PendingAction::DeleteNode, "Delete node"),
                    (PendingAction::AddLine, "Add line"),
                    (PendingAction::DeleteLine, "Delete line"),
                ] {
                    if ui
                        .selectable_label(pending == Some(action), label)
                        .clicked()
                    {
                        actions.push(ToolbarAction::Arm(action));
                    }
                }
            });
            ui.separator();

            if ui.button("+").on_hover_text("Zoom in").clicked() {
                actions.push(ToolbarAction::ZoomIn);
            }
            if ui.button("-").on_hover_text("Zoom out").clicked() {
                actions.push(ToolbarAction::ZoomOut);
            }
            if ui.button("1:1").on_hover_text("Reset zoom").clicked() {
                actions.push(ToolbarAction::ZoomReset);
            }
        });

        ui.horizontal_wrapped(|ui| {
            ui.label("Layout");
            egui::ComboBox::from_id_salt("layout_selector")
                .selected_text(self.layout.as_str())
                .show_ui(ui, |ui| {
                    for name in layouts {
                        ui.selectable_value(&mut self.layout, name.clone(), name.as_str());
                    }
                });
            if ui.button("Apply").clicked() {
                actions.push(ToolbarAction::SetLayout {
                    name: self.layout.clone(),
                    weights: self.weights(),
                });
            }
            ui.separator();

            ui.label("Clustering");
            egui::ComboBox::from_id_salt("clustering_selector")
                .selected_text(self.clustering.as_str())
                .show_ui(ui, |ui| {
                    for name in clusterings {
                        ui.selectable_value(&mut self.clustering, name.clone(), name.as_str());
                    }
                });
            if ui.button("Apply").clicked() {
                actions.push(ToolbarAction::SetClustering {
                    name: self.clustering.clone(),
                    weights: self.weights(),
                });
            }
            ui.separator();

            ui.label("Weights");
            ui.add(
                egui::TextEdit::singleline(&mut self.weights)
                    .hint_text("edge attribute")
                    .desired_width(90.0),
            );
        });

        ui.horizontal_wrapped(|ui| {
            ui.label("Filter");
            ui.add(egui::TextEdit::singleline(&mut self.filter_low).desired_width(48.0));
            ui.label("<");
            ui.add(egui::TextEdit::singleline(&mut self.filter_attribute).desired_width(90.0));
            ui.label("<");
            ui.add(egui::TextEdit::singleline(&mut self.filter_high).desired_width(48.0));
            if ui.button("Apply").clicked() {
                actions.extend(self.filter_action());
            }
            if ui
                .add_enabled(filter_active, egui::Button::new("Clear"))
                .clicked()
            {
                actions.push(ToolbarAction::ClearFilter);
            }
            if let Some(error) = &self.filter_error {
                ui.label(egui::RichText::new(error).color(ui.visuals().error_fg_color));
            }
        });

        actions
    }
}
