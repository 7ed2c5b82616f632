use eframe::egui;
use netviz_core::{Attributes, EdgeId, VertexId};
use netviz_events::{Event, EventListener};

const MAX_MESSAGES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Selected {
    Vertex {
        id: VertexId,
        attributes: Attributes,
    },
    Edge {
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        attributes: Attributes,
    },
}

impl Selected {
    fn title(&self) -> String {
        match self {
            Selected::Vertex { id, .. } => format!("Vertex {}", id),
            Selected::Edge {
                id, source, target, ..
            } => format!("Edge {} ({} - {})", id, source, target),
        }
    }

    fn attributes(&self) -> &Attributes {
        match self {
            Selected::Vertex { attributes, .. } | Selected::Edge { attributes, .. } => attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Attribute view of the last selected vertex or edge plus recent query results.
#[derive(Debug, Default)]
pub struct InfoPanel {
    pub selected: Option<Selected>,
    pub messages: Vec<StatusMessage>,
}

impl InfoPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, text: String, is_error: bool) {
        self.messages.push(StatusMessage { text, is_error });
        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }

    pub fn last_message(&self) -> Option<&StatusMessage> {
        self.messages.last()
    }

    pub fn ui(&self, ui: &mut egui::Ui) {
        match &self.selected {
            Some(selected) => {
                ui.heading(selected.title());
                ui.add_space(4.0);
                egui::Grid::new("info_attributes")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for (name, value) in selected.attributes() {
                            ui.label(egui::RichText::new(name).strong());
                            ui.label(value.to_string());
                            ui.end_row();
                        }
                    });
            }
            None => {
                ui.label(
                    egui::RichText::new("Click a vertex or an edge to inspect it.")
                        .color(ui.visuals().weak_text_color()),
                );
            }
        }

        if !self.messages.is_empty() {
            ui.separator();
            for message in self.messages.iter().rev() {
                let color = if message.is_error {
                    ui.visuals().error_fg_color
                } else {
                    ui.visuals().text_color()
                };
                ui.label(egui::RichText::new(&message.text).color(color));
            }
        }
    }
}

impl EventListener for InfoPanel {
    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::VertexSelected { id, attributes } => {
                self.selected = Some(Selected::Vertex {
                    id: *id,
                    attributes: attributes.clone(),
                });
            }
            Event::EdgeSelected {
                id,
                source,
                target,
                attributes,
            } => {
                self.selected = Some(Selected::Edge {
                    id: *id,
                    source: *source,
                    target: *target,
                    attributes: attributes.clone(),
                });
            }
            Event::VertexDeleted { id } => {
                if matches!(&self.selected, Some(Selected::Vertex { id: shown, .. }) if shown == id)
                {
                    self.selected = None;
                }
            }
            Event::EdgeDeleted { id } => {
                if matches!(&self.selected, Some(Selected::Edge { id: shown, .. }) if shown == id) {
                    self.selected = None;
                }
            }
            Event::ShortestPathFound { from, to, hops } => {
                self.push(format!("Path {} -> {}: {} hops", from, to, hops), false);
            }
            Event::NotConnected { from, to } => {
                self.push(format!("{} and {} are not connected", from, to), false);
            }
            Event::BottlenecksDetected { edges } => {
                self.push(format!("{} bottleneck edges", edges.len()), false);
            }
            Event::GraphLoaded {
                path,
                vertex_count,
                edge_count,
            } => {
                self.selected = None;
                let name = path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "graph".to_string());
                self.push(
                    format!("Loaded {}: {} vertices, {} edges", name, vertex_count, edge_count),
                    false,
                );
            }
            Event::ShowError { message } => self.push(message.clone(), true),
            Event::VertexAdded { .. } | Event::EdgeAdded { .. } => {}
        }
    }
}
