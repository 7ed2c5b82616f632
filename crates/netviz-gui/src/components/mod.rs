pub mod canvas_view;
pub mod info_panel;
pub mod toolbar;
