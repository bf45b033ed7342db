//! UI overlays using bevy_egui

use arcatalog_core::{
    category_labels, Catalog, CatalogEntry, CatalogLoad, CategoryFilter, CategoryGroup, EntryId,
    Mode, Overlay, TrackingStatus,
};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::app::ArRuntime;
use crate::catalog_fetch::{CatalogState, RefetchCatalog};

const TITLE: &str = "Menu";

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CatalogViewState>()
            // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Catalog view state that survives across frames
#[derive(Resource, Default)]
pub struct CatalogViewState {
    pub filter: CategoryFilter,
    /// Entry that could not be opened, with the reason
    pub notice: Option<(EntryId, String)>,
}

/// Groups to draw for the current filter, empty groups dropped
///
/// Built on [`Catalog::grouped`] so the screen matches `CatalogStore::list_groups`.
pub fn visible_sections(catalog: &Catalog, filter: &CategoryFilter) -> Vec<CategoryGroup> {
    catalog
        .grouped()
        .into_iter()
        .filter_map(|mut group| {
            group.entries.retain(|e| filter.matches(e));
            (!group.entries.is_empty()).then_some(group)
        })
        .collect()
}

/// Fall back to "All" when the selected category is gone from the catalog
pub fn reconcile_filter(filter: &mut CategoryFilter, labels: &[String]) {
    if !labels.iter().any(|l| l == filter.label()) {
        tracing::debug!("Category {} no longer present, showing all", filter);
        *filter = CategoryFilter::All;
    }
}

/// What the user asked for this frame
enum UiAction {
    Select(CatalogEntry),
    Close,
    Retry,
}

fn ui_system(
    mut contexts: EguiContexts,
    runtime: NonSend<ArRuntime>,
    catalog: Res<CatalogState>,
    mut view: ResMut<CatalogViewState>,
    mut refetch: MessageWriter<RefetchCatalog>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    let (mode, overlay, streaming) = {
        let session = runtime.session();
        let viewport = session.hooks();
        (session.mode(), viewport.overlay(), viewport.tracker().is_streaming())
    };

    let action = match mode {
        Mode::Catalog => catalog_view(ctx, &catalog.0, &mut view),
        Mode::Immersive => overlay.and_then(|overlay| immersive_overlay(ctx, &overlay, streaming)),
    };

    match action {
        Some(UiAction::Select(entry)) => {
            let id = entry.id.clone();
            let result = runtime.session_mut().select(entry);
            match result {
                Ok(()) => view.notice = None,
                Err(e) => {
                    tracing::warn!("Cannot open entry in AR: {}", e);
                    view.notice = Some((id, e.to_string()));
                }
            }
        }
        Some(UiAction::Close) => runtime.session_mut().close(),
        Some(UiAction::Retry) => {
            refetch.write(RefetchCatalog);
        }
        None => {}
    }
}

fn catalog_view(
    ctx: &egui::Context,
    load: &CatalogLoad,
    view: &mut CatalogViewState,
) -> Option<UiAction> {
    let mut action = None;

    egui::TopBottomPanel::top("catalog_title").show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            let title = load
                .catalog()
                .and_then(|c| c.title.as_deref())
                .unwrap_or(TITLE);
            ui.heading(title);
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| match load {
        CatalogLoad::Loading => {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
        }
        CatalogLoad::Unavailable(reason) => {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), "Catalog unavailable");
                ui.label(egui::RichText::new(reason).small().weak());
                ui.add_space(8.0);
                if ui.button("Retry").clicked() {
                    action = Some(UiAction::Retry);
                }
            });
        }
        CatalogLoad::Ready(catalog) if catalog.is_empty() => {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.label("No items yet");
            });
        }
        CatalogLoad::Ready(catalog) => {
            let entries: Vec<CatalogEntry> = catalog.iter().cloned().collect();
            let labels = category_labels(&entries);
            reconcile_filter(&mut view.filter, &labels);

            // Only offer a filter bar when there is something to filter by
            if labels.len() > 1 {
                egui::ScrollArea::horizontal()
                    .id_salt("category_bar")
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            for label in &labels {
                                let filter = CategoryFilter::from_label(label);
                                ui.selectable_value(&mut view.filter, filter, label.as_str());
                            }
                        });
                    });
                ui.separator();
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for section in visible_sections(catalog, &view.filter) {
                    if !section.label.is_empty() {
                        ui.add_space(8.0);
                        ui.label(egui::RichText::new(&section.label).strong().size(18.0));
                    }

                    for entry in &section.entries {
                        if let Some(selected) = entry_card(ui, entry, view.notice.as_ref()) {
                            action = Some(UiAction::Select(selected));
                        }
                    }
                }
            });
        }
    });

    action
}

fn entry_card(
    ui: &mut egui::Ui,
    entry: &CatalogEntry,
    notice: Option<&(EntryId, String)>,
) -> Option<CatalogEntry> {
    let mut selected = None;

    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&entry.name).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if !entry.price.is_empty() {
                    ui.label(&entry.price);
                }
            });
        });

        if !entry.description.is_empty() {
            ui.label(egui::RichText::new(&entry.description).weak());
        }

        if ui.button("View in AR").clicked() {
            selected = Some(entry.clone());
        }

        if let Some((id, reason)) = notice {
            if id == &entry.id {
                ui.colored_label(egui::Color32::from_rgb(220, 160, 60), reason);
            }
        }
    });

    selected
}

fn tracking_line(status: &TrackingStatus, streaming: bool) -> Option<(egui::Color32, String)> {
    match status {
        TrackingStatus::Inactive => None,
        TrackingStatus::Starting if streaming => {
            Some((egui::Color32::LIGHT_GRAY, "Camera ready".to_string()))
        }
        TrackingStatus::Starting => {
            Some((egui::Color32::LIGHT_GRAY, "Waiting for camera...".to_string()))
        }
        TrackingStatus::Unavailable(reason) => Some((
            egui::Color32::from_rgb(220, 80, 80),
            format!("Camera unavailable: {}", reason),
        )),
    }
}

fn immersive_overlay(ctx: &egui::Context, overlay: &Overlay, streaming: bool) -> Option<UiAction> {
    let mut action = None;

    egui::Area::new(egui::Id::new("ar_instructions"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(280.0);
                ui.label(egui::RichText::new(&overlay.title).strong().size(18.0));
                ui.label(&overlay.hint);

                match &overlay.marker_image_url {
                    Some(url) => {
                        ui.hyperlink_to(&overlay.marker_link_label, url);
                    }
                    None => {
                        ui.label(egui::RichText::new(&overlay.marker_link_label).weak());
                    }
                }

                if let Some((color, text)) = tracking_line(&overlay.tracking, streaming) {
                    ui.colored_label(color, text);
                }

                if overlay.asset_failed {
                    ui.colored_label(
                        egui::Color32::from_rgb(220, 160, 60),
                        "The 3D model could not be loaded",
                    );
                }
            });
        });

    // Always drawn while immersive, whatever the engines report
    if overlay.close_visible {
        egui::Area::new(egui::Id::new("ar_close"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
            .show(ctx, |ui| {
                let button = egui::Button::new(egui::RichText::new("✕ Close").size(20.0));
                if ui.add(button).clicked() {
                    action = Some(UiAction::Close);
                }
            });
    }

    action
}
