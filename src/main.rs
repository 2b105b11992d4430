// src/main.rs
//
// Calculatrice scientifique — point d’entrée NATIF + WEB (WASM)
// -------------------------------------------------------------
// - NATIF (Linux/Windows/macOS) : journal simplelog + eframe::run_native
// - WEB  (wasm32)              : eframe::WebRunner + <canvas id="the_canvas_id">
//
// `impl eframe::App for AppCalc` vit dans src/app.rs ; ici, démarrage seulement.

#![cfg_attr(target_arch = "wasm32", allow(unused_imports))]

use eframe::egui;

mod app;
mod noyau;
mod reglages;

use app::AppCalc;
use reglages::Reglages;

/// Titre unique (natif + web).
const TITRE_APP: &str = "Calculatrice scientifique";

/* ------------------------ Entrée NATIF (PC) ------------------------ */

#[cfg(not(target_arch = "wasm32"))]
fn init_journal(reglages: &Reglages) {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let config = ConfigBuilder::new()
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build();
    // Un second init échoue sans conséquence : on garde le premier journal.
    if TermLogger::init(
        reglages.niveau_log(),
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        log::warn!("journal déjà initialisé");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    let reglages = Reglages::depuis_env();
    init_journal(&reglages);
    log::info!(
        "démarrage : {} chiffres, historique {}",
        reglages.chiffres(),
        reglages.capacite_historique()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITRE_APP)
            .with_inner_size([560.0, 820.0])
            .with_min_inner_size([440.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        TITRE_APP,
        options,
        Box::new(move |_cc| Ok(Box::new(AppCalc::avec_reglages(reglages)))),
    )
}

/* ------------------------ Entrée WEB (WASM) ------------------------ */

#[cfg(target_arch = "wasm32")]
fn main() {
    // En wasm32, le démarrage réel passe par `start()` (wasm_bindgen).
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{AppCalc, Reglages, TITRE_APP};

    use wasm_bindgen::JsCast;
    use web_sys::{window, HtmlCanvasElement};

    /// ID du canvas attendu dans index.html.
    const CANVAS_ID: &str = "the_canvas_id";

    /// Point d’entrée automatique au chargement de la page.
    #[wasm_bindgen::prelude::wasm_bindgen(start)]
    pub async fn start() -> Result<(), wasm_bindgen::JsValue> {
        let w = window().ok_or_else(|| js_err("window() indisponible"))?;
        let d = w
            .document()
            .ok_or_else(|| js_err("document() indisponible"))?;

        d.set_title(TITRE_APP);

        let el = d
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| js_err("canvas introuvable (id incorrect dans index.html)"))?;

        let canvas: HtmlCanvasElement = el
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_err("l’élément trouvé n’est pas un <canvas>"))?;

        // Pas d’environnement côté web : réglages par défaut.
        let reglages = Reglages::default();

        eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(move |_cc| Ok(Box::new(AppCalc::avec_reglages(reglages)))),
            )
            .await
    }

    fn js_err(msg: &str) -> wasm_bindgen::JsValue {
        wasm_bindgen::JsValue::from_str(msg)
    }
}
