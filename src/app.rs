// src/app.rs
//
// Module App (racine)
// -------------------
// - Déclare les sous-modules (etat.rs + vue.rs)
// - Ré-exporte AppCalc (pour main.rs)
// - Fournit l’impl eframe::App (natif + web)
//
// Enter est géré dans vue.rs (quand le champ a le focus).

pub mod etat;
pub mod vue;

pub use etat::AppCalc;

use eframe::egui;

impl eframe::App for AppCalc {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ESC = effacer seulement l’entrée (comme bouton "C").
        let esc = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        if esc {
            self.clear_entree();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui(ui);
        });
    }
}
