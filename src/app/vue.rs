// src/app/vue.rs
//
// Vue (UI egui) — natif + web
// ---------------------------
// - Même AppCalc (etat.rs) pour natif + wasm
// - Clavier : Enter évalue, Backspace efface (quand le champ est focus)
// - Tactile : gros boutons, focus redonné après clic (focus_entree)
// - Panneaux : résultat, mémoire, historique, tracé, démarche
//
// Note :
// - PAS de Key::NumEnter (n’existe pas dans egui 0.33.x)

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use super::etat::AppCalc;
use crate::noyau::{ModeAngle, Resultat};
use crate::reglages::{CHIFFRES_MAX, CHIFFRES_MIN, POINTS_MAX, POINTS_MIN};

/// Motifs retirés d’un coup par DEL.
const MOTIFS_DEL: [&str; 16] = [
    "sqrt(", "asin(", "acos(", "atan(", "sin(", "cos(", "tan(", "ln(", "log10(", "log(",
    "exp(", "abs(", "gamma(", "factorial(", "ans", "pi",
];

impl AppCalc {
    /// UI principale : à appeler depuis eframe::App::update(...)
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        // Densité “calc”
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Calculatrice scientifique");
                ui.add_space(6.0);

                self.ui_entree(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_resultats(ui);
                self.ui_trace(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_historique(ui);
                self.ui_demarche(ui);
            });
    }

    fn ui_entree(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Entrée :");
            ui.separator();
            ui.radio_value(&mut self.mode, ModeAngle::Radians, "RAD");
            ui.radio_value(&mut self.mode, ModeAngle::Degres, "DEG");
        });

        // IMPORTANT : id stable + focus contrôlé
        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.entree)
                .desired_width(ui.available_width())
                .hint_text("Ex: sin(pi/4), 2^10, 15%*80, x^2-1, ans/3")
                .id_source("entree_edit")
                .code_editor(),
        );

        if self.focus_entree {
            resp.request_focus();
            self.focus_entree = false;
        }

        let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));
        if resp.has_focus() && enter {
            self.eval_via_noyau();
        }

        ui.add_space(6.0);

        ui.horizontal(|ui| {
            self.bouton_action(ui, "C", "Efface seulement l’entrée", Action::ClearEntree);
            self.bouton_action(ui, "AC", "Nouvelle session (ans, mémoire, historique)", Action::ResetTotal);
            self.bouton_action(ui, "±", "Change le signe de l’entrée", Action::ChangerSigne);

            ui.separator();

            ui.label("Précision :");
            let mut d = self.session.chiffres() as u32;
            let resp = ui.add(
                egui::DragValue::new(&mut d)
                    .speed(1)
                    .range(CHIFFRES_MIN as u32..=CHIFFRES_MAX as u32)
                    .suffix(" chiffres"),
            );
            if resp.changed() {
                self.set_digits(d as usize);
            }
        });

        ui.add_space(8.0);

        // Fonctions + constantes
        ui.horizontal_wrapped(|ui| {
            for f in ["sin", "cos", "tan", "asin", "acos", "atan"] {
                self.bouton_insert(ui, f, &format!("{f}("), InsertKind::Func);
            }
            ui.end_row();
            for f in ["ln", "log10", "exp", "sqrt", "abs", "gamma"] {
                self.bouton_insert(ui, f, &format!("{f}("), InsertKind::Func);
            }
            ui.end_row();
            self.bouton_insert(ui, "π", "pi", InsertKind::Word);
            self.bouton_insert(ui, "e", "e", InsertKind::Word);
            self.bouton_insert(ui, "x", "x", InsertKind::Word);
            self.bouton_insert(ui, "ans", "ans", InsertKind::Word);
            self.bouton_insert(ui, "^", "^", InsertKind::Op);
            self.bouton_insert(ui, "%", "%", InsertKind::Suffixe);
            self.bouton_insert(ui, "!", "!", InsertKind::Suffixe);
        });

        ui.add_space(8.0);

        ui.horizontal_top(|ui| {
            self.ui_pave_numerique(ui);
            ui.separator();
            self.ui_memoire(ui);
        });

        if !self.avertissement.is_empty() {
            ui.add_space(6.0);
            ui.colored_label(ui.visuals().warn_fg_color, &self.avertissement);
        }
    }

    fn ui_pave_numerique(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("pave_numerique")
            .num_columns(5)
            .spacing([6.0, 6.0])
            .show(ui, |ui| {
                self.bouton_insert(ui, "7", "7", InsertKind::Digit);
                self.bouton_insert(ui, "8", "8", InsertKind::Digit);
                self.bouton_insert(ui, "9", "9", InsertKind::Digit);
                self.bouton_insert(ui, "÷", "/", InsertKind::Op);
                self.bouton_action(ui, "DEL", "Efface le dernier symbole", Action::Backspace);
                ui.end_row();

                self.bouton_insert(ui, "4", "4", InsertKind::Digit);
                self.bouton_insert(ui, "5", "5", InsertKind::Digit);
                self.bouton_insert(ui, "6", "6", InsertKind::Digit);
                self.bouton_insert(ui, "×", "*", InsertKind::Op);
                self.bouton_insert(ui, "(", "(", InsertKind::OpenParen);
                ui.end_row();

                self.bouton_insert(ui, "1", "1", InsertKind::Digit);
                self.bouton_insert(ui, "2", "2", InsertKind::Digit);
                self.bouton_insert(ui, "3", "3", InsertKind::Digit);
                self.bouton_insert(ui, "-", "-", InsertKind::Op);
                self.bouton_insert(ui, ")", ")", InsertKind::CloseParen);
                ui.end_row();

                self.bouton_insert(ui, "0", "0", InsertKind::Digit);
                self.bouton_insert(ui, ".", ".", InsertKind::Digit);
                ui.label("");
                self.bouton_insert(ui, "+", "+", InsertKind::Op);
                self.bouton_action(ui, "=", "Évaluer", Action::Evaluer);
                ui.end_row();
            });
    }

    fn ui_memoire(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            self.bouton_action(ui, "MC", "Remet la mémoire à 0", Action::MemoireEffacer);
            self.bouton_action(ui, "MR", "Insère la mémoire dans l’entrée", Action::MemoireRappel);
            self.bouton_action(ui, "M+", "Ajoute l’entrée à la mémoire", Action::MemoirePlus);
            self.bouton_action(ui, "M-", "Retranche l’entrée de la mémoire", Action::MemoireMoins);
            ui.small(format!("M = {}", self.session.rappel_memoire()));
        });
    }

    /// Backspace “intelligent” : retire d’un coup les motifs utiles ("sin(", "pi", etc.).
    fn backspace_entree(&mut self) {
        let fin = self.entree.trim_end().len();
        self.entree.truncate(fin);

        match MOTIFS_DEL.iter().find(|m| self.entree.ends_with(*m)) {
            Some(m) => {
                let fin = self.entree.len() - m.len();
                self.entree.truncate(fin);
            }
            None => {
                self.entree.pop();
            }
        }

        let fin = self.entree.trim_end().len();
        self.entree.truncate(fin);
    }

    fn ui_resultats(&mut self, ui: &mut egui::Ui) {
        let (exact, lecture, erreur) = match &self.resultat {
            None => (String::new(), None, None),
            Some(Resultat::Erreur(e)) => (String::new(), None, Some(e.to_string())),
            Some(r @ Resultat::Numerique { .. }) => {
                (r.exact().unwrap_or_default(), Some(r.texte()), None)
            }
            Some(r @ Resultat::Symbolique { .. }) => (r.texte(), None, None),
        };

        if let Some(msg) = erreur {
            ui.colored_label(ui.visuals().error_fg_color, msg);
            ui.add_space(6.0);
        }

        ui.label("EXACT :");
        Self::champ_monospace(ui, "exact_out", &exact, 2);

        ui.add_space(6.0);

        ui.label(format!("Décimal ({}) :", self.mode));
        match lecture {
            Some(v) => Self::champ_monospace(ui, "lecture_out", &v, 2),
            None => {
                ui.monospace("indisponible");
            }
        }
    }

    fn ui_trace(&mut self, ui: &mut egui::Ui) {
        let tracable = self.resultat.as_ref().is_some_and(|r| r.est_tracable());
        if !tracable {
            return;
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Tracé sur [");
            ui.add(egui::DragValue::new(&mut self.trace_min).speed(0.5));
            ui.label(";");
            ui.add(egui::DragValue::new(&mut self.trace_max).speed(0.5));
            ui.label("]");
            let mut n = self.reglages.points_trace() as u32;
            let resp = ui.add(egui::DragValue::new(&mut n).range(POINTS_MIN as u32..=POINTS_MAX as u32).suffix(" pts"));
            if resp.changed() {
                self.reglages.set_points_trace(n as usize);
            }
            if ui.button("Tracer").clicked() {
                self.tracer();
            }
        });

        if !self.courbe.is_empty() {
            let couleur = ui.visuals().hyperlink_color;
            let courbe = &self.courbe;
            Plot::new("trace_courbe")
                .height(240.0)
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    for morceau in courbe {
                        plot_ui.line(
                            Line::new("f(x)", PlotPoints::from(morceau.clone()))
                                .color(couleur)
                                .width(1.5),
                        );
                    }
                });
        }
    }

    fn ui_historique(&mut self, ui: &mut egui::Ui) {
        let mut rappel: Option<String> = None;

        let h = self.session.historique();
        egui::CollapsingHeader::new(format!("Historique ({}/{})", h.len(), h.capacite()))
            .default_open(false)
            .show(ui, |ui| {
                for (i, e) in self.session.historique().iter().enumerate() {
                    ui.push_id(i, |ui| {
                        ui.horizontal(|ui| {
                            if ui.small_button("↩").on_hover_text("Reprendre").clicked() {
                                rappel = Some(e.expression.clone());
                            }
                            ui.monospace(format!("{} = {}", e.expression, e.resultat));
                        });
                    });
                }

                ui.horizontal(|ui| {
                    if !self.session.historique().is_empty() && ui.button("Vider").clicked() {
                        self.session.vider_historique();
                    }
                    self.bouton_export(ui);
                });
            });

        if let Some(expr) = rappel {
            self.entree = expr;
            self.focus_entree = true;
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn bouton_export(&mut self, ui: &mut egui::Ui) {
        if !self.session.historique().is_empty() && ui.button("Exporter CSV").clicked() {
            self.exporter_historique();
        }
    }

    /// Pas de système de fichiers côté web.
    #[cfg(target_arch = "wasm32")]
    fn bouton_export(&mut self, _ui: &mut egui::Ui) {}

    #[cfg(not(target_arch = "wasm32"))]
    fn exporter_historique(&mut self) {
        let chemin = std::path::Path::new("historique.csv");
        match self.session.historique().enregistrer(chemin) {
            Ok(()) => self.set_avertissement(format!("Historique exporté : {}", chemin.display())),
            Err(e) => {
                log::error!("export historique : {e}");
                self.set_avertissement(format!("Export impossible : {e}"));
            }
        }
    }

    fn ui_demarche(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Démarche")
            .default_open(true)
            .show(ui, |ui| {
                Self::champ_demarche(ui, "Normalisé", "demarche_norm", &self.demarche.normalise);
                Self::champ_demarche(ui, "Jetons", "demarche_jetons", &self.demarche.jetons);
                Self::champ_demarche(ui, "RPN", "demarche_rpn", &self.demarche.rpn);
                Self::champ_demarche(ui, "Avant", "demarche_avant", &self.demarche.avant);
                Self::champ_demarche(ui, "Après", "demarche_apres", &self.demarche.apres);
                Self::champ_demarche(ui, "Preuve", "demarche_preuve", &self.demarche.preuve);
            });
    }

    fn champ_demarche(ui: &mut egui::Ui, titre: &str, id: &str, contenu: &str) {
        ui.add_space(4.0);
        ui.label(format!("{titre} :"));
        Self::champ_monospace(ui, id, contenu, 2);
    }

    fn champ_monospace(ui: &mut egui::Ui, id: &str, contenu: &str, rows: usize) {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.push_id(id, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.set_min_height(
                        rows as f32 * ui.text_style_height(&egui::TextStyle::Monospace),
                    );
                    ui.monospace(contenu);
                });
            });
    }

    fn bouton_action(&mut self, ui: &mut egui::Ui, label: &str, tip: &str, action: Action) {
        let resp = ui
            .add_sized([46.0, 28.0], egui::Button::new(label))
            .on_hover_text(tip);

        if !resp.clicked() {
            return;
        }

        match action {
            Action::ClearEntree => self.clear_entree(),
            Action::ResetTotal => self.reset_total(),
            Action::ChangerSigne => self.changer_signe(),
            Action::Backspace => self.backspace_entree(),
            Action::Evaluer => self.eval_via_noyau(),
            Action::MemoirePlus => {
                let avert = self.session.memoire_plus(&self.entree, self.mode);
                self.set_avertissement(avert.unwrap_or_default());
            }
            Action::MemoireMoins => {
                let avert = self.session.memoire_moins(&self.entree, self.mode);
                self.set_avertissement(avert.unwrap_or_default());
            }
            Action::MemoireRappel => {
                let m = self.session.rappel_memoire();
                self.inserer(&m, InsertKind::Word);
            }
            Action::MemoireEffacer => self.session.effacer_memoire(),
        }
        self.focus_entree = true;
    }

    fn bouton_insert(&mut self, ui: &mut egui::Ui, label: &str, to_insert: &str, kind: InsertKind) {
        let resp = ui.add_sized([46.0, 28.0], egui::Button::new(label));
        if resp.clicked() && !to_insert.is_empty() {
            self.inserer(to_insert, kind);
        }
    }

    fn inserer(&mut self, to_insert: &str, kind: InsertKind) {
        let dernier = self.entree.chars().rev().find(|c| !c.is_whitespace());
        let colle = |c: char| c.is_ascii_alphanumeric() || c == ')' || c == '.';

        match kind {
            InsertKind::CloseParen | InsertKind::Suffixe => {
                let fin = self.entree.trim_end().len();
                self.entree.truncate(fin);
                self.entree.push_str(to_insert);
            }
            InsertKind::OpenParen | InsertKind::Func | InsertKind::Word => {
                // pas de multiplication implicite : on sépare, l’utilisateur ajoute l’opérateur
                if dernier.is_some_and(colle) && !self.entree.ends_with(char::is_whitespace) {
                    self.entree.push(' ');
                }
                self.entree.push_str(to_insert);
            }
            InsertKind::Op => {
                let fin = self.entree.trim_end().len();
                self.entree.truncate(fin);
                if !self.entree.is_empty() {
                    self.entree.push(' ');
                }
                self.entree.push_str(to_insert);
                self.entree.push(' ');
            }
            InsertKind::Digit => {
                self.entree.push_str(to_insert);
            }
        }

        self.focus_entree = true;
    }

    /// Évalue l’entrée via la session, puis dépose résultat + démarche dans l’état UI.
    /// En cas d’erreur l’entrée reste intacte.
    fn eval_via_noyau(&mut self) {
        let (resultat, demarche, session) = self
            .prendre_session()
            .evaluer_avec_demarche(&self.entree, self.mode);
        self.session = session;
        self.set_resultat(resultat, demarche);
    }
}

#[derive(Clone, Copy, Debug)]
enum Action {
    ClearEntree,
    ResetTotal,
    ChangerSigne,
    Backspace,
    Evaluer,
    MemoirePlus,
    MemoireMoins,
    MemoireRappel,
    MemoireEffacer,
}

#[derive(Clone, Copy, Debug)]
enum InsertKind {
    Digit,
    Word,
    Func,
    Op,
    Suffixe,
    OpenParen,
    CloseParen,
}
