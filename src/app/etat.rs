//! src/app/etat.rs
//!
//! État UI : entrée, session de calcul, dernier résultat, tracé.
//!
//! Rôle : contenir l’état de la calculatrice et offrir les actions simples
//! (C / AC / ± / précision, tracé) sans logique d’affichage. Les évaluations
//! sont lancées par la vue.

use crate::noyau::{Demarche, ModeAngle, RequeteTrace, Resultat, Session};
use crate::reglages::Reglages;

#[derive(Clone, Debug)]
pub struct AppCalc {
    // --- entrée utilisateur ---
    pub entree: String,
    pub mode: ModeAngle,

    // --- calcul ---
    pub session: Session,
    pub reglages: Reglages,

    // --- sorties ---
    pub resultat: Option<Resultat>,
    pub demarche: Demarche,
    /// Message non bloquant (mémoire, tracé, export).
    pub avertissement: String,

    // --- tracé ---
    pub trace_min: f64,
    pub trace_max: f64,
    /// Courbe échantillonnée, déjà coupée aux points non définis.
    pub courbe: Vec<Vec<[f64; 2]>>,

    // --- UX ---
    // Permet à vue.rs de redonner le focus à l’entrée après un clic sur un bouton.
    pub focus_entree: bool,
}

impl Default for AppCalc {
    fn default() -> Self {
        Self::avec_reglages(Reglages::default())
    }
}

impl AppCalc {
    pub fn avec_reglages(reglages: Reglages) -> Self {
        let (trace_min, trace_max) = reglages.domaine_trace();
        Self {
            entree: String::new(),
            mode: ModeAngle::default(),
            session: nouvelle_session(&reglages),
            reglages,
            resultat: None,
            demarche: Demarche::default(),
            avertissement: String::new(),
            trace_min,
            trace_max,
            courbe: Vec::new(),
            focus_entree: true, // au lancement, on veut pouvoir taper tout de suite
        }
    }

    /* ------------------------ Actions “boutons” (état seulement) ------------------------ */

    /// AC : nouvelle session (ans, mémoire, historique remis à zéro), mode conservé.
    pub fn reset_total(&mut self) {
        let mode = self.mode;
        *self = Self::avec_reglages(self.reglages.clone());
        self.mode = mode;
    }

    /// C : effacer seulement l’entrée (sans toucher aux résultats).
    pub fn clear_entree(&mut self) {
        self.entree.clear();
        self.focus_entree = true;
    }

    /// ± : ajoute ou retire un “-” en tête de l’entrée.
    pub fn changer_signe(&mut self) {
        let t = self.entree.trim_start();
        self.entree = match t.strip_prefix('-') {
            Some(reste) => reste.to_string(),
            None => format!("-{t}"),
        };
        self.focus_entree = true;
    }

    /// Précision : bornée par les réglages, appliquée aux évaluations suivantes.
    pub fn set_digits(&mut self, digits: usize) {
        self.reglages.set_chiffres(digits);
        let chiffres = self.reglages.chiffres();
        self.session = self.prendre_session().avec_chiffres(chiffres);
        self.focus_entree = true;
    }

    /// Sort la session (les évaluations la consomment) ; une vierge la remplace en attendant.
    pub fn prendre_session(&mut self) -> Session {
        std::mem::replace(&mut self.session, nouvelle_session(&self.reglages))
    }

    /// Dépose le résultat d’une évaluation. Erreur : l’entrée reste intacte.
    /// Résultat traçable : la courbe est échantillonnée tout de suite.
    pub fn set_resultat(&mut self, resultat: Resultat, demarche: Demarche) {
        self.avertissement.clear();
        self.courbe.clear();
        self.demarche = if resultat.est_erreur() {
            Demarche::default()
        } else {
            demarche
        };
        let tracable = resultat.est_tracable();
        self.resultat = Some(resultat);
        if tracable {
            self.tracer();
        }
        self.focus_entree = true;
    }

    /// (Re)trace le résultat courant sur [trace_min ; trace_max].
    /// Domaine refusé : courbe vidée, avertissement.
    pub fn tracer(&mut self) {
        let Some(r) = &self.resultat else {
            return;
        };
        match RequeteTrace::nouvelle(r, self.trace_min, self.trace_max) {
            Ok(req) => {
                self.courbe = req.morceaux(self.reglages.points_trace());
                self.avertissement.clear();
            }
            Err(e) => {
                self.courbe.clear();
                self.set_avertissement(e.to_string());
            }
        }
    }

    pub fn set_avertissement(&mut self, msg: impl Into<String>) {
        self.avertissement = msg.into();
        self.focus_entree = true;
    }
}

fn nouvelle_session(r: &Reglages) -> Session {
    Session::new(r.chiffres(), r.capacite_historique())
}
